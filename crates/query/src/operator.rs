//! Filter operators accepted on the wire.

use serde::{Deserialize, Serialize};

/// Comparison operator of a single filter criterion.
///
/// Operator names outside the supported set still deserialize (as
/// [`FilterOperator::Other`]) so that predicate construction can reject them
/// with an error naming the operator instead of a generic decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEquals,
    LessThan,
    LessThanOrEquals,
    In,
    NotIn,
    Like,
    Between,
    IsNull,
    IsNotNull,
    Other(String),
}

impl FilterOperator {
    pub const SUPPORTED: [FilterOperator; 12] = [
        FilterOperator::Equals,
        FilterOperator::NotEquals,
        FilterOperator::GreaterThan,
        FilterOperator::GreaterThanOrEquals,
        FilterOperator::LessThan,
        FilterOperator::LessThanOrEquals,
        FilterOperator::In,
        FilterOperator::NotIn,
        FilterOperator::Like,
        FilterOperator::Between,
        FilterOperator::IsNull,
        FilterOperator::IsNotNull,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            FilterOperator::Equals => "EQUALS",
            FilterOperator::NotEquals => "NOT_EQUALS",
            FilterOperator::GreaterThan => "GREATER_THAN",
            FilterOperator::GreaterThanOrEquals => "GREATER_THAN_OR_EQUALS",
            FilterOperator::LessThan => "LESS_THAN",
            FilterOperator::LessThanOrEquals => "LESS_THAN_OR_EQUALS",
            FilterOperator::In => "IN",
            FilterOperator::NotIn => "NOT_IN",
            FilterOperator::Like => "LIKE",
            FilterOperator::Between => "BETWEEN",
            FilterOperator::IsNull => "IS_NULL",
            FilterOperator::IsNotNull => "IS_NOT_NULL",
            FilterOperator::Other(name) => name,
        }
    }

    /// Range operators and `BETWEEN` only constrain numeric/timestamp fields.
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            FilterOperator::GreaterThan
                | FilterOperator::GreaterThanOrEquals
                | FilterOperator::LessThan
                | FilterOperator::LessThanOrEquals
                | FilterOperator::Between
        )
    }
}

impl From<&str> for FilterOperator {
    fn from(value: &str) -> Self {
        FilterOperator::SUPPORTED
            .into_iter()
            .find(|op| op.as_str() == value)
            .unwrap_or_else(|| FilterOperator::Other(value.to_string()))
    }
}

impl From<String> for FilterOperator {
    fn from(value: String) -> Self {
        FilterOperator::from(value.as_str())
    }
}

impl From<FilterOperator> for String {
    fn from(value: FilterOperator) -> Self {
        value.as_str().to_string()
    }
}

impl core::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_map_to_variants() {
        for op in FilterOperator::SUPPORTED {
            assert_eq!(FilterOperator::from(op.as_str()), op);
        }
    }

    #[test]
    fn unknown_name_is_preserved() {
        let op: FilterOperator = serde_json::from_str("\"STARTS_WITH\"").unwrap();
        assert_eq!(op, FilterOperator::Other("STARTS_WITH".to_string()));
        assert_eq!(op.to_string(), "STARTS_WITH");
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!(matches!(FilterOperator::from("equals"), FilterOperator::Other(_)));
    }
}
