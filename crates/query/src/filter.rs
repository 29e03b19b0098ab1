//! Wire-level filter request and its validated form.

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::operator::FilterOperator;

/// One filter condition: `{ key, operator, values }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriterion {
    pub key: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub values: Vec<String>,
}

impl FilterCriterion {
    pub fn new<I, S>(key: impl Into<String>, operator: FilterOperator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if raw.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Paged, sorted, filtered list request as received from a caller.
///
/// Deliberately unvalidated: services authorize first and only then call
/// [`PageFilter::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFilter {
    pub page: i64,
    pub size: i64,
    pub sort: String,
    pub order: String,
    #[serde(default)]
    pub filters: Vec<FilterCriterion>,
}

impl PageFilter {
    pub fn new(page: i64, size: i64, sort: impl Into<String>, order: impl Into<String>) -> Self {
        Self {
            page,
            size,
            sort: sort.into(),
            order: order.into(),
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, criterion: FilterCriterion) -> Self {
        self.filters.push(criterion);
        self
    }

    pub fn validate(&self) -> QueryResult<PageRequest> {
        if self.page < 0 {
            return Err(QueryError::invalid_page(format!(
                "page index must be >= 0, got {}",
                self.page
            )));
        }
        if self.size <= 0 {
            return Err(QueryError::invalid_page(format!(
                "page size must be > 0, got {}",
                self.size
            )));
        }
        let page_index = u32::try_from(self.page)
            .map_err(|_| QueryError::invalid_page("page index out of range"))?;
        let page_size = u32::try_from(self.size)
            .map_err(|_| QueryError::invalid_page("page size out of range"))?;
        if self.sort.trim().is_empty() {
            return Err(QueryError::invalid_page("sort field must not be blank"));
        }
        let sort_direction = SortDirection::parse(&self.order).ok_or_else(|| {
            QueryError::invalid_page(format!(
                "sort order must be asc or desc, got '{}'",
                self.order
            ))
        })?;

        Ok(PageRequest {
            page_index,
            page_size,
            sort_field: self.sort.trim().to_string(),
            sort_direction,
            filters: self.filters.clone(),
        })
    }
}

/// A validated page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page_index: u32,
    pub page_size: u32,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub filters: Vec<FilterCriterion>,
}

impl PageRequest {
    pub fn new(page_index: u32, page_size: u32, sort_field: impl Into<String>, sort_direction: SortDirection) -> Self {
        Self {
            page_index,
            page_size,
            sort_field: sort_field.into(),
            sort_direction,
            filters: Vec::new(),
        }
    }

    pub fn with_filters(mut self, filters: Vec<FilterCriterion>) -> Self {
        self.filters = filters;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wire_shape() {
        let json = r#"{
            "page": 0, "size": 10, "sort": "name", "order": "ASC",
            "filters": [{ "key": "category", "operator": "EQUALS", "values": ["FRUITS"] }]
        }"#;
        let filter: PageFilter = serde_json::from_str(json).unwrap();
        let req = filter.validate().unwrap();
        assert_eq!(req.page_size, 10);
        assert_eq!(req.sort_direction, SortDirection::Asc);
        assert_eq!(req.filters[0].operator, FilterOperator::Equals);
    }

    #[test]
    fn filters_default_to_empty() {
        let filter: PageFilter =
            serde_json::from_str(r#"{"page":1,"size":5,"sort":"id","order":"desc"}"#).unwrap();
        assert!(filter.validate().unwrap().filters.is_empty());
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        for bad in [
            PageFilter::new(-1, 10, "name", "asc"),
            PageFilter::new(0, 0, "name", "asc"),
            PageFilter::new(0, -3, "name", "asc"),
            PageFilter::new(0, 10, "  ", "asc"),
            PageFilter::new(0, 10, "name", "sideways"),
        ] {
            assert!(
                matches!(bad.validate(), Err(QueryError::InvalidPageRequest(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn order_is_case_insensitive() {
        assert_eq!(
            PageFilter::new(0, 1, "id", "DeSc").validate().unwrap().sort_direction,
            SortDirection::Desc
        );
    }
}
