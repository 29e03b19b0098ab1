//! Predicate AST and its construction from filter criteria.

use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::filter::FilterCriterion;
use crate::operator::FilterOperator;
use crate::schema::{EntitySchema, ResolvedPath};
use crate::value::{Value, NOT_ASSIGNED};

pub type FieldRef = ResolvedPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparison {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
        }
    }
}

/// Persistence-agnostic boolean condition over an entity.
///
/// Backends either evaluate it directly ([`crate::record`]) or compile it
/// ([`crate::sql`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    True,
    And(Vec<Predicate>),
    Compare {
        field: FieldRef,
        op: Comparison,
        value: Value,
    },
    Between {
        field: FieldRef,
        low: Value,
        high: Value,
    },
    In {
        field: FieldRef,
        values: Vec<Value>,
        /// `"Not Assigned"` was present: null fields count as members.
        include_null: bool,
        negated: bool,
    },
    /// Case-insensitive substring match. `needle` is already lowercased.
    Like {
        field: FieldRef,
        needle: String,
    },
    IsNull {
        field: FieldRef,
        negated: bool,
    },
}

impl Predicate {
    pub fn and(clauses: Vec<Predicate>) -> Predicate {
        let mut clauses: Vec<Predicate> = clauses
            .into_iter()
            .filter(|c| !matches!(c, Predicate::True))
            .collect();
        match clauses.len() {
            0 => Predicate::True,
            1 => clauses.remove(0),
            _ => Predicate::And(clauses),
        }
    }

    pub fn is_trivial(&self) -> bool {
        matches!(self, Predicate::True)
    }

    /// Equality on a root-level or nested field. Used by services for
    /// uniqueness lookups.
    pub fn field_equals(
        schema: &'static EntitySchema,
        key: &str,
        raw: &str,
    ) -> QueryResult<Predicate> {
        build_predicate(
            schema,
            &[FilterCriterion::new(key, FilterOperator::Equals, [raw])],
        )
    }
}

/// Build one AND-combined predicate from `criteria`.
///
/// Each criterion is checked in order: field path, operator, value count,
/// value coercion. The first failure aborts construction.
pub fn build_predicate(
    schema: &'static EntitySchema,
    criteria: &[FilterCriterion],
) -> QueryResult<Predicate> {
    let mut clauses = Vec::with_capacity(criteria.len());
    for criterion in criteria {
        let field = schema.resolve(&criterion.key)?;
        clauses.extend(build_clauses(field, criterion)?);
    }
    debug!(
        entity = schema.entity,
        criteria = criteria.len(),
        clauses = clauses.len(),
        "built predicate"
    );
    Ok(Predicate::and(clauses))
}

fn build_clauses(field: FieldRef, criterion: &FilterCriterion) -> QueryResult<Vec<Predicate>> {
    let values = &criterion.values;
    let op = &criterion.operator;

    let comparison = match op {
        FilterOperator::Equals => Some(Comparison::Eq),
        FilterOperator::NotEquals => Some(Comparison::Ne),
        FilterOperator::GreaterThan => Some(Comparison::Gt),
        FilterOperator::GreaterThanOrEquals => Some(Comparison::Ge),
        FilterOperator::LessThan => Some(Comparison::Lt),
        FilterOperator::LessThanOrEquals => Some(Comparison::Le),
        _ => None,
    };

    if let Some(cmp) = comparison {
        let raw = exactly_one(op, values)?;
        if op.is_range() && !field.kind().is_ordered() {
            return Ok(Vec::new());
        }
        let value = Value::coerce(field.kind(), raw)?;
        return Ok(vec![Predicate::Compare {
            field,
            op: cmp,
            value,
        }]);
    }

    match op {
        FilterOperator::Between => {
            if values.len() != 2 {
                return Err(QueryError::invalid_argument(format!(
                    "BETWEEN operation supports only 2 values, got {}",
                    values.len()
                )));
            }
            if !field.kind().is_ordered() {
                return Ok(Vec::new());
            }
            let low = Value::coerce(field.kind(), &values[0])?;
            let high = Value::coerce(field.kind(), &values[1])?;
            Ok(vec![Predicate::Between { field, low, high }])
        }
        FilterOperator::In | FilterOperator::NotIn => {
            at_least_one(op, values)?;
            let mut include_null = false;
            let mut coerced = Vec::with_capacity(values.len());
            for raw in values {
                if raw == NOT_ASSIGNED {
                    include_null = true;
                } else {
                    coerced.push(Value::coerce(field.kind(), raw)?);
                }
            }
            Ok(vec![Predicate::In {
                field,
                values: coerced,
                include_null,
                negated: matches!(op, FilterOperator::NotIn),
            }])
        }
        FilterOperator::Like => {
            at_least_one(op, values)?;
            Ok(values
                .iter()
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| Predicate::Like {
                    field: field.clone(),
                    needle: raw.to_lowercase(),
                })
                .collect())
        }
        FilterOperator::IsNull => Ok(vec![Predicate::IsNull {
            field,
            negated: false,
        }]),
        FilterOperator::IsNotNull => Ok(vec![Predicate::IsNull {
            field,
            negated: true,
        }]),
        other => Err(QueryError::UnsupportedOperation(other.to_string())),
    }
}

fn exactly_one<'a>(op: &FilterOperator, values: &'a [String]) -> QueryResult<&'a str> {
    match values {
        [single] => Ok(single.as_str()),
        _ => Err(QueryError::invalid_argument(format!(
            "{op} operation requires exactly 1 value, got {}",
            values.len()
        ))),
    }
}

fn at_least_one(op: &FilterOperator, values: &[String]) -> QueryResult<()> {
    if values.is_empty() {
        return Err(QueryError::invalid_argument(format!(
            "{op} operation requires at least 1 value"
        )));
    }
    Ok(())
}
