//! In-memory evaluation of predicates.
//!
//! Evaluation uses three-valued logic: any comparison against a null field is
//! unknown, and only rows whose predicate is definitely true match. A leaf
//! reached through relations holds when any joined row satisfies it; an empty
//! relation contributes a single null row (left outer join).

use crate::predicate::{Comparison, FieldRef, Predicate};
use crate::schema::EntitySchema;
use crate::value::Value;

/// Field access for the in-memory backend.
pub enum Field<'a> {
    Value(Value),
    Related(Vec<&'a dyn Record>),
    Missing,
}

/// A row that predicates can be evaluated against.
pub trait Record {
    fn field(&self, name: &str) -> Field<'_>;
}

/// A record type with a published schema.
pub trait Queryable: Record {
    fn schema() -> &'static EntitySchema;
}

impl Predicate {
    pub fn matches(&self, record: &dyn Record) -> bool {
        self.evaluate(record) == Some(true)
    }

    /// `None` means unknown.
    pub fn evaluate(&self, record: &dyn Record) -> Option<bool> {
        match self {
            Predicate::True => Some(true),
            Predicate::And(clauses) => {
                let mut result = Some(true);
                for clause in clauses {
                    match clause.evaluate(record) {
                        Some(false) => return Some(false),
                        None => result = None,
                        Some(true) => {}
                    }
                }
                result
            }
            Predicate::Compare { field, op, value } => {
                any_row(record, field, |v| compare(v, *op, value))
            }
            Predicate::Between { field, low, high } => any_row(record, field, |v| {
                let lower = compare(v, Comparison::Ge, low)?;
                let upper = compare(v, Comparison::Le, high)?;
                Some(lower && upper)
            }),
            Predicate::In {
                field,
                values,
                include_null,
                negated,
            } => any_row(record, field, |v| {
                if v.is_null() {
                    return include_null.then_some(!negated);
                }
                let contained = values
                    .iter()
                    .any(|candidate| v.compare(candidate) == Some(core::cmp::Ordering::Equal));
                Some(contained != *negated)
            }),
            Predicate::Like { field, needle } => any_row(record, field, |v| {
                v.to_text()
                    .map(|text| text.to_lowercase().contains(needle.as_str()))
            }),
            Predicate::IsNull { field, negated } => {
                any_row(record, field, |v| Some(v.is_null() != *negated))
            }
        }
    }
}

fn compare(left: &Value, op: Comparison, right: &Value) -> Option<bool> {
    use core::cmp::Ordering::*;

    if left.is_null() || right.is_null() {
        return None;
    }
    let ord = left.compare(right)?;
    Some(match op {
        Comparison::Eq => ord == Equal,
        Comparison::Ne => ord != Equal,
        Comparison::Gt => ord == Greater,
        Comparison::Ge => ord != Less,
        Comparison::Lt => ord == Less,
        Comparison::Le => ord != Greater,
    })
}

fn any_row(
    record: &dyn Record,
    path: &FieldRef,
    test: impl Fn(&Value) -> Option<bool>,
) -> Option<bool> {
    let mut unknown = false;
    for value in path_values(record, path) {
        match test(&value) {
            Some(true) => return Some(true),
            None => unknown = true,
            Some(false) => {}
        }
    }
    if unknown { None } else { Some(false) }
}

/// Values at the end of `path`, one per joined row.
pub fn path_values(record: &dyn Record, path: &FieldRef) -> Vec<Value> {
    // `None` stands for the null row produced by an empty relation.
    let mut frontier: Vec<Option<&dyn Record>> = vec![Some(record)];
    for relation in &path.relations {
        let mut next = Vec::new();
        for row in frontier {
            let related = match row.map(|r| r.field(relation.name)) {
                Some(Field::Related(rows)) => rows,
                _ => Vec::new(),
            };
            if related.is_empty() {
                next.push(None);
            } else {
                next.extend(related.into_iter().map(Some));
            }
        }
        frontier = next;
    }

    frontier
        .into_iter()
        .map(|row| match row.map(|r| r.field(path.field.name)) {
            Some(Field::Value(v)) => v,
            _ => Value::Null,
        })
        .collect()
}
