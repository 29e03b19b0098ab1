//! Query planning for paged listings and the response envelope.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::filter::{PageRequest, SortDirection};
use crate::predicate::{build_predicate, Predicate};
use crate::record::{path_values, Record};
use crate::schema::{EntitySchema, FieldDef, ResolvedPath};
use crate::value::Value;

#[derive(Debug, Clone, Copy)]
pub struct SortKey {
    pub field: &'static FieldDef,
    pub direction: SortDirection,
}

/// Everything a store needs to serve one page.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub schema: &'static EntitySchema,
    pub predicate: Predicate,
    pub sort: Vec<SortKey>,
    pub offset: u64,
    pub limit: u32,
}

impl QueryPlan {
    pub fn build(schema: &'static EntitySchema, request: &PageRequest) -> QueryResult<Self> {
        let predicate = build_predicate(schema, &request.filters)?;

        let sort_path = schema.resolve(&request.sort_field)?;
        if !sort_path.is_root_level() {
            return Err(QueryError::invalid_path(
                &request.sort_field,
                "sort field must be a root-level field",
            ));
        }

        let mut sort = vec![SortKey {
            field: sort_path.field,
            direction: request.sort_direction,
        }];
        if let Some(id) = schema.id_field() {
            if id.name != sort_path.field.name {
                sort.push(SortKey {
                    field: id,
                    direction: SortDirection::Asc,
                });
            }
        }

        Ok(Self {
            schema,
            predicate,
            sort,
            offset: u64::from(request.page_index) * u64::from(request.page_size),
            limit: request.page_size,
        })
    }

    /// Run the plan over an in-memory collection.
    pub fn apply<T, I>(&self, rows: I) -> Slice<T>
    where
        T: Record,
        I: IntoIterator<Item = T>,
    {
        let mut matched: Vec<T> = rows
            .into_iter()
            .filter(|row| self.predicate.matches(row))
            .collect();
        let total = matched.len() as u64;
        self.sort_rows(&mut matched);

        let content = matched
            .into_iter()
            .skip(usize::try_from(self.offset).unwrap_or(usize::MAX))
            .take(self.limit as usize)
            .collect();
        Slice { content, total }
    }

    /// Nulls sort last ascending and first descending.
    pub fn sort_rows<T: Record>(&self, rows: &mut [T]) {
        let paths: Vec<ResolvedPath> = self
            .sort
            .iter()
            .map(|key| ResolvedPath {
                key: key.field.name.to_string(),
                root: self.schema,
                relations: Vec::new(),
                field: key.field,
            })
            .collect();

        rows.sort_by(|a, b| {
            for (key, path) in self.sort.iter().zip(&paths) {
                let left = first_value(a, path);
                let right = first_value(b, path);
                let ord = nulls_last(&left, &right);
                let ord = match key.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }
}

fn first_value(row: &dyn Record, path: &ResolvedPath) -> Value {
    path_values(row, path).into_iter().next().unwrap_or(Value::Null)
}

fn nulls_last(left: &Value, right: &Value) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => left.compare(right).unwrap_or(Ordering::Equal),
    }
}

/// One page of rows plus the unpaged match count.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice<T> {
    pub content: Vec<T>,
    pub total: u64,
}

impl<T> Slice<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Slice<U> {
        Slice {
            content: self.content.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// Paged response envelope. `page` is one-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u32,
    pub total: u64,
    pub total_pages: u64,
    pub last: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, page_index: u32, page_size: u32, total: u64) -> Self {
        let size = u64::from(page_size.max(1));
        let total_pages = total.div_ceil(size);
        let page = u64::from(page_index) + 1;
        Self {
            content,
            page,
            size: page_size,
            total,
            total_pages,
            last: total == 0 || page >= total_pages,
        }
    }

    pub fn from_slice(slice: Slice<T>, request: &PageRequest) -> Self {
        Self::new(slice.content, request.page_index, request.page_size, slice.total)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
            total_pages: self.total_pages,
            last: self.last,
        }
    }
}
