//! `storehub-query`: dynamic filtering, predicate construction and paging.
//!
//! A declarative list of [`FilterCriterion`] is resolved against a static
//! [`EntitySchema`] and turned into a persistence-agnostic [`Predicate`] tree.
//! Backends either evaluate the tree directly over [`Record`]s (in-memory) or
//! compile it to a native query form ([`sql`]).

pub mod error;
pub mod filter;
pub mod operator;
pub mod page;
pub mod predicate;
pub mod record;
pub mod schema;
pub mod sql;
pub mod value;

pub use error::{QueryError, QueryResult};
pub use filter::{FilterCriterion, PageFilter, PageRequest, SortDirection};
pub use operator::FilterOperator;
pub use page::{Page, QueryPlan, Slice, SortKey};
pub use predicate::{build_predicate, Comparison, FieldRef, Predicate};
pub use record::{Field, Queryable, Record};
pub use schema::{EntitySchema, FieldDef, FieldKind, IntWidth, JoinTable, Relation, ResolvedPath};
pub use value::{Value, NOT_ASSIGNED};
