//! Persistence collaborator abstraction.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use std::sync::Arc;

use thiserror::Error;

use storehub_core::Entity;
use storehub_query::{Predicate, QueryPlan, Slice};

pub use in_memory::InMemoryEntityStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresProductStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A declared unique key is already held by another row.
    #[error("{entity} already exists with {field}: {value}")]
    UniqueViolation {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage for one entity type.
pub trait EntityStore<T: Entity>: Send + Sync {
    fn find_by_id(&self, id: &T::Id) -> StoreResult<Option<T>>;
    fn exists_by_id(&self, id: &T::Id) -> StoreResult<bool>;
    /// Returns whether a row was removed.
    fn delete_by_id(&self, id: &T::Id) -> StoreResult<bool>;
    /// Insert or replace by id, enforcing unique keys.
    fn save(&self, entity: T) -> StoreResult<T>;
    fn find_all(&self, predicate: &Predicate) -> StoreResult<Vec<T>>;
    fn find_page(&self, plan: &QueryPlan) -> StoreResult<Slice<T>>;

    fn find_one(&self, predicate: &Predicate) -> StoreResult<Option<T>> {
        Ok(self.find_all(predicate)?.into_iter().next())
    }
}

pub type SharedStore<T> = Arc<dyn EntityStore<T>>;

impl<T, S> EntityStore<T> for Arc<S>
where
    T: Entity,
    S: EntityStore<T> + ?Sized,
{
    fn find_by_id(&self, id: &T::Id) -> StoreResult<Option<T>> {
        (**self).find_by_id(id)
    }

    fn exists_by_id(&self, id: &T::Id) -> StoreResult<bool> {
        (**self).exists_by_id(id)
    }

    fn delete_by_id(&self, id: &T::Id) -> StoreResult<bool> {
        (**self).delete_by_id(id)
    }

    fn save(&self, entity: T) -> StoreResult<T> {
        (**self).save(entity)
    }

    fn find_all(&self, predicate: &Predicate) -> StoreResult<Vec<T>> {
        (**self).find_all(predicate)
    }

    fn find_page(&self, plan: &QueryPlan) -> StoreResult<Slice<T>> {
        (**self).find_page(plan)
    }

    fn find_one(&self, predicate: &Predicate) -> StoreResult<Option<T>> {
        (**self).find_one(predicate)
    }
}
