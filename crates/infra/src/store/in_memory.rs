use std::collections::HashMap;
use std::sync::RwLock;

use storehub_core::Entity;
use storehub_query::{Predicate, QueryPlan, Record, Slice};

use super::{EntityStore, StoreError, StoreResult};

type KeyFn<T> = Box<dyn Fn(&T) -> String + Send + Sync>;

struct UniqueKey<T> {
    field: &'static str,
    key: KeyFn<T>,
}

/// In-memory entity store for tests/dev.
///
/// Unique keys declared with [`InMemoryEntityStore::with_unique`] are checked
/// under the write lock on every `save`.
pub struct InMemoryEntityStore<T: Entity> {
    inner: RwLock<HashMap<T::Id, T>>,
    unique: Vec<UniqueKey<T>>,
}

impl<T: Entity> InMemoryEntityStore<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            unique: Vec::new(),
        }
    }

    pub fn with_unique(
        mut self,
        field: &'static str,
        key: impl Fn(&T) -> String + Send + Sync + 'static,
    ) -> Self {
        self.unique.push(UniqueKey {
            field,
            key: Box::new(key),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Entity> Default for InMemoryEntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

impl<T> EntityStore<T> for InMemoryEntityStore<T>
where
    T: Entity + Record + Clone + Send + Sync + 'static,
{
    fn find_by_id(&self, id: &T::Id) -> StoreResult<Option<T>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(id).cloned())
    }

    fn exists_by_id(&self, id: &T::Id) -> StoreResult<bool> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.contains_key(id))
    }

    fn delete_by_id(&self, id: &T::Id) -> StoreResult<bool> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(id).is_some())
    }

    fn save(&self, entity: T) -> StoreResult<T> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        for unique in &self.unique {
            let value = (unique.key)(&entity);
            let taken = map
                .values()
                .any(|other| other.id() != entity.id() && (unique.key)(other) == value);
            if taken {
                return Err(StoreError::UniqueViolation {
                    entity: T::KIND,
                    field: unique.field,
                    value,
                });
            }
        }
        map.insert(*entity.id(), entity.clone());
        Ok(entity)
    }

    /// Rows come back in id order.
    fn find_all(&self, predicate: &Predicate) -> StoreResult<Vec<T>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut rows: Vec<T> = map
            .values()
            .filter(|row| predicate.matches(*row))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(rows)
    }

    fn find_page(&self, plan: &QueryPlan) -> StoreResult<Slice<T>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(plan.apply(map.values().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storehub_products::{Category, Product, ProductDraft, PRODUCT_SCHEMA};
    use storehub_query::{build_predicate, FilterCriterion, FilterOperator, PageRequest, SortDirection};

    fn store() -> InMemoryEntityStore<Product> {
        InMemoryEntityStore::new().with_unique("name", |p: &Product| p.name.clone())
    }

    fn product(name: &str, price: f64) -> Product {
        Product::from_draft(ProductDraft::new(name, Category::Fruits, price, 1)).unwrap()
    }

    #[test]
    fn save_then_find() {
        let store = store();
        let p = store.save(product("apple", 1.0)).unwrap();
        assert_eq!(store.find_by_id(&p.id).unwrap(), Some(p.clone()));
        assert!(store.exists_by_id(&p.id).unwrap());
        assert!(store.delete_by_id(&p.id).unwrap());
        assert!(!store.delete_by_id(&p.id).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn unique_key_is_enforced_across_rows_only() {
        let store = store();
        let mut apple = store.save(product("apple", 1.0)).unwrap();

        let err = store.save(product("apple", 2.0)).unwrap_err();
        assert_eq!(
            err,
            StoreError::UniqueViolation {
                entity: "Product",
                field: "name",
                value: "apple".into()
            }
        );

        apple.price = 3.0;
        assert!(store.save(apple).is_ok());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn find_all_and_page() {
        let store = store();
        for (name, price) in [("a", 5.0), ("b", 15.0), ("c", 25.0)] {
            store.save(product(name, price)).unwrap();
        }
        let predicate = build_predicate(
            &PRODUCT_SCHEMA,
            &[FilterCriterion::new("price", FilterOperator::GreaterThan, ["10"])],
        )
        .unwrap();
        assert_eq!(store.find_all(&predicate).unwrap().len(), 2);

        let plan = storehub_query::QueryPlan::build(
            &PRODUCT_SCHEMA,
            &PageRequest::new(0, 1, "price", SortDirection::Desc),
        )
        .unwrap();
        let slice = store.find_page(&plan).unwrap();
        assert_eq!(slice.total, 3);
        assert_eq!(slice.content[0].name, "c");
    }
}
