use std::sync::Arc;

use tracing::info;

use storehub_auth::{Capability, DeclaresCapability, SecurityContext};
use storehub_core::{Entity, ProductId};
use storehub_products::{Category, Product, ProductDraft, PRODUCT_SCHEMA};
use storehub_query::{Page, PageFilter, Predicate};

use super::{cached_by_input, run};
use crate::cache::CacheAside;
use crate::error::{ServiceError, ServiceResult};
use crate::paging::find_page;
use crate::store::SharedStore;

const NAMESPACE: &str = "products";
const EVICT_PREFIX: &str = "products:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductOp {
    List,
    Search,
    Get,
    ByCategory,
    Categories,
    Create,
    Update,
    Delete,
    ChangePrice,
    IncreaseQuantity,
}

impl DeclaresCapability for ProductOp {
    fn required_capability(&self) -> Capability {
        match self {
            ProductOp::List | ProductOp::Search | ProductOp::Get | ProductOp::ByCategory => {
                Capability::permission("read")
            }
            ProductOp::Categories => Capability::IsAuthenticated,
            ProductOp::Create
            | ProductOp::Update
            | ProductOp::Delete
            | ProductOp::ChangePrice
            | ProductOp::IncreaseQuantity => Capability::permission("write"),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ProductOp::List => "products.list",
            ProductOp::Search => "products.search",
            ProductOp::Get => "products.get",
            ProductOp::ByCategory => "products.by_category",
            ProductOp::Categories => "products.categories",
            ProductOp::Create => "products.create",
            ProductOp::Update => "products.update",
            ProductOp::Delete => "products.delete",
            ProductOp::ChangePrice => "products.change_price",
            ProductOp::IncreaseQuantity => "products.increase_quantity",
        }
    }
}

fn id_key(id: ProductId) -> String {
    format!("{NAMESPACE}:id:{id}")
}

/// Catalog operations.
///
/// Listing, lookup and category reads go through the cache. Create, update
/// and delete evict the whole `products` namespace. Price and stock changes
/// only refresh the by-id entry.
#[derive(Clone)]
pub struct ProductService {
    store: SharedStore<Product>,
    cache: Arc<CacheAside>,
}

impl ProductService {
    pub fn new(store: SharedStore<Product>, cache: Arc<CacheAside>) -> Self {
        Self { store, cache }
    }

    pub fn list(&self, ctx: &SecurityContext, filter: &PageFilter) -> ServiceResult<Page<Product>> {
        run(ctx, ProductOp::List, || {
            let request = filter.validate()?;
            cached_by_input(&self.cache, NAMESPACE, "list", &request, || {
                find_page(&*self.store, &PRODUCT_SCHEMA, &request)
            })
        })
    }

    /// Same as [`ProductService::list`] but always hits the store.
    pub fn search(&self, ctx: &SecurityContext, filter: &PageFilter) -> ServiceResult<Page<Product>> {
        run(ctx, ProductOp::Search, || {
            let request = filter.validate()?;
            find_page(&*self.store, &PRODUCT_SCHEMA, &request)
        })
    }

    pub fn get(&self, ctx: &SecurityContext, id: ProductId) -> ServiceResult<Product> {
        run(ctx, ProductOp::Get, || {
            let key = id_key(id);
            if let Some(hit) = self.cache.get::<Product>(&key) {
                return Ok(hit);
            }
            let product = self.load(id)?;
            self.cache.put(key, &product);
            Ok(product)
        })
    }

    pub fn by_category(&self, ctx: &SecurityContext, category: Category) -> ServiceResult<Vec<Product>> {
        run(ctx, ProductOp::ByCategory, || {
            let key = format!("{NAMESPACE}:category:{category}");
            self.cache.get_or_try_insert(&key, || {
                let predicate =
                    Predicate::field_equals(&PRODUCT_SCHEMA, "category", category.as_str())?;
                Ok(self.store.find_all(&predicate)?)
            })
        })
    }

    pub fn categories(&self, ctx: &SecurityContext) -> ServiceResult<Vec<Category>> {
        run(ctx, ProductOp::Categories, || Ok(Category::ALL.to_vec()))
    }

    pub fn create(&self, ctx: &SecurityContext, draft: ProductDraft) -> ServiceResult<Product> {
        run(ctx, ProductOp::Create, || {
            self.ensure_name_free(&draft.name, None)?;
            let product = self.store.save(Product::from_draft(draft)?)?;
            self.cache.invalidate_matching(EVICT_PREFIX);
            info!(product = %product.id, name = %product.name, "product created");
            Ok(product)
        })
    }

    pub fn update(
        &self,
        ctx: &SecurityContext,
        id: ProductId,
        draft: ProductDraft,
    ) -> ServiceResult<Product> {
        run(ctx, ProductOp::Update, || {
            let mut product = self.load(id)?;
            self.ensure_name_free(&draft.name, Some(id))?;
            product.apply(draft)?;
            let product = self.store.save(product)?;
            self.cache.invalidate_matching(EVICT_PREFIX);
            Ok(product)
        })
    }

    pub fn delete(&self, ctx: &SecurityContext, id: ProductId) -> ServiceResult<()> {
        run(ctx, ProductOp::Delete, || {
            if !self.store.delete_by_id(&id)? {
                return Err(ServiceError::not_found(Product::KIND, id));
            }
            self.cache.invalidate_matching(EVICT_PREFIX);
            info!(product = %id, "product deleted");
            Ok(())
        })
    }

    pub fn change_price(&self, ctx: &SecurityContext, id: ProductId, amount: f64) -> ServiceResult<Product> {
        run(ctx, ProductOp::ChangePrice, || {
            let mut product = self.load(id)?;
            product.change_price(amount)?;
            let product = self.store.save(product)?;
            self.cache.put(id_key(id), &product);
            Ok(product)
        })
    }

    pub fn increase_quantity(
        &self,
        ctx: &SecurityContext,
        id: ProductId,
        amount: i32,
    ) -> ServiceResult<Product> {
        run(ctx, ProductOp::IncreaseQuantity, || {
            let mut product = self.load(id)?;
            product.increase_quantity(amount)?;
            let product = self.store.save(product)?;
            self.cache.put(id_key(id), &product);
            Ok(product)
        })
    }

    fn load(&self, id: ProductId) -> ServiceResult<Product> {
        self.store
            .find_by_id(&id)?
            .ok_or_else(|| ServiceError::not_found(Product::KIND, id))
    }

    /// A name held by `owner` itself is not a conflict.
    fn ensure_name_free(&self, name: &str, owner: Option<ProductId>) -> ServiceResult<()> {
        let predicate = Predicate::field_equals(&PRODUCT_SCHEMA, "name", name)?;
        match self.store.find_one(&predicate)? {
            Some(existing) if Some(existing.id) != owner => {
                Err(ServiceError::already_exists(Product::KIND, "name", name))
            }
            _ => Ok(()),
        }
    }
}
