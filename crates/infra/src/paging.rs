use storehub_core::Entity;
use storehub_query::{EntitySchema, Page, PageRequest, QueryPlan};

use crate::error::ServiceResult;
use crate::store::EntityStore;

/// Plan `request` against `schema`, run it on `store` and wrap the result.
pub fn find_page<T, S>(
    store: &S,
    schema: &'static EntitySchema,
    request: &PageRequest,
) -> ServiceResult<Page<T>>
where
    T: Entity,
    S: EntityStore<T> + ?Sized,
{
    let plan = QueryPlan::build(schema, request)?;
    let slice = store.find_page(&plan)?;
    Ok(Page::from_slice(slice, request))
}
