//! Application services.
//!
//! Every public operation runs through [`run`]: an `observe` span around a
//! capability check, with the body executing only when the check passes.

pub mod permissions;
pub mod products;
pub mod roles;
pub mod users;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use storehub_auth::{guarded, DeclaresCapability, Role, SecurityContext, User, USER_SCHEMA};
use storehub_core::RoleId;
use storehub_observability::observe;
use storehub_query::Predicate;

use crate::cache::CacheAside;
use crate::error::ServiceResult;
use crate::store::EntityStore;

pub use permissions::{PermissionOp, PermissionService};
pub use products::{ProductOp, ProductService};
pub use roles::{RoleOp, RoleService};
pub use users::{UserOp, UserService};

pub(crate) fn run<O, T, F>(ctx: &SecurityContext, op: O, body: F) -> ServiceResult<T>
where
    O: DeclaresCapability,
    F: FnOnce() -> ServiceResult<T>,
{
    observe(op.name(), || guarded(ctx, &op, body))
}

/// `<namespace>:<kind>:<json of input>`, or `None` when the input does not
/// serialize. Callers load uncached in that case so distinct inputs never
/// share a key.
pub(crate) fn fingerprint_key<V: Serialize>(namespace: &str, kind: &str, input: &V) -> Option<String> {
    match serde_json::to_string(input) {
        Ok(json) => Some(format!("{namespace}:{kind}:{json}")),
        Err(e) => {
            warn!(namespace, kind, error = %e, "cache key not derivable; reading through");
            None
        }
    }
}

/// Read `load` through the cache under the fingerprint of `input`.
pub(crate) fn cached_by_input<I, V, F>(
    cache: &CacheAside,
    namespace: &str,
    kind: &str,
    input: &I,
    load: F,
) -> ServiceResult<V>
where
    I: Serialize,
    V: Serialize + DeserializeOwned,
    F: FnOnce() -> ServiceResult<V>,
{
    match fingerprint_key(namespace, kind, input) {
        Some(key) => cache.get_or_try_insert(&key, load),
        None => load(),
    }
}

fn users_holding(users: &dyn EntityStore<User>, role_id: RoleId) -> ServiceResult<Vec<User>> {
    let predicate = Predicate::field_equals(&USER_SCHEMA, "roles.id", &role_id.to_string())?;
    Ok(users.find_all(&predicate)?)
}

/// Replace the embedded copy of `role` in every user holding it.
pub(crate) fn propagate_role(users: &dyn EntityStore<User>, role: &Role) -> ServiceResult<usize> {
    let holders = users_holding(users, role.id)?;
    let count = holders.len();
    for mut user in holders {
        for held in user.roles.iter_mut().filter(|r| r.id == role.id) {
            *held = role.clone();
        }
        users.save(user)?;
    }
    Ok(count)
}

/// Drop `role_id` from every user holding it.
pub(crate) fn detach_role(users: &dyn EntityStore<User>, role_id: RoleId) -> ServiceResult<usize> {
    let holders = users_holding(users, role_id)?;
    let count = holders.len();
    for mut user in holders {
        user.roles.retain(|r| r.id != role_id);
        users.save(user)?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn fingerprint_embeds_the_input_json() {
        assert_eq!(
            fingerprint_key("products", "list", &[1, 2]).as_deref(),
            Some("products:list:[1,2]")
        );
    }

    #[test]
    fn unserializable_input_reads_through_without_caching() {
        // JSON object keys must be strings.
        let input: BTreeMap<(u8, u8), u8> = BTreeMap::from([((1, 2), 3)]);
        assert_eq!(fingerprint_key("users", "search", &input), None);

        let cache = CacheAside::new();
        let loads = Cell::new(0);
        for _ in 0..2 {
            let value = cached_by_input(&cache, "users", "search", &input, || {
                loads.set(loads.get() + 1);
                Ok(7)
            })
            .unwrap();
            assert_eq!(value, 7);
        }
        assert_eq!(loads.get(), 2);
        assert!(cache.is_empty());
    }
}
