use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use storehub_auth::{
    Capability, DeclaresCapability, PasswordEncoder, Role, RoleKind, SecurityContext, User,
    UserDraft, UserView, USER_SCHEMA,
};
use storehub_core::{Entity, RoleId, UserId};
use storehub_query::{Page, PageFilter, Predicate};

use super::{cached_by_input, run};
use crate::cache::CacheAside;
use crate::error::{ServiceError, ServiceResult};
use crate::paging::find_page;
use crate::store::SharedStore;

const NAMESPACE: &str = "users";
const EVICT_PREFIX: &str = "users:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOp {
    ListAll,
    Search,
    Get,
    Create,
    Update,
    Delete,
}

impl DeclaresCapability for UserOp {
    fn required_capability(&self) -> Capability {
        Capability::HasRole(RoleKind::Admin)
    }

    fn name(&self) -> &'static str {
        match self {
            UserOp::ListAll => "users.list_all",
            UserOp::Search => "users.search",
            UserOp::Get => "users.get",
            UserOp::Create => "users.create",
            UserOp::Update => "users.update",
            UserOp::Delete => "users.delete",
        }
    }
}

/// Account administration. Admin only; results never carry credential
/// hashes.
#[derive(Clone)]
pub struct UserService {
    users: SharedStore<User>,
    roles: SharedStore<Role>,
    encoder: Arc<dyn PasswordEncoder>,
    cache: Arc<CacheAside>,
}

impl UserService {
    pub fn new(
        users: SharedStore<User>,
        roles: SharedStore<Role>,
        encoder: Arc<dyn PasswordEncoder>,
        cache: Arc<CacheAside>,
    ) -> Self {
        Self {
            users,
            roles,
            encoder,
            cache,
        }
    }

    pub fn list_all(&self, ctx: &SecurityContext) -> ServiceResult<Vec<UserView>> {
        run(ctx, UserOp::ListAll, || {
            let key = format!("{NAMESPACE}:all");
            self.cache.get_or_try_insert(&key, || {
                let users = self.users.find_all(&Predicate::True)?;
                Ok(users.iter().map(User::view).collect())
            })
        })
    }

    pub fn search(&self, ctx: &SecurityContext, filter: &PageFilter) -> ServiceResult<Page<UserView>> {
        run(ctx, UserOp::Search, || {
            let request = filter.validate()?;
            cached_by_input(&self.cache, NAMESPACE, "search", &request, || {
                Ok(find_page(&*self.users, &USER_SCHEMA, &request)?.map(|u| u.view()))
            })
        })
    }

    pub fn get(&self, ctx: &SecurityContext, id: UserId) -> ServiceResult<UserView> {
        run(ctx, UserOp::Get, || {
            let key = format!("{NAMESPACE}:id:{id}");
            if let Some(hit) = self.cache.get::<UserView>(&key) {
                return Ok(hit);
            }
            let view = self.load(id)?.view();
            self.cache.put(key, &view);
            Ok(view)
        })
    }

    pub fn create(&self, ctx: &SecurityContext, draft: UserDraft) -> ServiceResult<UserView> {
        run(ctx, UserOp::Create, || {
            draft.validate()?;
            let email = draft.normalized_email();
            self.ensure_free("email", &email, None)?;
            self.ensure_free("username", &draft.username, None)?;
            let roles = self.load_roles(&draft.roles)?;

            let hash = self.encoder.encode(&draft.password);
            let user = self.users.save(User::new(draft.username, &email, hash, roles))?;
            self.cache.invalidate_matching(EVICT_PREFIX);
            info!(user = %user.id, "user created");
            Ok(user.view())
        })
    }

    /// Only a *different* user holding the username or email is a conflict.
    pub fn update(&self, ctx: &SecurityContext, id: UserId, draft: UserDraft) -> ServiceResult<UserView> {
        run(ctx, UserOp::Update, || {
            draft.validate()?;
            let mut user = self.load(id)?;
            let email = draft.normalized_email();
            self.ensure_free("email", &email, Some(id))?;
            self.ensure_free("username", &draft.username, Some(id))?;

            user.roles = self.load_roles(&draft.roles)?;
            user.credential_hash = self.encoder.encode(&draft.password);
            user.username = draft.username;
            user.email = email;
            user.updated_at = Utc::now();

            let user = self.users.save(user)?;
            self.cache.invalidate_matching(EVICT_PREFIX);
            Ok(user.view())
        })
    }

    pub fn delete(&self, ctx: &SecurityContext, id: UserId) -> ServiceResult<()> {
        run(ctx, UserOp::Delete, || {
            if !self.users.delete_by_id(&id)? {
                return Err(ServiceError::not_found(User::KIND, id));
            }
            self.cache.invalidate_matching(EVICT_PREFIX);
            info!(user = %id, "user deleted");
            Ok(())
        })
    }

    fn load(&self, id: UserId) -> ServiceResult<User> {
        self.users
            .find_by_id(&id)?
            .ok_or_else(|| ServiceError::not_found(User::KIND, id))
    }

    fn load_roles(&self, ids: &[RoleId]) -> ServiceResult<Vec<Role>> {
        ids.iter()
            .map(|id| {
                self.roles
                    .find_by_id(id)?
                    .ok_or_else(|| ServiceError::not_found(Role::KIND, id))
            })
            .collect()
    }

    fn ensure_free(&self, field: &'static str, value: &str, owner: Option<UserId>) -> ServiceResult<()> {
        let predicate = Predicate::field_equals(&USER_SCHEMA, field, value)?;
        match self.users.find_one(&predicate)? {
            Some(existing) if Some(existing.id) != owner => {
                Err(ServiceError::already_exists(User::KIND, field, value))
            }
            _ => Ok(()),
        }
    }
}
