use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use storehub_auth::{
    Capability, DeclaresCapability, Permission, Role, RoleDraft, RoleKind, SecurityContext, User,
    ROLE_SCHEMA,
};
use storehub_core::{Entity, PermissionId, RoleId, UserId};
use storehub_query::{Page, PageFilter, Predicate};

use super::{detach_role, propagate_role, run};
use crate::cache::CacheAside;
use crate::error::{ServiceError, ServiceResult};
use crate::paging::find_page;
use crate::store::SharedStore;

const USERS_PREFIX: &str = "users:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleOp {
    List,
    Search,
    Get,
    RolesForUser,
    Create,
    Update,
    Delete,
}

impl DeclaresCapability for RoleOp {
    fn required_capability(&self) -> Capability {
        match self {
            RoleOp::List | RoleOp::Search | RoleOp::Get | RoleOp::RolesForUser => {
                Capability::permission("read")
            }
            RoleOp::Create | RoleOp::Update | RoleOp::Delete => Capability::permission("write"),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            RoleOp::List => "roles.list",
            RoleOp::Search => "roles.search",
            RoleOp::Get => "roles.get",
            RoleOp::RolesForUser => "roles.for_user",
            RoleOp::Create => "roles.create",
            RoleOp::Update => "roles.update",
            RoleOp::Delete => "roles.delete",
        }
    }
}

/// Role management. Users embed role copies, so updates and deletes are
/// pushed into every holder and the `users` cache namespace is evicted.
#[derive(Clone)]
pub struct RoleService {
    roles: SharedStore<Role>,
    permissions: SharedStore<Permission>,
    users: SharedStore<User>,
    cache: Arc<CacheAside>,
}

impl RoleService {
    pub fn new(
        roles: SharedStore<Role>,
        permissions: SharedStore<Permission>,
        users: SharedStore<User>,
        cache: Arc<CacheAside>,
    ) -> Self {
        Self {
            roles,
            permissions,
            users,
            cache,
        }
    }

    pub fn list(&self, ctx: &SecurityContext) -> ServiceResult<Vec<Role>> {
        run(ctx, RoleOp::List, || Ok(self.roles.find_all(&Predicate::True)?))
    }

    pub fn search(&self, ctx: &SecurityContext, filter: &PageFilter) -> ServiceResult<Page<Role>> {
        run(ctx, RoleOp::Search, || {
            let request = filter.validate()?;
            find_page(&*self.roles, &ROLE_SCHEMA, &request)
        })
    }

    pub fn get(&self, ctx: &SecurityContext, id: RoleId) -> ServiceResult<Role> {
        run(ctx, RoleOp::Get, || self.load(id))
    }

    pub fn roles_for_user(&self, ctx: &SecurityContext, user_id: UserId) -> ServiceResult<Vec<Role>> {
        run(ctx, RoleOp::RolesForUser, || {
            let user = self
                .users
                .find_by_id(&user_id)?
                .ok_or_else(|| ServiceError::not_found(User::KIND, user_id))?;
            Ok(user.roles)
        })
    }

    pub fn create(&self, ctx: &SecurityContext, draft: RoleDraft) -> ServiceResult<Role> {
        run(ctx, RoleOp::Create, || {
            draft.validate()?;
            self.ensure_name_free(draft.name, None)?;
            let permissions = self.load_permissions(&draft.permissions)?;
            let role = self
                .roles
                .save(Role::new(draft.name, draft.description, permissions))?;
            info!(role = %role.id, name = %role.name, "role created");
            Ok(role)
        })
    }

    pub fn update(&self, ctx: &SecurityContext, id: RoleId, draft: RoleDraft) -> ServiceResult<Role> {
        run(ctx, RoleOp::Update, || {
            draft.validate()?;
            let mut role = self.load(id)?;
            self.ensure_name_free(draft.name, Some(id))?;

            role.permissions = self.load_permissions(&draft.permissions)?;
            role.name = draft.name;
            role.description = draft.description;
            role.updated_at = Utc::now();

            let role = self.roles.save(role)?;
            let holders = propagate_role(&*self.users, &role)?;
            self.cache.invalidate_matching(USERS_PREFIX);
            info!(role = %role.id, holders, "role updated");
            Ok(role)
        })
    }

    pub fn delete(&self, ctx: &SecurityContext, id: RoleId) -> ServiceResult<()> {
        run(ctx, RoleOp::Delete, || {
            if !self.roles.exists_by_id(&id)? {
                return Err(ServiceError::not_found(Role::KIND, id));
            }
            let holders = detach_role(&*self.users, id)?;
            self.roles.delete_by_id(&id)?;
            self.cache.invalidate_matching(USERS_PREFIX);
            info!(role = %id, holders, "role deleted");
            Ok(())
        })
    }

    fn load(&self, id: RoleId) -> ServiceResult<Role> {
        self.roles
            .find_by_id(&id)?
            .ok_or_else(|| ServiceError::not_found(Role::KIND, id))
    }

    fn load_permissions(&self, ids: &[PermissionId]) -> ServiceResult<Vec<Permission>> {
        ids.iter()
            .map(|id| {
                self.permissions
                    .find_by_id(id)?
                    .ok_or_else(|| ServiceError::not_found(Permission::KIND, id))
            })
            .collect()
    }

    fn ensure_name_free(&self, name: RoleKind, owner: Option<RoleId>) -> ServiceResult<()> {
        let predicate = Predicate::field_equals(&ROLE_SCHEMA, "name", name.as_str())?;
        match self.roles.find_one(&predicate)? {
            Some(existing) if Some(existing.id) != owner => {
                Err(ServiceError::already_exists(Role::KIND, "name", name.as_str()))
            }
            _ => Ok(()),
        }
    }
}
