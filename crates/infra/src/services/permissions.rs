use std::sync::Arc;

use tracing::info;

use storehub_auth::{
    Capability, DeclaresCapability, Permission, PermissionDraft, Role, RoleKind, SecurityContext,
    User, PERMISSION_SCHEMA, ROLE_SCHEMA,
};
use storehub_core::{Entity, PermissionId};
use storehub_query::{Page, PageFilter, Predicate};

use super::{propagate_role, run};
use crate::cache::CacheAside;
use crate::error::{ServiceError, ServiceResult};
use crate::paging::find_page;
use crate::store::SharedStore;

const USERS_PREFIX: &str = "users:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOp {
    List,
    Search,
    Get,
    Create,
    Update,
    Delete,
}

impl DeclaresCapability for PermissionOp {
    fn required_capability(&self) -> Capability {
        match self {
            PermissionOp::List | PermissionOp::Search | PermissionOp::Get => {
                Capability::permission("read")
            }
            PermissionOp::Create | PermissionOp::Update | PermissionOp::Delete => {
                Capability::HasRole(RoleKind::Admin)
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PermissionOp::List => "permissions.list",
            PermissionOp::Search => "permissions.search",
            PermissionOp::Get => "permissions.get",
            PermissionOp::Create => "permissions.create",
            PermissionOp::Update => "permissions.update",
            PermissionOp::Delete => "permissions.delete",
        }
    }
}

#[derive(Clone)]
pub struct PermissionService {
    permissions: SharedStore<Permission>,
    roles: SharedStore<Role>,
    users: SharedStore<User>,
    cache: Arc<CacheAside>,
}

impl PermissionService {
    pub fn new(
        permissions: SharedStore<Permission>,
        roles: SharedStore<Role>,
        users: SharedStore<User>,
        cache: Arc<CacheAside>,
    ) -> Self {
        Self {
            permissions,
            roles,
            users,
            cache,
        }
    }

    pub fn list(&self, ctx: &SecurityContext) -> ServiceResult<Vec<Permission>> {
        run(ctx, PermissionOp::List, || {
            Ok(self.permissions.find_all(&Predicate::True)?)
        })
    }

    pub fn search(&self, ctx: &SecurityContext, filter: &PageFilter) -> ServiceResult<Page<Permission>> {
        run(ctx, PermissionOp::Search, || {
            let request = filter.validate()?;
            find_page(&*self.permissions, &PERMISSION_SCHEMA, &request)
        })
    }

    pub fn get(&self, ctx: &SecurityContext, id: PermissionId) -> ServiceResult<Permission> {
        run(ctx, PermissionOp::Get, || self.load(id))
    }

    pub fn create(&self, ctx: &SecurityContext, draft: PermissionDraft) -> ServiceResult<Permission> {
        run(ctx, PermissionOp::Create, || {
            draft.validate()?;
            self.ensure_name_free(&draft.name, None)?;
            let permission = self.permissions.save(Permission::new(draft.name))?;
            info!(permission = %permission.id, name = %permission.name, "permission created");
            Ok(permission)
        })
    }

    /// Renames propagate into every role carrying the permission and from
    /// there into the users holding those roles.
    pub fn update(
        &self,
        ctx: &SecurityContext,
        id: PermissionId,
        draft: PermissionDraft,
    ) -> ServiceResult<Permission> {
        run(ctx, PermissionOp::Update, || {
            draft.validate()?;
            let mut permission = self.load(id)?;
            self.ensure_name_free(&draft.name, Some(id))?;
            permission.name = draft.name;
            let permission = self.permissions.save(permission)?;

            self.rewrite_roles(id, |perms| {
                for held in perms.iter_mut().filter(|p| p.id == id) {
                    *held = permission.clone();
                }
            })?;
            Ok(permission)
        })
    }

    pub fn delete(&self, ctx: &SecurityContext, id: PermissionId) -> ServiceResult<()> {
        run(ctx, PermissionOp::Delete, || {
            if !self.permissions.exists_by_id(&id)? {
                return Err(ServiceError::not_found(Permission::KIND, id));
            }
            self.rewrite_roles(id, |perms| perms.retain(|p| p.id != id))?;
            self.permissions.delete_by_id(&id)?;
            info!(permission = %id, "permission deleted");
            Ok(())
        })
    }

    /// Apply `edit` to every role carrying `id`, then refresh their holders.
    fn rewrite_roles(
        &self,
        id: PermissionId,
        edit: impl Fn(&mut Vec<Permission>),
    ) -> ServiceResult<()> {
        let predicate = Predicate::field_equals(&ROLE_SCHEMA, "permissions.id", &id.to_string())?;
        let affected = self.roles.find_all(&predicate)?;
        let count = affected.len();
        for mut role in affected {
            edit(&mut role.permissions);
            let role = self.roles.save(role)?;
            propagate_role(&*self.users, &role)?;
        }
        if count > 0 {
            self.cache.invalidate_matching(USERS_PREFIX);
        }
        Ok(())
    }

    fn load(&self, id: PermissionId) -> ServiceResult<Permission> {
        self.permissions
            .find_by_id(&id)?
            .ok_or_else(|| ServiceError::not_found(Permission::KIND, id))
    }

    fn ensure_name_free(&self, name: &str, owner: Option<PermissionId>) -> ServiceResult<()> {
        let predicate = Predicate::field_equals(&PERMISSION_SCHEMA, "name", name)?;
        match self.permissions.find_one(&predicate)? {
            Some(existing) if Some(existing.id) != owner => {
                Err(ServiceError::already_exists(Permission::KIND, "name", name))
            }
            _ => Ok(()),
        }
    }
}
