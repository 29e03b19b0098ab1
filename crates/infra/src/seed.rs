//! Bootstrap data: the two base permissions, the two roles and an
//! administrator account.

use std::sync::Arc;

use tracing::{info, warn};

use storehub_auth::{
    normalize_email, PasswordEncoder, Permission, Role, RoleKind, User, PERMISSION_SCHEMA,
    READ_PERM, ROLE_SCHEMA, USER_SCHEMA, WRITE_PERM,
};
use storehub_query::Predicate;

use crate::config::AdminSeed;
use crate::error::ServiceResult;
use crate::store::SharedStore;

/// What one seed run created. A second run reports all zeros.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub permissions: usize,
    pub roles: usize,
    pub users: usize,
}

pub struct SetupLoader {
    permissions: SharedStore<Permission>,
    roles: SharedStore<Role>,
    users: SharedStore<User>,
    encoder: Arc<dyn PasswordEncoder>,
    admin: AdminSeed,
}

impl SetupLoader {
    pub fn new(
        permissions: SharedStore<Permission>,
        roles: SharedStore<Role>,
        users: SharedStore<User>,
        encoder: Arc<dyn PasswordEncoder>,
        admin: AdminSeed,
    ) -> Self {
        Self {
            permissions,
            roles,
            users,
            encoder,
            admin,
        }
    }

    /// Create whatever is missing. Existing rows are left untouched.
    pub fn run(&self) -> ServiceResult<SeedReport> {
        let mut report = SeedReport::default();

        let read = self.ensure_permission(READ_PERM, &mut report)?;
        let write = self.ensure_permission(WRITE_PERM, &mut report)?;

        let admin_role = self.ensure_role(RoleKind::Admin, vec![read.clone(), write], &mut report)?;
        self.ensure_role(RoleKind::User, vec![read], &mut report)?;

        self.ensure_admin(admin_role, &mut report)?;

        info!(
            permissions = report.permissions,
            roles = report.roles,
            users = report.users,
            "seed complete"
        );
        Ok(report)
    }

    /// The admin is skipped when either its username or its email is taken.
    fn ensure_admin(&self, admin_role: Role, report: &mut SeedReport) -> ServiceResult<()> {
        let by_username = Predicate::field_equals(&USER_SCHEMA, "username", &self.admin.username)?;
        if self.users.find_one(&by_username)?.is_some() {
            return Ok(());
        }
        let email = normalize_email(&self.admin.email);
        let by_email = Predicate::field_equals(&USER_SCHEMA, "email", &email)?;
        if let Some(holder) = self.users.find_one(&by_email)? {
            warn!(
                email = %email,
                holder = %holder.username,
                "admin email already registered to another account; admin not seeded"
            );
            return Ok(());
        }

        let hash = self.encoder.encode(&self.admin.password);
        self.users.save(User::new(
            self.admin.username.clone(),
            &self.admin.email,
            hash,
            vec![admin_role],
        ))?;
        report.users += 1;
        Ok(())
    }

    fn ensure_permission(&self, name: &str, report: &mut SeedReport) -> ServiceResult<Permission> {
        let predicate = Predicate::field_equals(&PERMISSION_SCHEMA, "name", name)?;
        if let Some(existing) = self.permissions.find_one(&predicate)? {
            return Ok(existing);
        }
        report.permissions += 1;
        Ok(self.permissions.save(Permission::new(name))?)
    }

    fn ensure_role(
        &self,
        kind: RoleKind,
        permissions: Vec<Permission>,
        report: &mut SeedReport,
    ) -> ServiceResult<Role> {
        let predicate = Predicate::field_equals(&ROLE_SCHEMA, "name", kind.as_str())?;
        if let Some(existing) = self.roles.find_one(&predicate)? {
            return Ok(existing);
        }
        report.roles += 1;
        let role = Role::new(kind, format!("ROLE_{kind}"), permissions);
        Ok(self.roles.save(role)?)
    }
}
