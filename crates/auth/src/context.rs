//! Per-session security context.

use std::collections::BTreeSet;

use storehub_core::UserId;

use crate::authority::{resolve_authorities, AuthoritySet};
use crate::principal::Principal;
use crate::roles::RoleKind;

/// Snapshot of an authenticated principal.
///
/// Roles and authorities are copied at login; later edits to roles or
/// permissions do not reach an existing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    pub id: UserId,
    pub identifier: String,
    pub roles: BTreeSet<RoleKind>,
    pub authorities: AuthoritySet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityContext {
    principal: Option<AuthenticatedPrincipal>,
}

impl SecurityContext {
    pub fn anonymous() -> Self {
        Self { principal: None }
    }

    pub fn authenticated(principal: &Principal) -> Self {
        Self {
            principal: Some(AuthenticatedPrincipal {
                id: principal.id,
                identifier: principal.identifier.clone(),
                roles: principal.roles.iter().map(|r| r.name).collect(),
                authorities: resolve_authorities(principal),
            }),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn current_principal(&self) -> Option<&AuthenticatedPrincipal> {
        self.principal.as_ref()
    }

    /// Empty when anonymous.
    pub fn authorities(&self) -> AuthoritySet {
        self.principal
            .as_ref()
            .map(|p| p.authorities.clone())
            .unwrap_or_default()
    }

    pub fn has_role(&self, role: RoleKind) -> bool {
        self.principal
            .as_ref()
            .is_some_and(|p| p.roles.contains(&role))
    }
}
