use thiserror::Error;
use tracing::debug;

use crate::authority::Authority;
use crate::context::SecurityContext;
use crate::roles::RoleKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// Generic denial. Never names the missing capability.
    #[error("access denied")]
    Denied,
}

/// Requirement an operation declares before it may run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    IsAuthenticated,
    HasRole(RoleKind),
    HasAuthority(Authority),
}

impl Capability {
    /// `Capability::permission("read")` requires `READ_PERM`.
    pub fn permission(action: &str) -> Self {
        Capability::HasAuthority(Authority::for_action(action))
    }

    pub fn is_satisfied_by(&self, ctx: &SecurityContext) -> bool {
        let Some(principal) = ctx.current_principal() else {
            return false;
        };
        match self {
            Capability::IsAuthenticated => true,
            Capability::HasRole(role) => principal.roles.contains(role),
            Capability::HasAuthority(authority) => principal.authorities.contains(authority),
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Capability::IsAuthenticated => f.write_str("isAuthenticated()"),
            Capability::HasRole(role) => write!(f, "hasRole('{role}')"),
            Capability::HasAuthority(authority) => write!(f, "hasAuthority('{authority}')"),
        }
    }
}

/// Operation-side authorization contract.
///
/// Implement this on a service's operation enum; [`guarded`] enforces it
/// before the operation body runs.
pub trait DeclaresCapability {
    fn required_capability(&self) -> Capability;
    fn name(&self) -> &'static str;
}

/// `false` for anonymous contexts; never fails.
pub fn has_authority(ctx: &SecurityContext, action: &str) -> bool {
    Capability::permission(action).is_satisfied_by(ctx)
}

/// Check one capability against the session.
///
/// - No IO
/// - No panics
pub fn authorize(ctx: &SecurityContext, required: &Capability) -> Result<(), AuthzError> {
    if required.is_satisfied_by(ctx) {
        Ok(())
    } else {
        debug!(
            principal = ctx.current_principal().map(|p| p.identifier.as_str()),
            required = %required,
            "authorization denied"
        );
        Err(AuthzError::Denied)
    }
}

/// Run `body` only when `ctx` satisfies the operation's capability.
pub fn guarded<O, T, E, F>(ctx: &SecurityContext, op: &O, body: F) -> Result<T, E>
where
    O: DeclaresCapability + ?Sized,
    E: From<AuthzError>,
    F: FnOnce() -> Result<T, E>,
{
    authorize(ctx, &op.required_capability())?;
    body()
}
