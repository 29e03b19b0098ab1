//! Credential loading and password verification.

use thiserror::Error;
use tracing::{info, warn};

use crate::context::SecurityContext;
use crate::principal::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("principal not found: {0}")]
    PrincipalNotFound(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account disabled")]
    Disabled,

    #[error("credential store unavailable: {0}")]
    Backend(String),
}

/// Source of principals for authentication.
pub trait CredentialStore: Send + Sync {
    fn load_principal(&self, identifier: &str) -> Result<Principal, AuthError>;
}

/// Pluggable password hashing. No algorithm ships with this crate.
pub trait PasswordEncoder: Send + Sync {
    fn encode(&self, raw: &str) -> String;
    fn matches(&self, raw: &str, encoded: &str) -> bool;
}

impl<S: CredentialStore + ?Sized> CredentialStore for std::sync::Arc<S> {
    fn load_principal(&self, identifier: &str) -> Result<Principal, AuthError> {
        (**self).load_principal(identifier)
    }
}

impl<E: PasswordEncoder + ?Sized> PasswordEncoder for std::sync::Arc<E> {
    fn encode(&self, raw: &str) -> String {
        (**self).encode(raw)
    }

    fn matches(&self, raw: &str, encoded: &str) -> bool {
        (**self).matches(raw, encoded)
    }
}

/// Verify credentials and open a security context.
///
/// Unknown identifiers and wrong passwords are indistinguishable to the
/// caller.
pub fn authenticate(
    store: &dyn CredentialStore,
    encoder: &dyn PasswordEncoder,
    identifier: &str,
    password: &str,
) -> Result<SecurityContext, AuthError> {
    let principal = match store.load_principal(identifier) {
        Ok(p) => p,
        Err(AuthError::PrincipalNotFound(_)) => {
            warn!(identifier, "authentication failed: unknown principal");
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => return Err(e),
    };

    if !principal.enabled {
        warn!(identifier, "authentication failed: account disabled");
        return Err(AuthError::Disabled);
    }

    if !encoder.matches(password, &principal.credential_hash) {
        warn!(identifier, "authentication failed: bad credentials");
        return Err(AuthError::InvalidCredentials);
    }

    let ctx = SecurityContext::authenticated(&principal);
    info!(
        principal = %principal.id,
        authorities = ctx.authorities().len(),
        "authenticated"
    );
    Ok(ctx)
}
