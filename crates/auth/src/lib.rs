//! `storehub-auth`: identity entities and the authorization boundary.
//!
//! No transport and no storage: credentials arrive through
//! [`CredentialStore`], hashing through [`PasswordEncoder`].

pub mod authority;
pub mod authorize;
pub mod context;
pub mod credentials;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authority::{resolve_authorities, Authority, AuthoritySet, READ_PERM, WRITE_PERM};
pub use authorize::{authorize, guarded, has_authority, AuthzError, Capability, DeclaresCapability};
pub use context::{AuthenticatedPrincipal, SecurityContext};
pub use credentials::{authenticate, AuthError, CredentialStore, PasswordEncoder};
pub use permissions::{Permission, PermissionDraft, PERMISSION_SCHEMA};
pub use principal::Principal;
pub use roles::{Role, RoleDraft, RoleKind, ROLE_SCHEMA};
pub use user::{normalize_email, User, UserDraft, UserView, USER_SCHEMA};
