use storehub_core::UserId;

use crate::roles::Role;
use crate::user::User;

/// Credentials and grants loaded for an authentication attempt.
#[derive(Clone, PartialEq)]
pub struct Principal {
    pub id: UserId,
    pub identifier: String,
    pub credential_hash: String,
    pub enabled: bool,
    pub roles: Vec<Role>,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            identifier: user.email.clone(),
            credential_hash: user.credential_hash.clone(),
            enabled: user.enabled,
            roles: user.roles.clone(),
        }
    }
}

impl core::fmt::Debug for Principal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("identifier", &self.identifier)
            .field("enabled", &self.enabled)
            .field("roles", &self.roles.iter().map(|r| r.name).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
