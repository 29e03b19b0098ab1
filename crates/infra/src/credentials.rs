use storehub_auth::{normalize_email, AuthError, CredentialStore, Principal, User, USER_SCHEMA};
use storehub_query::Predicate;

use crate::store::SharedStore;

/// Loads principals from the user store. The identifier is tried as an
/// email first (case-insensitive), then as an exact username.
pub struct StoreCredentialStore {
    users: SharedStore<User>,
}

impl StoreCredentialStore {
    pub fn new(users: SharedStore<User>) -> Self {
        Self { users }
    }

    fn lookup(&self, key: &str, value: &str) -> Result<Option<User>, AuthError> {
        let predicate = Predicate::field_equals(&USER_SCHEMA, key, value)
            .map_err(|e| AuthError::Backend(e.to_string()))?;
        self.users
            .find_one(&predicate)
            .map_err(|e| AuthError::Backend(e.to_string()))
    }
}

impl CredentialStore for StoreCredentialStore {
    fn load_principal(&self, identifier: &str) -> Result<Principal, AuthError> {
        let user = match self.lookup("email", &normalize_email(identifier))? {
            Some(user) => user,
            None => self
                .lookup("username", identifier)?
                .ok_or_else(|| AuthError::PrincipalNotFound(identifier.to_string()))?,
        };
        Ok(Principal::from(&user))
    }
}
