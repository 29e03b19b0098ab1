//! User accounts.
//!
//! Roles are held denormalized on the user so the in-memory backend can walk
//! `roles.permissions.name` without a second lookup. Emails are stored
//! lowercased.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storehub_core::{DomainError, DomainResult, Entity, RoleId, UserId};
use storehub_query::{
    EntitySchema, Field, FieldDef, FieldKind, JoinTable, Queryable, Record, Relation,
};

use crate::roles::{Role, ROLE_SCHEMA};

pub static USER_SCHEMA: EntitySchema = EntitySchema {
    entity: "User",
    table: "users",
    fields: &[
        FieldDef::new("id", "id", FieldKind::Identifier),
        FieldDef::new("username", "username", FieldKind::Text),
        FieldDef::new("email", "email", FieldKind::Text),
        FieldDef::new("enabled", "enabled", FieldKind::Boolean),
        FieldDef::new("createdAt", "created_at", FieldKind::Timestamp),
        FieldDef::new("updatedAt", "updated_at", FieldKind::Timestamp),
        FieldDef::new(
            "roles",
            "roles",
            FieldKind::Relation(Relation {
                target: &ROLE_SCHEMA,
                join: JoinTable {
                    table: "users_roles",
                    owner_column: "user_id",
                    target_column: "role_id",
                },
            }),
        ),
    ],
};

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub credential_hash: String,
    pub enabled: bool,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        email: &str,
        credential_hash: impl Into<String>,
        roles: Vec<Role>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            username: username.into(),
            email: normalize_email(email),
            credential_hash: credential_hash.into(),
            enabled: true,
            roles,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_role(&self, id: RoleId) -> bool {
        self.roles.iter().any(|r| r.id == id)
    }

    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            enabled: self.enabled,
            roles: self.roles.iter().map(|r| r.id).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl core::fmt::Debug for User {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("credential_hash", &"<redacted>")
            .field("enabled", &self.enabled)
            .field("roles", &self.roles)
            .finish()
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Entity for User {
    type Id = UserId;
    const KIND: &'static str = "User";

    fn id(&self) -> &UserId {
        &self.id
    }
}

impl Record for User {
    fn field(&self, name: &str) -> Field<'_> {
        match name {
            "id" => Field::Value((*self.id.as_uuid()).into()),
            "username" => Field::Value(self.username.as_str().into()),
            "email" => Field::Value(self.email.as_str().into()),
            "enabled" => Field::Value(self.enabled.into()),
            "createdAt" => Field::Value(self.created_at.into()),
            "updatedAt" => Field::Value(self.updated_at.into()),
            "roles" => Field::Related(self.roles.iter().map(|r| r as &dyn Record).collect()),
            _ => Field::Missing,
        }
    }
}

impl Queryable for User {
    fn schema() -> &'static EntitySchema {
        &USER_SCHEMA
    }
}

/// Outward view of a user. Never carries the credential hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub enabled: bool,
    pub roles: Vec<RoleId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update input for a user. The password is raw and is encoded by
/// the service before storage.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

impl core::fmt::Debug for UserDraft {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserDraft")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

impl UserDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.username.trim().is_empty() {
            return Err(DomainError::validation("Must set a username"));
        }
        if self.email.trim().is_empty() {
            return Err(DomainError::validation("Must set a email"));
        }
        if !looks_like_email(self.email.trim()) {
            return Err(DomainError::validation("Email should be valid"));
        }
        if self.password.trim().is_empty() {
            return Err(DomainError::validation("Must set a password"));
        }
        Ok(())
    }

    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}
