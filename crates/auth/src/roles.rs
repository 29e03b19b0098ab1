use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storehub_core::{DomainError, DomainResult, Entity, PermissionId, RoleId};
use storehub_query::{
    EntitySchema, Field, FieldDef, FieldKind, JoinTable, Queryable, Record, Relation,
};

use crate::permissions::{Permission, PERMISSION_SCHEMA};

pub const MIN_DESCRIPTION_LEN: usize = 8;

/// The closed set of role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoleKind {
    Admin,
    User,
}

impl RoleKind {
    pub const NAMES: &'static [&'static str] = &["ADMIN", "USER"];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::Admin => "ADMIN",
            RoleKind::User => "USER",
        }
    }
}

impl core::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(RoleKind::Admin),
            "USER" => Ok(RoleKind::User),
            other => Err(DomainError::validation(format!("unknown role: {other}"))),
        }
    }
}

pub static ROLE_SCHEMA: EntitySchema = EntitySchema {
    entity: "Role",
    table: "roles",
    fields: &[
        FieldDef::new("id", "id", FieldKind::Identifier),
        FieldDef::new("name", "name", FieldKind::Enumeration(RoleKind::NAMES)),
        FieldDef::new("description", "description", FieldKind::Text),
        FieldDef::new("createdAt", "created_at", FieldKind::Timestamp),
        FieldDef::new("updatedAt", "updated_at", FieldKind::Timestamp),
        FieldDef::new(
            "permissions",
            "permissions",
            FieldKind::Relation(Relation {
                target: &PERMISSION_SCHEMA,
                join: JoinTable {
                    table: "roles_permissions",
                    owner_column: "role_id",
                    target_column: "permission_id",
                },
            }),
        ),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleKind,
    pub description: String,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn new(name: RoleKind, description: impl Into<String>, permissions: Vec<Permission>) -> Self {
        let now = Utc::now();
        Self {
            id: RoleId::new(),
            name,
            description: description.into(),
            permissions,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_permission(&self, id: PermissionId) -> bool {
        self.permissions.iter().any(|p| p.id == id)
    }
}

impl Entity for Role {
    type Id = RoleId;
    const KIND: &'static str = "Role";

    fn id(&self) -> &RoleId {
        &self.id
    }
}

impl Record for Role {
    fn field(&self, name: &str) -> Field<'_> {
        match name {
            "id" => Field::Value((*self.id.as_uuid()).into()),
            "name" => Field::Value(self.name.as_str().into()),
            "description" => Field::Value(self.description.as_str().into()),
            "createdAt" => Field::Value(self.created_at.into()),
            "updatedAt" => Field::Value(self.updated_at.into()),
            "permissions" => Field::Related(
                self.permissions
                    .iter()
                    .map(|p| p as &dyn Record)
                    .collect(),
            ),
            _ => Field::Missing,
        }
    }
}

impl Queryable for Role {
    fn schema() -> &'static EntitySchema {
        &ROLE_SCHEMA
    }
}

/// Create/update input for a role. Permissions are referenced by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDraft {
    pub name: RoleKind,
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<PermissionId>,
}

impl RoleDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("Must set a description"));
        }
        if self.description.chars().count() < MIN_DESCRIPTION_LEN {
            return Err(DomainError::validation(format!(
                "description must be at least {MIN_DESCRIPTION_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storehub_query::{build_predicate, FilterCriterion, FilterOperator};

    #[test]
    fn role_kind_round_trips_through_json() {
        let json = serde_json::to_string(&RoleKind::Admin).unwrap();
        assert_eq!(json, "\"ADMIN\"");
        assert_eq!("USER".parse::<RoleKind>().unwrap(), RoleKind::User);
        assert!("ROOT".parse::<RoleKind>().is_err());
    }

    #[test]
    fn short_description_is_rejected() {
        let draft = RoleDraft {
            name: RoleKind::User,
            description: "short".into(),
            permissions: Vec::new(),
        };
        assert!(draft.validate().is_err());

        let draft = RoleDraft {
            description: "exactly8".into(),
            ..draft
        };
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn roles_filter_by_permission_name() {
        let read = Permission::new("READ_PERM");
        let write = Permission::new("WRITE_PERM");
        let admin = Role::new(RoleKind::Admin, "administrators", vec![read.clone(), write]);
        let user = Role::new(RoleKind::User, "regular users", vec![read]);

        let predicate = build_predicate(
            &ROLE_SCHEMA,
            &[FilterCriterion::new("permissions.name", FilterOperator::Equals, ["WRITE_PERM"])],
        )
        .unwrap();
        assert!(predicate.matches(&admin));
        assert!(!predicate.matches(&user));
    }

    #[test]
    fn unknown_role_name_is_a_value_error() {
        let err = build_predicate(
            &ROLE_SCHEMA,
            &[FilterCriterion::new("name", FilterOperator::Equals, ["ROOT"])],
        )
        .unwrap_err();
        assert!(err.to_string().contains("ADMIN, USER"));
    }
}
