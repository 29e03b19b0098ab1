use serde::{Deserialize, Serialize};

use storehub_core::{DomainError, DomainResult, Entity, PermissionId};
use storehub_query::{EntitySchema, Field, FieldDef, FieldKind, Queryable, Record};

pub static PERMISSION_SCHEMA: EntitySchema = EntitySchema {
    entity: "Permission",
    table: "permissions",
    fields: &[
        FieldDef::new("id", "id", FieldKind::Identifier),
        FieldDef::new("name", "name", FieldKind::Text),
    ],
};

/// Named grant, e.g. `READ_PERM`. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
}

impl Permission {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PermissionId::new(),
            name: name.into(),
        }
    }
}

impl Entity for Permission {
    type Id = PermissionId;
    const KIND: &'static str = "Permission";

    fn id(&self) -> &PermissionId {
        &self.id
    }
}

impl Record for Permission {
    fn field(&self, name: &str) -> Field<'_> {
        match name {
            "id" => Field::Value((*self.id.as_uuid()).into()),
            "name" => Field::Value(self.name.as_str().into()),
            _ => Field::Missing,
        }
    }
}

impl Queryable for Permission {
    fn schema() -> &'static EntitySchema {
        &PERMISSION_SCHEMA
    }
}

/// Create/update input for a permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDraft {
    pub name: String,
}

impl PermissionDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("permission name must not be blank"));
        }
        Ok(())
    }
}
