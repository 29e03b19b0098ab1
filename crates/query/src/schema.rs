//! Static per-entity schema registry.
//!
//! Each entity module publishes an [`EntitySchema`] describing its queryable
//! fields. Filter keys are dot-paths resolved against it: every segment but
//! the last must be a relation, the last must be a scalar field.

use crate::error::{QueryError, QueryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    Int32,
    Int64,
}

#[derive(Debug, Clone, Copy)]
pub struct JoinTable {
    pub table: &'static str,
    /// Column holding the owning entity's id.
    pub owner_column: &'static str,
    /// Column holding the related entity's id.
    pub target_column: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Relation {
    pub target: &'static EntitySchema,
    pub join: JoinTable,
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Identifier,
    Text,
    Boolean,
    Integer(IntWidth),
    Float,
    Timestamp,
    Enumeration(&'static [&'static str]),
    Relation(Relation),
}

impl FieldKind {
    pub fn is_relation(&self) -> bool {
        matches!(self, FieldKind::Relation(_))
    }

    /// Kinds that range operators and `BETWEEN` constrain.
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            FieldKind::Integer(_) | FieldKind::Float | FieldKind::Timestamp
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

impl FieldDef {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self { name, column, kind }
    }
}

#[derive(Debug)]
pub struct EntitySchema {
    pub entity: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldDef],
}

impl EntitySchema {
    pub fn field(&'static self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The identity field used for tie-break ordering and joins.
    pub fn id_field(&'static self) -> Option<&'static FieldDef> {
        self.field("id")
    }

    pub fn id_column(&'static self) -> &'static str {
        self.id_field().map(|f| f.column).unwrap_or("id")
    }

    pub fn scalar_fields(&'static self) -> impl Iterator<Item = &'static FieldDef> {
        self.fields.iter().filter(|f| !f.kind.is_relation())
    }

    /// Resolve a dot-delimited field path.
    pub fn resolve(&'static self, key: &str) -> QueryResult<ResolvedPath> {
        if key.trim().is_empty() {
            return Err(QueryError::invalid_path(key, "field path is empty"));
        }

        let segments: Vec<&str> = key.split('.').collect();
        let (terminal, hops) = match segments.split_last() {
            Some(parts) => parts,
            None => return Err(QueryError::invalid_path(key, "field path is empty")),
        };

        let mut current: &'static EntitySchema = self;
        let mut relations = Vec::with_capacity(hops.len());
        for segment in hops {
            if segment.is_empty() {
                return Err(QueryError::invalid_path(key, "empty path segment"));
            }
            let def = current.field(segment).ok_or_else(|| {
                QueryError::invalid_path(
                    key,
                    format!("unknown field '{segment}' on {}", current.entity),
                )
            })?;
            match def.kind {
                FieldKind::Relation(rel) => {
                    relations.push(def);
                    current = rel.target;
                }
                _ => {
                    return Err(QueryError::invalid_path(
                        key,
                        format!("'{segment}' is not a relation"),
                    ));
                }
            }
        }

        if terminal.is_empty() {
            return Err(QueryError::invalid_path(key, "empty path segment"));
        }
        let field = current.field(terminal).ok_or_else(|| {
            QueryError::invalid_path(
                key,
                format!("unknown field '{terminal}' on {}", current.entity),
            )
        })?;
        if field.kind.is_relation() {
            return Err(QueryError::invalid_path(
                key,
                format!("'{terminal}' is a relation, not a scalar field"),
            ));
        }

        Ok(ResolvedPath {
            key: key.to_string(),
            root: self,
            relations,
            field,
        })
    }
}

/// A field path checked against a schema.
#[derive(Debug, Clone)]
pub struct ResolvedPath {
    pub key: String,
    pub root: &'static EntitySchema,
    /// Relation fields traversed, outermost first.
    pub relations: Vec<&'static FieldDef>,
    /// Terminal scalar field.
    pub field: &'static FieldDef,
}

impl ResolvedPath {
    pub fn is_root_level(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn kind(&self) -> &FieldKind {
        &self.field.kind
    }
}

impl PartialEq for ResolvedPath {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && core::ptr::eq(self.root, other.root)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! A small two-level schema shared by the crate's unit tests.

    use super::*;

    pub static TAG_SCHEMA: EntitySchema = EntitySchema {
        entity: "Tag",
        table: "tags",
        fields: &[
            FieldDef::new("id", "id", FieldKind::Identifier),
            FieldDef::new("label", "label", FieldKind::Text),
        ],
    };

    pub static GROUP_SCHEMA: EntitySchema = EntitySchema {
        entity: "Group",
        table: "groups",
        fields: &[
            FieldDef::new("id", "id", FieldKind::Identifier),
            FieldDef::new("name", "name", FieldKind::Enumeration(&["ALPHA", "BETA"])),
            FieldDef::new(
                "tags",
                "tags",
                FieldKind::Relation(Relation {
                    target: &TAG_SCHEMA,
                    join: JoinTable {
                        table: "groups_tags",
                        owner_column: "group_id",
                        target_column: "tag_id",
                    },
                }),
            ),
        ],
    };

    pub static ITEM_SCHEMA: EntitySchema = EntitySchema {
        entity: "Item",
        table: "items",
        fields: &[
            FieldDef::new("id", "id", FieldKind::Identifier),
            FieldDef::new("name", "name", FieldKind::Text),
            FieldDef::new("active", "active", FieldKind::Boolean),
            FieldDef::new("count", "item_count", FieldKind::Integer(IntWidth::Int32)),
            FieldDef::new("weight", "weight", FieldKind::Float),
            FieldDef::new("createdAt", "created_at", FieldKind::Timestamp),
            FieldDef::new(
                "groups",
                "groups",
                FieldKind::Relation(Relation {
                    target: &GROUP_SCHEMA,
                    join: JoinTable {
                        table: "items_groups",
                        owner_column: "item_id",
                        target_column: "group_id",
                    },
                }),
            ),
        ],
    };
}

#[cfg(test)]
mod tests {
    use super::fixtures::ITEM_SCHEMA;
    use super::*;

    #[test]
    fn resolves_root_field() {
        let path = ITEM_SCHEMA.resolve("count").unwrap();
        assert!(path.is_root_level());
        assert_eq!(path.field.column, "item_count");
    }

    #[test]
    fn resolves_nested_relation_path() {
        let path = ITEM_SCHEMA.resolve("groups.tags.label").unwrap();
        let names: Vec<_> = path.relations.iter().map(|r| r.name).collect();
        assert_eq!(names, ["groups", "tags"]);
        assert_eq!(path.field.name, "label");
    }

    #[test]
    fn rejects_unknown_segment() {
        let err = ITEM_SCHEMA.resolve("groups.missing").unwrap_err();
        assert!(matches!(err, QueryError::InvalidFieldPath { .. }));
    }

    #[test]
    fn rejects_scalar_in_non_terminal_position() {
        let err = ITEM_SCHEMA.resolve("name.length").unwrap_err();
        assert!(matches!(err, QueryError::InvalidFieldPath { ref reason, .. } if reason.contains("not a relation")));
    }

    #[test]
    fn rejects_relation_as_terminal() {
        let err = ITEM_SCHEMA.resolve("groups").unwrap_err();
        assert!(matches!(err, QueryError::InvalidFieldPath { ref reason, .. } if reason.contains("relation")));
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(ITEM_SCHEMA.resolve("").is_err());
        assert!(ITEM_SCHEMA.resolve("groups..name").is_err());
        assert!(ITEM_SCHEMA.resolve("groups.").is_err());
    }
}
