//! Entity metadata: columns, relations, and the registry that ties them together.
//!
//! Schemas are declared once at startup and never mutated afterwards. Every
//! identifier that ends up in generated SQL (table names, physical column
//! names, relation names used as join aliases) is checked here, so the query
//! layer only ever emits names taken from this allow-list.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::entity::Entity;
use crate::error::DataError;
use crate::query::is_valid_segment;

/// Logical spelling of the canonical creation timestamp.
pub const CREATED_AT_PROPERTY: &str = "createdAt";
/// Physical spelling of the canonical creation timestamp.
pub const CREATED_AT_COLUMN: &str = "created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Boolean,
    Timestamp,
    Uuid,
    Json,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Uuid => "uuid",
            ColumnType::Json => "json",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(self, ColumnType::Text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Name used by callers (filters, sort, record keys).
    pub name: String,
    /// Name of the column in the table.
    pub db_name: String,
    pub ty: ColumnType,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    /// The owning table holds `join_column`, referencing the target's primary key.
    ManyToOne { join_column: String },
    /// The target table holds `inverse_column`, referencing the owner's primary key.
    OneToMany { inverse_column: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    /// Entity name of the related schema.
    pub target: String,
    pub kind: RelationKind,
}

impl Relation {
    pub fn is_to_many(&self) -> bool {
        matches!(self.kind, RelationKind::OneToMany { .. })
    }
}

/// Structural metadata for one entity.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    name: String,
    table: String,
    columns: Vec<Column>,
    relations: Vec<Relation>,
    soft_delete: Option<String>,
}

impl EntitySchema {
    pub fn builder(name: &str, table: &str) -> EntitySchemaBuilder {
        EntitySchemaBuilder {
            name: name.to_string(),
            table: table.to_string(),
            columns: Vec::new(),
            relations: Vec::new(),
            soft_delete: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table name, also used as the root alias of queries on this entity.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn primary_key(&self) -> &Column {
        // `build()` guarantees exactly one primary column.
        self.columns
            .iter()
            .find(|c| c.primary)
            .unwrap_or(&self.columns[0])
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_by_db_name(&self, db_name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.db_name == db_name)
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Column that marks rows as soft-deleted, if the entity supports it.
    pub fn soft_delete_column(&self) -> Option<&Column> {
        self.soft_delete.as_deref().and_then(|name| self.column(name))
    }

    /// Resolve a bare field name to one of this entity's own columns.
    ///
    /// Matches logical names first, then physical names. `created_at` and
    /// `createdAt` are interchangeable so the default sort works whichever
    /// spelling an entity declares.
    pub fn resolve_column(&self, field: &str) -> Option<&Column> {
        self.column(field)
            .or_else(|| self.column_by_db_name(field))
            .or_else(|| match field {
                CREATED_AT_COLUMN => self.column(CREATED_AT_PROPERTY),
                CREATED_AT_PROPERTY => self.column_by_db_name(CREATED_AT_COLUMN),
                _ => None,
            })
    }

    /// Logical column names, comma separated, for error messages.
    pub fn available_columns(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub struct EntitySchemaBuilder {
    name: String,
    table: String,
    columns: Vec<Column>,
    relations: Vec<Relation>,
    soft_delete: Option<String>,
}

impl EntitySchemaBuilder {
    pub fn primary(mut self, name: &str, ty: ColumnType) -> Self {
        self.columns.push(Column {
            name: name.to_string(),
            db_name: name.to_string(),
            ty,
            primary: true,
        });
        self
    }

    pub fn column(self, name: &str, ty: ColumnType) -> Self {
        self.mapped_column(name, name, ty)
    }

    /// Declare a column whose logical name differs from its physical name.
    pub fn mapped_column(mut self, name: &str, db_name: &str, ty: ColumnType) -> Self {
        self.columns.push(Column {
            name: name.to_string(),
            db_name: db_name.to_string(),
            ty,
            primary: false,
        });
        self
    }

    /// Declare the timestamp column used for soft deletes.
    pub fn soft_delete_column(mut self, name: &str, db_name: &str) -> Self {
        self = self.mapped_column(name, db_name, ColumnType::Timestamp);
        self.soft_delete = Some(name.to_string());
        self
    }

    pub fn many_to_one(mut self, name: &str, target: &str, join_column: &str) -> Self {
        self.relations.push(Relation {
            name: name.to_string(),
            target: target.to_string(),
            kind: RelationKind::ManyToOne {
                join_column: join_column.to_string(),
            },
        });
        self
    }

    pub fn one_to_many(mut self, name: &str, target: &str, inverse_column: &str) -> Self {
        self.relations.push(Relation {
            name: name.to_string(),
            target: target.to_string(),
            kind: RelationKind::OneToMany {
                inverse_column: inverse_column.to_string(),
            },
        });
        self
    }

    pub fn build(self) -> Result<EntitySchema, SchemaError> {
        let entity = self.name.as_str();
        check_ident(entity, "table", &self.table)?;

        let mut logical = HashSet::new();
        for column in &self.columns {
            check_ident(entity, "column", &column.name)?;
            check_ident(entity, "column", &column.db_name)?;
            if !logical.insert(column.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    entity: entity.to_string(),
                    name: column.name.clone(),
                });
            }
        }

        match self.columns.iter().filter(|c| c.primary).count() {
            0 => return Err(SchemaError::MissingPrimaryKey(entity.to_string())),
            1 => {}
            _ => return Err(SchemaError::MultiplePrimaryKeys(entity.to_string())),
        }

        let mut relation_names = HashSet::new();
        for relation in &self.relations {
            check_ident(entity, "relation", &relation.name)?;
            let fk = match &relation.kind {
                RelationKind::ManyToOne { join_column } => join_column,
                RelationKind::OneToMany { inverse_column } => inverse_column,
            };
            check_ident(entity, "join column", fk)?;
            let clash = if !relation_names.insert(relation.name.as_str()) {
                Some(SchemaError::DuplicateRelation {
                    entity: entity.to_string(),
                    name: relation.name.clone(),
                })
            } else if relation.name == self.table {
                Some(SchemaError::AliasCollision {
                    entity: entity.to_string(),
                    name: relation.name.clone(),
                })
            } else if logical.contains(relation.name.as_str()) {
                Some(SchemaError::RelationShadowsColumn {
                    entity: entity.to_string(),
                    name: relation.name.clone(),
                })
            } else {
                None
            };
            if let Some(err) = clash {
                return Err(err);
            }
        }

        Ok(EntitySchema {
            name: self.name,
            table: self.table,
            columns: self.columns,
            relations: self.relations,
            soft_delete: self.soft_delete,
        })
    }
}

fn check_ident(entity: &str, kind: &'static str, value: &str) -> Result<(), SchemaError> {
    if is_valid_segment(value) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier {
            entity: entity.to_string(),
            kind,
            ident: value.to_string(),
        })
    }
}

/// Errors raised while declaring schemas. These are programming errors and
/// surface at startup, never per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    InvalidIdentifier {
        entity: String,
        kind: &'static str,
        ident: String,
    },
    MissingPrimaryKey(String),
    MultiplePrimaryKeys(String),
    DuplicateColumn { entity: String, name: String },
    DuplicateRelation { entity: String, name: String },
    RelationShadowsColumn { entity: String, name: String },
    /// A relation named like the entity's own table would share its query alias.
    AliasCollision { entity: String, name: String },
    DuplicateEntity(String),
    NameMismatch { declared: String, schema: String },
    UnknownTarget {
        entity: String,
        relation: String,
        target: String,
    },
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::InvalidIdentifier { entity, kind, ident } => {
                write!(f, "{entity}: invalid {kind} identifier '{ident}'")
            }
            SchemaError::MissingPrimaryKey(entity) => write!(f, "{entity}: no primary key column"),
            SchemaError::MultiplePrimaryKeys(entity) => {
                write!(f, "{entity}: more than one primary key column")
            }
            SchemaError::DuplicateColumn { entity, name } => {
                write!(f, "{entity}: duplicate column '{name}'")
            }
            SchemaError::DuplicateRelation { entity, name } => {
                write!(f, "{entity}: duplicate relation '{name}'")
            }
            SchemaError::RelationShadowsColumn { entity, name } => {
                write!(f, "{entity}: relation '{name}' has the same name as a column")
            }
            SchemaError::AliasCollision { entity, name } => {
                write!(f, "{entity}: relation '{name}' has the same name as the table")
            }
            SchemaError::DuplicateEntity(name) => write!(f, "entity '{name}' registered twice"),
            SchemaError::NameMismatch { declared, schema } => {
                write!(f, "entity declares name '{declared}' but its schema is named '{schema}'")
            }
            SchemaError::UnknownTarget {
                entity,
                relation,
                target,
            } => write!(
                f,
                "{entity}.{relation}: target entity '{target}' is not registered"
            ),
        }
    }
}

impl std::error::Error for SchemaError {}

/// Immutable set of entity schemas, shared across requests.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entities: HashMap<String, Arc<EntitySchema>>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder {
            pending: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<EntitySchema>> {
        self.entities.get(name)
    }

    /// Look up a schema, failing with [`DataError::UnknownEntity`].
    pub fn require(&self, name: &str) -> Result<&Arc<EntitySchema>, DataError> {
        self.get(name)
            .ok_or_else(|| DataError::UnknownEntity(name.to_string()))
    }

    /// Schema reached by following `relation`. Always present once built.
    pub fn target_of(&self, relation: &Relation) -> Option<&Arc<EntitySchema>> {
        self.entities.get(&relation.target)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }
}

pub struct SchemaRegistryBuilder {
    pending: Vec<Result<EntitySchema, SchemaError>>,
}

impl SchemaRegistryBuilder {
    /// Register the schema declared by an [`Entity`] type.
    pub fn entity<E: Entity>(mut self) -> Self {
        let schema = E::schema().and_then(|schema| {
            if schema.name() == E::NAME {
                Ok(schema)
            } else {
                Err(SchemaError::NameMismatch {
                    declared: E::NAME.to_string(),
                    schema: schema.name().to_string(),
                })
            }
        });
        self.pending.push(schema);
        self
    }

    pub fn schema(mut self, schema: EntitySchema) -> Self {
        self.pending.push(Ok(schema));
        self
    }

    /// Validate cross-entity references and freeze the registry.
    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        let mut entities = HashMap::new();
        for schema in self.pending {
            let schema = schema?;
            let name = schema.name().to_string();
            if entities.insert(name.clone(), Arc::new(schema)).is_some() {
                return Err(SchemaError::DuplicateEntity(name));
            }
        }

        for schema in entities.values() {
            for relation in schema.relations() {
                if !entities.contains_key(&relation.target) {
                    return Err(SchemaError::UnknownTarget {
                        entity: schema.name().to_string(),
                        relation: relation.name.clone(),
                        target: relation.target.clone(),
                    });
                }
            }
        }

        Ok(SchemaRegistry { entities })
    }
}
