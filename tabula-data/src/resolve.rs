//! Field qualification and join-on-demand.
//!
//! A field is either bare (`email`, resolved against the root entity) or a
//! dotted path (`project.owner.email`) whose prefix is a chain of relations.
//! Each relation prefix is joined at most once per query; the join alias is
//! the dotted prefix itself.

use std::sync::Arc;

use crate::error::DataError;
use crate::query::ColumnRef;
use crate::schema::{EntitySchema, Relation, SchemaRegistry};

/// One `LEFT JOIN` in a list query.
#[derive(Debug, Clone)]
pub struct Join {
    /// Dotted relation path from the root, e.g. `project` or `project.users`.
    pub alias: String,
    pub parent_alias: String,
    pub relation: Relation,
    pub owner: Arc<EntitySchema>,
    pub target: Arc<EntitySchema>,
    /// Whether the relation's data is attached to result records.
    pub select: bool,
}

/// Joins issued so far, in the order they were first needed.
#[derive(Debug, Clone, Default)]
pub struct JoinRegistry {
    joins: Vec<Join>,
}

impl JoinRegistry {
    pub fn get(&self, alias: &str) -> Option<&Join> {
        self.joins.iter().find(|j| j.alias == alias)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.get(alias).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Join> {
        self.joins.iter()
    }

    pub fn selected(&self) -> impl Iterator<Item = &Join> {
        self.joins.iter().filter(|j| j.select)
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// A one-to-many join anywhere in the chain can multiply root rows.
    pub fn has_to_many(&self) -> bool {
        self.joins.iter().any(|j| j.relation.is_to_many())
    }

    /// Record a join unless its alias is already present. An existing join
    /// becomes selected if the new one is.
    pub fn insert(&mut self, join: Join) {
        match self.joins.iter_mut().find(|j| j.alias == join.alias) {
            Some(existing) => existing.select |= join.select,
            None => self.joins.push(join),
        }
    }
}

impl IntoIterator for JoinRegistry {
    type Item = Join;
    type IntoIter = std::vec::IntoIter<Join>;

    fn into_iter(self) -> Self::IntoIter {
        self.joins.into_iter()
    }
}

/// Reasons a field reference cannot be qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A segment of the relation prefix is not a relation of the schema reached so far.
    RelationPathInvalid { field: String, segment: String },
    UnknownColumn {
        field: String,
        entity: String,
        available: String,
    },
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::RelationPathInvalid { field, segment } => {
                write!(f, "Invalid relation segment '{segment}' in '{field}'")
            }
            ResolveError::UnknownColumn {
                field,
                entity,
                available,
            } => write!(f, "Unknown field '{field}' on {entity}. Available: {available}"),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<ResolveError> for DataError {
    fn from(err: ResolveError) -> Self {
        DataError::InvalidArgument(err.to_string())
    }
}

/// Qualifies field references against a root entity, joining as needed.
pub struct FieldResolver<'a> {
    registry: &'a SchemaRegistry,
    root: Arc<EntitySchema>,
    joins: JoinRegistry,
}

impl<'a> FieldResolver<'a> {
    pub fn new(registry: &'a SchemaRegistry, root: Arc<EntitySchema>) -> Self {
        Self {
            registry,
            root,
            joins: JoinRegistry::default(),
        }
    }

    pub fn root(&self) -> &Arc<EntitySchema> {
        &self.root
    }

    pub fn joins(&self) -> &JoinRegistry {
        &self.joins
    }

    pub fn into_joins(self) -> JoinRegistry {
        self.joins
    }

    /// Join a direct relation of the root and mark it for hydration.
    pub fn select_relation(&mut self, name: &str) -> Result<(), ResolveError> {
        let chain = self.relation_chain(name, name)?;
        self.join_chain(name, chain, true);
        Ok(())
    }

    /// Resolve `field` to a column reference, joining its relation prefix.
    ///
    /// Nothing is joined when any part of the path fails to resolve.
    pub fn qualify(&mut self, field: &str) -> Result<ColumnRef, ResolveError> {
        let Some((path, leaf)) = field.rsplit_once('.') else {
            return own_column(&self.root, self.root.table(), field, field);
        };

        let chain = self.relation_chain(path, field)?;
        let target = match chain.last() {
            Some((_, _, target)) => target.clone(),
            None => self.root.clone(),
        };
        let column = own_column(&target, path, leaf, field)?;
        self.join_chain(path, chain, false);
        Ok(column)
    }

    /// Walk `path` from the root, returning `(relation, owner, target)` per segment.
    fn relation_chain(
        &self,
        path: &str,
        field: &str,
    ) -> Result<Vec<(Relation, Arc<EntitySchema>, Arc<EntitySchema>)>, ResolveError> {
        let mut chain = Vec::new();
        let mut current = self.root.clone();
        for segment in path.split('.') {
            let invalid = || ResolveError::RelationPathInvalid {
                field: field.to_string(),
                segment: segment.to_string(),
            };
            let relation = current.relation(segment).cloned().ok_or_else(invalid)?;
            let target = self.registry.target_of(&relation).cloned().ok_or_else(invalid)?;
            chain.push((relation, current, target.clone()));
            current = target;
        }
        Ok(chain)
    }

    fn join_chain(
        &mut self,
        path: &str,
        chain: Vec<(Relation, Arc<EntitySchema>, Arc<EntitySchema>)>,
        select: bool,
    ) {
        let mut parent_alias = self.root.table().to_string();
        let mut alias = String::new();
        let last = chain.len().saturating_sub(1);
        for (idx, (relation, owner, target)) in chain.into_iter().enumerate() {
            if !alias.is_empty() {
                alias.push('.');
            }
            alias.push_str(&relation.name);
            if !self.joins.contains(&alias) {
                tracing::trace!(alias = %alias, path, "joining relation");
            }
            self.joins.insert(Join {
                alias: alias.clone(),
                parent_alias: parent_alias.clone(),
                relation,
                owner,
                target,
                select: select && idx == last,
            });
            parent_alias = alias.clone();
        }
    }
}

fn own_column(
    schema: &EntitySchema,
    alias: &str,
    leaf: &str,
    field: &str,
) -> Result<ColumnRef, ResolveError> {
    schema
        .resolve_column(leaf)
        .map(|column| ColumnRef {
            alias: alias.to_string(),
            column: column.db_name.clone(),
            ty: column.ty,
        })
        .ok_or_else(|| ResolveError::UnknownColumn {
            field: field.to_string(),
            entity: schema.name().to_string(),
            available: schema.available_columns(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::builder()
            .schema(
                EntitySchema::builder("User", "users")
                    .primary("id", ColumnType::Integer)
                    .column("email", ColumnType::Text)
                    .mapped_column("createdAt", "created_at", ColumnType::Timestamp)
                    .many_to_one("project", "Project", "project_id")
                    .build()
                    .unwrap(),
            )
            .schema(
                EntitySchema::builder("Project", "projects")
                    .primary("id", ColumnType::Integer)
                    .column("name", ColumnType::Text)
                    .many_to_one("owner", "User", "owner_id")
                    .one_to_many("users", "User", "project_id")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn resolver(registry: &SchemaRegistry) -> FieldResolver<'_> {
        let root = registry.get("User").unwrap().clone();
        FieldResolver::new(registry, root)
    }

    #[test]
    fn bare_fields_qualify_against_root() {
        let registry = registry();
        let mut r = resolver(&registry);
        let col = r.qualify("createdAt").unwrap();
        assert_eq!((col.alias.as_str(), col.column.as_str()), ("users", "created_at"));
        assert!(r.joins().is_empty());
    }

    #[test]
    fn dotted_fields_join_each_prefix_once() {
        let registry = registry();
        let mut r = resolver(&registry);
        let col = r.qualify("project.owner.email").unwrap();
        assert_eq!((col.alias.as_str(), col.column.as_str()), ("project.owner", "email"));
        r.qualify("project.name").unwrap();
        r.qualify("project.owner.email").unwrap();

        let joins: Vec<_> = r.joins().iter().map(|j| j.alias.as_str()).collect();
        assert_eq!(joins, vec!["project", "project.owner"]);
        assert_eq!(r.joins().get("project.owner").unwrap().parent_alias, "project");
    }

    #[test]
    fn invalid_relation_path_is_an_error_and_joins_nothing() {
        let registry = registry();
        let mut r = resolver(&registry);
        let err = r.qualify("project.bogus.name").unwrap_err();
        assert_eq!(
            err,
            ResolveError::RelationPathInvalid {
                field: "project.bogus.name".into(),
                segment: "bogus".into()
            }
        );
        assert!(r.joins().is_empty());
    }

    #[test]
    fn unknown_leaf_lists_available_columns() {
        let registry = registry();
        let mut r = resolver(&registry);
        let err = r.qualify("project.title").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown field 'project.title' on Project. Available: id, name"
        );
        assert!(r.joins().is_empty());
    }

    #[test]
    fn selecting_reuses_an_existing_join() {
        let registry = registry();
        let mut r = resolver(&registry);
        r.qualify("project.name").unwrap();
        r.select_relation("project").unwrap();
        assert_eq!(r.joins().len(), 1);
        assert!(r.joins().get("project").unwrap().select);
        assert!(!r.joins().has_to_many());
    }

    #[test]
    fn to_many_joins_are_detected() {
        let registry = registry();
        let mut r = resolver(&registry);
        r.qualify("project.users.email").unwrap();
        assert!(r.joins().has_to_many());
    }
}
