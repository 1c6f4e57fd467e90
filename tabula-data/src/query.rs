//! SQL rendering for list and single-record queries.
//!
//! Every identifier comes from a registered schema and is double-quoted. Every value travels as a named [`Param`];
//! names only matter for logging, rendering maps them to positional
//! placeholders in order of appearance.

use std::sync::Arc;

use crate::params::SortOrder;
use crate::resolve::{Join, JoinRegistry};
use crate::schema::{ColumnType, EntitySchema, RelationKind};
use crate::value::SqlValue;

/// Column alias carrying the root primary key in page-id queries.
pub const PK_ALIAS: &str = "__pk";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `?` placeholders. `LIKE` ignores ASCII case, so case-sensitive
    /// matches are rendered with `GLOB`.
    Sqlite,
    /// `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite => "?".to_string(),
        }
    }

    /// Quote a single identifier. Embedded quotes are doubled.
    pub fn quote(self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    pub fn supports_ilike(self) -> bool {
        matches!(self, Dialect::Postgres)
    }
}

/// Translate a `LIKE` pattern into the equivalent `GLOB` pattern.
/// `%` and `_` become `*` and `?`; literal glob metacharacters are
/// bracketed.
fn like_to_glob(pattern: &str) -> String {
    let mut glob = String::with_capacity(pattern.len());
    for ch in pattern.chars() {
        match ch {
            '%' => glob.push('*'),
            '_' => glob.push('?'),
            '*' | '?' | '[' => {
                glob.push('[');
                glob.push(ch);
                glob.push(']');
            }
            other => glob.push(other),
        }
    }
    glob
}

/// A column qualified by the alias it is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub alias: String,
    /// Physical column name.
    pub column: String,
    pub ty: ColumnType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: SqlValue,
}

impl Param {
    pub fn new(name: impl Into<String>, value: SqlValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: ColumnRef,
        op: CompareOp,
        param: Param,
    },
    Like { column: ColumnRef, param: Param },
    ILike { column: ColumnRef, param: Param },
    /// Inclusive on both ends.
    Between {
        column: ColumnRef,
        from: Param,
        to: Param,
    },
    In { column: ColumnRef, params: Vec<Param> },
    IsNull(ColumnRef),
    IsNotNull(ColumnRef),
    /// Case-insensitive substring match used by free-text search.
    Contains { column: ColumnRef, param: Param },
    /// Disjunction; renders nothing when empty.
    Any(Vec<Predicate>),
}

/// Rendered SQL with its bind values in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
    /// Parameter names, parallel to `params`.
    pub names: Vec<String>,
}

struct SqlWriter {
    dialect: Dialect,
    sql: String,
    params: Vec<SqlValue>,
    names: Vec<String>,
}

impl SqlWriter {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
            names: Vec::new(),
        }
    }

    fn push(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    fn ident(&mut self, ident: &str) -> &mut Self {
        let quoted = self.dialect.quote(ident);
        self.push(&quoted)
    }

    fn column(&mut self, alias: &str, column: &str) -> &mut Self {
        self.ident(alias).push(".").ident(column)
    }

    fn column_expr(&self, column: &ColumnRef) -> String {
        format!(
            "{}.{}",
            self.dialect.quote(&column.alias),
            self.dialect.quote(&column.column)
        )
    }

    fn text_expr(&self, column: &ColumnRef) -> String {
        let expr = self.column_expr(column);
        if column.ty.is_text() {
            expr
        } else {
            format!("CAST({expr} AS TEXT)")
        }
    }

    fn bind(&mut self, param: &Param) -> &mut Self {
        self.params.push(param.value.clone());
        self.names.push(param.name.clone());
        let placeholder = self.dialect.placeholder(self.params.len());
        self.push(&placeholder)
    }

    fn predicate(&mut self, predicate: &Predicate) {
        match predicate {
            Predicate::Compare { column, op, param } => {
                let expr = self.column_expr(column);
                self.push(&expr).push(" ").push(op.as_sql()).push(" ").bind(param);
            }
            Predicate::Like { column, param } => {
                let expr = self.text_expr(column);
                match (self.dialect, &param.value) {
                    (Dialect::Sqlite, SqlValue::Text(pattern)) => {
                        let glob =
                            Param::new(param.name.clone(), SqlValue::Text(like_to_glob(pattern)));
                        self.push(&expr).push(" GLOB ").bind(&glob);
                    }
                    _ => {
                        self.push(&expr).push(" LIKE ").bind(param);
                    }
                }
            }
            Predicate::ILike { column, param } => {
                let expr = self.text_expr(column);
                if self.dialect.supports_ilike() {
                    self.push(&expr).push(" ILIKE ").bind(param);
                } else {
                    self.push(&format!("LOWER({expr}) LIKE LOWER("))
                        .bind(param)
                        .push(")");
                }
            }
            Predicate::Between { column, from, to } => {
                let expr = self.column_expr(column);
                self.push(&expr).push(" BETWEEN ").bind(from).push(" AND ").bind(to);
            }
            Predicate::In { column, params } => {
                let expr = self.column_expr(column);
                self.push(&expr).push(" IN (");
                for (idx, param) in params.iter().enumerate() {
                    if idx > 0 {
                        self.push(", ");
                    }
                    self.bind(param);
                }
                self.push(")");
            }
            Predicate::IsNull(column) => {
                let expr = self.column_expr(column);
                self.push(&expr).push(" IS NULL");
            }
            Predicate::IsNotNull(column) => {
                let expr = self.column_expr(column);
                self.push(&expr).push(" IS NOT NULL");
            }
            Predicate::Contains { column, param } => {
                let expr = self.text_expr(column);
                self.push(&format!("LOWER({expr}) LIKE LOWER("))
                    .bind(param)
                    .push(")");
            }
            Predicate::Any(branches) => {
                self.push("(");
                for (idx, branch) in branches.iter().enumerate() {
                    if idx > 0 {
                        self.push(" OR ");
                    }
                    self.predicate(branch);
                }
                self.push(")");
            }
        }
    }

    fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
            names: self.names,
        }
    }
}

/// The query-execution handle for one list call: joins, predicates,
/// ordering and paging over a root entity.
#[derive(Debug, Clone)]
pub struct ListQuery {
    root: Arc<EntitySchema>,
    joins: JoinRegistry,
    predicates: Vec<Predicate>,
    order: Vec<(ColumnRef, SortOrder)>,
    skip: u64,
    take: Option<u64>,
    with_deleted: bool,
}

impl ListQuery {
    pub fn new(root: Arc<EntitySchema>) -> Self {
        Self {
            root,
            joins: JoinRegistry::default(),
            predicates: Vec::new(),
            order: Vec::new(),
            skip: 0,
            take: None,
            with_deleted: false,
        }
    }

    pub fn root(&self) -> &Arc<EntitySchema> {
        &self.root
    }

    pub fn joins(&self) -> &JoinRegistry {
        &self.joins
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn left_join(&mut self, join: Join) -> &mut Self {
        self.joins.insert(join);
        self
    }

    /// Add a predicate, combined with the others by `AND`. Empty `Any`
    /// groups are dropped.
    pub fn and_where(&mut self, predicate: Predicate) -> &mut Self {
        if !matches!(&predicate, Predicate::Any(branches) if branches.is_empty()) {
            self.predicates.push(predicate);
        }
        self
    }

    pub fn order_by(&mut self, column: ColumnRef, order: SortOrder) -> &mut Self {
        self.order.push((column, order));
        self
    }

    pub fn skip(&mut self, skip: u64) -> &mut Self {
        self.skip = skip;
        self
    }

    pub fn take(&mut self, take: u64) -> &mut Self {
        self.take = Some(take);
        self
    }

    /// Include soft-deleted rows of the root and of joined entities.
    pub fn with_deleted(&mut self, with_deleted: bool) -> &mut Self {
        self.with_deleted = with_deleted;
        self
    }

    /// `COUNT(DISTINCT pk)` over all matching rows, ignoring paging.
    pub fn count_statement(&self, dialect: Dialect) -> Statement {
        let mut w = SqlWriter::new(dialect);
        let table = self.root.table();
        let pk = &self.root.primary_key().db_name;
        w.push("SELECT COUNT(DISTINCT ")
            .column(table, pk)
            .push(") AS ")
            .ident("count");
        self.from_clause(&mut w, self.joins.iter());
        self.where_clause(&mut w);
        w.finish()
    }

    /// Root primary keys of the requested page, in sort order.
    ///
    /// With a one-to-many join the root rows are grouped by primary key and
    /// each sort column is aggregated (`MIN` ascending, `MAX` descending) so
    /// that paging counts entities rather than joined rows.
    pub fn page_ids_statement(&self, dialect: Dialect) -> Statement {
        let mut w = SqlWriter::new(dialect);
        let table = self.root.table();
        let pk = &self.root.primary_key().db_name;
        let grouped = self.joins.has_to_many();

        w.push("SELECT ").column(table, pk).push(" AS ").ident(PK_ALIAS);
        self.from_clause(&mut w, self.joins.iter());
        self.where_clause(&mut w);
        if grouped {
            w.push(" GROUP BY ").column(table, pk);
        }
        if !self.order.is_empty() {
            w.push(" ORDER BY ");
            for (idx, (column, order)) in self.order.iter().enumerate() {
                if idx > 0 {
                    w.push(", ");
                }
                let expr = w.column_expr(column);
                let expr = match (grouped, order) {
                    (false, _) => expr,
                    (true, SortOrder::Asc) => format!("MIN({expr})"),
                    (true, SortOrder::Desc) => format!("MAX({expr})"),
                };
                w.push(&expr).push(" ").push(order.as_sql());
            }
        }
        if let Some(take) = self.take {
            w.push(&format!(" LIMIT {take}"));
        }
        if self.skip > 0 {
            w.push(&format!(" OFFSET {}", self.skip));
        }
        w.finish()
    }

    /// Root columns plus the columns of selected relations for `ids`.
    pub fn hydrate_statement(&self, dialect: Dialect, ids: &[SqlValue]) -> Statement {
        let mut w = SqlWriter::new(dialect);
        self.select_list(&mut w);
        self.from_clause(&mut w, self.joins.selected());
        let table = self.root.table();
        let pk = self.root.primary_key();
        w.push(" WHERE ").column(table, &pk.db_name).push(" IN (");
        for (idx, id) in ids.iter().enumerate() {
            if idx > 0 {
                w.push(", ");
            }
            w.bind(&Param::new(format!("id_{idx}"), id.clone()));
        }
        w.push(")");
        w.finish()
    }

    /// One root row (plus selected relations) by primary key.
    pub fn find_by_id_statement(&self, dialect: Dialect, id: SqlValue) -> Statement {
        let mut w = SqlWriter::new(dialect);
        self.select_list(&mut w);
        self.from_clause(&mut w, self.joins.selected());
        let table = self.root.table();
        let pk = self.root.primary_key();
        w.push(" WHERE ")
            .column(table, &pk.db_name)
            .push(" = ")
            .bind(&Param::new("id", id));
        if let Some(deleted) = self.soft_delete_ref() {
            w.push(" AND ");
            w.predicate(&Predicate::IsNull(deleted));
        }
        w.finish()
    }

    fn soft_delete_ref(&self) -> Option<ColumnRef> {
        if self.with_deleted {
            return None;
        }
        self.root.soft_delete_column().map(|c| ColumnRef {
            alias: self.root.table().to_string(),
            column: c.db_name.clone(),
            ty: c.ty,
        })
    }

    fn select_list(&self, w: &mut SqlWriter) {
        let table = self.root.table();
        w.push("SELECT ");
        let mut first = true;
        for column in self.root.columns() {
            if !first {
                w.push(", ");
            }
            first = false;
            w.column(table, &column.db_name).push(" AS ").ident(&column.name);
        }
        for join in self.joins.selected() {
            for column in join.target.columns() {
                w.push(", ")
                    .column(&join.alias, &column.db_name)
                    .push(" AS ")
                    .ident(&format!("{}.{}", join.alias, column.name));
            }
        }
    }

    fn from_clause<'j>(&self, w: &mut SqlWriter, joins: impl Iterator<Item = &'j Join>) {
        w.push(" FROM ").ident(self.root.table());
        for join in joins {
            w.push(" LEFT JOIN ")
                .ident(join.target.table())
                .push(" AS ")
                .ident(&join.alias)
                .push(" ON ");
            match &join.relation.kind {
                RelationKind::ManyToOne { join_column } => {
                    w.column(&join.alias, &join.target.primary_key().db_name)
                        .push(" = ")
                        .column(&join.parent_alias, join_column);
                }
                RelationKind::OneToMany { inverse_column } => {
                    w.column(&join.alias, inverse_column)
                        .push(" = ")
                        .column(&join.parent_alias, &join.owner.primary_key().db_name);
                }
            }
            if !self.with_deleted {
                if let Some(deleted) = join.target.soft_delete_column() {
                    w.push(" AND ").column(&join.alias, &deleted.db_name).push(" IS NULL");
                }
            }
        }
    }

    fn where_clause(&self, w: &mut SqlWriter) {
        let soft = self.soft_delete_ref().map(Predicate::IsNull);
        let all: Vec<&Predicate> = self.predicates.iter().chain(soft.as_ref()).collect();
        if all.is_empty() {
            return;
        }
        w.push(" WHERE ");
        for (idx, predicate) in all.into_iter().enumerate() {
            if idx > 0 {
                w.push(" AND ");
            }
            w.predicate(predicate);
        }
    }
}

/// `DELETE` of one row by primary key. Soft-deleted rows are left alone.
pub fn delete_statement(dialect: Dialect, schema: &EntitySchema, id: SqlValue) -> Statement {
    let mut w = SqlWriter::new(dialect);
    w.push("DELETE FROM ")
        .ident(schema.table())
        .push(" WHERE ")
        .ident(&schema.primary_key().db_name)
        .push(" = ")
        .bind(&Param::new("id", id));
    if let Some(deleted) = schema.soft_delete_column() {
        w.push(" AND ").ident(&deleted.db_name).push(" IS NULL");
    }
    w.finish()
}

/// Stamp the soft-delete column of one live row. `None` when the entity has
/// no soft-delete column.
pub fn soft_delete_statement(
    dialect: Dialect,
    schema: &EntitySchema,
    id: SqlValue,
) -> Option<Statement> {
    let deleted = schema.soft_delete_column()?;
    let mut w = SqlWriter::new(dialect);
    w.push("UPDATE ")
        .ident(schema.table())
        .push(" SET ")
        .ident(&deleted.db_name)
        .push(" = CURRENT_TIMESTAMP WHERE ")
        .ident(&schema.primary_key().db_name)
        .push(" = ")
        .bind(&Param::new("id", id))
        .push(" AND ")
        .ident(&deleted.db_name)
        .push(" IS NULL");
    Some(w.finish())
}

pub(crate) fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Relation, SchemaRegistry};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::builder()
            .schema(
                EntitySchema::builder("User", "users")
                    .primary("id", ColumnType::Integer)
                    .column("email", ColumnType::Text)
                    .column("age", ColumnType::Integer)
                    .many_to_one("project", "Project", "project_id")
                    .one_to_many("uploads", "Asset", "user_id")
                    .build()
                    .unwrap(),
            )
            .schema(
                EntitySchema::builder("Project", "projects")
                    .primary("id", ColumnType::Integer)
                    .column("name", ColumnType::Text)
                    .soft_delete_column("deletedAt", "deleted_at")
                    .build()
                    .unwrap(),
            )
            .schema(
                EntitySchema::builder("Asset", "assets")
                    .primary("id", ColumnType::Uuid)
                    .column("filename", ColumnType::Text)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn col(alias: &str, column: &str, ty: ColumnType) -> ColumnRef {
        ColumnRef {
            alias: alias.into(),
            column: column.into(),
            ty,
        }
    }

    fn join(registry: &SchemaRegistry, name: &str, select: bool) -> Join {
        let owner = registry.get("User").unwrap().clone();
        let relation: Relation = owner.relation(name).unwrap().clone();
        let target = registry.target_of(&relation).unwrap().clone();
        Join {
            alias: name.into(),
            parent_alias: "users".into(),
            relation,
            owner,
            target,
            select,
        }
    }

    #[test]
    fn quoting_and_placeholders() {
        assert_eq!(Dialect::Sqlite.quote("users"), "\"users\"");
        assert_eq!(Dialect::Postgres.quote("a\"b"), "\"a\"\"b\"");
        assert_eq!(Dialect::Postgres.placeholder(3), "$3");
        assert_eq!(Dialect::Sqlite.placeholder(3), "?");
    }

    #[test]
    fn like_patterns_become_globs() {
        assert_eq!(like_to_glob("%A@X%"), "*A@X*");
        assert_eq!(like_to_glob("%a_b%"), "*a?b*");
        assert_eq!(like_to_glob("%[x]*?%"), "*[[]x][*][?]*");
    }

    #[test]
    fn count_with_join_and_predicates() {
        let registry = registry();
        let mut q = ListQuery::new(registry.get("User").unwrap().clone());
        q.left_join(join(&registry, "project", false)).and_where(Predicate::Compare {
            column: col("project", "name", ColumnType::Text),
            op: CompareOp::Eq,
            param: Param::new("project_name", "Alpha".into()),
        });
        let stmt = q.count_statement(Dialect::Sqlite);
        assert_eq!(
            stmt.sql,
            "SELECT COUNT(DISTINCT \"users\".\"id\") AS \"count\" FROM \"users\" \
             LEFT JOIN \"projects\" AS \"project\" ON \"project\".\"id\" = \"users\".\"project_id\" \
             AND \"project\".\"deleted_at\" IS NULL \
             WHERE \"project\".\"name\" = ?"
        );
        assert_eq!(stmt.params, vec![SqlValue::Text("Alpha".into())]);
        assert_eq!(stmt.names, vec!["project_name"]);
    }

    #[test]
    fn postgres_numbering_across_predicates() {
        let registry = registry();
        let mut q = ListQuery::new(registry.get("User").unwrap().clone());
        q.and_where(Predicate::Between {
            column: col("users", "age", ColumnType::Integer),
            from: Param::new("age_from", SqlValue::Int(18)),
            to: Param::new("age_to", SqlValue::Int(65)),
        })
        .and_where(Predicate::In {
            column: col("users", "email", ColumnType::Text),
            params: vec![Param::new("email", "a".into()), Param::new("email", "b".into())],
        })
        .and_where(Predicate::ILike {
            column: col("users", "age", ColumnType::Integer),
            param: Param::new("age_ilike", "%1%".into()),
        });
        let stmt = q.count_statement(Dialect::Postgres);
        assert!(stmt.sql.ends_with(
            "WHERE \"users\".\"age\" BETWEEN $1 AND $2 AND \"users\".\"email\" IN ($3, $4) \
             AND CAST(\"users\".\"age\" AS TEXT) ILIKE $5"
        ));
        assert_eq!(stmt.params.len(), 5);
    }

    #[test]
    fn ilike_emulation_and_search_group() {
        let registry = registry();
        let mut q = ListQuery::new(registry.get("User").unwrap().clone());
        q.and_where(Predicate::ILike {
            column: col("users", "email", ColumnType::Text),
            param: Param::new("email_ilike", "%ex%".into()),
        })
        .and_where(Predicate::Any(vec![]))
        .and_where(Predicate::Any(vec![
            Predicate::Contains {
                column: col("users", "email", ColumnType::Text),
                param: Param::new("search", "%al%".into()),
            },
            Predicate::Contains {
                column: col("users", "age", ColumnType::Integer),
                param: Param::new("search", "%al%".into()),
            },
        ]));
        assert_eq!(q.predicates().len(), 2);
        let stmt = q.count_statement(Dialect::Sqlite);
        assert!(stmt.sql.ends_with(
            "WHERE LOWER(\"users\".\"email\") LIKE LOWER(?) AND \
             (LOWER(\"users\".\"email\") LIKE LOWER(?) OR LOWER(CAST(\"users\".\"age\" AS TEXT)) LIKE LOWER(?))"
        ));
    }

    #[test]
    fn page_ids_plain_and_grouped() {
        let registry = registry();
        let root = registry.get("User").unwrap().clone();

        let mut q = ListQuery::new(root.clone());
        q.order_by(col("users", "email", ColumnType::Text), SortOrder::Asc)
            .skip(20)
            .take(10);
        assert_eq!(
            q.page_ids_statement(Dialect::Sqlite).sql,
            "SELECT \"users\".\"id\" AS \"__pk\" FROM \"users\" ORDER BY \"users\".\"email\" ASC LIMIT 10 OFFSET 20"
        );

        let mut q = ListQuery::new(root);
        q.left_join(join(&registry, "uploads", false))
            .order_by(col("uploads", "filename", ColumnType::Text), SortOrder::Desc)
            .take(5);
        assert_eq!(
            q.page_ids_statement(Dialect::Sqlite).sql,
            "SELECT \"users\".\"id\" AS \"__pk\" FROM \"users\" \
             LEFT JOIN \"assets\" AS \"uploads\" ON \"uploads\".\"user_id\" = \"users\".\"id\" \
             GROUP BY \"users\".\"id\" ORDER BY MAX(\"uploads\".\"filename\") DESC LIMIT 5"
        );
    }

    #[test]
    fn hydrate_selects_only_selected_joins() {
        let registry = registry();
        let mut q = ListQuery::new(registry.get("User").unwrap().clone());
        q.left_join(join(&registry, "project", true))
            .left_join(join(&registry, "uploads", false));
        let stmt = q.hydrate_statement(Dialect::Sqlite, &[SqlValue::Int(1), SqlValue::Int(2)]);
        assert_eq!(
            stmt.sql,
            "SELECT \"users\".\"id\" AS \"id\", \"users\".\"email\" AS \"email\", \"users\".\"age\" AS \"age\", \
             \"project\".\"id\" AS \"project.id\", \"project\".\"name\" AS \"project.name\", \
             \"project\".\"deleted_at\" AS \"project.deletedAt\" \
             FROM \"users\" LEFT JOIN \"projects\" AS \"project\" ON \"project\".\"id\" = \"users\".\"project_id\" \
             AND \"project\".\"deleted_at\" IS NULL \
             WHERE \"users\".\"id\" IN (?, ?)"
        );
    }

    #[test]
    fn soft_delete_filter_on_root() {
        let registry = registry();
        let root = registry.get("Project").unwrap().clone();
        let mut q = ListQuery::new(root.clone());
        assert_eq!(
            q.count_statement(Dialect::Sqlite).sql,
            "SELECT COUNT(DISTINCT \"projects\".\"id\") AS \"count\" FROM \"projects\" \
             WHERE \"projects\".\"deleted_at\" IS NULL"
        );
        q.with_deleted(true);
        assert!(!q.count_statement(Dialect::Sqlite).sql.contains("WHERE"));

        let stmt = ListQuery::new(root).find_by_id_statement(Dialect::Postgres, SqlValue::Int(7));
        assert!(stmt
            .sql
            .ends_with("WHERE \"projects\".\"id\" = $1 AND \"projects\".\"deleted_at\" IS NULL"));
    }

    #[test]
    fn delete_statements() {
        let registry = registry();
        let project = registry.get("Project").unwrap();
        assert_eq!(
            delete_statement(Dialect::Sqlite, project, SqlValue::Int(3)).sql,
            "DELETE FROM \"projects\" WHERE \"id\" = ? AND \"deleted_at\" IS NULL"
        );
        assert_eq!(
            delete_statement(Dialect::Postgres, registry.get("User").unwrap(), SqlValue::Int(3)).sql,
            "DELETE FROM \"users\" WHERE \"id\" = $1"
        );
        assert_eq!(
            soft_delete_statement(Dialect::Postgres, project, SqlValue::Int(3)).unwrap().sql,
            "UPDATE \"projects\" SET \"deleted_at\" = CURRENT_TIMESTAMP WHERE \"id\" = $1 AND \"deleted_at\" IS NULL"
        );
        assert!(soft_delete_statement(Dialect::Sqlite, registry.get("User").unwrap(), SqlValue::Int(3)).is_none());
    }

    #[test]
    fn segment_validation() {
        assert!(is_valid_segment("created_at"));
        assert!(is_valid_segment("_x1"));
        assert!(!is_valid_segment("1x"));
        assert!(!is_valid_segment("a.b"));
        assert!(!is_valid_segment(""));
    }
}
