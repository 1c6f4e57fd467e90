use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use serde_json::{json, Value};
use tabula_data::prelude::*;
use tabula_data::schema::SchemaError;
use tabula_data::{Dialect, Record, SqlValue, Statement};

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: i64,
    email: String,
}

impl Entity for User {
    const NAME: &'static str = "User";

    fn schema() -> Result<EntitySchema, SchemaError> {
        EntitySchema::builder(Self::NAME, "users")
            .primary("id", ColumnType::Integer)
            .column("email", ColumnType::Text)
            .column("age", ColumnType::Integer)
            .mapped_column("createdAt", "created_at", ColumnType::Timestamp)
            .many_to_one("project", "Project", "project_id")
            .build()
    }
}

#[derive(Debug, Deserialize)]
struct Project {}

impl Entity for Project {
    const NAME: &'static str = "Project";

    fn schema() -> Result<EntitySchema, SchemaError> {
        EntitySchema::builder(Self::NAME, "projects")
            .primary("id", ColumnType::Integer)
            .column("name", ColumnType::Text)
            .soft_delete_column("deletedAt", "deleted_at")
            .build()
    }
}

/// Replays canned results and records every statement it receives.
#[derive(Default)]
struct Scripted {
    count: u64,
    affected: u64,
    rows: Mutex<VecDeque<Vec<Record>>>,
    log: Mutex<Vec<Statement>>,
}

impl Scripted {
    fn with_rows(mut self, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.rows.get_mut().unwrap().push_back(rows);
        self
    }

    fn statements(&self) -> Vec<Statement> {
        self.log.lock().unwrap().clone()
    }
}

impl QueryExecutor for Scripted {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch_rows(&self, statement: &Statement) -> Result<Vec<Record>, DataError> {
        self.log.lock().unwrap().push(statement.clone());
        Ok(self.rows.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn fetch_count(&self, statement: &Statement) -> Result<u64, DataError> {
        self.log.lock().unwrap().push(statement.clone());
        Ok(self.count)
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, DataError> {
        self.log.lock().unwrap().push(statement.clone());
        Ok(self.affected)
    }
}

fn crud(executor: Scripted) -> Crud<Scripted> {
    let registry = SchemaRegistry::builder()
        .entity::<User>()
        .entity::<Project>()
        .build()
        .unwrap();
    Crud::new(Arc::new(registry), executor)
}

#[tokio::test]
async fn empty_result_stops_after_count() {
    let crud = crud(Scripted::default());
    let page = crud.list("User", &ListParams::new()).await.unwrap();

    assert_eq!(page.total_records, 0);
    assert_eq!(page.current_page, 1);
    assert_eq!(page.per_page, 10);
    assert!(page.records.is_empty());
    assert_eq!(crud.executor().statements().len(), 1);
}

#[tokio::test]
async fn page_beyond_total_skips_row_queries() {
    let crud = crud(Scripted {
        count: 3,
        ..Default::default()
    });
    let page = crud
        .list("User", &ListParams::new().page(5).limit(10))
        .await
        .unwrap();

    assert_eq!(page.total_records, 3);
    assert_eq!(page.current_page, 5);
    assert!(page.records.is_empty());
    assert_eq!(crud.executor().statements().len(), 1);
}

#[tokio::test]
async fn records_follow_page_order() {
    let executor = Scripted {
        count: 2,
        ..Default::default()
    }
    .with_rows(vec![json!({"__pk": 2}), json!({"__pk": 1})])
    .with_rows(vec![
        json!({"id": 1, "email": "a@x.io", "age": 30, "createdAt": null}),
        json!({"id": 2, "email": "b@x.io", "age": 40, "createdAt": null}),
    ]);
    let crud = crud(executor);
    let page = crud.list("User", &ListParams::new()).await.unwrap();

    let ids: Vec<_> = page.records.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(2), json!(1)]);

    let statements = crud.executor().statements();
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[2].params, vec![SqlValue::Int(2), SqlValue::Int(1)]);
    assert!(statements[2].sql.ends_with("IN (?, ?)"));
}

#[tokio::test]
async fn typed_listing() {
    let executor = Scripted {
        count: 1,
        ..Default::default()
    }
    .with_rows(vec![json!({"__pk": 7})])
    .with_rows(vec![json!({"id": 7, "email": "c@x.io", "age": null, "createdAt": null})]);
    let crud = crud(executor);
    let page = crud.list_as::<User>(&ListParams::new()).await.unwrap();

    assert_eq!(
        page.records,
        vec![User {
            id: 7,
            email: "c@x.io".into()
        }]
    );
}

#[tokio::test]
async fn invalid_parameters_run_nothing() {
    let crud = crud(Scripted::default());
    let err = crud
        .list("User", &ListParams::new().sort_order("sideways"))
        .await
        .unwrap_err();

    assert!(err.is_invalid_argument());
    assert!(crud.executor().statements().is_empty());
}

#[tokio::test]
async fn get_by_id_coerces_string_ids() {
    let crud = crud(Scripted::default().with_rows(vec![json!({
        "id": 7, "email": "c@x.io", "age": 21, "createdAt": null,
        "project.id": 3, "project.name": "Alpha", "project.deletedAt": null
    })]));
    let record = crud
        .get_by_id("User", "7", &["project".to_string()])
        .await
        .unwrap();

    assert_eq!(record["project"]["name"], json!("Alpha"));
    assert_eq!(crud.executor().statements()[0].params, vec![SqlValue::Int(7)]);
}

#[tokio::test]
async fn get_by_id_reports_missing_rows() {
    let crud = crud(Scripted::default());
    let err = crud.get_by_id("User", 42, &[]).await.unwrap_err();

    assert!(matches!(err, DataError::NotFound(ref m) if m == "User with ID 42 not found."));
}

#[tokio::test]
async fn get_by_id_rejects_malformed_ids() {
    let crud = crud(Scripted::default());
    let err = crud.get_by_id("User", "abc", &[]).await.unwrap_err();

    assert!(err.is_invalid_argument());
    assert!(crud.executor().statements().is_empty());
}

#[tokio::test]
async fn delete_reports_outcome() {
    let crud = crud(Scripted {
        affected: 1,
        ..Default::default()
    });
    let outcome = crud.delete("User", 5).await.unwrap();
    assert_eq!(outcome.message, "User deleted successfully.");

    let statements = crud.executor().statements();
    assert_eq!(statements[0].sql, "DELETE FROM \"users\" WHERE \"id\" = ?");
}

#[tokio::test]
async fn delete_of_missing_row_is_not_found() {
    let crud = crud(Scripted::default());
    let err = crud.delete("Project", 9).await.unwrap_err();

    assert!(matches!(err, DataError::NotFound(ref m) if m == "Project with ID 9 not found."));
}

#[tokio::test]
async fn soft_delete_requires_a_soft_delete_column() {
    let crud = crud(Scripted {
        affected: 1,
        ..Default::default()
    });
    let err = crud.soft_delete("User", 1).await.unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(crud.executor().statements().is_empty());

    let outcome = crud.soft_delete("Project", 1).await.unwrap();
    assert_eq!(outcome.message, "Project soft-deleted successfully.");
    assert!(crud.executor().statements()[0]
        .sql
        .starts_with("UPDATE \"projects\" SET \"deleted_at\" = CURRENT_TIMESTAMP"));
}

#[tokio::test]
async fn unknown_entity() {
    let crud = crud(Scripted::default());
    let err = crud.list("Ghost", &ListParams::new()).await.unwrap_err();
    assert!(matches!(err, DataError::UnknownEntity(_)));
}
