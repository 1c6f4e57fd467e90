use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::entity::Entity;
use crate::error::DataError;
use crate::executor::QueryExecutor;
use crate::hydrate::{assemble, order_by_ids, Record};
use crate::page::Paginated;
use crate::params::{ListParams, ListingConfig};
use crate::plan::{build_find_query, build_list_query};
use crate::query::{delete_statement, soft_delete_statement, Statement, PK_ALIAS};
use crate::schema::SchemaRegistry;
use crate::value::{coerce, scalar_text, SqlValue};

/// Confirmation returned by delete operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub message: String,
}

/// Generic list / read / delete service over registered entities.
///
/// # Example
///
/// ```ignore
/// let crud = Crud::new(Arc::new(registry), SqlxExecutor::sqlite(pool));
/// let page = crud
///     .list("User", &ListParams::new().filters(json!({"project.name": "Alpha"})))
///     .await?;
/// ```
pub struct Crud<X> {
    registry: Arc<SchemaRegistry>,
    executor: X,
    config: ListingConfig,
}

impl<X: Clone> Clone for Crud<X> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            executor: self.executor.clone(),
            config: self.config.clone(),
        }
    }
}

impl<X: QueryExecutor> Crud<X> {
    pub fn new(registry: Arc<SchemaRegistry>, executor: X) -> Self {
        Self {
            registry,
            executor,
            config: ListingConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ListingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub fn config(&self) -> &ListingConfig {
        &self.config
    }

    /// Paginated, filtered, sorted and searched list of `entity` records.
    ///
    /// Runs up to three statements: the total count, the primary keys of the
    /// requested page, and the page's records with their requested relations.
    pub async fn list(
        &self,
        entity: &str,
        params: &ListParams,
    ) -> Result<Paginated<Record>, DataError> {
        let request = params.validate(&self.config)?;
        let query = build_list_query(&self.registry, entity, &request)?;
        let dialect = self.executor.dialect();

        let count = query.count_statement(dialect);
        log_statement(entity, "count", &count);
        let total = self.executor.fetch_count(&count).await?;

        let mut records = Vec::new();
        if total > request.offset() {
            let page = query.page_ids_statement(dialect);
            log_statement(entity, "page", &page);
            let ids: Vec<Value> = self
                .executor
                .fetch_rows(&page)
                .await?
                .into_iter()
                .filter_map(|mut row| row.remove(PK_ALIAS))
                .collect();

            if !ids.is_empty() {
                let pk = query.root().primary_key();
                let binds = ids
                    .iter()
                    .map(|id| coerce(&pk.name, id, pk.ty))
                    .collect::<Result<Vec<SqlValue>, _>>()?;
                let hydrate = query.hydrate_statement(dialect, &binds);
                log_statement(entity, "hydrate", &hydrate);
                let rows = self.executor.fetch_rows(&hydrate).await?;
                let assembled = assemble(query.root(), query.joins(), rows);
                records = order_by_ids(query.root(), assembled, &ids);
            }
        }

        tracing::debug!(
            entity,
            total,
            page = request.page,
            returned = records.len(),
            "list completed"
        );
        Ok(Paginated {
            total_records: total,
            current_page: request.page,
            per_page: request.limit,
            records,
        })
    }

    /// [`Crud::list`] with records deserialized into `E`.
    pub async fn list_as<E: Entity>(&self, params: &ListParams) -> Result<Paginated<E>, DataError> {
        self.list(E::NAME, params).await?.into_typed()
    }

    /// One record by primary key, with the given direct relations attached.
    /// Soft-deleted rows are not found.
    pub async fn get_by_id(
        &self,
        entity: &str,
        id: impl Into<Value>,
        relations: &[String],
    ) -> Result<Record, DataError> {
        let id = id.into();
        let query = build_find_query(&self.registry, entity, relations)?;
        let pk = query.root().primary_key();
        let bind = coerce(&pk.name, &id, pk.ty)?;

        let statement = query.find_by_id_statement(self.executor.dialect(), bind);
        log_statement(entity, "find", &statement);
        let rows = self.executor.fetch_rows(&statement).await?;
        assemble(query.root(), query.joins(), rows)
            .into_iter()
            .next()
            .ok_or_else(|| not_found(entity, &id))
    }

    pub async fn get_as<E: Entity>(
        &self,
        id: impl Into<Value>,
        relations: &[String],
    ) -> Result<E, DataError> {
        let record = self.get_by_id(E::NAME, id, relations).await?;
        serde_json::from_value(Value::Object(record))
            .map_err(|e| DataError::Other(format!("record does not match target type: {e}")))
    }

    /// Permanently remove one row.
    pub async fn delete(
        &self,
        entity: &str,
        id: impl Into<Value>,
    ) -> Result<DeleteOutcome, DataError> {
        let id = id.into();
        let schema = self.registry.require(entity)?;
        let pk = schema.primary_key();
        let bind = coerce(&pk.name, &id, pk.ty)?;

        let statement = delete_statement(self.executor.dialect(), schema, bind);
        log_statement(entity, "delete", &statement);
        if self.executor.execute(&statement).await? == 0 {
            return Err(not_found(entity, &id));
        }
        tracing::info!(entity, id = %display_id(&id), "record deleted");
        Ok(DeleteOutcome {
            message: format!("{entity} deleted successfully."),
        })
    }

    /// Stamp the soft-delete column of one row.
    pub async fn soft_delete(
        &self,
        entity: &str,
        id: impl Into<Value>,
    ) -> Result<DeleteOutcome, DataError> {
        let id = id.into();
        let schema = self.registry.require(entity)?;
        let pk = schema.primary_key();
        let bind = coerce(&pk.name, &id, pk.ty)?;

        let statement = soft_delete_statement(self.executor.dialect(), schema, bind)
            .ok_or_else(|| DataError::invalid(format!("{entity} does not support soft delete")))?;
        log_statement(entity, "soft delete", &statement);
        if self.executor.execute(&statement).await? == 0 {
            return Err(not_found(entity, &id));
        }
        tracing::info!(entity, id = %display_id(&id), "record soft-deleted");
        Ok(DeleteOutcome {
            message: format!("{entity} soft-deleted successfully."),
        })
    }
}

fn log_statement(entity: &str, kind: &str, statement: &Statement) {
    tracing::debug!(entity, kind, sql = %statement.sql, params = ?statement.names, "executing");
}

fn display_id(id: &Value) -> String {
    scalar_text(id).unwrap_or_else(|| id.to_string())
}

fn not_found(entity: &str, id: &Value) -> DataError {
    DataError::NotFound(format!("{entity} with ID {} not found.", display_id(id)))
}
