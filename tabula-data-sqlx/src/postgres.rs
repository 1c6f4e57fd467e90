//! PostgreSQL binding and row decoding.

use base64::Engine as _;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Number, Value};
use sqlx::postgres::{PgArguments, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tabula_data::value::TIMESTAMP_FORMAT;
use tabula_data::{DataError, Dialect, QueryExecutor, Record, SqlValue, Statement};
use uuid::Uuid;

use crate::error::SqlxErrorExt;
use crate::executor::{non_negative, SqlxExecutor};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

impl QueryExecutor for SqlxExecutor<Postgres> {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn fetch_rows(&self, statement: &Statement) -> Result<Vec<Record>, DataError> {
        let rows = bind(sqlx::query(&statement.sql), &statement.params)
            .fetch_all(self.pool())
            .await
            .map_err(|e| e.into_data_error())?;
        rows.iter().map(decode_row).collect()
    }

    async fn fetch_count(&self, statement: &Statement) -> Result<u64, DataError> {
        let row = bind(sqlx::query(&statement.sql), &statement.params)
            .fetch_one(self.pool())
            .await
            .map_err(|e| e.into_data_error())?;
        let count: i64 = row.try_get(0).map_err(|e| e.into_data_error())?;
        Ok(non_negative(count))
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, DataError> {
        let result = bind(sqlx::query(&statement.sql), &statement.params)
            .execute(self.pool())
            .await
            .map_err(|e| e.into_data_error())?;
        Ok(result.rows_affected())
    }
}

fn bind<'q>(mut query: PgQuery<'q>, params: &[SqlValue]) -> PgQuery<'q> {
    for value in params {
        query = match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Timestamp(ts) => query.bind(*ts),
            SqlValue::Uuid(u) => query.bind(*u),
            SqlValue::Json(v) => query.bind(sqlx::types::Json(v.clone())),
        };
    }
    query
}

fn decode_row(row: &PgRow) -> Result<Record, DataError> {
    let mut record = Record::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx).map_err(|e| e.into_data_error())?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            decode_value(row, idx, column.type_info().name()).map_err(|e| e.into_data_error())?
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn decode_value(row: &PgRow, idx: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let float = |f: f64| Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null);
    Ok(match type_name {
        "BOOL" => Value::Bool(row.try_get(idx)?),
        "INT2" => Value::from(row.try_get::<i16, _>(idx)?),
        "INT4" => Value::from(row.try_get::<i32, _>(idx)?),
        "INT8" => Value::from(row.try_get::<i64, _>(idx)?),
        "FLOAT4" => float(f64::from(row.try_get::<f32, _>(idx)?)),
        "FLOAT8" => float(row.try_get::<f64, _>(idx)?),
        "TIMESTAMP" => Value::String(
            row.try_get::<NaiveDateTime, _>(idx)?
                .format(TIMESTAMP_FORMAT)
                .to_string(),
        ),
        "TIMESTAMPTZ" => Value::String(row.try_get::<DateTime<Utc>, _>(idx)?.to_rfc3339()),
        "DATE" => Value::String(row.try_get::<NaiveDate, _>(idx)?.to_string()),
        "UUID" => Value::String(row.try_get::<Uuid, _>(idx)?.to_string()),
        "JSON" | "JSONB" => row.try_get::<Value, _>(idx)?,
        "BYTEA" => {
            let bytes: Vec<u8> = row.try_get(idx)?;
            Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => Value::String(row.try_get(idx)?),
        other => {
            return Err(sqlx::Error::ColumnDecode {
                index: idx.to_string(),
                source: format!("unsupported column type {other}").into(),
            })
        }
    })
}
