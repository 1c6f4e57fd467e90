//! SQLite binding and row decoding.
//!
//! SQLite has no native timestamp, uuid or JSON types: those are bound as
//! text, and values are decoded by their runtime storage class.

use base64::Engine as _;
use serde_json::{Number, Value};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tabula_data::value::TIMESTAMP_FORMAT;
use tabula_data::{DataError, Dialect, QueryExecutor, Record, SqlValue, Statement};

use crate::error::SqlxErrorExt;
use crate::executor::{non_negative, SqlxExecutor};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

impl QueryExecutor for SqlxExecutor<Sqlite> {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
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

fn bind<'q>(mut query: SqliteQuery<'q>, params: &[SqlValue]) -> SqliteQuery<'q> {
    for value in params {
        query = match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Timestamp(ts) => query.bind(ts.format(TIMESTAMP_FORMAT).to_string()),
            SqlValue::Uuid(u) => query.bind(u.to_string()),
            SqlValue::Json(v) => query.bind(v.to_string()),
        };
    }
    query
}

fn decode_row(row: &SqliteRow) -> Result<Record, DataError> {
    let mut record = Record::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx).map_err(|e| e.into_data_error())?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let storage = raw.type_info().name().to_string();
            decode_value(row, idx, &storage).map_err(|e| e.into_data_error())?
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn decode_value(row: &SqliteRow, idx: usize, storage: &str) -> Result<Value, sqlx::Error> {
    Ok(match storage {
        "INTEGER" | "BOOLEAN" => Value::from(row.try_get_unchecked::<i64, _>(idx)?),
        "REAL" | "NUMERIC" => Number::from_f64(row.try_get_unchecked::<f64, _>(idx)?)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get_unchecked(idx)?;
            Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        _ => Value::String(row.try_get_unchecked::<String, _>(idx)?),
    })
}
