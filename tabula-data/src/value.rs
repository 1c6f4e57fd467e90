use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DataError;
use crate::schema::ColumnType;

/// A bind parameter, already coerced to the type of the column it is compared with.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
    Json(Value),
}

/// Text representation stored by backends without a native timestamp type.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(b) => write!(f, "{b}"),
            SqlValue::Int(i) => write!(f, "{i}"),
            SqlValue::Float(x) => write!(f, "{x}"),
            SqlValue::Text(s) => write!(f, "'{s}'"),
            SqlValue::Timestamp(ts) => write!(f, "'{}'", ts.format(TIMESTAMP_FORMAT)),
            SqlValue::Uuid(u) => write!(f, "'{u}'"),
            SqlValue::Json(v) => write!(f, "'{v}'"),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

/// Convert a request value into a bind parameter for a column of type `ty`.
///
/// Query strings deliver everything as text, so numeric, boolean, uuid and
/// timestamp columns accept their string spellings too.
pub fn coerce(field: &str, value: &Value, ty: ColumnType) -> Result<SqlValue, DataError> {
    let fail = || {
        DataError::invalid(format!(
            "Invalid value for '{field}': expected {}, got {value}",
            ty.name()
        ))
    };

    if value.is_null() {
        return Ok(SqlValue::Null);
    }

    match ty {
        ColumnType::Json => Ok(SqlValue::Json(value.clone())),
        ColumnType::Text => scalar_text(value).map(SqlValue::Text).ok_or_else(fail),
        ColumnType::Integer => match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(SqlValue::Int)
                .ok_or_else(fail),
            Value::String(s) => s.trim().parse().map(SqlValue::Int).map_err(|_| fail()),
            _ => Err(fail()),
        },
        ColumnType::Float => match value {
            Value::Number(n) => n.as_f64().map(SqlValue::Float).ok_or_else(fail),
            Value::String(s) => s.trim().parse().map(SqlValue::Float).map_err(|_| fail()),
            _ => Err(fail()),
        },
        ColumnType::Boolean => match value {
            Value::Bool(b) => Ok(SqlValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(SqlValue::Bool(false)),
                Some(1) => Ok(SqlValue::Bool(true)),
                _ => Err(fail()),
            },
            Value::String(s) => match s.trim() {
                "true" | "1" => Ok(SqlValue::Bool(true)),
                "false" | "0" => Ok(SqlValue::Bool(false)),
                _ => Err(fail()),
            },
            _ => Err(fail()),
        },
        ColumnType::Timestamp => match value {
            Value::String(s) => parse_timestamp(s).map(SqlValue::Timestamp).ok_or_else(fail),
            _ => Err(fail()),
        },
        ColumnType::Uuid => match value {
            Value::String(s) => Uuid::parse_str(s.trim()).map(SqlValue::Uuid).map_err(|_| fail()),
            _ => Err(fail()),
        },
    }
}

/// Render a scalar as the text used inside `LIKE` patterns.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]`, the `T`-separated variant,
/// and bare dates (midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
