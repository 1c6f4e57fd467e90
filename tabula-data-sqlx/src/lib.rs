//! # tabula-data-sqlx: SQLx backend for the Tabula data layer
//!
//! This crate runs the statements planned by [`tabula-data`] against a real
//! database through [SQLx](https://github.com/launchbadge/sqlx). It binds
//! [`SqlValue`](tabula_data::SqlValue) parameters, decodes rows into JSON
//! records, and bridges `sqlx::Error` into `DataError`.
//!
//! # What's in this crate
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SqlxExecutor`] | `QueryExecutor` implementation holding an `sqlx::Pool<DB>` |
//! | [`DatabaseConfig`] | `database.*` configuration section |
//! | [`SqlxErrorExt`] | Extension trait to convert `sqlx::Error` → `DataError` (`.into_data_error()`) |
//! | [`SqlxResult<T>`] | Type alias for `Result<T, DataError>` |
//!
//! # Feature flags
//!
//! | Feature    | Driver |
//! |------------|--------|
//! | `sqlite`   | SQLite via `sqlx/sqlite` (default) |
//! | `postgres` | PostgreSQL via `sqlx/postgres` |
//!
//! # Quick start
//!
//! ```ignore
//! use tabula_data_sqlx::{connect_sqlite, DatabaseConfig, SqlxExecutor};
//!
//! let config: DatabaseConfig = app_config.section()?;
//! let pool = connect_sqlite(&config).await?;
//! let crud = Crud::new(Arc::new(registry), SqlxExecutor::new(pool));
//!
//! let page = crud.list("User", &ListParams::new().relations(&["project"])).await?;
//! ```
//!
//! # Type mapping
//!
//! SQLite stores timestamps as `YYYY-MM-DD HH:MM:SS` text, and uuids and
//! JSON as text. Blobs and `bytea` columns come back base64-encoded.

pub mod config;
pub mod error;
pub mod executor;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "postgres")]
pub use config::connect_postgres;
#[cfg(feature = "sqlite")]
pub use config::connect_sqlite;
pub use config::DatabaseConfig;
pub use error::{SqlxErrorExt, SqlxResult};
pub use executor::SqlxExecutor;

/// Re-exports of the most commonly used types from both `tabula-data` and this crate.
pub mod prelude {
    pub use crate::{DatabaseConfig, SqlxErrorExt, SqlxExecutor};
    pub use tabula_data::prelude::*;
}
