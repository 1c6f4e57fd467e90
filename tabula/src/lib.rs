//! # tabula
//!
//! Facade crate bundling the Tabula workspace: configuration, error mapping
//! and tracing setup from `tabula-core`, the metadata-driven query layer from
//! `tabula-data`, and the SQLx executor from `tabula-data-sqlx`.
//!
//! ```ignore
//! use tabula::prelude::*;
//!
//! async fn list_users(
//!     State(crud): State<Crud<SqlxExecutor<Sqlite>>>,
//!     params: ListParams,
//! ) -> PagedResult {
//!     Ok(Json(crud.list("User", &params).await?))
//! }
//! ```

pub extern crate tabula_core;

// Re-export everything from tabula-core at the top level for convenience.
pub use tabula_core::*;

#[cfg(feature = "data")]
pub use tabula_data;

#[cfg(feature = "data-sqlx")]
pub use tabula_data_sqlx;

/// Convenience type aliases that depend on types from optional sub-crates.
pub mod types {
    /// Paginated JSON result: `Result<Json<Paginated<Record>>, AppError>`.
    #[cfg(feature = "data")]
    pub type PagedResult<T = tabula_data::Record> = Result<
        tabula_core::http::Json<tabula_data::Paginated<T>>,
        tabula_core::AppError,
    >;

    /// Single JSON record result.
    #[cfg(feature = "data")]
    pub type RecordResult = Result<tabula_core::http::Json<tabula_data::Record>, tabula_core::AppError>;
}

/// Unified prelude. Import everything with `use tabula::prelude::*`.
pub mod prelude {
    pub use crate::types::*;
    pub use tabula_core::prelude::*;

    #[cfg(feature = "data")]
    pub use tabula_data::prelude::*;

    #[cfg(feature = "data-sqlx")]
    pub use tabula_data_sqlx::{DatabaseConfig, SqlxExecutor};
}
