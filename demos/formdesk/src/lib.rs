//! Form-management demo service over the Tabula list/read/delete core.

pub mod entities;
pub mod routes;
pub mod seed;
pub mod state;

use std::sync::Arc;

use tabula::prelude::*;
use tabula::tabula_data::ListingConfig;
use tabula::tabula_data_sqlx::connect_sqlite;

pub use state::AppState;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Connect, create and seed the database, and register every entity.
pub async fn build_state(config: &TabulaConfig) -> Result<AppState, BoxError> {
    let database: DatabaseConfig = config.section()?;
    let listing: ListingConfig = config.section()?;

    let pool = connect_sqlite(&database).await?;
    seed::bootstrap(&pool).await?;
    seed::seed(&pool).await?;

    let registry = entities::registry()?;
    tracing::info!(entities = entities::RESOURCES.len(), "schema registry built");
    let crud = Crud::new(Arc::new(registry), SqlxExecutor::new(pool)).with_config(listing);
    Ok(AppState { crud })
}

/// The full application router with tracing and panic handling.
pub fn app(state: AppState) -> Router {
    routes::router(state)
        .layer(tabula::catch_panic_layer())
        .layer(tabula::default_trace())
}
