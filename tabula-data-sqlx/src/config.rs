use tabula_core::{ConfigError, ConfigSection, TabulaConfig};
use tabula_data::DataError;

use crate::error::SqlxErrorExt;

/// Connection settings (`database.*`).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    /// In-memory SQLite databases live and die with a single connection.
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

impl ConfigSection for DatabaseConfig {
    const PREFIX: &'static str = "database";

    fn from_config(config: &TabulaConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let section = Self {
            url: config.get_or(&Self::key("url"), defaults.url)?,
            max_connections: config
                .get_or(&Self::key("max-connections"), defaults.max_connections)?,
        };
        if section.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: Self::key("max-connections"),
                message: "must be greater than 0".into(),
            });
        }
        Ok(section)
    }
}

#[cfg(feature = "sqlite")]
pub async fn connect_sqlite(config: &DatabaseConfig) -> Result<sqlx::SqlitePool, DataError> {
    use sqlx::sqlite::SqlitePoolOptions;

    let mut options = SqlitePoolOptions::new();
    if config.is_in_memory() {
        options = options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    } else {
        options = options.max_connections(config.max_connections);
    }
    let pool = options
        .connect(&config.url)
        .await
        .map_err(|e| e.into_data_error())?;
    tracing::info!(url = %config.url, "sqlite pool ready");
    Ok(pool)
}

#[cfg(feature = "postgres")]
pub async fn connect_postgres(config: &DatabaseConfig) -> Result<sqlx::PgPool, DataError> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
        .map_err(|e| e.into_data_error())?;
    tracing::info!("postgres pool ready");
    Ok(pool)
}
