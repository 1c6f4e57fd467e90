pub mod config;
pub mod error;
pub mod http;
pub mod layers;
pub mod params;

pub use config::{
    ConfigError, ConfigSection, ConfigValue, FromConfigValue, LogFormat, LoggingConfig,
    ServerConfig, TabulaConfig,
};
pub use error::AppError;
pub use layers::{catch_panic_layer, default_trace, init_tracing};
pub use params::{nest_query_pairs, parse_query_string};

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::http::{IntoResponse, Json, Path, Response, Router, State, StatusCode};
    pub use crate::{AppError, ConfigSection, TabulaConfig};
}
