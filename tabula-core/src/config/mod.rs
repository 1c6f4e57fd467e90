mod loader;
pub mod value;

use std::collections::HashMap;
use std::path::Path;

pub use value::{ConfigValue, FromConfigValue};

/// Prefix of environment variables that override configuration keys.
pub const ENV_PREFIX: &str = "TABULA_";

/// Environment variable selecting the active profile.
pub const PROFILE_ENV: &str = "TABULA_PROFILE";

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
    /// A section was present but its values are not acceptable.
    Invalid { key: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Invalid { key, message } => {
                write!(f, "Invalid config value for '{key}': {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Application configuration loaded from YAML files, `.env` files, and environment variables.
///
/// Resolution order (lowest to highest priority):
/// 1. `application.yaml` (base)
/// 2. `application-{profile}.yaml` (profile override)
/// 3. `.env` and `.env.{profile}` (loaded into the process environment, never
///    overwriting variables that are already set)
/// 4. `TABULA_*` environment variables (`TABULA_DATABASE_URL` overrides `database.url`)
///
/// The profile is taken from `TABULA_PROFILE` when set, otherwise from the argument.
#[derive(Debug, Clone)]
pub struct TabulaConfig {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl TabulaConfig {
    /// Load configuration for the given profile from the current working directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."), profile)
    }

    /// Load configuration for the given profile from `dir`.
    pub fn load_from(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let active_profile =
            std::env::var(PROFILE_ENV).unwrap_or_else(|_| profile.to_string());

        let mut values = HashMap::new();
        loader::load_yaml_file(&dir.join("application.yaml"), &mut values)?;
        loader::load_yaml_file(
            &dir.join(format!("application-{active_profile}.yaml")),
            &mut values,
        )?;

        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{active_profile}")));

        loader::overlay_env(std::env::vars(), &mut values);

        tracing::debug!(profile = %active_profile, keys = values.len(), "configuration loaded");
        Ok(TabulaConfig {
            values,
            profile: active_profile,
        })
    }

    /// Create a config from a YAML string (useful for testing).
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(TabulaConfig {
            values,
            profile: profile.to_string(),
        })
    }

    /// Create an empty config (useful for testing).
    pub fn empty() -> Self {
        TabulaConfig {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    /// Set a value programmatically.
    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Get a typed value for the given dot-separated key.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Get a typed value, falling back to `default` when the key is missing.
    ///
    /// A present key with an unconvertible value is still an error.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> Result<V, ConfigError> {
        match self.values.get(key) {
            Some(value) => V::from_config_value(value, key),
            None => Ok(default),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The active profile name.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Build a typed configuration section.
    pub fn section<C: ConfigSection>(&self) -> Result<C, ConfigError> {
        C::from_config(self)
    }
}

/// A typed view over the keys below [`ConfigSection::PREFIX`].
///
/// ```ignore
/// impl ConfigSection for DatabaseConfig {
///     const PREFIX: &'static str = "database";
///     fn from_config(config: &TabulaConfig) -> Result<Self, ConfigError> {
///         Ok(Self { url: config.get(&Self::key("url"))? })
///     }
/// }
/// ```
pub trait ConfigSection: Sized {
    const PREFIX: &'static str;

    fn from_config(config: &TabulaConfig) -> Result<Self, ConfigError>;

    /// Full key for a field of this section.
    fn key(field: &str) -> String {
        format!("{}.{field}", Self::PREFIX)
    }
}

/// HTTP listener settings (`server.*`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl ConfigSection for ServerConfig {
    const PREFIX: &'static str = "server";

    fn from_config(config: &TabulaConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            addr: config.get_or(&Self::key("addr"), defaults.addr)?,
        })
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromConfigValue for LogFormat {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        let raw = String::from_config_value(value, key)?;
        match raw.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Invalid {
                key: key.to_string(),
                message: format!("unknown log format '{other}' (expected 'pretty' or 'json')"),
            }),
        }
    }
}

/// Logging settings (`logging.*`).
///
/// `RUST_LOG` takes precedence over `level` when set.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,tower_http=debug".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl ConfigSection for LoggingConfig {
    const PREFIX: &'static str = "logging";

    fn from_config(config: &TabulaConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            level: config.get_or(&Self::key("level"), defaults.level)?,
            format: config.get_or(&Self::key("format"), defaults.format)?,
        })
    }
}
