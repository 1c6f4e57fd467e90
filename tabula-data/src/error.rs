/// Errors that can occur in the data layer.
#[derive(Debug)]
pub enum DataError {
    /// The caller supplied parameters that cannot be turned into a query.
    InvalidArgument(String),
    NotFound(String),
    /// No schema is registered under this entity name.
    UnknownEntity(String),
    Database(Box<dyn std::error::Error + Send + Sync>),
    Other(String),
}

impl DataError {
    /// Construct a `Database` variant from any error type.
    ///
    /// Used by backend crates (e.g. `tabula-data-sqlx`) to wrap driver-specific errors.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        DataError::InvalidArgument(message.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, DataError::InvalidArgument(_))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::UnknownEntity(name) => write!(f, "Unknown entity: {name}"),
            DataError::Database(err) => write!(f, "Database error: {err}"),
            DataError::Other(msg) => write!(f, "Data error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Database(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<DataError> for tabula_core::AppError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::InvalidArgument(msg) => tabula_core::AppError::BadRequest(msg),
            DataError::NotFound(msg) => tabula_core::AppError::NotFound(msg),
            DataError::UnknownEntity(name) => {
                tabula_core::AppError::Internal(format!("Unknown entity: {name}"))
            }
            DataError::Database(e) => tabula_core::AppError::Internal(e.to_string()),
            DataError::Other(msg) => tabula_core::AppError::Internal(msg),
        }
    }
}
