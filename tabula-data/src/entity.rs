use serde::de::DeserializeOwned;

use crate::schema::{EntitySchema, SchemaError};

/// A typed entity with registered metadata.
///
/// Records produced by [`Crud`](crate::Crud) are plain JSON objects keyed by
/// logical column names, so any `Deserialize` struct whose fields match can
/// be used with [`Crud::list_as`](crate::Crud::list_as).
///
/// # Example
///
/// ```ignore
/// impl Entity for User {
///     const NAME: &'static str = "User";
///     fn schema() -> Result<EntitySchema, SchemaError> {
///         EntitySchema::builder(Self::NAME, "users")
///             .primary("id", ColumnType::Integer)
///             .column("email", ColumnType::Text)
///             .many_to_one("project", "Project", "project_id")
///             .build()
///     }
/// }
/// ```
pub trait Entity: DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Registry key, also used in user-facing messages.
    const NAME: &'static str;

    fn schema() -> Result<EntitySchema, SchemaError>;
}
