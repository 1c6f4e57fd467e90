pub mod crud;
pub mod entity;
pub mod error;
pub mod executor;
pub mod filter;
pub mod hydrate;
pub mod page;
pub mod params;
pub mod plan;
pub mod query;
pub mod resolve;
pub mod schema;
pub mod value;

pub use crud::{Crud, DeleteOutcome};
pub use entity::Entity;
pub use error::DataError;
pub use executor::QueryExecutor;
pub use filter::{FilterOp, FilterSet, NULL_SENTINEL};
pub use hydrate::Record;
pub use page::Paginated;
pub use params::{ListParams, ListRequest, ListingConfig, RelationsParam, SortOrder};
pub use plan::{build_find_query, build_list_query};
pub use query::{Dialect, ListQuery, Statement};
pub use schema::{ColumnType, EntitySchema, SchemaError, SchemaRegistry};
pub use value::SqlValue;

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        ColumnType, Crud, DataError, Entity, EntitySchema, ListParams, Paginated, QueryExecutor,
        RelationsParam, SchemaRegistry,
    };
}
