use sqlx::{Database, Pool};

/// [`QueryExecutor`](tabula_data::QueryExecutor) backed by an `sqlx::Pool<DB>`.
///
/// Implemented for `Sqlite` (feature `sqlite`) and `Postgres` (feature
/// `postgres`). Cloning is cheap; the pool is reference-counted.
///
/// # Example
///
/// ```ignore
/// let executor = SqlxExecutor::new(pool.clone());
/// let crud = Crud::new(Arc::new(registry), executor);
/// ```
pub struct SqlxExecutor<DB: Database> {
    pool: Pool<DB>,
}

impl<DB: Database> SqlxExecutor<DB> {
    pub fn new(pool: Pool<DB>) -> Self {
        Self { pool }
    }

    /// Get the underlying pool reference.
    pub fn pool(&self) -> &Pool<DB> {
        &self.pool
    }
}

impl<DB: Database> Clone for SqlxExecutor<DB> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

/// Converts a `COUNT(...)` result into the unsigned total reported to callers.
pub(crate) fn non_negative(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}
