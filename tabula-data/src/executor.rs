use std::future::Future;

use crate::error::DataError;
use crate::hydrate::Record;
use crate::query::{Dialect, Statement};

/// Runs rendered statements against a database.
///
/// Uses RPITIT (return-position `impl Trait` in traits), so no `async-trait`
/// is needed. Rows come back as JSON objects keyed by the column aliases of
/// the statement.
pub trait QueryExecutor: Send + Sync {
    /// Placeholder and quoting style expected by this backend.
    fn dialect(&self) -> Dialect;

    fn fetch_rows(
        &self,
        statement: &Statement,
    ) -> impl Future<Output = Result<Vec<Record>, DataError>> + Send;

    /// First column of the first row, as a non-negative integer.
    fn fetch_count(
        &self,
        statement: &Statement,
    ) -> impl Future<Output = Result<u64, DataError>> + Send;

    /// Run a statement that returns no rows; yields the number of affected rows.
    fn execute(&self, statement: &Statement)
        -> impl Future<Output = Result<u64, DataError>> + Send;
}
