use sqlx::Sqlite;
use tabula::tabula_data::Crud;
use tabula::tabula_data_sqlx::SqlxExecutor;

#[derive(Clone)]
pub struct AppState {
    pub crud: Crud<SqlxExecutor<Sqlite>>,
}
