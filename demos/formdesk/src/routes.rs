use serde_json::{json, Value};
use tabula::http::routing::get;
use tabula::prelude::*;
use tabula::tabula_data::{DeleteOutcome, ListParams, RelationsParam};

use crate::entities::RESOURCES;
use crate::state::AppState;

/// `GET /<resource>`, `GET /<resource>/{id}` and `DELETE /<resource>/{id}`
/// for every exposed resource, plus `GET /health`.
pub fn router(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new().route("/health", get(health));
    for &(path, entity) in RESOURCES {
        router = router
            .route(
                &format!("/{path}"),
                get(move |State(state): State<AppState>, params: ListParams| {
                    list(state, entity, params)
                }),
            )
            .route(
                &format!("/{path}/{{id}}"),
                get(
                    move |State(state): State<AppState>,
                          Path(id): Path<String>,
                          relations: RelationsParam| {
                        find(state, entity, id, relations)
                    },
                )
                .delete(
                    move |State(state): State<AppState>, Path(id): Path<String>| {
                        remove(state, entity, id)
                    },
                ),
            );
    }
    router.with_state(state)
}

async fn list(state: AppState, entity: &'static str, params: ListParams) -> PagedResult {
    let page = state
        .crud
        .list(entity, &params)
        .await
        .inspect_err(|e| tracing::warn!(entity, error = %e, "list rejected"))?;
    Ok(Json(page))
}

async fn find(
    state: AppState,
    entity: &'static str,
    id: String,
    relations: RelationsParam,
) -> RecordResult {
    let record = state
        .crud
        .get_by_id(entity, id, &relations.relations)
        .await
        .inspect_err(|e| tracing::warn!(entity, error = %e, "lookup failed"))?;
    Ok(Json(record))
}

/// Soft delete when the entity supports it, hard delete otherwise.
async fn remove(
    state: AppState,
    entity: &'static str,
    id: String,
) -> Result<Json<DeleteOutcome>, AppError> {
    let soft = state
        .crud
        .registry()
        .require(entity)?
        .soft_delete_column()
        .is_some();
    let outcome = if soft {
        state.crud.soft_delete(entity, id).await
    } else {
        state.crud.delete(entity, id).await
    }
    .inspect_err(|e| tracing::warn!(entity, error = %e, "delete failed"))?;
    Ok(Json(outcome))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match sqlx::query("SELECT 1").execute(state.crud.executor().pool()).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "UP" }))),
        Err(e) => {
            tracing::error!(error = %e, "database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "DOWN", "reason": e.to_string() })),
            )
        }
    }
}
