//! Analysis history endpoints

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use tracing::debug;

use crate::error::ApiResult;
use crate::AppState;
use neuroscan_common::db::AnalysisRecord;

/// GET /history
///
/// All persisted analyses, most recent first.
pub async fn list_history(State(state): State<AppState>) -> ApiResult<Json<Vec<AnalysisRecord>>> {
    let records = state.store.list_all().await?;
    Ok(Json(records))
}

/// DELETE /history/:id
///
/// Removing a record that does not exist is an idempotent success; the
/// acknowledgement is the same either way.
pub async fn delete_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let removed = state.store.delete_by_id(id).await?;
    if !removed {
        debug!("delete of history record {} matched no rows", id);
    }
    Ok(Json(json!({ "message": "Record deleted successfully" })))
}
