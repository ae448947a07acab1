//! Request status endpoint

use axum::{
    Json,
    extract::{Path, State},
};

use crate::concierge::StatusReport;
use crate::error::{AppError, AppResult};
use crate::handlers::AppState;

/// `GET /api/elysia/status/{request_id}`
///
/// Returns 404 for identifiers that were never issued, have expired, or
/// were evicted from the registry.
pub async fn handler(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> AppResult<Json<StatusReport>> {
    state
        .concierge()
        .status(&request_id)
        .await
        .map(Json)
        .ok_or_else(|| {
            tracing::debug!(request_id = %request_id, "Status requested for unknown request");
            AppError::RequestNotFound(request_id)
        })
}
