//! Health check endpoint
//!
//! Provides a simple health check for monitoring and load balancers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Serialize;

use crate::backend::BackendKind;
use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub property: String,
    pub timestamp: String,
    /// Generation backend selected at startup
    pub backend: BackendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub active_requests: usize,
    pub version: &'static str,
}

/// Health check handler
///
/// Always 200 OK: every backend degrades internally, so the service is
/// healthy as long as it answers.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let concierge = state.concierge();
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            service: "Elysia Concierge",
            property: concierge.profile().name.clone(),
            timestamp: Utc::now().to_rfc3339(),
            backend: concierge.backend_kind(),
            model: concierge.model_id().map(str::to_string),
            active_requests: concierge.registry_size().await,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::rule_based_state;
    use crate::request::{RequestType, ResidentRequest};

    #[tokio::test]
    async fn test_health_handler_returns_ok() {
        let (status, Json(body)) = handler(State(rule_based_state())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "healthy");
        assert_eq!(body.backend, BackendKind::RuleBased);
        assert!(body.model.is_none());
        assert_eq!(body.active_requests, 0);
    }

    #[tokio::test]
    async fn test_health_reports_registry_size() {
        let state = rule_based_state();
        state
            .concierge()
            .process_request(ResidentRequest::new("R1", "101", RequestType::PackageInquiry, "box?"))
            .await;

        let (_, Json(body)) = handler(State(state)).await;
        assert_eq!(body.active_requests, 1);
    }
}
