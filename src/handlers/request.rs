//! Resident request endpoint

use axum::{Json, extract::State};

use crate::handlers::AppState;
use crate::handlers::extractor::ConciergeJson;
use crate::request::{ConciergeResponse, ResidentRequest};

/// `POST /api/elysia/request`
///
/// Validation happens during deserialization; a body that reaches the
/// handler always produces a response.
pub async fn handler(
    State(state): State<AppState>,
    ConciergeJson(request): ConciergeJson<ResidentRequest>,
) -> Json<ConciergeResponse> {
    Json(state.concierge().process_request(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::rule_based_state;
    use crate::request::{Priority, RequestType};

    #[tokio::test]
    async fn test_handler_returns_classified_response() {
        let state = rule_based_state();
        let request = ResidentRequest::new("R1", "304", RequestType::GuestAccess, "my sister visits")
            .with_priority(Priority::Emergency);

        let Json(response) = handler(State(state), ConciergeJson(request)).await;
        assert!(response.follow_up_needed());
        assert!(response.escalation_required());
        assert!(!response.response().is_empty());
    }
}
