//! JSON extractor with concierge-shaped error responses
//!
//! Wraps Axum's `Json` extractor so that body rejections come back as
//! `{"error": "..."}`, the same shape `AppError` produces.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

/// Rejection for [`ConciergeJson`]
///
/// - JSON syntax errors → 400 Bad Request
/// - Data errors (unknown enum value, missing field, failed validation) → 422
/// - Missing content type → 415 Unsupported Media Type
#[derive(Debug)]
pub struct ConciergeJsonRejection(JsonRejection);

impl ConciergeJsonRejection {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            JsonRejection::JsonSyntaxError(_) => StatusCode::BAD_REQUEST,
            JsonRejection::JsonDataError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ConciergeJsonRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            JsonRejection::MissingJsonContentType(_) => {
                "Content-Type must be application/json".to_string()
            }
            other => other.body_text(),
        };
        tracing::debug!(status = %status, error = %message, "Rejected request body");
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// JSON body extractor used by the concierge handlers
pub struct ConciergeJson<T>(pub T);

impl<S, T> FromRequest<S> for ConciergeJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ConciergeJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ConciergeJson(value)),
            Err(rejection) => Err(ConciergeJsonRejection(rejection)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ResidentRequest;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;

    async fn extract(body: &str, content_type: Option<&str>) -> Result<ResidentRequest, StatusCode> {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        ConciergeJson::<ResidentRequest>::from_request(req, &())
            .await
            .map(|ConciergeJson(r)| r)
            .map_err(|e| e.status())
    }

    #[tokio::test]
    async fn test_valid_body_extracts() {
        let body = r#"{"resident_id":"R1","unit_number":"304","request_type":"maintenance","message":"leak"}"#;
        let request = extract(body, Some("application/json")).await.unwrap();
        assert_eq!(request.unit_number(), "304");
    }

    #[tokio::test]
    async fn test_syntax_error_is_400() {
        assert_eq!(
            extract("{not json", Some("application/json")).await.unwrap_err(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_unknown_enum_is_422() {
        let body = r#"{"resident_id":"R1","unit_number":"304","request_type":"plumbing","message":"x"}"#;
        assert_eq!(
            extract(body, Some("application/json")).await.unwrap_err(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn test_missing_content_type_is_415() {
        assert_eq!(
            extract("{}", None).await.unwrap_err(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }
}
