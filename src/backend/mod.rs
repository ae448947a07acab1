//! Reply generation backends
//!
//! Every backend turns a [`ResidentRequest`] into reply text through
//! [`GenerationBackend::generate_reply`]. The call never fails: a backend that
//! cannot produce a model reply degrades on its own (rule-based text or an
//! apology) and logs the cause.
//!
//! Exactly one backend is alive per process, chosen at startup by
//! [`selector::select_backend`].

pub mod file_model;
pub mod hosted;
pub mod local_model;
pub mod prompt;
pub mod rule_based;
pub mod selector;

use crate::request::ResidentRequest;
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub use file_model::{AgentChatModel, ChatModel, FileModelBackend, ModelArtifact};
pub use hosted::HostedApiBackend;
pub use local_model::{LocalModelBackend, LocalRuntime, TextGenerator};
pub use rule_based::RuleBasedBackend;
pub use selector::select_backend;

/// Backend variant, also used as a metrics label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    FileModel,
    Hosted,
    LocalModel,
    RuleBased,
}

impl BackendKind {
    /// Selection precedence, highest first
    pub const PRECEDENCE: [BackendKind; 4] = [
        BackendKind::FileModel,
        BackendKind::Hosted,
        BackendKind::LocalModel,
        BackendKind::RuleBased,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileModel => "file_model",
            Self::Hosted => "hosted",
            Self::LocalModel => "local_model",
            Self::RuleBased => "rule_based",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy that produces reply text for a resident request
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Which variant this is
    fn kind(&self) -> BackendKind;

    /// Identifier of the underlying model, if any
    fn model_id(&self) -> Option<&str> {
        None
    }

    /// Produce reply text for the request
    ///
    /// Infallible by contract. Implementations catch their own failures and
    /// return degraded but useful text.
    async fn generate_reply(&self, request: &ResidentRequest) -> String;
}

/// Failure to bring a backend up at startup
///
/// Handled by the selector, which moves on to the next variant.
#[derive(Debug, Error)]
pub enum BackendInitError {
    #[error("{backend} backend requires {setting}")]
    MissingSetting {
        backend: BackendKind,
        setting: &'static str,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("model runtime at {url} is unavailable: {reason}")]
    RuntimeUnavailable { url: String, reason: String },

    #[error("failed to download model artifact from {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("model cache error at {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while generating a single reply
///
/// Never crosses the `generate_reply` boundary.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("malformed upstream payload: {0}")]
    MalformedPayload(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

impl GenerationError {
    /// Short label for log fields
    pub fn class(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Network(_) => "network",
            Self::Status(_) => "status",
            Self::MalformedPayload(_) => "malformed_payload",
            Self::Inference(_) => "inference",
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedPayload(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Network(err)
        }
    }
}

/// Resident-facing apology for a failed generation
///
/// Names the failure class in plain words and points to the management
/// office. Carries no internal error detail.
pub fn apology(error: &GenerationError, management_phone: Option<&str>) -> String {
    let opening = match error {
        GenerationError::Timeout(_) => {
            "I'm sorry, our concierge service is taking longer than usual to respond."
        }
        GenerationError::Network(_) | GenerationError::Status(_) => {
            "I'm sorry, I'm having trouble reaching our concierge service right now."
        }
        GenerationError::MalformedPayload(_) => {
            "I'm sorry, I received an unreadable answer from our concierge service."
        }
        GenerationError::Inference(_) => {
            "I apologize, but I'm experiencing technical difficulties right now."
        }
    };

    let contact = match management_phone {
        Some(phone) => format!("the management office at {}", phone),
        None => "the management office".to_string(),
    };

    format!(
        "{} Please try again in a few minutes or contact {} for immediate assistance.",
        opening, contact
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_labels() {
        assert_eq!(BackendKind::FileModel.as_str(), "file_model");
        assert_eq!(BackendKind::RuleBased.to_string(), "rule_based");
        assert_eq!(
            serde_json::to_string(&BackendKind::LocalModel).unwrap(),
            r#""local_model""#
        );
    }

    #[test]
    fn test_precedence_ends_with_rule_based() {
        assert_eq!(BackendKind::PRECEDENCE[0], BackendKind::FileModel);
        assert_eq!(BackendKind::PRECEDENCE[3], BackendKind::RuleBased);
    }

    #[test]
    fn test_apology_names_failure_class_and_office() {
        let timeout = apology(
            &GenerationError::Timeout(Duration::from_secs(30)),
            Some("303-555-MGMT"),
        );
        assert!(timeout.contains("taking longer than usual"));
        assert!(timeout.contains("management office at 303-555-MGMT"));

        let inference = apology(&GenerationError::Inference("oom".to_string()), None);
        assert!(inference.to_lowercase().contains("technical difficulties"));
        assert!(inference.contains("management office"));
    }

    #[test]
    fn test_apology_carries_no_diagnostics() {
        let text = apology(
            &GenerationError::MalformedPayload("missing generated_text at [0]".to_string()),
            None,
        );
        assert!(!text.contains("generated_text"));
        assert!(!text.contains('['));
    }

    #[test]
    fn test_error_class_labels() {
        assert_eq!(GenerationError::Status(503).class(), "status");
        assert_eq!(
            GenerationError::Timeout(Duration::from_secs(1)).class(),
            "timeout"
        );
    }
}
