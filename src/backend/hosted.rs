//! Hosted inference API backend
//!
//! One bounded HTTP call per request to a hosted text-generation endpoint.
//! Any failure (network, timeout, bad status, malformed payload) becomes a
//! fixed apology naming the failure class.

use super::prompt::concierge_prompt;
use super::{BackendInitError, BackendKind, GenerationBackend, GenerationError, apology};
use crate::config::HostedConfig;
use crate::property::PropertyProfile;
use crate::request::ResidentRequest;
use async_trait::async_trait;
use chrono::Local;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

/// Client for a hosted inference API (`POST {api_url}/models/{model}`)
pub struct HostedApiBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_new_tokens: u32,
    temperature: f32,
    profile: Arc<PropertyProfile>,
    timeout: Duration,
}

impl std::fmt::Debug for HostedApiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // api_key deliberately omitted
        f.debug_struct("HostedApiBackend")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl HostedApiBackend {
    /// Build the backend from configuration
    ///
    /// # Errors
    ///
    /// Returns `MissingSetting` when the API key or model id is absent.
    pub fn from_config(
        config: &HostedConfig,
        profile: Arc<PropertyProfile>,
        timeout: Duration,
    ) -> Result<Self, BackendInitError> {
        let api_key =
            non_blank(config.api_key.as_ref()).ok_or(BackendInitError::MissingSetting {
                backend: BackendKind::Hosted,
                setting: "an API key",
            })?;
        let model = non_blank(config.model.as_ref()).ok_or(BackendInitError::MissingSetting {
            backend: BackendKind::Hosted,
            setting: "a model id",
        })?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(BackendInitError::HttpClient)?;

        let endpoint = format!("{}/models/{}", config.api_url.trim_end_matches('/'), model);

        tracing::info!(
            endpoint = %endpoint,
            timeout_seconds = timeout.as_secs(),
            "Hosted inference backend configured"
        );

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            profile,
            timeout,
        })
    }

    async fn call(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": self.max_new_tokens,
                "temperature": self.temperature,
                "return_full_text": false,
            }
        });

        let payload: Value = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = payload
            .get(0)
            .and_then(|first| first.get("generated_text"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                GenerationError::MalformedPayload(
                    "expected [{\"generated_text\": ...}]".to_string(),
                )
            })?
            .trim();

        if text.is_empty() {
            return Err(GenerationError::MalformedPayload(
                "generated_text is empty".to_string(),
            ));
        }

        Ok(text.to_string())
    }

    async fn try_generate(&self, request: &ResidentRequest) -> Result<String, GenerationError> {
        let prompt = concierge_prompt(&self.profile, request, Local::now().naive_local());
        tokio::time::timeout(self.timeout, self.call(&prompt))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))?
    }
}

#[async_trait]
impl GenerationBackend for HostedApiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Hosted
    }

    fn model_id(&self) -> Option<&str> {
        Some(&self.model)
    }

    async fn generate_reply(&self, request: &ResidentRequest) -> String {
        match self.try_generate(request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    backend = %BackendKind::Hosted,
                    model = %self.model,
                    unit = %request.unit_number(),
                    error_class = e.class(),
                    error = %e,
                    "Hosted inference failed, returning apology"
                );
                apology(&e, self.profile.management_phone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>, model: Option<&str>) -> HostedConfig {
        HostedConfig {
            enabled: true,
            api_key: api_key.map(str::to_string),
            model: model.map(str::to_string),
            ..HostedConfig::default()
        }
    }

    fn build(config: &HostedConfig) -> Result<HostedApiBackend, BackendInitError> {
        HostedApiBackend::from_config(
            config,
            Arc::new(PropertyProfile::default()),
            Duration::from_secs(30),
        )
    }

    #[test]
    fn test_missing_api_key_is_init_error() {
        let err = build(&config(None, Some("bigscience/bloom-560m"))).unwrap_err();
        assert!(matches!(
            err,
            BackendInitError::MissingSetting {
                backend: BackendKind::Hosted,
                setting: "an API key"
            }
        ));
    }

    #[test]
    fn test_blank_model_is_init_error() {
        let err = build(&config(Some("hf_x"), Some("  "))).unwrap_err();
        assert!(err.to_string().contains("model id"));
    }

    #[test]
    fn test_endpoint_joins_model_path() {
        let backend = build(&config(Some("hf_x"), Some("bigscience/bloom-560m"))).unwrap();
        assert_eq!(
            backend.endpoint,
            "https://api-inference.huggingface.co/models/bigscience/bloom-560m"
        );
        assert_eq!(backend.model_id(), Some("bigscience/bloom-560m"));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let backend = build(&config(Some("hf_secret"), Some("m"))).unwrap();
        assert!(!format!("{:?}", backend).contains("hf_secret"));
    }
}
