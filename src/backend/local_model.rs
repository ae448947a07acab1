//! Local model backend
//!
//! Generates replies with a small causal model served by a local
//! OpenAI-compatible completion runtime (for example a llama.cpp server
//! hosting bloom-560m). Falls back to the rule-based reply in-process on any
//! failure.
//!
//! Inference is serialized: while one request is generating, others wait for
//! the inference lock. The configured timeout covers the wait for the lock
//! and the inference together, so a queued request falls back after at most
//! one timeout.

use super::prompt::{extract_reply, local_prompt};
use super::rule_based::RuleBasedBackend;
use super::{BackendInitError, BackendKind, GenerationBackend, GenerationError};
use crate::config::LocalModelConfig;
use crate::property::PropertyProfile;
use crate::request::ResidentRequest;
use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Probe timeout when checking that the runtime is up
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Raw text completion seam
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier reported by `/health`
    fn model_id(&self) -> &str;

    /// Complete the prompt, returning the raw generated text
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

/// HTTP client for a local completion runtime
#[derive(Debug, Clone)]
pub struct LocalRuntime {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

impl LocalRuntime {
    /// Connect to the runtime, probing `GET {base_url}/models`
    ///
    /// # Errors
    ///
    /// Returns `RuntimeUnavailable` if the runtime does not answer the probe
    /// with a success status.
    pub async fn connect(config: &LocalModelConfig) -> Result<Self, BackendInitError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(BackendInitError::HttpClient)?;

        // base_url already includes /v1
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let url = format!("{}/models", base_url);

        let response = client
            .get(&url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| BackendInitError::RuntimeUnavailable {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(BackendInitError::RuntimeUnavailable {
                url,
                reason: format!("probe returned HTTP {}", response.status()),
            });
        }

        tracing::info!(
            base_url = %base_url,
            model = %config.model,
            "Local model runtime is ready"
        );

        Ok(Self {
            client,
            base_url,
            model: config.model.clone(),
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
        })
    }
}

#[async_trait]
impl TextGenerator for LocalRuntime {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens: self.max_new_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
        };

        let response: CompletionResponse = self
            .client
            .post(format!("{}/completions", self.base_url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| GenerationError::MalformedPayload("completion has no choices".into()))
    }
}

/// Backend wrapping a local text generator
pub struct LocalModelBackend {
    generator: Box<dyn TextGenerator>,
    fallback: RuleBasedBackend,
    profile: Arc<PropertyProfile>,
    timeout: Duration,
    max_reply_chars: usize,
    inference: Mutex<()>,
}

impl LocalModelBackend {
    pub fn new(
        generator: Box<dyn TextGenerator>,
        profile: Arc<PropertyProfile>,
        timeout: Duration,
        max_reply_chars: usize,
    ) -> Self {
        Self {
            generator,
            fallback: RuleBasedBackend::new(Arc::clone(&profile)),
            profile,
            timeout,
            max_reply_chars,
            inference: Mutex::new(()),
        }
    }

    async fn try_generate(&self, request: &ResidentRequest) -> Result<String, GenerationError> {
        let prompt = local_prompt(&self.profile, request, Local::now().naive_local());

        let raw = tokio::time::timeout(self.timeout, async {
            let _guard = self.inference.lock().await;
            self.generator.generate(&prompt).await
        })
        .await
        .map_err(|_| GenerationError::Timeout(self.timeout))??;

        extract_reply(&raw, self.max_reply_chars)
            .ok_or_else(|| GenerationError::MalformedPayload("empty completion".to_string()))
    }
}

#[async_trait]
impl GenerationBackend for LocalModelBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalModel
    }

    fn model_id(&self) -> Option<&str> {
        Some(self.generator.model_id())
    }

    async fn generate_reply(&self, request: &ResidentRequest) -> String {
        match self.try_generate(request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    backend = %BackendKind::LocalModel,
                    model = %self.generator.model_id(),
                    unit = %request.unit_number(),
                    error_class = e.class(),
                    error = %e,
                    "Local model generation failed, using rule-based reply"
                );
                self.fallback.reply_for(request)
            }
        }
    }
}
