//! File-backed model backend
//!
//! A quantized model artifact is resolved by repository and filename at
//! startup and cached on disk. Replies come from a chat-style completion
//! (system + user message) against the runtime serving that artifact.

use super::prompt::{system_prompt, user_message};
use super::{BackendInitError, BackendKind, GenerationBackend, GenerationError, apology};
use crate::config::FileModelConfig;
use crate::property::PropertyProfile;
use crate::request::ResidentRequest;
use async_trait::async_trait;
use chrono::Local;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Chat completion seam
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_id(&self) -> &str;

    /// Complete a system + user exchange, returning the assistant text
    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError>;
}

/// Chat model backed by an OpenAI-compatible runtime via open-agent-sdk
#[derive(Debug, Clone)]
pub struct AgentChatModel {
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
}

impl AgentChatModel {
    pub fn new(model: String, base_url: String, max_tokens: u32, temperature: f32) -> Self {
        Self {
            model,
            base_url,
            max_tokens,
            temperature,
        }
    }
}

#[async_trait]
impl ChatModel for AgentChatModel {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let options = open_agent::AgentOptions::builder()
            .system_prompt(system)
            .model(self.model.as_str())
            .base_url(self.base_url.as_str())
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build()
            .map_err(|e| GenerationError::Inference(format!("invalid agent options: {}", e)))?;

        let mut stream = open_agent::query(user, &options)
            .await
            .map_err(|e| GenerationError::Inference(e.to_string()))?;

        let mut text = String::new();
        while let Some(block) = stream.next().await {
            match block.map_err(|e| GenerationError::Inference(e.to_string()))? {
                open_agent::ContentBlock::Text(text_block) => text.push_str(&text_block.text),
                _ => {
                    tracing::debug!(model = %self.model, "Skipping non-text content block");
                }
            }
        }

        Ok(text)
    }
}

/// Model artifact addressed by repository and filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifact {
    url: String,
    path: PathBuf,
    connect_timeout: Duration,
    stall_timeout: Duration,
}

impl ModelArtifact {
    /// Resolve `{hub_url}/{repo_id}/resolve/main/{filename}` and its cache path
    ///
    /// # Errors
    ///
    /// Returns `MissingSetting` for a blank repository id, or a filename that
    /// is blank or contains a path separator.
    pub fn from_config(config: &FileModelConfig) -> Result<Self, BackendInitError> {
        let repo_id = config.repo_id.trim();
        let filename = config.filename.trim();

        if repo_id.is_empty() {
            return Err(BackendInitError::MissingSetting {
                backend: BackendKind::FileModel,
                setting: "a repository id",
            });
        }
        if filename.is_empty() || filename.contains(['/', '\\']) {
            return Err(BackendInitError::MissingSetting {
                backend: BackendKind::FileModel,
                setting: "a plain artifact filename",
            });
        }

        Ok(Self {
            url: format!(
                "{}/{}/resolve/main/{}",
                config.hub_url.trim_end_matches('/'),
                repo_id,
                filename
            ),
            path: config
                .cache_dir
                .join(repo_id.replace('/', "--"))
                .join(filename),
            connect_timeout: Duration::from_secs(config.connect_timeout_seconds),
            stall_timeout: Duration::from_secs(config.stall_timeout_seconds),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Artifact is present and non-empty in the cache
    pub fn is_cached(&self) -> bool {
        std::fs::metadata(&self.path)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }

    fn partial_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".part");
        self.path.with_file_name(name)
    }

    /// Download the artifact unless it is already cached
    ///
    /// Writes to a `.part` file first and renames on success; a failed
    /// download leaves nothing behind.
    pub async fn fetch(&self) -> Result<PathBuf, BackendInitError> {
        if self.is_cached() {
            tracing::info!(path = %self.path.display(), "Model artifact found in cache");
            return Ok(self.path.clone());
        }

        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| BackendInitError::Cache {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }

        tracing::info!(url = %self.url, "Downloading model artifact");

        let partial = self.partial_path();
        match self.download_to(&partial).await {
            Ok(size) => {
                tokio::fs::rename(&partial, &self.path)
                    .await
                    .map_err(|source| BackendInitError::Cache {
                        path: self.path.clone(),
                        source,
                    })?;
                tracing::info!(
                    path = %self.path.display(),
                    bytes = size,
                    "Model artifact downloaded"
                );
                Ok(self.path.clone())
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                Err(e)
            }
        }
    }

    /// Stream the artifact body into `dest`
    ///
    /// No total deadline: large artifacts take as long as they take. A hub
    /// that stops sending for longer than the stall timeout fails the
    /// download.
    async fn download_to(&self, dest: &Path) -> Result<u64, BackendInitError> {
        let download_error = |reason: String| BackendInitError::Download {
            url: self.url.clone(),
            reason,
        };
        let cache_error = |source: std::io::Error| BackendInitError::Cache {
            path: dest.to_path_buf(),
            source,
        };

        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.stall_timeout)
            .build()
            .map_err(BackendInitError::HttpClient)?;

        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(download_error(format!("HTTP {}", response.status())));
        }

        let mut file = tokio::fs::File::create(dest).await.map_err(cache_error)?;
        let mut body = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| download_error(format!("failed to read body: {}", e)))?;
            file.write_all(&chunk).await.map_err(cache_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(cache_error)?;

        if written == 0 {
            return Err(download_error("empty artifact".to_string()));
        }

        Ok(written)
    }
}

/// Backend completing through a chat model serving a cached artifact
pub struct FileModelBackend {
    chat: Box<dyn ChatModel>,
    profile: Arc<PropertyProfile>,
    timeout: Duration,
}

impl FileModelBackend {
    pub fn new(chat: Box<dyn ChatModel>, profile: Arc<PropertyProfile>, timeout: Duration) -> Self {
        Self {
            chat,
            profile,
            timeout,
        }
    }

    /// Resolve the artifact and connect the chat model
    ///
    /// One-time and potentially slow: the artifact is downloaded on first
    /// start.
    pub async fn initialize(
        config: &FileModelConfig,
        profile: Arc<PropertyProfile>,
        timeout: Duration,
    ) -> Result<Self, BackendInitError> {
        let artifact = ModelArtifact::from_config(config)?;
        let path = artifact.fetch().await?;

        tracing::info!(
            artifact = %path.display(),
            runtime_url = %config.runtime_url,
            "File model backend ready"
        );

        let chat = AgentChatModel::new(
            config.filename.trim().to_string(),
            config.runtime_url.clone(),
            config.max_tokens,
            config.temperature,
        );
        Ok(Self::new(Box::new(chat), profile, timeout))
    }

    async fn try_generate(&self, request: &ResidentRequest) -> Result<String, GenerationError> {
        let system = system_prompt(&self.profile, Local::now().naive_local());
        let user = user_message(request);

        let text = tokio::time::timeout(self.timeout, self.chat.complete(&system, &user))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))??;

        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::MalformedPayload(
                "empty completion".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl GenerationBackend for FileModelBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::FileModel
    }

    fn model_id(&self) -> Option<&str> {
        Some(self.chat.model_id())
    }

    async fn generate_reply(&self, request: &ResidentRequest) -> String {
        match self.try_generate(request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    backend = %BackendKind::FileModel,
                    model = %self.chat.model_id(),
                    unit = %request.unit_number(),
                    error_class = e.class(),
                    error = %e,
                    "File model completion failed, returning apology"
                );
                apology(&e, self.profile.management_phone())
            }
        }
    }
}
