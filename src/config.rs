//! Configuration management for the concierge service
//!
//! Parses TOML configuration files, applies environment overrides and
//! provides typed access to settings.

use crate::backend::BackendKind;
use crate::error::{AppError, AppResult};
use crate::property::PropertyProfile;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for any backend timeout, in seconds
pub const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub property: PropertyProfile,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Generation backend flags and their companion settings
///
/// Several flags may be set at once; the selector resolves them with a fixed
/// precedence (file model, hosted, local model, rule based).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub file_model: FileModelConfig,
    #[serde(default)]
    pub hosted: HostedConfig,
    #[serde(default)]
    pub local_model: LocalModelConfig,
}

/// Quantized model artifact fetched by repository and filename
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileModelConfig {
    pub enabled: bool,
    pub repo_id: String,
    pub filename: String,
    /// Base URL of the model hub serving `{repo}/resolve/main/{file}`
    pub hub_url: String,
    pub cache_dir: PathBuf,
    /// Connect timeout for the artifact download
    pub connect_timeout_seconds: u64,
    /// Longest gap between body reads before the download is abandoned
    pub stall_timeout_seconds: u64,
    /// OpenAI-compatible runtime that serves the artifact
    pub runtime_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            repo_id: "HagalazAI/Elysia-Trismegistus-Mistral-7B-v02-GGUF".to_string(),
            filename: "Elysia-Trismegistus-Mistral-7B-v02-IQ3_M.gguf".to_string(),
            hub_url: "https://huggingface.co".to_string(),
            cache_dir: PathBuf::from("./models/cache"),
            connect_timeout_seconds: 10,
            stall_timeout_seconds: 60,
            runtime_url: "http://127.0.0.1:8080/v1".to_string(),
            max_tokens: 256,
            temperature: 0.7,
        }
    }
}

/// Hosted inference API
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HostedConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_url: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            model: None,
            api_url: "https://api-inference.huggingface.co".to_string(),
            max_new_tokens: 200,
            temperature: 0.7,
        }
    }
}

/// Locally running causal language model
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalModelConfig {
    pub enabled: bool,
    pub model: String,
    pub base_url: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    /// Replies are cut to this many characters
    pub max_reply_chars: usize,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "bigscience/bloom-560m".to_string(),
            base_url: "http://127.0.0.1:8080/v1".to_string(),
            max_new_tokens: 128,
            temperature: 0.7,
            top_p: 0.9,
            top_k: 50,
            max_reply_chars: 500,
        }
    }
}

/// Active request registry bounds
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub capacity: usize,
    pub ttl_seconds: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            ttl_seconds: 24 * 60 * 60,
        }
    }
}

impl RegistryConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const DEFAULT_HOSTED_TIMEOUT: u64 = 30;
const DEFAULT_LOCAL_MODEL_TIMEOUT: u64 = 60;
const DEFAULT_FILE_MODEL_TIMEOUT: u64 = 120;

/// Per-backend timeout overrides
///
/// Unset values fall back to 30 s (hosted), 60 s (local model) and
/// 120 s (file model).
///
/// # Custom Deserialization
///
/// `Deserialize` goes through the validated `new()` constructor, so values
/// outside (0, 300] seconds are rejected while the TOML is parsed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimeoutsConfig {
    hosted: Option<u64>,
    local_model: Option<u64>,
    file_model: Option<u64>,
}

impl TimeoutsConfig {
    /// Create a new TimeoutsConfig with validated timeout values
    ///
    /// # Errors
    ///
    /// Returns an error if any timeout is zero or exceeds 300 seconds.
    /// The upper bound also rejects extreme values like `u64::MAX`.
    pub fn new(
        hosted: Option<u64>,
        local_model: Option<u64>,
        file_model: Option<u64>,
    ) -> AppResult<Self> {
        for (name, timeout_opt) in [
            ("hosted", hosted),
            ("local_model", local_model),
            ("file_model", file_model),
        ] {
            if let Some(timeout) = timeout_opt {
                if timeout == 0 {
                    return Err(AppError::Config(format!(
                        "timeouts.{} must be greater than 0, got {}",
                        name, timeout
                    )));
                }
                if timeout > MAX_TIMEOUT_SECONDS {
                    return Err(AppError::Config(format!(
                        "timeouts.{} cannot exceed {} seconds, got {}",
                        name, MAX_TIMEOUT_SECONDS, timeout
                    )));
                }
            }
        }
        Ok(Self {
            hosted,
            local_model,
            file_model,
        })
    }

    pub fn hosted(&self) -> Option<u64> {
        self.hosted
    }

    pub fn local_model(&self) -> Option<u64> {
        self.local_model
    }

    pub fn file_model(&self) -> Option<u64> {
        self.file_model
    }
}

impl<'de> Deserialize<'de> for TimeoutsConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, MapAccess, Visitor};
        use std::fmt;

        #[derive(Deserialize)]
        #[serde(field_identifier, rename_all = "snake_case")]
        enum Field {
            Hosted,
            LocalModel,
            FileModel,
        }

        struct TimeoutsConfigVisitor;

        impl<'de> Visitor<'de> for TimeoutsConfigVisitor {
            type Value = TimeoutsConfig;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(
                    "a struct with optional timeout fields (hosted, local_model, file_model)",
                )
            }

            fn visit_map<V>(self, mut map: V) -> Result<TimeoutsConfig, V::Error>
            where
                V: MapAccess<'de>,
            {
                let mut hosted = None;
                let mut local_model = None;
                let mut file_model = None;

                while let Some(key) = map.next_key()? {
                    match key {
                        Field::Hosted => {
                            if hosted.is_some() {
                                return Err(de::Error::duplicate_field("hosted"));
                            }
                            hosted = Some(map.next_value()?);
                        }
                        Field::LocalModel => {
                            if local_model.is_some() {
                                return Err(de::Error::duplicate_field("local_model"));
                            }
                            local_model = Some(map.next_value()?);
                        }
                        Field::FileModel => {
                            if file_model.is_some() {
                                return Err(de::Error::duplicate_field("file_model"));
                            }
                            file_model = Some(map.next_value()?);
                        }
                    }
                }

                TimeoutsConfig::new(hosted, local_model, file_model)
                    .map_err(|e| de::Error::custom(format!("Invalid timeout configuration: {}", e)))
            }
        }

        deserializer.deserialize_struct(
            "TimeoutsConfig",
            &["hosted", "local_model", "file_model"],
            TimeoutsConfigVisitor,
        )
    }
}

/// Parse a boolean environment flag (`true/1/yes/on`, case-insensitive)
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Apply environment overrides from the process environment
    pub fn with_process_env(self) -> AppResult<Self> {
        self.with_env(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides using the given lookup
    ///
    /// Recognized variables:
    /// - `ELYSIA_USE_LLAMACPP`, `ELYSIA_LLAMACPP_REPO_ID`, `ELYSIA_LLAMACPP_FILENAME`
    /// - `ELYSIA_USE_HOSTED`, `ELYSIA_HOSTED_API_KEY`, `ELYSIA_HOSTED_MODEL`
    /// - `ELYSIA_USE_BLOOM` (local model on/off)
    /// - `PORT`
    ///
    /// The result is validated again.
    pub fn with_env<F>(mut self, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(flag) = lookup("ELYSIA_USE_LLAMACPP") {
            self.backend.file_model.enabled = parse_flag(&flag);
        }
        if let Some(repo_id) = lookup("ELYSIA_LLAMACPP_REPO_ID") {
            self.backend.file_model.repo_id = repo_id;
        }
        if let Some(filename) = lookup("ELYSIA_LLAMACPP_FILENAME") {
            self.backend.file_model.filename = filename;
        }
        if let Some(flag) = lookup("ELYSIA_USE_HOSTED") {
            self.backend.hosted.enabled = parse_flag(&flag);
        }
        if let Some(api_key) = lookup("ELYSIA_HOSTED_API_KEY") {
            self.backend.hosted.api_key = Some(api_key);
        }
        if let Some(model) = lookup("ELYSIA_HOSTED_MODEL") {
            self.backend.hosted.model = Some(model);
        }
        if let Some(flag) = lookup("ELYSIA_USE_BLOOM") {
            self.backend.local_model.enabled = parse_flag(&flag);
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| {
                AppError::Config(format!("PORT must be a valid port number, got '{}'", port))
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Get the timeout for a backend variant
    ///
    /// The rule-based backend never suspends and has no timeout of its own;
    /// it reports the local-model default for uniformity.
    pub fn timeout_for(&self, kind: BackendKind) -> Duration {
        let seconds = match kind {
            BackendKind::Hosted => self.timeouts.hosted().unwrap_or(DEFAULT_HOSTED_TIMEOUT),
            BackendKind::FileModel => self
                .timeouts
                .file_model()
                .unwrap_or(DEFAULT_FILE_MODEL_TIMEOUT),
            BackendKind::LocalModel | BackendKind::RuleBased => self
                .timeouts
                .local_model()
                .unwrap_or(DEFAULT_LOCAL_MODEL_TIMEOUT),
        };
        Duration::from_secs(seconds)
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()` and after environment overrides. Missing
    /// backend credentials are not a configuration error: the selector
    /// falls back to the next backend instead.
    pub fn validate(&self) -> AppResult<()> {
        let prefix = &self.property.id_prefix;
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::Config(format!(
                "property.id_prefix must be non-empty and ASCII alphanumeric, got '{}'",
                prefix
            )));
        }

        if self.registry.capacity == 0 {
            return Err(AppError::Config(
                "registry.capacity must be greater than 0".to_string(),
            ));
        }
        if self.registry.ttl_seconds == 0 {
            return Err(AppError::Config(
                "registry.ttl_seconds must be greater than 0".to_string(),
            ));
        }

        for (name, url) in [
            ("backend.file_model.hub_url", &self.backend.file_model.hub_url),
            (
                "backend.file_model.runtime_url",
                &self.backend.file_model.runtime_url,
            ),
            ("backend.hosted.api_url", &self.backend.hosted.api_url),
            ("backend.local_model.base_url", &self.backend.local_model.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::Config(format!(
                    "{} must start with 'http://' or 'https://', got '{}'",
                    name, url
                )));
            }
        }

        for (name, temperature) in [
            (
                "backend.file_model.temperature",
                self.backend.file_model.temperature,
            ),
            ("backend.hosted.temperature", self.backend.hosted.temperature),
            (
                "backend.local_model.temperature",
                self.backend.local_model.temperature,
            ),
        ] {
            if !temperature.is_finite() || !(0.0..=2.0).contains(&temperature) {
                return Err(AppError::Config(format!(
                    "{} must be a finite number between 0.0 and 2.0, got {}",
                    name, temperature
                )));
            }
        }

        for (name, tokens) in [
            ("backend.file_model.max_tokens", self.backend.file_model.max_tokens),
            (
                "backend.hosted.max_new_tokens",
                self.backend.hosted.max_new_tokens,
            ),
            (
                "backend.local_model.max_new_tokens",
                self.backend.local_model.max_new_tokens,
            ),
        ] {
            if tokens == 0 {
                return Err(AppError::Config(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        for (name, seconds) in [
            (
                "backend.file_model.connect_timeout_seconds",
                self.backend.file_model.connect_timeout_seconds,
            ),
            (
                "backend.file_model.stall_timeout_seconds",
                self.backend.file_model.stall_timeout_seconds,
            ),
        ] {
            if seconds == 0 {
                return Err(AppError::Config(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if self.backend.local_model.max_reply_chars == 0 {
            return Err(AppError::Config(
                "backend.local_model.max_reply_chars must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}
