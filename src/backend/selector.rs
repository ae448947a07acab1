//! Startup backend selection
//!
//! Walks [`BackendKind::PRECEDENCE`] and returns the first enabled backend
//! that initializes. A failed initialization is logged and the next variant
//! is tried; the rule-based backend ends the chain and cannot fail.

use super::{
    BackendInitError, BackendKind, FileModelBackend, GenerationBackend, HostedApiBackend,
    LocalModelBackend, LocalRuntime, RuleBasedBackend,
};
use crate::config::Config;
use crate::property::PropertyProfile;
use std::sync::Arc;

/// Whether the configuration enables a variant
pub fn is_enabled(config: &Config, kind: BackendKind) -> bool {
    match kind {
        BackendKind::FileModel => config.backend.file_model.enabled,
        BackendKind::Hosted => config.backend.hosted.enabled,
        BackendKind::LocalModel => config.backend.local_model.enabled,
        BackendKind::RuleBased => true,
    }
}

async fn initialize(
    kind: BackendKind,
    config: &Config,
    profile: &Arc<PropertyProfile>,
) -> Result<Arc<dyn GenerationBackend>, BackendInitError> {
    let timeout = config.timeout_for(kind);
    let backend: Arc<dyn GenerationBackend> = match kind {
        BackendKind::FileModel => Arc::new(
            FileModelBackend::initialize(
                &config.backend.file_model,
                Arc::clone(profile),
                timeout,
            )
            .await?,
        ),
        BackendKind::Hosted => Arc::new(HostedApiBackend::from_config(
            &config.backend.hosted,
            Arc::clone(profile),
            timeout,
        )?),
        BackendKind::LocalModel => {
            let runtime = LocalRuntime::connect(&config.backend.local_model).await?;
            Arc::new(LocalModelBackend::new(
                Box::new(runtime),
                Arc::clone(profile),
                timeout,
                config.backend.local_model.max_reply_chars,
            ))
        }
        BackendKind::RuleBased => Arc::new(RuleBasedBackend::new(Arc::clone(profile))),
    };
    Ok(backend)
}

/// Select and initialize exactly one backend
pub async fn select_backend(config: &Config) -> Arc<dyn GenerationBackend> {
    let profile = Arc::new(config.property.clone());

    for kind in BackendKind::PRECEDENCE {
        if !is_enabled(config, kind) {
            tracing::debug!(backend = %kind, "Backend not enabled, skipping");
            continue;
        }

        match initialize(kind, config, &profile).await {
            Ok(backend) => {
                tracing::info!(
                    backend = %kind,
                    model = backend.model_id().unwrap_or("none"),
                    "Generation backend selected"
                );
                return backend;
            }
            Err(e) => {
                tracing::warn!(
                    backend = %kind,
                    error = %e,
                    "Backend failed to initialize, trying next in precedence order"
                );
            }
        }
    }

    // Unreachable in practice: RuleBased is always enabled and infallible
    Arc::new(RuleBasedBackend::new(profile))
}
