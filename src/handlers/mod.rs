//! HTTP request handlers for the concierge API

use crate::backend::GenerationBackend;
use crate::concierge::Concierge;
use crate::config::Config;
use crate::error::AppError;
use crate::metrics::Metrics;
use std::sync::Arc;

pub mod extractor;
pub mod health;
pub mod info;
pub mod metrics;
pub mod request;
pub mod status;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    concierge: Arc<Concierge>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create the state around an already selected backend
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if metrics registration fails.
    pub fn new(config: Arc<Config>, backend: Arc<dyn GenerationBackend>) -> Result<Self, AppError> {
        let metrics = Arc::new(Metrics::new().map_err(|e| {
            AppError::Internal(format!("Failed to initialize metrics: {}", e))
        })?);
        let concierge = Arc::new(Concierge::new(
            backend,
            Arc::new(config.property.clone()),
            &config.registry,
            Arc::clone(&metrics),
        ));

        Ok(Self {
            config,
            concierge,
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn concierge(&self) -> &Concierge {
        &self.concierge
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
