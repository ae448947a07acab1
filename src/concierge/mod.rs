//! Concierge orchestrator
//!
//! Turns one [`ResidentRequest`] into one [`ConciergeResponse`]: allocates a
//! request identifier, runs classification and reply generation
//! concurrently, assembles the response and registers the active record.

pub mod registry;

use crate::backend::{BackendKind, GenerationBackend};
use crate::config::RegistryConfig;
use crate::metrics::Metrics;
use crate::policy;
use crate::property::PropertyProfile;
use crate::request::{ConciergeResponse, RequestType, ResidentRequest};
use chrono::{Local, NaiveDateTime, Utc};
use registry::{ActiveRequestRecord, Registry, RequestStatus};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Maintenance work order reference, `MAINT-<YYYYMMDDHHMM>`
pub fn work_order_id(now: NaiveDateTime) -> String {
    format!("MAINT-{}", now.format("%Y%m%d%H%M"))
}

/// Status view of an active request
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub request_id: String,
    pub status: RequestStatus,
    pub request_type: RequestType,
    pub unit_number: String,
    pub last_update: String,
    pub estimated_completion: String,
    pub escalation_required: bool,
    pub follow_up_needed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_order: Option<String>,
}

impl StatusReport {
    fn from_record(request_id: &str, record: &ActiveRequestRecord) -> Self {
        Self {
            request_id: request_id.to_string(),
            status: record.status,
            request_type: record.request.request_type(),
            unit_number: record.request.unit_number().to_string(),
            last_update: record.processed_at.to_rfc3339(),
            estimated_completion: record.response.estimated_resolution_time().to_string(),
            escalation_required: record.response.escalation_required(),
            follow_up_needed: record.response.follow_up_needed(),
            work_order: record.work_order.clone(),
        }
    }
}

/// Request orchestrator holding the selected backend and the registry
pub struct Concierge {
    backend: Arc<dyn GenerationBackend>,
    profile: Arc<PropertyProfile>,
    registry: Mutex<Registry>,
    metrics: Arc<Metrics>,
}

impl Concierge {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        profile: Arc<PropertyProfile>,
        registry_config: &RegistryConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        let registry = Registry::new(
            profile.id_prefix.clone(),
            registry_config.capacity,
            registry_config.ttl(),
        );
        Self {
            backend,
            profile,
            registry: Mutex::new(registry),
            metrics,
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn model_id(&self) -> Option<&str> {
        self.backend.model_id()
    }

    pub fn profile(&self) -> &PropertyProfile {
        &self.profile
    }

    /// Number of live records
    pub async fn registry_size(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Process a validated request
    ///
    /// Never fails: backends degrade internally.
    pub async fn process_request(&self, request: ResidentRequest) -> ConciergeResponse {
        // Read the clock under the lock so ids follow lock order
        let (request_id, now) = {
            let mut registry = self.registry.lock().await;
            let now = Local::now();
            (registry.next_id(now.date_naive()), now)
        };
        let backend_kind = self.backend.kind();

        tracing::info!(
            request_id = %request_id,
            unit = %request.unit_number(),
            request_type = %request.request_type(),
            priority = %request.priority(),
            backend = %backend_kind,
            "Processing resident request"
        );

        let (classification, (reply, generation_ms)) = tokio::join!(
            async { policy::classify(request.request_type(), request.priority()) },
            async {
                let started = Instant::now();
                let reply = self.backend.generate_reply(&request).await;
                (reply, started.elapsed().as_secs_f64() * 1000.0)
            }
        );

        let work_order = (request.request_type() == RequestType::Maintenance).then(|| {
            let id = work_order_id(now.naive_local());
            tracing::info!(
                request_id = %request_id,
                work_order = %id,
                unit = %request.unit_number(),
                "Maintenance work order opened"
            );
            id
        });

        let response = ConciergeResponse::new(
            reply,
            request_id.clone(),
            classification.estimate.to_string(),
            classification.follow_up,
            classification.escalate,
        );

        if classification.escalate {
            tracing::warn!(
                request_id = %request_id,
                unit = %request.unit_number(),
                priority = %request.priority(),
                "Request flagged for escalation"
            );
        }

        self.record_metrics(&request, backend_kind, generation_ms, classification.escalate);

        let record = ActiveRequestRecord {
            request,
            response: response.clone(),
            processed_at: Utc::now(),
            status: RequestStatus::Active,
            work_order,
        };
        let removed = self
            .registry
            .lock()
            .await
            .insert(request_id.clone(), record, Instant::now());
        if removed > 0 {
            self.metrics.record_evictions(removed);
        }

        tracing::debug!(
            request_id = %request_id,
            generation_ms,
            follow_up = classification.follow_up,
            escalate = classification.escalate,
            "Request registered"
        );

        response
    }

    /// Look up the status of an active request
    pub async fn status(&self, request_id: &str) -> Option<StatusReport> {
        let (record, removed) = self.registry.lock().await.get(request_id, Instant::now());
        if removed > 0 {
            self.metrics.record_evictions(removed);
        }
        record.map(|r| StatusReport::from_record(request_id, &r))
    }

    fn record_metrics(
        &self,
        request: &ResidentRequest,
        backend: BackendKind,
        generation_ms: f64,
        escalate: bool,
    ) {
        // Metrics failures never fail the request
        if let Err(e) = self.metrics.record_request(request.request_type(), backend) {
            tracing::warn!(error = %e, "Failed to record request metric");
        }
        if let Err(e) = self.metrics.record_generation_duration(backend, generation_ms) {
            tracing::warn!(error = %e, generation_ms, "Failed to record generation duration");
        }
        if escalate {
            if let Err(e) = self.metrics.record_escalation(request.priority()) {
                tracing::warn!(error = %e, "Failed to record escalation metric");
            }
        }
    }
}
