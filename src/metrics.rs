//! Prometheus metrics collection for the concierge
//!
//! Tracks:
//! - Processed requests by request type and backend
//! - Escalations by priority
//! - Reply generation latency by backend
//! - Registry evictions
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use crate::backend::BackendKind;
use crate::request::{Priority, RequestType};
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector
///
/// Labels come from closed enums (`RequestType`, `Priority`, `BackendKind`),
/// so cardinality is bounded at compile time.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: CounterVec,
    escalations_total: CounterVec,
    generation_duration: HistogramVec,
    registry_evictions: IntCounter,
}

impl Metrics {
    /// Create a new Metrics instance registered with a fresh registry
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 7 request types x 4 backends
        let requests_total = CounterVec::new(
            Opts::new(
                "concierge_requests_total",
                "Total number of processed resident requests by request type and backend",
            ),
            &["request_type", "backend"],
        )?;

        let escalations_total = CounterVec::new(
            Opts::new(
                "concierge_escalations_total",
                "Total number of requests flagged for escalation by priority",
            ),
            &["priority"],
        )?;

        // Rule-based replies land in the sub-millisecond buckets, model
        // replies in the seconds range
        let generation_duration = HistogramVec::new(
            HistogramOpts::new(
                "concierge_generation_duration_ms",
                "Reply generation latency in milliseconds",
            )
            .buckets(vec![
                0.1, 1.0, 10.0, 100.0, 500.0, 1000.0, 5000.0, 30000.0, 120000.0,
            ]),
            &["backend"],
        )?;

        let registry_evictions = IntCounter::with_opts(Opts::new(
            "concierge_registry_evictions_total",
            "Total number of active request records evicted for capacity or age",
        ))?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(escalations_total.clone()))?;
        registry.register(Box::new(generation_duration.clone()))?;
        registry.register(Box::new(registry_evictions.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            escalations_total,
            generation_duration,
            registry_evictions,
        })
    }

    /// Record a processed request
    pub fn record_request(
        &self,
        request_type: RequestType,
        backend: BackendKind,
    ) -> Result<(), prometheus::Error> {
        self.requests_total
            .get_metric_with_label_values(&[request_type.as_str(), backend.as_str()])?
            .inc();
        Ok(())
    }

    /// Record an escalated request
    pub fn record_escalation(&self, priority: Priority) -> Result<(), prometheus::Error> {
        self.escalations_total
            .get_metric_with_label_values(&[priority.as_str()])?
            .inc();
        Ok(())
    }

    /// Record reply generation duration
    ///
    /// # Errors
    ///
    /// Rejects NaN, infinite and negative durations; they would corrupt the
    /// histogram percentiles.
    pub fn record_generation_duration(
        &self,
        backend: BackendKind,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite, got: {}",
                duration_ms
            )));
        }
        if duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be non-negative, got: {}",
                duration_ms
            )));
        }

        self.generation_duration
            .get_metric_with_label_values(&[backend.as_str()])?
            .observe(duration_ms);
        Ok(())
    }

    /// Record registry evictions
    pub fn record_evictions(&self, count: u64) {
        self.registry_evictions.inc_by(count);
    }

    /// Total evictions since startup
    pub fn evictions_count(&self) -> u64 {
        self.registry_evictions.get()
    }

    /// Gather all metrics and encode them in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    metric_family_count = metric_families.len(),
                    "Prometheus text encoder failed"
                );
                e
            })?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!(
                "Metrics output is not valid UTF-8 at byte {}",
                e.utf8_error().valid_up_to()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new_registers_families() {
        let metrics = Metrics::new().expect("Failed to create metrics");

        metrics
            .record_request(RequestType::Maintenance, BackendKind::RuleBased)
            .expect("Test operation should succeed");
        metrics
            .record_escalation(Priority::Urgent)
            .expect("Test operation should succeed");
        metrics
            .record_generation_duration(BackendKind::RuleBased, 0.2)
            .expect("Test operation should succeed");
        metrics.record_evictions(1);

        let names: Vec<String> = metrics
            .registry
            .gather()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names.len(), 4);
        assert!(names.contains(&"concierge_requests_total".to_string()));
        assert!(names.contains(&"concierge_escalations_total".to_string()));
        assert!(names.contains(&"concierge_generation_duration_ms".to_string()));
        assert!(names.contains(&"concierge_registry_evictions_total".to_string()));
    }

    #[test]
    fn test_record_request_labels() {
        let metrics = Metrics::new().expect("Failed to create test metrics");
        metrics
            .record_request(RequestType::AmenityBooking, BackendKind::Hosted)
            .expect("Test operation should succeed");

        let output = metrics.gather().expect("Failed to gather test metrics");
        assert!(output.contains("# TYPE concierge_requests_total counter"));
        assert!(output.contains("request_type=\"amenity_booking\""));
        assert!(output.contains("backend=\"hosted\""));
    }

    #[test]
    fn test_escalation_counter_by_priority() {
        let metrics = Metrics::new().expect("Failed to create test metrics");
        metrics.record_escalation(Priority::Emergency).unwrap();
        metrics.record_escalation(Priority::Emergency).unwrap();

        let output = metrics.gather().unwrap();
        assert!(output.contains("concierge_escalations_total{priority=\"emergency\"} 2"));
    }

    #[test]
    fn test_histogram_rejects_invalid_values() {
        let metrics = Metrics::new().expect("Failed to create test metrics");
        assert!(
            metrics
                .record_generation_duration(BackendKind::LocalModel, f64::NAN)
                .is_err()
        );
        assert!(
            metrics
                .record_generation_duration(BackendKind::LocalModel, f64::INFINITY)
                .is_err()
        );
        assert!(
            metrics
                .record_generation_duration(BackendKind::LocalModel, -1.0)
                .is_err()
        );
        assert!(
            metrics
                .record_generation_duration(BackendKind::LocalModel, 0.0)
                .is_ok()
        );
    }

    #[test]
    fn test_histogram_buckets_configured() {
        let metrics = Metrics::new().expect("Failed to create test metrics");
        metrics
            .record_generation_duration(BackendKind::FileModel, 2500.0)
            .unwrap();

        let output = metrics.gather().unwrap();
        assert!(output.contains("le=\"0.1\""));
        assert!(output.contains("le=\"5000\""));
        assert!(output.contains("le=\"+Inf\""));
    }

    #[test]
    fn test_evictions_accumulate() {
        let metrics = Metrics::new().unwrap();
        metrics.record_evictions(3);
        metrics.record_evictions(2);
        assert_eq!(metrics.evictions_count(), 5);
    }

    #[test]
    fn test_clones_share_registry() {
        let metrics = Metrics::new().unwrap();
        let cloned = metrics.clone();
        metrics
            .record_request(RequestType::Emergency, BackendKind::RuleBased)
            .unwrap();
        assert!(cloned.gather().unwrap().contains("concierge_requests_total"));
    }

    #[test]
    fn test_concurrent_recording_loses_no_updates() {
        use std::thread;

        let metrics = Arc::new(Metrics::new().unwrap());
        let handles: Vec<_> = (0..50)
            .map(|_| {
                let m = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..20 {
                        m.record_request(RequestType::Maintenance, BackendKind::RuleBased)
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("Thread should not panic");
        }

        let output = metrics.gather().unwrap();
        let line = output
            .lines()
            .find(|l| l.starts_with("concierge_requests_total{"))
            .expect("Should find requests_total sample");
        let value: u64 = line.split_whitespace().last().unwrap().parse().unwrap();
        assert_eq!(value, 1000);
    }
}
