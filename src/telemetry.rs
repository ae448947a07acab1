//! Telemetry and observability setup
//!
//! Configures structured logging with tracing and tracing-subscriber.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Filter directives used when RUST_LOG is not set
pub fn default_directives(level: &str) -> String {
    format!("concierge={},tower_http=debug", level)
}

/// Initialize tracing subscriber for structured logging
///
/// Only the first call per process has an effect.
///
/// RUST_LOG wins over the configured level.
///
/// # Examples
///
/// ```no_run
/// concierge::telemetry::init("info");
/// tracing::info!("Concierge starting");
/// ```
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(default_level)));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_scope_crate_and_http_layer() {
        let directives = default_directives("warn");
        assert_eq!(directives, "concierge=warn,tower_http=debug");
        // Must be accepted by the filter parser
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn test_init_is_idempotent() {
        init("debug");
        init("info");
    }
}
