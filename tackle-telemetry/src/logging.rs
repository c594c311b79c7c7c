//! ## tackle-telemetry::logging
//! **Structured logging with `tracing`**
//!
//! `RUST_LOG` wins over the configured filter when both are present.

use tracing::info_span;
use tracing_subscriber::{fmt, EnvFilter};

use crate::TelemetryError;

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber, falling back to `default_filter`.
    pub fn init(default_filter: &str) -> Result<(), TelemetryError> {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(default_filter)),
            )
            .with_thread_names(true)
            .try_init()
            .map_err(|e| TelemetryError::Subscriber(e.to_string()))
    }

    /// Records a fired timer of a replayed scenario.
    #[inline]
    pub fn log_firing(name: &str, elapsed_ms: i64) {
        let span = info_span!("clock_event", timer = name);
        let _entered = span.enter();
        tracing::info!(elapsed_ms, "timer fired");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_logging() {
        EventLogger::log_firing("heartbeat", 250);
        assert!(logs_contain("timer fired"));
        assert!(logs_contain("elapsed_ms=250"));
    }
}
