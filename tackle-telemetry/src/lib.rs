//! # Tackle Telemetry
//!
//! Log subscriber setup and Prometheus metrics for clock replays.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install log subscriber: {0}")]
    Subscriber(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("metrics output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
