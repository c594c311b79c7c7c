//! Custom validation functions for configuration.

use tracing_subscriber::EnvFilter;
use validator::ValidationError;

/// A log filter must be non-blank and parse as `EnvFilter` directives, so a
/// typo is reported at load time instead of being dropped by the subscriber.
pub fn validate_log_filter(filter: &str) -> Result<(), ValidationError> {
    if filter.trim().is_empty() {
        return Err(ValidationError::new("empty_log_filter"));
    }
    EnvFilter::try_new(filter)
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_log_filter"))
}
