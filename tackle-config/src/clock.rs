//! Clock engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tackle_clock::GuardMode;
use validator::{self, Validate};

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ClockConfig {
    /// How the global provider guards its source swap.
    #[serde(default)]
    pub guard: GuardMode,

    /// Real-time limit for `wait4scheduled` (milliseconds).
    #[serde(default = "default_wait_timeout_ms")]
    #[validate(range(min = 1, max = 600_000))]
    pub wait_timeout_ms: u64,
}

fn default_wait_timeout_ms() -> u64 {
    1000
}

impl ClockConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            guard: GuardMode::default(),
            wait_timeout_ms: default_wait_timeout_ms(),
        }
    }
}
