//! Timer scenarios replayed on a frozen clock.
//!
//! ```yaml
//! epoch: 2009-02-19T00:00:00Z
//! timers:
//!   - { name: heartbeat, after_ms: 100, repeat_ms: 100 }
//!   - { name: flush, after_ms: 250 }
//! advances: [150, 200]
//! ```

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tackle_clock::{ClockError, ClockProvider, Duration, Timer};
use tackle_telemetry::logging::EventLogger;
use tackle_telemetry::metrics::MetricsRecorder;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub epoch: DateTime<Utc>,
    #[serde(default)]
    pub timers: Vec<TimerSpec>,
    #[serde(default)]
    pub advances: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSpec {
    pub name: String,
    pub after_ms: i64,
    /// Re-arm with this period after every firing.
    #[serde(default)]
    pub repeat_ms: Option<i64>,
}

/// One line of the firing log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredEvent {
    pub elapsed_ms: i64,
    pub name: String,
}

impl fmt::Display for FiredEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{}ms {}", self.elapsed_ms, self.name)
    }
}

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Deserialization error: {0}")]
    Serde(#[from] serde_yaml::Error),
    #[error("timer `{name}`: {source}")]
    Timer {
        name: String,
        #[source]
        source: ClockError,
    },
    #[error("timer `{name}`: {field} of {value}ms is out of range")]
    OutOfRange {
        name: String,
        field: &'static str,
        value: i64,
    },
    #[error("advance of {0}ms is out of range")]
    InvalidAdvance(u64),
    #[error("only {scheduled} of {expected} timers were scheduled")]
    NotScheduled { scheduled: usize, expected: usize },
}

pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Scenario, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(format!(
            "{} does not exist",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

type FiringLog = Arc<Mutex<Vec<FiredEvent>>>;

/// Freezes `clock` at the scenario epoch, schedules its timers, applies its
/// advances and returns what fired, in order. The clock is unfrozen afterwards.
pub fn replay(
    clock: &'static ClockProvider,
    scenario: &Scenario,
    wait_timeout: StdDuration,
    metrics: Option<&MetricsRecorder>,
) -> Result<Vec<FiredEvent>, ScenarioError> {
    let steps = scenario
        .advances
        .iter()
        .map(|&step| {
            i64::try_from(step)
                .ok()
                .and_then(Duration::try_milliseconds)
                .ok_or(ScenarioError::InvalidAdvance(step))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let _frozen = clock.freeze_scoped(scenario.epoch);
    let log = FiringLog::default();

    let mut handles = Vec::with_capacity(scenario.timers.len());
    for spec in &scenario.timers {
        handles.push(schedule(clock, scenario.epoch, spec, &log, metrics)?);
    }

    let expected = scenario.timers.len();
    if !clock.wait4scheduled(expected, wait_timeout) {
        return Err(ScenarioError::NotScheduled {
            scheduled: pending(clock),
            expected,
        });
    }

    for step in steps {
        let elapsed = clock.advance(step);
        debug!(
            step_ms = step.num_milliseconds(),
            elapsed_ms = elapsed.num_milliseconds(),
            "advanced"
        );
        if let Some(metrics) = metrics {
            metrics.record_advance(pending(clock));
        }
    }

    drop(handles);
    let fired = log.lock().clone();
    Ok(fired)
}

fn pending(clock: &ClockProvider) -> usize {
    clock.source().as_frozen().map_or(0, |f| f.pending())
}

/// Arms one scenario timer. A repeating timer re-arms itself from its own
/// callback, so every period is logged in firing order.
fn schedule(
    clock: &'static ClockProvider,
    epoch: DateTime<Utc>,
    spec: &TimerSpec,
    log: &FiringLog,
    metrics: Option<&MetricsRecorder>,
) -> Result<Arc<OnceCell<Timer>>, ScenarioError> {
    let after = millis(spec, "after_ms", spec.after_ms)?;
    let repeat = match spec
        .repeat_ms
        .map(|ms| millis(spec, "repeat_ms", ms))
        .transpose()?
    {
        Some(period) if period <= Duration::zero() => {
            return Err(ScenarioError::Timer {
                name: spec.name.clone(),
                source: ClockError::NonPositiveInterval(period),
            })
        }
        other => other,
    };

    let cell: Arc<OnceCell<Timer>> = Arc::new(OnceCell::new());
    let this: Weak<OnceCell<Timer>> = Arc::downgrade(&cell);
    let name = spec.name.clone();
    let log = Arc::clone(log);
    let metrics = metrics.cloned();

    let timer = clock.after_func(after, move || {
        let elapsed_ms = (clock.now() - epoch).num_milliseconds();
        EventLogger::log_firing(&name, elapsed_ms);
        log.lock().push(FiredEvent {
            elapsed_ms,
            name: name.clone(),
        });
        if let Some(metrics) = &metrics {
            metrics.inc_events_fired();
        }
        if let (Some(period), Some(cell)) = (repeat, this.upgrade()) {
            if let Some(timer) = cell.get() {
                timer.reset(period);
            }
        }
    });
    let _ = cell.set(timer);
    Ok(cell)
}

fn millis(spec: &TimerSpec, field: &'static str, value: i64) -> Result<Duration, ScenarioError> {
    Duration::try_milliseconds(value).ok_or_else(|| ScenarioError::OutOfRange {
        name: spec.name.clone(),
        field,
        value,
    })
}
