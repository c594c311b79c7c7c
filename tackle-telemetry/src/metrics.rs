//! ## tackle-telemetry::metrics
//! **Prometheus counters for clock activity**

use prometheus::{IntCounter, IntGauge, Registry};

use crate::TelemetryError;

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: prometheus::Registry,
    pub events_fired: prometheus::IntCounter,
    pub advances: prometheus::IntCounter,
    pub pending_events: prometheus::IntGauge,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();
        let events_fired = IntCounter::new(
            "tackle_clock_events_fired_total",
            "Timers and ticks delivered on the frozen timeline",
        )?;
        let advances = IntCounter::new(
            "tackle_clock_advances_total",
            "Calls to advance the frozen clock",
        )?;
        let pending_events = IntGauge::new(
            "tackle_clock_pending_events",
            "Events still queued after the last advance",
        )?;

        registry.register(Box::new(events_fired.clone()))?;
        registry.register(Box::new(advances.clone()))?;
        registry.register(Box::new(pending_events.clone()))?;

        Ok(Self {
            registry,
            events_fired,
            advances,
            pending_events,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, TelemetryError> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn inc_events_fired(&self) {
        self.events_fired.inc();
    }

    pub fn record_advance(&self, pending: usize) {
        self.advances.inc();
        self.pending_events.set(pending as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposition_contains_clock_metrics() {
        let metrics = MetricsRecorder::new().unwrap();
        metrics.inc_events_fired();
        metrics.inc_events_fired();
        metrics.record_advance(3);

        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("tackle_clock_events_fired_total 2"));
        assert!(text.contains("tackle_clock_advances_total 1"));
        assert!(text.contains("tackle_clock_pending_events 3"));
    }
}
