//! ## tackle-clock::event
//! **Scheduled events and their delivery targets**
//!
//! A scheduled event is one pending firing of a timer or ticker. The handle
//! that owns it keeps the `EventId` stable across stop/reset cycles, while the
//! `sequence` is reassigned on every insertion into the queue.

use std::fmt;
use std::sync::Arc;

use crossbeam::channel::Sender;

use crate::{Duration, Instant};

/// Callback invoked when an `after_func` timer fires.
pub type Callback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Stable identifier of a timer or ticker within one time source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

impl EventId {
    #[inline]
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Where a firing goes.
#[derive(Clone)]
pub(crate) enum Delivery {
    /// Push onto a capacity-1 channel; dropped if the previous value is unconsumed.
    Channel(Sender<Instant>),
    Callback(Callback),
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delivery::Channel(_) => f.write_str("Channel"),
            Delivery::Callback(_) => f.write_str("Callback"),
        }
    }
}

/// One pending firing.
#[derive(Debug, Clone)]
pub(crate) struct ScheduledEvent {
    pub id: EventId,
    pub target: Instant,
    pub sequence: u64,
    /// Zero for one-shot timers.
    pub interval: Duration,
    pub deliver: Delivery,
}

impl ScheduledEvent {
    #[inline]
    pub fn is_ticker(&self) -> bool {
        self.interval > Duration::zero()
    }
}

/// An event taken off the queue, ready to be delivered outside the lock.
#[derive(Debug)]
pub(crate) struct Firing {
    pub id: EventId,
    pub at: Instant,
    pub deliver: Delivery,
}

impl Firing {
    /// Delivers on the calling thread.
    pub fn fire(self, at: Instant) {
        match self.deliver {
            Delivery::Channel(tx) => {
                // A full slot means the consumer has not caught up; the tick is dropped.
                let _ = tx.try_send(at);
            }
            Delivery::Callback(f) => f(),
        }
    }
}
