//! ## tackle-clock::timer
//! **Timer and ticker handles**
//!
//! Handles are source-agnostic: they talk to whichever source created them
//! through the [`Scheduler`] seam, so a handle created while frozen keeps
//! operating on that frozen timeline even after the provider unfreezes.

use std::fmt;
use std::sync::Arc;

use crossbeam::channel::{bounded, never, Receiver};

use crate::error::ClockError;
use crate::event::{Callback, Delivery, EventId};
use crate::{Duration, Instant};

/// Scheduling operations a time source offers to its handles.
pub(crate) trait Scheduler: Send + Sync {
    /// Reserves an id without queuing anything.
    fn allocate(&self) -> EventId;

    /// Queues `id` to fire `delay` from the source's now. Returns whether it
    /// was already pending.
    fn arm(&self, id: EventId, delay: Duration, interval: Duration, deliver: Delivery) -> bool;

    /// Removes `id` from the queue. Returns whether it was pending.
    fn disarm(&self, id: EventId) -> bool;
}

/// One-shot timer.
///
/// Dropping a `Timer` does not stop it.
pub struct Timer {
    id: EventId,
    scheduler: Arc<dyn Scheduler>,
    deliver: Delivery,
    c: Receiver<Instant>,
}

impl Timer {
    /// Creates a timer delivering to its channel after `d`.
    pub(crate) fn start(scheduler: Arc<dyn Scheduler>, d: Duration) -> Self {
        let timer = Self::stopped(scheduler);
        timer.reset(d);
        timer
    }

    /// Creates a timer that has not been armed.
    pub(crate) fn stopped(scheduler: Arc<dyn Scheduler>) -> Self {
        let (tx, c) = bounded(1);
        Self {
            id: scheduler.allocate(),
            scheduler,
            deliver: Delivery::Channel(tx),
            c,
        }
    }

    /// Creates a timer invoking `f` after `d`. Its channel never receives.
    pub(crate) fn with_callback(scheduler: Arc<dyn Scheduler>, d: Duration, f: Callback) -> Self {
        let timer = Self {
            id: scheduler.allocate(),
            scheduler,
            deliver: Delivery::Callback(f),
            c: never(),
        };
        timer.reset(d);
        timer
    }

    /// Channel receiving the fire instant.
    pub fn c(&self) -> &Receiver<Instant> {
        &self.c
    }

    /// Prevents the timer from firing. Returns `false` if it had already
    /// fired or been stopped.
    pub fn stop(&self) -> bool {
        self.scheduler.disarm(self.id)
    }

    /// Re-arms the timer to fire `d` from now. Returns whether it was still
    /// pending beforehand.
    pub fn reset(&self, d: Duration) -> bool {
        self.scheduler
            .arm(self.id, d, Duration::zero(), self.deliver.clone())
    }

    pub fn id(&self) -> EventId {
        self.id
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("deliver", &self.deliver)
            .finish()
    }
}

/// Repeating ticker.
///
/// A tick that arrives while the previous one is still unread is dropped.
pub struct Ticker {
    id: EventId,
    scheduler: Arc<dyn Scheduler>,
    deliver: Delivery,
    c: Receiver<Instant>,
}

impl Ticker {
    pub(crate) fn start(scheduler: Arc<dyn Scheduler>, d: Duration) -> Result<Self, ClockError> {
        check_interval(d)?;
        let (tx, c) = bounded(1);
        let ticker = Self {
            id: scheduler.allocate(),
            scheduler,
            deliver: Delivery::Channel(tx),
            c,
        };
        ticker.scheduler.arm(ticker.id, d, d, ticker.deliver.clone());
        Ok(ticker)
    }

    pub fn c(&self) -> &Receiver<Instant> {
        &self.c
    }

    /// Turns the ticker off. Returns whether it was running.
    pub fn stop(&self) -> bool {
        self.scheduler.disarm(self.id)
    }

    /// Changes the period to `d`; the next tick is `d` from now.
    ///
    /// # Panics
    /// If `d` is not positive.
    pub fn reset(&self, d: Duration) -> bool {
        match self.try_reset(d) {
            Ok(was_active) => was_active,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_reset(&self, d: Duration) -> Result<bool, ClockError> {
        check_interval(d)?;
        Ok(self.scheduler.arm(self.id, d, d, self.deliver.clone()))
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    /// Gives up the handle, keeping only the channel. The ticker can no longer be stopped.
    pub(crate) fn into_receiver(self) -> Receiver<Instant> {
        self.c
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticker").field("id", &self.id).finish()
    }
}

fn check_interval(d: Duration) -> Result<(), ClockError> {
    if d <= Duration::zero() {
        return Err(ClockError::NonPositiveInterval(d));
    }
    Ok(())
}
