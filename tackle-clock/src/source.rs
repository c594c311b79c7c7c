//! ## tackle-clock::source
//! **The clock capability set and the installable sources**

use std::time::Duration as StdDuration;

use crossbeam::channel::Receiver;

use crate::error::ClockError;
use crate::event::Callback;
use crate::frozen::FrozenTimeSource;
use crate::real::RealTimeSource;
use crate::timer::{Ticker, Timer};
use crate::{Duration, Instant};

/// Operations every time source provides.
pub trait TimeSource: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Blocks the calling thread for `d`. Non-positive durations return at once.
    fn sleep(&self, d: Duration);

    /// Channel receiving a single instant after `d`.
    fn after(&self, d: Duration) -> Receiver<Instant>;

    fn new_timer(&self, d: Duration) -> Timer;

    /// Timer that has not been armed; `stop` on it returns `false`.
    fn new_stopped_timer(&self) -> Timer;

    /// Timer running `f` after `d`.
    fn after_func(&self, d: Duration, f: Callback) -> Timer;

    /// Ticker with period `d`, which must be positive.
    fn try_new_ticker(&self, d: Duration) -> Result<Ticker, ClockError>;

    /// Ticker channel without a handle, or `None` if `d` is not positive.
    fn tick(&self, d: Duration) -> Option<Receiver<Instant>> {
        self.try_new_ticker(d).ok().map(Ticker::into_receiver)
    }

    /// Waits up to `timeout` (real time) until at least `count` events are
    /// pending at once.
    fn wait4scheduled(&self, count: usize, timeout: StdDuration) -> bool;
}

/// The source installed in a provider.
#[derive(Clone, Debug)]
pub enum Source {
    Real(RealTimeSource),
    Frozen(FrozenTimeSource),
}

impl Source {
    pub fn as_frozen(&self) -> Option<&FrozenTimeSource> {
        match self {
            Source::Frozen(frozen) => Some(frozen),
            Source::Real(_) => None,
        }
    }

    fn inner(&self) -> &dyn TimeSource {
        match self {
            Source::Real(real) => real,
            Source::Frozen(frozen) => frozen,
        }
    }
}

impl TimeSource for Source {
    fn now(&self) -> Instant {
        self.inner().now()
    }

    fn sleep(&self, d: Duration) {
        self.inner().sleep(d)
    }

    fn after(&self, d: Duration) -> Receiver<Instant> {
        self.inner().after(d)
    }

    fn new_timer(&self, d: Duration) -> Timer {
        self.inner().new_timer(d)
    }

    fn new_stopped_timer(&self) -> Timer {
        self.inner().new_stopped_timer()
    }

    fn after_func(&self, d: Duration, f: Callback) -> Timer {
        self.inner().after_func(d, f)
    }

    fn try_new_ticker(&self, d: Duration) -> Result<Ticker, ClockError> {
        self.inner().try_new_ticker(d)
    }

    fn tick(&self, d: Duration) -> Option<Receiver<Instant>> {
        self.inner().tick(d)
    }

    fn wait4scheduled(&self, count: usize, timeout: StdDuration) -> bool {
        self.inner().wait4scheduled(count, timeout)
    }
}
