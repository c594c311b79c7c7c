//! ## tackle-clock::frozen
//! **Frozen timeline: time moves only when `advance` is called**
//!
//! All firing happens synchronously on the thread calling `advance`. The
//! timeline jumps from event to event, releasing the state lock around every
//! delivery, so a callback may schedule, stop or reset timers and anything it
//! queues inside the advance window still fires during the same call.

use std::fmt;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::error::ClockError;
use crate::event::{Callback, Delivery, EventId};
use crate::queue::{deadline, EventQueue};
use crate::source::TimeSource;
use crate::timer::{Scheduler, Ticker, Timer};
use crate::{Duration, Instant};

struct FrozenState {
    now: Instant,
    queue: EventQueue,
}

struct FrozenInner {
    frozen_at: Instant,
    state: Mutex<FrozenState>,
}

impl Scheduler for FrozenInner {
    fn allocate(&self) -> EventId {
        self.state.lock().queue.allocate_id()
    }

    fn arm(&self, id: EventId, delay: Duration, interval: Duration, deliver: Delivery) -> bool {
        let mut state = self.state.lock();
        let target = deadline(state.now, delay.max(Duration::zero()));
        state.queue.insert(id, target, interval, deliver)
    }

    fn disarm(&self, id: EventId) -> bool {
        self.state.lock().queue.remove(id).is_some()
    }
}

/// Synthetic time source under full caller control.
#[derive(Clone)]
pub struct FrozenTimeSource {
    inner: Arc<FrozenInner>,
}

impl FrozenTimeSource {
    /// Starts a fresh timeline at `at` with nothing scheduled.
    pub fn new(at: Instant) -> Self {
        Self {
            inner: Arc::new(FrozenInner {
                frozen_at: at,
                state: Mutex::new(FrozenState {
                    now: at,
                    queue: EventQueue::new(),
                }),
            }),
        }
    }

    /// Instant the timeline started at.
    pub fn frozen_at(&self) -> Instant {
        self.inner.frozen_at
    }

    /// Number of timers and tickers currently pending.
    pub fn pending(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Moves the timeline forward by `d`, firing every event that falls due.
    ///
    /// Events fire at their own instant in `(target, creation)` order; the
    /// timeline then settles on `now + d`. Returns the total time elapsed since
    /// the timeline was frozen. A negative `d` is treated as zero.
    pub fn advance(&self, d: Duration) -> Duration {
        let d = if d < Duration::zero() {
            warn!(delta = %d, "negative advance ignored");
            Duration::zero()
        } else {
            d
        };
        let target = deadline(self.inner.state.lock().now, d);

        let mut fired = 0usize;
        loop {
            let firing = {
                let mut state = self.inner.state.lock();
                match state.queue.pop_due(target) {
                    Some(firing) => {
                        state.now = state.now.max(firing.at);
                        firing
                    }
                    None => break,
                }
            };
            trace!(id = firing.id.as_u64(), at = %firing.at, "firing");
            let at = firing.at;
            firing.fire(at);
            fired += 1;
        }

        let mut state = self.inner.state.lock();
        state.now = state.now.max(target);
        let elapsed = state.now - self.inner.frozen_at;
        debug!(
            delta = %d,
            fired,
            pending = state.queue.len(),
            "advanced frozen clock"
        );
        elapsed
    }

    /// Abandons every pending event. Threads sleeping on this timeline wake
    /// up without their deadline having passed.
    pub(crate) fn discard(&self) -> usize {
        self.inner.state.lock().queue.clear()
    }

    fn scheduler(&self) -> Arc<dyn Scheduler> {
        self.inner.clone()
    }
}

impl fmt::Debug for FrozenTimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("FrozenTimeSource")
            .field("frozen_at", &self.inner.frozen_at)
            .field("now", &state.now)
            .field("pending", &state.queue.len())
            .finish()
    }
}

impl TimeSource for FrozenTimeSource {
    fn now(&self) -> Instant {
        self.inner.state.lock().now
    }

    fn sleep(&self, d: Duration) {
        if d <= Duration::zero() {
            return;
        }
        // Disconnects instead of firing if the timeline is discarded.
        let _ = self.after(d).recv();
    }

    fn after(&self, d: Duration) -> Receiver<Instant> {
        Timer::start(self.scheduler(), d).c().clone()
    }

    fn new_timer(&self, d: Duration) -> Timer {
        Timer::start(self.scheduler(), d)
    }

    fn new_stopped_timer(&self) -> Timer {
        Timer::stopped(self.scheduler())
    }

    fn after_func(&self, d: Duration, f: Callback) -> Timer {
        Timer::with_callback(self.scheduler(), d, f)
    }

    fn try_new_ticker(&self, d: Duration) -> Result<Ticker, ClockError> {
        Ticker::start(self.scheduler(), d)
    }

    fn wait4scheduled(&self, count: usize, timeout: StdDuration) -> bool {
        let (waiter, rx) = {
            let mut state = self.inner.state.lock();
            if timeout.is_zero() {
                return state.queue.len() >= count;
            }
            match state.queue.register_waiter(count) {
                Some(registered) => registered,
                None => return true,
            }
        };
        if rx.recv_timeout(timeout).is_ok() {
            return true;
        }
        self.inner.state.lock().queue.cancel_waiter(waiter);
        // The count may have been reached between the timeout and the cancel.
        rx.try_recv().is_ok()
    }
}
