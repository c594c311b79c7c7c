//! ## tackle-clock::real
//! **Pass-through to the operating system clock**
//!
//! `now` is the wall time observed when the source was first used, moved
//! forward by a monotonic `std::time::Instant`, so it never steps backwards.
//! Timers and tickers are driven by one background thread shared by the
//! whole process; callbacks get a thread of their own so user code never
//! stalls the driver.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration as StdDuration, Instant as MonotonicInstant};

use chrono::Utc;
use crossbeam::channel::Receiver;
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, error, trace};

use crate::error::ClockError;
use crate::event::{Callback, Delivery, EventId, Firing};
use crate::queue::{deadline, EventQueue};
use crate::source::TimeSource;
use crate::timer::{Scheduler, Ticker, Timer};
use crate::{Duration, Instant};

const DRIVER_THREAD_NAME: &str = "tackle-clock-timer";

static SYSTEM: Lazy<RealTimeSource> = Lazy::new(|| RealTimeSource {
    inner: Arc::new(RealInner {
        origin_wall: Utc::now(),
        origin: MonotonicInstant::now(),
        state: Mutex::new(RealState {
            queue: EventQueue::new(),
            driver_running: false,
        }),
        wakeup: Condvar::new(),
    }),
});

struct RealState {
    queue: EventQueue,
    driver_running: bool,
}

struct RealInner {
    origin_wall: Instant,
    origin: MonotonicInstant,
    state: Mutex<RealState>,
    wakeup: Condvar,
}

impl RealInner {
    fn now(&self) -> Instant {
        let elapsed = Duration::from_std(self.origin.elapsed()).unwrap_or(Duration::zero());
        self.origin_wall + elapsed
    }

    fn ensure_driver(self: &Arc<Self>, state: &mut MutexGuard<'_, RealState>) {
        if state.driver_running {
            return;
        }
        let inner = Arc::clone(self);
        match thread::Builder::new()
            .name(DRIVER_THREAD_NAME.into())
            .spawn(move || inner.drive())
        {
            Ok(_) => {
                state.driver_running = true;
                debug!("real-time timer driver started");
            }
            Err(e) => error!(error = %e, "failed to spawn real-time timer driver"),
        }
    }

    fn drive(&self) {
        let mut state = self.state.lock();
        loop {
            let now = self.now();
            if let Some(firing) = state.queue.pop_due(now) {
                MutexGuard::unlocked(&mut state, || deliver(firing, now));
                continue;
            }
            match state.queue.next_deadline() {
                Some(deadline) => {
                    let wait = (deadline - now).to_std().unwrap_or(StdDuration::ZERO);
                    self.wakeup.wait_for(&mut state, wait);
                }
                None => self.wakeup.wait(&mut state),
            }
        }
    }
}

fn deliver(firing: Firing, now: Instant) {
    trace!(id = firing.id.as_u64(), at = %now, "firing");
    if !matches!(firing.deliver, Delivery::Callback(_)) {
        firing.fire(now);
        return;
    }
    let spawned = thread::Builder::new().spawn(move || firing.fire(now));
    if let Err(e) = spawned {
        error!(error = %e, "failed to spawn timer callback thread");
    }
}

/// An `Arc<RealInner>` that wakes the driver whenever the queue changes.
struct RealScheduler(Arc<RealInner>);

impl Scheduler for RealScheduler {
    fn allocate(&self) -> EventId {
        self.0.state.lock().queue.allocate_id()
    }

    fn arm(&self, id: EventId, delay: Duration, interval: Duration, deliver: Delivery) -> bool {
        let mut state = self.0.state.lock();
        self.0.ensure_driver(&mut state);
        let target = deadline(self.0.now(), delay.max(Duration::zero()));
        let was_active = state.queue.insert(id, target, interval, deliver);
        self.0.wakeup.notify_one();
        was_active
    }

    fn disarm(&self, id: EventId) -> bool {
        let was_active = self.0.state.lock().queue.remove(id).is_some();
        self.0.wakeup.notify_one();
        was_active
    }
}

/// The operating system clock.
#[derive(Clone)]
pub struct RealTimeSource {
    inner: Arc<RealInner>,
}

impl RealTimeSource {
    /// The process-wide real-time source.
    pub fn system() -> Self {
        SYSTEM.clone()
    }

    /// Number of real-time timers and tickers pending across the process.
    pub fn pending(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    fn scheduler(&self) -> Arc<dyn Scheduler> {
        Arc::new(RealScheduler(Arc::clone(&self.inner)))
    }
}

impl Default for RealTimeSource {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for RealTimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealTimeSource")
            .field("origin", &self.inner.origin_wall)
            .finish()
    }
}

impl TimeSource for RealTimeSource {
    fn now(&self) -> Instant {
        self.inner.now()
    }

    fn sleep(&self, d: Duration) {
        if let Ok(d) = d.to_std() {
            thread::sleep(d);
        }
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
