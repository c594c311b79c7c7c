//! ## tackle-clock::provider
//! **Swappable holder of the active time source**
//!
//! A provider starts on the real-time source. `freeze` installs a fresh frozen
//! timeline and `unfreeze` goes back to real time, abandoning whatever the
//! frozen timeline still had pending. Every other operation is dispatched to
//! the installed source.
//!
//! ### Guard modes
//! - `Locked`: the source slot sits behind a `parking_lot::RwLock`.
//! - `LockFree`: the slot is an `ArcSwap`, readers never block.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use arc_swap::ArcSwap;
use crossbeam::channel::Receiver;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ClockError;
use crate::event::Callback;
use crate::frozen::FrozenTimeSource;
use crate::real::RealTimeSource;
use crate::source::{Source, TimeSource};
use crate::timer::{Ticker, Timer};
use crate::{Duration, Instant};

/// How a provider protects the swap of its active source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardMode {
    #[default]
    Locked,
    LockFree,
}

enum SourceSlot {
    Locked(RwLock<Arc<Source>>),
    LockFree(ArcSwap<Source>),
}

impl SourceSlot {
    fn new(mode: GuardMode, source: Source) -> Self {
        match mode {
            GuardMode::Locked => SourceSlot::Locked(RwLock::new(Arc::new(source))),
            GuardMode::LockFree => SourceSlot::LockFree(ArcSwap::from_pointee(source)),
        }
    }

    fn load(&self) -> Arc<Source> {
        match self {
            SourceSlot::Locked(lock) => Arc::clone(&lock.read()),
            SourceSlot::LockFree(swap) => swap.load_full(),
        }
    }

    fn swap(&self, source: Source) -> Arc<Source> {
        match self {
            SourceSlot::Locked(lock) => std::mem::replace(&mut *lock.write(), Arc::new(source)),
            SourceSlot::LockFree(swap) => swap.swap(Arc::new(source)),
        }
    }

    fn mode(&self) -> GuardMode {
        match self {
            SourceSlot::Locked(_) => GuardMode::Locked,
            SourceSlot::LockFree(_) => GuardMode::LockFree,
        }
    }
}

/// A clock whose source can be frozen, advanced and unfrozen.
///
/// Independent providers do not share timelines; freezing one leaves every
/// other provider, including the global one, untouched.
pub struct ClockProvider {
    slot: SourceSlot,
}

impl ClockProvider {
    /// Real-time provider guarded by a read-write lock.
    pub fn new() -> Self {
        Self::with_guard(GuardMode::Locked)
    }

    pub fn with_guard(mode: GuardMode) -> Self {
        Self {
            slot: SourceSlot::new(mode, Source::Real(RealTimeSource::system())),
        }
    }

    pub fn guard_mode(&self) -> GuardMode {
        self.slot.mode()
    }

    /// The currently installed source.
    pub fn source(&self) -> Arc<Source> {
        self.slot.load()
    }

    pub fn is_frozen(&self) -> bool {
        self.source().as_frozen().is_some()
    }

    /// Starts a new frozen timeline at `at`.
    ///
    /// Freezing an already frozen provider discards the previous timeline
    /// together with its pending events.
    pub fn freeze(&self, at: Instant) -> Unfreezer<'_> {
        let previous = self.slot.swap(Source::Frozen(FrozenTimeSource::new(at)));
        if let Some(frozen) = previous.as_frozen() {
            let discarded = frozen.discard();
            if discarded > 0 {
                warn!(discarded, "refreezing discarded pending events");
            }
        }
        debug!(at = %at, "clock frozen");
        Unfreezer { provider: self }
    }

    /// Like [`freeze`](Self::freeze), but unfreezes when the guard is dropped.
    pub fn freeze_scoped(&self, at: Instant) -> FreezeGuard<'_> {
        self.freeze(at);
        FreezeGuard { provider: self }
    }

    /// Returns to real time. Events pending on the frozen timeline never fire.
    pub fn unfreeze(&self) {
        let previous = self.slot.swap(Source::Real(RealTimeSource::system()));
        if let Some(frozen) = previous.as_frozen() {
            let discarded = frozen.discard();
            debug!(discarded, "clock unfrozen");
        }
    }

    /// Moves the frozen timeline forward by `d`.
    ///
    /// # Panics
    /// If the provider is not frozen.
    pub fn advance(&self, d: Duration) -> Duration {
        match self.try_advance(d) {
            Ok(elapsed) => elapsed,
            Err(e) => panic!("{e}"),
        }
    }

    /// Moves the frozen timeline forward by `d`, returning the time elapsed
    /// since the freeze.
    pub fn try_advance(&self, d: Duration) -> Result<Duration, ClockError> {
        let source = self.source();
        let frozen = source.as_frozen().ok_or(ClockError::NotFrozen)?;
        Ok(frozen.advance(d))
    }

    pub fn now(&self) -> Instant {
        self.source().now()
    }

    pub fn since(&self, t: Instant) -> Duration {
        self.now() - t
    }

    pub fn until(&self, t: Instant) -> Duration {
        t - self.now()
    }

    pub fn sleep(&self, d: Duration) {
        // The source is cloned out of the slot so a concurrent freeze is not blocked.
        self.source().sleep(d)
    }

    pub fn after(&self, d: Duration) -> Receiver<Instant> {
        self.source().after(d)
    }

    pub fn new_timer(&self, d: Duration) -> Timer {
        self.source().new_timer(d)
    }

    pub fn new_stopped_timer(&self) -> Timer {
        self.source().new_stopped_timer()
    }

    pub fn after_func<F>(&self, d: Duration, f: F) -> Timer
    where
        F: Fn() + Send + Sync + 'static,
    {
        let f: Callback = Arc::new(f);
        self.source().after_func(d, f)
    }

    /// # Panics
    /// If `d` is not positive.
    pub fn new_ticker(&self, d: Duration) -> Ticker {
        match self.try_new_ticker(d) {
            Ok(ticker) => ticker,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_new_ticker(&self, d: Duration) -> Result<Ticker, ClockError> {
        self.source().try_new_ticker(d)
    }

    /// Ticker channel with no way to stop it, or `None` for a non-positive `d`.
    pub fn tick(&self, d: Duration) -> Option<Receiver<Instant>> {
        self.source().tick(d)
    }

    /// Waits up to `timeout` of real time for `count` events to be pending.
    pub fn wait4scheduled(&self, count: usize, timeout: StdDuration) -> bool {
        self.source().wait4scheduled(count, timeout)
    }
}

impl Default for ClockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockProvider")
            .field("guard", &self.guard_mode())
            .field("source", &self.source())
            .finish()
    }
}

/// Returned by `freeze` so setup and teardown can be chained.
#[derive(Debug)]
pub struct Unfreezer<'a> {
    provider: &'a ClockProvider,
}

impl Unfreezer<'_> {
    pub fn unfreeze(self) {
        self.provider.unfreeze();
    }
}

/// Unfreezes its provider on drop.
#[derive(Debug)]
#[must_use = "the clock unfreezes as soon as the guard is dropped"]
pub struct FreezeGuard<'a> {
    provider: &'a ClockProvider,
}

impl Drop for FreezeGuard<'_> {
    fn drop(&mut self) {
        self.provider.unfreeze();
    }
}
