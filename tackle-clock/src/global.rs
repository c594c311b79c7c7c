//! ## tackle-clock::global
//! **Process-wide clock for drop-in call sites**
//!
//! The global provider is created on first use with [`GuardMode::Locked`].
//! Binaries that want the lock-free slot call [`configure_global`] during
//! startup, before anything reads the clock. New code should prefer an
//! isolated provider from [`new_provider`].

use std::time::Duration as StdDuration;

use crossbeam::channel::Receiver;
use once_cell::sync::OnceCell;
use tracing::info;

use crate::error::ClockError;
use crate::provider::{ClockProvider, FreezeGuard, GuardMode, Unfreezer};
use crate::timer::{Ticker, Timer};
use crate::{Duration, Instant};

static GLOBAL: OnceCell<ClockProvider> = OnceCell::new();

/// Chooses the guard mode of the global provider.
///
/// Fails with [`ClockError::AlreadyInitialized`] once the global clock exists.
pub fn configure_global(mode: GuardMode) -> Result<(), ClockError> {
    GLOBAL
        .set(ClockProvider::with_guard(mode))
        .map_err(|_| ClockError::AlreadyInitialized)?;
    info!(?mode, "global clock configured");
    Ok(())
}

/// The global provider.
pub fn global() -> &'static ClockProvider {
    GLOBAL.get_or_init(ClockProvider::new)
}

/// A provider with a timeline of its own.
pub fn new_provider() -> ClockProvider {
    ClockProvider::new()
}

pub fn now() -> Instant {
    global().now()
}

pub fn since(t: Instant) -> Duration {
    global().since(t)
}

pub fn until(t: Instant) -> Duration {
    global().until(t)
}

pub fn sleep(d: Duration) {
    global().sleep(d)
}

pub fn after(d: Duration) -> Receiver<Instant> {
    global().after(d)
}

pub fn new_timer(d: Duration) -> Timer {
    global().new_timer(d)
}

pub fn new_stopped_timer() -> Timer {
    global().new_stopped_timer()
}

pub fn after_func<F>(d: Duration, f: F) -> Timer
where
    F: Fn() + Send + Sync + 'static,
{
    global().after_func(d, f)
}

/// # Panics
/// If `d` is not positive.
pub fn new_ticker(d: Duration) -> Ticker {
    global().new_ticker(d)
}

pub fn try_new_ticker(d: Duration) -> Result<Ticker, ClockError> {
    global().try_new_ticker(d)
}

pub fn tick(d: Duration) -> Option<Receiver<Instant>> {
    global().tick(d)
}

pub fn freeze(at: Instant) -> Unfreezer<'static> {
    global().freeze(at)
}

pub fn freeze_scoped(at: Instant) -> FreezeGuard<'static> {
    global().freeze_scoped(at)
}

pub fn unfreeze() {
    global().unfreeze()
}

pub fn is_frozen() -> bool {
    global().is_frozen()
}

/// # Panics
/// If the global clock is not frozen.
pub fn advance(d: Duration) -> Duration {
    global().advance(d)
}

pub fn try_advance(d: Duration) -> Result<Duration, ClockError> {
    global().try_advance(d)
}

pub fn wait4scheduled(count: usize, timeout: StdDuration) -> bool {
    global().wait4scheduled(count, timeout)
}
