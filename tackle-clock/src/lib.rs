//! # tackle-clock
//!
//! Deterministic virtual clock: a drop-in replacement for wall-clock and
//! timer primitives that lets tests freeze, advance and inspect time without
//! waiting on the real clock.
//!
//! ### Key Submodules:
//! - `queue`: pending timers/tickers ordered by `(instant, creation)`
//! - `frozen`: synthetic timeline driven by `advance`
//! - `real`: operating system clock with a background timer driver
//! - `timer`: `Timer` and `Ticker` handles
//! - `provider`: swappable holder of the active source
//! - `global`: process-wide provider and free-function API
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use tackle_clock::{ClockProvider, Duration};
//!
//! let clock = ClockProvider::new();
//! let epoch = Utc.with_ymd_and_hms(2009, 2, 19, 0, 0, 0).unwrap();
//! clock.freeze(epoch);
//!
//! let timer = clock.new_timer(Duration::milliseconds(100));
//! clock.advance(Duration::milliseconds(100));
//! assert_eq!(timer.c().try_recv().unwrap(), epoch + Duration::milliseconds(100));
//! ```

pub mod error;
pub mod event;
pub mod frozen;
pub mod global;
pub mod provider;
pub mod real;
pub mod source;
pub mod timer;

mod queue;

/// A point on a real or synthetic timeline.
pub type Instant = chrono::DateTime<chrono::Utc>;

/// A signed span of time.
pub type Duration = chrono::TimeDelta;

pub use error::ClockError;
pub use event::{Callback, EventId};
pub use frozen::FrozenTimeSource;
pub use global::*;
pub use provider::{ClockProvider, FreezeGuard, GuardMode, Unfreezer};
pub use real::RealTimeSource;
pub use source::{Source, TimeSource};
pub use timer::{Ticker, Timer};

pub mod prelude {
    pub use crate::provider::*;
    pub use crate::source::TimeSource;
    pub use crate::timer::*;
    pub use crate::{Duration, Instant};
}
