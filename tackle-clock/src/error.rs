use thiserror::Error;

use crate::Duration;

/// Clock misuse conditions.
///
/// The panicking entry points (`advance`, `new_ticker`, `Ticker::reset`) raise
/// these as panics; their `try_*` twins hand them back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    #[error("clock is not frozen, advance requires a frozen timeline")]
    NotFrozen,
    #[error("non-positive interval for ticker: {0}")]
    NonPositiveInterval(Duration),
    #[error("global clock already initialized")]
    AlreadyInitialized,
}
