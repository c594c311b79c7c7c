//! ## tackle-clock::queue
//! **Pending-event store shared by the frozen and real-time sources**
//!
//! Events are ordered by `(target, sequence)`. Every insertion draws a fresh
//! sequence number, so an event that is re-armed lands at the tail of the
//! group already queued for its instant. An event is active exactly while it
//! sits in `pending`.
//!
//! The queue does no locking of its own; owners wrap it in a mutex and must
//! deliver `Firing`s only after releasing that mutex.
//!
//! Deadlines saturate at [`Instant::MAX_UTC`], so a timer armed with an
//! enormous delay simply never comes due.

use std::collections::{BTreeMap, HashMap};

use crossbeam::channel::{bounded, Receiver, Sender};

use crate::event::{Delivery, EventId, Firing, ScheduledEvent};
use crate::{Duration, Instant};

type OrderKey = (Instant, u64);

/// `from + d`, clamped to the last representable instant.
pub(crate) fn deadline(from: Instant, d: Duration) -> Instant {
    from.checked_add_signed(d).unwrap_or(Instant::MAX_UTC)
}

/// Handle for withdrawing a `wait4scheduled` registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WaiterId(u64);

struct Waiter {
    id: WaiterId,
    count: usize,
    notify: Sender<()>,
}

/// Ordered collection of pending timers and tickers.
#[derive(Default)]
pub(crate) struct EventQueue {
    pending: BTreeMap<OrderKey, ScheduledEvent>,
    index: HashMap<EventId, OrderKey>,
    next_sequence: u64,
    next_id: u64,
    next_waiter: u64,
    waiters: Vec<Waiter>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out an id for a new timer or ticker handle.
    pub fn allocate_id(&mut self) -> EventId {
        self.next_id += 1;
        EventId::new(self.next_id)
    }

    /// Number of active pending events.
    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.keys().next().map(|(target, _)| *target)
    }

    /// Queues `id` to fire at `target`.
    ///
    /// Returns whether `id` was already pending; a pending entry is replaced
    /// and moves behind everything else queued for `target`.
    pub fn insert(
        &mut self,
        id: EventId,
        target: Instant,
        interval: Duration,
        deliver: Delivery,
    ) -> bool {
        let was_active = self.remove(id).is_some();
        self.push(ScheduledEvent {
            id,
            target,
            sequence: 0,
            interval,
            deliver,
        });
        self.notify_waiters();
        was_active
    }

    /// Deactivates `id`, returning the event if it was pending.
    pub fn remove(&mut self, id: EventId) -> Option<ScheduledEvent> {
        let key = self.index.remove(&id)?;
        self.pending.remove(&key)
    }

    /// Takes the earliest event due at or before `limit`.
    ///
    /// A ticker is put back at `target + interval` before this returns, so the
    /// cadence is fixed to the original schedule and a `stop` racing with the
    /// delivery still finds it. A ticker whose next tick would fall past
    /// [`Instant::MAX_UTC`] is retired instead.
    pub fn pop_due(&mut self, limit: Instant) -> Option<Firing> {
        let (&key, _) = self.pending.first_key_value()?;
        if key.0 > limit {
            return None;
        }
        let event = self.pending.remove(&key)?;
        self.index.remove(&event.id);

        let firing = Firing {
            id: event.id,
            at: event.target,
            deliver: event.deliver.clone(),
        };
        if event.is_ticker() {
            if let Some(next) = event.target.checked_add_signed(event.interval) {
                self.push(ScheduledEvent {
                    target: next,
                    ..event
                });
                self.notify_waiters();
            }
        }
        Some(firing)
    }

    /// Drops every pending event and waiter, returning how many events were pending.
    pub fn clear(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending.clear();
        self.index.clear();
        self.waiters.clear();
        discarded
    }

    /// Registers interest in `count` simultaneously pending events.
    ///
    /// Returns `None` when the condition already holds. A caller that gives
    /// up waiting must hand the id back to [`cancel_waiter`](Self::cancel_waiter).
    pub fn register_waiter(&mut self, count: usize) -> Option<(WaiterId, Receiver<()>)> {
        if self.pending.len() >= count {
            return None;
        }
        self.next_waiter += 1;
        let id = WaiterId(self.next_waiter);
        let (notify, rx) = bounded(1);
        self.waiters.push(Waiter { id, count, notify });
        Some((id, rx))
    }

    /// Forgets a waiter that timed out.
    pub fn cancel_waiter(&mut self, id: WaiterId) {
        self.waiters.retain(|waiter| waiter.id != id);
    }

    #[cfg(test)]
    pub fn waiters(&self) -> usize {
        self.waiters.len()
    }

    fn push(&mut self, mut event: ScheduledEvent) {
        self.next_sequence += 1;
        event.sequence = self.next_sequence;
        let key = (event.target, event.sequence);
        self.index.insert(event.id, key);
        self.pending.insert(key, event);
    }

    fn notify_waiters(&mut self) {
        if self.waiters.is_empty() {
            return;
        }
        let pending = self.pending.len();
        self.waiters.retain(|waiter| {
            if waiter.count <= pending {
                // The waiter may have timed out already.
                let _ = waiter.notify.try_send(());
                false
            } else {
                true
            }
        });
    }
}
