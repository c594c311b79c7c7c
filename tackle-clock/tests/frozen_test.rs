//! Behaviour of a frozen provider: sleeping, timers, tickers, ordering and
//! `wait4scheduled`.

use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tackle_clock::{ClockProvider, Duration, Instant};

fn epoch() -> Instant {
    DateTime::parse_from_rfc3339("2009-02-19T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn ms(n: i64) -> Duration {
    Duration::milliseconds(n)
}

fn frozen() -> Arc<ClockProvider> {
    let clock = Arc::new(ClockProvider::new());
    clock.freeze(epoch());
    clock
}

fn assert_hits(got: &Receiver<i64>, want: &[i64]) {
    for (i, w) in want.iter().enumerate() {
        let g = got
            .recv_timeout(StdDuration::from_secs(1))
            .unwrap_or_else(|_| panic!("missing hit #{i}, want={w}"));
        assert_eq!(*w, g, "hit #{i}");
    }
    if let Ok(g) = got.try_recv() {
        panic!("unexpected hit {g}");
    }
}

fn assert_not_fired(ch: &Receiver<Instant>) {
    assert!(ch.try_recv().is_err(), "premature fire");
}

/// Collects callback hits in firing order.
#[derive(Clone, Default)]
struct Hits(Arc<Mutex<Vec<i64>>>);

impl Hits {
    fn record(&self, clock: &ClockProvider, d: Duration, value: i64) -> tackle_clock::Timer {
        let hits = self.clone();
        clock.after_func(d, move || hits.0.lock().push(value))
    }

    fn get(&self) -> Vec<i64> {
        self.0.lock().clone()
    }
}

#[test]
fn freeze_unfreeze_chain() {
    let clock = ClockProvider::new();
    clock.freeze(clock.now()).unfreeze();
    assert!(!clock.is_frozen());
}

#[test]
fn advance_now() {
    let clock = frozen();
    assert_eq!(epoch(), clock.now());
    assert_eq!(ms(42), clock.advance(ms(42)));
    assert_eq!(epoch() + ms(42), clock.now());
    assert_eq!(ms(55), clock.advance(ms(13)));
    assert_eq!(ms(74), clock.advance(ms(19)));
    assert_eq!(epoch() + ms(74), clock.now());
}

#[derive(Debug, Clone, Copy)]
enum Blocker {
    Sleep,
    After,
    AfterFunc,
    NewTimer,
}

impl Blocker {
    fn start(self, clock: &Arc<ClockProvider>, delay: i64, hits: Sender<i64>) {
        if let Blocker::AfterFunc = self {
            clock.after_func(ms(delay), move || hits.send(delay).unwrap());
            return;
        }
        let clock = Arc::clone(clock);
        thread::spawn(move || {
            match self {
                Blocker::Sleep => clock.sleep(ms(delay)),
                Blocker::After => {
                    clock.after(ms(delay)).recv().unwrap();
                }
                Blocker::NewTimer => {
                    let timer = clock.new_timer(ms(delay));
                    timer.c().recv().unwrap();
                }
                Blocker::AfterFunc => unreachable!(),
            }
            hits.send(delay).unwrap();
        });
    }
}

#[test]
fn sleep_after_and_timers_wake_in_deadline_order() {
    let clock = frozen();
    let delays = [60, 100, 90, 131, 999, 5];
    for blocker in [
        Blocker::Sleep,
        Blocker::After,
        Blocker::AfterFunc,
        Blocker::NewTimer,
    ] {
        let (tx, hits) = unbounded();
        for delay in delays {
            blocker.start(&clock, delay, tx.clone());
        }
        assert!(
            clock.wait4scheduled(delays.len(), StdDuration::from_secs(1)),
            "{blocker:?}: timers not registered"
        );

        let mut running = 0;
        for delay in [5, 60, 90, 100, 131, 999] {
            let delta = delay - running - 1;
            clock.advance(ms(delta));
            // Nothing may fire before its deadline.
            assert_hits(&hits, &[]);

            clock.advance(ms(1));
            assert_hits(&hits, &[delay]);

            running += delta + 1;
        }

        clock.advance(ms(1000));
        assert_hits(&hits, &[]);
    }
}

#[test]
fn same_instant_fires_in_creation_order() {
    let clock = frozen();
    let hits = Hits::default();

    hits.record(&clock, ms(100), 3);
    hits.record(&clock, ms(100), 1);
    hits.record(&clock, ms(99), 2);
    hits.record(&clock, ms(100), 5);
    hits.record(&clock, ms(101), 4);
    hits.record(&clock, ms(101), 6);

    clock.advance(ms(100));

    assert_eq!(vec![2, 3, 1, 5], hits.get());
}

#[test]
fn timer_stop() {
    let clock = frozen();
    let hits = Hits::default();

    hits.record(&clock, ms(100), 1);
    let timer = hits.record(&clock, ms(100), 2);
    hits.record(&clock, ms(100), 3);
    clock.advance(ms(99));
    assert!(hits.get().is_empty());

    let active1 = timer.stop();
    let active2 = timer.stop();

    assert!(active1);
    assert!(!active2);
    clock.advance(ms(1));
    assert_eq!(vec![1, 3], hits.get());
}

#[test]
fn timer_reset() {
    let clock = frozen();
    let hits = Hits::default();

    let t1 = hits.record(&clock, ms(100), 1);
    let t2 = hits.record(&clock, ms(100), 2);
    hits.record(&clock, ms(100), 3);
    clock.advance(ms(99));
    assert!(hits.get().is_empty());

    // Reset to the same instant.
    let active1 = t1.reset(ms(1));
    let active2 = t2.reset(ms(7));

    assert!(active1);
    assert!(active2);

    clock.advance(ms(1));
    assert_eq!(vec![3, 1], hits.get());
    clock.advance(ms(5));
    assert_eq!(vec![3, 1], hits.get());
    clock.advance(ms(1));
    assert_eq!(vec![3, 1, 2], hits.get());
}

// Resetting to the same instant puts the timer at the end of that instant's list.
#[test]
fn reset_same_instant_moves_to_tail() {
    let clock = frozen();
    let hits = Hits::default();

    let timer = hits.record(&clock, ms(100), 1);
    hits.record(&clock, ms(100), 2);
    hits.record(&clock, ms(100), 3);
    hits.record(&clock, ms(101), 4);
    clock.advance(ms(9));

    assert!(timer.reset(ms(91)));

    clock.advance(ms(90));
    assert!(hits.get().is_empty());
    clock.advance(ms(1));
    assert_eq!(vec![2, 3, 1], hits.get());
}

#[test]
fn reset_after_fire_rearms() {
    let clock = frozen();
    let timer = clock.new_timer(ms(10));
    clock.advance(ms(10));
    assert_eq!(timer.c().try_recv().unwrap(), epoch() + ms(10));

    assert!(!timer.reset(ms(5)));
    clock.advance(ms(5));
    assert_eq!(timer.c().try_recv().unwrap(), epoch() + ms(15));
}

#[test]
fn ticker() {
    let clock = frozen();
    let ticker = clock.new_ticker(ms(100));

    clock.advance(ms(99));
    assert_not_fired(ticker.c());
    clock.advance(ms(1));
    assert_eq!(ticker.c().try_recv().unwrap(), epoch() + ms(100));
    clock.advance(ms(750));
    assert_eq!(ticker.c().try_recv().unwrap(), epoch() + ms(200));
    clock.advance(ms(49));
    assert_not_fired(ticker.c());
    clock.advance(ms(1));
    assert_eq!(ticker.c().try_recv().unwrap(), epoch() + ms(900));

    ticker.reset(ms(200));
    clock.advance(ms(100));
    assert_not_fired(ticker.c());
    clock.advance(ms(100));
    assert_eq!(ticker.c().try_recv().unwrap(), epoch() + ms(1100));

    assert!(ticker.stop());
    clock.advance(ms(300));
    assert_not_fired(ticker.c());
}

#[test]
#[should_panic(expected = "non-positive interval")]
fn ticker_zero_panics() {
    let clock = frozen();
    clock.new_ticker(Duration::zero());
}

#[test]
fn ticker_reset_rejects_non_positive() {
    let clock = frozen();
    let ticker = clock.new_ticker(ms(10));
    assert!(ticker.try_reset(ms(-1)).is_err());
    assert!(clock.try_new_ticker(ms(-1)).is_err());
}

#[test]
fn tick() {
    let clock = frozen();
    let ch = clock.tick(ms(100)).expect("positive interval");

    clock.advance(ms(99));
    assert_not_fired(&ch);
    clock.advance(ms(1));
    assert_eq!(ch.try_recv().unwrap(), epoch() + ms(100));
    clock.advance(ms(750));
    assert_eq!(ch.try_recv().unwrap(), epoch() + ms(200));
    clock.advance(ms(49));
    assert_not_fired(&ch);
    clock.advance(ms(1));
    assert_eq!(ch.try_recv().unwrap(), epoch() + ms(900));
}

#[test]
fn tick_zero_is_none() {
    let clock = frozen();
    assert!(clock.tick(Duration::zero()).is_none());
    assert!(clock.tick(ms(-100)).is_none());
}

#[test]
fn new_stopped_timer() {
    let clock = frozen();
    let timer = clock.new_stopped_timer();

    assert!(timer.c().try_recv().is_err());
    assert!(!timer.stop());
}

#[test]
fn wait4scheduled_blocks_until_count() {
    let clock = frozen();
    let _a = clock.after(ms(100));
    let _b = clock.after(ms(100));
    assert!(!clock.wait4scheduled(3, StdDuration::ZERO));

    let (started_tx, started) = crossbeam::channel::bounded::<()>(0);
    let waiter = {
        let clock = Arc::clone(&clock);
        thread::spawn(move || {
            drop(started_tx);
            clock.wait4scheduled(3, StdDuration::from_secs(5))
        })
    };
    let _ = started.recv();
    thread::sleep(StdDuration::from_millis(50));

    let _c = clock.after(ms(100));

    assert!(waiter.join().unwrap());
}

// With enough timers already scheduled the call returns without waiting.
#[test]
fn wait4scheduled_immediate() {
    let clock = frozen();
    let _a = clock.after(ms(100));
    let _b = clock.after(ms(100));
    assert!(clock.wait4scheduled(2, StdDuration::ZERO));
}

#[test]
fn wait4scheduled_times_out() {
    let clock = frozen();
    assert!(!clock.wait4scheduled(1, StdDuration::from_millis(20)));
}

#[test]
fn since() {
    let clock = frozen();
    assert_eq!(Duration::zero(), clock.since(clock.now()));
    assert_eq!(-ms(1), clock.since(clock.now() + ms(1)));
    assert_eq!(ms(1), clock.since(clock.now() - ms(1)));
}

#[test]
fn until() {
    let clock = frozen();
    assert_eq!(Duration::zero(), clock.until(clock.now()));
    assert_eq!(ms(1), clock.until(clock.now() + ms(1)));
    assert_eq!(-ms(1), clock.until(clock.now() - ms(1)));
}

#[test]
fn unfreeze_abandons_tickers() {
    let clock = frozen();
    let ticker = clock.new_ticker(ms(10));
    clock.unfreeze();
    assert!(!ticker.stop());
    assert!(ticker.c().recv_timeout(StdDuration::from_millis(30)).is_err());
}

#[test]
fn never_firing_timer() {
    let clock = frozen();
    let timer = clock.new_timer(Duration::MAX);
    let hits = Hits::default();
    hits.record(&clock, Duration::MAX, 1);

    clock.advance(Duration::weeks(52 * 100));
    assert_not_fired(timer.c());
    assert!(hits.get().is_empty());
    assert!(timer.stop());
}

#[test]
fn advance_by_max_duration() {
    let clock = frozen();
    let timer = clock.new_timer(ms(100));
    assert_eq!(clock.advance(Duration::MAX), Instant::MAX_UTC - epoch());
    assert_eq!(clock.now(), Instant::MAX_UTC);
    assert_eq!(timer.c().try_recv().unwrap(), epoch() + ms(100));
}
