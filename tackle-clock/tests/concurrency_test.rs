//! Many threads blocking on a frozen clock while another thread advances it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

use chrono::{TimeZone, Utc};
use tackle_clock::{ClockProvider, Duration, GuardMode};

const SLEEPERS: usize = 32;

fn run_stress(mode: GuardMode) {
    let clock = Arc::new(ClockProvider::with_guard(mode));
    clock.freeze(Utc.with_ymd_and_hms(2009, 2, 19, 0, 0, 0).unwrap());
    let woke = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::with_capacity(SLEEPERS);
    for i in 0..SLEEPERS {
        let clock = Arc::clone(&clock);
        let woke = Arc::clone(&woke);
        handles.push(thread::spawn(move || {
            let delay = Duration::milliseconds(1 + (i as i64 * 7) % 50);
            if i % 2 == 0 {
                clock.sleep(delay);
            } else {
                clock.after(delay).recv().unwrap();
            }
            woke.fetch_add(1, Ordering::SeqCst);
        }));
    }

    assert!(clock.wait4scheduled(SLEEPERS, StdDuration::from_secs(5)));

    let advancer = {
        let clock = Arc::clone(&clock);
        thread::spawn(move || {
            for _ in 0..60 {
                clock.advance(Duration::milliseconds(1));
            }
        })
    };

    advancer.join().unwrap();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(woke.load(Ordering::SeqCst), SLEEPERS);
    assert_eq!(clock.source().as_frozen().map(|f| f.pending()), Some(0));
}

#[test]
fn sleepers_all_wake_exactly_once_locked() {
    run_stress(GuardMode::Locked);
}

#[test]
fn sleepers_all_wake_exactly_once_lock_free() {
    run_stress(GuardMode::LockFree);
}

#[test]
fn callbacks_may_stop_other_timers() {
    let clock = Arc::new(ClockProvider::new());
    clock.freeze(Utc.with_ymd_and_hms(2009, 2, 19, 0, 0, 0).unwrap());
    let fired = Arc::new(AtomicUsize::new(0));

    let victim = {
        let fired = Arc::clone(&fired);
        Arc::new(clock.after_func(Duration::milliseconds(20), move || {
            fired.fetch_add(1, Ordering::SeqCst);
        }))
    };
    let _killer = {
        let victim = Arc::clone(&victim);
        clock.after_func(Duration::milliseconds(10), move || {
            assert!(victim.stop());
        })
    };

    clock.advance(Duration::milliseconds(30));
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[test]
fn concurrent_advances_keep_now_monotonic() {
    let clock = Arc::new(ClockProvider::new());
    clock.freeze(Utc.with_ymd_and_hms(2009, 2, 19, 0, 0, 0).unwrap());
    let _ticker = clock.new_ticker(Duration::milliseconds(3));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let clock = Arc::clone(&clock);
            thread::spawn(move || {
                let mut last = clock.now();
                for _ in 0..250 {
                    clock.advance(Duration::milliseconds(1));
                    let now = clock.now();
                    assert!(now >= last);
                    last = now;
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
}
