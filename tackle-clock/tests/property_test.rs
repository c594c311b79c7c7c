//! Property tests for the frozen timeline: `advance` arithmetic and firing order.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use proptest::prelude::*;
use tackle_clock::{ClockProvider, Duration, Instant};

fn epoch() -> Instant {
    Utc.with_ymd_and_hms(2009, 2, 19, 0, 0, 0).unwrap()
}

fn frozen() -> ClockProvider {
    let clock = ClockProvider::new();
    clock.freeze(epoch());
    clock
}

fn arb_steps() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-50i64..500, 1..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// `advance` returns the running total of clamped steps and never moves `now` back.
    #[test]
    fn advance_is_additive_and_monotonic(steps in arb_steps()) {
        let clock = frozen();
        let mut total = 0i64;
        let mut last = clock.now();
        for step in steps {
            total += step.max(0);
            let elapsed = clock.advance(Duration::milliseconds(step));
            prop_assert_eq!(elapsed, Duration::milliseconds(total));
            prop_assert!(clock.now() >= last);
            last = clock.now();
        }
        prop_assert_eq!(last, epoch() + Duration::milliseconds(total));
    }

    /// Callbacks fire sorted by deadline, ties broken by creation order,
    /// no matter how the advance is split up.
    #[test]
    fn callbacks_fire_in_deadline_then_creation_order(
        delays in prop::collection::vec(0i64..200, 1..30),
        chunk in 1i64..50,
    ) {
        let clock = frozen();
        let fired = Arc::new(Mutex::new(Vec::new()));
        let _timers: Vec<_> = delays
            .iter()
            .enumerate()
            .map(|(i, &delay)| {
                let fired = Arc::clone(&fired);
                clock.after_func(Duration::milliseconds(delay), move || fired.lock().push(i))
            })
            .collect();

        let mut advanced = 0;
        while advanced < 200 {
            clock.advance(Duration::milliseconds(chunk));
            advanced += chunk;
        }

        let mut expected: Vec<usize> = (0..delays.len()).collect();
        expected.sort_by_key(|&i| (delays[i], i));
        prop_assert_eq!(fired.lock().clone(), expected);
    }

    /// A stopped timer never fires and a second stop reports it inactive.
    #[test]
    fn stopped_timers_stay_silent(delay in 1i64..1000, before in 0i64..1000) {
        let clock = frozen();
        let timer = clock.new_timer(Duration::milliseconds(delay));
        clock.advance(Duration::milliseconds(before.min(delay - 1)));
        prop_assert!(timer.stop());
        prop_assert!(!timer.stop());
        clock.advance(Duration::milliseconds(delay * 2));
        prop_assert!(timer.c().try_recv().is_err());
    }
}
