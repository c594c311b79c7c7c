#[macro_use]
extern crate criterion;

use chrono::{TimeZone, Utc};
use criterion::Criterion;

use tackle_clock::{ClockProvider, Duration, GuardMode};

fn bench_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("frozen_advance");
    let epoch = Utc.with_ymd_and_hms(2009, 2, 19, 0, 0, 0).unwrap();

    for pending in [16, 256, 4096] {
        group.throughput(criterion::Throughput::Elements(pending as u64)); // Timers fired per iteration
        group.bench_function(format!("pending_{}", pending), |b| {
            let clock = ClockProvider::new();
            b.iter(|| {
                clock.freeze(epoch);
                let timers: Vec<_> = (0..pending)
                    .map(|i| clock.new_timer(Duration::microseconds(i as i64)))
                    .collect();
                clock.advance(Duration::milliseconds(10));
                timers
            });
        });
    }
    group.finish();
}

fn bench_now(c: &mut Criterion) {
    let mut group = c.benchmark_group("provider_now");
    for mode in [GuardMode::Locked, GuardMode::LockFree] {
        group.bench_function(format!("{:?}", mode), |b| {
            let clock = ClockProvider::with_guard(mode);
            b.iter(|| clock.now());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_advance, bench_now);
criterion_main!(benches);
