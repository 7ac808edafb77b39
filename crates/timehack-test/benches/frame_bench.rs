//! Benchmarks for per-frame work

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use timehack_core::{MinuteMark, MonotonicMs, UtcInstant};
use timehack_cue::{CueInput, CueScheduler, DefaultAnnouncement};
use timehack_test::{Availability, ClockDriftModel, SimulatedHost, SCENARIO_MINUTE};
use timehack_time::{CalendarProjector, Zone};

fn bench_cue_evaluate(c: &mut Criterion) {
    let mut scheduler = CueScheduler::default();
    let mut ms = 0.0;

    c.bench_function("cue_evaluate", |b| {
        b.iter(|| {
            ms += 100.0;
            let second = ((ms / 1000.0) as u64 % 60) as u8;
            black_box(scheduler.evaluate(CueInput {
                utc_second: black_box(second),
                display_time: MinuteMark::new(12, 0),
                monotonic: MonotonicMs::from_millis(ms),
            }))
        })
    });
}

fn bench_zone_projection(c: &mut Criterion) {
    let zone = Zone::parse("America/Chicago").unwrap();
    let instant = UtcInstant::from_millis(SCENARIO_MINUTE);

    c.bench_function("zone_projection", |b| {
        b.iter(|| CalendarProjector::to_zone_components(black_box(instant), black_box(zone)))
    });
}

fn bench_default_announcement(c: &mut Criterion) {
    let zone = Zone::parse("Europe/Berlin").unwrap();
    let instant = UtcInstant::from_millis(SCENARIO_MINUTE);

    c.bench_function("default_announcement", |b| {
        b.iter(|| DefaultAnnouncement::at(black_box(instant), zone).to_string())
    });
}

fn bench_full_frame(c: &mut Criterion) {
    let mut host = SimulatedHost::new(
        UtcInstant::from_millis(SCENARIO_MINUTE),
        0,
        ClockDriftModel::perfect(),
        Availability::Always,
        0,
    );

    c.bench_function("full_frame", |b| {
        b.iter(|| {
            host.advance(Duration::from_millis(100));
            black_box(host.frame())
        })
    });
}

criterion_group!(
    benches,
    bench_cue_evaluate,
    bench_zone_projection,
    bench_default_announcement,
    bench_full_frame,
);
criterion_main!(benches);
