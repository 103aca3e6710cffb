// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::time::Duration;

use canopy_throttle::{ManualClock, WorkThrottle};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

/// Cost of driving the controller through a simulated workload until its
/// quantum stabilizes; this is the bookkeeping a surface pays per frame.
fn bench_convergence(c: &mut Criterion) {
    c.bench_function("throttle_converge_constant_cost", |b| {
        let unit_cost = Duration::from_micros(50);
        b.iter(|| {
            let clock = ManualClock::new();
            let mut throttle = WorkThrottle::new(1000, Duration::from_millis(50)).with_floor(1);
            for _ in 0..32 {
                throttle.run(&clock, |quantum| {
                    clock.advance(unit_cost * quantum as u32);
                    quantum
                });
            }
            black_box(throttle.quantum())
        });
    });
}

criterion_group!(benches, bench_convergence);
criterion_main!(benches);
