// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated pan/zoom session over a 100x100 item grid.
//!
//! Run:
//! - `cargo run -p canopy_demos --example pan_zoom`

use canopy_throttle::MonotonicClock;
use canopy_virtual_surface::{Viewport, VirtualSurface, VisualHost};
use kurbo::{Rect, Size, Vec2};

const COLUMNS: u32 = 100;
const ROWS: u32 = 100;
const CELL: f64 = 50.0;
const ITEM: f64 = 40.0;

#[derive(Default)]
struct CountingHost {
    live: usize,
    created: usize,
    disposed: usize,
}

impl VisualHost<u32> for CountingHost {
    fn create_visual(&mut self, _id: u32, _index: usize) {
        self.live += 1;
        self.created += 1;
    }

    fn dispose_visual(&mut self, _id: u32) {
        self.live -= 1;
        self.disposed += 1;
    }
}

fn main() {
    let mut surface: VirtualSurface<u32> = VirtualSurface::new();
    surface
        .set_items((0..ROWS * COLUMNS).map(|id| {
            let x = f64::from(id % COLUMNS) * CELL;
            let y = f64::from(id / COLUMNS) * CELL;
            (id, Rect::new(x, y, x + ITEM, y + ITEM))
        }))
        .expect("grid bounds are valid");

    let clock = MonotonicClock::new();
    let mut host = CountingHost::default();

    let steps: &[(&str, Viewport)] = &[
        (
            "initial layout",
            Viewport::new(Vec2::ZERO, Size::new(800.0, 600.0), Vec2::new(1.0, 1.0)),
        ),
        (
            "pan right",
            Viewport::new(
                Vec2::new(1200.0, 0.0),
                Size::new(800.0, 600.0),
                Vec2::new(1.0, 1.0),
            ),
        ),
        (
            "pan diagonally",
            Viewport::new(
                Vec2::new(2000.0, 2000.0),
                Size::new(800.0, 600.0),
                Vec2::new(1.0, 1.0),
            ),
        ),
        (
            "zoom out 2x",
            Viewport::new(
                Vec2::new(2000.0, 2000.0),
                Size::new(800.0, 600.0),
                Vec2::new(0.5, 0.5),
            ),
        ),
        (
            "zoom in 4x",
            Viewport::new(
                Vec2::new(2000.0, 2000.0),
                Size::new(800.0, 600.0),
                Vec2::new(2.0, 2.0),
            ),
        ),
    ];

    println!(
        "{} items over a {:.0}x{:.0} surface",
        surface.len(),
        surface.extent().width,
        surface.extent().height
    );

    for (label, viewport) in steps {
        surface.set_viewport(*viewport);
        let mut ticks = 0;
        while surface.reconcile(&mut host, &clock).is_working() {
            ticks += 1;
        }
        println!(
            "{label:>16}: {:>4} live visuals after {ticks} ticks \
             ({} created, {} disposed so far)",
            host.live, host.created, host.disposed
        );
        assert_eq!(host.live, surface.realized_count());
    }
}
