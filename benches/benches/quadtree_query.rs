// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use canopy_quadtree::QuadTree;
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Rect;

const CELL: f64 = 24.0;
const ITEM: f64 = 20.0;

fn gen_grid_rects(n: usize) -> Vec<Rect> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * CELL;
            let y0 = y as f64 * CELL;
            out.push(Rect::new(x0, y0, x0 + ITEM, y0 + ITEM));
        }
    }
    out
}

fn world_for(n: usize) -> Rect {
    Rect::new(0.0, 0.0, n as f64 * CELL, n as f64 * CELL)
}

fn build_tree(n: usize, rects: &[Rect]) -> QuadTree<usize> {
    let mut tree = QuadTree::new(world_for(n)).unwrap();
    for (i, r) in rects.iter().enumerate() {
        tree.insert(i, *r).unwrap();
    }
    tree
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_viewports(n: usize, count: usize, extent: f64) -> Vec<Rect> {
    let mut rng = Rng::new(0xC0FFEE ^ n as u64);
    let world = world_for(n);
    (0..count)
        .map(|_| {
            let x = rng.next_f64() * (world.width() - extent).max(1.0);
            let y = rng.next_f64() * (world.height() - extent).max(1.0);
            Rect::new(x, y, x + extent, y + extent)
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree_build");
    for n in [32_usize, 64, 128] {
        let rects = gen_grid_rects(n);
        group.throughput(Throughput::Elements(rects.len() as u64));
        group.bench_function(format!("grid_{n}x{n}"), |b| {
            b.iter_batched(
                || rects.clone(),
                |rects| {
                    let mut tree = QuadTree::new(world_for(n)).unwrap();
                    for (i, r) in rects.into_iter().enumerate() {
                        tree.insert(i, r).unwrap();
                    }
                    black_box(tree.len())
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_viewport_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("viewport_query");
    for n in [64_usize, 128] {
        let rects = gen_grid_rects(n);
        let tree = build_tree(n, &rects);
        let viewports = gen_viewports(n, 64, 10.0 * CELL);
        group.throughput(Throughput::Elements(viewports.len() as u64));

        group.bench_function(format!("quadtree_{n}x{n}"), |b| {
            b.iter(|| {
                let mut hits = 0_usize;
                for vp in &viewports {
                    tree.visit_intersecting(*vp, |_, _| hits += 1);
                }
                black_box(hits)
            });
        });

        // Linear-scan baseline over the same rect set.
        group.bench_function(format!("linear_{n}x{n}"), |b| {
            b.iter(|| {
                let mut hits = 0_usize;
                for vp in &viewports {
                    for r in &rects {
                        if r.overlaps(*vp) {
                            hits += 1;
                        }
                    }
                }
                black_box(hits)
            });
        });
    }
    group.finish();
}

fn bench_existence_probe(c: &mut Criterion) {
    let mut group = c.benchmark_group("existence_probe");
    let n = 128_usize;
    let rects = gen_grid_rects(n);
    let tree = build_tree(n, &rects);
    let viewports = gen_viewports(n, 256, 2.0 * CELL);
    group.throughput(Throughput::Elements(viewports.len() as u64));
    group.bench_function("has_items_intersecting", |b| {
        b.iter(|| {
            let mut any = 0_usize;
            for vp in &viewports {
                if tree.has_items_intersecting(*vp) {
                    any += 1;
                }
            }
            black_box(any)
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_viewport_query,
    bench_existence_probe
);
criterion_main!(benches);
