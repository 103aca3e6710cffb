// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal quad-tree usage: insert, query, move, remove.
//!
//! Run:
//! - `cargo run -p canopy_demos --example quadtree_basics`

use canopy_quadtree::QuadTree;
use kurbo::Rect;

fn main() {
    let mut tree: QuadTree<&'static str> =
        QuadTree::new(Rect::new(0.0, 0.0, 400.0, 400.0)).expect("valid world bounds");

    tree.insert("toolbar", Rect::new(0.0, 0.0, 400.0, 40.0))
        .expect("valid bounds");
    tree.insert("sidebar", Rect::new(0.0, 40.0, 80.0, 400.0))
        .expect("valid bounds");
    tree.insert("canvas", Rect::new(80.0, 40.0, 400.0, 400.0))
        .expect("valid bounds");
    tree.insert("cursor", Rect::new(200.0, 200.0, 210.0, 210.0))
        .expect("valid bounds");

    let probe = Rect::new(190.0, 190.0, 220.0, 220.0);
    let mut hits: Vec<&str> = tree.items_intersecting(probe).map(|(id, _)| id).collect();
    hits.sort_unstable();
    println!("{probe:?} intersects {hits:?}");

    // Reindex the cursor somewhere else; insert replaces in place.
    tree.insert("cursor", Rect::new(20.0, 60.0, 30.0, 70.0))
        .expect("valid bounds");
    println!(
        "cursor near sidebar now: {}",
        tree.has_items_intersecting(Rect::new(15.0, 55.0, 35.0, 75.0))
    );

    assert!(tree.remove(&"cursor"));
    println!("after removal: {tree:?}");
}
