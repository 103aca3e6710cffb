// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=canopy_quadtree --heading-base-level=0

//! Canopy Quadtree: a quad-tree index over axis-aligned bounding rectangles.
//!
//! This crate is the spatial half of a virtualized rendering surface, but it
//! knows nothing about visuals or scheduling: it stores opaque item handles
//! keyed by `kurbo::Rect` bounds and answers "which items intersect this
//! rectangle" queries.
//!
//! - [`QuadTree::insert`] descends into the deepest child quadrant that
//!   *fully contains* the item's bounds (containment, not mere
//!   intersection), constructing quadrants lazily. Small items end up deep
//!   in the tree where queries are cheap; items overlapping a subdivision
//!   boundary stay at the parent, so nothing is ever lost to a split.
//! - [`QuadTree::remove`] resolves the owning quadrant through a side table
//!   in O(1) and swap-removes from its local list, then prunes quadrants
//!   left empty.
//! - [`QuadTree::set_bounds`] reassigns the overall bounds by draining and
//!   re-inserting everything: quadrant boundaries derive from the overall
//!   bounds, so a resize is a deliberate O(n) rebuild, not an incremental
//!   update.
//!
//! Bounds must be finite with strictly positive width and height; anything
//! else is rejected with a [`BoundsError`] before the tree is touched.
//!
//! # Example
//!
//! ```rust
//! use canopy_quadtree::QuadTree;
//! use kurbo::Rect;
//!
//! let mut tree: QuadTree<u64> = QuadTree::new(Rect::new(0.0, 0.0, 1000.0, 1000.0))?;
//! for i in 0..10 {
//!     let x = i as f64 * 100.0;
//!     tree.insert(i, Rect::new(x, 0.0, x + 80.0, 80.0))?;
//! }
//!
//! // Items sharing any part of the query rectangle are reported, including
//! // edge contact.
//! let near_origin: Vec<_> = tree
//!     .items_intersecting(Rect::new(0.0, 0.0, 150.0, 150.0))
//!     .collect();
//! assert_eq!(near_origin.len(), 2);
//!
//! // Cheap existence probe that stops at the first match.
//! assert!(tree.has_items_intersecting(Rect::new(500.0, 0.0, 520.0, 20.0)));
//! # Ok::<(), canopy_quadtree::BoundsError>(())
//! ```
//!
//! This crate is `no_std` and uses `alloc`. The default `std` feature only
//! forwards to `kurbo/std`; enable `libm` instead for `no_std` targets.

#![no_std]

extern crate alloc;

mod tree;
mod types;

pub use tree::QuadTree;
pub use types::{BoundsError, validate_bounds};
