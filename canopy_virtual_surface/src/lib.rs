// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=canopy_virtual_surface --heading-base-level=0

//! Canopy Virtual Surface: incremental, time-budgeted 2D virtualization.
//!
//! A scrollable, zoomable surface can logically hold far more positioned
//! items than it can afford live visual resources for. [`VirtualSurface`]
//! closes that gap: it keeps the whole collection in a
//! [`canopy_quadtree::QuadTree`], derives a content-space visible rectangle
//! from the host's [`Viewport`], and materializes visuals only for items
//! intersecting it — tearing them down again once they scroll out of view.
//!
//! The moving parts:
//!
//! - **Region diffing.** Scroll and zoom changes are diffed into up to four
//!   edge strips per direction: vacated strips queue as *dirty* (visuals to
//!   dispose), revealed strips as *pending* (visuals to create). A one-pixel
//!   scroll touches one-pixel strips, never the whole viewport.
//! - **Quantized passes.** [`VirtualSurface::reconcile`] performs one
//!   batch per call — eviction, creation, or a slice of a consistency
//!   sweep — sized by per-pass [`canopy_throttle::WorkThrottle`]s, so the
//!   UI thread is never held for much longer than the configured ideal
//!   duration. Oversized regions are bisected rather than allowed to stall
//!   progress; regions competing for the quantum take turns.
//! - **Stable stacking.** Spatial queries return items in arbitrary order,
//!   but visuals are handed to the [`VisualHost`] with an insertion index
//!   found by binary search over the logical stacking order, so overlapping
//!   items always draw correctly.
//! - **Structural rebuilds.** Adding, removing, or replacing items discards
//!   the index and region queues wholesale and restarts reconciliation from
//!   an invalid-extent state; there is no partial-cancellation path.
//!
//! Everything is single-threaded and cooperative: the host's scheduler (an
//! idle callback, a frame tick, or a test loop) simply calls `reconcile`
//! again while it reports [`Reconcile::Working`].
//!
//! # Example
//!
//! ```rust
//! use canopy_throttle::ManualClock;
//! use canopy_virtual_surface::{Viewport, VirtualSurface, VisualHost};
//! use kurbo::{Rect, Size, Vec2};
//!
//! #[derive(Default)]
//! struct CountingHost {
//!     live: usize,
//! }
//!
//! impl VisualHost<u64> for CountingHost {
//!     fn create_visual(&mut self, _id: u64, _index: usize) {
//!         self.live += 1;
//!     }
//!     fn dispose_visual(&mut self, _id: u64) {
//!         self.live -= 1;
//!     }
//! }
//!
//! // A million-cell surface costs only the visuals actually on screen.
//! let mut surface: VirtualSurface<u64> = VirtualSurface::new();
//! surface.set_items((0..1000u64 * 100).map(|id| {
//!     let x = f64::from(u32::try_from(id % 1000).unwrap()) * 50.0;
//!     let y = f64::from(u32::try_from(id / 1000).unwrap()) * 50.0;
//!     (id, Rect::new(x, y, x + 40.0, y + 40.0))
//! }))?;
//! surface.set_viewport(Viewport::new(
//!     Vec2::new(10_000.0, 2_000.0),
//!     Size::new(400.0, 300.0),
//!     Vec2::new(1.0, 1.0),
//! ));
//!
//! let clock = ManualClock::new();
//! let mut host = CountingHost::default();
//! while surface.reconcile(&mut host, &clock).is_working() {}
//!
//! assert_eq!(host.live, surface.realized_count());
//! assert!(host.live > 0 && host.live < 100);
//! # Ok::<(), canopy_virtual_surface::BoundsError>(())
//! ```
//!
//! This crate is `no_std` and uses `alloc`. The default `std` feature only
//! forwards to the dependencies' `std` features; enable `libm` instead for
//! `no_std` targets.

#![no_std]

extern crate alloc;

mod host;
mod regions;
mod surface;
mod viewport;

pub use canopy_quadtree::BoundsError;
pub use host::VisualHost;
pub use surface::{Reconcile, SurfaceConfig, VirtualSurface};
pub use viewport::{MIN_SCALE, Viewport};
