// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=canopy_throttle --heading-base-level=0

//! Canopy Throttle: self-tuning work quantization for cooperative scheduling.
//!
//! A UI thread that materializes expensive resources incrementally needs to
//! answer one question every tick: *how much work fits in my time budget?*
//! [`WorkThrottle`] answers it empirically. It hands the caller a unit
//! budget (the *quantum*), measures how long the batch actually took, and
//! rescales the quantum proportionally toward a fixed ideal duration.
//!
//! The crate has no spatial or rendering concepts; it is a small feedback
//! controller plus the [`Clock`] seam that keeps it deterministic under
//! test:
//!
//! - [`ManualClock`] — advanced by hand, for tests and simulations.
//! - [`MonotonicClock`] *(feature `std`)* — wraps [`std::time::Instant`]
//!   for production hosts.
//!
//! # Example
//!
//! ```rust
//! use canopy_throttle::{ManualClock, WorkThrottle};
//! use core::time::Duration;
//!
//! let clock = ManualClock::new();
//! let mut throttle = WorkThrottle::new(1000, Duration::from_millis(50)).with_floor(10);
//!
//! // Simulate a queue where each unit costs 500µs.
//! let mut queue = 10_000_usize;
//! while queue > 0 {
//!     throttle.run(&clock, |quantum| {
//!         let batch = quantum.min(queue);
//!         clock.advance(Duration::from_micros(500) * batch as u32);
//!         queue -= batch;
//!         batch
//!     });
//! }
//!
//! // The quantum settled near ideal / per-unit cost = 100 units.
//! assert!(throttle.quantum().abs_diff(100) <= 10);
//! ```
//!
//! This crate is `no_std` and uses `alloc`-free core only; the `std`
//! feature (default) adds the wall-clock [`MonotonicClock`].

#![no_std]

#[cfg(feature = "std")]
extern crate std;

mod clock;
mod throttle;

pub use clock::{Clock, ManualClock};
#[cfg(feature = "std")]
pub use clock::MonotonicClock;
pub use throttle::{DEFAULT_FLOOR, WorkThrottle};
