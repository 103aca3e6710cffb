// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The self-tuning quantizer.

use core::time::Duration;

use crate::clock::Clock;

/// Quanta never shrink below this many units unless a caller lowers the
/// floor explicitly; guaranteed forward progress beats frame-time smoothness
/// when the two conflict.
pub const DEFAULT_FLOOR: usize = 100;

/// A proportional controller sizing work batches to a wall-clock budget.
///
/// The throttle holds a *quantum*: how many units of work the next batch
/// should attempt. After each batch it compares the measured duration
/// against the configured ideal and rescales:
///
/// ```text
/// estimated_full_duration = duration * (quantum / completed_units)
/// new_quantum = (quantum * ideal_duration) / estimated_full_duration
/// ```
///
/// A batch that overran its budget per unit of completed work shrinks the
/// quantum; one that finished comfortably under budget grows it. With a
/// roughly constant per-unit cost the quantum converges to a batch size
/// costing about `ideal_duration`.
///
/// Measurements where either the duration or the completed count is zero
/// teach the controller nothing and leave the quantum untouched. The
/// quantum is clamped into `floor..=usize::MAX`; hitting the floor is not an
/// error, just a slow frame.
///
/// Each kind of work (creation, eviction, a background sweep) should own an
/// independent `WorkThrottle`, since their per-unit costs differ.
///
/// ## Example
///
/// ```rust
/// use canopy_throttle::{ManualClock, WorkThrottle};
/// use core::time::Duration;
///
/// let clock = ManualClock::new();
/// let mut throttle = WorkThrottle::new(1000, Duration::from_millis(50));
///
/// // A batch where each unit costs 1ms: 1000 units take a full second,
/// // twenty times the ideal, so the quantum drops toward 50.
/// let done = throttle.run(&clock, |quantum| {
///     clock.advance(Duration::from_millis(quantum as u64));
///     quantum
/// });
/// assert_eq!(done, 1000);
/// assert_eq!(throttle.quantum(), 100); // clamped to the default floor
/// ```
#[derive(Clone, Debug)]
pub struct WorkThrottle {
    quantum: usize,
    ideal: Duration,
    floor: usize,
}

impl WorkThrottle {
    /// Creates a throttle starting at `initial_quantum` units, targeting
    /// `ideal` wall-clock time per batch, with the default floor.
    ///
    /// The starting quantum is taken as given (though never zero); the floor
    /// applies as measurements arrive.
    #[must_use]
    pub fn new(initial_quantum: usize, ideal: Duration) -> Self {
        Self {
            quantum: initial_quantum.max(1),
            ideal,
            floor: DEFAULT_FLOOR,
        }
    }

    /// Replaces the minimum quantum.
    ///
    /// The floor must be at least 1: a zero quantum would stall progress
    /// entirely.
    #[must_use]
    pub fn with_floor(mut self, floor: usize) -> Self {
        self.floor = floor.max(1);
        self
    }

    /// The unit budget the next batch should attempt.
    #[must_use]
    pub const fn quantum(&self) -> usize {
        self.quantum
    }

    /// The wall-clock duration batches are tuned toward.
    #[must_use]
    pub const fn ideal_duration(&self) -> Duration {
        self.ideal
    }

    /// Feeds one batch measurement back into the controller.
    ///
    /// `completed` is how many units the batch actually finished (possibly
    /// fewer than the quantum if it drained the queue); `elapsed` is its
    /// measured wall-clock time. Zero on either side is ignored.
    pub fn record(&mut self, completed: usize, elapsed: Duration) {
        if completed == 0 || elapsed.is_zero() {
            return;
        }
        let quantum = self.quantum as u128;
        let estimated_full =
            (elapsed.as_nanos().saturating_mul(quantum) / completed as u128).max(1);
        let new_quantum = quantum.saturating_mul(self.ideal.as_nanos()) / estimated_full;
        let clamped = new_quantum.clamp(self.floor as u128, usize::MAX as u128);
        self.quantum = usize::try_from(clamped).unwrap_or(usize::MAX);
    }

    /// Runs one batch: hands the current quantum to `work`, measures it with
    /// `clock`, records the result, and returns the completed unit count.
    ///
    /// `work` receives the quantum and returns how many units it completed.
    pub fn run<C, F>(&mut self, clock: &C, work: F) -> usize
    where
        C: Clock,
        F: FnOnce(usize) -> usize,
    {
        let start = clock.now();
        let completed = work(self.quantum);
        let elapsed = clock.now().saturating_sub(start);
        self.record(completed, elapsed);
        completed
    }
}
