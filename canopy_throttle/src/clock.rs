// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time sources for throttle measurement.

use core::cell::Cell;
use core::time::Duration;

/// A monotonic time source.
///
/// Implementations report elapsed time since an arbitrary fixed epoch. The
/// throttle only ever subtracts two readings, so the epoch does not matter;
/// what matters is that readings never go backwards.
///
/// Injecting the clock keeps the quantizer (and everything built on it)
/// unit-testable by synchronous repeated invocation: tests drive a
/// [`ManualClock`] instead of sleeping.
pub trait Clock {
    /// Current time since the clock's epoch.
    fn now(&self) -> Duration;
}

/// A clock advanced explicitly by the caller.
///
/// Intended for tests and deterministic simulations, where wall-clock time
/// would make batch sizing nondeterministic.
#[derive(Debug, Default)]
pub struct ManualClock(Cell<Duration>);

impl ManualClock {
    /// Creates a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self(Cell::new(Duration::ZERO))
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }

    /// Sets the clock to an absolute reading.
    ///
    /// Readings must not go backwards; debug builds assert this.
    pub fn set(&self, to: Duration) {
        debug_assert!(to >= self.0.get(), "ManualClock must be monotonic");
        self.0.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

/// A wall-clock source backed by [`std::time::Instant`].
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicClock(std::time::Instant);

#[cfg(feature = "std")]
impl MonotonicClock {
    /// Creates a clock whose epoch is the moment of construction.
    #[must_use]
    pub fn new() -> Self {
        Self(std::time::Instant::now())
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.0.elapsed()
    }
}
