// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry validation shared by the tree and by higher layers.

use kurbo::Rect;
use thiserror::Error;

/// Error raised when a rectangle cannot participate in spatial indexing.
///
/// A malformed rectangle would silently corrupt subdivision decisions, so it
/// is rejected at the call that introduced it rather than clamped or skipped.
#[derive(Copy, Clone, Debug, PartialEq, Error)]
pub enum BoundsError {
    /// A coordinate was NaN or infinite.
    #[error("bounds are not finite: {0:?}")]
    NonFinite(Rect),
    /// Width or height was zero or negative.
    #[error("bounds must have positive width and height: {0:?}")]
    Degenerate(Rect),
}

/// Checks that `bounds` is finite with strictly positive width and height.
///
/// Positive extents are also what guarantees that quad-tree descent
/// terminates: child quadrants halve per level, so a rectangle with positive
/// width and height eventually fails containment in every child.
pub fn validate_bounds(bounds: Rect) -> Result<(), BoundsError> {
    if !bounds.is_finite() {
        return Err(BoundsError::NonFinite(bounds));
    }
    if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
        return Err(BoundsError::Degenerate(bounds));
    }
    Ok(())
}
