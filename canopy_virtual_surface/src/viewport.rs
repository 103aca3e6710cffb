// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport state and the derivation of the content-space visible rectangle.

use kurbo::{Rect, Size, Vec2};

/// Scale components below this are clamped; a zero scale would make the
/// visible rectangle unbounded.
pub const MIN_SCALE: f64 = 1e-6;

/// The host-supplied view onto the content: scroll offset, viewport size,
/// and per-axis zoom.
///
/// `scroll` and `size` are in device space; `scale` maps content space to
/// device space (`device = content * scale`), so zooming in means a scale
/// greater than one. A uniform zoom just sets both components equal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Scroll offset in device space.
    pub scroll: Vec2,
    /// Viewport size in device space.
    pub size: Size,
    /// Per-axis content-to-device scale factor.
    pub scale: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll: Vec2::ZERO,
            size: Size::ZERO,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl Viewport {
    /// Creates a viewport from scroll offset, size, and scale.
    #[must_use]
    pub fn new(scroll: Vec2, size: Size, scale: Vec2) -> Self {
        Self {
            scroll,
            size,
            scale,
        }
    }

    /// The content-space rectangle this viewport exposes, inflated by
    /// `overscan` on every edge.
    ///
    /// The margin exists so that items with even a sliver inside the
    /// viewport get a visual; without it, pixel rounding makes edge items
    /// flicker in and out while scrolling.
    ///
    /// A viewport that has no size yet (before first layout) exposes
    /// nothing, not a margin-sized sliver around the scroll origin.
    #[must_use]
    pub fn visible_rect(&self, overscan: f64) -> Rect {
        if self.size.width <= 0.0 || self.size.height <= 0.0 {
            return Rect::ZERO;
        }
        let sx = self.scale.x.max(MIN_SCALE);
        let sy = self.scale.y.max(MIN_SCALE);
        Rect::new(
            self.scroll.x / sx,
            self.scroll.y / sy,
            (self.scroll.x + self.size.width) / sx,
            (self.scroll.y + self.size.height) / sy,
        )
        .inflate(overscan, overscan)
    }
}
