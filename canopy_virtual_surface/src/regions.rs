// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle algebra for pending/dirty region tracking.

use alloc::collections::VecDeque;
use kurbo::Rect;
use smallvec::SmallVec;

/// Overlap margin between the halves of a split region, so items on the cut
/// line are seen by both halves.
pub(crate) const SPLIT_OVERLAP: f64 = 10.0;

/// The part of `outer` not covered by `hole`, as up to four axis-aligned
/// strips: full-height strips left and right of the intersection, plus
/// top/bottom strips spanning the intersection's width.
///
/// The strips are disjoint and cover `outer - hole` exactly, so diffing two
/// visible rectangles with this in both directions never under-invalidates.
pub(crate) fn subtract(outer: Rect, hole: Rect) -> SmallVec<[Rect; 4]> {
    let mut out = SmallVec::new();
    if outer.width() <= 0.0 || outer.height() <= 0.0 {
        return out;
    }
    let inter = outer.intersect(hole);
    if inter.width() <= 0.0 || inter.height() <= 0.0 {
        out.push(outer);
        return out;
    }
    if inter.x0 > outer.x0 {
        out.push(Rect::new(outer.x0, outer.y0, inter.x0, outer.y1));
    }
    if inter.x1 < outer.x1 {
        out.push(Rect::new(inter.x1, outer.y0, outer.x1, outer.y1));
    }
    if inter.y0 > outer.y0 {
        out.push(Rect::new(inter.x0, outer.y0, inter.x1, inter.y0));
    }
    if inter.y1 < outer.y1 {
        out.push(Rect::new(inter.x0, inter.y1, inter.x1, outer.y1));
    }
    out
}

/// Bisects `rect` along its longer dimension into two halves that overlap by
/// [`SPLIT_OVERLAP`]-sized margins around the cut.
pub(crate) fn split_longest(rect: Rect, overlap: f64) -> (Rect, Rect) {
    if rect.width() >= rect.height() {
        let mid = 0.5 * (rect.x0 + rect.x1);
        (
            Rect::new(rect.x0, rect.y0, (mid + overlap).min(rect.x1), rect.y1),
            Rect::new((mid - overlap).max(rect.x0), rect.y0, rect.x1, rect.y1),
        )
    } else {
        let mid = 0.5 * (rect.y0 + rect.y1);
        (
            Rect::new(rect.x0, rect.y0, rect.x1, (mid + overlap).min(rect.y1)),
            Rect::new(rect.x0, (mid - overlap).max(rect.y0), rect.x1, rect.y1),
        )
    }
}

/// Puts an unfinished region back on its queue.
///
/// When other regions are waiting, the region goes whole to the back so each
/// queued region gets a turn per quantum (fairness). When it is the only
/// region, it is bisected so an arbitrarily large region cannot pin every
/// future pass on one giant re-query; regions already near the overlap
/// margin in size are requeued whole instead.
pub(crate) fn requeue(queue: &mut VecDeque<Rect>, region: Rect) {
    if queue.is_empty() && region.width().max(region.height()) > 2.0 * SPLIT_OVERLAP {
        let (a, b) = split_longest(region, SPLIT_OVERLAP);
        queue.push_back(a);
        queue.push_back(b);
    } else {
        queue.push_back(region);
    }
}
