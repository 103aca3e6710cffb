// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The virtualization controller: collection, index, region queues, passes.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;
use core::mem;
use core::time::Duration;

use canopy_quadtree::{BoundsError, QuadTree, validate_bounds};
use canopy_throttle::{Clock, WorkThrottle};
use hashbrown::HashMap;
use kurbo::{Rect, Size, Vec2};

use crate::host::VisualHost;
use crate::regions::{requeue, subtract};
use crate::viewport::Viewport;

/// Tuning knobs for a [`VirtualSurface`].
///
/// The quanta are starting points only; each pass adapts its own quantum
/// toward `ideal_duration` as it measures real batches.
#[derive(Clone, Debug)]
pub struct SurfaceConfig {
    /// Content-space margin added to every edge of the visible rectangle.
    pub overscan: f64,
    /// Wall-clock budget each quantized pass is tuned toward.
    pub ideal_duration: Duration,
    /// Initial unit budget for the visual-creation pass.
    pub create_quantum: usize,
    /// Initial unit budget for the eviction pass.
    pub evict_quantum: usize,
    /// Initial unit budget for the consistency sweep.
    pub sweep_quantum: usize,
    /// Minimum quantum for all three passes.
    pub quantum_floor: usize,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            overscan: 8.0,
            ideal_duration: Duration::from_millis(50),
            create_quantum: 1000,
            evict_quantum: 2000,
            sweep_quantum: 5000,
            quantum_floor: 100,
        }
    }
}

/// Result of one [`VirtualSurface::reconcile`] call.
///
/// The host's scheduler (or a test harness) is responsible for loop-driving
/// reconciliation: call again on the next idle tick while this is
/// [`Working`][Self::Working].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum Reconcile {
    /// Regions or the sweep remain; schedule another call.
    Working,
    /// Queues are drained and the sweep has completed a full pass.
    Done,
}

impl Reconcile {
    /// Returns `true` if no further work is scheduled.
    #[must_use]
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns `true` if another call is needed.
    #[must_use]
    pub const fn is_working(self) -> bool {
        matches!(self, Self::Working)
    }
}

#[derive(Copy, Clone, Debug)]
struct ItemEntry<I> {
    id: I,
    bounds: Rect,
}

/// A virtualized 2D surface: holds an effectively unbounded collection of
/// positioned items while only materializing visuals for those intersecting
/// the viewport.
///
/// The surface owns the logical collection (insertion order is stacking
/// order), a [`QuadTree`] rebuilt on structural change, the current visible
/// rectangle, and queues of pending (newly visible) and dirty (newly
/// invisible) regions. [`reconcile`][Self::reconcile] drains those queues in
/// time-budgeted batches through per-pass [`WorkThrottle`]s, creating and
/// disposing visuals via the caller's [`VisualHost`].
///
/// Scrolling and zooming are diffed into edge strips, so a small scroll
/// never re-examines the whole viewport. The diff can over-invalidate on
/// combined scroll-and-zoom steps but never under-invalidates; anything
/// over-enqueued is filtered by the liveness checks in the passes.
///
/// Item bounds may only change through
/// [`update_bounds`][Self::update_bounds]; mutating bounds behind the
/// surface's back leaves the index stale until the next structural rebuild.
///
/// ## Example
///
/// ```rust
/// use canopy_throttle::ManualClock;
/// use canopy_virtual_surface::{Viewport, VirtualSurface, VisualHost};
/// use kurbo::{Rect, Size, Vec2};
///
/// struct Printer;
///
/// impl VisualHost<u32> for Printer {
///     fn create_visual(&mut self, id: u32, index: usize) {
///         println!("create {id} at {index}");
///     }
///     fn dispose_visual(&mut self, id: u32) {
///         println!("dispose {id}");
///     }
/// }
///
/// let mut surface: VirtualSurface<u32> = VirtualSurface::new();
/// for i in 0..100 {
///     let y = f64::from(i) * 30.0;
///     surface.push(i, Rect::new(0.0, y, 200.0, y + 25.0))?;
/// }
/// surface.set_viewport(Viewport::new(
///     Vec2::ZERO,
///     Size::new(200.0, 120.0),
///     Vec2::new(1.0, 1.0),
/// ));
///
/// let clock = ManualClock::new();
/// let mut host = Printer;
/// while surface.reconcile(&mut host, &clock).is_working() {}
///
/// // Only the rows overlapping the 120px viewport (plus overscan) exist.
/// assert!(surface.realized_count() < 10);
/// assert_eq!(surface.extent(), Size::new(200.0, 2995.0));
/// # Ok::<(), canopy_virtual_surface::BoundsError>(())
/// ```
pub struct VirtualSurface<I: Copy + Eq + Hash + Debug> {
    /// Logical collection in stacking order.
    items: Vec<ItemEntry<I>>,
    /// item -> position in `items`; rebuilt per structural change.
    order: HashMap<I, usize>,
    /// Spatial index over current item bounds; `None` while empty.
    index: Option<QuadTree<I>>,
    /// Union of all item bounds as of the last rebuild.
    content_bounds: Rect,
    viewport: Viewport,
    overscan: f64,
    /// Live visible rectangle (content space, overscan included).
    visible: Rect,
    pending: VecDeque<Rect>,
    dirty: VecDeque<Rect>,
    /// Items currently owning visuals, sorted by stacking order.
    realized: Vec<I>,
    create_throttle: WorkThrottle,
    evict_throttle: WorkThrottle,
    sweep_throttle: WorkThrottle,
    sweep_cursor: usize,
    sweep_done: bool,
    structure_valid: bool,
}

impl<I: Copy + Eq + Hash + Debug> Debug for VirtualSurface<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VirtualSurface")
            .field("items", &self.items.len())
            .field("realized", &self.realized.len())
            .field("pending", &self.pending.len())
            .field("dirty", &self.dirty.len())
            .field("visible", &self.visible)
            .field("structure_valid", &self.structure_valid)
            .finish_non_exhaustive()
    }
}

impl<I: Copy + Eq + Hash + Debug> Default for VirtualSurface<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Copy + Eq + Hash + Debug> VirtualSurface<I> {
    /// Creates an empty surface with [`SurfaceConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SurfaceConfig::default())
    }

    /// Creates an empty surface with explicit tuning.
    #[must_use]
    pub fn with_config(config: SurfaceConfig) -> Self {
        let throttle = |quantum: usize| {
            WorkThrottle::new(quantum, config.ideal_duration).with_floor(config.quantum_floor)
        };
        Self {
            items: Vec::new(),
            order: HashMap::new(),
            index: None,
            content_bounds: Rect::ZERO,
            viewport: Viewport::default(),
            overscan: config.overscan.max(0.0),
            visible: Rect::ZERO,
            pending: VecDeque::new(),
            dirty: VecDeque::new(),
            realized: Vec::new(),
            create_throttle: throttle(config.create_quantum),
            evict_throttle: throttle(config.evict_quantum),
            sweep_throttle: throttle(config.sweep_quantum),
            sweep_cursor: 0,
            sweep_done: true,
            structure_valid: true,
        }
    }

    /// Number of items in the logical collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends an item on top of the stacking order.
    ///
    /// Fails on non-finite or zero-area bounds, leaving the surface
    /// unchanged. Ids must be unique within the collection; debug builds
    /// assert this.
    pub fn push(&mut self, id: I, bounds: Rect) -> Result<(), BoundsError> {
        validate_bounds(bounds)?;
        debug_assert!(
            !self.items.iter().any(|e| e.id == id),
            "item ids must be unique"
        );
        self.items.push(ItemEntry { id, bounds });
        self.invalidate_structure();
        Ok(())
    }

    /// Removes an item from the collection, returning whether it existed.
    ///
    /// Its visual, if currently live, is disposed during the next
    /// [`reconcile`][Self::reconcile].
    pub fn remove(&mut self, id: &I) -> bool {
        let Some(pos) = self.items.iter().position(|e| e.id == *id) else {
            return false;
        };
        self.items.remove(pos);
        self.invalidate_structure();
        true
    }

    /// Replaces the whole collection, discarding in-flight region queues.
    ///
    /// Bounds are validated before anything is replaced, so a bad entry
    /// leaves the previous collection intact.
    pub fn set_items<T>(&mut self, items: T) -> Result<(), BoundsError>
    where
        T: IntoIterator<Item = (I, Rect)>,
    {
        let mut next = Vec::new();
        for (id, bounds) in items {
            validate_bounds(bounds)?;
            next.push(ItemEntry { id, bounds });
        }
        self.items = next;
        self.invalidate_structure();
        Ok(())
    }

    /// Empties the collection.
    pub fn clear(&mut self) {
        self.items.clear();
        self.invalidate_structure();
    }

    /// The sanctioned bounds-change notification.
    ///
    /// Reindexes the item and marks its old position dirty and its new
    /// position pending, so visuals follow the move on subsequent
    /// reconcile calls. Returns `Ok(false)` for an unknown item. Growth
    /// beyond the current content bounds escalates to a full structural
    /// rebuild, since the quadrant subdivision derives from the extent.
    pub fn update_bounds(&mut self, id: I, bounds: Rect) -> Result<bool, BoundsError> {
        validate_bounds(bounds)?;
        let Some(pos) = self.position_of(&id) else {
            return Ok(false);
        };
        let old = mem::replace(&mut self.items[pos].bounds, bounds);
        if old == bounds || !self.structure_valid {
            return Ok(true);
        }
        if self.content_bounds.contains_rect(bounds) {
            if let Some(index) = self.index.as_mut() {
                let reindexed = index.insert(id, bounds);
                debug_assert!(reindexed.is_ok(), "validated bounds cannot fail reindexing");
            }
            self.dirty.push_back(old);
            self.pending.push_back(bounds);
            self.restart_sweep();
        } else {
            self.invalidate_structure();
        }
        Ok(true)
    }

    /// Replaces the viewport, diffing the old and new visible rectangles
    /// into pending and dirty strips.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.update_visible();
    }

    /// Scrolls to an absolute device-space offset.
    pub fn scroll_to(&mut self, scroll: Vec2) {
        let mut viewport = self.viewport;
        viewport.scroll = scroll;
        self.set_viewport(viewport);
    }

    /// Resizes the viewport.
    pub fn set_viewport_size(&mut self, size: Size) {
        let mut viewport = self.viewport;
        viewport.size = size;
        self.set_viewport(viewport);
    }

    /// Changes the per-axis zoom.
    pub fn set_scale(&mut self, scale: Vec2) {
        let mut viewport = self.viewport;
        viewport.scale = scale;
        self.set_viewport(viewport);
    }

    /// The current viewport.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The live content-space visible rectangle, overscan included.
    #[must_use]
    pub fn visible_rect(&self) -> Rect {
        self.visible
    }

    /// Total content extent for scrollbar range computation.
    ///
    /// Measured from the origin to the far corner of the content bounds, as
    /// of the last structural rebuild.
    #[must_use]
    pub fn extent(&self) -> Size {
        Size::new(
            self.content_bounds.x1.max(0.0),
            self.content_bounds.y1.max(0.0),
        )
    }

    /// Union of all item bounds, as of the last structural rebuild.
    #[must_use]
    pub fn content_bounds(&self) -> Rect {
        self.content_bounds
    }

    /// Items whose bounds intersect `rect`, independent of virtualization
    /// state; usable by the host for hit-testing.
    ///
    /// Falls back to a linear scan while the index awaits a rebuild, so the
    /// answer always reflects the latest logical mutations.
    pub fn items_intersecting(&self, rect: Rect) -> impl Iterator<Item = I> + '_ {
        let mut out = Vec::new();
        if self.structure_valid && self.index.is_some() {
            if let Some(index) = self.index.as_ref() {
                out.extend(index.items_intersecting(rect).map(|(id, _)| id));
            }
        } else if rect.is_finite() && rect.width() > 0.0 && rect.height() > 0.0 {
            out.extend(
                self.items
                    .iter()
                    .filter(|e| e.bounds.overlaps(rect))
                    .map(|e| e.id),
            );
        }
        out.into_iter()
    }

    /// Items currently owning a visual, in stacking order.
    pub fn realized(&self) -> impl Iterator<Item = I> + '_ {
        self.realized.iter().copied()
    }

    /// Number of items currently owning a visual.
    #[must_use]
    pub fn realized_count(&self) -> usize {
        self.realized.len()
    }

    /// Returns `true` if `id` currently owns a visual.
    #[must_use]
    pub fn is_realized(&self, id: &I) -> bool {
        self.realized.contains(id)
    }

    /// Queued newly-visible regions awaiting visual creation.
    pub fn pending_regions(&self) -> impl Iterator<Item = Rect> + '_ {
        self.pending.iter().copied()
    }

    /// Queued newly-invisible regions awaiting visual disposal.
    pub fn dirty_regions(&self) -> impl Iterator<Item = Rect> + '_ {
        self.dirty.iter().copied()
    }

    /// Returns `true` if a [`reconcile`][Self::reconcile] call would do work.
    #[must_use]
    pub fn has_work(&self) -> bool {
        !self.structure_valid
            || !self.pending.is_empty()
            || !self.dirty.is_empty()
            || !self.sweep_done
    }

    /// Runs one cooperative reconciliation pass.
    ///
    /// Each call performs at most one quantized batch — a structural
    /// rebuild, an eviction batch, a creation batch, or a slice of the
    /// consistency sweep — so the caller's thread is never blocked for much
    /// longer than one measured quantum. Call again while the result
    /// [`is_working`][Reconcile::is_working]; the throttles re-size their
    /// quanta from the measurements `clock` provides.
    pub fn reconcile<H, C>(&mut self, host: &mut H, clock: &C) -> Reconcile
    where
        H: VisualHost<I>,
        C: Clock,
    {
        if !self.structure_valid {
            self.rebuild(host);
            return Reconcile::Working;
        }
        if !self.dirty.is_empty() {
            let start = clock.now();
            let quantum = self.evict_throttle.quantum();
            let evicted = self.drain_dirty(host, quantum);
            self.evict_throttle
                .record(evicted, clock.now().saturating_sub(start));
            return self.status();
        }
        if !self.pending.is_empty() {
            let start = clock.now();
            let quantum = self.create_throttle.quantum();
            let created = self.drain_pending(host, quantum);
            self.create_throttle
                .record(created, clock.now().saturating_sub(start));
            return self.status();
        }
        if !self.sweep_done {
            let start = clock.now();
            let quantum = self.sweep_throttle.quantum();
            let examined = self.sweep(host, quantum);
            self.sweep_throttle
                .record(examined, clock.now().saturating_sub(start));
            return self.status();
        }
        Reconcile::Done
    }

    fn status(&self) -> Reconcile {
        if self.has_work() {
            Reconcile::Working
        } else {
            Reconcile::Done
        }
    }

    fn position_of(&self, id: &I) -> Option<usize> {
        if self.structure_valid {
            self.order.get(id).copied()
        } else {
            self.items.iter().position(|e| e.id == *id)
        }
    }

    fn invalidate_structure(&mut self) {
        self.structure_valid = false;
    }

    fn restart_sweep(&mut self) {
        self.sweep_cursor = 0;
        self.sweep_done = false;
    }

    fn update_visible(&mut self) {
        let new_visible = self.viewport.visible_rect(self.overscan);
        if new_visible == self.visible {
            return;
        }
        let old = mem::replace(&mut self.visible, new_visible);
        for strip in subtract(old, new_visible) {
            self.dirty.push_back(strip);
        }
        for strip in subtract(new_visible, old) {
            self.pending.push_back(strip);
        }
        self.restart_sweep();
    }

    /// Full structural rebuild: order table, content bounds, spatial index.
    ///
    /// Unconditionally discards in-flight queues and reseeds them with the
    /// visible rectangle; there is no partial-cancellation path.
    fn rebuild<H: VisualHost<I>>(&mut self, host: &mut H) {
        self.order.clear();
        for (position, entry) in self.items.iter().enumerate() {
            self.order.insert(entry.id, position);
        }

        // Visuals of items that left the collection can no longer be
        // reached through region tracking; dispose them now. Survivors are
        // re-sorted under the new stacking order so ordered insertion stays
        // coherent.
        let mut survivors = Vec::with_capacity(self.realized.len());
        for id in mem::take(&mut self.realized) {
            if self.order.contains_key(&id) {
                survivors.push(id);
            } else {
                host.dispose_visual(id);
            }
        }
        survivors.sort_by_key(|id| self.order.get(id).copied().unwrap_or(usize::MAX));
        self.realized = survivors;

        let mut content: Option<Rect> = None;
        for entry in &self.items {
            debug_assert!(
                entry.bounds.is_finite(),
                "non-finite bounds slipped past validation"
            );
            content = Some(match content {
                Some(acc) => acc.union(entry.bounds),
                None => entry.bounds,
            });
        }
        self.content_bounds = content.unwrap_or(Rect::ZERO);
        self.index = content.and_then(|bounds| {
            let mut tree = QuadTree::new(bounds).ok()?;
            for entry in &self.items {
                tree.insert(entry.id, entry.bounds).ok()?;
            }
            Some(tree)
        });
        debug_assert_eq!(
            self.index.is_some(),
            !self.items.is_empty(),
            "index construction from validated bounds cannot fail"
        );

        self.pending.clear();
        self.dirty.clear();
        if self.visible.width() > 0.0 && self.visible.height() > 0.0 {
            // The previous visible region is entirely suspect after a
            // structural change: re-check it for both eviction and creation.
            self.dirty.push_back(self.visible);
            self.pending.push_back(self.visible);
        }
        self.restart_sweep();
        self.structure_valid = true;
    }

    /// Creates visuals for items inside pending regions, up to `quota`.
    fn drain_pending<H: VisualHost<I>>(&mut self, host: &mut H, quota: usize) -> usize {
        let mut created = 0;
        'regions: while created < quota {
            let Some(region) = self.pending.pop_front() else {
                break;
            };
            let candidates: Vec<(I, Rect)> = match self.index.as_ref() {
                Some(index) => index.items_intersecting(region).collect(),
                None => continue,
            };
            for (id, bounds) in candidates {
                // A queued strip may have scrolled back out of view; drain
                // it as a no-op instead of materializing offscreen visuals.
                if !bounds.overlaps(self.visible) {
                    continue;
                }
                if self.is_materialized(id) {
                    continue;
                }
                if created == quota {
                    requeue(&mut self.pending, region);
                    break 'regions;
                }
                self.materialize(host, id);
                created += 1;
            }
        }
        created
    }

    /// Disposes visuals for items inside dirty regions that no longer
    /// intersect the visible rectangle, up to `quota`.
    fn drain_dirty<H: VisualHost<I>>(&mut self, host: &mut H, quota: usize) -> usize {
        let mut evicted = 0;
        'regions: while evicted < quota {
            let Some(region) = self.dirty.pop_front() else {
                break;
            };
            let candidates: Vec<(I, Rect)> = match self.index.as_ref() {
                Some(index) => index.items_intersecting(region).collect(),
                None => continue,
            };
            for (id, bounds) in candidates {
                if bounds.overlaps(self.visible) {
                    continue;
                }
                if !self.is_materialized(id) {
                    continue;
                }
                if evicted == quota {
                    requeue(&mut self.dirty, region);
                    break 'regions;
                }
                self.unmaterialize(host, id);
                evicted += 1;
            }
        }
        evicted
    }

    /// Linear consistency sweep over realized visuals.
    ///
    /// Safety net for visuals that escaped region tracking, such as an item
    /// moved by [`update_bounds`][Self::update_bounds] whose new bounds no
    /// longer fall in any dirty region query. Counts examined visuals, not
    /// disposals, so a clean pass still feeds the throttle.
    fn sweep<H: VisualHost<I>>(&mut self, host: &mut H, quota: usize) -> usize {
        let mut examined = 0;
        while examined < quota && self.sweep_cursor < self.realized.len() {
            let id = self.realized[self.sweep_cursor];
            let bounds = self
                .order
                .get(&id)
                .and_then(|&position| self.items.get(position))
                .map(|entry| entry.bounds);
            match bounds {
                Some(bounds) if bounds.overlaps(self.visible) => self.sweep_cursor += 1,
                // Removal shifts the next visual into the cursor slot.
                _ => self.unmaterialize(host, id),
            }
            examined += 1;
        }
        if self.sweep_cursor >= self.realized.len() {
            self.sweep_done = true;
        }
        examined
    }

    fn stacking_position(&self, id: &I) -> Option<usize> {
        self.order.get(id).copied()
    }

    fn is_materialized(&self, id: I) -> bool {
        let Some(position) = self.stacking_position(&id) else {
            return false;
        };
        self.realized
            .binary_search_by_key(&position, |r| {
                self.order.get(r).copied().unwrap_or(usize::MAX)
            })
            .is_ok()
    }

    /// Creates the visual for `id`, inserting it into the realized list at
    /// its stacking position via binary search.
    fn materialize<H: VisualHost<I>>(&mut self, host: &mut H, id: I) {
        let Some(position) = self.stacking_position(&id) else {
            debug_assert!(false, "materializing an item outside the collection");
            return;
        };
        match self.realized.binary_search_by_key(&position, |r| {
            self.order.get(r).copied().unwrap_or(usize::MAX)
        }) {
            Ok(_) => {}
            Err(slot) => {
                self.realized.insert(slot, id);
                host.create_visual(id, slot);
            }
        }
    }

    /// Disposes the visual for `id`, removing it from the realized list.
    fn unmaterialize<H: VisualHost<I>>(&mut self, host: &mut H, id: I) {
        let slot = match self.stacking_position(&id) {
            Some(position) => self
                .realized
                .binary_search_by_key(&position, |r| {
                    self.order.get(r).copied().unwrap_or(usize::MAX)
                })
                .ok(),
            // The item has left the collection; fall back to a linear scan.
            None => self.realized.iter().position(|r| *r == id),
        };
        if let Some(slot) = slot {
            self.realized.remove(slot);
            host.dispose_visual(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Reconcile, SurfaceConfig, VirtualSurface};
    use crate::host::VisualHost;
    use crate::viewport::Viewport;
    use alloc::vec::Vec;
    use canopy_quadtree::BoundsError;
    use canopy_throttle::ManualClock;
    use kurbo::{Rect, Size, Vec2};

    /// Host double that mirrors the ordered insertions it is asked to make.
    #[derive(Default)]
    struct RecordingHost {
        live: Vec<u32>,
        created: usize,
        disposed: usize,
    }

    impl VisualHost<u32> for RecordingHost {
        fn create_visual(&mut self, id: u32, index: usize) {
            assert!(index <= self.live.len(), "insertion index out of range");
            self.live.insert(index, id);
            self.created += 1;
        }

        fn dispose_visual(&mut self, id: u32) {
            let position = self
                .live
                .iter()
                .position(|v| *v == id)
                .expect("disposing an unknown visual");
            self.live.remove(position);
            self.disposed += 1;
        }
    }

    fn drive(
        surface: &mut VirtualSurface<u32>,
        host: &mut RecordingHost,
        clock: &ManualClock,
    ) -> usize {
        let mut ticks = 0;
        while surface.reconcile(host, clock).is_working() {
            ticks += 1;
            assert!(ticks < 10_000, "reconcile failed to converge");
        }
        ticks
    }

    /// 20x20 grid of 40x40 items in 50px cells; id = row * 20 + column.
    fn push_grid(surface: &mut VirtualSurface<u32>) {
        for row in 0..20_u32 {
            for column in 0..20_u32 {
                let x = f64::from(column) * 50.0;
                let y = f64::from(row) * 50.0;
                surface
                    .push(row * 20 + column, Rect::new(x, y, x + 40.0, y + 40.0))
                    .unwrap();
            }
        }
    }

    fn grid_cell(id: u32) -> Rect {
        let x = f64::from(id % 20) * 50.0;
        let y = f64::from(id / 20) * 50.0;
        Rect::new(x, y, x + 40.0, y + 40.0)
    }

    /// Grid ids whose cells intersect `rect`, in stacking (insertion) order.
    fn grid_oracle(rect: Rect) -> Vec<u32> {
        (0..400).filter(|id| grid_cell(*id).overlaps(rect)).collect()
    }

    fn viewport_100() -> Viewport {
        Viewport::new(Vec2::ZERO, Size::new(100.0, 100.0), Vec2::new(1.0, 1.0))
    }

    #[test]
    fn realizes_exactly_the_visible_items() {
        let mut surface = VirtualSurface::new();
        let mut host = RecordingHost::default();
        let clock = ManualClock::new();
        push_grid(&mut surface);
        surface.set_viewport(viewport_100());
        drive(&mut surface, &mut host, &clock);

        let expected = grid_oracle(surface.visible_rect());
        assert!(!expected.is_empty());
        // Stacking order equals ascending id here, so the host's list must
        // match the oracle exactly, not just as a set.
        assert_eq!(host.live, expected);
        assert_eq!(surface.realized().collect::<Vec<_>>(), expected);
        assert_eq!(host.created, expected.len());
        assert_eq!(host.disposed, 0);
    }

    #[test]
    fn one_pixel_scroll_produces_one_pixel_strips() {
        let mut surface = VirtualSurface::new();
        let mut host = RecordingHost::default();
        let clock = ManualClock::new();
        push_grid(&mut surface);
        surface.set_viewport(viewport_100());
        drive(&mut surface, &mut host, &clock);

        let old = surface.visible_rect();
        surface.scroll_to(Vec2::new(1.0, 0.0));
        let new = surface.visible_rect();

        let pending: Vec<Rect> = surface.pending_regions().collect();
        assert_eq!(pending, &[Rect::new(old.x1, new.y0, new.x1, new.y1)]);
        assert!((pending[0].width() - 1.0).abs() < 1e-12);

        let dirty: Vec<Rect> = surface.dirty_regions().collect();
        assert_eq!(dirty, &[Rect::new(old.x0, old.y0, new.x0, old.y1)]);
        assert!((dirty[0].width() - 1.0).abs() < 1e-12);

        drive(&mut surface, &mut host, &clock);
        assert_eq!(host.live, grid_oracle(new));
    }

    #[test]
    fn host_order_matches_logical_order_despite_query_order() {
        let mut surface = VirtualSurface::new();
        let mut host = RecordingHost::default();
        let clock = ManualClock::new();

        // A backdrop pushed first stays at the quadtree root and is surfaced
        // *after* the deeply-nested tiles by queries; the host must still
        // see it at stacking position 0.
        surface.push(0, Rect::new(0.0, 0.0, 500.0, 500.0)).unwrap();
        for i in 1..=5_u32 {
            let x = f64::from(i) * 20.0;
            surface.push(i, Rect::new(x, 20.0, x + 10.0, 30.0)).unwrap();
        }
        surface.set_viewport(Viewport::new(
            Vec2::ZERO,
            Size::new(500.0, 500.0),
            Vec2::new(1.0, 1.0),
        ));
        drive(&mut surface, &mut host, &clock);

        assert_eq!(host.live, &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn tiny_quantum_still_terminates_by_splitting() {
        let config = SurfaceConfig {
            create_quantum: 1,
            evict_quantum: 1,
            sweep_quantum: 1,
            quantum_floor: 1,
            ..SurfaceConfig::default()
        };
        let mut surface = VirtualSurface::with_config(config);
        let mut host = RecordingHost::default();
        let clock = ManualClock::new();
        push_grid(&mut surface);
        // Everything visible at once: one huge pending region, one-unit
        // quantum.
        surface.set_viewport(Viewport::new(
            Vec2::ZERO,
            Size::new(1000.0, 1000.0),
            Vec2::new(1.0, 1.0),
        ));
        let ticks = drive(&mut surface, &mut host, &clock);

        assert_eq!(host.live, grid_oracle(surface.visible_rect()));
        assert_eq!(host.live.len(), 400);
        assert!(ticks >= 400, "one creation per tick at quantum 1");
    }

    #[test]
    fn scrolling_away_evicts_visuals() {
        let mut surface = VirtualSurface::new();
        let mut host = RecordingHost::default();
        let clock = ManualClock::new();
        push_grid(&mut surface);
        surface.set_viewport(viewport_100());
        drive(&mut surface, &mut host, &clock);
        let first = host.live.clone();

        surface.scroll_to(Vec2::new(500.0, 500.0));
        drive(&mut surface, &mut host, &clock);

        assert_eq!(host.live, grid_oracle(surface.visible_rect()));
        assert_eq!(host.disposed, first.len(), "the old viewport fully vacated");
        assert!(first.iter().all(|id| !surface.is_realized(id)));
    }

    #[test]
    fn sweep_disposes_visuals_moved_out_from_under_region_tracking() {
        let mut surface = VirtualSurface::new();
        let mut host = RecordingHost::default();
        let clock = ManualClock::new();
        // Backdrop stretches the content bounds so the move below stays
        // incremental (no full rebuild).
        surface.push(0, Rect::new(0.0, 0.0, 1000.0, 1000.0)).unwrap();
        surface.push(1, Rect::new(10.0, 10.0, 30.0, 30.0)).unwrap();
        surface.set_viewport(viewport_100());
        drive(&mut surface, &mut host, &clock);
        assert!(surface.is_realized(&1));

        // After the move, the item's new bounds intersect no dirty region,
        // so only the consistency sweep can find the stale visual.
        assert_eq!(
            surface.update_bounds(1, Rect::new(800.0, 800.0, 820.0, 820.0)),
            Ok(true)
        );
        drive(&mut surface, &mut host, &clock);

        assert!(!surface.is_realized(&1));
        assert_eq!(host.live, &[0]);
    }

    #[test]
    fn moving_into_view_materializes_incrementally() {
        let mut surface = VirtualSurface::new();
        let mut host = RecordingHost::default();
        let clock = ManualClock::new();
        surface.push(0, Rect::new(0.0, 0.0, 1000.0, 1000.0)).unwrap();
        surface.push(1, Rect::new(800.0, 800.0, 820.0, 820.0)).unwrap();
        surface.set_viewport(viewport_100());
        drive(&mut surface, &mut host, &clock);
        assert!(!surface.is_realized(&1));

        assert_eq!(
            surface.update_bounds(1, Rect::new(10.0, 10.0, 30.0, 30.0)),
            Ok(true)
        );
        drive(&mut surface, &mut host, &clock);
        assert!(surface.is_realized(&1));
        assert_eq!(host.live, &[0, 1]);
    }

    #[test]
    fn removing_an_item_disposes_its_visual_on_rebuild() {
        let mut surface = VirtualSurface::new();
        let mut host = RecordingHost::default();
        let clock = ManualClock::new();
        push_grid(&mut surface);
        surface.set_viewport(viewport_100());
        drive(&mut surface, &mut host, &clock);
        assert!(surface.is_realized(&0));

        assert!(surface.remove(&0));
        assert!(!surface.remove(&0));
        drive(&mut surface, &mut host, &clock);

        assert!(!surface.is_realized(&0));
        assert!(!host.live.contains(&0));
        let mut expected = grid_oracle(surface.visible_rect());
        expected.retain(|id| *id != 0);
        assert_eq!(host.live, expected);
    }

    #[test]
    fn replacing_the_collection_restarts_from_invalid() {
        let mut surface = VirtualSurface::new();
        let mut host = RecordingHost::default();
        let clock = ManualClock::new();
        push_grid(&mut surface);
        surface.set_viewport(viewport_100());
        drive(&mut surface, &mut host, &clock);
        let old_count = host.live.len();
        assert!(old_count > 0);

        // Disjoint id range; every old visual is an orphan.
        surface
            .set_items((1000..1010_u32).map(|id| {
                let x = f64::from(id - 1000) * 10.0;
                (id, Rect::new(x, 0.0, x + 8.0, 8.0))
            }))
            .unwrap();
        drive(&mut surface, &mut host, &clock);

        assert_eq!(host.disposed, old_count);
        assert_eq!(host.live, (1000..1010_u32).collect::<Vec<_>>());
        assert_eq!(surface.extent(), Size::new(98.0, 8.0));
    }

    #[test]
    fn zoom_change_tracks_the_oracle() {
        let mut surface = VirtualSurface::new();
        let mut host = RecordingHost::default();
        let clock = ManualClock::new();
        push_grid(&mut surface);
        surface.set_viewport(Viewport::new(
            Vec2::ZERO,
            Size::new(200.0, 200.0),
            Vec2::new(1.0, 1.0),
        ));
        drive(&mut surface, &mut host, &clock);

        // Zoom in: fewer content units visible, some visuals evicted.
        surface.set_scale(Vec2::new(2.0, 2.0));
        drive(&mut surface, &mut host, &clock);
        assert_eq!(host.live, grid_oracle(surface.visible_rect()));

        // Zoom out: more content visible, visuals created.
        surface.set_scale(Vec2::new(0.5, 0.5));
        drive(&mut surface, &mut host, &clock);
        assert_eq!(host.live, grid_oracle(surface.visible_rect()));
    }

    #[test]
    fn empty_surface_is_immediately_done() {
        let mut surface: VirtualSurface<u32> = VirtualSurface::new();
        let mut host = RecordingHost::default();
        let clock = ManualClock::new();
        assert_eq!(surface.reconcile(&mut host, &clock), Reconcile::Done);
        assert!(!surface.has_work());
        assert_eq!(host.created, 0);
    }

    #[test]
    fn sizeless_viewport_realizes_nothing() {
        let mut surface = VirtualSurface::new();
        let mut host = RecordingHost::default();
        let clock = ManualClock::new();
        push_grid(&mut surface);
        // No viewport set: rebuild runs, but nothing is visible.
        drive(&mut surface, &mut host, &clock);
        assert_eq!(host.created, 0);
        assert_eq!(surface.realized_count(), 0);
        assert_eq!(surface.extent(), Size::new(990.0, 990.0));
    }

    #[test]
    fn geometry_errors_surface_at_the_mutating_call() {
        let mut surface: VirtualSurface<u32> = VirtualSurface::new();
        let flat = Rect::new(0.0, 0.0, 10.0, 0.0);
        assert_eq!(surface.push(1, flat), Err(BoundsError::Degenerate(flat)));
        assert!(matches!(
            surface.push(1, Rect::new(0.0, 0.0, f64::NAN, 1.0)),
            Err(BoundsError::NonFinite(_))
        ));
        assert!(surface.is_empty());
        assert!(!surface.has_work());

        surface.push(1, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert!(matches!(
            surface.update_bounds(1, flat),
            Err(BoundsError::Degenerate(_))
        ));
        // Unknown items are a non-fatal miss, not an error.
        assert_eq!(
            surface.update_bounds(99, Rect::new(0.0, 0.0, 1.0, 1.0)),
            Ok(false)
        );
    }

    #[test]
    fn hit_testing_works_before_and_after_rebuild() {
        let mut surface = VirtualSurface::new();
        let mut host = RecordingHost::default();
        let clock = ManualClock::new();
        push_grid(&mut surface);

        let probe = Rect::new(60.0, 60.0, 130.0, 70.0);
        let expected = grid_oracle(probe);
        // Before any reconcile the index does not exist yet; the linear
        // fallback must give the same answer.
        let mut early: Vec<u32> = surface.items_intersecting(probe).collect();
        early.sort_unstable();
        assert_eq!(early, expected);

        surface.set_viewport(viewport_100());
        drive(&mut surface, &mut host, &clock);
        let mut late: Vec<u32> = surface.items_intersecting(probe).collect();
        late.sort_unstable();
        assert_eq!(late, expected);
    }
}
