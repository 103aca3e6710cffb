// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core quad-tree implementation: quadrant arena, descent, queries, removal.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;
use kurbo::Rect;
use smallvec::SmallVec;

use crate::types::{BoundsError, validate_bounds};

/// Index of a quadrant in the tree's arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeIdx(usize);

impl NodeIdx {
    const ROOT: Self = Self(0);

    const fn get(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
struct Entry<P> {
    item: P,
    bounds: Rect,
}

/// One rectangular region of space, lazily subdivided into four children.
///
/// `straddlers` holds the entries whose bounds did not fit entirely within
/// any single child quadrant. The parent link is bookkeeping only (used by
/// removal-time pruning); queries always traverse downward.
#[derive(Clone, Debug)]
struct Quadrant<P> {
    bounds: Rect,
    parent: Option<NodeIdx>,
    children: [Option<NodeIdx>; 4],
    straddlers: SmallVec<[Entry<P>; 2]>,
}

impl<P> Quadrant<P> {
    fn new(bounds: Rect, parent: Option<NodeIdx>) -> Self {
        Self {
            bounds,
            parent,
            children: [None; 4],
            straddlers: SmallVec::new(),
        }
    }

    fn is_vacant(&self) -> bool {
        self.straddlers.is_empty() && self.children.iter().all(Option::is_none)
    }
}

/// Location of an entry: owning quadrant plus slot in its straddler list.
#[derive(Copy, Clone, Debug)]
struct EntrySlot {
    node: NodeIdx,
    slot: usize,
}

/// The four equal child rectangles of a quadrant, in top-left, top-right,
/// bottom-left, bottom-right order.
fn child_rects(bounds: Rect) -> [Rect; 4] {
    let cx = 0.5 * (bounds.x0 + bounds.x1);
    let cy = 0.5 * (bounds.y0 + bounds.y1);
    [
        Rect::new(bounds.x0, bounds.y0, cx, cy),
        Rect::new(cx, bounds.y0, bounds.x1, cy),
        Rect::new(bounds.x0, cy, cx, bounds.y1),
        Rect::new(cx, cy, bounds.x1, bounds.y1),
    ]
}

/// Queries against rectangles without area (or with non-finite coordinates)
/// short-circuit to an empty result.
fn is_queryable(rect: Rect) -> bool {
    rect.is_finite() && rect.width() > 0.0 && rect.height() > 0.0
}

/// A quad-tree over opaque items keyed by axis-aligned bounding rectangle.
///
/// Items are stored in the deepest quadrant whose bounds fully contain them;
/// items overlapping a subdivision boundary stay at the parent level, so no
/// item is ever lost to a split. A side table maps each item to its owning
/// quadrant and slot, making [`remove`][Self::remove] independent of tree
/// depth.
///
/// `P` is an opaque item handle owned by the caller, typically a small id or
/// generational key. The tree stores only `(P, Rect)` pairs.
///
/// ## Example
///
/// ```rust
/// use canopy_quadtree::QuadTree;
/// use kurbo::Rect;
///
/// let mut tree: QuadTree<u32> = QuadTree::new(Rect::new(0.0, 0.0, 100.0, 100.0))?;
/// tree.insert(1, Rect::new(10.0, 10.0, 20.0, 20.0))?;
/// tree.insert(2, Rect::new(40.0, 40.0, 60.0, 60.0))?;
///
/// let hits: Vec<_> = tree.items_intersecting(Rect::new(0.0, 0.0, 25.0, 25.0)).collect();
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].0, 1);
///
/// assert!(tree.remove(&1));
/// assert!(!tree.remove(&1));
/// # Ok::<(), canopy_quadtree::BoundsError>(())
/// ```
#[derive(Clone)]
pub struct QuadTree<P: Copy + Eq + Hash + Debug> {
    /// Quadrant arena; slot 0 is always the root.
    nodes: Vec<Quadrant<P>>,
    /// Pruned quadrant slots available for reuse.
    free_list: Vec<usize>,
    /// item -> (owning quadrant, slot in its straddler list)
    entries: HashMap<P, EntrySlot>,
}

impl<P: Copy + Eq + Hash + Debug> Debug for QuadTree<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QuadTree")
            .field("bounds", &self.bounds())
            .field("items", &self.entries.len())
            .field("nodes", &self.node_count())
            .finish_non_exhaustive()
    }
}

impl<P: Copy + Eq + Hash + Debug> QuadTree<P> {
    /// Creates an empty tree covering `bounds`.
    ///
    /// Fails if `bounds` is non-finite or has no area.
    pub fn new(bounds: Rect) -> Result<Self, BoundsError> {
        validate_bounds(bounds)?;
        let mut nodes = Vec::new();
        nodes.push(Quadrant::new(bounds, None));
        Ok(Self {
            nodes,
            free_list: Vec::new(),
            entries: HashMap::new(),
        })
    }

    /// The overall bounds covered by the root quadrant.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.nodes[NodeIdx::ROOT.get()].bounds
    }

    /// Number of indexed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no items are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of live quadrants (excluding pruned slots awaiting reuse).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Inserts `item` with the given bounds.
    ///
    /// Fails if `bounds` is non-finite or has no area; the tree is unchanged
    /// on failure. Bounds extending outside the overall bounds are accepted
    /// and stored at the root. Inserting an item that is already present
    /// reindexes it under the new bounds.
    pub fn insert(&mut self, item: P, bounds: Rect) -> Result<(), BoundsError> {
        validate_bounds(bounds)?;
        if self.entries.contains_key(&item) {
            self.remove(&item);
        }
        self.place(item, bounds);
        Ok(())
    }

    /// Removes `item`, returning whether it was present.
    ///
    /// Callers may legitimately remove an item that was never indexed (for
    /// example after a racing logical removal), so a miss is a `false`
    /// result rather than an error.
    pub fn remove(&mut self, item: &P) -> bool {
        let Some(EntrySlot { node, slot }) = self.entries.remove(item) else {
            return false;
        };
        let moved = {
            let straddlers = &mut self.nodes[node.get()].straddlers;
            straddlers.swap_remove(slot);
            straddlers.get(slot).map(|e| e.item)
        };
        if let Some(moved) = moved
            && let Some(entry) = self.entries.get_mut(&moved)
        {
            entry.slot = slot;
        }
        self.prune(node);
        true
    }

    /// Reassigns the overall bounds, rebuilding the tree wholesale.
    ///
    /// Quadrant boundaries derive from the overall bounds, so this drains
    /// every item and re-inserts it against the new subdivision. O(n); meant
    /// for structural extent changes, not per-scroll updates.
    pub fn set_bounds(&mut self, bounds: Rect) -> Result<(), BoundsError> {
        validate_bounds(bounds)?;
        let drained: Vec<(P, Rect)> = self.iter().collect();
        self.nodes.clear();
        self.free_list.clear();
        self.entries.clear();
        self.nodes.push(Quadrant::new(bounds, None));
        for (item, item_bounds) in drained {
            self.place(item, item_bounds);
        }
        Ok(())
    }

    /// Visits every item whose bounds intersect `rect`, in unspecified order.
    ///
    /// Intersection is non-strict: bounds sharing only an edge with `rect`
    /// are reported.
    pub fn visit_intersecting<F: FnMut(P, Rect)>(&self, rect: Rect, mut f: F) {
        if !is_queryable(rect) {
            return;
        }
        self.visit_node(NodeIdx::ROOT, rect, &mut f);
    }

    /// Returns the items whose bounds intersect `rect`, in unspecified order.
    pub fn items_intersecting(&self, rect: Rect) -> impl Iterator<Item = (P, Rect)> + '_ {
        let mut out = Vec::new();
        self.visit_intersecting(rect, |item, bounds| out.push((item, bounds)));
        out.into_iter()
    }

    /// Returns `true` if any item's bounds intersect `rect`.
    ///
    /// Stops at the first match, so this is cheaper than counting the
    /// results of [`items_intersecting`][Self::items_intersecting].
    #[must_use]
    pub fn has_items_intersecting(&self, rect: Rect) -> bool {
        if !is_queryable(rect) {
            return false;
        }
        self.probe_node(NodeIdx::ROOT, rect)
    }

    /// Iterates over all items and their bounds, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (P, Rect)> + '_ {
        self.nodes
            .iter()
            .flat_map(|q| q.straddlers.iter().map(|e| (e.item, e.bounds)))
    }

    /// Places a pre-validated entry in the deepest containing quadrant.
    fn place(&mut self, item: P, bounds: Rect) {
        let mut node = NodeIdx::ROOT;
        loop {
            let quads = child_rects(self.nodes[node.get()].bounds);
            match quads.iter().position(|q| q.contains_rect(bounds)) {
                Some(which) => node = self.child(node, which, quads[which]),
                None => break,
            }
        }
        let slot = self.nodes[node.get()].straddlers.len();
        self.nodes[node.get()].straddlers.push(Entry { item, bounds });
        self.entries.insert(item, EntrySlot { node, slot });
    }

    /// Returns the child quadrant, constructing it on first need.
    fn child(&mut self, parent: NodeIdx, which: usize, bounds: Rect) -> NodeIdx {
        if let Some(existing) = self.nodes[parent.get()].children[which] {
            return existing;
        }
        let idx = if let Some(free) = self.free_list.pop() {
            self.nodes[free] = Quadrant::new(bounds, Some(parent));
            NodeIdx(free)
        } else {
            self.nodes.push(Quadrant::new(bounds, Some(parent)));
            NodeIdx(self.nodes.len() - 1)
        };
        self.nodes[parent.get()].children[which] = Some(idx);
        idx
    }

    /// Walks up from `node`, unlinking quadrants left with no entries and no
    /// children and returning their slots to the free list.
    fn prune(&mut self, mut node: NodeIdx) {
        while let Some(parent) = self.nodes[node.get()].parent {
            if !self.nodes[node.get()].is_vacant() {
                break;
            }
            let siblings = &mut self.nodes[parent.get()].children;
            if let Some(which) = siblings.iter().position(|c| *c == Some(node)) {
                siblings[which] = None;
            }
            self.free_list.push(node.get());
            node = parent;
        }
    }

    fn visit_node<F: FnMut(P, Rect)>(&self, node: NodeIdx, rect: Rect, f: &mut F) {
        let q = &self.nodes[node.get()];
        for child in q.children.iter().flatten() {
            // A child quadrant may hold deep descendants intersecting `rect`
            // even when the child boundary only partially overlaps it.
            if self.nodes[child.get()].bounds.overlaps(rect) {
                self.visit_node(*child, rect, f);
            }
        }
        for entry in &q.straddlers {
            if entry.bounds.overlaps(rect) {
                f(entry.item, entry.bounds);
            }
        }
    }

    fn probe_node(&self, node: NodeIdx, rect: Rect) -> bool {
        let q = &self.nodes[node.get()];
        if q.straddlers.iter().any(|e| e.bounds.overlaps(rect)) {
            return true;
        }
        q.children.iter().flatten().any(|child| {
            self.nodes[child.get()].bounds.overlaps(rect) && self.probe_node(*child, rect)
        })
    }
}
