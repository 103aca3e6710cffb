// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The collaborator contract between the surface and its rendering host.

/// Creates and disposes the actual visual resources for items.
///
/// The surface decides *which* items should own a visual and *when*; the
/// host owns the resources themselves (platform widgets, GPU primitives,
/// draw-list entries). The surface tracks realization state, so a host never
/// sees a create for an item that is already live, nor a dispose for one
/// that is not.
///
/// `I` is the opaque item handle shared with
/// [`VirtualSurface`][crate::VirtualSurface].
///
/// All calls arrive on the thread driving
/// [`reconcile`][crate::VirtualSurface::reconcile]; visual resources are
/// assumed to be confined to that thread by the platform.
pub trait VisualHost<I> {
    /// Creates the visual for `id`.
    ///
    /// `index` is the stacking position among the host's currently-live
    /// visuals: inserting at `index` keeps the host's rendering order
    /// consistent with the logical collection order, regardless of the
    /// order in which spatial queries surfaced the items.
    fn create_visual(&mut self, id: I, index: usize);

    /// Disposes the visual for `id`.
    fn dispose_visual(&mut self, id: I);
}
