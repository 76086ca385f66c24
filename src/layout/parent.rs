//! Lanes: internal nodes owning an ordered list of children.
//!
//! Child order is both traversal order and spatial order along the lane's main axis. Split
//! lanes divide their area between children; stacked lanes give every child the whole area.

use std::fmt;

use tracing::{error, trace, warn};

use super::container::{Container, ContainerKey, ContainerMap};
use super::leaf::LeafContainer;
use super::{LayoutContext, LayoutScheme, Options};
use crate::geometry::{Point, Rectangle, Size};
use crate::window::WindowController;

#[derive(Debug)]
pub struct ParentContainer {
    /// Area assigned to the lane. The root lane is additionally inset by the outer gaps.
    logical_area: Rectangle,
    scheme: LayoutScheme,
    children: Vec<ContainerKey>,
    parent: Option<ContainerKey>,
    /// Leaf created by a placement that has not been confirmed yet.
    pending: Option<ContainerKey>,
    /// Child that most recently contained the focused window.
    last_active: Option<ContainerKey>,
}

impl ParentContainer {
    pub(crate) fn new(area: Rectangle, scheme: LayoutScheme, parent: Option<ContainerKey>) -> Self {
        Self {
            logical_area: area,
            scheme,
            children: Vec::new(),
            parent,
            pending: None,
            last_active: None,
        }
    }

    pub fn scheme(&self) -> LayoutScheme {
        self.scheme
    }

    pub fn parent(&self) -> Option<ContainerKey> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ContainerKey>) {
        self.parent = parent;
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn num_nodes(&self) -> usize {
        self.children.len()
    }

    pub fn at(&self, index: usize) -> Option<ContainerKey> {
        self.children.get(index).copied()
    }

    pub fn get_index_of_node(&self, node: ContainerKey) -> Option<usize> {
        self.children.iter().position(|child| *child == node)
    }

    pub fn get_sub_nodes(&self) -> &[ContainerKey] {
        &self.children
    }

    pub fn pending(&self) -> Option<ContainerKey> {
        self.pending
    }

    pub fn last_active(&self) -> Option<ContainerKey> {
        self.last_active
    }

    pub(crate) fn set_last_active(&mut self, child: ContainerKey) {
        if self.children.contains(&child) {
            self.last_active = Some(child);
        }
    }

    #[cfg(test)]
    pub(crate) fn push_child(&mut self, child: ContainerKey) {
        self.children.push(child);
    }
}

/// Position and extent of `rect` along the main axis.
fn span(rect: Rectangle, vertical: bool) -> (i32, i32) {
    if vertical {
        (rect.loc.y, rect.size.h)
    } else {
        (rect.loc.x, rect.size.w)
    }
}

/// Rectangle at `pos` with `extent` along the main axis, taking the cross axis from `cross`.
fn with_span(cross: Rectangle, pos: i32, extent: i32, vertical: bool) -> Rectangle {
    if vertical {
        Rectangle::new(
            Point::from((cross.loc.x, pos)),
            Size::from((cross.size.w, extent)),
        )
    } else {
        Rectangle::new(
            Point::from((pos, cross.loc.y)),
            Size::from((extent, cross.size.h)),
        )
    }
}

/// `value * numerator / denominator`, rounded down.
fn scale(value: i32, numerator: i32, denominator: i32) -> i32 {
    (i64::from(value) * i64::from(numerator)).div_euclid(i64::from(denominator)) as i32
}

impl<W> ContainerMap<W> {
    pub(crate) fn new_lane(
        &mut self,
        area: Rectangle,
        scheme: LayoutScheme,
        parent: Option<ContainerKey>,
    ) -> ContainerKey {
        self.insert(Container::Parent(ParentContainer::new(area, scheme, parent)))
    }

    /// Area the lane lays its children out in.
    pub fn lane_area(&self, lane: ContainerKey, options: &Options) -> Rectangle {
        let Some(lane) = self.lane(lane) else {
            return Rectangle::default();
        };

        if lane.is_root() {
            lane.logical_area
                .inset(options.outer_gaps_x, options.outer_gaps_y)
        } else {
            lane.logical_area
        }
    }

    /// Assigns a new area to the lane and rescales every child to keep its share.
    ///
    /// Children stay proportional along the main axis; the last child absorbs the rounding
    /// remainder. Stacked lanes hand the whole area to every child.
    pub(crate) fn set_lane_area(&mut self, lane: ContainerKey, area: Rectangle, options: &Options) {
        let current = self.lane_area(lane, options);
        let Some(lane_ref) = self.lane_mut(lane) else {
            return;
        };
        lane_ref.logical_area = area;
        let scheme = lane_ref.scheme;
        let children = lane_ref.children.clone();

        let target = self.lane_area(lane, options);
        if children.is_empty() {
            return;
        }

        if scheme.is_stacked() {
            for child in children {
                self.set_logical_area(child, target, options);
            }
            return;
        }

        let vertical = scheme == LayoutScheme::Vertical;
        let (_, current_extent) = span(current, vertical);
        let (target_pos, target_extent) = span(target, vertical);

        let mut extents: Vec<i32> = if current_extent > 0 {
            children
                .iter()
                .map(|child| {
                    let (_, extent) = span(self.logical_area(*child, options), vertical);
                    scale(target_extent, extent, current_extent)
                })
                .collect()
        } else {
            let count = children.len() as i32;
            vec![target_extent.div_euclid(count); children.len()]
        };

        let total: i32 = extents.iter().sum();
        if let Some(last) = extents.last_mut() {
            *last += target_extent - total;
        }

        let mut pos = target_pos;
        for (child, extent) in children.into_iter().zip(extents) {
            self.set_logical_area(child, with_span(target, pos, extent, vertical), options);
            pos += extent;
        }
    }

    /// Evens out the children so their extents add up to the lane's extent again.
    ///
    /// The difference is spread evenly across every child before the lane re-applies its own
    /// area, which positions the children and hands the remainder to the last one.
    pub(crate) fn relayout(&mut self, lane: ContainerKey, options: &Options) {
        let placement = self.lane_area(lane, options);
        let Some(lane_ref) = self.lane(lane) else {
            return;
        };
        let scheme = lane_ref.scheme;
        let raw_area = lane_ref.logical_area;
        let children = lane_ref.children.clone();
        if children.is_empty() {
            return;
        }

        if scheme.is_stacked() {
            for child in &children {
                self.set_logical_area(*child, placement, options);
            }
        } else {
            let vertical = scheme == LayoutScheme::Vertical;
            let (_, lane_extent) = span(placement, vertical);
            let total: i32 = children
                .iter()
                .map(|child| span(self.logical_area(*child, options), vertical).1)
                .sum();
            let diff_per_node = (lane_extent - total).div_euclid(children.len() as i32);

            for child in &children {
                let (pos, extent) = span(self.logical_area(*child, options), vertical);
                let area = with_span(placement, pos, extent + diff_per_node, vertical);
                self.set_logical_area(*child, area, options);
            }
        }

        self.set_lane_area(lane, raw_area, options);
    }

    /// Makes room for a new child at `index` and returns the area reserved for it.
    ///
    /// The new child takes roughly `extent / (n + 1)`, and every existing child gives up a
    /// share proportional to its own size.
    fn create_space(&mut self, lane: ContainerKey, index: usize, options: &Options) -> Rectangle {
        let placement = self.lane_area(lane, options);
        let Some(lane_ref) = self.lane(lane) else {
            return placement;
        };
        let scheme = lane_ref.scheme;
        let children = lane_ref.children.clone();

        if scheme.is_stacked() || children.is_empty() {
            return placement;
        }

        let vertical = scheme == LayoutScheme::Vertical;
        let (lane_pos, lane_extent) = span(placement, vertical);
        let new_extent = lane_extent / (children.len() as i32 + 1);

        let mut extents = Vec::with_capacity(children.len());
        let mut given_up = 0;
        for child in &children {
            let (_, extent) = span(self.logical_area(*child, options), vertical);
            let lost = if lane_extent > 0 {
                scale(new_extent, extent, lane_extent)
            } else {
                0
            };
            given_up += lost;
            extents.push(extent - lost);
        }

        let mut pos = lane_pos;
        let mut reserved = with_span(placement, pos, given_up, vertical);
        for (i, (child, extent)) in children.iter().zip(extents).enumerate() {
            if i == index {
                reserved = with_span(placement, pos, given_up, vertical);
                pos += given_up;
            }
            self.set_logical_area(*child, with_span(placement, pos, extent, vertical), options);
            pos += extent;
        }
        if index >= children.len() {
            reserved = with_span(placement, pos, given_up, vertical);
        }

        reserved
    }

    /// Creates a windowless leaf for an upcoming window and returns it.
    ///
    /// An empty lane gives the leaf its whole area. A split lane halves the most recently
    /// active child (the last child if none) along the main axis; the leaf takes the second
    /// half and lands right after that child. A stacked lane gives the leaf the whole area.
    pub(crate) fn create_space_for_window(
        &mut self,
        lane: ContainerKey,
        options: &Options,
    ) -> Option<ContainerKey> {
        if let Some(stale) = self.lane(lane)?.pending {
            warn!("discarding unconfirmed placement");
            self.remove(lane, stale, options);
            self.destroy(stale);
        }

        let placement = self.lane_area(lane, options);
        let lane_ref = self.lane(lane)?;
        let scheme = lane_ref.scheme;
        let anchor = lane_ref
            .last_active
            .filter(|child| lane_ref.children.contains(child))
            .or_else(|| lane_ref.children.last().copied());

        let (index, area) = match anchor {
            None => (0, placement),
            Some(anchor) => {
                let index = lane_ref.get_index_of_node(anchor)? + 1;
                if scheme.is_stacked() {
                    (index, placement)
                } else {
                    let vertical = scheme == LayoutScheme::Vertical;
                    let anchor_area = self.logical_area(anchor, options);
                    let (pos, extent) = span(anchor_area, vertical);
                    let kept = extent - extent / 2;
                    let anchor_next = with_span(anchor_area, pos, kept, vertical);
                    self.set_logical_area(anchor, anchor_next, options);
                    (index, with_span(anchor_area, pos + kept, extent / 2, vertical))
                }
            }
        };

        let leaf = self.insert(Container::Leaf(LeafContainer::new(area, Some(lane))));
        let lane_ref = self.lane_mut(lane)?;
        lane_ref.children.insert(index, leaf);
        lane_ref.pending = Some(leaf);
        trace!("created space for a window at index {index}: {area}");
        Some(leaf)
    }

    /// Wraps `child` in a new lane that takes its place. Returns the new lane.
    pub(crate) fn convert_to_parent(
        &mut self,
        lane: ContainerKey,
        child: ContainerKey,
        options: &Options,
    ) -> Option<ContainerKey> {
        let Some(index) = self.lane(lane)?.get_index_of_node(child) else {
            error!("attempting to convert a node that is not a child of the lane");
            return None;
        };

        let area = self.logical_area(child, options);
        let new_lane = self.new_lane(area, LayoutScheme::default(), Some(lane));
        if let Some(new_lane_ref) = self.lane_mut(new_lane) {
            new_lane_ref.children.push(child);
            new_lane_ref.last_active = Some(child);
        }
        self.get_mut(child)?.set_parent(Some(new_lane));

        let lane_ref = self.lane_mut(lane)?;
        lane_ref.children[index] = new_lane;
        if lane_ref.last_active == Some(child) {
            lane_ref.last_active = Some(new_lane);
        }
        Some(new_lane)
    }

    /// Detaches `node` from the lane and lays the remaining children out again.
    ///
    /// When a single lane is left, its children are absorbed along with its scheme. The
    /// detached node stays in the arena; the absorbed lane does not.
    pub(crate) fn remove(&mut self, lane: ContainerKey, node: ContainerKey, options: &Options) {
        let Some(lane_ref) = self.lane_mut(lane) else {
            return;
        };
        lane_ref.children.retain(|child| *child != node);
        if lane_ref.pending == Some(node) {
            lane_ref.pending = None;
        }
        if lane_ref.last_active == Some(node) {
            lane_ref.last_active = None;
        }
        let remaining = lane_ref.children.clone();

        if let Some(container) = self.get_mut(node) {
            container.set_parent(None);
        }

        if let [only] = remaining[..] {
            if let Some(Container::Parent(dying)) = self.destroy_if_lane(only) {
                for child in &dying.children {
                    if let Some(container) = self.get_mut(*child) {
                        container.set_parent(Some(lane));
                    }
                }
                if let Some(lane_ref) = self.lane_mut(lane) {
                    lane_ref.children = dying.children;
                    lane_ref.scheme = dying.scheme;
                    lane_ref.last_active = dying.last_active;
                }
            }
        }

        self.relayout(lane, options);
    }

    fn destroy_if_lane(&mut self, key: ContainerKey) -> Option<Container<W>> {
        if self.lane(key).is_some() {
            self.destroy(key)
        } else {
            None
        }
    }

    /// Grows the child at `index` by `-amount` along the lane's main axis.
    ///
    /// The other children share the opposite change; the last of them takes the rounding
    /// remainder. Every extent is computed first, and nothing changes if any of them would
    /// end up at or below the child's minimum.
    pub(crate) fn resize_child(
        &mut self,
        lane: ContainerKey,
        index: usize,
        amount: i32,
        options: &Options,
    ) -> bool {
        let placement = self.lane_area(lane, options);
        let Some(lane_ref) = self.lane(lane) else {
            return false;
        };
        let vertical = lane_ref.scheme == LayoutScheme::Vertical;
        let children = lane_ref.children.clone();
        if children.len() < 2 || index >= children.len() {
            return false;
        }

        let others = children.len() as i32 - 1;
        let share = amount.div_euclid(others);
        let Some(remainder) = share
            .checked_mul(others)
            .and_then(|spread| amount.checked_sub(spread))
        else {
            warn!("unable to resize by {amount}: extent out of range");
            return false;
        };
        let last_other = if index + 1 == children.len() {
            children.len() - 2
        } else {
            children.len() - 1
        };

        let mut extents = Vec::with_capacity(children.len());
        for (i, child) in children.iter().enumerate() {
            let (_, extent) = span(self.logical_area(*child, options), vertical);
            let extent = if i == index {
                extent.checked_sub(amount)
            } else if i == last_other {
                extent
                    .checked_add(share)
                    .and_then(|extent| extent.checked_add(remainder))
            } else {
                extent.checked_add(share)
            };
            let Some(extent) = extent else {
                warn!("unable to resize by {amount}: extent out of range");
                return false;
            };

            let min = if vertical {
                self.min_height(*child)
            } else {
                self.min_width(*child)
            };
            if extent <= min {
                warn!("unable to resize: a container would shrink to {extent}, minimum is {min}");
                return false;
            }
            extents.push(extent);
        }

        let (mut pos, _) = span(placement, vertical);
        for (child, extent) in children.into_iter().zip(extents) {
            self.set_logical_area(child, with_span(placement, pos, extent, vertical), options);
            pos += extent;
        }
        true
    }

    /// Minimum size of a lane: summed along its main axis, the largest child across it.
    pub(super) fn lane_min_size(&self, lane: ContainerKey, vertical: bool) -> i32 {
        let Some(lane) = self.lane(lane) else {
            return 0;
        };
        let sizes = lane.children.iter().map(|child| {
            if vertical {
                self.min_height(*child)
            } else {
                self.min_width(*child)
            }
        });

        let along_main_axis = match lane.scheme {
            LayoutScheme::Horizontal => !vertical,
            LayoutScheme::Vertical => vertical,
            LayoutScheme::Tabbing | LayoutScheme::Stacking => false,
        };
        if along_main_axis {
            sizes.sum()
        } else {
            sizes.max().unwrap_or(0)
        }
    }
}

impl<W: Clone + PartialEq + fmt::Debug> ContainerMap<W> {
    /// Binds `window` to the lane's pending leaf and commits the lane.
    pub(crate) fn confirm_window<C>(
        &mut self,
        lane: ContainerKey,
        window: W,
        ctx: &LayoutContext<C>,
    ) -> Option<ContainerKey>
    where
        C: WindowController<Window = W>,
    {
        let Some(pending) = self.lane_mut(lane)?.pending.take() else {
            error!("unable to confirm {window:?}: no placement is pending in the lane");
            return None;
        };

        let leaf = self.leaf_mut(pending)?;
        leaf.associate_to_window(window);
        leaf.set_logical_area(leaf.committed_area());
        self.commit(lane, ctx);
        Some(pending)
    }

    /// Inserts an existing container at `index`, giving it a proportional share of the lane.
    pub(crate) fn graft_existing<C>(
        &mut self,
        lane: ContainerKey,
        node: ContainerKey,
        index: usize,
        ctx: &LayoutContext<C>,
    ) where
        C: WindowController<Window = W>,
    {
        let Some(count) = self.lane(lane).map(ParentContainer::num_nodes) else {
            return;
        };
        let index = index.min(count);

        let area = self.create_space(lane, index, &ctx.options);
        let Some(container) = self.get_mut(node) else {
            return;
        };
        container.set_parent(Some(lane));
        self.set_logical_area(node, area, &ctx.options);
        if let Some(lane_ref) = self.lane_mut(lane) {
            lane_ref.children.insert(index, node);
        }

        self.relayout(lane, &ctx.options);
        self.constrain(lane, ctx);
    }

    pub(crate) fn swap_nodes<C>(
        &mut self,
        lane: ContainerKey,
        first: ContainerKey,
        second: ContainerKey,
        ctx: &LayoutContext<C>,
    ) -> bool
    where
        C: WindowController<Window = W>,
    {
        let Some(lane_ref) = self.lane_mut(lane) else {
            return false;
        };
        let (Some(a), Some(b)) = (
            lane_ref.get_index_of_node(first),
            lane_ref.get_index_of_node(second),
        ) else {
            return false;
        };

        lane_ref.children.swap(a, b);
        self.relayout(lane, &ctx.options);
        self.constrain(lane, ctx);
        true
    }

    /// Changes the scheme and commits the resulting layout.
    pub(crate) fn set_scheme<C>(
        &mut self,
        lane: ContainerKey,
        scheme: LayoutScheme,
        ctx: &LayoutContext<C>,
    )
    where
        C: WindowController<Window = W>,
    {
        let Some(lane_ref) = self.lane_mut(lane) else {
            return;
        };
        lane_ref.scheme = scheme;
        self.relayout(lane, &ctx.options);
        self.constrain(lane, ctx);
        self.commit(lane, ctx);
    }

    /// Stacked lanes send every child but the active one to the back.
    pub(crate) fn lane_on_focus_gained<C>(&self, lane: ContainerKey, ctx: &LayoutContext<C>)
    where
        C: WindowController<Window = W>,
    {
        let Some(lane_ref) = self.lane(lane) else {
            return;
        };
        if !lane_ref.scheme.is_stacked() {
            return;
        }

        for child in &lane_ref.children {
            if Some(*child) == ctx.active {
                continue;
            }
            if let Some(window) = self.leaf(*child).and_then(LeafContainer::window) {
                ctx.controller.send_to_back(window);
            }
        }
    }
}
