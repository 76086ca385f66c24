//! Container arena shared by every node kind.
//!
//! Containers live in a [`SlotMap`] and refer to each other through [`ContainerKey`]s. A lane
//! owns its children by listing their keys; every child stores its lane's key as a plain back
//! reference. Removing a container from the map invalidates its key, so stale references held
//! elsewhere (group members, the active container) simply stop resolving.
//!
//! Behaviour specific to one kind lives in that kind's module as further `impl ContainerMap`
//! blocks. This module holds the shared contract: geometry queries, neighbour detection,
//! commit, constrain and visibility dispatch.

use std::fmt;

use glam::Mat4;
use slotmap::{new_key_type, SlotMap};

use super::floating::FloatingContainer;
use super::group::ContainerGroupContainer;
use super::leaf::LeafContainer;
use super::parent::ParentContainer;
use super::{Edges, LayoutContext, LayoutScheme, Options};
use crate::geometry::Rectangle;
use crate::window::WindowController;

// ============================================================================
// Keys and node types
// ============================================================================

new_key_type! {
    /// Key referencing a container in a [`ContainerMap`].
    pub struct ContainerKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerType {
    Leaf,
    Parent,
    Group,
    Floating,
}

/// A node of the layout.
#[derive(Debug)]
pub enum Container<W> {
    Leaf(LeafContainer<W>),
    Parent(ParentContainer),
    Group(ContainerGroupContainer),
    Floating(FloatingContainer<W>),
}

impl<W> Container<W> {
    pub fn container_type(&self) -> ContainerType {
        match self {
            Container::Leaf(_) => ContainerType::Leaf,
            Container::Parent(_) => ContainerType::Parent,
            Container::Group(_) => ContainerType::Group,
            Container::Floating(_) => ContainerType::Floating,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Container::Leaf(_))
    }

    pub fn is_lane(&self) -> bool {
        matches!(self, Container::Parent(_))
    }

    pub fn as_leaf(&self) -> Option<&LeafContainer<W>> {
        match self {
            Container::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut LeafContainer<W>> {
        match self {
            Container::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_parent(&self) -> Option<&ParentContainer> {
        match self {
            Container::Parent(lane) => Some(lane),
            _ => None,
        }
    }

    pub fn as_parent_mut(&mut self) -> Option<&mut ParentContainer> {
        match self {
            Container::Parent(lane) => Some(lane),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&ContainerGroupContainer> {
        match self {
            Container::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut ContainerGroupContainer> {
        match self {
            Container::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_floating(&self) -> Option<&FloatingContainer<W>> {
        match self {
            Container::Floating(floating) => Some(floating),
            _ => None,
        }
    }

    pub fn as_floating_mut(&mut self) -> Option<&mut FloatingContainer<W>> {
        match self {
            Container::Floating(floating) => Some(floating),
            _ => None,
        }
    }

    /// Lane owning this container. Groups and floating containers never have one.
    pub fn parent(&self) -> Option<ContainerKey> {
        match self {
            Container::Leaf(leaf) => leaf.parent(),
            Container::Parent(lane) => lane.parent(),
            Container::Group(_) | Container::Floating(_) => None,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ContainerKey>) {
        match self {
            Container::Leaf(leaf) => leaf.set_parent(parent),
            Container::Parent(lane) => lane.set_parent(parent),
            Container::Group(_) | Container::Floating(_) => (),
        }
    }

    pub fn window(&self) -> Option<&W> {
        match self {
            Container::Leaf(leaf) => leaf.window(),
            Container::Floating(floating) => Some(floating.window()),
            Container::Parent(_) | Container::Group(_) => None,
        }
    }

    pub fn transform(&self) -> Mat4 {
        match self {
            Container::Leaf(leaf) => leaf.transform(),
            Container::Floating(floating) => floating.transform(),
            Container::Parent(_) | Container::Group(_) => Mat4::IDENTITY,
        }
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        match self {
            Container::Leaf(leaf) => leaf.set_transform(transform),
            Container::Floating(floating) => floating.set_transform(transform),
            Container::Parent(_) | Container::Group(_) => (),
        }
    }

    pub fn animation_handle(&self) -> u32 {
        match self {
            Container::Leaf(leaf) => leaf.animation_handle(),
            Container::Floating(floating) => floating.animation_handle(),
            Container::Parent(_) | Container::Group(_) => 0,
        }
    }

    pub fn set_animation_handle(&mut self, handle: u32) {
        match self {
            Container::Leaf(leaf) => leaf.set_animation_handle(handle),
            Container::Floating(floating) => floating.set_animation_handle(handle),
            Container::Parent(_) | Container::Group(_) => (),
        }
    }

    pub fn pinned(&self) -> bool {
        match self {
            Container::Floating(floating) => floating.pinned(),
            _ => false,
        }
    }
}

// ============================================================================
// Arena
// ============================================================================

/// Arena storing every container of a tree.
pub struct ContainerMap<W> {
    nodes: SlotMap<ContainerKey, Container<W>>,
}

impl<W: fmt::Debug> fmt::Debug for ContainerMap<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.nodes.iter()).finish()
    }
}

impl<W> Default for ContainerMap<W> {
    fn default() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }
}

impl<W> ContainerMap<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: ContainerKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn get(&self, key: ContainerKey) -> Option<&Container<W>> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: ContainerKey) -> Option<&mut Container<W>> {
        self.nodes.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContainerKey, &Container<W>)> {
        self.nodes.iter()
    }

    pub(crate) fn insert(&mut self, container: Container<W>) -> ContainerKey {
        self.nodes.insert(container)
    }

    /// Drops a container from the arena. Children of a lane are not touched.
    pub(crate) fn destroy(&mut self, key: ContainerKey) -> Option<Container<W>> {
        self.nodes.remove(key)
    }

    pub fn leaf(&self, key: ContainerKey) -> Option<&LeafContainer<W>> {
        self.get(key)?.as_leaf()
    }

    pub fn leaf_mut(&mut self, key: ContainerKey) -> Option<&mut LeafContainer<W>> {
        self.get_mut(key)?.as_leaf_mut()
    }

    pub fn lane(&self, key: ContainerKey) -> Option<&ParentContainer> {
        self.get(key)?.as_parent()
    }

    pub fn lane_mut(&mut self, key: ContainerKey) -> Option<&mut ParentContainer> {
        self.get_mut(key)?.as_parent_mut()
    }

    pub fn group(&self, key: ContainerKey) -> Option<&ContainerGroupContainer> {
        self.get(key)?.as_group()
    }

    pub fn group_mut(&mut self, key: ContainerKey) -> Option<&mut ContainerGroupContainer> {
        self.get_mut(key)?.as_group_mut()
    }

    pub fn floating(&self, key: ContainerKey) -> Option<&FloatingContainer<W>> {
        self.get(key)?.as_floating()
    }

    pub fn floating_mut(&mut self, key: ContainerKey) -> Option<&mut FloatingContainer<W>> {
        self.get_mut(key)?.as_floating_mut()
    }

    pub fn parent_of(&self, key: ContainerKey) -> Option<ContainerKey> {
        self.get(key)?.parent()
    }

    pub fn window(&self, key: ContainerKey) -> Option<&W> {
        self.get(key)?.window()
    }

    /// Lane owning `key` and the index of `key` in it.
    pub fn position_in_parent(&self, key: ContainerKey) -> Option<(ContainerKey, usize)> {
        let parent = self.parent_of(key)?;
        let index = self.lane(parent)?.get_index_of_node(key)?;
        Some((parent, index))
    }

    /// Logical area of any container. Stale keys yield an empty rectangle.
    pub fn logical_area(&self, key: ContainerKey, options: &Options) -> Rectangle {
        match self.get(key) {
            Some(Container::Leaf(leaf)) => leaf.logical_area(),
            Some(Container::Parent(_)) => self.lane_area(key, options),
            Some(Container::Group(_)) => self.group_area(key, options),
            Some(Container::Floating(floating)) => floating.logical_area(),
            None => Rectangle::default(),
        }
    }

    /// Stages a new logical area. Lanes rescale their children right away.
    pub(crate) fn set_logical_area(
        &mut self,
        key: ContainerKey,
        area: Rectangle,
        options: &Options,
    ) {
        match self.get_mut(key) {
            Some(Container::Leaf(leaf)) => leaf.set_logical_area(area),
            Some(Container::Floating(floating)) => floating.set_logical_area(area),
            Some(Container::Parent(_)) => self.set_lane_area(key, area, options),
            Some(Container::Group(_)) | None => (),
        }
    }

    /// Logical area shrunk by half gaps towards same-axis neighbours and by the border.
    pub fn visible_area(&self, key: ContainerKey, options: &Options) -> Rectangle {
        match self.get(key) {
            Some(Container::Leaf(leaf)) => {
                let mut area = leaf.committed_area();
                let neighbors = self.neighbors(key);
                let half_gap_x = options.half_gap_x();
                let half_gap_y = options.half_gap_y();

                if neighbors.contains(Edges::LEFT) {
                    area.loc.x += half_gap_x;
                    area.size.w -= half_gap_x;
                }
                if neighbors.contains(Edges::RIGHT) {
                    area.size.w -= half_gap_x;
                }
                if neighbors.contains(Edges::TOP) {
                    area.loc.y += half_gap_y;
                    area.size.h -= half_gap_y;
                }
                if neighbors.contains(Edges::BOTTOM) {
                    area.size.h -= half_gap_y;
                }

                area.inset(options.border_size, options.border_size)
            }
            Some(Container::Floating(floating)) => floating.committed_area(),
            _ => self.logical_area(key, options),
        }
    }

    /// Edges of `key` that face a sibling on the same axis.
    ///
    /// Lanes whose axis does not match are climbed through. A matching lane counts only when
    /// it has more than one child and the node on the path is not at the requested extremity.
    pub fn neighbors(&self, key: ContainerKey) -> Edges {
        let mut edges = Edges::empty();
        if self.has_neighbor(key, LayoutScheme::Vertical, true) {
            edges |= Edges::TOP;
        }
        if self.has_neighbor(key, LayoutScheme::Horizontal, true) {
            edges |= Edges::LEFT;
        }
        if self.has_neighbor(key, LayoutScheme::Vertical, false) {
            edges |= Edges::BOTTOM;
        }
        if self.has_neighbor(key, LayoutScheme::Horizontal, false) {
            edges |= Edges::RIGHT;
        }
        edges
    }

    fn has_neighbor(&self, key: ContainerKey, scheme: LayoutScheme, towards_start: bool) -> bool {
        let mut node = key;
        while let Some((parent, index)) = self.position_in_parent(node) {
            let Some(lane) = self.lane(parent) else {
                return false;
            };

            if lane.scheme() == scheme && lane.num_nodes() > 1 {
                let at_extremity = if towards_start {
                    index == 0
                } else {
                    index + 1 == lane.num_nodes()
                };
                if !at_extremity {
                    return true;
                }
            }

            node = parent;
        }

        false
    }

    pub fn min_width(&self, key: ContainerKey) -> i32 {
        match self.get(key) {
            Some(Container::Parent(_)) => self.lane_min_size(key, false),
            Some(Container::Group(_)) | None => 0,
            Some(_) => super::LEAF_MIN_SIZE,
        }
    }

    pub fn min_height(&self, key: ContainerKey) -> i32 {
        match self.get(key) {
            Some(Container::Parent(_)) => self.lane_min_size(key, true),
            Some(Container::Group(_)) | None => 0,
            Some(_) => super::LEAF_MIN_SIZE,
        }
    }

    /// Whether `key` is the active container or a member of the active group.
    pub fn is_focused(&self, key: ContainerKey, active: Option<ContainerKey>) -> bool {
        let Some(active) = active else {
            return false;
        };

        match self.get(key) {
            Some(Container::Leaf(_) | Container::Floating(_)) => {
                active == key || self.group(active).is_some_and(|group| group.contains(key))
            }
            Some(Container::Group(_)) => active == key,
            Some(Container::Parent(_)) | None => false,
        }
    }

    /// Share of the parent taken by `key`.
    ///
    /// Split lanes measure the main axis. Stacked lanes give the focused child everything.
    pub fn percent_of_parent(
        &self,
        key: ContainerKey,
        options: &Options,
        active: Option<ContainerKey>,
    ) -> f64 {
        let Some(parent) = self.parent_of(key) else {
            return 1.;
        };
        let Some(lane) = self.lane(parent) else {
            return 1.;
        };

        let area = self.logical_area(key, options);
        let parent_area = self.lane_area(parent, options);
        let ratio = |part: i32, whole: i32| {
            if whole <= 0 {
                0.
            } else {
                f64::from(part) / f64::from(whole)
            }
        };

        match lane.scheme() {
            LayoutScheme::Horizontal => ratio(area.size.w, parent_area.size.w),
            LayoutScheme::Vertical => ratio(area.size.h, parent_area.size.h),
            LayoutScheme::Tabbing | LayoutScheme::Stacking => {
                if self.is_focused(key, active) {
                    1.
                } else {
                    0.
                }
            }
        }
    }

    /// All containers under `key` including itself, depth first in child order.
    pub fn descendants(&self, key: ContainerKey) -> Vec<ContainerKey> {
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(node) = stack.pop() {
            if !self.contains(node) {
                continue;
            }
            out.push(node);
            if let Some(lane) = self.lane(node) {
                stack.extend(lane.get_sub_nodes().iter().rev());
            }
        }
        out
    }

    /// Leaves under `key` in traversal order.
    pub fn leaves(&self, key: ContainerKey) -> Vec<ContainerKey> {
        self.descendants(key)
            .into_iter()
            .filter(|node| self.leaf(*node).is_some())
            .collect()
    }

    /// First container under `key`, depth first, matching `pred`.
    pub fn find_where(
        &self,
        key: ContainerKey,
        mut pred: impl FnMut(ContainerKey, &Container<W>) -> bool,
    ) -> Option<ContainerKey> {
        self.descendants(key)
            .into_iter()
            .find(|node| self.get(*node).is_some_and(|container| pred(*node, container)))
    }
}

// ============================================================================
// Commit, constrain and visibility
// ============================================================================

impl<W: Clone + PartialEq + fmt::Debug> ContainerMap<W> {
    /// Applies staged geometry and state, pushing the result to the window controller.
    pub(crate) fn commit<C>(&mut self, key: ContainerKey, ctx: &LayoutContext<C>)
    where
        C: WindowController<Window = W>,
    {
        match self.get(key) {
            Some(Container::Leaf(_)) => self.commit_leaf(key, ctx),
            Some(Container::Floating(_)) => self.commit_floating(key, ctx),
            Some(Container::Parent(lane)) => {
                for child in lane.get_sub_nodes().to_vec() {
                    self.commit(child, ctx);
                }
            }
            Some(Container::Group(_)) => {
                for member in self.group_members(key) {
                    self.commit(member, ctx);
                }
            }
            None => (),
        }
    }

    /// Re-applies clipping to the committed visible area.
    pub(crate) fn constrain<C>(&self, key: ContainerKey, ctx: &LayoutContext<C>)
    where
        C: WindowController<Window = W>,
    {
        match self.get(key) {
            Some(Container::Leaf(_)) => self.constrain_leaf(key, ctx),
            Some(Container::Floating(floating)) => ctx.controller.noclip(floating.window()),
            Some(Container::Parent(lane)) => {
                for child in lane.get_sub_nodes() {
                    self.constrain(*child, ctx);
                }
            }
            Some(Container::Group(_)) => {
                for member in self.group_members(key) {
                    self.constrain(member, ctx);
                }
            }
            None => (),
        }
    }

    pub(crate) fn hide<C>(&mut self, key: ContainerKey, ctx: &LayoutContext<C>)
    where
        C: WindowController<Window = W>,
    {
        match self.get(key) {
            Some(Container::Leaf(_)) => self.hide_leaf(key, ctx),
            Some(Container::Floating(_)) => self.hide_floating(key, ctx),
            Some(Container::Parent(lane)) => {
                for child in lane.get_sub_nodes().to_vec() {
                    self.hide(child, ctx);
                }
            }
            Some(Container::Group(_)) => {
                for member in self.group_members(key) {
                    self.hide(member, ctx);
                }
            }
            None => (),
        }
    }

    pub(crate) fn show<C>(&mut self, key: ContainerKey, ctx: &LayoutContext<C>)
    where
        C: WindowController<Window = W>,
    {
        match self.get(key) {
            Some(Container::Leaf(_)) => self.show_leaf(key, ctx),
            Some(Container::Floating(_)) => self.show_floating(key, ctx),
            Some(Container::Parent(lane)) => {
                for child in lane.get_sub_nodes().to_vec() {
                    self.show(child, ctx);
                }
            }
            Some(Container::Group(_)) => {
                for member in self.group_members(key) {
                    self.show(member, ctx);
                }
            }
            None => (),
        }
    }

    /// Whether the window in `key` is currently fullscreen.
    pub fn is_fullscreen<C>(&self, key: ContainerKey, ctx: &LayoutContext<C>) -> bool
    where
        C: WindowController<Window = W>,
    {
        match self.get(key) {
            Some(Container::Leaf(leaf)) => leaf
                .window()
                .is_some_and(|window| ctx.controller.is_fullscreen(window)),
            _ => false,
        }
    }
}
