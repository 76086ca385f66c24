//! Leaf containers: one window slot each.

use std::fmt;

use glam::Mat4;
use tracing::{debug, warn};

use super::container::{ContainerKey, ContainerMap};
use super::LayoutContext;
use crate::geometry::{Point, Rectangle};
use crate::window::{WindowController, WindowState};

/// Terminal node of the tree, wrapping exactly one window.
///
/// A leaf exists without a window only between placement and confirmation.
#[derive(Debug)]
pub struct LeafContainer<W> {
    window: Option<W>,
    logical_area: Rectangle,
    next_logical_area: Option<Rectangle>,
    next_state: Option<WindowState>,
    /// State to restore when the leaf is shown again.
    before_shown_state: Option<WindowState>,
    parent: Option<ContainerKey>,
    /// Rectangle the window is dragged to, while a drag is in progress.
    drag_rect: Option<Rectangle>,
    transform: Mat4,
    animation_handle: u32,
}

impl<W> LeafContainer<W> {
    pub(crate) fn new(area: Rectangle, parent: Option<ContainerKey>) -> Self {
        Self {
            window: None,
            logical_area: area,
            next_logical_area: None,
            next_state: None,
            before_shown_state: None,
            parent,
            drag_rect: None,
            transform: Mat4::IDENTITY,
            animation_handle: 0,
        }
    }

    pub fn window(&self) -> Option<&W> {
        self.window.as_ref()
    }

    pub(crate) fn associate_to_window(&mut self, window: W) {
        self.window = Some(window);
    }

    /// Staged area if there is one, the committed area otherwise.
    pub fn logical_area(&self) -> Rectangle {
        self.next_logical_area.unwrap_or(self.logical_area)
    }

    pub fn committed_area(&self) -> Rectangle {
        self.logical_area
    }

    pub(crate) fn set_logical_area(&mut self, area: Rectangle) {
        self.next_logical_area = Some(area);
    }

    pub(crate) fn set_state(&mut self, state: WindowState) {
        self.next_state = Some(state);
    }

    pub fn parent(&self) -> Option<ContainerKey> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ContainerKey>) {
        self.parent = parent;
    }

    pub fn before_shown_state(&self) -> Option<WindowState> {
        self.before_shown_state
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_rect.is_some()
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    pub fn animation_handle(&self) -> u32 {
        self.animation_handle
    }

    pub fn set_animation_handle(&mut self, handle: u32) {
        self.animation_handle = handle;
    }
}

impl<W: Clone + PartialEq + fmt::Debug> ContainerMap<W> {
    pub(super) fn commit_leaf<C>(&mut self, key: ContainerKey, ctx: &LayoutContext<C>)
    where
        C: WindowController<Window = W>,
    {
        let Some(leaf) = self.leaf_mut(key) else {
            return;
        };
        let window = leaf.window.clone();

        if let Some(state) = leaf.next_state.take() {
            if let Some(window) = &window {
                ctx.controller.change_state(window, state);
                self.constrain_leaf(key, ctx);
            }
        }

        let Some(next) = self.leaf_mut(key).and_then(|leaf| leaf.next_logical_area.take()) else {
            return;
        };

        let previous = self.visible_area(key, &ctx.options);
        if let Some(leaf) = self.leaf_mut(key) {
            leaf.logical_area = next;
        }

        let Some(window) = window else {
            return;
        };
        if !ctx.controller.is_fullscreen(&window) {
            let visible = self.visible_area(key, &ctx.options);
            ctx.controller.set_rectangle(&window, previous, visible);
            self.constrain_leaf(key, ctx);
        }
    }

    /// Clips the window to its visible area, or unclips it while fullscreen.
    pub(super) fn constrain_leaf<C>(&self, key: ContainerKey, ctx: &LayoutContext<C>)
    where
        C: WindowController<Window = W>,
    {
        let Some(window) = self.leaf(key).and_then(|leaf| leaf.window()) else {
            return;
        };

        if ctx.controller.is_fullscreen(window) {
            ctx.controller.noclip(window);
        } else {
            ctx.controller.clip(window, self.visible_area(key, &ctx.options));
        }
    }

    pub(super) fn hide_leaf<C>(&mut self, key: ContainerKey, ctx: &LayoutContext<C>)
    where
        C: WindowController<Window = W>,
    {
        let Some(leaf) = self.leaf_mut(key) else {
            return;
        };
        let Some(window) = leaf.window.clone() else {
            return;
        };

        leaf.before_shown_state = Some(ctx.controller.get_state(&window));
        leaf.next_state = Some(WindowState::Hidden);
        self.commit_leaf(key, ctx);
        ctx.controller.send_to_back(&window);
    }

    pub(super) fn show_leaf<C>(&mut self, key: ContainerKey, ctx: &LayoutContext<C>)
    where
        C: WindowController<Window = W>,
    {
        let Some(leaf) = self.leaf_mut(key) else {
            return;
        };
        let Some(window) = leaf.window.clone() else {
            return;
        };

        leaf.next_state = leaf.before_shown_state.take();
        self.commit_leaf(key, ctx);
        ctx.controller.raise(&window);
    }

    /// Starts moving the window freely. The tile keeps its logical area.
    pub(crate) fn leaf_drag_start<C>(&mut self, key: ContainerKey, ctx: &LayoutContext<C>) -> bool
    where
        C: WindowController<Window = W>,
    {
        let visible = self.visible_area(key, &ctx.options);
        let Some(leaf) = self.leaf_mut(key) else {
            return false;
        };
        let Some(window) = leaf.window.clone() else {
            return false;
        };
        if leaf.drag_rect.is_some() {
            warn!("drag already in progress");
            return false;
        }

        leaf.drag_rect = Some(visible);
        ctx.controller.noclip(&window);
        true
    }

    pub(crate) fn leaf_drag<C>(
        &mut self,
        key: ContainerKey,
        x: i32,
        y: i32,
        ctx: &LayoutContext<C>,
    ) -> bool
    where
        C: WindowController<Window = W>,
    {
        let Some(leaf) = self.leaf_mut(key) else {
            return false;
        };
        let (Some(window), Some(previous)) = (leaf.window.clone(), leaf.drag_rect) else {
            return false;
        };

        let next = Rectangle::new(Point::from((x, y)), previous.size);
        leaf.drag_rect = Some(next);
        ctx.controller.set_rectangle(&window, previous, next);
        true
    }

    /// Puts the window back into its tile.
    pub(crate) fn leaf_drag_stop<C>(&mut self, key: ContainerKey, ctx: &LayoutContext<C>) -> bool
    where
        C: WindowController<Window = W>,
    {
        let Some(leaf) = self.leaf_mut(key) else {
            return false;
        };
        let (Some(window), Some(previous)) = (leaf.window.clone(), leaf.drag_rect.take()) else {
            return false;
        };

        let visible = self.visible_area(key, &ctx.options);
        debug!("drag of {window:?} stopped, returning to {visible}");
        ctx.controller.set_rectangle(&window, previous, visible);
        self.constrain_leaf(key, ctx);
        true
    }
}
