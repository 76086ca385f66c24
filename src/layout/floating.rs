//! Floating containers: windows positioned freely on top of the tiled layout.

use std::fmt;

use glam::Mat4;
use tracing::{trace, warn};

use super::container::{Container, ContainerKey, ContainerMap};
use super::{Direction, LayoutContext};
use crate::geometry::{Point, Rectangle};
use crate::window::{WindowController, WindowState};

#[derive(Debug)]
pub struct FloatingContainer<W> {
    window: W,
    logical_area: Rectangle,
    next_logical_area: Option<Rectangle>,
    /// Pinned windows stay visible when their workspace is hidden.
    pinned: bool,
    before_shown_state: Option<WindowState>,
    transform: Mat4,
    animation_handle: u32,
}

impl<W> FloatingContainer<W> {
    pub(crate) fn new(window: W, area: Rectangle) -> Self {
        Self {
            window,
            logical_area: area,
            next_logical_area: None,
            pinned: false,
            before_shown_state: None,
            transform: Mat4::IDENTITY,
            animation_handle: 0,
        }
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn logical_area(&self) -> Rectangle {
        self.next_logical_area.unwrap_or(self.logical_area)
    }

    pub fn committed_area(&self) -> Rectangle {
        self.logical_area
    }

    pub(crate) fn set_logical_area(&mut self, area: Rectangle) {
        self.next_logical_area = Some(area);
    }

    pub fn pinned(&self) -> bool {
        self.pinned
    }

    pub(crate) fn set_pinned(&mut self, pinned: bool) {
        self.pinned = pinned;
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

impl<W> ContainerMap<W> {
    pub(crate) fn new_floating(&mut self, window: W, area: Rectangle) -> ContainerKey {
        self.insert(Container::Floating(FloatingContainer::new(window, area)))
    }
}

impl<W: Clone + PartialEq + fmt::Debug> ContainerMap<W> {
    pub(super) fn commit_floating<C>(&mut self, key: ContainerKey, ctx: &LayoutContext<C>)
    where
        C: WindowController<Window = W>,
    {
        let Some(floating) = self.floating_mut(key) else {
            return;
        };
        let Some(next) = floating.next_logical_area.take() else {
            return;
        };

        let previous = floating.logical_area;
        floating.logical_area = next;
        ctx.controller.set_rectangle(&floating.window, previous, next);
    }

    pub(super) fn hide_floating<C>(&mut self, key: ContainerKey, ctx: &LayoutContext<C>)
    where
        C: WindowController<Window = W>,
    {
        let Some(floating) = self.floating_mut(key) else {
            return;
        };
        if floating.pinned {
            return;
        }

        floating.before_shown_state = Some(ctx.controller.get_state(&floating.window));
        ctx.controller.change_state(&floating.window, WindowState::Hidden);
        ctx.controller.send_to_back(&floating.window);
    }

    pub(super) fn show_floating<C>(&mut self, key: ContainerKey, ctx: &LayoutContext<C>)
    where
        C: WindowController<Window = W>,
    {
        let Some(floating) = self.floating_mut(key) else {
            return;
        };
        let Some(state) = floating.before_shown_state.take() else {
            return;
        };

        ctx.controller.change_state(&floating.window, state);
        ctx.controller.raise(&floating.window);
    }

    /// Moves the window so its top-left corner lands on `point`, keeping its size.
    pub(crate) fn floating_move_to<C>(
        &mut self,
        key: ContainerKey,
        point: Point,
        ctx: &LayoutContext<C>,
    ) -> bool
    where
        C: WindowController<Window = W>,
    {
        let Some(floating) = self.floating_mut(key) else {
            return false;
        };
        let area = Rectangle::new(point, floating.logical_area().size);
        trace!("moving floating window to {area}");
        floating.set_logical_area(area);
        self.commit_floating(key, ctx);
        true
    }

    pub(crate) fn floating_move_by<C>(
        &mut self,
        key: ContainerKey,
        direction: Direction,
        pixels: i32,
        ctx: &LayoutContext<C>,
    ) -> bool
    where
        C: WindowController<Window = W>,
    {
        let Some(floating) = self.floating(key) else {
            return false;
        };
        let loc = floating.logical_area().loc;
        let moved = match direction {
            Direction::Up => loc.y.checked_sub(pixels).map(|y| Point { y, ..loc }),
            Direction::Down => loc.y.checked_add(pixels).map(|y| Point { y, ..loc }),
            Direction::Left => loc.x.checked_sub(pixels).map(|x| Point { x, ..loc }),
            Direction::Right => loc.x.checked_add(pixels).map(|x| Point { x, ..loc }),
        };
        let Some(loc) = moved else {
            warn!("unable to move floating window by {pixels}: position out of range");
            return false;
        };
        self.floating_move_to(key, loc, ctx)
    }
}
