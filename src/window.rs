//! The seam between the layout engine and the windowing runtime.
//!
//! The tree never touches surfaces or protocol state. It asks a [`WindowController`] to realize
//! its decisions, and reads output geometry from a [`TilingWindowTreeInterface`].

use std::fmt;

use crate::geometry::{Point, Rectangle, Size};

/// State of a window as tracked by the windowing runtime.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowState {
    #[default]
    Restored,
    Maximized,
    Fullscreen,
    Hidden,
    Minimized,
    Attached,
}

impl WindowState {
    pub fn is_fullscreen(self) -> bool {
        self == WindowState::Fullscreen
    }
}

/// A set of requested changes to a window. Unset fields are left alone.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WindowSpecification {
    pub top_left: Option<Point>,
    pub size: Option<Size>,
    pub state: Option<WindowState>,
    pub server_side_decorated: Option<bool>,
    pub min_width: Option<i32>,
    pub max_width: Option<i32>,
    pub min_height: Option<i32>,
    pub max_height: Option<i32>,
}

/// What the runtime knows about a window.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WindowInfo {
    pub can_be_active: bool,
    pub state: WindowState,
}

/// Realizes geometry and focus decisions on actual windows.
///
/// Methods take `&self`; implementations keep their own interior mutability.
pub trait WindowController {
    type Window: Clone + PartialEq + fmt::Debug;

    /// Moves a window from `from` to `to`. Both are visible areas.
    fn set_rectangle(&self, window: &Self::Window, from: Rectangle, to: Rectangle);
    fn get_state(&self, window: &Self::Window) -> WindowState;
    fn change_state(&self, window: &Self::Window, state: WindowState);
    /// Restricts drawing of the window to `area`.
    fn clip(&self, window: &Self::Window, area: Rectangle);
    fn noclip(&self, window: &Self::Window);
    fn select_active_window(&self, window: &Self::Window);
    fn raise(&self, window: &Self::Window);
    fn send_to_back(&self, window: &Self::Window);
    fn open(&self, window: &Self::Window);
    fn close(&self, window: &Self::Window);
    fn modify(&self, window: &Self::Window, modifications: &WindowSpecification);
    fn info_for(&self, window: &Self::Window) -> WindowInfo;

    fn is_fullscreen(&self, window: &Self::Window) -> bool {
        self.get_state(window).is_fullscreen()
    }
}

/// Opaque identity of the workspace that owns a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkspaceId(pub u64);

/// Output context a tree is laid out in, injected per workspace.
pub trait TilingWindowTreeInterface {
    /// Work areas of the output. The first one is authoritative for the root lane.
    fn get_zones(&self) -> Vec<Rectangle>;
    fn get_workspace(&self) -> WorkspaceId;
}
