//! The tiling tree of one workspace.
//!
//! [`TilingWindowTree`] owns the root lane and every container below it, plus the floating
//! windows and selection groups of the workspace. Operations that need more than a single
//! node's view of the layout live here: placement, directional select and move, resize,
//! scheme changes, fullscreen and visibility.
//!
//! While a leaf is fullscreen the tree holds a fullscreen lock: structural operations are
//! refused until the leaf is restored.

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use anyhow::ensure;
use slotmap::Key as _;
use tracing::{debug, trace, warn};

use lanewm_ipc::{LayoutTreeNode, TreeLayout, TreeNodeType, TreeRect};

use super::container::{Container, ContainerKey, ContainerMap};
use super::{Direction, LayoutContext, LayoutScheme, Options};
use crate::config::{ConfigHandle, ListenerId};
use crate::geometry::{Point, Rectangle};
use crate::window::{
    TilingWindowTreeInterface, WindowController, WindowSpecification, WindowState, WorkspaceId,
};

/// Outcome of looking for where a container moves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveResult {
    /// Next to this leaf.
    Insert(ContainerKey),
    /// At the end of this lane.
    Append(ContainerKey),
    /// At the start of this lane.
    Prepend(ContainerKey),
}

/// The tiling tree of one workspace.
///
/// The tree state is shared with a configuration listener, so replacing the configuration
/// re-lays the tree out and commits it right away. Window controller callbacks must not call
/// back into the tree.
pub struct TilingWindowTree<C: WindowController> {
    state: Rc<RefCell<TreeState<C>>>,
    config: ConfigHandle,
    listener: ListenerId,
}

impl<C: WindowController + 'static> TilingWindowTree<C> {
    pub fn new(
        interface: Box<dyn TilingWindowTreeInterface>,
        controller: Rc<C>,
        config: ConfigHandle,
    ) -> Self {
        let state = TreeState::new(interface, controller, config.clone());
        let stale = state.root_area_stale.clone();
        let state = Rc::new(RefCell::new(state));

        let weak: Weak<RefCell<TreeState<C>>> = Rc::downgrade(&state);
        let listener = config.register_listener(move |_| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            match state.try_borrow_mut() {
                Ok(mut state) => {
                    debug!("configuration changed, recalculating the root area");
                    state.recalculate_root_node_area();
                }
                Err(_) => {
                    debug!("configuration changed during a tree operation, deferring");
                    stale.set(true);
                }
            };
        });

        Self {
            state,
            config,
            listener,
        }
    }
}

impl<C: WindowController> TilingWindowTree<C> {
    pub fn containers(&self) -> Ref<'_, ContainerMap<C::Window>> {
        Ref::map(self.state.borrow(), TreeState::containers)
    }

    pub fn options(&self) -> Options {
        *self.state.borrow().options()
    }

    pub fn get_root(&self) -> ContainerKey {
        self.state.borrow().get_root()
    }

    pub fn get_workspace(&self) -> WorkspaceId {
        self.state.borrow().get_workspace()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    pub fn is_hidden(&self) -> bool {
        self.state.borrow().is_hidden()
    }

    /// Currently focused container, a leaf, a floating window or a group.
    pub fn active_container(&self) -> Option<ContainerKey> {
        self.state.borrow().active_container()
    }

    pub fn fullscreen_container(&self) -> Option<ContainerKey> {
        self.state.borrow().fullscreen_container()
    }

    /// Leaf or floating container holding `window`.
    pub fn container_for(&self, window: &C::Window) -> Option<ContainerKey> {
        self.state.borrow().container_for(window)
    }

    /// Re-derives the options and the root area from the configuration and the first output
    /// zone, then commits the whole tree.
    pub fn recalculate_root_node_area(&mut self) {
        self.state.borrow_mut().recalculate_root_node_area();
    }

    pub fn set_area(&mut self, area: Rectangle) {
        self.state.borrow_mut().set_area(area);
    }

    /// Placement area of the root lane.
    pub fn get_area(&self) -> Rectangle {
        self.state.borrow().get_area()
    }

    /// Reserves a tile for a new window in `lane` (the active lane if `None`).
    ///
    /// Returns the adjusted specification and the lane the placement is pending in. The
    /// window has to be bound with [`Self::confirm_window`].
    pub fn place_new_window(
        &mut self,
        spec: &WindowSpecification,
        lane: Option<ContainerKey>,
    ) -> Option<(WindowSpecification, ContainerKey)> {
        self.state.borrow_mut().place_new_window(spec, lane)
    }

    /// Binds `window` to the tile reserved in `lane`. Returns the new leaf.
    pub fn confirm_window(
        &mut self,
        window: C::Window,
        lane: ContainerKey,
    ) -> Option<ContainerKey> {
        self.state.borrow_mut().confirm_window(window, lane)
    }

    /// Constrains a freshly mapped window and focuses it unless a window is fullscreen.
    pub fn handle_container_ready(&mut self, key: ContainerKey) {
        self.state.borrow_mut().handle_container_ready(key);
    }

    pub fn on_open(&self, key: ContainerKey) {
        self.state.borrow().on_open(key);
    }

    pub fn request_close(&self, key: ContainerKey) -> bool {
        self.state.borrow().request_close(key)
    }

    /// Focuses and raises the window in `key`.
    pub fn handle_raise(&self, key: ContainerKey) {
        self.state.borrow().handle_raise(key);
    }

    /// Applies a client-requested modification to the window in `key`.
    pub fn handle_modify(&mut self, key: ContainerKey, modifications: &WindowSpecification) {
        self.state.borrow_mut().handle_modify(key, modifications);
    }

    /// Forgets the container of a closed window.
    pub fn advise_delete_window(&mut self, key: ContainerKey) -> bool {
        self.state.borrow_mut().advise_delete_window(key)
    }

    /// Rectangle a window should take when the runtime places it in `state`.
    pub fn confirm_placement_on_display(
        &self,
        key: ContainerKey,
        state: WindowState,
        placement: &mut Rectangle,
    ) -> bool {
        self.state
            .borrow()
            .confirm_placement_on_display(key, state, placement)
    }

    pub fn constrain(&self, key: ContainerKey) -> bool {
        self.state.borrow().constrain(key)
    }

    pub fn advise_focus_gained(&mut self, key: ContainerKey) {
        self.state.borrow_mut().advise_focus_gained(key);
    }

    pub fn advise_focus_lost(&mut self, key: ContainerKey) {
        self.state.borrow_mut().advise_focus_lost(key);
    }

    /// Container that selecting in `direction` from `from` would focus.
    pub fn handle_select(&self, from: ContainerKey, direction: Direction) -> Option<ContainerKey> {
        self.state.borrow().handle_select(from, direction)
    }

    pub fn select(&mut self, key: ContainerKey, direction: Direction) -> bool {
        self.state.borrow_mut().select(key, direction)
    }

    pub fn move_container(&mut self, key: ContainerKey, direction: Direction) -> bool {
        self.state.borrow_mut().move_container(key, direction)
    }

    pub fn move_to(&mut self, key: ContainerKey, target: ContainerKey) -> bool {
        self.state.borrow_mut().move_to(key, target)
    }

    /// Resizes the active container by one resize step. Right and down grow it.
    pub fn resize_container(&mut self, direction: Direction) -> bool {
        self.state.borrow_mut().resize_container(direction)
    }

    pub fn resize(&mut self, key: ContainerKey, direction: Direction, pixels: i32) -> bool {
        self.state.borrow_mut().resize(key, direction, pixels)
    }

    pub fn request_horizontal_layout(&mut self, key: ContainerKey) -> bool {
        self.state.borrow_mut().request_horizontal_layout(key)
    }

    pub fn request_vertical_layout(&mut self, key: ContainerKey) -> bool {
        self.state.borrow_mut().request_vertical_layout(key)
    }

    pub fn request_tabbing_layout(&mut self, key: ContainerKey) -> bool {
        self.state.borrow_mut().request_tabbing_layout(key)
    }

    pub fn request_stacking_layout(&mut self, key: ContainerKey) -> bool {
        self.state.borrow_mut().request_stacking_layout(key)
    }

    pub fn toggle_layout(&mut self, key: ContainerKey, cycle_thru_all: bool) -> bool {
        self.state.borrow_mut().toggle_layout(key, cycle_thru_all)
    }

    pub fn toggle_tabbing(&mut self, key: ContainerKey) -> bool {
        self.state.borrow_mut().toggle_tabbing(key)
    }

    pub fn toggle_stacking(&mut self, key: ContainerKey) -> bool {
        self.state.borrow_mut().toggle_stacking(key)
    }

    pub fn toggle_fullscreen(&mut self, key: ContainerKey) -> bool {
        self.state.borrow_mut().toggle_fullscreen(key)
    }

    pub fn advise_fullscreen_container(&mut self, key: ContainerKey) {
        self.state.borrow_mut().advise_fullscreen_container(key);
    }

    pub fn advise_restored_container(&mut self, key: ContainerKey) {
        self.state.borrow_mut().advise_restored_container(key);
    }

    pub fn hide(&mut self) -> bool {
        self.state.borrow_mut().hide()
    }

    /// Shows every window again. Returns the fullscreen leaf, raised last.
    pub fn show(&mut self) -> Option<ContainerKey> {
        self.state.borrow_mut().show()
    }

    pub fn drag_start(&mut self, key: ContainerKey) -> bool {
        self.state.borrow_mut().drag_start(key)
    }

    pub fn drag(&mut self, key: ContainerKey, x: i32, y: i32) -> bool {
        self.state.borrow_mut().drag(key, x, y)
    }

    pub fn drag_stop(&mut self, key: ContainerKey) -> bool {
        self.state.borrow_mut().drag_stop(key)
    }

    pub fn select_window_from_point(&self, x: i32, y: i32) -> Option<ContainerKey> {
        self.state.borrow().select_window_from_point(x, y)
    }

    /// Calls `f` on every tiled container, depth first from the root.
    pub fn foreach_node(&self, f: impl FnMut(ContainerKey, &Container<C::Window>)) {
        self.state.borrow().foreach_node(f);
    }

    pub fn create_group(&mut self, members: &[ContainerKey]) -> ContainerKey {
        self.state.borrow_mut().create_group(members)
    }

    pub fn group_add(&mut self, group: ContainerKey, member: ContainerKey) -> bool {
        self.state.borrow_mut().group_add(group, member)
    }

    pub fn group_remove(&mut self, group: ContainerKey, member: ContainerKey) -> bool {
        self.state.borrow_mut().group_remove(group, member)
    }

    pub fn destroy_group(&mut self, group: ContainerKey) -> bool {
        self.state.borrow_mut().destroy_group(group)
    }

    pub fn select_group(&mut self, group: ContainerKey) -> bool {
        self.state.borrow_mut().select_group(group)
    }

    pub fn add_floating(&mut self, window: C::Window, area: Rectangle) -> ContainerKey {
        self.state.borrow_mut().add_floating(window, area)
    }

    pub fn floating_containers(&self) -> Vec<ContainerKey> {
        self.state.borrow().floating_containers().to_vec()
    }

    pub fn move_by(&mut self, key: ContainerKey, direction: Direction, pixels: i32) -> bool {
        self.state.borrow_mut().move_by(key, direction, pixels)
    }

    pub fn move_to_point(&mut self, key: ContainerKey, x: i32, y: i32) -> bool {
        self.state.borrow_mut().move_to_point(key, x, y)
    }

    pub fn set_pinned(&mut self, key: ContainerKey, pinned: bool) -> bool {
        self.state.borrow_mut().set_pinned(key, pinned)
    }

    pub fn pinned(&self, key: ContainerKey) -> bool {
        self.state.borrow().pinned(key)
    }

    /// Serialisable snapshot of the tree.
    pub fn to_layout_tree(&self) -> LayoutTreeNode {
        self.state.borrow().to_layout_tree()
    }

    /// Checks the structural invariants of the tree.
    pub fn verify_invariants(&self) -> anyhow::Result<()> {
        self.state.borrow().verify_invariants()
    }

    #[cfg(test)]
    pub fn debug_tree(&self) -> String {
        self.state.borrow().debug_tree()
    }
}

impl<C: WindowController> Drop for TilingWindowTree<C> {
    fn drop(&mut self) {
        self.config.unregister_listener(self.listener);
    }
}

/// State behind a [`TilingWindowTree`], shared with its configuration listener.
struct TreeState<C: WindowController> {
    containers: ContainerMap<C::Window>,
    ctx: LayoutContext<C>,
    root: ContainerKey,
    interface: Box<dyn TilingWindowTreeInterface>,
    config: ConfigHandle,
    /// Set when a configuration change arrives while the tree is busy.
    root_area_stale: Rc<Cell<bool>>,
    /// Leaf holding the fullscreen lock.
    fullscreen: Option<ContainerKey>,
    hidden: bool,
    floating: Vec<ContainerKey>,
    groups: Vec<ContainerKey>,
}

impl<C: WindowController> TreeState<C> {
    fn new(
        interface: Box<dyn TilingWindowTreeInterface>,
        controller: Rc<C>,
        config: ConfigHandle,
    ) -> Self {
        let options = Options::from_config(&config.get());
        let area = interface.get_zones().first().copied().unwrap_or_default();

        let mut containers = ContainerMap::new();
        let root = containers.new_lane(area, LayoutScheme::Horizontal, None);

        debug!("created tiling tree in {area}");
        Self {
            containers,
            ctx: LayoutContext::new(controller, options),
            root,
            interface,
            config,
            root_area_stale: Rc::new(Cell::new(false)),
            fullscreen: None,
            hidden: false,
            floating: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn containers(&self) -> &ContainerMap<C::Window> {
        &self.containers
    }

    pub fn options(&self) -> &Options {
        &self.ctx.options
    }

    pub fn get_root(&self) -> ContainerKey {
        self.root
    }

    pub fn get_workspace(&self) -> WorkspaceId {
        self.interface.get_workspace()
    }

    pub fn is_empty(&self) -> bool {
        self.containers
            .lane(self.root)
            .map_or(true, |root| root.num_nodes() == 0)
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Currently focused container, a leaf, a floating window or a group.
    pub fn active_container(&self) -> Option<ContainerKey> {
        self.ctx.active.filter(|key| self.containers.contains(*key))
    }

    pub fn fullscreen_container(&self) -> Option<ContainerKey> {
        self.fullscreen
    }

    /// Leaf or floating container holding `window`.
    pub fn container_for(&self, window: &C::Window) -> Option<ContainerKey> {
        self.containers
            .iter()
            .find(|(_, container)| container.window() == Some(window))
            .map(|(key, _)| key)
    }

    // ========================================================================
    // Root area and configuration
    // ========================================================================

    /// Applies a configuration change that arrived while the tree was busy.
    fn sync_config(&mut self) {
        if self.root_area_stale.replace(false) {
            debug!("configuration changed, recalculating the root area");
            self.recalculate_root_node_area();
        }
    }

    /// Re-derives the options and the root area from the configuration and the first output
    /// zone, then commits the whole tree.
    pub fn recalculate_root_node_area(&mut self) {
        self.root_area_stale.set(false);
        self.ctx.options = Options::from_config(&self.config.get());

        let Some(zone) = self.interface.get_zones().first().copied() else {
            warn!("unable to recalculate the root area: no output zone");
            return;
        };
        self.set_area(zone);
    }

    pub fn set_area(&mut self, area: Rectangle) {
        self.containers
            .set_logical_area(self.root, area, &self.ctx.options);
        self.containers.commit(self.root, &self.ctx);
    }

    /// Placement area of the root lane.
    pub fn get_area(&self) -> Rectangle {
        self.containers.lane_area(self.root, &self.ctx.options)
    }

    // ========================================================================
    // Placement and window lifecycle
    // ========================================================================

    /// Reserves a tile for a new window in `lane` (the active lane if `None`).
    ///
    /// Returns the adjusted specification and the lane the placement is pending in. The
    /// window has to be bound with [`Self::confirm_window`].
    pub fn place_new_window(
        &mut self,
        spec: &WindowSpecification,
        lane: Option<ContainerKey>,
    ) -> Option<(WindowSpecification, ContainerKey)> {
        self.sync_config();

        let lane = lane
            .filter(|lane| self.is_tiled(*lane) && self.containers.lane(*lane).is_some())
            .unwrap_or_else(|| self.active_lane());

        let leaf = self
            .containers
            .create_space_for_window(lane, &self.ctx.options)?;

        let mut spec = spec.clone();
        spec.server_side_decorated = Some(false);
        spec.min_width = Some(0);
        spec.min_height = Some(0);
        spec.max_width = Some(i32::MAX);
        spec.max_height = Some(i32::MAX);

        if spec.state != Some(WindowState::Fullscreen) {
            let area = self.containers.visible_area(leaf, &self.ctx.options);
            spec.top_left = Some(area.loc);
            spec.size = Some(area.size);
        }

        Some((spec, lane))
    }

    /// Binds `window` to the tile reserved in `lane`. Returns the new leaf.
    pub fn confirm_window(
        &mut self,
        window: C::Window,
        lane: ContainerKey,
    ) -> Option<ContainerKey> {
        self.sync_config();
        let leaf = self.containers.confirm_window(lane, window, &self.ctx)?;
        trace!("confirmed window in {leaf:?}");
        Some(leaf)
    }

    /// Constrains a freshly mapped window and focuses it if it accepts focus.
    ///
    /// Focus stays with the fullscreen leaf while the tree is locked.
    pub fn handle_container_ready(&mut self, key: ContainerKey) {
        self.sync_config();
        self.containers.constrain(key, &self.ctx);

        if let Some(fullscreen) = self.fullscreen {
            trace!("{key:?} is ready, focus stays with fullscreen {fullscreen:?}");
            return;
        }

        let Some(window) = self.containers.window(key).cloned() else {
            return;
        };
        if self.ctx.controller.info_for(&window).can_be_active {
            self.ctx.controller.select_active_window(&window);
            self.advise_focus_gained(key);
        }
    }

    pub fn on_open(&self, key: ContainerKey) {
        if let Some(window) = self.containers.window(key) {
            self.ctx.controller.open(window);
        }
    }

    pub fn request_close(&self, key: ContainerKey) -> bool {
        let Some(window) = self.containers.window(key) else {
            return false;
        };
        self.ctx.controller.close(window);
        true
    }

    /// Focuses and raises the window in `key`.
    pub fn handle_raise(&self, key: ContainerKey) {
        if let Some(window) = self.containers.window(key) {
            self.ctx.controller.select_active_window(window);
            self.ctx.controller.raise(window);
        }
    }

    /// Applies a client-requested modification to the window in `key`.
    ///
    /// State changes of a tiled window drive fullscreen and restore. A tiled window asking for
    /// a size other than its tile has that size dropped unless it is fullscreen. Floating
    /// windows get the request as is.
    pub fn handle_modify(&mut self, key: ContainerKey, modifications: &WindowSpecification) {
        self.sync_config();
        let Some(window) = self.containers.window(key).cloned() else {
            return;
        };

        let mut forwarded = modifications.clone();
        if self.containers.leaf(key).is_some() {
            if let Some(state) = modifications.state {
                if !self.apply_client_state(key, &window, state) {
                    forwarded.state = None;
                }
            }
            if let Some(size) = modifications.size {
                let visible = self.containers.visible_area(key, &self.ctx.options);
                if !self.containers.is_fullscreen(key, &self.ctx) && size != visible.size {
                    trace!("ignoring a resize request from a tiled window");
                    forwarded.size = None;
                }
            }
        }

        self.ctx.controller.modify(&window, &forwarded);
    }

    /// Moves the leaf `key` into a client-requested state. Returns `false` if the request was
    /// refused.
    fn apply_client_state(
        &mut self,
        key: ContainerKey,
        window: &C::Window,
        state: WindowState,
    ) -> bool {
        let current = self.ctx.controller.get_state(window);
        if state == current {
            return true;
        }
        if state.is_fullscreen() {
            if let Some(holder) = self.fullscreen.filter(|holder| *holder != key) {
                warn!("refusing fullscreen for {key:?}: {holder:?} is fullscreen");
                return false;
            }
        }

        if let Some(leaf) = self.containers.leaf_mut(key) {
            leaf.set_state(state);
        }
        self.containers.commit(key, &self.ctx);

        if state.is_fullscreen() {
            self.advise_fullscreen_container(key);
        } else if current.is_fullscreen() {
            self.advise_restored_container(key);
        }
        true
    }

    /// Forgets the container of a closed window.
    pub fn advise_delete_window(&mut self, key: ContainerKey) -> bool {
        self.sync_config();

        if self.fullscreen == Some(key) {
            self.fullscreen = None;
        }
        if self.ctx.active == Some(key) {
            self.ctx.active = None;
        }

        match self.containers.get(key) {
            Some(Container::Leaf(_)) => {
                let Some(lane) = self.handle_remove(key) else {
                    warn!("unable to delete a window without a parent");
                    return false;
                };
                self.containers.destroy(key);
                self.containers.commit(lane, &self.ctx);
                true
            }
            Some(Container::Floating(_)) => {
                self.floating.retain(|floating| *floating != key);
                self.containers.destroy(key);
                true
            }
            Some(Container::Parent(_) | Container::Group(_)) | None => false,
        }
    }

    /// Rectangle a window should take when the runtime places it in `state`.
    pub fn confirm_placement_on_display(
        &self,
        key: ContainerKey,
        state: WindowState,
        placement: &mut Rectangle,
    ) -> bool {
        if state == WindowState::Restored {
            *placement = self.containers.visible_area(key, &self.ctx.options);
        }
        true
    }

    /// Re-applies clipping to the lane holding `key`.
    pub fn constrain(&self, key: ContainerKey) -> bool {
        if self.hidden {
            return false;
        }

        match self.containers.parent_of(key) {
            Some(parent) => self.containers.constrain(parent, &self.ctx),
            None => warn!("unable to constrain a container without a parent"),
        }
        true
    }

    // ========================================================================
    // Focus
    // ========================================================================

    /// Records `key` as the active container.
    ///
    /// Under the fullscreen lock the fullscreen window is raised again instead.
    pub fn advise_focus_gained(&mut self, key: ContainerKey) {
        if let Some(fullscreen) = self.fullscreen {
            if let Some(window) = self.containers.window(fullscreen) {
                self.ctx.controller.raise(window);
            }
            if fullscreen != key {
                return;
            }
        }

        if !self.containers.contains(key) {
            return;
        }
        self.ctx.active = Some(key);

        let mut node = key;
        while let Some(parent) = self.containers.parent_of(node) {
            if let Some(lane) = self.containers.lane_mut(parent) {
                lane.set_last_active(node);
            }
            node = parent;
        }

        if let Some(parent) = self.containers.parent_of(key) {
            self.containers.lane_on_focus_gained(parent, &self.ctx);
        }
    }

    pub fn advise_focus_lost(&mut self, key: ContainerKey) {
        if self.ctx.active == Some(key) {
            self.ctx.active = None;
        }
    }

    fn select_next(&mut self, key: ContainerKey) {
        if let Some(window) = self.containers.window(key) {
            self.ctx.controller.select_active_window(window);
        }
        self.advise_focus_gained(key);
    }

    /// Lane new windows are placed in: the parent of the active leaf, or the root.
    fn active_lane(&self) -> ContainerKey {
        self.active_container()
            .filter(|key| self.containers.leaf(*key).is_some())
            .and_then(|key| self.containers.parent_of(key))
            .unwrap_or(self.root)
    }

    // ========================================================================
    // Directional navigation
    // ========================================================================

    /// Leaf adjacent to `from` in `direction`, if any.
    pub fn handle_select(&self, from: ContainerKey, direction: Direction) -> Option<ContainerKey> {
        let mut node = from;
        loop {
            let (parent, index) = self.containers.position_in_parent(node)?;
            let lane = self.containers.lane(parent)?;

            if select_axis_matches(lane.scheme(), direction) {
                let target = if direction.is_negative() {
                    index.checked_sub(1)
                } else {
                    Some(index + 1).filter(|next| *next < lane.num_nodes())
                };
                if let Some(target) = target.and_then(|target| lane.at(target)) {
                    return self.closest_window_from(target, direction);
                }
            }

            node = parent;
        }
    }

    /// Leaf to land on when entering `node` while travelling in `direction`.
    fn closest_window_from(
        &self,
        node: ContainerKey,
        direction: Direction,
    ) -> Option<ContainerKey> {
        match self.containers.get(node)? {
            Container::Leaf(_) => Some(node),
            Container::Parent(lane) => {
                let children = lane.get_sub_nodes();
                if select_axis_matches(lane.scheme(), direction) && direction.is_negative() {
                    children
                        .iter()
                        .rev()
                        .find_map(|child| self.closest_window_from(*child, direction))
                } else {
                    children
                        .iter()
                        .find_map(|child| self.closest_window_from(*child, direction))
                }
            }
            Container::Group(_) | Container::Floating(_) => None,
        }
    }

    /// Focuses the leaf adjacent to `key` in `direction`.
    pub fn select(&mut self, key: ContainerKey, direction: Direction) -> bool {
        self.sync_config();
        if !self.check_structural(key, "select") {
            return false;
        }

        let Some(target) = self.handle_select(key, direction) else {
            debug!("nothing to select {direction:?}");
            return false;
        };
        self.select_next(target);
        true
    }

    // ========================================================================
    // Moving containers
    // ========================================================================

    fn handle_move(&mut self, from: ContainerKey, direction: Direction) -> Option<MoveResult> {
        if let Some(target) = self.handle_select(from, direction) {
            return Some(MoveResult::Insert(target));
        }

        let parent = self.containers.parent_of(from)?;
        if parent == self.root {
            let scheme = self.containers.lane(self.root)?.scheme();
            if scheme == LayoutScheme::from_direction(direction) {
                debug!("{direction:?} is already the edge of the root lane");
                return None;
            }
            self.wrap_root(LayoutScheme::from_direction(direction));
        }

        if direction.is_negative() {
            Some(MoveResult::Prepend(self.root))
        } else {
            Some(MoveResult::Append(self.root))
        }
    }

    /// Makes the root lane the sole child of a new root with `scheme`.
    fn wrap_root(&mut self, scheme: LayoutScheme) {
        let old_root = self.root;
        let Some(area) = self.containers.lane(old_root).map(|_| self.raw_root_area()) else {
            return;
        };

        let new_root = self.containers.new_lane(area, scheme, None);
        self.containers.graft_existing(new_root, old_root, 0, &self.ctx);
        if let Some(lane) = self.containers.lane_mut(new_root) {
            lane.set_last_active(old_root);
        }
        self.root = new_root;
        debug!("wrapped the root in a new {} lane", scheme.as_str());
        self.recalculate_root_node_area();
    }

    /// Root area before the outer gaps are applied.
    fn raw_root_area(&self) -> Rectangle {
        let options = &self.ctx.options;
        let area = self.containers.lane_area(self.root, options);
        area.inset(-options.outer_gaps_x, -options.outer_gaps_y)
    }

    /// Moves `key` one step in `direction`, wrapping the root if needed.
    pub fn move_container(&mut self, key: ContainerKey, direction: Direction) -> bool {
        self.sync_config();
        if !self.check_structural(key, "move") {
            return false;
        }
        if self.containers.leaf(key).is_none() {
            warn!("only windows can be moved through the tree");
            return false;
        }

        let Some(result) = self.handle_move(key, direction) else {
            return false;
        };
        trace!("moving {key:?}: {result:?}");

        match result {
            MoveResult::Insert(target) => self.move_to_internal(key, target),
            MoveResult::Append(lane) | MoveResult::Prepend(lane) => {
                let Some(old_lane) = self.handle_remove(key) else {
                    return false;
                };
                let index = match result {
                    MoveResult::Prepend(_) => 0,
                    _ => self.containers.lane(lane).map_or(0, |lane| lane.num_nodes()),
                };
                self.containers.graft_existing(lane, key, index, &self.ctx);
                self.containers.commit(old_lane, &self.ctx);
                self.containers.commit(lane, &self.ctx);
                true
            }
        }
    }

    /// Moves `key` next to `target`: swapped when they share a lane, placed right after
    /// `target` otherwise.
    pub fn move_to(&mut self, key: ContainerKey, target: ContainerKey) -> bool {
        self.sync_config();
        if !self.check_structural(key, "move") {
            return false;
        }
        if self.containers.leaf(key).is_none() || !self.is_tiled(target) || key == target {
            warn!("unable to move {key:?} to {target:?}");
            return false;
        }
        self.move_to_internal(key, target)
    }

    fn move_to_internal(&mut self, key: ContainerKey, target: ContainerKey) -> bool {
        let (Some(parent), Some(target_parent)) = (
            self.containers.parent_of(key),
            self.containers.parent_of(target),
        ) else {
            return false;
        };

        if parent == target_parent {
            if !self.containers.swap_nodes(parent, key, target, &self.ctx) {
                return false;
            }
            self.containers.commit(parent, &self.ctx);
            return true;
        }

        self.transfer_node(key, target)
    }

    /// Detaches `key` and inserts it right after `target` in `target`'s lane.
    fn transfer_node(&mut self, key: ContainerKey, target: ContainerKey) -> bool {
        let Some(old_lane) = self.handle_remove(key) else {
            return false;
        };
        // Detaching can flatten lanes, so the target's position is looked up afterwards.
        let Some((lane, index)) = self.containers.position_in_parent(target) else {
            return false;
        };

        self.containers.graft_existing(lane, key, index + 1, &self.ctx);
        if self.containers.contains(old_lane) {
            self.containers.commit(old_lane, &self.ctx);
        }
        self.containers.commit(lane, &self.ctx);
        true
    }

    /// Detaches `node` from its lane and drops every lane left empty above it.
    ///
    /// Returns the closest surviving lane. `node` itself stays in the arena.
    fn handle_remove(&mut self, node: ContainerKey) -> Option<ContainerKey> {
        let mut lane = self.containers.parent_of(node)?;
        self.containers.remove(lane, node, &self.ctx.options);

        loop {
            let Some(lane_ref) = self.containers.lane(lane) else {
                break;
            };
            if lane_ref.num_nodes() > 0 {
                break;
            }
            let Some(grandparent) = lane_ref.parent() else {
                break;
            };

            self.containers.remove(grandparent, lane, &self.ctx.options);
            self.containers.destroy(lane);
            lane = grandparent;
        }

        Some(lane)
    }

    // ========================================================================
    // Resizing
    // ========================================================================

    /// Resizes the active container by one resize step. Right and down grow it.
    pub fn resize_container(&mut self, direction: Direction) -> bool {
        let Some(active) = self.active_container() else {
            warn!("unable to resize: no active container");
            return false;
        };
        let jump = self.ctx.options.resize_jump;
        self.resize(active, direction, -jump)
    }

    /// Resizes `key` by `pixels` along `direction`'s axis.
    ///
    /// Negative directions invert the sign: `pixels` taken away moving left or up is given
    /// back moving right or down.
    pub fn resize(&mut self, key: ContainerKey, direction: Direction, pixels: i32) -> bool {
        self.sync_config();
        if !self.check_structural(key, "resize") {
            return false;
        }
        self.handle_resize(key, direction, pixels)
    }

    fn handle_resize(&mut self, node: ContainerKey, direction: Direction, pixels: i32) -> bool {
        let Some((parent, index)) = self.containers.position_in_parent(node) else {
            warn!("unable to resize: no ancestor lane runs {direction:?}");
            return false;
        };
        let Some(lane) = self.containers.lane(parent) else {
            return false;
        };

        if lane.scheme() != LayoutScheme::from_direction(direction) {
            return self.handle_resize(parent, direction, pixels);
        }
        if lane.num_nodes() == 1 {
            debug!("unable to resize: nothing to take the space from");
            return false;
        }

        let amount = if direction.is_negative() {
            pixels.checked_neg()
        } else {
            Some(pixels)
        };
        let Some(amount) = amount else {
            warn!("unable to resize by {pixels}: amount out of range");
            return false;
        };
        if !self
            .containers
            .resize_child(parent, index, amount, &self.ctx.options)
        {
            return false;
        }

        self.containers.commit(parent, &self.ctx);
        true
    }

    // ========================================================================
    // Layout schemes
    // ========================================================================

    pub fn request_horizontal_layout(&mut self, key: ContainerKey) -> bool {
        self.handle_layout_scheme(LayoutScheme::Horizontal, key)
    }

    pub fn request_vertical_layout(&mut self, key: ContainerKey) -> bool {
        self.handle_layout_scheme(LayoutScheme::Vertical, key)
    }

    pub fn request_tabbing_layout(&mut self, key: ContainerKey) -> bool {
        self.handle_layout_scheme(LayoutScheme::Tabbing, key)
    }

    pub fn request_stacking_layout(&mut self, key: ContainerKey) -> bool {
        self.handle_layout_scheme(LayoutScheme::Stacking, key)
    }

    /// Flips between horizontal and vertical, or cycles through every scheme.
    pub fn toggle_layout(&mut self, key: ContainerKey, cycle_thru_all: bool) -> bool {
        let Some(scheme) = self.scheme_for(key) else {
            return false;
        };

        let next = match (scheme, cycle_thru_all) {
            (LayoutScheme::Horizontal, _) => LayoutScheme::Vertical,
            (LayoutScheme::Vertical, false) => LayoutScheme::Horizontal,
            (LayoutScheme::Vertical, true) => LayoutScheme::Stacking,
            (LayoutScheme::Stacking, true) => LayoutScheme::Tabbing,
            (LayoutScheme::Tabbing, true) => LayoutScheme::Horizontal,
            (LayoutScheme::Tabbing | LayoutScheme::Stacking, false) => {
                warn!("a stacked lane cannot be toggled");
                return false;
            }
        };
        self.handle_layout_scheme(next, key)
    }

    pub fn toggle_tabbing(&mut self, key: ContainerKey) -> bool {
        self.toggle_stacked(key, LayoutScheme::Tabbing)
    }

    pub fn toggle_stacking(&mut self, key: ContainerKey) -> bool {
        self.toggle_stacked(key, LayoutScheme::Stacking)
    }

    fn toggle_stacked(&mut self, key: ContainerKey, scheme: LayoutScheme) -> bool {
        let Some(current) = self.scheme_for(key) else {
            return false;
        };

        if current == scheme {
            self.handle_layout_scheme(LayoutScheme::Horizontal, key)
        } else {
            self.handle_layout_scheme(scheme, key)
        }
    }

    /// Scheme a request on `key` would change: its own for a lane, its parent's for a leaf.
    fn scheme_for(&self, key: ContainerKey) -> Option<LayoutScheme> {
        match self.containers.get(key)? {
            Container::Parent(lane) => Some(lane.scheme()),
            Container::Leaf(leaf) => Some(self.containers.lane(leaf.parent()?)?.scheme()),
            Container::Group(_) | Container::Floating(_) => {
                warn!("layout schemes only apply to tiled containers");
                None
            }
        }
    }

    fn handle_layout_scheme(&mut self, scheme: LayoutScheme, key: ContainerKey) -> bool {
        self.sync_config();
        if !self.check_structural(key, "change the layout of") {
            return false;
        }

        let lane = match self.containers.get(key) {
            Some(Container::Parent(_)) => key,
            Some(Container::Leaf(leaf)) => {
                let Some(parent) = leaf.parent() else {
                    warn!("unable to change the layout: no parent");
                    return false;
                };
                let Some(parent_ref) = self.containers.lane(parent) else {
                    return false;
                };

                if parent_ref.num_nodes() > 1 && parent_ref.scheme() != LayoutScheme::Tabbing {
                    let Some(lane) = self
                        .containers
                        .convert_to_parent(parent, key, &self.ctx.options)
                    else {
                        return false;
                    };
                    lane
                } else {
                    parent
                }
            }
            _ => return false,
        };

        self.containers.set_scheme(lane, scheme, &self.ctx);
        true
    }

    // ========================================================================
    // Fullscreen
    // ========================================================================

    /// Toggles fullscreen on the leaf `key`.
    pub fn toggle_fullscreen(&mut self, key: ContainerKey) -> bool {
        self.sync_config();
        if let Some(fullscreen) = self.fullscreen {
            if fullscreen != key {
                warn!("unable to toggle fullscreen: another window is fullscreen");
                return false;
            }
        }

        let Some(window) = self.containers.leaf(key).and_then(|leaf| leaf.window()).cloned() else {
            warn!("only tiled windows can be made fullscreen");
            return false;
        };

        let next = if self.ctx.controller.is_fullscreen(&window) {
            WindowState::Restored
        } else {
            WindowState::Fullscreen
        };
        if let Some(leaf) = self.containers.leaf_mut(key) {
            leaf.set_state(next);
        }
        self.containers.commit(key, &self.ctx);

        if next.is_fullscreen() {
            self.advise_fullscreen_container(key);
        } else {
            self.advise_restored_container(key);
        }
        true
    }

    /// Takes the fullscreen lock for `key`, raising and focusing its window.
    ///
    /// While another leaf holds the lock the window of `key` is restored instead.
    pub fn advise_fullscreen_container(&mut self, key: ContainerKey) {
        if let Some(holder) = self.fullscreen.filter(|holder| *holder != key) {
            warn!("{holder:?} is fullscreen, restoring {key:?}");
            if let Some(leaf) = self.containers.leaf_mut(key) {
                leaf.set_state(WindowState::Restored);
            }
            self.containers.commit(key, &self.ctx);
            return;
        }

        let Some(window) = self.containers.leaf(key).and_then(|leaf| leaf.window()) else {
            return;
        };
        self.ctx.controller.select_active_window(window);
        self.ctx.controller.raise(window);
        self.fullscreen = Some(key);
        self.ctx.active = Some(key);
    }

    /// Releases the fullscreen lock if `key` holds it and puts the window back into its tile.
    pub fn advise_restored_container(&mut self, key: ContainerKey) {
        if self.fullscreen != Some(key) {
            return;
        }
        self.fullscreen = None;

        let area = self.containers.logical_area(key, &self.ctx.options);
        self.containers
            .set_logical_area(key, area, &self.ctx.options);
        self.containers.commit(key, &self.ctx);
    }

    // ========================================================================
    // Visibility
    // ========================================================================

    pub fn hide(&mut self) -> bool {
        if self.hidden {
            warn!("tree is already hidden");
            return false;
        }

        self.hidden = true;
        self.containers.hide(self.root, &self.ctx);
        for floating in self.floating.clone() {
            self.containers.hide(floating, &self.ctx);
        }
        true
    }

    /// Shows every window again. Returns the fullscreen leaf, raised last.
    pub fn show(&mut self) -> Option<ContainerKey> {
        if !self.hidden {
            warn!("tree is already shown");
            return None;
        }

        self.hidden = false;
        self.containers.show(self.root, &self.ctx);
        for floating in self.floating.clone() {
            self.containers.show(floating, &self.ctx);
        }

        let fullscreen = self.fullscreen?;
        if let Some(window) = self.containers.window(fullscreen) {
            self.ctx.controller.raise(window);
        }
        Some(fullscreen)
    }

    // ========================================================================
    // Dragging
    // ========================================================================

    pub fn drag_start(&mut self, key: ContainerKey) -> bool {
        if !self.check_not_locked("drag") {
            return false;
        }
        match self.containers.get(key) {
            Some(Container::Leaf(_)) => self.containers.leaf_drag_start(key, &self.ctx),
            Some(Container::Floating(_)) => true,
            _ => false,
        }
    }

    pub fn drag(&mut self, key: ContainerKey, x: i32, y: i32) -> bool {
        match self.containers.get(key) {
            Some(Container::Leaf(_)) => self.containers.leaf_drag(key, x, y, &self.ctx),
            Some(Container::Floating(_)) => {
                self.containers
                    .floating_move_to(key, Point::from((x, y)), &self.ctx)
            }
            _ => false,
        }
    }

    pub fn drag_stop(&mut self, key: ContainerKey) -> bool {
        match self.containers.get(key) {
            Some(Container::Leaf(_)) => self.containers.leaf_drag_stop(key, &self.ctx),
            Some(Container::Floating(_)) => true,
            _ => false,
        }
    }

    // ========================================================================
    // Lookup and traversal
    // ========================================================================

    /// Window under `(x, y)`: the fullscreen leaf under the lock, otherwise the topmost
    /// floating window, otherwise the tiled leaf.
    pub fn select_window_from_point(&self, x: i32, y: i32) -> Option<ContainerKey> {
        if let Some(fullscreen) = self.fullscreen {
            return Some(fullscreen);
        }

        let options = &self.ctx.options;
        self.floating
            .iter()
            .rev()
            .copied()
            .find(|key| self.containers.logical_area(*key, options).contains((x, y)))
            .or_else(|| {
                self.containers.find_where(self.root, |key, container| {
                    container.is_leaf()
                        && self.containers.logical_area(key, options).contains((x, y))
                })
            })
    }

    /// Calls `f` on every tiled container, depth first from the root.
    pub fn foreach_node(&self, mut f: impl FnMut(ContainerKey, &Container<C::Window>)) {
        for key in self.containers.descendants(self.root) {
            if let Some(container) = self.containers.get(key) {
                f(key, container);
            }
        }
    }

    /// Whether `key` is part of the tiled structure.
    fn is_tiled(&self, key: ContainerKey) -> bool {
        let mut node = key;
        loop {
            match self.containers.get(node) {
                Some(Container::Leaf(_) | Container::Parent(_)) => (),
                _ => return false,
            }
            match self.containers.parent_of(node) {
                Some(parent) => node = parent,
                None => return node == self.root,
            }
        }
    }

    fn check_not_locked(&self, operation: &str) -> bool {
        if self.fullscreen.is_some() {
            warn!("unable to {operation}: a window is fullscreen");
            return false;
        }
        true
    }

    /// Refuses structural operations under the fullscreen lock and on containers outside the
    /// tiled structure.
    fn check_structural(&self, key: ContainerKey, operation: &str) -> bool {
        if !self.check_not_locked(operation) {
            return false;
        }
        if !self.is_tiled(key) {
            warn!("unable to {operation} {key:?}: not a tiled container");
            return false;
        }
        true
    }

    // ========================================================================
    // Groups
    // ========================================================================

    /// Starts a multi-selection with `members`.
    pub fn create_group(&mut self, members: &[ContainerKey]) -> ContainerKey {
        let group = self.containers.new_group();
        for member in members {
            self.containers.group_add(group, *member);
        }
        self.groups.push(group);
        group
    }

    pub fn group_add(&mut self, group: ContainerKey, member: ContainerKey) -> bool {
        self.containers.prune_group(group);
        self.containers.group_add(group, member)
    }

    pub fn group_remove(&mut self, group: ContainerKey, member: ContainerKey) -> bool {
        self.containers.prune_group(group);
        self.containers
            .group_mut(group)
            .is_some_and(|group| group.remove(member))
    }

    pub fn destroy_group(&mut self, group: ContainerKey) -> bool {
        if self.containers.group(group).is_none() {
            return false;
        }
        if self.ctx.active == Some(group) {
            self.ctx.active = None;
        }
        self.groups.retain(|key| *key != group);
        self.containers.destroy(group);
        true
    }

    /// Makes the group the active container.
    pub fn select_group(&mut self, group: ContainerKey) -> bool {
        if self.containers.group(group).is_none() || !self.check_not_locked("select a group") {
            return false;
        }
        self.containers.prune_group(group);
        self.ctx.active = Some(group);
        true
    }

    // ========================================================================
    // Floating windows
    // ========================================================================

    pub fn add_floating(&mut self, window: C::Window, area: Rectangle) -> ContainerKey {
        self.sync_config();
        let key = self.containers.new_floating(window, area);
        self.floating.push(key);
        if let Some(floating) = self.containers.floating(key) {
            self.ctx
                .controller
                .set_rectangle(floating.window(), area, area);
            self.ctx.controller.noclip(floating.window());
        }
        key
    }

    pub fn floating_containers(&self) -> &[ContainerKey] {
        &self.floating
    }

    pub fn move_by(&mut self, key: ContainerKey, direction: Direction, pixels: i32) -> bool {
        self.containers
            .floating_move_by(key, direction, pixels, &self.ctx)
    }

    pub fn move_to_point(&mut self, key: ContainerKey, x: i32, y: i32) -> bool {
        self.containers
            .floating_move_to(key, Point::from((x, y)), &self.ctx)
    }

    pub fn set_pinned(&mut self, key: ContainerKey, pinned: bool) -> bool {
        let Some(floating) = self.containers.floating_mut(key) else {
            return false;
        };
        floating.set_pinned(pinned);
        true
    }

    pub fn pinned(&self, key: ContainerKey) -> bool {
        self.containers
            .get(key)
            .is_some_and(|container| container.pinned())
    }

    // ========================================================================
    // Snapshots and checks
    // ========================================================================

    /// Serialisable snapshot of the tree.
    pub fn to_layout_tree(&self) -> LayoutTreeNode {
        let mut root = self.layout_node(self.root);
        root.floating_nodes = self
            .floating
            .iter()
            .map(|key| self.layout_node(*key))
            .collect();
        root
    }

    fn layout_node(&self, key: ContainerKey) -> LayoutTreeNode {
        let options = &self.ctx.options;
        let rect = to_tree_rect(self.containers.logical_area(key, options));
        let lane = self.containers.lane(key);

        LayoutTreeNode {
            id: key.data().as_ffi(),
            node_type: if self.containers.floating(key).is_some() {
                TreeNodeType::FloatingCon
            } else {
                TreeNodeType::Con
            },
            layout: lane.map(|lane| match lane.scheme() {
                LayoutScheme::Horizontal => TreeLayout::SplitH,
                LayoutScheme::Vertical => TreeLayout::SplitV,
                LayoutScheme::Tabbing => TreeLayout::Tabbed,
                LayoutScheme::Stacking => TreeLayout::Stacked,
            }),
            rect,
            window_rect: to_tree_rect(self.containers.visible_area(key, options)),
            percent: self
                .containers
                .percent_of_parent(key, options, self.ctx.active),
            focused: self.containers.is_focused(key, self.ctx.active),
            fullscreen_mode: u8::from(self.fullscreen == Some(key)),
            visible: !self.hidden || self.pinned(key),
            nodes: lane
                .map(|lane| {
                    lane.get_sub_nodes()
                        .iter()
                        .map(|child| self.layout_node(*child))
                        .collect()
                })
                .unwrap_or_default(),
            floating_nodes: Vec::new(),
        }
    }

    /// Checks the structural invariants of the tree.
    pub fn verify_invariants(&self) -> anyhow::Result<()> {
        let options = &self.ctx.options;
        let root = self.containers.lane(self.root);
        ensure!(root.is_some(), "root must be a lane");
        ensure!(
            self.containers.parent_of(self.root).is_none(),
            "root must not have a parent"
        );

        let reachable = self.containers.descendants(self.root);
        for key in &reachable {
            let Some(lane) = self.containers.lane(*key) else {
                continue;
            };

            ensure!(
                *key == self.root || lane.num_nodes() > 0,
                "non-root lane {key:?} is empty"
            );
            if let Some(pending) = lane.pending() {
                ensure!(
                    lane.get_sub_nodes().contains(&pending),
                    "pending leaf of {key:?} is not its child"
                );
            }

            for child in lane.get_sub_nodes() {
                ensure!(
                    self.containers.parent_of(*child) == Some(*key),
                    "{child:?} does not point back to its lane {key:?}"
                );
                if let Some(leaf) = self.containers.leaf(*child) {
                    ensure!(
                        leaf.window().is_some() || lane.pending() == Some(*child),
                        "{child:?} has no window and is not pending"
                    );
                }
            }

            if !lane.scheme().is_stacked() && lane.num_nodes() > 0 {
                let vertical = lane.scheme() == LayoutScheme::Vertical;
                let area = self.containers.lane_area(*key, options);
                let mut total = 0;
                for child in lane.get_sub_nodes() {
                    let child_area = self.containers.logical_area(*child, options);
                    let (extent, cross, lane_cross) = if vertical {
                        (child_area.size.h, child_area.size.w, area.size.w)
                    } else {
                        (child_area.size.w, child_area.size.h, area.size.h)
                    };
                    ensure!(
                        cross == lane_cross,
                        "{child:?} spans {cross} across {key:?}, expected {lane_cross}"
                    );
                    total += extent;
                }
                let expected = if vertical { area.size.h } else { area.size.w };
                ensure!(
                    total == expected,
                    "children of {key:?} add up to {total}, expected {expected}"
                );
            }
        }

        if let Some(fullscreen) = self.fullscreen {
            ensure!(
                self.containers.leaf(fullscreen).is_some() && reachable.contains(&fullscreen),
                "fullscreen container {fullscreen:?} is not a tiled leaf"
            );
        }

        let fullscreen_leaves: Vec<_> = reachable
            .iter()
            .copied()
            .filter(|key| self.containers.is_fullscreen(*key, &self.ctx))
            .collect();
        ensure!(
            fullscreen_leaves.len() <= 1,
            "{} leaves are fullscreen at once",
            fullscreen_leaves.len()
        );
        if let Some(leaf) = fullscreen_leaves.first() {
            ensure!(
                self.fullscreen == Some(*leaf),
                "{leaf:?} is fullscreen without holding the lock"
            );
        }

        for key in &self.floating {
            ensure!(
                self.containers.floating(*key).is_some(),
                "{key:?} is tracked as floating but is not"
            );
        }
        for key in &self.groups {
            ensure!(
                self.containers.group(*key).is_some(),
                "{key:?} is tracked as a group but is not"
            );
        }

        let tracked = reachable.len() + self.floating.len() + self.groups.len();
        ensure!(
            tracked == self.containers.len(),
            "{} containers are not reachable",
            self.containers.len() - tracked
        );

        Ok(())
    }
}

#[cfg(test)]
impl<C: WindowController> TreeState<C> {
    /// Indented dump of the tiled structure. The active container is marked with `*`.
    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        self.debug_node(self.root, 0, &mut out);
        for key in &self.floating {
            self.debug_node(*key, 0, &mut out);
        }
        out.pop();
        out
    }

    fn debug_node(&self, key: ContainerKey, depth: usize, out: &mut String) {
        use std::fmt::Write as _;

        let area = self.containers.logical_area(key, &self.ctx.options);
        let indent = "  ".repeat(depth);
        let marker = if self.ctx.active == Some(key) { " *" } else { "" };

        match self.containers.get(key) {
            Some(Container::Parent(lane)) => {
                let _ = writeln!(out, "{indent}{:?} {area}", lane.scheme());
                for child in lane.get_sub_nodes() {
                    self.debug_node(*child, depth + 1, out);
                }
            }
            Some(Container::Leaf(leaf)) => match leaf.window() {
                Some(window) => {
                    let _ = writeln!(out, "{indent}Window {window:?} {area}{marker}");
                }
                None => {
                    let _ = writeln!(out, "{indent}Pending {area}");
                }
            },
            Some(Container::Floating(floating)) => {
                let _ = writeln!(out, "{indent}Floating {:?} {area}{marker}", floating.window());
            }
            Some(Container::Group(_)) | None => (),
        }
    }
}


/// Whether moving in `direction` steps between children of a lane with `scheme`.
fn select_axis_matches(scheme: LayoutScheme, direction: Direction) -> bool {
    if direction.is_vertical() {
        scheme == LayoutScheme::Vertical
    } else {
        matches!(scheme, LayoutScheme::Horizontal | LayoutScheme::Tabbing)
    }
}

fn to_tree_rect(rect: Rectangle) -> TreeRect {
    TreeRect {
        x: rect.loc.x,
        y: rect.loc.y,
        width: rect.size.w,
        height: rect.size.h,
    }
}
