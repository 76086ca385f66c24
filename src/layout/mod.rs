//! Container tree layout.
//!
//! A workspace is laid out as a tree of containers stored in a [`ContainerMap`] arena:
//! - leaves wrap one window slot,
//! - lanes ([`ParentContainer`]) own an ordered list of children and a [`LayoutScheme`],
//! - groups aggregate weak references to other containers during multi-select,
//! - floating containers hold a free-standing window outside the tiling structure.
//!
//! [`TilingWindowTree`] owns the root lane and runs every algorithm that needs more context
//! than a single node has: placement, directional select and move, resize, scheme changes,
//! fullscreen and visibility.
//!
//! Geometry is two-phase. Setting a logical area only stages it; committing pushes the
//! resulting visible rectangle to the [`WindowController`](crate::window::WindowController).

use std::rc::Rc;

use bitflags::bitflags;
use lanewm_config::Config;

use crate::window::WindowController;

pub mod container;
pub mod floating;
pub mod group;
pub mod leaf;
pub mod parent;
pub mod tiling;


pub use container::{Container, ContainerKey, ContainerMap, ContainerType};
pub use floating::FloatingContainer;
pub use group::ContainerGroupContainer;
pub use leaf::LeafContainer;
pub use parent::ParentContainer;
pub use tiling::TilingWindowTree;

/// Smallest extent a leaf may be resized to along either axis.
pub const LEAF_MIN_SIZE: i32 = 50;

/// Direction for navigation, movement and resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Left => Direction::Right,
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// Left and up point towards the start of a lane.
    pub fn is_negative(self) -> bool {
        matches!(self, Direction::Left | Direction::Up)
    }
}

/// How a lane's children occupy its area.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutScheme {
    /// Children arranged left to right.
    #[default]
    Horizontal,
    /// Children arranged top to bottom.
    Vertical,
    /// Every child occupies the whole lane, selected through tabs.
    Tabbing,
    /// Every child occupies the whole lane, selected through title bars.
    Stacking,
}

impl LayoutScheme {
    /// Split scheme whose main axis runs along `direction`.
    pub fn from_direction(direction: Direction) -> Self {
        if direction.is_vertical() {
            LayoutScheme::Vertical
        } else {
            LayoutScheme::Horizontal
        }
    }

    /// Whether children are stacked instead of split.
    pub fn is_stacked(self) -> bool {
        matches!(self, LayoutScheme::Tabbing | LayoutScheme::Stacking)
    }

    /// i3 spelling of the scheme.
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutScheme::Horizontal => "splith",
            LayoutScheme::Vertical => "splitv",
            LayoutScheme::Tabbing => "tabbed",
            LayoutScheme::Stacking => "stacked",
        }
    }
}

bitflags! {
    /// Edges of a container that touch a sibling on the same axis.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Edges: u8 {
        const TOP = 1;
        const LEFT = 1 << 1;
        const BOTTOM = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

/// Layout options derived from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub inner_gaps_x: i32,
    pub inner_gaps_y: i32,
    pub outer_gaps_x: i32,
    pub outer_gaps_y: i32,
    pub border_size: i32,
    pub resize_jump: i32,
}

impl Default for Options {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Options {
    pub fn from_config(config: &Config) -> Self {
        let layout = &config.layout;
        Self {
            inner_gaps_x: i32::from(layout.gaps.inner_x),
            inner_gaps_y: i32::from(layout.gaps.inner_y),
            outer_gaps_x: i32::from(layout.gaps.outer_x),
            outer_gaps_y: i32::from(layout.gaps.outer_y),
            border_size: i32::from(layout.border.size),
            resize_jump: i32::from(layout.resize_jump),
        }
    }

    /// Gap a leaf leaves on each edge that has a horizontal neighbour.
    pub fn half_gap_x(&self) -> i32 {
        (self.inner_gaps_x + 1) / 2
    }

    /// Gap a leaf leaves on each edge that has a vertical neighbour.
    pub fn half_gap_y(&self) -> i32 {
        (self.inner_gaps_y + 1) / 2
    }
}

/// Ambient state the container algorithms run against.
///
/// Passed explicitly instead of giving containers back-pointers into the tree.
#[derive(Debug)]
pub struct LayoutContext<C> {
    pub controller: Rc<C>,
    pub options: Options,
    /// Currently active container, a leaf or a group.
    pub active: Option<ContainerKey>,
}

impl<C: WindowController> LayoutContext<C> {
    pub fn new(controller: Rc<C>, options: Options) -> Self {
        Self {
            controller,
            options,
            active: None,
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn opposite_round_trips() {
        for direction in [Direction::Up, Direction::Left, Direction::Down, Direction::Right] {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_ne!(direction.opposite(), direction);
            assert_eq!(direction.opposite().is_vertical(), direction.is_vertical());
            assert_ne!(direction.opposite().is_negative(), direction.is_negative());
        }
    }

    #[test]
    fn half_gap_rounds_up() {
        let mut options = Options::default();
        options.inner_gaps_x = 9;
        options.inner_gaps_y = 10;
        assert_eq!(options.half_gap_x(), 5);
        assert_eq!(options.half_gap_y(), 5);
    }

    #[test]
    fn scheme_names() {
        assert_eq!(LayoutScheme::from_direction(Direction::Up), LayoutScheme::Vertical);
        assert_eq!(LayoutScheme::from_direction(Direction::Right), LayoutScheme::Horizontal);
        assert_eq!(LayoutScheme::Tabbing.as_str(), "tabbed");
        assert!(LayoutScheme::Stacking.is_stacked());
        assert!(!LayoutScheme::Vertical.is_stacked());
    }
}
