//! Container tree layout engine for a lane-based tiling window manager.
//!
//! The crate decides where windows go. Everything else (surfaces, input, rendering,
//! protocol) belongs to the runtime, which is reached through [`window::WindowController`]
//! and [`window::TilingWindowTreeInterface`].

pub mod config;
pub mod geometry;
pub mod layout;
pub mod window;

pub use config::{ConfigHandle, ListenerId};
pub use geometry::{Point, Rectangle, Size};
pub use layout::{ContainerKey, Direction, LayoutScheme, TilingWindowTree};
pub use window::{
    TilingWindowTreeInterface, WindowController, WindowSpecification, WindowState, WorkspaceId,
};
