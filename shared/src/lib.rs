//! Shared core for the two-player grid snake game.
//!
//! Everything both peers need lives here: the grid/direction primitives,
//! the [`Snake`] entity, the cross-snake collision resolver, the one-byte
//! position codec, the fixed-layout wire protocol, the [`net::NetChannel`]
//! transport wrapper and the [`session::GameSession`] orchestrator.
//!
//! Exactly one peer runs the authoritative simulation (the server role);
//! the other is a thin replica that renders whatever snapshot it last
//! received and only ever sends direction changes upstream.

pub mod codec;
pub mod collision;
pub mod net;
pub mod position;
pub mod protocol;
pub mod session;
pub mod snake;

pub use collision::GameResult;
pub use position::{Direction, GridPos};
pub use snake::Snake;

/// Grid axes are clamped into this range; it also bounds what the
/// one-byte position codec has to represent.
pub const GRID_MIN: u32 = 4;
pub const GRID_MAX: u32 = 40;

pub const DEFAULT_GRID_WIDTH: u32 = 20;
pub const DEFAULT_GRID_HEIGHT: u32 = 20;

/// Well-known listen port; the server auto-increments on bind conflicts.
pub const DEFAULT_PORT: u16 = 1234;

/// Hard cap on snake body length. Wire snapshots carry body arrays of
/// exactly this capacity regardless of the live length.
pub const MAX_SNAKE_SIZE: usize = 64;

/// Snakes start every match with this many segments.
pub const SEED_BODY_LEN: usize = 3;

/// Fixed simulation step in seconds.
pub const TICK_INTERVAL: f32 = 0.25;
