//! Shared wire protocol for the slither server.
//!
//! This crate contains:
//! - Client and server message definitions (JSON text frames, tagged by `type`)
//! - The wire `Point` type and per-snake snapshot
//! - Protocol error type

mod error;
mod messages;

pub use error::ProtocolError;
pub use messages::{ClientMessage, ServerMessage, SnakeSnapshot};

use serde::{Deserialize, Serialize};

/// A 2D point as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<glam::Vec2> for Point {
    fn from(v: glam::Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Point> for glam::Vec2 {
    fn from(p: Point) -> Self {
        glam::Vec2::new(p.x, p.y)
    }
}
