//! The snake entity.

use glam::Vec2;
use protocol::{Point, SnakeSnapshot};
use std::collections::VecDeque;

/// A player-controlled snake.
///
/// Created on connect, removed on disconnect. The body never holds more
/// than `length` segments; the head is always the front element.
#[derive(Debug, Clone)]
pub struct Snake {
    /// Process-unique id, stable for the connection's lifetime.
    pub id: u32,
    /// Body segments, head first.
    pub body: VecDeque<Vec2>,
    /// Target segment count. Grows on food and collision wins, resets to
    /// the initial minimum on a collision loss.
    pub length: usize,
    /// Last direction received from the owning client.
    pub direction: Vec2,
    /// Movement speed in units per second.
    pub speed: f32,
    /// `#RRGGBB`, fixed at creation.
    pub color: String,
    pub name: String,
    pub power_up_active: bool,
    /// Absolute expiry timestamp (unix ms), set while the power-up is active.
    pub power_up_end_time: Option<u64>,
}

impl Snake {
    /// Create a snake with a single body segment at `position`.
    pub fn new(id: u32, position: Vec2, color: String, initial_length: usize, speed: f32) -> Self {
        Self {
            id,
            body: VecDeque::from([position]),
            length: initial_length,
            direction: Vec2::new(1.0, 0.0),
            speed,
            color,
            name: format!("Player{id}"),
            power_up_active: false,
            power_up_end_time: None,
        }
    }

    /// Current head position.
    #[inline]
    pub fn head(&self) -> Vec2 {
        self.body.front().copied().unwrap_or_default()
    }

    /// Wire representation for an update broadcast.
    pub fn snapshot(&self) -> SnakeSnapshot {
        SnakeSnapshot {
            body: self.body.iter().copied().map(Point::from).collect(),
            length: self.length,
            direction: Point::from(self.direction),
            speed: self.speed,
            color: self.color.clone(),
            name: self.name.clone(),
            power_up_active: self.power_up_active,
            power_up_end_time: self.power_up_end_time,
        }
    }
}
