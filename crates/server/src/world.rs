//! World state management.
//!
//! The mutable shared store of all entities (snakes, food, power-up) and
//! the timing cursors. Structural operations only; per-tick behavior
//! lives in [`crate::sim`].

use crate::entity::Snake;
use glam::Vec2;
use rand::Rng;
use std::collections::BTreeMap;

/// Playing field bounds, `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Field {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Get a random position within the field.
    #[inline]
    pub fn random_position(&self) -> Vec2 {
        let mut rng = rand::rng();
        Vec2::new(
            rng.random_range(0.0..self.width),
            rng.random_range(0.0..self.height),
        )
    }
}

/// Generate a random `#RRGGBB` color, uniform over the full RGB space.
#[inline]
pub fn random_color() -> String {
    let mut rng = rand::rng();
    format!("#{:06X}", rng.random_range(0u32..0x0100_0000))
}

/// The game world.
#[derive(Debug)]
pub struct World {
    /// Next snake id to try.
    next_snake_id: u32,

    /// Live snakes by id. BTreeMap keeps tick iteration in ascending id
    /// order, which makes collision resolution deterministic.
    pub snakes: BTreeMap<u32, Snake>,

    /// Food points. The slot count is fixed after construction; consumed
    /// slots are replaced in place.
    pub food: Vec<Vec2>,

    /// At most one power-up field-wide.
    pub power_up: Option<Vec2>,

    /// Field bounds.
    pub field: Field,

    /// Timestamp of the previous simulation step (unix ms).
    pub last_update_ms: u64,

    /// Earliest timestamp a new power-up may spawn (unix ms). Starts at
    /// zero so the first tick spawns one immediately.
    pub next_power_up_ms: u64,
}

impl World {
    /// Create a world with `food_count` randomly placed food points.
    pub fn new(field: Field, food_count: usize, now_ms: u64) -> Self {
        let food = (0..food_count).map(|_| field.random_position()).collect();
        Self {
            next_snake_id: 1,
            snakes: BTreeMap::new(),
            food,
            power_up: None,
            field,
            last_update_ms: now_ms,
            next_power_up_ms: 0,
        }
    }

    /// Allocate a fresh id. Never returns 0 or an id that is currently live.
    pub fn next_id(&mut self) -> u32 {
        loop {
            let id = self.next_snake_id;
            self.next_snake_id = self.next_snake_id.wrapping_add(1);
            if self.next_snake_id == 0 {
                self.next_snake_id = 1; // Skip 0
            }
            if id != 0 && !self.snakes.contains_key(&id) {
                return id;
            }
        }
    }

    /// Register a snake.
    pub fn insert_snake(&mut self, snake: Snake) -> u32 {
        let id = snake.id;
        self.snakes.insert(id, snake);
        id
    }

    /// Remove a snake entirely.
    pub fn remove_snake(&mut self, id: u32) -> Option<Snake> {
        self.snakes.remove(&id)
    }

    /// Replace a consumed food slot in place.
    #[inline]
    pub fn replace_food(&mut self, slot: usize, point: Vec2) {
        if let Some(food) = self.food.get_mut(slot) {
            *food = point;
        }
    }

    /// Live snake ids in ascending order.
    pub fn snake_ids(&self) -> Vec<u32> {
        self.snakes.keys().copied().collect()
    }
}
