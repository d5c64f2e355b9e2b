//! The per-tick simulation step.
//!
//! [`advance`] is the single source of truth for movement, growth,
//! food and power-up consumption, and collision resolution. It runs
//! exactly once per tick under the game state lock; nothing in it can
//! fail. Out-of-range client directions are accepted as-is.

use crate::config::Config;
use crate::world::World;
use glam::Vec2;
use std::collections::HashSet;

/// One resolved head-to-head collision, computed against a read-only
/// snapshot before any mutation is applied.
struct CollisionOutcome {
    winner: u32,
    loser: u32,
    /// Loser's surplus over the minimum length at snapshot time.
    transfer: usize,
}

/// Advance the world to `now_ms`.
///
/// Order per snake (ascending id): movement with boundary wrap, body
/// shift, food consumption, power-up consumption, power-up expiry.
/// Collisions are then resolved in a separate two-phase pass over all
/// snakes, and finally the power-up spawn schedule is checked.
pub fn advance(world: &mut World, config: &Config, now_ms: u64) {
    let delta_time = now_ms.saturating_sub(world.last_update_ms) as f32 / 1000.0;
    world.last_update_ms = now_ms;

    let ids = world.snake_ids();
    for &id in &ids {
        move_snake(world, id, delta_time);
        eat_food(world, config, id);
        consume_power_up(world, config, id, now_ms);
        expire_power_up(world, config, id, now_ms);
    }

    resolve_collisions(world, config);

    if world.power_up.is_none() && now_ms > world.next_power_up_ms {
        world.power_up = Some(world.field.random_position());
        world.next_power_up_ms = now_ms + config.power_up.interval_ms;
    }
}

/// Integrate one step of movement and shift the body.
fn move_snake(world: &mut World, id: u32, delta_time: f32) {
    let field = world.field;
    let Some(snake) = world.snakes.get_mut(&id) else {
        return;
    };

    let mut head = snake.head() + snake.direction * snake.speed * delta_time;

    // A coordinate that exits the field is clamped to the opposite
    // boundary, not wrapped modulo.
    if head.x < 0.0 {
        head.x = field.width;
    }
    if head.x > field.width {
        head.x = 0.0;
    }
    if head.y < 0.0 {
        head.y = field.height;
    }
    if head.y > field.height {
        head.y = 0.0;
    }

    snake.body.push_front(head);
    if snake.body.len() > snake.length {
        snake.body.pop_back();
    }
}

/// Consume every food point within the hit threshold of the new head.
/// Each hit grows the snake by one and respawns that slot in place.
fn eat_food(world: &mut World, config: &Config, id: u32) {
    let threshold = config.snake.segment_size;
    let Some(snake) = world.snakes.get(&id) else {
        return;
    };
    let head = snake.head();

    let mut eaten = 0;
    for slot in 0..world.food.len() {
        let food = world.food[slot];
        if (head.x - food.x).abs() < threshold && (head.y - food.y).abs() < threshold {
            let replacement = world.field.random_position();
            world.replace_food(slot, replacement);
            eaten += 1;
        }
    }

    if eaten > 0 {
        if let Some(snake) = world.snakes.get_mut(&id) {
            snake.length += eaten;
        }
    }
}

/// Pick up the field-wide power-up if the head is within its threshold.
/// The power-up is cleared immediately, so the first snake in iteration
/// order is the single consumer.
fn consume_power_up(world: &mut World, config: &Config, id: u32, now_ms: u64) {
    let Some(power_up) = world.power_up else {
        return;
    };
    let threshold = config.power_up.size;
    let Some(snake) = world.snakes.get_mut(&id) else {
        return;
    };
    let head = snake.head();

    if (head.x - power_up.x).abs() < threshold && (head.y - power_up.y).abs() < threshold {
        snake.speed *= config.power_up.speed_multiplier;
        snake.power_up_active = true;
        snake.power_up_end_time = Some(now_ms + config.power_up.duration_ms);
        world.power_up = None;
    }
}

/// End an expired power-up. The divide is the exact inverse of the
/// multiply in [`consume_power_up`], so repeated cycles cannot drift.
fn expire_power_up(world: &mut World, config: &Config, id: u32, now_ms: u64) {
    let Some(snake) = world.snakes.get_mut(&id) else {
        return;
    };
    if snake.power_up_active && snake.power_up_end_time.is_some_and(|end| now_ms > end) {
        snake.speed /= config.power_up.speed_multiplier;
        snake.power_up_active = false;
        snake.power_up_end_time = None;
    }
}

/// Two-phase pairwise head collision resolution.
///
/// Phase 1 scans a read-only snapshot of heads and lengths in ascending
/// id order, so the lower id wins a mutual head-to-head overlap. A snake
/// already marked as a loser cannot win later in the same tick, and a
/// loser's surplus is credited to its first winner only.
fn resolve_collisions(world: &mut World, config: &Config) {
    let threshold = config.snake.segment_size;
    let minimum_length = config.snake.initial_length;

    let snapshot: Vec<(u32, Vec2, usize)> = world
        .snakes
        .values()
        .map(|s| (s.id, s.head(), s.length))
        .collect();

    let mut outcomes: Vec<CollisionOutcome> = Vec::new();
    let mut losers: HashSet<u32> = HashSet::new();

    for &(winner_id, winner_head, _) in &snapshot {
        if losers.contains(&winner_id) {
            continue;
        }
        for &(other_id, other_head, other_length) in &snapshot {
            if other_id == winner_id || losers.contains(&other_id) {
                continue;
            }
            if (winner_head.x - other_head.x).abs() < threshold
                && (winner_head.y - other_head.y).abs() < threshold
            {
                outcomes.push(CollisionOutcome {
                    winner: winner_id,
                    loser: other_id,
                    transfer: other_length.saturating_sub(minimum_length),
                });
                losers.insert(other_id);
            }
        }
    }

    // Phase 2: apply all outcomes atomically after the scan.
    for outcome in outcomes {
        if outcome.transfer > 0 {
            if let Some(winner) = world.snakes.get_mut(&outcome.winner) {
                winner.length += outcome.transfer;
            }
        }
        if let Some(loser) = world.snakes.get_mut(&outcome.loser) {
            loser.length = minimum_length;
            loser.body.truncate(minimum_length);
        }
    }
}
