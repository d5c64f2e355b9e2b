//! Shared game state and the tick driver.
//!
//! Exactly one `run_game_loop` task drives the simulation for the whole
//! process; connection tasks never tick the world themselves. They
//! register and deregister snakes and receive serialized updates over a
//! broadcast channel.

use crate::config::Config;
use crate::entity::Snake;
use crate::sim;
use crate::world::{random_color, Field, World};
use protocol::{ClientMessage, Point, ServerMessage};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// A serialized world update, fanned out to every open connection.
#[derive(Debug, Clone)]
pub struct WorldUpdateBroadcast {
    /// JSON text of one `update` message.
    pub payload: String,
}

/// Current unix time in milliseconds.
pub fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Main game state. All mutation happens under one exclusive lock,
/// shared between the tick driver and the connection handlers.
pub struct GameState {
    pub config: Config,
    pub world: World,
}

impl GameState {
    /// Create a new game state with freshly placed food.
    pub fn new(config: &Config) -> Self {
        let field = Field::new(config.field.width, config.field.height);
        let world = World::new(field, config.food.count, unix_ms());
        Self {
            config: config.clone(),
            world,
        }
    }

    /// Register a snake for a new connection and return its id.
    pub fn add_snake(&mut self) -> u32 {
        let id = self.world.next_id();
        let snake = Snake::new(
            id,
            self.world.field.random_position(),
            random_color(),
            self.config.snake.initial_length,
            self.config.snake.base_speed,
        );
        self.world.insert_snake(snake);
        info!("Snake {} joined", id);
        id
    }

    /// Remove a snake when its connection closes.
    pub fn remove_snake(&mut self, id: u32) {
        if self.world.remove_snake(id).is_some() {
            info!("Snake {} removed", id);
        }
    }

    /// Dispatch one inbound message. The reply, if any, goes back on the
    /// originating channel only.
    pub fn handle_message(&mut self, snake_id: u32, msg: ClientMessage) -> Option<ServerMessage> {
        match msg {
            ClientMessage::Start { name } => {
                if let Some(snake) = self.world.snakes.get_mut(&snake_id) {
                    snake.name = name;
                }
                Some(ServerMessage::Init { id: snake_id })
            }
            ClientMessage::Move { id, direction } => {
                // The target may have disconnected concurrently; not an error.
                if let Some(snake) = self.world.snakes.get_mut(&id) {
                    snake.direction = direction.into();
                } else {
                    debug!("Move for unknown snake {}", id);
                }
                None
            }
        }
    }

    /// Run one simulation step and serialize the world for broadcast.
    /// Returns an empty payload only if serialization fails.
    pub fn tick(&mut self, now_ms: u64) -> WorldUpdateBroadcast {
        sim::advance(&mut self.world, &self.config, now_ms);

        let payload = match self.update_message().encode() {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize world update: {}", e);
                String::new()
            }
        };
        WorldUpdateBroadcast { payload }
    }

    fn update_message(&self) -> ServerMessage {
        let snakes: BTreeMap<u32, _> = self
            .world
            .snakes
            .iter()
            .map(|(&id, snake)| (id, snake.snapshot()))
            .collect();
        ServerMessage::Update {
            snakes,
            food_items: self.world.food.iter().copied().map(Point::from).collect(),
            power_up: self.world.power_up.map(Point::from),
        }
    }
}

/// Run the game loop: the single tick driver for the whole process.
pub async fn run_game_loop(
    state: Arc<RwLock<GameState>>,
    world_tx: broadcast::Sender<WorldUpdateBroadcast>,
    tick_interval_ms: u64,
) {
    let start = Instant::now() + Duration::from_millis(tick_interval_ms);
    let mut ticker = interval_at(start, Duration::from_millis(tick_interval_ms));
    // Use Skip so overlapping fires cannot interleave; a late tick is
    // absorbed by the delta-time computation instead.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        // Hibernate while the field is empty. The clock cursor is kept
        // current so the first tick after a join does not integrate the
        // idle gap into movement.
        {
            let game = state.read().await;
            if game.world.snakes.is_empty() {
                drop(game);
                sleep(Duration::from_millis((tick_interval_ms * 4).max(100))).await;
                state.write().await.world.last_update_ms = unix_ms();
                continue;
            }
        }

        let update = {
            let mut game = state.write().await;
            let tick_start = std::time::Instant::now();
            let update = game.tick(unix_ms());
            let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;
            if tick_ms > tick_interval_ms as f64 * 0.8 {
                warn!("Slow tick: {:.2}ms (interval {}ms)", tick_ms, tick_interval_ms);
            }
            update
        };

        if !update.payload.is_empty() {
            // Nobody listening is fine; receivers come and go with connections.
            let _ = world_tx.send(update);
        }
    }
}
