//! Game server implementation.
//!
//! Accepts WebSocket connections and runs one task per connection. All
//! world mutation is funneled through the shared [`GameState`] lock; the
//! tick itself is driven by a single [`game::run_game_loop`] task.

use crate::config::Config;
use futures_util::{SinkExt, StreamExt};
use protocol::ClientMessage;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

pub mod game;

pub use game::{run_game_loop, GameState, WorldUpdateBroadcast};

/// Connection tracking state (shared across connection handlers).
struct ConnectionState {
    total_connections: usize,
}

impl ConnectionState {
    fn new() -> Self {
        Self {
            total_connections: 0,
        }
    }

    /// Try to add a connection, returns true if allowed.
    fn try_add_connection(&mut self, max_total: usize) -> bool {
        if self.total_connections >= max_total {
            return false;
        }
        self.total_connections += 1;
        true
    }

    /// Remove a connection.
    fn remove_connection(&mut self) {
        self.total_connections = self.total_connections.saturating_sub(1);
    }
}

/// Run the game server.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on ws://{}", addr);

    // One broadcast channel carries the serialized update to every connection.
    let (world_tx, _world_rx) = broadcast::channel::<WorldUpdateBroadcast>(5);

    // Shared game state
    let game_state = Arc::new(RwLock::new(GameState::new(&config)));

    // Start the game loop: the only tick driver in the process.
    let game_loop_state = Arc::clone(&game_state);
    let loop_tx = world_tx.clone();
    let tick_interval = config.server.tick_interval_ms;
    tokio::spawn(async move {
        game::run_game_loop(game_loop_state, loop_tx, tick_interval).await;
    });

    let conn_state = Arc::new(RwLock::new(ConnectionState::new()));
    let max_connections = config.server.max_connections;

    loop {
        let (stream, addr) = listener.accept().await?;

        {
            let mut state = conn_state.write().await;
            if !state.try_add_connection(max_connections) {
                warn!("Connection rejected (limit reached): {}", addr);
                continue;
            }
        }

        let game_state = Arc::clone(&game_state);
        let conn_state = Arc::clone(&conn_state);
        let world_rx = world_tx.subscribe();

        tokio::spawn(async move {
            let result = handle_connection(stream, addr, game_state, world_rx).await;

            // Always remove from connection tracking when done
            {
                let mut state = conn_state.write().await;
                state.remove_connection();
            }

            if let Err(e) = result {
                error!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    game_state: Arc<RwLock<GameState>>,
    mut world_rx: broadcast::Receiver<WorldUpdateBroadcast>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New connection from {}", addr);

    let (mut write, mut read) = ws_stream.split();

    // Create the snake this connection controls.
    let snake_id = {
        let mut state = game_state.write().await;
        state.add_snake()
    };

    // Message loop - handle both inbound frames and world broadcasts.
    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let msg = match ClientMessage::decode(text.as_str()) {
                            Ok(msg) => msg,
                            Err(e) => {
                                // Malformed input is dropped; the connection stays open.
                                debug!("Dropping malformed message from {}: {}", addr, e);
                                continue;
                            }
                        };

                        let reply = {
                            let mut state = game_state.write().await;
                            state.handle_message(snake_id, msg)
                        };

                        if let Some(reply) = reply {
                            match reply.encode() {
                                Ok(payload) => {
                                    if let Err(e) = write.send(Message::Text(payload.into())).await {
                                        warn!("Failed to send reply to {}: {}", addr, e);
                                        break;
                                    }
                                }
                                Err(e) => warn!("Failed to serialize reply for {}: {}", addr, e),
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", addr);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => {
                        break;
                    }
                    // Binary, ping and pong frames are ignored.
                    _ => {}
                }
            }
            update = world_rx.recv() => {
                match update {
                    Ok(update) => {
                        if let Err(e) = write.send(Message::Text(update.payload.into())).await {
                            warn!("Failed to send update to {}: {}", addr, e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // A slow client only loses its own updates.
                        debug!("Client {} lagged, skipped {} updates", addr, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        }
    }

    // Remove the snake unconditionally on teardown.
    {
        let mut state = game_state.write().await;
        state.remove_snake(snake_id);
    }

    Ok(())
}
