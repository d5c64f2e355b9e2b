//! Message definitions.
//!
//! Every frame is a JSON object discriminated by a lowercase `type` field.
//! Field names on the wire are camelCase. Unknown or malformed frames fail
//! to decode and are dropped by the caller; they never close a connection.

use crate::{Point, ProtocolError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Messages sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Submit a display name. The server replies with [`ServerMessage::Init`]
    /// carrying the id of the snake this connection controls.
    Start { name: String },
    /// Steer the snake with the given id. No reply.
    Move { id: u32, direction: Point },
}

impl ClientMessage {
    /// Decode a single text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Reply to `start`: the id of the snake the client controls.
    Init { id: u32 },
    /// Full world snapshot, broadcast every tick to every connection.
    #[serde(rename_all = "camelCase")]
    Update {
        snakes: BTreeMap<u32, SnakeSnapshot>,
        food_items: Vec<Point>,
        power_up: Option<Point>,
    },
}

impl ServerMessage {
    /// Encode to a single text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Per-snake state as serialized into an update frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnakeSnapshot {
    /// Body segments, head first.
    pub body: Vec<Point>,
    /// Target segment count.
    pub length: usize,
    pub direction: Point,
    pub speed: f32,
    /// `#RRGGBB`.
    pub color: String,
    pub name: String,
    pub power_up_active: bool,
    /// Absolute expiry timestamp (unix ms), null while inactive.
    pub power_up_end_time: Option<u64>,
}
