//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub snake: SnakeConfig,
    #[serde(default)]
    pub food: FoodConfig,
    #[serde(default)]
    pub power_up: PowerUpConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            field: FieldConfig::default(),
            snake: SnakeConfig::default(),
            food: FoodConfig::default(),
            power_up: PowerUpConfig::default(),
        }
    }
}

/// Server networking and general settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum concurrent connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            max_connections: default_max_connections(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

fn default_port() -> u16 {
    8080
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_max_connections() -> usize {
    100
}
fn default_tick_interval() -> u64 {
    50
}

/// Playing field dimensions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldConfig {
    #[serde(default = "default_field_width")]
    pub width: f32,
    #[serde(default = "default_field_height")]
    pub height: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: default_field_width(),
            height: default_field_height(),
        }
    }
}

fn default_field_width() -> f32 {
    800.0
}
fn default_field_height() -> f32 {
    600.0
}

/// Snake parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnakeConfig {
    /// Starting (and minimum) target segment count.
    #[serde(default = "default_initial_length")]
    pub initial_length: usize,
    /// Base movement speed in units per second.
    #[serde(default = "default_base_speed")]
    pub base_speed: f32,
    /// Per-axis hit threshold for food and head collisions.
    #[serde(default = "default_segment_size")]
    pub segment_size: f32,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            initial_length: default_initial_length(),
            base_speed: default_base_speed(),
            segment_size: default_segment_size(),
        }
    }
}

fn default_initial_length() -> usize {
    5
}
fn default_base_speed() -> f32 {
    50.0
}
fn default_segment_size() -> f32 {
    10.0
}

/// Food parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoodConfig {
    /// Number of food points on the field, fixed for the process lifetime.
    #[serde(default = "default_food_count")]
    pub count: usize,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            count: default_food_count(),
        }
    }
}

fn default_food_count() -> usize {
    20
}

/// Power-up parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PowerUpConfig {
    /// Per-axis pickup threshold (larger than normal food).
    #[serde(default = "default_power_up_size")]
    pub size: f32,
    /// Speed multiplier while active.
    #[serde(default = "default_speed_multiplier")]
    pub speed_multiplier: f32,
    /// Effect duration in milliseconds.
    #[serde(default = "default_power_up_duration")]
    pub duration_ms: u64,
    /// Respawn interval in milliseconds.
    #[serde(default = "default_power_up_interval")]
    pub interval_ms: u64,
}

impl Default for PowerUpConfig {
    fn default() -> Self {
        Self {
            size: default_power_up_size(),
            speed_multiplier: default_speed_multiplier(),
            duration_ms: default_power_up_duration(),
            interval_ms: default_power_up_interval(),
        }
    }
}

fn default_power_up_size() -> f32 {
    20.0
}
fn default_speed_multiplier() -> f32 {
    2.0
}
fn default_power_up_duration() -> u64 {
    5000
}
fn default_power_up_interval() -> u64 {
    60000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let config = Config::default();
        assert_eq!(config.field.width, 800.0);
        assert_eq!(config.field.height, 600.0);
        assert_eq!(config.food.count, 20);
        assert_eq!(config.snake.initial_length, 5);
        assert_eq!(config.snake.segment_size, 10.0);
        assert_eq!(config.snake.base_speed, 50.0);
        assert_eq!(config.power_up.size, 20.0);
        assert_eq!(config.power_up.speed_multiplier, 2.0);
        assert_eq!(config.power_up.duration_ms, 5000);
        assert_eq!(config.power_up.interval_ms, 60000);
        assert_eq!(config.server.tick_interval_ms, 50);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9001

            [field]
            width = 1024.0
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.tick_interval_ms, 50);
        assert_eq!(config.field.width, 1024.0);
        assert_eq!(config.field.height, 600.0);
        assert_eq!(config.food.count, 20);
    }
}
