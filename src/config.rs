//! Configuration
//!
//! Immutable match rules and server settings. Loaded once at startup from an
//! optional JSON file; every field falls back to its default when absent.
//! Sessions receive their [`GameConfig`] by value.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::point::Point;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Could not read the file.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid JSON for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Values are out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

// =============================================================================
// GAME RULES
// =============================================================================

/// Largest accepted board, in cells. The grid is allocated up front.
pub const MAX_BOARD_CELLS: u64 = 1 << 24;

/// Rules for a single match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board width in cells.
    pub width: u32,
    /// Board height in cells.
    pub height: u32,
    /// Capture disc radius.
    pub capture_distance: u32,
    /// Maximum simultaneously active walls.
    pub wall_max: usize,
    /// Turns the Hunter waits after a wall action.
    pub hunter_cooldown: u32,
    /// Turns the Prey waits after a move.
    pub prey_cooldown: u32,
    /// Per-player decision time budget in milliseconds.
    pub time_limit_ms: u64,
    /// Hunter start cell.
    pub hunter_start: Point,
    /// Prey start cell.
    pub prey_start: Point,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
            capture_distance: 4,
            wall_max: 6,
            hunter_cooldown: 10,
            prey_cooldown: 1,
            time_limit_ms: 120_000,
            hunter_start: Point::new(0, 0),
            prey_start: Point::new(330, 200),
        }
    }
}

impl GameConfig {
    /// Decision time budget.
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    /// Reject configurations no match could be played under.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "board must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        let cells = u64::from(self.width) * u64::from(self.height);
        if cells > MAX_BOARD_CELLS {
            return Err(ConfigError::Invalid(format!(
                "board of {}x{} exceeds {} cells",
                self.width, self.height, MAX_BOARD_CELLS
            )));
        }
        for (name, start) in [("hunter_start", self.hunter_start), ("prey_start", self.prey_start)] {
            if !start.in_bounds(self.width, self.height) {
                return Err(ConfigError::Invalid(format!("{} {} is off the board", name, start)));
            }
        }
        if self.time_limit_ms == 0 {
            return Err(ConfigError::Invalid("time_limit_ms must be positive".into()));
        }
        Ok(())
    }
}

// =============================================================================
// SERVER
// =============================================================================

/// Listener and matchmaking settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Read window per pending connection during one matchmaking scan.
    pub handshake_poll_ms: u64,
    /// Pause between matchmaking scans.
    pub matchmaking_interval_ms: u64,
    /// Spawn each session as its own task instead of running it inline.
    pub concurrent_sessions: bool,
    /// Maximum connections waiting in the pending pool.
    pub max_pending: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 23000)),
            handshake_poll_ms: 25,
            matchmaking_interval_ms: 100,
            concurrent_sessions: false,
            max_pending: 1000,
        }
    }
}

impl ServerConfig {
    /// Read window for one pending connection.
    pub fn handshake_poll(&self) -> Duration {
        Duration::from_millis(self.handshake_poll_ms)
    }

    /// Pause between scans.
    pub fn matchmaking_interval(&self) -> Duration {
        Duration::from_millis(self.matchmaking_interval_ms)
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener and matchmaking settings.
    pub server: ServerConfig,
    /// Match rules.
    pub game: GameConfig,
}

impl Config {
    /// Load from an optional JSON file. No path means all defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_json(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.game.validate()?;
        Ok(config)
    }
}
