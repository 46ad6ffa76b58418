//! # Evasion Game Server
//!
//! Turn-based Hunter/Prey evasion on a walled grid, served over a
//! line-oriented TCP protocol with a matchmaking front end.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    EVASION SERVER                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/             - Deterministic primitives                │
//! │  ├── point.rs      - Grid coordinates and distances          │
//! │  ├── direction.rs  - Compass deltas, diagonals, bounce table │
//! │  └── hash.rs       - Board digests for turn history          │
//! │                                                              │
//! │  game/             - Game logic (deterministic)              │
//! │  ├── board.rs      - Occupancy grid and walls                │
//! │  ├── search.rs     - Capture radius, separation, trapped     │
//! │  ├── command.rs    - Per-role command grammars               │
//! │  ├── player.rs     - Hunter/Prey turns, bounce physics       │
//! │  ├── state.rs      - Turn machine and win evaluation         │
//! │  └── outcome.rs    - Roles and outcomes                      │
//! │                                                              │
//! │  network/          - Networking (non-deterministic)          │
//! │  ├── connection.rs - Line-oriented client connection         │
//! │  ├── protocol.rs   - Wire line formats                       │
//! │  ├── session.rs    - One match over two connections          │
//! │  └── server.rs     - Acceptor and matchmaker                 │
//! │                                                              │
//! │  config.rs         - Immutable game and server settings      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! `core/` and `game/` perform no I/O and read no clocks. Decision times
//! are measured by the session and passed in, so a match replayed with the
//! same decisions produces the same board history.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;
pub mod config;

// Re-export commonly used types
pub use config::{Config, ConfigError, GameConfig, ServerConfig};
pub use core::point::Point;
pub use core::direction::{Diagonal, Direction};
pub use game::board::{Board, Occupancy, WallError};
pub use game::outcome::{Outcome, Role, WinReason};
pub use game::state::GameState;
pub use network::server::MatchmakingServer;
pub use network::session::SessionResult;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
