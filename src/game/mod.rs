//! Game Logic Module
//!
//! All match simulation code. Deterministic and free of I/O.
//!
//! ## Module Structure
//!
//! - `board`: Occupancy grid, walls, read-only occupancy capability
//! - `search`: Capture radius, separation and trapped checks
//! - `command`: Per-role command grammars
//! - `player`: Hunter and Prey turn logic, bounce physics
//! - `state`: Turn machine and win evaluation
//! - `outcome`: Roles, win reasons, match outcome

pub mod board;
pub mod search;
pub mod command;
pub mod player;
pub mod state;
pub mod outcome;

// Re-export key types
pub use board::{Board, Occupancy, OpenCells, Orientation, Wall, WallError};
pub use command::{parse_command, Command};
pub use outcome::{Outcome, Role, WinReason};
pub use player::{Decision, Hunter, MoveRejection, Player, Prey};
pub use state::GameState;
