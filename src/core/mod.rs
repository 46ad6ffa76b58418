//! Core deterministic primitives.
//!
//! Grid coordinates, compass tables and board digests shared by the
//! game engine and the network layer.

pub mod point;
pub mod direction;
pub mod hash;

// Re-export core types
pub use point::Point;
pub use direction::{Direction, Diagonal, Collision, BOUNCE_TABLE, DIRECTION_DELTAS};
pub use hash::{BoardDigest, BoardHasher, compute_board_digest};
