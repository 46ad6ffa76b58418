//! Grid Coordinates
//!
//! Integer cell coordinates on the game board and the distance metrics
//! the engine relies on. Coordinates are signed so that off-board
//! neighbours (e.g. `x - 1` at the left edge) stay representable.

use std::fmt;
use serde::{Serialize, Deserialize};

use super::direction::Direction;

/// A single board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// Column, growing east.
    pub x: i32,
    /// Row, growing south.
    pub y: i32,
}

impl Point {
    /// Create a point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by a raw delta.
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// The neighbouring cell one step in `direction`.
    #[inline]
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    /// King-move distance: the number of 8-directional steps between cells
    /// on an empty board.
    #[inline]
    pub fn chebyshev(self, other: Self) -> u32 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dy = (i64::from(self.y) - i64::from(other.y)).unsigned_abs();
        dx.max(dy).min(u64::from(u32::MAX)) as u32
    }

    /// Squared Euclidean distance. Exact, so disc membership never rounds.
    #[inline]
    pub fn distance_squared(self, other: Self) -> u64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        (dx * dx + dy * dy) as u64
    }

    /// Whether the cell lies in `[0, width) x [0, height)`.
    #[inline]
    pub fn in_bounds(self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && (self.x as u32) < width
            && (self.y as u32) < height
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}
