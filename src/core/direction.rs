//! Compass Directions and Bounce Table
//!
//! The direction->delta table and the Hunter's bounce-rotation table are
//! immutable static data. The y axis grows south, so `North` is `(0, -1)`.

use std::fmt;
use serde::{Serialize, Deserialize};

// =============================================================================
// COMPASS DIRECTIONS
// =============================================================================

/// One of the 8 compass directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// (0, -1)
    North = 0,
    /// (1, -1)
    NorthEast = 1,
    /// (1, 0)
    East = 2,
    /// (1, 1)
    SouthEast = 3,
    /// (0, 1)
    South = 4,
    /// (-1, 1)
    SouthWest = 5,
    /// (-1, 0)
    West = 6,
    /// (-1, -1)
    NorthWest = 7,
}

/// Delta for each direction, indexed by `Direction as usize`.
pub static DIRECTION_DELTAS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

impl Direction {
    /// All directions, in 8-neighbourhood expansion order.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Cell delta `(dx, dy)`.
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        DIRECTION_DELTAS[self as usize]
    }

    /// Compass token used on the wire (`N`, `NE`, ...).
    pub fn token(self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::NorthEast => "NE",
            Direction::East => "E",
            Direction::SouthEast => "SE",
            Direction::South => "S",
            Direction::SouthWest => "SW",
            Direction::West => "W",
            Direction::NorthWest => "NW",
        }
    }

    /// Parse a compass token, ignoring case.
    pub fn from_token(token: &str) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|d| d.token().eq_ignore_ascii_case(token))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// =============================================================================
// DIAGONALS + BOUNCE
// =============================================================================

/// A diagonal heading. The Hunter always faces one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Diagonal {
    /// North-east.
    NorthEast = 0,
    /// North-west.
    NorthWest = 1,
    /// South-east.
    SouthEast = 2,
    /// South-west.
    SouthWest = 3,
}

/// Shape of an obstruction met while stepping diagonally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Collision {
    /// Only the horizontal neighbour `(x+dx, y)` is blocked: a vertical wall.
    Vertical = 0,
    /// Only the vertical neighbour `(x, y+dy)` is blocked: a horizontal wall.
    Horizontal = 1,
    /// Both neighbours blocked, or neither blocked but the diagonal cell is.
    Corner = 2,
}

/// Heading after a bounce, indexed by `[Diagonal as usize][Collision as usize]`.
///
/// A vertical collision swaps to the horizontal sibling, a horizontal
/// collision to the vertical sibling, and a corner reverses the heading.
pub static BOUNCE_TABLE: [[Diagonal; 3]; 4] = [
    // NE
    [Diagonal::NorthWest, Diagonal::SouthEast, Diagonal::SouthWest],
    // NW
    [Diagonal::NorthEast, Diagonal::SouthWest, Diagonal::SouthEast],
    // SE
    [Diagonal::SouthWest, Diagonal::NorthEast, Diagonal::NorthWest],
    // SW
    [Diagonal::SouthEast, Diagonal::NorthWest, Diagonal::NorthEast],
];

impl Diagonal {
    /// Fixed scan order used when the bounce table cannot find an exit.
    pub const ALL: [Diagonal; 4] = [
        Diagonal::NorthEast,
        Diagonal::NorthWest,
        Diagonal::SouthEast,
        Diagonal::SouthWest,
    ];

    /// The equivalent compass direction.
    pub fn direction(self) -> Direction {
        match self {
            Diagonal::NorthEast => Direction::NorthEast,
            Diagonal::NorthWest => Direction::NorthWest,
            Diagonal::SouthEast => Direction::SouthEast,
            Diagonal::SouthWest => Direction::SouthWest,
        }
    }

    /// Narrow a compass direction to a diagonal.
    pub fn from_direction(direction: Direction) -> Option<Diagonal> {
        match direction {
            Direction::NorthEast => Some(Diagonal::NorthEast),
            Direction::NorthWest => Some(Diagonal::NorthWest),
            Direction::SouthEast => Some(Diagonal::SouthEast),
            Direction::SouthWest => Some(Diagonal::SouthWest),
            _ => None,
        }
    }

    /// Cell delta `(dx, dy)`.
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        self.direction().delta()
    }

    /// Heading after meeting `collision`.
    #[inline]
    pub fn bounce(self, collision: Collision) -> Diagonal {
        BOUNCE_TABLE[self as usize][collision as usize]
    }
}

impl fmt::Display for Diagonal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.direction().token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_table_matches_tokens() {
        assert_eq!(Direction::North.delta(), (0, -1));
        assert_eq!(Direction::SouthEast.delta(), (1, 1));
        assert_eq!(Direction::West.delta(), (-1, 0));
        assert_eq!(Direction::NorthWest.delta(), (-1, -1));
    }

    #[test]
    fn test_from_token_is_case_insensitive() {
        assert_eq!(Direction::from_token("ne"), Some(Direction::NorthEast));
        assert_eq!(Direction::from_token("Sw"), Some(Direction::SouthWest));
        assert_eq!(Direction::from_token("S"), Some(Direction::South));
        assert_eq!(Direction::from_token("up"), None);
        assert_eq!(Direction::from_token(""), None);
    }

    #[test]
    fn test_vertical_collision_flips_horizontal_component() {
        assert_eq!(Diagonal::NorthWest.bounce(Collision::Vertical), Diagonal::NorthEast);
        assert_eq!(Diagonal::SouthEast.bounce(Collision::Vertical), Diagonal::SouthWest);
    }

    #[test]
    fn test_horizontal_collision_flips_vertical_component() {
        assert_eq!(Diagonal::NorthWest.bounce(Collision::Horizontal), Diagonal::SouthWest);
        assert_eq!(Diagonal::NorthEast.bounce(Collision::Horizontal), Diagonal::SouthEast);
    }

    #[test]
    fn test_corner_reverses() {
        for d in Diagonal::ALL {
            let (dx, dy) = d.delta();
            assert_eq!(d.bounce(Collision::Corner).delta(), (-dx, -dy));
        }
    }

    #[test]
    fn test_bounce_table_consistent_with_deltas() {
        for d in Diagonal::ALL {
            let (dx, dy) = d.delta();
            assert_eq!(d.bounce(Collision::Vertical).delta(), (-dx, dy));
            assert_eq!(d.bounce(Collision::Horizontal).delta(), (dx, -dy));
        }
    }

    #[test]
    fn test_diagonal_round_trip() {
        for d in Diagonal::ALL {
            assert_eq!(Diagonal::from_direction(d.direction()), Some(d));
        }
        assert_eq!(Diagonal::from_direction(Direction::East), None);
    }
}
