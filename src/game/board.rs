//! Board and Walls
//!
//! Fixed W×H occupancy grid. Only walls and the board edge block movement;
//! players never mark cells. Every coordinate outside `[0,W)×[0,H)` reads
//! as occupied.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::config::GameConfig;
use crate::core::hash::{BoardDigest, compute_board_digest};
use crate::core::point::Point;

// =============================================================================
// OCCUPANCY CAPABILITY
// =============================================================================

/// Read-only occupancy query.
///
/// This is the only view of the board handed to players and to the
/// search routines.
pub trait Occupancy {
    /// True if `point` is off the board or covered by a wall.
    fn occupied(&self, point: Point) -> bool;

    /// Whether any wall is present. Only the board edge blocks otherwise.
    fn has_walls(&self) -> bool {
        true
    }
}

/// Occupancy view that treats a few cells as always open.
///
/// Used so that a wall covering a player's own cell never blocks that
/// player's traversal.
pub struct OpenCells<'a, O: Occupancy + ?Sized> {
    inner: &'a O,
    open: [Point; 2],
}

impl<'a, O: Occupancy + ?Sized> OpenCells<'a, O> {
    /// Wrap `inner`, opening `a` and `b`.
    pub fn new(inner: &'a O, a: Point, b: Point) -> Self {
        Self { inner, open: [a, b] }
    }
}

impl<O: Occupancy + ?Sized> Occupancy for OpenCells<'_, O> {
    fn occupied(&self, point: Point) -> bool {
        if self.open.contains(&point) {
            return false;
        }
        self.inner.occupied(point)
    }

    fn has_walls(&self) -> bool {
        self.inner.has_walls()
    }
}

// =============================================================================
// WALLS
// =============================================================================

/// Wall rule violations. None of these end a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WallError {
    /// Endpoints share neither axis.
    #[error("wall {id} is not axis-aligned: {start} -> {end}")]
    NotAxisAligned {
        /// Requested id.
        id: u32,
        /// First endpoint.
        start: Point,
        /// Second endpoint.
        end: Point,
    },

    /// Active wall count already at the maximum.
    #[error("wall limit of {max} reached")]
    CapacityReached {
        /// Configured maximum.
        max: usize,
    },

    /// A covered cell is off the board or already a wall.
    #[error("wall {id} overlaps occupied cell {cell}")]
    CellOccupied {
        /// Requested id.
        id: u32,
        /// First offending cell.
        cell: Point,
    },

    /// A wall with this id is already active.
    #[error("wall id {0} already in use")]
    DuplicateId(u32),

    /// No active wall has this id.
    #[error("no wall with id {0}")]
    UnknownId(u32),
}

/// Wall orientation. Single-cell walls are horizontal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Endpoints share a row.
    Horizontal,
    /// Endpoints share a column.
    Vertical,
}

/// An axis-aligned wall segment covering an inclusive span of cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wall {
    /// Hunter-chosen identifier, unique among active walls.
    pub id: u32,
    /// First endpoint as sent.
    pub start: Point,
    /// Second endpoint as sent.
    pub end: Point,
    /// Axis the wall runs along.
    pub orientation: Orientation,
}

impl Wall {
    /// Build a wall, rejecting endpoints that are not axis-aligned.
    pub fn new(id: u32, start: Point, end: Point) -> Result<Self, WallError> {
        let orientation = if start.y == end.y {
            Orientation::Horizontal
        } else if start.x == end.x {
            Orientation::Vertical
        } else {
            return Err(WallError::NotAxisAligned { id, start, end });
        };

        Ok(Self { id, start, end, orientation })
    }

    /// Every covered cell, from the lower endpoint to the higher one.
    pub fn cells(&self) -> impl Iterator<Item = Point> {
        let (start, end, orientation) = (self.start, self.end, self.orientation);
        let (lo, hi) = match orientation {
            Orientation::Horizontal => (start.x.min(end.x), start.x.max(end.x)),
            Orientation::Vertical => (start.y.min(end.y), start.y.max(end.y)),
        };
        (lo..=hi).map(move |v| match orientation {
            Orientation::Horizontal => Point::new(v, start.y),
            Orientation::Vertical => Point::new(start.x, v),
        })
    }
}

// =============================================================================
// BOARD
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cell {
    Empty,
    Wall,
}

/// The occupancy grid plus its ordered list of active walls.
#[derive(Clone, Debug)]
pub struct Board {
    width: u32,
    height: u32,
    wall_max: usize,
    cells: Vec<Cell>,
    walls: Vec<Wall>,
}

impl Board {
    /// Create an empty board.
    pub fn new(width: u32, height: u32, wall_max: usize) -> Self {
        Self {
            width,
            height,
            wall_max,
            cells: vec![Cell::Empty; width as usize * height as usize],
            walls: Vec::new(),
        }
    }

    /// Create an empty board sized by `config`.
    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.width, config.height, config.wall_max)
    }

    /// Board width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Board height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Maximum number of simultaneously active walls.
    pub fn wall_max(&self) -> usize {
        self.wall_max
    }

    /// Active walls in placement order.
    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    /// Whether `point` lies on the board.
    #[inline]
    pub fn in_bounds(&self, point: Point) -> bool {
        point.in_bounds(self.width, self.height)
    }

    #[inline]
    fn index(&self, point: Point) -> usize {
        point.y as usize * self.width as usize + point.x as usize
    }

    /// Place a wall.
    ///
    /// Fails when `wall_max` walls are already active, when the id is taken,
    /// or when any covered cell is occupied (including off-board cells).
    /// Nothing is marked unless every check passes.
    pub fn place_wall(&mut self, id: u32, start: Point, end: Point) -> Result<(), WallError> {
        let wall = Wall::new(id, start, end)?;

        if self.walls.len() >= self.wall_max {
            return Err(WallError::CapacityReached { max: self.wall_max });
        }

        if self.walls.iter().any(|w| w.id == id) {
            return Err(WallError::DuplicateId(id));
        }

        // A span is on the board iff both endpoints are; checking them first
        // avoids walking absurdly long spans.
        for endpoint in [start, end] {
            if !self.in_bounds(endpoint) {
                return Err(WallError::CellOccupied { id, cell: endpoint });
            }
        }

        if let Some(cell) = wall.cells().find(|p| self.occupied(*p)) {
            return Err(WallError::CellOccupied { id, cell });
        }

        for point in wall.cells() {
            let idx = self.index(point);
            self.cells[idx] = Cell::Wall;
        }
        self.walls.push(wall);

        Ok(())
    }

    /// Remove the wall with `id`, clearing its cells.
    pub fn remove_wall(&mut self, id: u32) -> Result<Wall, WallError> {
        let pos = self.walls
            .iter()
            .position(|w| w.id == id)
            .ok_or(WallError::UnknownId(id))?;

        let wall = self.walls.remove(pos);
        for point in wall.cells() {
            let idx = self.index(point);
            self.cells[idx] = Cell::Empty;
        }

        Ok(wall)
    }

    /// Digest of the current board: dimensions plus active walls in order.
    ///
    /// Walls never overlap, so the wall list fully determines the grid.
    pub fn digest(&self) -> BoardDigest {
        compute_board_digest(self.width, self.height, |hasher| {
            hasher.write_u32(self.walls.len() as u32);
            for wall in &self.walls {
                hasher.write_u32(wall.id);
                hasher.write_point(wall.start);
                hasher.write_point(wall.end);
            }
        })
    }
}

impl Occupancy for Board {
    #[inline]
    fn occupied(&self, point: Point) -> bool {
        if !self.in_bounds(point) {
            return true;
        }
        self.cells[self.index(point)] == Cell::Wall
    }

    fn has_walls(&self) -> bool {
        !self.walls.is_empty()
    }
}
