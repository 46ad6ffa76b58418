//! Spatial Search
//!
//! Breadth-first capture radius and A* reachability over the occupancy
//! grid. Both use 8-directional adjacency and never step onto occupied
//! cells; the search origin itself is always treated as open.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};

use crate::core::direction::{Diagonal, Direction};
use crate::core::point::Point;
use crate::game::board::Occupancy;

/// Cells the Hunter threatens from `origin`.
///
/// Expands breadth-first for at most `max_distance` hops, then keeps only
/// cells whose true Euclidean distance from `origin` is within
/// `max_distance`. Hop count over-approximates a disc; the filter gives
/// the final shape.
pub fn capture_radius<O>(grid: &O, origin: Point, max_distance: u32) -> BTreeSet<Point>
where
    O: Occupancy + ?Sized,
{
    let mut seen: HashSet<Point> = HashSet::new();
    seen.insert(origin);

    let mut frontier = vec![origin];
    for _ in 0..max_distance {
        let mut next = Vec::new();
        for cell in frontier {
            for direction in Direction::ALL {
                let neighbour = cell.step(direction);
                if grid.occupied(neighbour) || !seen.insert(neighbour) {
                    continue;
                }
                next.push(neighbour);
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    let limit = u64::from(max_distance) * u64::from(max_distance);
    seen.into_iter()
        .filter(|cell| cell.distance_squared(origin) <= limit)
        .collect()
}

/// Whether `target` lies within the capture disc around `origin`.
pub fn within_capture<O>(grid: &O, origin: Point, target: Point, max_distance: u32) -> bool
where
    O: Occupancy + ?Sized,
{
    let limit = u64::from(max_distance) * u64::from(max_distance);
    // Cheap reject before flooding.
    if target.distance_squared(origin) > limit {
        return false;
    }
    capture_radius(grid, origin, max_distance).contains(&target)
}

/// Whether no 8-connected path of open cells joins `from` and `to`.
///
/// A* with the Chebyshev heuristic, which is exact on an empty board for
/// unit-cost king moves. Returns `false` immediately when the grid has no
/// walls, and `true` only once the frontier is exhausted.
pub fn is_separated<O>(grid: &O, from: Point, to: Point) -> bool
where
    O: Occupancy + ?Sized,
{
    if !grid.has_walls() {
        return false;
    }
    shortest_path_len(grid, from, to).is_none()
}

/// Length in steps of the shortest 8-connected path, if one exists.
pub fn shortest_path_len<O>(grid: &O, from: Point, to: Point) -> Option<u32>
where
    O: Occupancy + ?Sized,
{
    if from == to {
        return Some(0);
    }

    let mut best: HashMap<Point, u32> = HashMap::new();
    let mut closed: HashSet<Point> = HashSet::new();
    let mut open = BinaryHeap::new();

    best.insert(from, 0);
    open.push(Reverse((from.chebyshev(to), 0u32, from)));

    while let Some(Reverse((_, cost, cell))) = open.pop() {
        if cell == to {
            return Some(cost);
        }
        if !closed.insert(cell) {
            continue;
        }

        for direction in Direction::ALL {
            let neighbour = cell.step(direction);
            if neighbour != to && grid.occupied(neighbour) {
                continue;
            }
            if closed.contains(&neighbour) {
                continue;
            }
            let next_cost = cost + 1;
            let improved = best.get(&neighbour).map_or(true, |&known| next_cost < known);
            if improved {
                best.insert(neighbour, next_cost);
                open.push(Reverse((next_cost + neighbour.chebyshev(to), next_cost, neighbour)));
            }
        }
    }

    None
}

/// Whether all four diagonal neighbours of `cell` are occupied.
pub fn is_trapped<O>(grid: &O, cell: Point) -> bool
where
    O: Occupancy + ?Sized,
{
    Diagonal::ALL
        .iter()
        .all(|d| grid.occupied(cell.step(d.direction())))
}
