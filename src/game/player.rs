//! Players
//!
//! Hunter and Prey share a small core (position, cooldown, accumulated
//! decision time). Neither mutates the board: the Hunter hands its wall
//! action back to the game state, and movement checks go through the
//! read-only [`Occupancy`] view.

use std::time::Duration;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::direction::{Collision, Diagonal};
use crate::core::point::Point;
use crate::game::board::Occupancy;
use crate::game::command::Command;
use crate::game::outcome::Role;

/// Table bounces tried before falling back to a fixed diagonal scan.
pub const MAX_TABLE_BOUNCES: u8 = 3;

/// A parsed command together with how long the player took to send it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    /// What the player asked for.
    pub command: Command,
    /// Wall-clock time spent waiting for the line.
    pub elapsed: Duration,
}

impl Decision {
    /// Build a decision.
    pub fn new(command: Command, elapsed: Duration) -> Self {
        Self { command, elapsed }
    }
}

/// State every player carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCore {
    /// Current cell.
    pub position: Point,
    /// Turns left before the player may act again.
    pub cooldown: u32,
    /// Total time spent deciding so far.
    pub decision_time: Duration,
}

impl PlayerCore {
    /// Fresh player at `position`.
    pub fn new(position: Point) -> Self {
        Self {
            position,
            cooldown: 0,
            decision_time: Duration::ZERO,
        }
    }

    /// Cooldown and time bookkeeping shared by both roles.
    ///
    /// A cooling-down player just ticks the counter and yields `Pass`.
    /// Otherwise the decision's time is accumulated and any non-pass
    /// command, unrecognized input included, restarts the cooldown.
    fn begin_turn(&mut self, decision: Option<Decision>, cooldown_reset: u32) -> Command {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return Command::Pass;
        }

        let Some(decision) = decision else {
            return Command::Pass;
        };

        self.decision_time += decision.elapsed;
        if !decision.command.is_pass() {
            self.cooldown = cooldown_reset;
        }
        decision.command
    }
}

/// Common read access for both player variants.
pub trait Player {
    /// Which side this player is on.
    fn role(&self) -> Role;

    /// Shared state.
    fn core(&self) -> &PlayerCore;

    /// Current cell.
    fn position(&self) -> Point {
        self.core().position
    }

    /// Remaining cooldown turns.
    fn cooldown(&self) -> u32 {
        self.core().cooldown
    }

    /// Accumulated decision time.
    fn decision_time(&self) -> Duration {
        self.core().decision_time
    }

    /// Whether a command will be read on this player's next turn.
    fn awaits_command(&self) -> bool {
        self.core().cooldown == 0
    }
}

// =============================================================================
// HUNTER
// =============================================================================

/// Heading chosen by bounce resolution and how many changes it took.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounce {
    /// Unobstructed heading.
    pub heading: Diagonal,
    /// Direction changes applied (0 when the original heading was clear).
    pub turns: u8,
}

/// Classify what blocks a diagonal step, if anything.
pub fn collision_at<O>(grid: &O, position: Point, heading: Diagonal) -> Option<Collision>
where
    O: Occupancy + ?Sized,
{
    let (dx, dy) = heading.delta();
    if !grid.occupied(position.offset(dx, dy)) {
        return None;
    }

    let side = grid.occupied(position.offset(dx, 0));
    let front = grid.occupied(position.offset(0, dy));
    Some(match (side, front) {
        (true, false) => Collision::Vertical,
        (false, true) => Collision::Horizontal,
        _ => Collision::Corner,
    })
}

/// Bounce until the diagonal step is clear.
///
/// Applies the bounce table up to [`MAX_TABLE_BOUNCES`] times. The table can
/// ping-pong between two blocked headings, so after that the first open
/// diagonal in [`Diagonal::ALL`] order is taken. `None` means all four
/// diagonals are blocked.
pub fn resolve_bounce<O>(grid: &O, position: Point, heading: Diagonal) -> Option<Bounce>
where
    O: Occupancy + ?Sized,
{
    let mut heading = heading;
    let mut turns = 0u8;

    while let Some(collision) = collision_at(grid, position, heading) {
        if turns == MAX_TABLE_BOUNCES {
            return Diagonal::ALL
                .into_iter()
                .find(|d| collision_at(grid, position, *d).is_none())
                .map(|d| Bounce { heading: d, turns: turns + 1 });
        }
        heading = heading.bounce(collision);
        turns += 1;
    }

    Some(Bounce { heading, turns })
}

/// The wall-placing side. Always moves one diagonal step per turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunter {
    /// Shared state.
    pub core: PlayerCore,
    /// Current facing.
    pub heading: Diagonal,
}

impl Hunter {
    /// Hunter at `position` facing `heading`.
    pub fn new(position: Point, heading: Diagonal) -> Self {
        Self { core: PlayerCore::new(position), heading }
    }

    /// Cooldown/time bookkeeping. Returns the command whose wall action, if
    /// any, the game state should attempt.
    pub fn begin_turn(&mut self, decision: Option<Decision>, cooldown_reset: u32) -> Command {
        self.core.begin_turn(decision, cooldown_reset)
    }

    /// Forced diagonal movement. Returns the new cell, or `None` when boxed
    /// in on all four diagonals.
    pub fn advance<O>(&mut self, grid: &O) -> Option<Point>
    where
        O: Occupancy + ?Sized,
    {
        let bounce = resolve_bounce(grid, self.core.position, self.heading)?;
        self.heading = bounce.heading;
        self.core.position = self.core.position.step(bounce.heading.direction());
        Some(self.core.position)
    }
}

impl Player for Hunter {
    fn role(&self) -> Role {
        Role::Hunter
    }

    fn core(&self) -> &PlayerCore {
        &self.core
    }
}

// =============================================================================
// PREY
// =============================================================================

/// Why a Prey move was refused. The turn is still spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveRejection {
    /// Target is a wall or off the board.
    #[error("target {0} is occupied")]
    Occupied(Point),
    /// Target is more than one king-move away.
    #[error("target {target} is {distance} cells away")]
    TooFar {
        /// Requested cell.
        target: Point,
        /// Chebyshev distance from the current cell.
        distance: u32,
    },
}

/// The evading side. Moves at most one cell per turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prey {
    /// Shared state.
    pub core: PlayerCore,
}

impl Prey {
    /// Prey at `position`.
    pub fn new(position: Point) -> Self {
        Self { core: PlayerCore::new(position) }
    }

    /// Cooldown/time bookkeeping. Returns the command to act on.
    pub fn begin_turn(&mut self, decision: Option<Decision>, cooldown_reset: u32) -> Command {
        self.core.begin_turn(decision, cooldown_reset)
    }

    /// Cell a movement command points at, if it is a movement command.
    pub fn target_for(&self, command: Command) -> Option<Point> {
        match command {
            Command::MoveTo(target) => Some(target),
            Command::MoveDirection(direction) => Some(self.core.position.step(direction)),
            _ => None,
        }
    }

    /// Relocate to `target` if it is open and adjacent.
    pub fn move_to<O>(&mut self, target: Point, grid: &O) -> Result<Point, MoveRejection>
    where
        O: Occupancy + ?Sized,
    {
        if grid.occupied(target) {
            return Err(MoveRejection::Occupied(target));
        }

        let distance = self.core.position.chebyshev(target);
        if distance > 1 {
            return Err(MoveRejection::TooFar { target, distance });
        }

        self.core.position = target;
        Ok(target)
    }
}

impl Player for Prey {
    fn role(&self) -> Role {
        Role::Prey
    }

    fn core(&self) -> &PlayerCore {
        &self.core
    }
}
