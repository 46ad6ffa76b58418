//! Roles and Match Outcomes

use std::fmt;
use serde::{Serialize, Deserialize};

/// Which side of the match a player is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Places walls, bounces diagonally.
    Hunter,
    /// Moves freely one cell at a time.
    Prey,
}

impl Role {
    /// The other side.
    pub fn opponent(self) -> Role {
        match self {
            Role::Hunter => Role::Prey,
            Role::Prey => Role::Hunter,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Hunter => f.write_str("HUNTER"),
            Role::Prey => f.write_str("PREY"),
        }
    }
}

/// Why a match ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WinReason {
    /// Prey stood inside the Hunter's capture disc.
    Capture,
    /// The loser's accumulated decision time exceeded the limit.
    Timeout,
    /// Prey became unreachable, or the Hunter was boxed in.
    Escape,
    /// The loser's connection dropped mid-match.
    Forfeit,
}

impl fmt::Display for WinReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WinReason::Capture => "CAPTURE",
            WinReason::Timeout => "TIMEOUT",
            WinReason::Escape => "ESCAPE",
            WinReason::Forfeit => "FORFEIT",
        })
    }
}

/// Terminal result of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Winning side.
    pub winner: Role,
    /// Win condition that fired.
    pub reason: WinReason,
    /// Round in which it fired.
    pub round: u32,
}

impl Outcome {
    /// Losing side.
    pub fn loser(&self) -> Role {
        self.winner.opponent()
    }
}
