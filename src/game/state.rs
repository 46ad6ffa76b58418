//! Match State
//!
//! The turn machine for one match: board, both players, turn counter and
//! per-turn board history. Pure and deterministic given the same sequence
//! of decisions; all I/O lives in the network layer.

use std::time::Duration;
use tracing::debug;

use crate::config::GameConfig;
use crate::core::direction::Diagonal;
use crate::core::hash::BoardDigest;
use crate::game::board::{Board, OpenCells};
use crate::game::command::Command;
use crate::game::outcome::{Outcome, Role, WinReason};
use crate::game::player::{Decision, Hunter, Player, Prey};
use crate::game::search::{is_separated, is_trapped, within_capture};

/// Direction the Hunter faces at the start of every match.
pub const HUNTER_START_HEADING: Diagonal = Diagonal::SouthEast;

/// Complete state of a single match.
#[derive(Clone, Debug)]
pub struct GameState {
    config: GameConfig,
    board: Board,
    hunter: Hunter,
    prey: Prey,
    turn: u32,
    history: Vec<BoardDigest>,
}

impl GameState {
    /// Fresh match laid out by `config`.
    pub fn new(config: GameConfig) -> Self {
        Self {
            board: Board::from_config(&config),
            hunter: Hunter::new(config.hunter_start, HUNTER_START_HEADING),
            prey: Prey::new(config.prey_start),
            turn: 0,
            history: Vec::new(),
            config,
        }
    }

    /// Immutable rules for this match.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The Hunter.
    pub fn hunter(&self) -> &Hunter {
        &self.hunter
    }

    /// The Prey.
    pub fn prey(&self) -> &Prey {
        &self.prey
    }

    /// Turns played so far.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Current round: two turns per round.
    pub fn round(&self) -> u32 {
        self.turn / 2
    }

    /// Board digest recorded after each turn.
    pub fn history(&self) -> &[BoardDigest] {
        &self.history
    }

    /// Whose turn it is. Hunter moves on even turns.
    pub fn active_role(&self) -> Role {
        if self.turn % 2 == 0 {
            Role::Hunter
        } else {
            Role::Prey
        }
    }

    /// Whether the active player will read a command this turn.
    pub fn awaits_command(&self) -> bool {
        match self.active_role() {
            Role::Hunter => self.hunter.awaits_command(),
            Role::Prey => self.prey.awaits_command(),
        }
    }

    /// Accumulated decision time for `role`.
    pub fn decision_time(&self, role: Role) -> Duration {
        match role {
            Role::Hunter => self.hunter.decision_time(),
            Role::Prey => self.prey.decision_time(),
        }
    }

    /// Time `role` may still spend deciding before losing on time.
    pub fn time_remaining(&self, role: Role) -> Duration {
        self.config.time_limit().saturating_sub(self.decision_time(role))
    }

    /// Play the active player's turn, record the board, and advance.
    ///
    /// `decision` is ignored while the active player is cooling down.
    pub fn play_turn(&mut self, decision: Option<Decision>) {
        match self.active_role() {
            Role::Hunter => self.hunter_turn(decision),
            Role::Prey => self.prey_turn(decision),
        }

        self.history.push(self.board.digest());
        self.turn += 1;
    }

    /// Play one turn and evaluate win conditions.
    pub fn step(&mut self, decision: Option<Decision>) -> Option<Outcome> {
        self.play_turn(decision);
        self.evaluate()
    }

    fn hunter_turn(&mut self, decision: Option<Decision>) {
        let command = self.hunter.begin_turn(decision, self.config.hunter_cooldown);

        let result = match command {
            Command::PlaceWall { id, start, end } => self.board.place_wall(id, start, end),
            Command::RemoveWall { id } => self.board.remove_wall(id).map(|_| ()),
            _ => Ok(()),
        };
        if let Err(e) = result {
            debug!(turn = self.turn, error = %e, "Hunter wall action rejected");
        }

        match self.hunter.advance(&self.board) {
            Some(position) => debug!(turn = self.turn, %position, heading = %self.hunter.heading, "Hunter moved"),
            None => debug!(turn = self.turn, "Hunter boxed in"),
        }
    }

    fn prey_turn(&mut self, decision: Option<Decision>) {
        let command = self.prey.begin_turn(decision, self.config.prey_cooldown);

        let Some(target) = self.prey.target_for(command) else {
            return;
        };
        match self.prey.move_to(target, &self.board) {
            Ok(position) => debug!(turn = self.turn, %position, "Prey moved"),
            Err(e) => debug!(turn = self.turn, error = %e, "Prey move rejected"),
        }
    }

    /// Check win conditions, Hunter wins first.
    ///
    /// Returns `None` while the match continues. Only meaningful after at
    /// least one turn.
    pub fn evaluate(&self) -> Option<Outcome> {
        let round = self.turn.saturating_sub(1) / 2;
        let hunter = self.hunter.position();
        let prey = self.prey.position();
        let limit = self.config.time_limit();
        let view = OpenCells::new(&self.board, hunter, prey);

        let fired = if within_capture(&view, hunter, prey, self.config.capture_distance) {
            Some((Role::Hunter, WinReason::Capture))
        } else if self.prey.decision_time() > limit {
            Some((Role::Hunter, WinReason::Timeout))
        } else if is_separated(&view, hunter, prey) || is_trapped(&self.board, hunter) {
            Some((Role::Prey, WinReason::Escape))
        } else if self.hunter.decision_time() > limit {
            Some((Role::Prey, WinReason::Timeout))
        } else {
            None
        };

        fired.map(|(winner, reason)| Outcome { winner, reason, round })
    }

    /// Digest of the most recent turn, or of the current board before any
    /// turn has been played.
    pub fn latest_digest(&self) -> BoardDigest {
        self.history.last().copied().unwrap_or_else(|| self.board.digest())
    }
}
