//! Wire Protocol
//!
//! Line-oriented text messages. Every function here is a pure formatter or
//! parser; sending is the session's job.
//!
//! ## Message Flow
//!
//! ```text
//! Client                              Server
//!   |                                   |
//!   |-------- JOIN <name> ------------->|   (or SPECTATE)
//!   |                                   |
//!   |<------- (W, H) M, HC, PC ---------|   match start
//!   |<------- YOURTURN ... -------------|
//!   |-------- PASS / ADD / (x,y) ------>|
//!   |              ...                  |
//!   |<------- GAMEOVER ... -------------|
//! ```

use crate::config::GameConfig;
use crate::game::outcome::{Outcome, Role};
use crate::game::player::Player;
use crate::game::state::GameState;

/// What a pending connection asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyMessage {
    /// Wants to play under this name.
    Join(String),
    /// Wants to watch the next match.
    Spectate,
}

/// Parse a pre-game line. Unknown lines yield `None`.
///
/// `JOIN` needs a non-empty name; everything after the keyword is the name.
pub fn parse_lobby(line: &str) -> Option<LobbyMessage> {
    let line = line.trim();
    let (keyword, rest) = match line.find(char::is_whitespace) {
        Some(idx) => (&line[..idx], line[idx..].trim()),
        None => (line, ""),
    };

    if keyword.eq_ignore_ascii_case("JOIN") && !rest.is_empty() {
        Some(LobbyMessage::Join(rest.to_string()))
    } else if keyword.eq_ignore_ascii_case("SPECTATE") && rest.is_empty() {
        Some(LobbyMessage::Spectate)
    } else {
        None
    }
}

/// Match parameters sent to both players when the match starts.
pub fn start_line(config: &GameConfig) -> String {
    format!(
        "({}, {}) {}, {}, {}",
        config.width, config.height, config.wall_max, config.hunter_cooldown, config.prey_cooldown
    )
}

/// Turn prompt: round, both players, and the active walls in order.
pub fn turn_line(state: &GameState) -> String {
    let hunter = state.hunter();
    let prey = state.prey();
    let walls = state
        .board()
        .walls()
        .iter()
        .map(|w| format!("({},{},{},{},{})", w.id, w.start.x, w.start.y, w.end.x, w.end.y))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "YOURTURN {} H({},{},{},{}), P({},{},{}), W[{}]",
        state.round(),
        hunter.position().x,
        hunter.position().y,
        hunter.cooldown(),
        hunter.heading,
        prey.position().x,
        prey.position().y,
        prey.cooldown(),
        walls,
    )
}

/// Terminal line for a player, from that player's point of view.
pub fn game_over_line(outcome: &Outcome, recipient: Role) -> String {
    let verdict = if recipient == outcome.winner { "WINNER" } else { "LOSER" };
    format!("GAMEOVER {} {} {} {}", outcome.round, verdict, recipient, outcome.reason)
}

/// Terminal line for spectators, naming the winning side.
pub fn spectator_game_over_line(outcome: &Outcome) -> String {
    game_over_line(outcome, outcome.winner)
}
