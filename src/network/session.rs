//! Game Session
//!
//! Drives one match over two player connections plus any spectators.
//! Execution is sequential: the loop only ever waits on the active
//! player's read, bounded by that player's remaining time budget.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::game::command::{parse_command, Command};
use crate::game::outcome::{Outcome, Role, WinReason};
use crate::game::player::Decision;
use crate::game::state::GameState;
use crate::network::connection::{Connection, ConnectionError};
use crate::network::protocol::{game_over_line, spectator_game_over_line, start_line, turn_line};

/// Unique session identifier.
pub type SessionId = Uuid;

/// Slack added to a player's read deadline so that a read that runs out the
/// clock is measured strictly over the limit.
const DEADLINE_SLACK: Duration = Duration::from_millis(1);

/// Longest a single spectator write may take before the spectator is dropped.
const SPECTATOR_SEND_TIMEOUT: Duration = Duration::from_secs(1);

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for both seats to be filled.
    AwaitingStart,
    /// Turn loop running.
    InProgress,
    /// Outcome decided, connections closed.
    Concluded,
}

/// Session errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// Operation not allowed in the current state.
    #[error("Invalid session state: {0:?}")]
    InvalidState(SessionState),

    /// Seat already taken.
    #[error("{0} seat already taken")]
    SeatTaken(Role),
}

/// A named player connection.
#[derive(Debug)]
pub struct Seat {
    /// Name given in `JOIN`.
    pub name: String,
    /// Player's connection.
    pub connection: Connection,
}

impl Seat {
    /// Create a seat.
    pub fn new(name: impl Into<String>, connection: Connection) -> Self {
        Self { name: name.into(), connection }
    }
}

/// Summary of a concluded session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Session id.
    pub session_id: SessionId,
    /// Hunter's name.
    pub hunter: String,
    /// Prey's name.
    pub prey: String,
    /// How the match ended.
    pub outcome: Outcome,
    /// Turns played.
    pub turns: u32,
    /// Hex-encoded digest of the final board.
    pub final_digest: String,
    /// When the outcome was decided.
    pub concluded_at: DateTime<Utc>,
}

/// Both filled seats.
struct Seats {
    hunter: Seat,
    prey: Seat,
}

impl Seats {
    fn get_mut(&mut self, role: Role) -> &mut Seat {
        match role {
            Role::Hunter => &mut self.hunter,
            Role::Prey => &mut self.prey,
        }
    }
}

/// One match between a Hunter and a Prey.
pub struct GameSession {
    id: SessionId,
    state: SessionState,
    game: GameState,
    hunter: Option<Seat>,
    prey: Option<Seat>,
    spectators: Vec<Connection>,
}

impl GameSession {
    /// Create an empty session with its own rules.
    pub fn new(config: GameConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::AwaitingStart,
            game: GameState::new(config),
            hunter: None,
            prey: None,
            spectators: Vec::new(),
        }
    }

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Seat a player. The session starts once both seats are filled.
    pub fn seat(&mut self, role: Role, seat: Seat) -> Result<(), SessionError> {
        if self.state != SessionState::AwaitingStart {
            return Err(SessionError::InvalidState(self.state));
        }

        let slot = match role {
            Role::Hunter => &mut self.hunter,
            Role::Prey => &mut self.prey,
        };
        if slot.is_some() {
            return Err(SessionError::SeatTaken(role));
        }
        *slot = Some(seat);

        if self.hunter.is_some() && self.prey.is_some() {
            self.state = SessionState::InProgress;
        }
        Ok(())
    }

    /// Attach a spectator. Allowed until the session concludes.
    pub fn add_spectator(&mut self, connection: Connection) -> Result<(), SessionError> {
        if self.state == SessionState::Concluded {
            return Err(SessionError::InvalidState(self.state));
        }
        self.spectators.push(connection);
        Ok(())
    }

    /// Play the match to completion and close every connection.
    pub async fn run(mut self) -> Result<SessionResult, SessionError> {
        if self.state != SessionState::InProgress {
            return Err(SessionError::InvalidState(self.state));
        }
        let (Some(hunter), Some(prey)) = (self.hunter.take(), self.prey.take()) else {
            return Err(SessionError::InvalidState(self.state));
        };
        let mut seats = Seats { hunter, prey };

        info!(
            session = %self.id,
            hunter = %seats.hunter.name,
            prey = %seats.prey.name,
            spectators = self.spectators.len(),
            "Session started"
        );

        let outcome = match self.play(&mut seats).await {
            Ok(outcome) => outcome,
            Err((role, e)) => {
                warn!(session = %self.id, %role, error = %e, "Player disconnected, forfeiting");
                Outcome {
                    winner: role.opponent(),
                    reason: WinReason::Forfeit,
                    round: self.game.round(),
                }
            }
        };

        Ok(self.conclude(seats, outcome).await)
    }

    /// Turn loop. A connection failure is returned with the failing role.
    async fn play(&mut self, seats: &mut Seats) -> Result<Outcome, (Role, ConnectionError)> {
        let opening = start_line(self.game.config());
        for role in [Role::Hunter, Role::Prey] {
            seats.get_mut(role).connection.send_line(&opening).await.map_err(|e| (role, e))?;
        }

        loop {
            let prompt = turn_line(&self.game);
            broadcast(&mut self.spectators, &prompt).await;

            let role = self.game.active_role();
            let decision = if self.game.awaits_command() {
                let budget = self.game.time_remaining(role) + DEADLINE_SLACK;
                let seat = seats.get_mut(role);
                let decision = request_decision(&mut seat.connection, role, &prompt, budget)
                    .await
                    .map_err(|e| (role, e))?;
                Some(decision)
            } else {
                None
            };

            if let Some(outcome) = self.game.step(decision) {
                return Ok(outcome);
            }
        }
    }

    /// Announce the outcome, close everything, and build the result.
    async fn conclude(&mut self, seats: Seats, outcome: Outcome) -> SessionResult {
        self.state = SessionState::Concluded;

        let Seats { hunter, prey } = seats;
        let mut hunter_conn = hunter.connection;
        let mut prey_conn = prey.connection;

        for (role, conn) in [(Role::Hunter, &mut hunter_conn), (Role::Prey, &mut prey_conn)] {
            if let Err(e) = conn.send_line(&game_over_line(&outcome, role)).await {
                debug!(session = %self.id, %role, error = %e, "Could not deliver result");
            }
        }
        broadcast(&mut self.spectators, &spectator_game_over_line(&outcome)).await;

        hunter_conn.close().await;
        prey_conn.close().await;
        for conn in self.spectators.drain(..) {
            conn.close().await;
        }

        let final_digest = hex::encode(self.game.latest_digest());
        info!(
            session = %self.id,
            winner = %outcome.winner,
            reason = %outcome.reason,
            round = outcome.round,
            turns = self.game.turn(),
            digest = %final_digest,
            "Session concluded"
        );

        SessionResult {
            session_id: self.id,
            hunter: hunter.name,
            prey: prey.name,
            outcome,
            turns: self.game.turn(),
            final_digest,
            concluded_at: Utc::now(),
        }
    }
}

/// Prompt the active player and wait for its command within `budget`.
///
/// A silent player is charged the whole wait and treated as passing. An
/// over-long line uses up the turn like any other unparseable input.
async fn request_decision(
    connection: &mut Connection,
    role: Role,
    prompt: &str,
    budget: Duration,
) -> Result<Decision, ConnectionError> {
    connection.send_line(prompt).await?;

    let started = Instant::now();
    let line = connection.read_line_within(budget).await;
    let elapsed = started.elapsed();

    let command = match line {
        Ok(Some(line)) => parse_command(role, &line),
        Ok(None) => {
            debug!(%role, ?elapsed, "Read deadline elapsed");
            Command::Pass
        }
        Err(ConnectionError::LineTooLong) => {
            debug!(%role, "Discarded over-long line");
            Command::Unrecognized
        }
        Err(e) => return Err(e),
    };
    Ok(Decision::new(command, elapsed))
}

/// Best-effort write to every spectator; failing ones are dropped.
async fn broadcast(spectators: &mut Vec<Connection>, line: &str) {
    let mut kept = Vec::with_capacity(spectators.len());
    for mut conn in spectators.drain(..) {
        match tokio::time::timeout(SPECTATOR_SEND_TIMEOUT, conn.send_line(line)).await {
            Ok(Ok(())) => kept.push(conn),
            Ok(Err(e)) => debug!(spectator = conn.id(), error = %e, "Dropping spectator"),
            Err(_) => debug!(spectator = conn.id(), "Dropping stalled spectator"),
        }
    }
    *spectators = kept;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::point::Point;
    use crate::network::connection::MAX_LINE_LEN;
    use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

    /// Reads every line; answers each `YOURTURN` with `reply` when given.
    async fn scripted_client(stream: DuplexStream, reply: Option<&'static str>) -> Vec<String> {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut lines = BufReader::new(reader).lines();
        let mut seen = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            if let (true, Some(reply)) = (line.starts_with("YOURTURN"), reply) {
                let _ = writer.write_all(format!("{}\n", reply).as_bytes()).await;
            }
            seen.push(line);
        }
        seen
    }

    /// Answers each `YOURTURN` with `reply` verbatim, then keeps reading.
    async fn raw_client(stream: DuplexStream, reply: Vec<u8>) -> Vec<String> {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut lines = BufReader::new(reader).lines();
        let mut seen = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.starts_with("YOURTURN") {
                let _ = writer.write_all(&reply).await;
            }
            seen.push(line);
        }
        seen
    }

    fn pipe(id: u64) -> (Connection, DuplexStream) {
        let (client, server) = duplex(64 * 1024);
        (Connection::from_stream(id, format!("pipe-{}", id), server), client)
    }

    fn seated(config: GameConfig) -> (GameSession, DuplexStream, DuplexStream) {
        let (hunter, hunter_client) = pipe(1);
        let (prey, prey_client) = pipe(2);
        let mut session = GameSession::new(config);
        session.seat(Role::Hunter, Seat::new("alice", hunter)).unwrap();
        session.seat(Role::Prey, Seat::new("bob", prey)).unwrap();
        (session, hunter_client, prey_client)
    }

    #[test]
    fn test_state_transitions_on_seating() {
        let (hunter, _h) = pipe(1);
        let (prey, _p) = pipe(2);
        let (extra, _e) = pipe(3);
        let mut session = GameSession::new(GameConfig::default());
        assert_eq!(session.state(), SessionState::AwaitingStart);

        session.seat(Role::Hunter, Seat::new("a", hunter)).unwrap();
        assert_eq!(session.state(), SessionState::AwaitingStart);
        assert!(matches!(
            session.seat(Role::Hunter, Seat::new("x", extra)),
            Err(SessionError::SeatTaken(Role::Hunter))
        ));

        session.seat(Role::Prey, Seat::new("b", prey)).unwrap();
        assert_eq!(session.state(), SessionState::InProgress);
    }

    #[tokio::test]
    async fn test_run_requires_both_seats() {
        let session = GameSession::new(GameConfig::default());
        let err = session.run().await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidState(SessionState::AwaitingStart)));
    }

    #[tokio::test]
    async fn test_full_match_to_capture() {
        let config = GameConfig {
            width: 20,
            height: 20,
            hunter_start: Point::new(0, 0),
            prey_start: Point::new(6, 6),
            ..GameConfig::default()
        };
        let (mut session, hunter_client, prey_client) = seated(config);
        let (spectator, spectator_client) = pipe(3);
        session.add_spectator(spectator).unwrap();

        let hunter_task = tokio::spawn(scripted_client(hunter_client, Some("PASS")));
        let prey_task = tokio::spawn(scripted_client(prey_client, Some("PASS")));
        let spectator_task = tokio::spawn(scripted_client(spectator_client, None));

        let result = session.run().await.unwrap();
        assert_eq!(result.outcome, Outcome { winner: Role::Hunter, reason: WinReason::Capture, round: 3 });
        assert_eq!(result.turns, 7);
        assert_eq!(result.hunter, "alice");
        assert_eq!(result.prey, "bob");
        assert_eq!(result.final_digest.len(), 64);

        let hunter_lines = hunter_task.await.unwrap();
        assert_eq!(hunter_lines.first().map(String::as_str), Some("(20, 20) 6, 10, 1"));
        assert_eq!(hunter_lines[1], "YOURTURN 0 H(0,0,0,SE), P(6,6,0), W[]");
        assert_eq!(hunter_lines.last().map(String::as_str), Some("GAMEOVER 3 WINNER HUNTER CAPTURE"));

        let prey_lines = prey_task.await.unwrap();
        assert_eq!(prey_lines.last().map(String::as_str), Some("GAMEOVER 3 LOSER PREY CAPTURE"));

        let spectator_lines = spectator_task.await.unwrap();
        assert_eq!(spectator_lines.len(), 8);
        assert!(spectator_lines[..7].iter().all(|l| l.starts_with("YOURTURN")));
        assert_eq!(spectator_lines[7], "GAMEOVER 3 WINNER HUNTER CAPTURE");
    }

    #[tokio::test]
    async fn test_silent_hunter_times_out() {
        let config = GameConfig { time_limit_ms: 50, ..GameConfig::default() };
        let (session, hunter_client, prey_client) = seated(config);

        let hunter_task = tokio::spawn(scripted_client(hunter_client, None));
        let prey_task = tokio::spawn(scripted_client(prey_client, Some("PASS")));

        let result = session.run().await.unwrap();
        assert_eq!(result.outcome, Outcome { winner: Role::Prey, reason: WinReason::Timeout, round: 0 });

        let hunter_lines = hunter_task.await.unwrap();
        assert_eq!(hunter_lines.last().map(String::as_str), Some("GAMEOVER 0 LOSER HUNTER TIMEOUT"));
        let prey_lines = prey_task.await.unwrap();
        assert_eq!(prey_lines.last().map(String::as_str), Some("GAMEOVER 0 WINNER PREY TIMEOUT"));
    }

    async fn prey_replies_with(reply: Vec<u8>) -> (SessionResult, Vec<String>) {
        let config = GameConfig {
            width: 20,
            height: 20,
            prey_start: Point::new(6, 6),
            ..GameConfig::default()
        };
        let (session, hunter_client, prey_client) = seated(config);
        tokio::spawn(scripted_client(hunter_client, Some("PASS")));
        let prey_task = tokio::spawn(raw_client(prey_client, reply));

        let result = session.run().await.unwrap();
        (result, prey_task.await.unwrap())
    }

    #[tokio::test]
    async fn test_invalid_utf8_command_does_not_forfeit() {
        let (result, prey_lines) = prey_replies_with(b"\xff\xfe garbage\n".to_vec()).await;
        assert_eq!(result.outcome, Outcome { winner: Role::Hunter, reason: WinReason::Capture, round: 3 });
        assert_eq!(result.turns, 7);
        assert_eq!(prey_lines.last().map(String::as_str), Some("GAMEOVER 3 LOSER PREY CAPTURE"));
    }

    #[tokio::test]
    async fn test_overlong_command_does_not_forfeit() {
        let mut reply = vec![b'A'; MAX_LINE_LEN * 2];
        reply.push(b'\n');
        let (result, prey_lines) = prey_replies_with(reply).await;
        assert_eq!(result.outcome, Outcome { winner: Role::Hunter, reason: WinReason::Capture, round: 3 });
        assert_eq!(prey_lines.last().map(String::as_str), Some("GAMEOVER 3 LOSER PREY CAPTURE"));
    }

    #[tokio::test]
    async fn test_disconnect_forfeits() {
        let (session, hunter_client, prey_client) = seated(GameConfig::default());
        drop(prey_client);
        let hunter_task = tokio::spawn(scripted_client(hunter_client, Some("PASS")));

        let result = session.run().await.unwrap();
        assert_eq!(result.outcome.winner, Role::Hunter);
        assert_eq!(result.outcome.reason, WinReason::Forfeit);

        let hunter_lines = hunter_task.await.unwrap();
        assert_eq!(hunter_lines.last().map(String::as_str), Some("GAMEOVER 0 WINNER HUNTER FORFEIT"));
    }

    #[tokio::test]
    async fn test_dead_spectator_does_not_stop_match() {
        let config = GameConfig {
            width: 20,
            height: 20,
            prey_start: Point::new(6, 6),
            ..GameConfig::default()
        };
        let (mut session, hunter_client, prey_client) = seated(config);
        let (spectator, spectator_client) = pipe(3);
        session.add_spectator(spectator).unwrap();
        drop(spectator_client);

        tokio::spawn(scripted_client(hunter_client, Some("PASS")));
        tokio::spawn(scripted_client(prey_client, Some("PASS")));

        let result = session.run().await.unwrap();
        assert_eq!(result.outcome.reason, WinReason::Capture);
    }

    #[test]
    fn test_result_serializes() {
        let result = SessionResult {
            session_id: Uuid::nil(),
            hunter: "a".into(),
            prey: "b".into(),
            outcome: Outcome { winner: Role::Prey, reason: WinReason::Escape, round: 4 },
            turns: 9,
            final_digest: "00".repeat(32),
            concluded_at: Utc::now(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"]["winner"], "PREY");
        assert_eq!(json["turns"], 9);
        let back: SessionResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
