//! Matchmaking Server
//!
//! TCP acceptor plus a matchmaker task sharing the pending-connection pool.
//! The acceptor appends new connections; the matchmaker reads one line from
//! each pending connection per scan, moves `JOIN`/`SPECTATE` senders into
//! the lobby, and starts a session whenever two players are ready.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinSet;
use tokio::time::interval;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{GameConfig, ServerConfig};
use crate::game::outcome::Role;
use crate::network::connection::{Connection, ConnectionId};
use crate::network::protocol::{parse_lobby, LobbyMessage};
use crate::network::session::{GameSession, Seat, SessionError, SessionResult};

/// Server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind or query the listener.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// Session could not be assembled.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Unclassified connections. `count` includes any currently out for a scan.
#[derive(Default)]
struct PendingPool {
    connections: Mutex<Vec<Connection>>,
    count: AtomicUsize,
}

type Pending = Arc<PendingPool>;
type Results = Arc<RwLock<Vec<SessionResult>>>;

// =============================================================================
// LOBBY
// =============================================================================

/// Classified connections waiting for a match.
#[derive(Debug, Default)]
pub struct Lobby {
    players: VecDeque<Seat>,
    spectators: Vec<Connection>,
}

impl Lobby {
    /// Create an empty lobby.
    pub fn new() -> Self {
        Self::default()
    }

    /// File a connection under what it asked for.
    pub fn admit(&mut self, connection: Connection, message: LobbyMessage) {
        match message {
            LobbyMessage::Join(name) => self.players.push_back(Seat::new(name, connection)),
            LobbyMessage::Spectate => self.spectators.push(connection),
        }
    }

    /// The two longest-waiting players as `(hunter, prey)`.
    pub fn take_pair(&mut self) -> Option<(Seat, Seat)> {
        if self.players.len() < 2 {
            return None;
        }
        let hunter = self.players.pop_front()?;
        let prey = self.players.pop_front()?;
        Some((hunter, prey))
    }

    /// Every queued spectator, clearing the queue.
    pub fn take_spectators(&mut self) -> Vec<Connection> {
        std::mem::take(&mut self.spectators)
    }

    /// Players waiting for an opponent.
    pub fn ready_count(&self) -> usize {
        self.players.len()
    }

    /// Spectators waiting for the next match.
    pub fn spectator_count(&self) -> usize {
        self.spectators.len()
    }
}

// =============================================================================
// SERVER
// =============================================================================

/// The matchmaking server.
pub struct MatchmakingServer {
    /// Listener and matchmaking settings.
    config: ServerConfig,
    /// Rules handed to every session.
    game: GameConfig,
    /// Connections that have not yet sent `JOIN` or `SPECTATE`.
    pending: Pending,
    /// Concluded sessions.
    results: Results,
    /// Next connection id.
    next_id: AtomicU64,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl MatchmakingServer {
    /// Create a new server.
    pub fn new(config: ServerConfig, game: GameConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            game,
            pending: Arc::new(PendingPool::default()),
            results: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicU64::new(1),
            shutdown_tx,
        }
    }

    /// Bind the configured address and serve until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener until shutdown.
    #[instrument(skip(self, listener))]
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        info!("Matchmaking server listening on {}", listener.local_addr()?);

        let matchmaker_handle = tokio::spawn(Self::run_matchmaker(
            self.config.clone(),
            self.game.clone(),
            self.pending.clone(),
            self.results.clone(),
        ));

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let mut pending = self.pending.connections.lock().await;
                            if self.pending.count.load(Ordering::Acquire) >= self.config.max_pending {
                                warn!("Pending pool full, rejecting {}", addr);
                                continue;
                            }
                            let id: ConnectionId = self.next_id.fetch_add(1, Ordering::Relaxed);
                            info!(connection = id, "New connection from {}", addr);
                            pending.push(Connection::from_tcp(id, stream));
                            self.pending.count.fetch_add(1, Ordering::AcqRel);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        matchmaker_handle.abort();

        Ok(())
    }

    /// Signal `serve` to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Results of every concluded session, oldest first.
    pub async fn results(&self) -> Vec<SessionResult> {
        self.results.read().await.clone()
    }

    /// Connections still waiting to identify themselves.
    pub fn pending_count(&self) -> usize {
        self.pending.count.load(Ordering::Acquire)
    }

    /// Matchmaker: scan pending, classify, pair, run sessions.
    async fn run_matchmaker(config: ServerConfig, game: GameConfig, pending: Pending, results: Results) {
        let mut ticker = interval(config.matchmaking_interval().max(Duration::from_millis(1)));
        let mut lobby = Lobby::new();

        loop {
            ticker.tick().await;

            Self::scan_pending(&pending, &mut lobby, &config).await;

            while let Some((hunter, prey)) = lobby.take_pair() {
                let session = match Self::assemble(&game, hunter, prey, lobby.take_spectators()) {
                    Ok(session) => session,
                    Err(e) => {
                        error!("Failed to assemble session: {}", e);
                        continue;
                    }
                };

                if config.concurrent_sessions {
                    tokio::spawn(Self::run_session(session, results.clone()));
                } else {
                    Self::run_session(session, results.clone()).await;
                }
            }
        }
    }

    /// One pass over the pending pool.
    ///
    /// Every connection in the batch is polled at once, so a scan costs one
    /// handshake window however many connections are idle. Results are
    /// filed in arrival order, and unclassified connections are put back
    /// ahead of anything accepted meanwhile.
    async fn scan_pending(pending: &Pending, lobby: &mut Lobby, config: &ServerConfig) {
        let batch = std::mem::take(&mut *pending.connections.lock().await);
        if batch.is_empty() {
            return;
        }

        let window = config.handshake_poll();
        let mut polls = JoinSet::new();
        for (index, mut conn) in batch.into_iter().enumerate() {
            polls.spawn(async move {
                let read = conn.read_line_within(window).await;
                (index, conn, read)
            });
        }

        let mut polled = Vec::with_capacity(polls.len());
        while let Some(joined) = polls.join_next().await {
            match joined {
                Ok(entry) => polled.push(entry),
                Err(e) => {
                    error!("Handshake poll failed: {}", e);
                    pending.count.fetch_sub(1, Ordering::AcqRel);
                }
            }
        }
        polled.sort_by_key(|(index, _, _)| *index);

        let mut unclassified = Vec::with_capacity(polled.len());
        for (_, conn, read) in polled {
            match read {
                Ok(Some(line)) => match parse_lobby(&line) {
                    Some(message) => {
                        info!(connection = conn.id(), peer = conn.peer(), ?message, "Connection classified");
                        pending.count.fetch_sub(1, Ordering::AcqRel);
                        lobby.admit(conn, message);
                    }
                    None => {
                        debug!(connection = conn.id(), %line, "Ignoring pre-game line");
                        unclassified.push(conn);
                    }
                },
                Ok(None) => unclassified.push(conn),
                Err(e) => {
                    debug!(connection = conn.id(), error = %e, "Dropping pending connection");
                    pending.count.fetch_sub(1, Ordering::AcqRel);
                }
            }
        }

        let mut connections = pending.connections.lock().await;
        unclassified.append(&mut connections);
        *connections = unclassified;
    }

    /// Seat both players and attach spectators.
    fn assemble(
        game: &GameConfig,
        hunter: Seat,
        prey: Seat,
        spectators: Vec<Connection>,
    ) -> Result<GameSession, ServerError> {
        let mut session = GameSession::new(game.clone());
        session.seat(Role::Hunter, hunter)?;
        session.seat(Role::Prey, prey)?;
        for spectator in spectators {
            session.add_spectator(spectator)?;
        }
        Ok(session)
    }

    async fn run_session(session: GameSession, results: Results) {
        match session.run().await {
            Ok(result) => results.write().await.push(result),
            Err(e) => error!("Session failed: {}", e),
        }
    }
}
