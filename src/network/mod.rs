//! Network Layer
//!
//! Line-oriented TCP front end: connections, wire format, sessions and
//! matchmaking. This layer is **non-deterministic** - all game logic runs
//! through `game/`.

pub mod connection;
pub mod protocol;
pub mod session;
pub mod server;

pub use connection::{Connection, ConnectionError, ConnectionId};
pub use protocol::{parse_lobby, LobbyMessage};
pub use session::{GameSession, Seat, SessionError, SessionId, SessionResult, SessionState};
pub use server::{Lobby, MatchmakingServer, ServerError};
