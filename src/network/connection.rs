//! Line Connection
//!
//! One newline-delimited text stream per client. Works over any tokio byte
//! stream so sessions can be driven by in-memory pipes in tests.
//!
//! Lines are capped at [`MAX_LINE_LEN`] bytes. Bytes past the cap are
//! discarded up to the next newline and the line is reported as
//! [`ConnectionError::LineTooLong`]. Invalid UTF-8 is decoded lossily.

use std::fmt;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Longest accepted line in bytes, excluding the terminator.
pub const MAX_LINE_LEN: usize = 4096;

/// Connection identifier, unique per server process.
pub type ConnectionId = u64;

/// Connection failures. Either one ends the connection's part in a match.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Peer closed its side.
    #[error("Connection closed by peer")]
    Closed,

    /// Peer sent a line longer than [`MAX_LINE_LEN`]. The line was
    /// discarded; the connection is still usable.
    #[error("Line exceeds {} bytes", MAX_LINE_LEN)]
    LineTooLong,

    /// Transport error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A line-oriented client connection.
pub struct Connection {
    id: ConnectionId,
    peer: String,
    reader: BufReader<BoxedReader>,
    /// Bytes of the line being assembled. Kept across cancelled reads.
    partial: Vec<u8>,
    /// Set once the current line went past the cap.
    overflowed: bool,
    writer: BoxedWriter,
}

impl Connection {
    /// Wrap separate read and write halves.
    pub fn new<R, W>(id: ConnectionId, peer: impl Into<String>, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let reader: BoxedReader = Box::new(reader);
        Self {
            id,
            peer: peer.into(),
            reader: BufReader::new(reader),
            partial: Vec::new(),
            overflowed: false,
            writer: Box::new(writer),
        }
    }

    /// Wrap a bidirectional stream.
    pub fn from_stream<S>(id: ConnectionId, peer: impl Into<String>, stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self::new(id, peer, reader, writer)
    }

    /// Wrap an accepted TCP socket.
    pub fn from_tcp(id: ConnectionId, stream: TcpStream) -> Self {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let (reader, writer) = stream.into_split();
        Self::new(id, peer, reader, writer)
    }

    /// Connection id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Peer label for logging.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Wait for the next line. End of stream is [`ConnectionError::Closed`].
    ///
    /// Cancel safe: partial input stays buffered for the next call.
    pub async fn read_line(&mut self) -> Result<String, ConnectionError> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Err(ConnectionError::Closed);
            }

            let (chunk, complete) = match available.iter().position(|&b| b == b'\n') {
                Some(end) => (&available[..end], true),
                None => (available, false),
            };
            let room = MAX_LINE_LEN.saturating_sub(self.partial.len());
            if chunk.len() > room {
                self.overflowed = true;
            }
            self.partial.extend_from_slice(&chunk[..chunk.len().min(room)]);

            let consumed = chunk.len() + usize::from(complete);
            self.reader.consume(consumed);

            if complete {
                return self.take_line();
            }
        }
    }

    fn take_line(&mut self) -> Result<String, ConnectionError> {
        let bytes = std::mem::take(&mut self.partial);
        if std::mem::replace(&mut self.overflowed, false) {
            return Err(ConnectionError::LineTooLong);
        }
        let line = String::from_utf8_lossy(&bytes);
        Ok(line.strip_suffix('\r').unwrap_or(&line).to_string())
    }

    /// Wait at most `window` for the next line.
    ///
    /// `Ok(None)` means the window elapsed. Partial input stays buffered for
    /// the next call.
    pub async fn read_line_within(&mut self, window: Duration) -> Result<Option<String>, ConnectionError> {
        match tokio::time::timeout(window, self.read_line()).await {
            Ok(line) => line.map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Write one line, appending the newline, and flush.
    pub async fn send_line(&mut self, line: &str) -> Result<(), ConnectionError> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Shut down the write side and drop the connection.
    pub async fn close(mut self) {
        let _ = self.writer.shutdown().await;
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt};

    #[tokio::test]
    async fn test_read_lines_strip_terminators() {
        let (client, server) = duplex(256);
        let mut conn = Connection::from_stream(1, "test", server);
        let (_, mut client_write) = tokio::io::split(client);

        client_write.write_all(b"JOIN alice\r\nPASS\n").await.unwrap();
        assert_eq!(conn.read_line().await.unwrap(), "JOIN alice");
        assert_eq!(conn.read_line().await.unwrap(), "PASS");
    }

    #[tokio::test]
    async fn test_read_within_times_out_and_keeps_partial_line() {
        let (client, server) = duplex(256);
        let mut conn = Connection::from_stream(2, "test", server);
        let (_, mut client_write) = tokio::io::split(client);

        assert!(conn.read_line_within(Duration::from_millis(10)).await.unwrap().is_none());
        client_write.write_all(b"SPEC").await.unwrap();
        assert!(conn.read_line_within(Duration::from_millis(10)).await.unwrap().is_none());
        client_write.write_all(b"TATE\n").await.unwrap();
        let line = conn.read_line_within(Duration::from_millis(500)).await.unwrap();
        assert_eq!(line.as_deref(), Some("SPECTATE"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_decoded_lossily() {
        let (client, server) = duplex(256);
        let mut conn = Connection::from_stream(5, "test", server);
        let (_, mut client_write) = tokio::io::split(client);

        client_write.write_all(b"\xff\xfe garbage\r\nPASS\n").await.unwrap();
        assert_eq!(conn.read_line().await.unwrap(), "\u{FFFD}\u{FFFD} garbage");
        assert_eq!(conn.read_line().await.unwrap(), "PASS");
    }

    #[tokio::test]
    async fn test_overlong_line_is_discarded() {
        let (client, server) = duplex(1024);
        let mut conn = Connection::from_stream(6, "test", server);
        let (_, mut client_write) = tokio::io::split(client);

        let writer = tokio::spawn(async move {
            let flood = vec![b'A'; 1024 * 1024];
            client_write.write_all(&flood).await.unwrap();
            client_write.write_all(b"\n(1,2)\n").await.unwrap();
            client_write
        });

        assert!(matches!(conn.read_line().await, Err(ConnectionError::LineTooLong)));
        assert!(conn.partial.is_empty());
        assert_eq!(conn.read_line().await.unwrap(), "(1,2)");
        let _client_write = writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_line_at_cap_is_accepted() {
        let (client, server) = duplex(8 * 1024);
        let mut conn = Connection::from_stream(7, "test", server);
        let (_, mut client_write) = tokio::io::split(client);

        let mut line = vec![b'B'; MAX_LINE_LEN];
        line.push(b'\n');
        client_write.write_all(&line).await.unwrap();
        assert_eq!(conn.read_line().await.unwrap().len(), MAX_LINE_LEN);
    }

    #[tokio::test]
    async fn test_closed_peer() {
        let (client, server) = duplex(64);
        let mut conn = Connection::from_stream(3, "test", server);
        drop(client);
        assert!(matches!(conn.read_line().await, Err(ConnectionError::Closed)));
    }

    #[tokio::test]
    async fn test_send_line_appends_newline() {
        let (client, server) = duplex(64);
        let mut conn = Connection::from_stream(4, "test", server);
        conn.send_line("YOURTURN 0").await.unwrap();
        conn.close().await;

        let mut received = String::new();
        let (mut client_read, _client_write) = tokio::io::split(client);
        client_read.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "YOURTURN 0\n");
    }
}
