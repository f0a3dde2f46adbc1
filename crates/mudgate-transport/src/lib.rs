//! Transport abstraction layer for Mudgate.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the line-oriented text protocol players speak, plus a plain TCP
//! implementation ([`TcpLineTransport`]).
//!
//! The login controller and the session output actor only ever see a
//! [`Connection`], so a dialog can be driven through an in-memory
//! implementation in tests without opening a socket.

mod error;
mod line;
mod tcp;

pub use error::TransportError;
pub use line::{DEFAULT_MAX_LINE_LEN, LineReader};
pub use tcp::{LineConnection, TcpLineTransport};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Waits for and accepts the next incoming connection.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single connection that exchanges newline-terminated text.
///
/// Every method takes `&self` so one connection can be shared (behind an
/// `Arc`) between the task reading player input and the actor writing
/// output to it.
pub trait Connection: Send + Sync + 'static {
    /// Writes `line` followed by a line terminator.
    fn send_line(
        &self,
        line: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next line from the remote peer, terminator stripped.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv_line(
        &self,
    ) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;

    /// Closes the write side of the connection.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// Returns a printable remote address, used only for logging.
    fn peer(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_equality() {
        let a = ConnectionId::new(1);
        let b = ConnectionId::new(1);
        let c = ConnectionId::new(2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
