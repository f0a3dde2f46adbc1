//! Plain TCP transport speaking CRLF-terminated lines.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use crate::{
    Connection, ConnectionId, DEFAULT_MAX_LINE_LEN, LineReader, Transport,
    TransportError,
};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A TCP-based [`Transport`] that listens for incoming player connections.
pub struct TcpLineTransport {
    listener: TcpListener,
    max_line_len: usize,
}

impl TcpLineTransport {
    /// Binds a new transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "line transport listening");
        Ok(Self {
            listener,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        })
    }

    /// Sets the longest line accepted from a client.
    pub fn max_line_len(mut self, max: usize) -> Self {
        self.max_line_len = max;
        self
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for TcpLineTransport {
    type Connection = LineConnection;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %addr, "accepted connection");

        let (read, write) = stream.into_split();
        Ok(LineConnection {
            id,
            peer: addr.to_string(),
            reader: Mutex::new(
                LineReader::new(read).max_line_len(self.max_line_len),
            ),
            writer: Mutex::new(write),
        })
    }
}

/// A single TCP connection.
///
/// Reads and writes are guarded separately so the output actor can write
/// while the session task is parked waiting for input.
pub struct LineConnection {
    id: ConnectionId,
    peer: String,
    reader: Mutex<LineReader<OwnedReadHalf>>,
    writer: Mutex<OwnedWriteHalf>,
}

impl Connection for LineConnection {
    async fn send_line(&self, line: &str) -> Result<(), TransportError> {
        let mut framed = Vec::with_capacity(line.len() + 2);
        framed.extend_from_slice(line.as_bytes());
        framed.extend_from_slice(b"\r\n");

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&framed)
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv_line(&self) -> Result<Option<String>, TransportError> {
        self.reader.lock().await.read_line().await
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer(&self) -> &str {
        &self.peer
    }
}
