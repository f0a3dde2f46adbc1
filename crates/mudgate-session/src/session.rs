//! The admitted session: what a player owns between login and logout.
//!
//! A [`Session`] exists only while its name is in the registry and its
//! output actor is running. [`Session::admit`] sets both up and
//! [`Session::close`] tears both down. If the owning task ends without
//! calling `close` (panic, cancellation), `Drop` still removes the
//! registry entry and the output actor stops with it.

use std::sync::Arc;

use mudgate_transport::{Connection, ConnectionId};

use crate::{OutputSender, RegistryHandle, SessionEntry, SessionError, SessionOutput};

/// An authenticated player's runtime handle.
pub struct Session {
    name: String,
    conn_id: ConnectionId,
    output: Option<SessionOutput>,
    sender: OutputSender,
    registry: RegistryHandle,
    closed: bool,
}

impl Session {
    /// Starts an output actor on `conn` and registers `name`.
    ///
    /// Returns `Ok(None)` if `name` was already registered by another
    /// connection; the output actor is stopped and nothing is left behind.
    ///
    /// # Errors
    /// [`SessionError::RegistryUnavailable`] if the registry is gone.
    pub async fn admit<C: Connection>(
        name: &str,
        conn: &Arc<C>,
        registry: &RegistryHandle,
    ) -> Result<Option<Self>, SessionError> {
        let output = SessionOutput::spawn(name, Arc::clone(conn));
        let sender = output.sender();
        let entry = SessionEntry {
            conn_id: conn.id(),
            output: sender.clone(),
        };

        match registry.add(name, entry).await {
            Ok(true) => Ok(Some(Self {
                name: name.to_string(),
                conn_id: conn.id(),
                output: Some(output),
                sender,
                registry: registry.clone(),
                closed: false,
            })),
            Ok(false) => {
                output.stop().await;
                Ok(None)
            }
            Err(e) => {
                output.stop().await;
                Err(e)
            }
        }
    }

    /// Returns the player's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the connection this session was admitted on.
    pub fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }

    /// Queues a line to this player.
    pub fn send(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.sender.send(text)
    }

    /// Returns a sender other tasks can use to reach this player.
    pub fn output(&self) -> OutputSender {
        self.sender.clone()
    }

    /// Returns the registry this session is admitted into.
    pub fn registry(&self) -> &RegistryHandle {
        &self.registry
    }

    /// Removes the registry entry and stops the output actor.
    pub async fn close(mut self) {
        self.closed = true;
        if let Err(e) = self.registry.remove(&self.name).await {
            tracing::debug!(player = %self.name, error = %e, "registry gone before logout");
        }
        if let Some(output) = self.output.take() {
            output.stop().await;
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Drop is synchronous, so the removal is sent from a spawned task.
        let name = std::mem::take(&mut self.name);
        let registry = self.registry.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _ = registry.remove(&name).await;
            });
        }
    }
}
