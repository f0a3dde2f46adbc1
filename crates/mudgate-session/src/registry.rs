//! Active session registry: a single Tokio task that owns the set of
//! logged-in usernames.
//!
//! Connection tasks never touch the map. They send commands through an
//! mpsc mailbox and, where an answer is needed, wait on a oneshot reply
//! channel. The actor applies commands strictly in arrival order, so a
//! query always observes every add and remove that was sent before it.

use std::collections::HashMap;

use mudgate_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::{OutputSender, SessionError};

/// Default command channel size for the registry actor.
const DEFAULT_CHANNEL_SIZE: usize = 256;

/// What the registry keeps for each admitted player.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    /// The connection the player was admitted on.
    pub conn_id: ConnectionId,
    /// Queue into that connection's output actor.
    pub output: OutputSender,
}

/// Commands sent to the registry actor through its channel.
///
/// The `oneshot::Sender` in some variants is the reply channel: the
/// caller sends the command and waits for exactly one answer on it.
enum RegistryCommand {
    /// Insert `name` unless it is already present.
    Add {
        name: String,
        entry: SessionEntry,
        reply: oneshot::Sender<bool>,
    },

    /// Delete `name` if present.
    Remove { name: String },

    /// Is `name` present?
    Query {
        name: String,
        reply: oneshot::Sender<bool>,
    },

    /// Snapshot of every admitted name, sorted.
    Names { reply: oneshot::Sender<Vec<String>> },

    /// Queue a line to one session.
    SendTo {
        name: String,
        text: String,
        reply: oneshot::Sender<bool>,
    },

    /// Queue a line to every session.
    Broadcast { text: String },

    /// Stop the actor. Nothing queued after this is processed.
    Shutdown,
}

/// Handle to the running registry actor.
///
/// This is cheap to clone — it's just an `mpsc::Sender` wrapper. Every
/// connection task holds one.
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Admits `name`. If it is already present this is a no-op: the
    /// existing entry is kept and nothing is replaced.
    ///
    /// Returns `true` if this call inserted the entry. A caller that gets
    /// `false` lost a race with another login for the same name.
    pub async fn add(
        &self,
        name: &str,
        entry: SessionEntry,
    ) -> Result<bool, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RegistryCommand::Add {
            name: name.to_string(),
            entry,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| SessionError::RegistryUnavailable)
    }

    /// Removes `name`. Removing an absent name is a no-op.
    pub async fn remove(&self, name: &str) -> Result<(), SessionError> {
        self.send(RegistryCommand::Remove {
            name: name.to_string(),
        })
        .await
    }

    /// Returns `true` if `name` is currently admitted.
    pub async fn query(&self, name: &str) -> Result<bool, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RegistryCommand::Query {
            name: name.to_string(),
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| SessionError::RegistryUnavailable)
    }

    /// Returns every admitted name in sorted order.
    pub async fn active_names(&self) -> Result<Vec<String>, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RegistryCommand::Names { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| SessionError::RegistryUnavailable)
    }

    /// Queues `text` to `name`'s output actor.
    ///
    /// Returns `false` if `name` is not admitted or its actor is gone.
    pub async fn send_to(
        &self,
        name: &str,
        text: impl Into<String>,
    ) -> Result<bool, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RegistryCommand::SendTo {
            name: name.to_string(),
            text: text.into(),
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| SessionError::RegistryUnavailable)
    }

    /// Queues `text` to every admitted session (fire-and-forget).
    pub async fn broadcast(
        &self,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.send(RegistryCommand::Broadcast { text: text.into() })
            .await
    }

    /// Tells the registry to stop. Later calls on any handle fail with
    /// [`SessionError::RegistryUnavailable`].
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(RegistryCommand::Shutdown).await
    }

    async fn send(&self, cmd: RegistryCommand) -> Result<(), SessionError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| SessionError::RegistryUnavailable)
    }
}

/// The internal registry state. Runs inside a Tokio task.
struct RegistryActor {
    active: HashMap<String, SessionEntry>,
    receiver: mpsc::Receiver<RegistryCommand>,
}

impl RegistryActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!("session registry started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RegistryCommand::Add { name, entry, reply } => {
                    let _ = reply.send(self.handle_add(name, entry));
                }
                RegistryCommand::Remove { name } => {
                    self.handle_remove(&name);
                }
                RegistryCommand::Query { name, reply } => {
                    let _ = reply.send(self.active.contains_key(&name));
                }
                RegistryCommand::Names { reply } => {
                    let mut names: Vec<String> =
                        self.active.keys().cloned().collect();
                    names.sort();
                    let _ = reply.send(names);
                }
                RegistryCommand::SendTo { name, text, reply } => {
                    let delivered = self
                        .active
                        .get(&name)
                        .is_some_and(|entry| entry.output.send(text).is_ok());
                    let _ = reply.send(delivered);
                }
                RegistryCommand::Broadcast { text } => {
                    for entry in self.active.values() {
                        let _ = entry.output.send(text.clone());
                    }
                }
                RegistryCommand::Shutdown => {
                    tracing::info!(
                        active = self.active.len(),
                        "session registry shutting down"
                    );
                    break;
                }
            }
        }

        tracing::info!("session registry stopped");
    }

    fn handle_add(&mut self, name: String, entry: SessionEntry) -> bool {
        if self.active.contains_key(&name) {
            tracing::debug!(player = %name, "already active, add ignored");
            return false;
        }
        tracing::info!(
            player = %name,
            conn_id = %entry.conn_id,
            active = self.active.len() + 1,
            "session admitted"
        );
        self.active.insert(name, entry);
        true
    }

    fn handle_remove(&mut self, name: &str) {
        if self.active.remove(name).is_some() {
            tracing::info!(
                player = %name,
                active = self.active.len(),
                "session removed"
            );
        }
    }
}

/// Spawns the registry actor and returns a handle to it.
pub fn spawn_registry() -> RegistryHandle {
    spawn_registry_with_capacity(DEFAULT_CHANNEL_SIZE)
}

/// Spawns the registry actor with a custom mailbox size.
///
/// `channel_size` controls backpressure — if the mailbox fills up,
/// senders wait (bounded channel).
pub fn spawn_registry_with_capacity(channel_size: usize) -> RegistryHandle {
    let (tx, rx) = mpsc::channel(channel_size.max(1));

    let actor = RegistryActor {
        active: HashMap::new(),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RegistryHandle { sender: tx }
}
