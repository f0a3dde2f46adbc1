//! `MudgateServer` builder and server loop.
//!
//! This is the entry point for running a Mudgate login server. It ties
//! together all the layers: transport → protocol → session → command loop.

use std::future::Future;
use std::sync::Arc;

use mudgate_session::{Authenticator, RegistryHandle, spawn_registry};
use mudgate_store::{CredentialGateway, CredentialStore};
use mudgate_transport::{Connection, TcpLineTransport, Transport};

use crate::command::{CommandLoop, IdleLoop};
use crate::config::Settings;
use crate::handler::handle_connection;
use crate::MudgateError;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. Nothing in
/// here is mutable; the registry actor owns the only shared mutable state.
pub(crate) struct ServerState<S, L> {
    pub(crate) auth: Authenticator<S>,
    pub(crate) settings: Settings,
    pub(crate) command_loop: L,
}

/// Builder for configuring and starting a Mudgate server.
///
/// # Example
///
/// ```rust,ignore
/// use mudgate::prelude::*;
///
/// let store = StoreBackend::from_uri("file:///var/lib/mudgate/users").await?;
/// let server = MudgateServer::builder()
///     .bind("0.0.0.0:4201")
///     .build(store)
///     .await?;
/// server.run().await
/// ```
pub struct MudgateServerBuilder<L = IdleLoop> {
    settings: Settings,
    command_loop: L,
}

impl MudgateServerBuilder<IdleLoop> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            command_loop: IdleLoop,
        }
    }
}

impl Default for MudgateServerBuilder<IdleLoop> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: CommandLoop> MudgateServerBuilder<L> {
    /// Replaces all settings.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.settings.server.bind = addr.to_string();
        self
    }

    /// Sets what admitted players are handed to.
    pub fn command_loop<L2: CommandLoop>(self, command_loop: L2) -> MudgateServerBuilder<L2> {
        MudgateServerBuilder {
            settings: self.settings,
            command_loop,
        }
    }

    /// Binds the listener, starts the registry actor and returns the server.
    pub async fn build<S: CredentialStore>(
        self,
        store: S,
    ) -> Result<MudgateServer<S, L>, MudgateError> {
        self.settings.validate()?;

        let transport = TcpLineTransport::bind(&self.settings.server.bind)
            .await?
            .max_line_len(self.settings.server.max_line_len);

        let gateway = CredentialGateway::new(store, self.settings.login.database_timeout());
        let state = Arc::new(ServerState {
            auth: Authenticator::new(gateway, spawn_registry()),
            settings: self.settings,
            command_loop: self.command_loop,
        });

        Ok(MudgateServer { transport, state })
    }
}

/// A bound Mudgate server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct MudgateServer<S, L = IdleLoop> {
    transport: TcpLineTransport,
    state: Arc<ServerState<S, L>>,
}

impl MudgateServer<(), IdleLoop> {
    /// Creates a new builder.
    pub fn builder() -> MudgateServerBuilder {
        MudgateServerBuilder::new()
    }
}

impl<S, L> MudgateServer<S, L>
where
    S: CredentialStore,
    L: CommandLoop,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns a handle to the active session registry.
    pub fn registry(&self) -> RegistryHandle {
        self.state.auth.registry().clone()
    }

    /// Returns the effective settings.
    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    /// Runs the login dialog and command loop on a connection from any
    /// transport, returning when the connection is done.
    pub async fn serve<C: Connection>(&self, conn: C) -> Result<(), MudgateError> {
        handle_connection(conn, Arc::clone(&self.state)).await
    }

    /// Stops the registry actor. Logins in progress fail with a system
    /// error from then on.
    pub async fn shutdown(&self) -> Result<(), MudgateError> {
        self.state.auth.registry().shutdown().await?;
        Ok(())
    }

    /// Runs the server accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), MudgateError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `signal` completes, then shuts down.
    ///
    /// Each accepted connection gets its own handler task. Accept errors
    /// are logged and the loop keeps going.
    pub async fn run_until(
        mut self,
        signal: impl Future<Output = ()> + Send,
    ) -> Result<(), MudgateError> {
        tracing::info!(bind = %self.state.settings.server.bind, "Mudgate server running");
        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = &mut signal => {
                    tracing::info!("shutdown requested");
                    break;
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        self.shutdown().await
    }
}
