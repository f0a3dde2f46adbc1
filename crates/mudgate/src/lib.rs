//! # Mudgate
//!
//! Login gateway for line-based MUCK/MUD servers.
//!
//! Mudgate accepts TCP connections, runs the `connect <user> <password>`
//! dialog against a credential store, enforces attempt budgets and
//! account lockouts, and keeps a registry of who is logged in. Admitted
//! players are handed to a [`CommandLoop`] that implements the game.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mudgate::prelude::*;
//!
//! # async fn start() -> Result<(), MudgateError> {
//! let store = StoreBackend::from_uri("memory:").await?;
//! let server = MudgateServer::builder()
//!     .bind("0.0.0.0:4201")
//!     .build(store)
//!     .await?;
//! server.run().await
//! # }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod logging;

mod handler;
mod server;

pub use command::{CommandLoop, IdleLoop};
pub use config::{ConfigError, Settings};
pub use error::MudgateError;
pub use server::{MudgateServer, MudgateServerBuilder};

/// Everything needed to build a server and a command loop.
pub mod prelude {
    pub use crate::command::{CommandLoop, IdleLoop};
    pub use crate::config::{ConfigError, LogSettings, LoginSettings, ServerSettings, Settings};
    pub use crate::error::MudgateError;
    pub use crate::server::{MudgateServer, MudgateServerBuilder};

    pub use mudgate_protocol::{ConnectCommand, ProtocolError, ServerReply, parse_connect};
    pub use mudgate_session::{
        LoginError, OutputSender, RegistryHandle, Session, SessionError,
    };
    pub use mudgate_store::{
        CredentialStore, FileStore, MemoryStore, StoreBackend, StoreError, UserProfile,
        hash_password,
    };
    pub use mudgate_transport::{Connection, ConnectionId, TransportError};
}
