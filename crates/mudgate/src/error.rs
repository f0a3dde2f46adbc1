//! Unified error type for Mudgate.

use mudgate_protocol::ProtocolError;
use mudgate_session::SessionError;
use mudgate_store::StoreError;
use mudgate_transport::TransportError;

use crate::config::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum MudgateError {
    /// Socket accept, read or write failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A line didn't parse.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The credential store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The registry or an output actor is gone.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Startup configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
