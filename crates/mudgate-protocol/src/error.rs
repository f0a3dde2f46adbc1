//! Error types for the protocol layer.
//!
//! A `ProtocolError` never costs the player a login attempt: it means the
//! line could not be understood at all, so the controller just reprompts.

/// Errors that can occur while interpreting a client line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The line did not match `connect <username> <password...>`.
    #[error("unrecognized command format")]
    UnrecognizedCommand,
}
