//! Error types for the session layer.
//!
//! Two families live here:
//!
//! - [`SessionError`] — an actor (registry or output channel) is gone.
//! - [`LoginError`] — why one login attempt failed, split into
//!   [`CredentialError`] (the player's fault, costs an attempt) and
//!   [`SystemError`] (our fault, never costs an attempt).
//!
//! Every credential failure renders as one of two generic replies, so
//! the distinction between them exists only in logs.

use std::time::Duration;

use chrono::{DateTime, Utc};
use mudgate_protocol::ServerReply;
use mudgate_store::StoreError;

/// Errors that can occur while talking to session actors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The registry actor has shut down or its mailbox is closed.
    #[error("session registry is unavailable")]
    RegistryUnavailable,

    /// The session's output actor has stopped.
    #[error("output channel for '{0}' is closed")]
    OutputClosed(String),
}

/// A login attempt rejected because of who the player claims to be.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// No profile exists for the username.
    #[error("user does not exist")]
    UnknownUser,

    /// The username is already admitted on another connection.
    #[error("user is currently logged in")]
    AlreadyActive,

    /// The account is locked until the given instant.
    #[error("user has login timeout until {0}")]
    LockedOut(DateTime<Utc>),

    /// The password did not match the stored hash.
    #[error("password does not match")]
    BadPassword,
}

/// A login attempt that could not be decided because infrastructure failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SystemError {
    /// The credential store refused, failed, or returned garbage.
    #[error("credential backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The credential store didn't answer in time.
    #[error("credential backend timed out after {0:?}")]
    BackendTimeout(Duration),

    /// The active session registry is gone.
    #[error("session registry unavailable")]
    RegistryUnavailable,
}

impl From<StoreError> for SystemError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout(d) => Self::BackendTimeout(d),
            other => Self::BackendUnavailable(other.to_string()),
        }
    }
}

impl From<SessionError> for SystemError {
    fn from(_: SessionError) -> Self {
        Self::RegistryUnavailable
    }
}

/// Why a single login attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    System(#[from] SystemError),
}

impl LoginError {
    /// Returns the line the client sees for this failure.
    ///
    /// Unknown, locked and already-active users all get the same text.
    pub fn reply(&self) -> ServerReply {
        match self {
            Self::Credential(CredentialError::BadPassword) => {
                ServerReply::InvalidCredentials
            }
            Self::Credential(_) => ServerReply::InvalidLogin,
            Self::System(_) => ServerReply::ServiceUnavailable,
        }
    }

    /// Returns a short, stable name for the failure, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Credential(CredentialError::UnknownUser) => "unknown_user",
            Self::Credential(CredentialError::AlreadyActive) => "already_active",
            Self::Credential(CredentialError::LockedOut(_)) => "locked_out",
            Self::Credential(CredentialError::BadPassword) => "bad_password",
            Self::System(SystemError::BackendUnavailable(_)) => "backend_unavailable",
            Self::System(SystemError::BackendTimeout(_)) => "backend_timeout",
            Self::System(SystemError::RegistryUnavailable) => "registry_unavailable",
        }
    }

    /// Returns `true` if this is an infrastructure fault.
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System(_))
    }
}
