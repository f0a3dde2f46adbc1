//! Error types for the credential store.

use std::time::Duration;

/// Errors returned by a [`CredentialStore`](crate::CredentialStore) or the
/// [`CredentialGateway`](crate::CredentialGateway) wrapping it.
///
/// Only [`NotFound`](Self::NotFound) says anything about the user. Every
/// other variant is an infrastructure fault and must never be reported to
/// a player as bad credentials.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No profile exists for this username.
    #[error("user '{0}' does not exist")]
    NotFound(String),

    /// The backing store could not be reached or refused the operation.
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    /// The call did not finish within the configured timeout.
    #[error("credential store timed out after {0:?}")]
    Timeout(Duration),

    /// A stored record could not be decoded.
    #[error("corrupt profile record: {0}")]
    Corrupt(String),

    /// The store URI names a scheme we don't know how to open.
    #[error("unsupported credential store uri '{0}'")]
    InvalidUri(String),
}

impl StoreError {
    /// Returns `true` for faults of the store itself rather than the user.
    pub fn is_system(&self) -> bool {
        !matches!(self, Self::NotFound(_))
    }
}
