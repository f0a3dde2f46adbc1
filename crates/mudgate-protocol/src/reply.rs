//! Fixed lines the server sends during the login dialog.

use std::fmt;

/// A reply sent to the client before admission.
///
/// Credential failures collapse onto two generic texts so a client can't
/// tell an unknown user from a locked or already-connected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerReply {
    /// Unknown user, locked-out user, or user already logged in.
    InvalidLogin,
    /// Known user, wrong password.
    InvalidCredentials,
    /// The line did not parse as a `connect` command.
    UnrecognizedCommand,
    /// The credential backend could not be reached.
    ServiceUnavailable,
    /// Sent right before the server hangs up.
    Closing,
}

impl ServerReply {
    /// Returns the literal line sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidLogin => "Invalid login attempt",
            Self::InvalidCredentials => "Invalid username or password",
            Self::UnrecognizedCommand => "Unrecognized command format",
            Self::ServiceUnavailable => "Service temporarily unavailable",
            Self::Closing => "Closing connection...",
        }
    }
}

impl fmt::Display for ServerReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
