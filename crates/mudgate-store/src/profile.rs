//! The persisted per-user record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The "not locked out" value of [`UserProfile::timeout`].
///
/// The field is always present; an account that has never been locked (or
/// has been cleared) carries the Unix epoch.
pub const NO_LOCKOUT: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// A player's stored credentials and lockout bookkeeping.
///
/// Created when an account is provisioned. During login only the strike
/// counter and the timeout change, and only through the lockout engine.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique, case-sensitive key.
    pub name: String,

    /// Argon2 PHC string (algorithm, parameters, salt and hash).
    pub password_hash: String,

    /// Failed password attempts accumulated across dialogs.
    pub login_strikes: u32,

    /// Login is refused while `now < timeout`.
    pub timeout: DateTime<Utc>,
}

impl UserProfile {
    /// Creates a fresh profile with no strikes and no lockout.
    pub fn new(name: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password_hash: password_hash.into(),
            login_strikes: 0,
            timeout: NO_LOCKOUT,
        }
    }
}

// The hash stays out of logs even through `{:?}`.
impl fmt::Debug for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserProfile")
            .field("name", &self.name)
            .field("password_hash", &"<redacted>")
            .field("login_strikes", &self.login_strikes)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_has_no_strikes_and_epoch_timeout() {
        let profile = UserProfile::new("alice", "$argon2id$stub");
        assert_eq!(profile.login_strikes, 0);
        assert_eq!(profile.timeout, NO_LOCKOUT);
        assert_eq!(profile.timeout.timestamp(), 0);
    }

    #[test]
    fn test_debug_redacts_hash() {
        let profile = UserProfile::new("alice", "$argon2id$secret-bits");
        let printed = format!("{profile:?}");
        assert!(printed.contains("alice"));
        assert!(!printed.contains("secret-bits"));
    }

    #[test]
    fn test_serialized_field_names_match_record_layout() {
        let profile = UserProfile::new("alice", "h");
        let json = serde_json::to_value(&profile).unwrap();
        for key in ["name", "password_hash", "login_strikes", "timeout"] {
            assert!(json.get(key).is_some(), "missing field {key}");
        }
    }
}
