//! The `connect` command grammar.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::ProtocolError;

/// Compiled once and shared by every connection.
static CONNECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^connect\s+(?P<user>\S+)\s+(?P<password>\S.*)$")
        .expect("connect grammar is a valid regex")
});

/// A parsed `connect` line.
///
/// `Debug` is implemented by hand so the password never ends up in a log
/// line through `{:?}`.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectCommand {
    /// The first run of non-whitespace after the keyword.
    pub username: String,
    /// Everything after the username, inner whitespace preserved.
    pub password: String,
}

impl fmt::Debug for ConnectCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectCommand")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parses one line of client input as `connect <username> <password...>`.
///
/// Surrounding whitespace of the whole line is stripped first. The
/// username is a maximal run of non-whitespace characters; the password
/// is the rest of the line after the separating whitespace and may itself
/// contain spaces.
///
/// # Errors
/// Returns [`ProtocolError::UnrecognizedCommand`] for a missing or wrong
/// keyword, a missing username, or a missing password.
///
/// ```rust
/// use mudgate_protocol::parse_connect;
///
/// let cmd = parse_connect("  connect alice correct horse  ").unwrap();
/// assert_eq!(cmd.username, "alice");
/// assert_eq!(cmd.password, "correct horse");
/// assert!(parse_connect("connect alice").is_err());
/// ```
pub fn parse_connect(line: &str) -> Result<ConnectCommand, ProtocolError> {
    let caps = CONNECT_RE
        .captures(line.trim())
        .ok_or(ProtocolError::UnrecognizedCommand)?;

    Ok(ConnectCommand {
        username: caps["user"].to_string(),
        password: caps["password"].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// (input, username, password, matched)
    const CASES: &[(&str, &str, &str, bool)] = &[
        ("", "", "", false),
        ("connect", "", "", false),
        ("connect     ", "", "", false),
        ("cronect user pass", "", "", false),
        ("connect user pass", "user", "pass", true),
        ("  connect    user   pass    ", "user", "pass", true),
        ("connect Us3r_N4+e _Ab13+!-/~=", "Us3r_N4+e", "_Ab13+!-/~=", true),
        (
            "connect user simple pass phrase",
            "user",
            "simple pass phrase",
            true,
        ),
    ];

    #[test]
    fn test_parse_connect_table() {
        for &(input, user, pass, ok) in CASES {
            match parse_connect(input) {
                Ok(cmd) => {
                    assert!(ok, "{input:?} should not parse");
                    assert_eq!(cmd.username, user, "username for {input:?}");
                    assert_eq!(cmd.password, pass, "password for {input:?}");
                }
                Err(e) => {
                    assert!(!ok, "{input:?} should parse, got {e}");
                    assert_eq!(e, ProtocolError::UnrecognizedCommand);
                }
            }
        }
    }

    #[test]
    fn test_parse_connect_missing_password_rejected() {
        assert!(parse_connect("connect alice   ").is_err());
    }

    #[test]
    fn test_parse_connect_keyword_must_lead_line() {
        assert!(parse_connect("xconnect alice pw").is_err());
        assert!(parse_connect("say connect alice pw").is_err());
    }

    #[test]
    fn test_parse_connect_tab_separators_accepted() {
        let cmd = parse_connect("connect\talice\tpw").unwrap();
        assert_eq!(cmd.username, "alice");
        assert_eq!(cmd.password, "pw");
    }

    #[test]
    fn test_connect_command_debug_redacts_password() {
        let cmd = parse_connect("connect alice hunter2").unwrap();
        let printed = format!("{cmd:?}");
        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter2"));
    }
}
