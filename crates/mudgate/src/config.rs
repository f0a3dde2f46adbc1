//! Server configuration.
//!
//! Settings come from a TOML file with three sections. Every key has a
//! default, so an empty file (or a missing section) is valid:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:4201"
//! max_line_len = 1024
//!
//! [logging]
//! level = "info"
//! # log_file = "/var/log/mudgate.log"
//!
//! [login]
//! login_attempts = 5
//! lockout_count = 5
//! database_timeout = 10
//! lockout_duration = 900
//! line_timeout = 120
//! already_active_consumes_attempt = true
//! max_system_errors = 3
//! ```
//!
//! The credential store location is not in the file; it is read from the
//! `MUDGATE_STORE_URI` environment variable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mudgate_session::LockoutPolicy;
use mudgate_transport::DEFAULT_MAX_LINE_LEN;
use serde::{Deserialize, Serialize};

/// Environment variable holding the credential store URI.
pub const STORE_URI_ENV: &str = "MUDGATE_STORE_URI";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`Settings`].
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),

    /// `MUDGATE_STORE_URI` is unset or empty.
    #[error("MUDGATE_STORE_URI is not set")]
    MissingStoreUri,

    /// `MUDGATE_STORE_URI` names a backend this build doesn't have.
    #[error("unsupported credential store URI: {0}")]
    UnsupportedStoreUri(String),

    /// The tracing subscriber could not be installed.
    #[error("cannot initialise logging: {0}")]
    Logging(String),
}

/// All server settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LogSettings,
    pub login: LoginSettings,
}

/// `[server]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the TCP listener binds to.
    pub bind: String,

    /// Longest accepted input line, in bytes.
    pub max_line_len: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:4201".to_string(),
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,

    /// Append log output to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
        }
    }
}

/// `[login]`
///
/// Durations are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginSettings {
    /// Credential failures allowed per connection.
    pub login_attempts: u32,

    /// Cumulative strikes that lock an account. `0` disables lockout.
    pub lockout_count: u32,

    /// Upper bound on a single credential store call.
    pub database_timeout: u64,

    /// How long a lockout lasts. Must be nonzero while lockout is on.
    pub lockout_duration: u64,

    /// How long to wait for the next login line.
    pub line_timeout: u64,

    /// Whether a login for an already-active name uses up an attempt.
    pub already_active_consumes_attempt: bool,

    /// Consecutive backend faults before the dialog is closed.
    pub max_system_errors: u32,
}

impl Default for LoginSettings {
    fn default() -> Self {
        Self {
            login_attempts: 5,
            lockout_count: 5,
            database_timeout: 10,
            lockout_duration: 900,
            line_timeout: 120,
            already_active_consumes_attempt: true,
            max_system_errors: 3,
        }
    }
}

impl LoginSettings {
    pub fn database_timeout(&self) -> Duration {
        Duration::from_secs(self.database_timeout)
    }

    pub fn line_timeout(&self) -> Duration {
        Duration::from_secs(self.line_timeout)
    }

    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            threshold: self.lockout_count,
            duration: Duration::from_secs(self.lockout_duration),
        }
    }
}

impl Settings {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parses and validates settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects values the login controller can't work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.login.login_attempts == 0 {
            return Err(ConfigError::Invalid("login.login_attempts must be at least 1".into()));
        }
        if self.login.max_system_errors == 0 {
            return Err(ConfigError::Invalid(
                "login.max_system_errors must be at least 1".into(),
            ));
        }
        if self.login.database_timeout == 0 {
            return Err(ConfigError::Invalid(
                "login.database_timeout must be at least 1 second".into(),
            ));
        }
        if self.login.line_timeout == 0 {
            return Err(ConfigError::Invalid(
                "login.line_timeout must be at least 1 second".into(),
            ));
        }
        if self.login.lockout_count > 0 && self.login.lockout_duration == 0 {
            return Err(ConfigError::Invalid(
                "login.lockout_duration must be at least 1 second; set lockout_count = 0 to disable lockout".into(),
            ));
        }
        if self.server.max_line_len == 0 {
            return Err(ConfigError::Invalid("server.max_line_len must be at least 1".into()));
        }
        Ok(())
    }

    /// Logs the effective settings once at startup.
    pub fn log(&self) {
        tracing::info!(
            bind = %self.server.bind,
            max_line_len = self.server.max_line_len,
            log_level = %self.logging.level,
            log_file = ?self.logging.log_file,
            "Server settings"
        );
        tracing::info!(
            login_attempts = self.login.login_attempts,
            lockout_count = self.login.lockout_count,
            database_timeout = self.login.database_timeout,
            lockout_duration = self.login.lockout_duration,
            line_timeout = self.login.line_timeout,
            already_active_consumes_attempt = self.login.already_active_consumes_attempt,
            max_system_errors = self.login.max_system_errors,
            "Login settings"
        );
    }
}

/// Reads the credential store URI from [`STORE_URI_ENV`].
pub fn store_uri_from_env() -> Result<String, ConfigError> {
    match std::env::var(STORE_URI_ENV) {
        Ok(uri) if !uri.trim().is_empty() => Ok(uri.trim().to_string()),
        _ => Err(ConfigError::MissingStoreUri),
    }
}
