//! Tracing subscriber setup for the `mudgated` binary.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, LogSettings};

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `settings.level`. With `log_file` set, output is
/// appended there without ANSI colours; otherwise it goes to stderr.
pub fn init_tracing(settings: &LogSettings) -> Result<(), ConfigError> {
    let filter = env_filter(&settings.level)?;

    let installed = match &settings.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    installed.map_err(|e| ConfigError::Logging(e.to_string()))
}

fn env_filter(level: &str) -> Result<EnvFilter, ConfigError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| ConfigError::Invalid(format!("logging.level {level:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_bad_level_is_invalid() {
        // Only meaningful when RUST_LOG doesn't override the level.
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let err = env_filter("mudgate=loud").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
