//! Directory-of-JSON-records credential store.
//!
//! Each profile lives in its own file, named after the hex encoding of the
//! username so any non-whitespace name maps to a safe file name. Every
//! call opens the file it needs and drops the handle before returning.
//! Writes go to a uniquely named temp file that is then renamed over the
//! record, so a reader never sees a half-written profile.
//!
//! The whole write runs as one blocking task. Dropping a `persist` future
//! (the gateway timeout does this) detaches the task instead of cutting it
//! short: the record is either replaced or left as it was, and the temp
//! file is removed either way.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{CredentialStore, StoreError, UserProfile};

/// Stores one JSON record per user under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (creating if needed) the profile directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", dir.display())))?;
        tracing::info!(dir = %dir.display(), "file credential store opened");
        Ok(Self { dir })
    }

    /// Returns the profile directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hex::encode(name)))
    }
}

impl CredentialStore for FileStore {
    async fn lookup(&self, name: &str) -> Result<UserProfile, StoreError> {
        let path = self.record_path(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()));
            }
            Err(e) => {
                return Err(StoreError::Unavailable(format!("{}: {e}", path.display())));
            }
        };

        let profile: UserProfile = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?;
        if profile.name != name {
            return Err(StoreError::Corrupt(format!(
                "{} holds a record for another user",
                path.display()
            )));
        }
        Ok(profile)
    }

    async fn persist(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let path = self.record_path(&profile.name);
        let dir = self.dir.clone();
        let bytes = serde_json::to_vec_pretty(profile)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let target = path.clone();
        let written = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            // Removed on drop unless the rename succeeds.
            let mut tmp = tempfile::Builder::new()
                .prefix(".profile-")
                .suffix(".tmp")
                .tempfile_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;

        written.map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_path_hex_encodes_name() {
        let store = FileStore {
            dir: PathBuf::from("/profiles"),
        };
        assert_eq!(
            store.record_path("a/b"),
            PathBuf::from("/profiles/612f62.json")
        );
    }
}
