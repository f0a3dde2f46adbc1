//! Picking a store implementation from a connection URI.

use crate::{CredentialStore, FileStore, MemoryStore, StoreError, UserProfile};

/// The store implementations a server can be started with.
#[derive(Debug)]
pub enum StoreBackend {
    Memory(MemoryStore),
    File(FileStore),
}

impl StoreBackend {
    /// Opens the store named by `uri`.
    ///
    /// Accepted forms:
    /// - `memory:` — an empty in-process store
    /// - `file:///var/lib/mudgate/profiles` — a profile directory
    /// - `/var/lib/mudgate/profiles` — same, without the scheme
    ///
    /// # Errors
    /// [`StoreError::InvalidUri`] for an empty URI or an unknown scheme,
    /// [`StoreError::Unavailable`] if the directory can't be created.
    pub async fn from_uri(uri: &str) -> Result<Self, StoreError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(StoreError::InvalidUri(String::new()));
        }
        if uri == "memory:" {
            return Ok(Self::Memory(MemoryStore::new()));
        }
        if let Some(path) = uri.strip_prefix("file://") {
            return Ok(Self::File(FileStore::open(path).await?));
        }
        if uri.contains("://") {
            return Err(StoreError::InvalidUri(uri.to_string()));
        }
        Ok(Self::File(FileStore::open(uri).await?))
    }
}

impl CredentialStore for StoreBackend {
    async fn lookup(&self, name: &str) -> Result<UserProfile, StoreError> {
        match self {
            Self::Memory(store) => store.lookup(name).await,
            Self::File(store) => store.lookup(name).await,
        }
    }

    async fn persist(&self, profile: &UserProfile) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.persist(profile).await,
            Self::File(store) => store.persist(profile).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_uri_memory() {
        let backend = StoreBackend::from_uri("memory:").await.unwrap();
        assert!(matches!(backend, StoreBackend::Memory(_)));
    }

    #[tokio::test]
    async fn test_from_uri_unknown_scheme_rejected() {
        let result = StoreBackend::from_uri("mongodb://localhost:27017").await;
        assert!(matches!(result, Err(StoreError::InvalidUri(_))));
    }

    #[tokio::test]
    async fn test_from_uri_empty_rejected() {
        let result = StoreBackend::from_uri("   ").await;
        assert!(matches!(result, Err(StoreError::InvalidUri(_))));
    }
}
