//! In-process credential store.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{CredentialStore, StoreError, UserProfile};

/// Keeps profiles in a map. Nothing survives a restart.
///
/// Useful for development servers and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `profiles`.
    pub fn with_profiles(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        Self {
            profiles: RwLock::new(profiles),
        }
    }

    /// Returns the number of stored profiles.
    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    /// Returns `true` if no profiles are stored.
    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

impl CredentialStore for MemoryStore {
    async fn lookup(&self, name: &str) -> Result<UserProfile, StoreError> {
        self.profiles
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn persist(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.profiles
            .write()
            .await
            .insert(profile.name.clone(), profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_is_case_sensitive() {
        let store = MemoryStore::with_profiles([UserProfile::new("Alice", "h")]);
        assert!(store.lookup("Alice").await.is_ok());
        assert!(matches!(
            store.lookup("alice").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_persist_overwrites_existing() {
        let store = MemoryStore::with_profiles([UserProfile::new("alice", "h")]);
        let mut updated = store.lookup("alice").await.unwrap();
        updated.login_strikes = 3;
        store.persist(&updated).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.lookup("alice").await.unwrap().login_strikes, 3);
    }
}
