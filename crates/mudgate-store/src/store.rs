//! The credential store contract and the timeout-bounded gateway.
//!
//! [`CredentialStore`] is the seam between login logic and persistence:
//! an in-memory map in tests, a directory of JSON records in a small
//! deployment, something else tomorrow. Callers never use a store
//! directly; they go through [`CredentialGateway`], which bounds every
//! call with the configured database timeout.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::OwnedMutexGuard;

use crate::{StoreError, UserProfile};

/// Persistent lookup and update of user profiles.
///
/// # Trait bounds
///
/// - `Send + Sync` → one store is shared by every connection task.
/// - `'static` → it lives as long as the server.
///
/// Implementations should acquire whatever connection or handle they
/// need inside each call and release it before returning. When the
/// gateway's timeout fires the call's future is dropped, so that release
/// must also happen on drop.
pub trait CredentialStore: Send + Sync + 'static {
    /// Loads the profile stored under `name`.
    ///
    /// # Returns
    /// - `Ok(profile)` — the record exists
    /// - `Err(StoreError::NotFound)` — no such user
    /// - any other `Err` — the store itself failed
    fn lookup(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<UserProfile, StoreError>> + Send;

    /// Writes `profile` back, keyed by `profile.name`.
    fn persist(
        &self,
        profile: &UserProfile,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Wraps a [`CredentialStore`] and bounds every call with a timeout.
///
/// Exceeding the timeout yields [`StoreError::Timeout`], which is a
/// system fault and distinct from [`StoreError::NotFound`].
///
/// Read-modify-write sequences on one profile must hold the name's lock
/// from [`CredentialGateway::lock`]; otherwise two dialogs finishing at
/// once can overwrite each other's strikes.
///
/// Cheap to clone; clones share the same store and the same locks.
pub struct CredentialGateway<S> {
    store: Arc<S>,
    timeout: Duration,
    locks: Arc<NameLocks>,
}

impl<S> Clone for CredentialGateway<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            timeout: self.timeout,
            locks: Arc::clone(&self.locks),
        }
    }
}

type NameLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Exclusive hold on one username's profile. Released on drop.
pub struct ProfileLock {
    name: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<NameLocks>,
}

impl Drop for ProfileLock {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map itself still refers to the entry: nobody holds or
        // waits for it.
        if locks.get(&self.name).is_some_and(|m| Arc::strong_count(m) == 1) {
            locks.remove(&self.name);
        }
    }
}

impl<S: CredentialStore> CredentialGateway<S> {
    /// Creates a gateway over `store` with the given per-call timeout.
    pub fn new(store: S, timeout: Duration) -> Self {
        Self::from_arc(Arc::new(store), timeout)
    }

    /// Creates a gateway over a store that is also held elsewhere.
    pub fn from_arc(store: Arc<S>, timeout: Duration) -> Self {
        Self {
            store,
            timeout,
            locks: Arc::default(),
        }
    }

    /// Waits for exclusive access to `name`'s profile among every clone
    /// of this gateway.
    pub async fn lock(&self, name: &str) -> ProfileLock {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(name.to_string()).or_default())
        };
        let guard = mutex.lock_owned().await;
        ProfileLock {
            name: name.to_string(),
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Returns the per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Loads `name`'s profile, giving up after the timeout.
    pub async fn lookup(&self, name: &str) -> Result<UserProfile, StoreError> {
        match tokio::time::timeout(self.timeout, self.store.lookup(name)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(player = %name, timeout = ?self.timeout, "profile lookup timed out");
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }

    /// Persists `profile`, giving up after the timeout.
    pub async fn persist(&self, profile: &UserProfile) -> Result<(), StoreError> {
        match tokio::time::timeout(self.timeout, self.store.persist(profile)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(player = %profile.name, timeout = ?self.timeout, "profile update timed out");
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    /// A store whose every call takes longer than any sane test timeout.
    struct StalledStore;

    impl CredentialStore for StalledStore {
        async fn lookup(&self, _name: &str) -> Result<UserProfile, StoreError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(StoreError::Unavailable("unreachable".into()))
        }

        async fn persist(&self, _profile: &UserProfile) -> Result<(), StoreError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_lookup_stalled_store_times_out() {
        let gw = CredentialGateway::new(StalledStore, Duration::from_millis(20));
        let result = gw.lookup("alice").await;
        assert!(matches!(result, Err(StoreError::Timeout(d)) if d == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_persist_stalled_store_times_out() {
        let gw = CredentialGateway::new(StalledStore, Duration::from_millis(20));
        let result = gw.persist(&UserProfile::new("alice", "h")).await;
        assert!(matches!(result, Err(StoreError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_lookup_passes_through_not_found() {
        let gw = CredentialGateway::new(MemoryStore::new(), DEFAULT_STORE_TIMEOUT);
        let result = gw.lookup("nobody").await;
        assert!(matches!(result, Err(StoreError::NotFound(n)) if n == "nobody"));
    }

    #[tokio::test]
    async fn test_lock_same_name_is_exclusive_across_clones() {
        let gw = CredentialGateway::new(MemoryStore::new(), DEFAULT_STORE_TIMEOUT);
        let other = gw.clone();

        let held = gw.lock("alice").await;
        let blocked =
            tokio::time::timeout(Duration::from_millis(20), other.lock("alice")).await;
        assert!(blocked.is_err(), "second holder must wait");

        // Other names are independent.
        let _bob = other.lock("bob").await;

        drop(held);
        let _again = other.lock("alice").await;
    }

    #[tokio::test]
    async fn test_lock_entries_removed_when_released() {
        let gw = CredentialGateway::new(MemoryStore::new(), DEFAULT_STORE_TIMEOUT);

        drop(gw.lock("alice").await);

        assert!(gw.locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clone_shares_store() {
        let gw = CredentialGateway::new(MemoryStore::new(), DEFAULT_STORE_TIMEOUT);
        let other = gw.clone();
        gw.persist(&UserProfile::new("alice", "h")).await.unwrap();
        assert_eq!(other.lookup("alice").await.unwrap().name, "alice");
    }
}
