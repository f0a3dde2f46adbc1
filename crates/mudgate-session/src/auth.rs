//! Deciding a single login attempt.
//!
//! [`Authenticator::authenticate`] runs the checks for one
//! `connect <user> <password>` line, in this order:
//!
//! 1. Is the name already admitted? → `AlreadyActive`
//! 2. Does a profile exist? → `UnknownUser` (or a system error)
//! 3. Is the account locked? → `LockedOut`
//! 4. Does the password match? → `BadPassword` (strike recorded) or success
//!
//! It doesn't talk to the client and doesn't count attempts; the
//! connection controller does both. Admission into the registry also
//! happens there, once the output actor exists.

use chrono::{DateTime, Utc};
use mudgate_store::{
    CredentialGateway, CredentialStore, StoreError, UserProfile, verify_password,
};

use crate::lockout::{clear_strikes, is_locked_out};
use crate::{CredentialError, LoginError, RegistryHandle, StrikeTracker, SystemError};

/// Checks credentials against the store and the active session registry.
///
/// Cheap to clone; every connection task gets its own copy.
pub struct Authenticator<S> {
    gateway: CredentialGateway<S>,
    registry: RegistryHandle,
}

impl<S> Clone for Authenticator<S> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<S: CredentialStore> Authenticator<S> {
    pub fn new(gateway: CredentialGateway<S>, registry: RegistryHandle) -> Self {
        Self { gateway, registry }
    }

    /// Returns the credential gateway.
    pub fn gateway(&self) -> &CredentialGateway<S> {
        &self.gateway
    }

    /// Returns the registry handle.
    pub fn registry(&self) -> &RegistryHandle {
        &self.registry
    }

    /// Decides one login attempt.
    ///
    /// On a password mismatch the failure is recorded in `tracker`. On a
    /// match the name is dropped from `tracker` and the profile's
    /// persisted strikes are cleared before the
    /// profile is returned; if that write fails the login still succeeds
    /// and the fault is logged.
    ///
    /// # Errors
    /// - [`LoginError::Credential`] — the player should be told no
    /// - [`LoginError::System`] — the store or registry failed; this says
    ///   nothing about the player's credentials
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        tracker: &mut StrikeTracker,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, LoginError> {
        if self.registry.query(username).await.map_err(SystemError::from)? {
            return Err(CredentialError::AlreadyActive.into());
        }

        let mut profile = match self.gateway.lookup(username).await {
            Ok(profile) => profile,
            Err(StoreError::NotFound(_)) => {
                return Err(CredentialError::UnknownUser.into());
            }
            Err(e) => return Err(SystemError::from(e).into()),
        };

        if is_locked_out(&profile, now) {
            return Err(CredentialError::LockedOut(profile.timeout).into());
        }

        if !check_password(&profile, password).await? {
            tracker.record_failure(&profile.name);
            return Err(CredentialError::BadPassword.into());
        }

        tracker.forgive(&profile.name);
        if let Err(e) = clear_strikes(&self.gateway, &mut profile).await {
            tracing::error!(
                player = %profile.name,
                error = %e,
                "failed to clear login strikes"
            );
        }

        Ok(profile)
    }
}

/// Runs the Argon2 comparison on the blocking pool.
async fn check_password(
    profile: &UserProfile,
    password: &str,
) -> Result<bool, SystemError> {
    let hash = profile.password_hash.clone();
    let password = password.to_string();

    tokio::task::spawn_blocking(move || verify_password(&hash, &password))
        .await
        .map_err(|e| SystemError::BackendUnavailable(format!("password check aborted: {e}")))?
        .map_err(SystemError::from)
}
