//! Lockout policy: counting failed passwords and locking accounts.
//!
//! Two kinds of strike counts exist and are kept apart on purpose:
//!
//! - [`StrikeTracker`] — in memory, one per login dialog, discarded when
//!   the dialog ends. Recording a failure never touches the store.
//! - `UserProfile::login_strikes` — persisted, cumulative across
//!   dialogs. Only [`apply_lockout`] and [`clear_strikes`] change it.
//!
//! ```text
//! wrong password ──→ record_failure (tracker only)
//!        ...
//! dialog ends ──→ apply_lockout(tracker)   ← consumes the tracker
//!                    │
//!                    ├─ strikes += tracked count, persist
//!                    └─ strikes ≥ threshold → timeout = now + duration
//!
//! right password ──→ clear_strikes (strikes = 0, timeout = epoch)
//! ```
//!
//! Both writers hold the gateway's per-name lock from lookup to persist,
//! so dialogs for the same name that end together add up their strikes.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mudgate_store::{
    CredentialGateway, CredentialStore, NO_LOCKOUT, StoreError, UserProfile,
};

/// Thresholds for turning strikes into a lockout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Cumulative strikes that trigger a lockout. `0` disables lockout;
    /// strikes are still persisted.
    pub threshold: u32,

    /// How long a triggered lockout lasts.
    pub duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            threshold: 5,
            duration: Duration::from_secs(15 * 60),
        }
    }
}

/// Failed-password counts for one login dialog.
#[derive(Debug, Clone, Default)]
pub struct StrikeTracker {
    strikes: HashMap<String, u32>,
}

impl StrikeTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one failed password for `name` in this dialog.
    pub fn record_failure(&mut self, name: &str) {
        *self.strikes.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Returns this dialog's strikes for `name`.
    pub fn strikes(&self, name: &str) -> u32 {
        self.strikes.get(name).copied().unwrap_or(0)
    }

    /// Drops this dialog's strikes for `name`.
    ///
    /// Used once `name` has logged in and its persisted count was reset.
    pub fn forgive(&mut self, name: &str) {
        self.strikes.remove(name);
    }

    /// Returns `true` if no failure has been recorded.
    pub fn is_empty(&self) -> bool {
        self.strikes.values().all(|&n| n == 0)
    }
}

/// Returns `true` if `profile` is locked at `now`.
pub fn is_locked_out(profile: &UserProfile, now: DateTime<Utc>) -> bool {
    now < profile.timeout
}

/// What [`apply_lockout`] did for one username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutOutcome {
    pub name: String,
    /// Persisted strike count after adding this dialog's strikes.
    pub total_strikes: u32,
    /// Set when this call locked the account.
    pub locked_until: Option<DateTime<Utc>>,
}

/// Per-username results of one [`apply_lockout`] run.
#[derive(Debug, Default)]
pub struct LockoutReport {
    pub applied: Vec<LockoutOutcome>,
    pub failed: Vec<(String, StoreError)>,
}

/// Folds a finished dialog's strikes into the persisted profiles.
///
/// Takes the tracker by value: a dialog's strikes are applied once. Each
/// username is handled on its own: a failed lookup or persist for one is
/// logged and reported, and the rest are still processed.
pub async fn apply_lockout<S: CredentialStore>(
    gateway: &CredentialGateway<S>,
    tracker: StrikeTracker,
    policy: &LockoutPolicy,
    now: DateTime<Utc>,
) -> LockoutReport {
    let mut report = LockoutReport::default();

    let mut pending: Vec<(String, u32)> = tracker
        .strikes
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .collect();
    pending.sort();

    for (name, count) in pending {
        match strike_profile(gateway, &name, count, policy, now).await {
            Ok(outcome) => {
                if let Some(until) = outcome.locked_until {
                    tracing::warn!(
                        player = %name,
                        strikes = outcome.total_strikes,
                        %until,
                        "account locked out"
                    );
                } else {
                    tracing::info!(
                        player = %name,
                        strikes = outcome.total_strikes,
                        "login strikes recorded"
                    );
                }
                report.applied.push(outcome);
            }
            Err(e) => {
                tracing::error!(
                    player = %name,
                    error = %e,
                    "failed to persist login strikes"
                );
                report.failed.push((name, e));
            }
        }
    }

    report
}

async fn strike_profile<S: CredentialStore>(
    gateway: &CredentialGateway<S>,
    name: &str,
    count: u32,
    policy: &LockoutPolicy,
    now: DateTime<Utc>,
) -> Result<LockoutOutcome, StoreError> {
    let _lock = gateway.lock(name).await;
    let mut profile = gateway.lookup(name).await?;
    profile.login_strikes = profile.login_strikes.saturating_add(count);

    let locked_until = if policy.threshold > 0
        && profile.login_strikes >= policy.threshold
    {
        let span = chrono::Duration::from_std(policy.duration)
            .unwrap_or(chrono::Duration::MAX);
        let until = now.checked_add_signed(span).unwrap_or(DateTime::<Utc>::MAX_UTC);
        profile.timeout = until;
        Some(until)
    } else {
        None
    };

    gateway.persist(&profile).await?;

    Ok(LockoutOutcome {
        name: name.to_string(),
        total_strikes: profile.login_strikes,
        locked_until,
    })
}

/// Resets `profile`'s strikes and lockout and persists it.
///
/// Called only after a password has matched.
pub async fn clear_strikes<S: CredentialStore>(
    gateway: &CredentialGateway<S>,
    profile: &mut UserProfile,
) -> Result<(), StoreError> {
    let _lock = gateway.lock(&profile.name).await;
    profile.login_strikes = 0;
    profile.timeout = NO_LOCKOUT;
    gateway.persist(profile).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mudgate_store::MemoryStore;

    use super::*;

    /// Memory store whose lookups take a while, so that two writers
    /// overlap between their lookup and their persist.
    struct SlowLookupStore(MemoryStore);

    impl CredentialStore for SlowLookupStore {
        async fn lookup(&self, name: &str) -> Result<UserProfile, StoreError> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.0.lookup(name).await
        }

        async fn persist(&self, profile: &UserProfile) -> Result<(), StoreError> {
            self.0.persist(profile).await
        }
    }

    fn tracker_with(name: &str, failures: u32) -> StrikeTracker {
        let mut tracker = StrikeTracker::new();
        for _ in 0..failures {
            tracker.record_failure(name);
        }
        tracker
    }

    fn gateway(profiles: Vec<UserProfile>) -> CredentialGateway<MemoryStore> {
        CredentialGateway::new(
            MemoryStore::with_profiles(profiles),
            Duration::from_secs(5),
        )
    }

    fn policy(threshold: u32) -> LockoutPolicy {
        LockoutPolicy {
            threshold,
            duration: Duration::from_secs(600),
        }
    }

    // =====================================================================
    // StrikeTracker / is_locked_out
    // =====================================================================

    #[test]
    fn test_record_failure_counts_per_name() {
        let mut tracker = StrikeTracker::new();
        assert!(tracker.is_empty());

        tracker.record_failure("alice");
        tracker.record_failure("alice");
        tracker.record_failure("bob");

        assert_eq!(tracker.strikes("alice"), 2);
        assert_eq!(tracker.strikes("bob"), 1);
        assert_eq!(tracker.strikes("carol"), 0);
        assert!(!tracker.is_empty());
    }

    #[test]
    fn test_forgive_drops_only_that_name() {
        let mut tracker = StrikeTracker::new();
        tracker.record_failure("alice");
        tracker.record_failure("bob");

        tracker.forgive("alice");

        assert_eq!(tracker.strikes("alice"), 0);
        assert_eq!(tracker.strikes("bob"), 1);
    }

    #[test]
    fn test_is_locked_out_epoch_sentinel_false() {
        let profile = UserProfile::new("alice", "h");
        assert!(!is_locked_out(&profile, Utc::now()));
    }

    #[test]
    fn test_is_locked_out_boundary_is_exclusive() {
        let now = Utc::now();
        let mut profile = UserProfile::new("alice", "h");

        profile.timeout = now;
        assert!(!is_locked_out(&profile, now));

        profile.timeout = now + chrono::Duration::seconds(1);
        assert!(is_locked_out(&profile, now));
    }

    // =====================================================================
    // apply_lockout()
    // =====================================================================

    #[tokio::test]
    async fn test_apply_lockout_below_threshold_persists_strikes_only() {
        let gw = gateway(vec![UserProfile::new("alice", "h")]);
        let mut tracker = StrikeTracker::new();
        tracker.record_failure("alice");
        tracker.record_failure("alice");

        let report = apply_lockout(&gw, tracker, &policy(5), Utc::now()).await;

        assert!(report.failed.is_empty());
        assert_eq!(report.applied[0].total_strikes, 2);
        assert_eq!(report.applied[0].locked_until, None);
        let stored = gw.lookup("alice").await.unwrap();
        assert_eq!(stored.login_strikes, 2);
        assert_eq!(stored.timeout, NO_LOCKOUT);
    }

    #[tokio::test]
    async fn test_apply_lockout_cumulative_strikes_trigger_timeout() {
        let mut existing = UserProfile::new("alice", "h");
        existing.login_strikes = 3;
        let gw = gateway(vec![existing]);
        let mut tracker = StrikeTracker::new();
        tracker.record_failure("alice");
        tracker.record_failure("alice");
        let now = Utc::now();

        let report = apply_lockout(&gw, tracker, &policy(5), now).await;

        let stored = gw.lookup("alice").await.unwrap();
        assert_eq!(stored.login_strikes, 5);
        assert!(stored.timeout > now);
        assert_eq!(report.applied[0].locked_until, Some(stored.timeout));
        assert!(is_locked_out(&stored, now));
    }

    #[tokio::test]
    async fn test_apply_lockout_one_failure_does_not_block_others() {
        // "ghost" is in the tracker but not in the store.
        let gw = gateway(vec![
            UserProfile::new("alice", "h"),
            UserProfile::new("bob", "h"),
        ]);
        let mut tracker = StrikeTracker::new();
        tracker.record_failure("alice");
        tracker.record_failure("ghost");
        tracker.record_failure("bob");

        let report = apply_lockout(&gw, tracker, &policy(5), Utc::now()).await;

        assert_eq!(report.applied.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "ghost");
        assert_eq!(gw.lookup("alice").await.unwrap().login_strikes, 1);
        assert_eq!(gw.lookup("bob").await.unwrap().login_strikes, 1);
    }

    #[tokio::test]
    async fn test_apply_lockout_threshold_zero_never_locks() {
        let mut existing = UserProfile::new("alice", "h");
        existing.login_strikes = 100;
        let gw = gateway(vec![existing]);
        let mut tracker = StrikeTracker::new();
        tracker.record_failure("alice");

        apply_lockout(&gw, tracker, &policy(0), Utc::now()).await;

        let stored = gw.lookup("alice").await.unwrap();
        assert_eq!(stored.login_strikes, 101);
        assert_eq!(stored.timeout, NO_LOCKOUT);
    }

    #[tokio::test]
    async fn test_apply_lockout_concurrent_dialogs_add_up_and_lock() {
        let store = Arc::new(SlowLookupStore(MemoryStore::with_profiles(vec![
            UserProfile::new("alice", "h"),
        ])));
        let first = CredentialGateway::from_arc(Arc::clone(&store), Duration::from_secs(5));
        let second = first.clone();
        let now = Utc::now();
        let policy_a = policy(5);
        let policy_b = policy(5);

        let (a, b) = tokio::join!(
            apply_lockout(&first, tracker_with("alice", 3), &policy_a, now),
            apply_lockout(&second, tracker_with("alice", 3), &policy_b, now),
        );

        assert!(a.failed.is_empty() && b.failed.is_empty());
        let stored = first.lookup("alice").await.unwrap();
        assert_eq!(stored.login_strikes, 6);
        assert!(is_locked_out(&stored, now));
        // Exactly one of the two runs crossed the threshold.
        let locks = [&a, &b]
            .iter()
            .filter(|r| r.applied[0].locked_until.is_some())
            .count();
        assert_eq!(locks, 1);
    }

    // =====================================================================
    // clear_strikes()
    // =====================================================================

    #[tokio::test]
    async fn test_clear_strikes_resets_and_persists() {
        let mut locked = UserProfile::new("alice", "h");
        locked.login_strikes = 7;
        locked.timeout = Utc::now() + chrono::Duration::hours(1);
        let gw = gateway(vec![locked.clone()]);

        clear_strikes(&gw, &mut locked).await.unwrap();

        assert_eq!(locked.login_strikes, 0);
        assert_eq!(locked.timeout, NO_LOCKOUT);
        let stored = gw.lookup("alice").await.unwrap();
        assert_eq!(stored.login_strikes, 0);
        assert_eq!(stored.timeout, NO_LOCKOUT);
    }

    #[tokio::test]
    async fn test_clear_strikes_held_name_lock_waits() {
        let mut profile = UserProfile::new("alice", "h");
        profile.login_strikes = 4;
        let gw = gateway(vec![profile.clone()]);

        let held = gw.lock("alice").await;
        let clearing = {
            let gw = gw.clone();
            tokio::spawn(async move {
                clear_strikes(&gw, &mut profile).await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!clearing.is_finished(), "clear must wait for the name lock");
        assert_eq!(gw.lookup("alice").await.unwrap().login_strikes, 4);

        drop(held);
        clearing.await.unwrap().unwrap();
        assert_eq!(gw.lookup("alice").await.unwrap().login_strikes, 0);
    }
}
