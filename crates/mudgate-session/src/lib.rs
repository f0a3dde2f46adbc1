//! Player admission for Mudgate.
//!
//! This crate decides who gets in and keeps track of who is in:
//!
//! 1. **Authentication** — checking one login attempt ([`Authenticator`])
//! 2. **Lockout** — counting failed passwords per dialog and locking
//!    accounts that cross the threshold ([`StrikeTracker`],
//!    [`apply_lockout`], [`clear_strikes`])
//! 3. **Presence** — the process-wide set of logged-in names, owned by a
//!    single actor ([`RegistryHandle`])
//! 4. **Output** — one writer actor per admitted session
//!    ([`SessionOutput`])
//! 5. **Admission** — [`Session`] ties a registry entry and an output
//!    actor together and releases both on logout
//!
//! # How it fits in the stack
//!
//! ```text
//! Connection controller (above)  ← drives the login dialog
//!     ↕
//! Session Layer (this crate)  ← authentication, lockout, registry, output
//!     ↕
//! Store / Protocol / Transport (below)
//! ```

mod auth;
mod error;
mod lockout;
mod output;
mod registry;
mod session;

pub use auth::Authenticator;
pub use error::{CredentialError, LoginError, SessionError, SystemError};
pub use lockout::{
    LockoutOutcome, LockoutPolicy, LockoutReport, StrikeTracker, apply_lockout,
    clear_strikes, is_locked_out,
};
pub use output::{OutputSender, SessionOutput};
pub use registry::{
    RegistryHandle, SessionEntry, spawn_registry, spawn_registry_with_capacity,
};
pub use session::Session;
