//! Credential storage for Mudgate.
//!
//! This crate owns the persisted side of login:
//!
//! 1. **Records** — [`UserProfile`]: name, password hash, cumulative
//!    strike count and lockout timeout.
//! 2. **The contract** — [`CredentialStore`]: `lookup` and `persist`.
//! 3. **The gateway** — [`CredentialGateway`]: the only way the rest of
//!    the server touches a store, bounding each call with a timeout.
//! 4. **Backends** — [`MemoryStore`], [`FileStore`], and [`StoreBackend`]
//!    to choose between them from a URI at startup.
//! 5. **Passwords** — [`hash_password`] / [`verify_password`] (Argon2id).
//!
//! # How it fits in the stack
//!
//! ```text
//! Session Layer (above)  ← decides who may log in, counts strikes
//!     ↕
//! Store Layer (this crate)  ← loads and saves profiles
//! ```

mod backend;
mod error;
mod file;
mod memory;
mod password;
mod profile;
mod store;

pub use backend::StoreBackend;
pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use password::{hash_password, verify_password};
pub use profile::{NO_LOCKOUT, UserProfile};
pub use store::{CredentialGateway, CredentialStore, DEFAULT_STORE_TIMEOUT, ProfileLock};
