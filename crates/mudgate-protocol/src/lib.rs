//! Wire protocol for Mudgate.
//!
//! Before a player is admitted, only one client command exists:
//!
//! ```text
//! connect <username> <password...>
//! ```
//!
//! and the server answers with one of a handful of fixed lines. This
//! crate owns both halves:
//!
//! - **Parsing** ([`parse_connect`], [`ConnectCommand`]) — turning a raw
//!   line into a username/password pair.
//! - **Replies** ([`ServerReply`]) — the literal text sent back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while parsing.
//!
//! # Architecture
//!
//! ```text
//! Transport (lines) → Protocol (ConnectCommand) → Session (admission)
//! ```

mod connect;
mod error;
mod reply;

pub use connect::{ConnectCommand, parse_connect};
pub use error::ProtocolError;
pub use reply::ServerReply;
