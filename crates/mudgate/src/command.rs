//! What happens after a player is admitted.
//!
//! The login controller hands each admitted [`Session`] to a
//! [`CommandLoop`] and cleans the session up when `run` returns. The
//! game itself plugs in here.

use std::future::Future;

use mudgate_session::Session;
use mudgate_transport::Connection;

/// Drives an admitted player's connection until logout.
///
/// `run` owns the inbound side of `conn`. Outbound text should go through
/// [`Session::send`] so it is ordered with broadcasts from other tasks.
/// Returning ends the session: the name is removed from the registry and
/// the connection is closed.
pub trait CommandLoop: Send + Sync + 'static {
    fn run<C: Connection>(
        &self,
        session: &Session,
        conn: &C,
    ) -> impl Future<Output = ()> + Send;
}

/// Holds the session open until the client disconnects, ignoring input.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleLoop;

impl CommandLoop for IdleLoop {
    async fn run<C: Connection>(&self, session: &Session, conn: &C) {
        loop {
            match conn.recv_line().await {
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(
                        player = %session.name(),
                        conn_id = %session.conn_id(),
                        error = %e,
                        "recv error"
                    );
                    break;
                }
            }
        }
    }
}
