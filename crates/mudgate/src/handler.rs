//! Per-connection handler: the login dialog, then the command loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Read `connect <user> <password>` lines until one is admitted or
//!      the dialog ends (attempts used up, idle, disconnect, backend down)
//!   2. Fold the dialog's password strikes into the stored profiles
//!   3. Admitted: hand the [`Session`] to the [`CommandLoop`]
//!   4. Otherwise: `Closing connection...` and close

use std::sync::Arc;

use chrono::Utc;
use mudgate_protocol::{ServerReply, parse_connect};
use mudgate_session::{
    CredentialError, LoginError, RegistryHandle, Session, StrikeTracker, SystemError,
    apply_lockout,
};
use mudgate_store::{CredentialStore, UserProfile};
use mudgate_transport::{Connection, TransportError};

use crate::command::CommandLoop;
use crate::config::LoginSettings;
use crate::server::ServerState;
use crate::MudgateError;

/// How a login dialog finished.
pub(crate) enum DialogEnd {
    /// A login succeeded and the name is registered.
    Admitted(Session),
    /// The attempt budget ran out.
    Exhausted,
    /// The client went away.
    Disconnected,
    /// No line arrived within the line timeout.
    Idle,
    /// Too many consecutive backend faults.
    SystemFailure,
    /// Reading or writing the socket failed.
    Transport(TransportError),
}

impl DialogEnd {
    fn label(&self) -> &'static str {
        match self {
            Self::Admitted(_) => "admitted",
            Self::Exhausted => "attempts exhausted",
            Self::Disconnected => "disconnected",
            Self::Idle => "idle",
            Self::SystemFailure => "backend unavailable",
            Self::Transport(_) => "transport error",
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C, S, L>(
    conn: C,
    state: Arc<ServerState<S, L>>,
) -> Result<(), MudgateError>
where
    C: Connection,
    S: CredentialStore,
    L: CommandLoop,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let peer = conn.peer().to_string();
    tracing::debug!(%conn_id, %peer, "handling new connection");

    let end = login_dialog(&conn, &state).await;
    tracing::debug!(%conn_id, %peer, end = end.label(), "login dialog finished");

    let result = match end {
        DialogEnd::Admitted(session) => {
            tracing::info!(%conn_id, %peer, player = %session.name(), "player logged in");
            state.command_loop.run(&session, &*conn).await;
            tracing::info!(%conn_id, %peer, player = %session.name(), "player logged out");
            session.close().await;
            Ok(())
        }
        DialogEnd::Disconnected => Ok(()),
        DialogEnd::Exhausted | DialogEnd::Idle | DialogEnd::SystemFailure => {
            // Best effort; the socket is closed either way.
            let _ = send_reply(&*conn, ServerReply::Closing).await;
            Ok(())
        }
        DialogEnd::Transport(e) => {
            if !e.is_disconnect() {
                let _ = send_reply(&*conn, ServerReply::Closing).await;
            }
            Err(e.into())
        }
    };

    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }
    result
}

/// Runs the login dialog until it is admitted or ends.
async fn login_dialog<C, S, L>(conn: &Arc<C>, state: &ServerState<S, L>) -> DialogEnd
where
    C: Connection,
    S: CredentialStore,
    L: CommandLoop,
{
    let login = &state.settings.login;
    let conn_id = conn.id();
    let peer = conn.peer();
    let mut tracker = StrikeTracker::new();
    let mut attempts_left = login.login_attempts;
    let mut system_errors = 0u32;

    let end = loop {
        if attempts_left == 0 {
            tracing::warn!(%conn_id, %peer, "login attempts exhausted");
            break DialogEnd::Exhausted;
        }

        let line = match tokio::time::timeout(login.line_timeout(), conn.recv_line()).await {
            Ok(Ok(Some(line))) => line,
            Ok(Ok(None)) => break DialogEnd::Disconnected,
            Ok(Err(e)) if e.is_disconnect() => break DialogEnd::Disconnected,
            Ok(Err(e)) => break DialogEnd::Transport(e),
            Err(_) => {
                tracing::info!(%conn_id, %peer, "login timed out");
                break DialogEnd::Idle;
            }
        };

        let command = match parse_connect(&line) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(%conn_id, %peer, error = %e, "bad login line");
                if let Err(e) = send_reply(&**conn, ServerReply::UnrecognizedCommand).await {
                    break DialogEnd::Transport(e);
                }
                continue;
            }
        };

        let outcome = match state
            .auth
            .authenticate(&command.username, &command.password, &mut tracker, Utc::now())
            .await
        {
            Ok(profile) => admit(conn, state.auth.registry(), profile).await,
            Err(e) => Err(e),
        };

        let err = match outcome {
            Ok(session) => break DialogEnd::Admitted(session),
            Err(e) => e,
        };

        if err.is_system() {
            system_errors += 1;
            tracing::error!(
                %conn_id,
                %peer,
                player = %command.username,
                kind = err.kind(),
                error = %err,
                "login check failed"
            );
            let sent = send_reply(&**conn, err.reply()).await;
            if system_errors >= login.max_system_errors {
                break DialogEnd::SystemFailure;
            }
            if let Err(e) = sent {
                break DialogEnd::Transport(e);
            }
            continue;
        }

        system_errors = 0;
        if consumes_attempt(&err, login) {
            attempts_left -= 1;
        }
        tracing::warn!(
            %conn_id,
            %peer,
            player = %command.username,
            kind = err.kind(),
            attempts_left,
            "failed login attempt"
        );
        if let Err(e) = send_reply(&**conn, err.reply()).await {
            break DialogEnd::Transport(e);
        }
    };

    if !tracker.is_empty() {
        let policy = login.lockout_policy();
        apply_lockout(state.auth.gateway(), tracker, &policy, Utc::now()).await;
    }

    end
}

/// Registers an authenticated profile, losing gracefully to a concurrent
/// login for the same name.
async fn admit<C: Connection>(
    conn: &Arc<C>,
    registry: &RegistryHandle,
    profile: UserProfile,
) -> Result<Session, LoginError> {
    match Session::admit(&profile.name, conn, registry).await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(CredentialError::AlreadyActive.into()),
        Err(e) => Err(SystemError::from(e).into()),
    }
}

fn consumes_attempt(err: &LoginError, login: &LoginSettings) -> bool {
    match err {
        LoginError::Credential(CredentialError::AlreadyActive) => {
            login.already_active_consumes_attempt
        }
        LoginError::Credential(_) => true,
        LoginError::System(_) => false,
    }
}

async fn send_reply<C: Connection>(conn: &C, reply: ServerReply) -> Result<(), TransportError> {
    conn.send_line(reply.as_str()).await
}
