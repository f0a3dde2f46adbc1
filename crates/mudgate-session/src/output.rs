//! Session output actor: the only writer to an admitted player's socket.
//!
//! Anything that wants to talk to a player (the command loop, a broadcast
//! from another session) pushes text into an unbounded queue. One task
//! drains the queue onto the connection, so lines are never interleaved
//! and a slow client only ever stalls its own actor.

use std::sync::Arc;
use std::time::Duration;

use mudgate_transport::{Connection, TransportError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::SessionError;

/// Cheap, cloneable handle for queueing text to one session.
#[derive(Debug, Clone)]
pub struct OutputSender {
    name: Arc<str>,
    tx: mpsc::UnboundedSender<String>,
}

impl OutputSender {
    /// Queues a line for delivery. Never waits on the socket.
    ///
    /// # Errors
    /// [`SessionError::OutputClosed`] if the actor has stopped.
    pub fn send(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.tx
            .send(text.into())
            .map_err(|_| SessionError::OutputClosed(self.name.to_string()))
    }

    /// Returns the name of the session this sender writes to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A running output actor, owned by the session that spawned it.
///
/// Dropping it without calling [`stop`](Self::stop) also ends the actor,
/// because the termination signal fires when its sender is dropped.
pub struct SessionOutput {
    sender: OutputSender,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SessionOutput {
    /// Spawns the output actor for `name` writing onto `conn`.
    pub fn spawn<C: Connection>(name: &str, conn: Arc<C>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        let name: Arc<str> = Arc::from(name);

        let task = tokio::spawn(run(Arc::clone(&name), conn, rx, stop_rx));

        Self {
            sender: OutputSender { name, tx },
            stop: Some(stop_tx),
            task: Some(task),
        }
    }

    /// Returns a sender for queueing text to this session.
    pub fn sender(&self) -> OutputSender {
        self.sender.clone()
    }

    /// Signals the actor to stop and waits for it to exit.
    ///
    /// A line already being written is finished first; anything still
    /// queued behind it is discarded.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// How long a stop waits for the line being written to finish. Only a
/// client that has stopped reading hits this, and its connection is about
/// to be closed anyway.
const STOP_WRITE_GRACE: Duration = Duration::from_secs(5);

async fn run<C: Connection>(
    name: Arc<str>,
    conn: Arc<C>,
    mut rx: mpsc::UnboundedReceiver<String>,
    mut stop: oneshot::Receiver<()>,
) {
    let conn_id = conn.id();
    tracing::debug!(player = %name, %conn_id, "output actor started");

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                let write = conn.send_line(&msg);
                tokio::pin!(write);
                tokio::select! {
                    biased;
                    result = &mut write => report_write(&name, &*conn, &msg, result),
                    _ = &mut stop => {
                        // A line that has started goes out whole.
                        match tokio::time::timeout(STOP_WRITE_GRACE, &mut write).await {
                            Ok(result) => report_write(&name, &*conn, &msg, result),
                            Err(_) => tracing::debug!(
                                player = %name,
                                %conn_id,
                                "abandoned stalled write on stop"
                            ),
                        }
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!(player = %name, %conn_id, "output actor stopped");
}

fn report_write<C: Connection>(
    name: &str,
    conn: &C,
    msg: &str,
    result: Result<(), TransportError>,
) {
    if let Err(e) = result {
        tracing::warn!(
            player = %name,
            conn_id = %conn.id(),
            peer = conn.peer(),
            error = %e,
            msg = %msg,
            "could not write message out to connection"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use mudgate_transport::ConnectionId;

    use super::*;

    /// Records every written line; optionally fails every write.
    struct RecordingConn {
        lines: StdMutex<Vec<String>>,
        fail: bool,
        delay: Duration,
    }

    impl RecordingConn {
        fn new(fail: bool, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                lines: StdMutex::new(Vec::new()),
                fail,
                delay,
            })
        }

        fn written(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl Connection for RecordingConn {
        async fn send_line(&self, line: &str) -> Result<(), TransportError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(TransportError::SendFailed(std::io::Error::from(
                    std::io::ErrorKind::BrokenPipe,
                )));
            }
            self.lines.lock().unwrap().push(line.to_string());
            Ok(())
        }

        async fn recv_line(&self) -> Result<Option<String>, TransportError> {
            Ok(None)
        }

        async fn close(&self) -> Result<(), TransportError> {
            Ok(())
        }

        fn id(&self) -> ConnectionId {
            ConnectionId::new(1)
        }

        fn peer(&self) -> &str {
            "test"
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_send_delivers_in_order() {
        let conn = RecordingConn::new(false, Duration::ZERO);
        let output = SessionOutput::spawn("alice", Arc::clone(&conn));
        let tx = output.sender();

        tx.send("one").unwrap();
        tx.send("two").unwrap();
        tx.send("three").unwrap();
        settle().await;

        assert_eq!(conn.written(), vec!["one", "two", "three"]);
        output.stop().await;
    }

    #[tokio::test]
    async fn test_write_failure_keeps_actor_running() {
        let conn = RecordingConn::new(true, Duration::ZERO);
        let output = SessionOutput::spawn("alice", Arc::clone(&conn));
        let tx = output.sender();

        tx.send("lost").unwrap();
        settle().await;

        // Still accepting after a failed write.
        assert!(!tx.is_closed());
        assert!(tx.send("also lost").is_ok());
        output.stop().await;
    }

    #[tokio::test]
    async fn test_stop_closes_sender() {
        let conn = RecordingConn::new(false, Duration::ZERO);
        let output = SessionOutput::spawn("alice", Arc::clone(&conn));
        let tx = output.sender();

        output.stop().await;

        assert!(tx.is_closed());
        assert!(matches!(
            tx.send("late"),
            Err(SessionError::OutputClosed(name)) if name == "alice"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_mid_write_finishes_line_and_discards_queue() {
        // Each write takes a second: at 1.5s "line 1" is half written and
        // the rest of the queue is still pending.
        let conn = RecordingConn::new(false, Duration::from_secs(1));
        let output = SessionOutput::spawn("alice", Arc::clone(&conn));
        let tx = output.sender();
        for i in 0..10 {
            tx.send(format!("line {i}")).unwrap();
        }

        tokio::time::sleep(Duration::from_millis(1500)).await;
        output.stop().await;

        assert_eq!(conn.written(), vec!["line 0", "line 1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_stalled_write_gives_up_after_grace() {
        let conn = RecordingConn::new(false, Duration::from_secs(3600));
        let output = SessionOutput::spawn("alice", Arc::clone(&conn));
        output.sender().send("never read").unwrap();
        settle().await;

        let started = tokio::time::Instant::now();
        output.stop().await;

        let waited = started.elapsed();
        assert!(waited >= STOP_WRITE_GRACE && waited < Duration::from_secs(3600));
        assert!(conn.written().is_empty());
    }

    #[tokio::test]
    async fn test_drop_without_stop_ends_actor() {
        let conn = RecordingConn::new(false, Duration::ZERO);
        let output = SessionOutput::spawn("alice", Arc::clone(&conn));
        let tx = output.sender();

        drop(output);
        settle().await;

        assert!(tx.is_closed());
    }
}
