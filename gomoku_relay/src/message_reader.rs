// Background chat drain for the local player's turn.
//
// While the local player is thinking, nothing else reads the connection, yet
// the peer may still send chat. `MessageReader` takes over the inbox for that
// window: it reports each MESSAGE as `ReaderEvent::Chat` and an EXIT as
// `ReaderEvent::PeerExit`. Anything else it drains (which the peer should
// not send while it is not its turn) is kept and handed back to the
// connection with `requeue` when the reader stops.
//
// Stopping: before the local move is sent, `stop` sends STOP_MESSAGES. The
// server echoes it back to the sender, so once the echo comes through the
// inbox the reader knows it has seen everything sent before it and exits.
// Only then is the MOVE written, which keeps the primary read and this
// reader from ever consuming the inbox at the same time.
//
// `cancel` is the forced-end variant: no STOP_MESSAGES, just exit at the
// next poll.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use gomoku_protocol::Command;
use tracing::{debug, warn};

use crate::client::Connection;
use crate::error::TransportError;

/// Inbox poll interval; bounds how long `cancel` takes.
const POLL: Duration = Duration::from_millis(20);

/// How long `stop` waits for the STOP_MESSAGES echo before giving up.
pub const STOP_GRACE: Duration = Duration::from_secs(2);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReaderEvent {
    Chat(String),
    PeerExit,
    /// The connection failed while draining.
    Closed,
}

pub struct MessageReader {
    conn: Arc<Connection>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<Vec<Command>>>,
}

impl MessageReader {
    pub fn start<F>(conn: Arc<Connection>, on_event: F) -> Self
    where
        F: FnMut(ReaderEvent) + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let thread = {
            let conn = conn.clone();
            let running = running.clone();
            thread::spawn(move || drain_loop(&conn, &running, on_event))
        };
        Self {
            conn,
            running,
            thread: Some(thread),
        }
    }

    /// Tell the peer side no more reads are pending, wait for the echo and
    /// return drained non-chat commands to the connection.
    pub fn stop(mut self) -> Result<(), TransportError> {
        let sent = self.conn.send(&Command::StopMessages);
        if sent.is_ok() {
            let deadline = Instant::now() + STOP_GRACE;
            while !self.is_done() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(2));
            }
            if !self.is_done() {
                warn!("no STOP_MESSAGES echo within {STOP_GRACE:?}");
            }
        }
        self.finish();
        sent
    }

    /// Abandon the reader without telling the peer.
    pub fn cancel(mut self) {
        self.finish();
    }

    fn is_done(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    fn finish(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            match handle.join() {
                Ok(leftovers) => self.conn.requeue(leftovers),
                Err(_) => warn!("message reader thread panicked"),
            }
        }
    }
}

impl Drop for MessageReader {
    fn drop(&mut self) {
        self.finish();
    }
}

fn drain_loop<F>(conn: &Connection, running: &AtomicBool, mut on_event: F) -> Vec<Command>
where
    F: FnMut(ReaderEvent),
{
    let mut leftovers = Vec::new();
    while running.load(Ordering::SeqCst) {
        match conn.receive_timeout(POLL) {
            Ok(None) => {}
            Ok(Some(Command::Message(text))) => on_event(ReaderEvent::Chat(text)),
            Ok(Some(Command::StopMessages)) => break,
            Ok(Some(Command::Exit)) => {
                on_event(ReaderEvent::PeerExit);
                break;
            }
            Ok(Some(other)) => {
                debug!(tag = %other.tag(), "holding command for the primary reader");
                leftovers.push(other);
            }
            Err(_) => {
                on_event(ReaderEvent::Closed);
                break;
            }
        }
    }
    leftovers
}
