// Heartbeat-based liveness monitor for a client connection.
//
// While a networked game runs, a monitor thread sends `Command::Heartbeat`
// with an increasing sequence number every `interval`. The server answers
// each one with `HeartbeatAck`; the connection's reader thread records the
// acknowledgement in the shared `LivenessState`. If nothing has been
// acknowledged for `interval * timeout_factor`, the monitor reports
// `LivenessFailure::TimedOut` through its callback and exits.
//
// The monitor never touches session state. The callback is expected to fire
// the session's forced-end interrupt, the same path a voluntary exit takes.
//
// A slow but alive peer that misses the window is reported exactly like a
// dead one; there is no second chance.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use gomoku_protocol::Command;
use tracing::{debug, warn};

use crate::client::Connection;

/// Upper bound on one sleep of the monitor loop, so `stop_pinging` returns
/// promptly even with long intervals.
const SLICE: Duration = Duration::from_millis(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LivenessConfig {
    pub interval: Duration,
    /// Timeout in multiples of `interval`.
    pub timeout_factor: u32,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout_factor: 3,
        }
    }
}

impl LivenessConfig {
    pub fn timeout(&self) -> Duration {
        self.interval * self.timeout_factor
    }
}

/// Per-connection record of when the peer last acknowledged a heartbeat.
/// Written by the connection's reader thread, read by the monitor.
#[derive(Debug)]
pub struct LivenessState {
    last_seen: Mutex<Instant>,
    last_ack: AtomicU64,
}

impl Default for LivenessState {
    fn default() -> Self {
        Self::new()
    }
}

impl LivenessState {
    pub fn new() -> Self {
        Self {
            last_seen: Mutex::new(Instant::now()),
            last_ack: AtomicU64::new(0),
        }
    }

    /// Record an acknowledgement for heartbeat `seq`.
    pub fn acknowledge(&self, seq: u64) {
        self.last_ack.fetch_max(seq, Ordering::SeqCst);
        self.touch();
    }

    /// Reset the last-seen timestamp to now.
    pub fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    pub fn since_last_seen(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    /// Highest acknowledged heartbeat sequence number (0 before the first).
    pub fn last_ack(&self) -> u64 {
        self.last_ack.load(Ordering::SeqCst)
    }
}

/// Why the monitor gave up on the connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LivenessFailure {
    TimedOut,
    SendFailed(String),
}

/// Running heartbeat task for one connection.
pub struct LivenessMonitor {
    pinging: Arc<AtomicBool>,
    timed_out: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl LivenessMonitor {
    /// Start pinging `conn`. `on_failure` runs at most once, on the monitor
    /// thread, and never after `stop_pinging` has returned.
    pub fn start<F>(conn: Arc<Connection>, config: LivenessConfig, on_failure: F) -> Self
    where
        F: FnOnce(LivenessFailure) + Send + 'static,
    {
        let pinging = Arc::new(AtomicBool::new(true));
        let timed_out = Arc::new(AtomicBool::new(false));
        let thread = {
            let pinging = pinging.clone();
            let timed_out = timed_out.clone();
            thread::spawn(move || monitor_loop(&conn, config, &pinging, &timed_out, on_failure))
        };
        Self {
            pinging,
            timed_out,
            thread: Some(thread),
        }
    }

    pub fn is_timed_out(&self) -> bool {
        self.timed_out.load(Ordering::SeqCst)
    }

    /// Stop sending heartbeats and wait for the monitor thread to exit.
    pub fn stop_pinging(&mut self) {
        self.pinging.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LivenessMonitor {
    fn drop(&mut self) {
        self.stop_pinging();
    }
}

fn monitor_loop<F>(
    conn: &Connection,
    config: LivenessConfig,
    pinging: &AtomicBool,
    timed_out: &AtomicBool,
    on_failure: F,
) where
    F: FnOnce(LivenessFailure),
{
    let state = conn.liveness();
    let timeout = config.timeout();
    state.touch();

    let mut seq = 0u64;
    let mut next_ping = Instant::now();
    while pinging.load(Ordering::SeqCst) {
        if state.since_last_seen() >= timeout {
            timed_out.store(true, Ordering::SeqCst);
            warn!(
                peer = %conn.peer_addr(),
                last_ack = state.last_ack(),
                "no heartbeat acknowledgement within {timeout:?}"
            );
            on_failure(LivenessFailure::TimedOut);
            return;
        }

        if Instant::now() >= next_ping {
            seq += 1;
            if let Err(e) = conn.send(&Command::Heartbeat(seq)) {
                if pinging.load(Ordering::SeqCst) {
                    debug!(error = %e, "heartbeat send failed");
                    on_failure(LivenessFailure::SendFailed(e.to_string()));
                }
                return;
            }
            next_ping += config.interval;
        }

        thread::sleep(SLICE.min(config.interval));
    }
}
