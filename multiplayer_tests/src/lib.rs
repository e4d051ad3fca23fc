// Test-only harness for networked Gomoku integration tests.
//
// Wraps a real `SessionHandle` (from `gomoku_session`) connected to a real
// relay server (from `gomoku_relay::server`) and exposes a synchronous,
// test-friendly API: wait for a given event, play a stone on the local
// turn, wait for the outcome.
//
// The only test-specific code here is the bounded waiting around the
// session's event channel. All networking and game logic goes through the
// same code paths as the terminal front end.
//
// See also: `tests/full_pipeline.rs` for the integration test scenarios.

use std::net::SocketAddr;
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::{Duration, Instant};

use gomoku_board::Settings;
use gomoku_relay::{LivenessConfig, ServerConfig, ServerHandle, start_server};
use gomoku_session::{
    GameMode, Lifecycle, Outcome, ParticipantKind, SessionEvent, SessionHandle, SessionOptions,
};

/// Default timeout for blocking waits.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Sleep between state polls.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Session options with a shorter liveness window than the default, so
/// tests that end in a timeout finish quickly. Still wide enough that a
/// loaded machine answering heartbeats on localhost never trips it.
pub fn test_options() -> SessionOptions {
    SessionOptions {
        liveness: LivenessConfig {
            interval: Duration::from_millis(100),
            timeout_factor: 10,
        },
        ..SessionOptions::default()
    }
}

/// Start a relay on a random port with the given settings.
pub fn start_test_server(settings: Settings) -> (ServerHandle, SocketAddr) {
    let config = ServerConfig {
        port: 0,
        bind_address: "127.0.0.1".into(),
        settings,
        ..ServerConfig::default()
    };
    start_server(config).expect("start_server failed")
}

/// Poll `done` until it returns true or `WAIT_TIMEOUT` passes.
pub fn wait_until(what: &str, mut done: impl FnMut() -> bool) {
    let start = Instant::now();
    while !done() {
        assert!(start.elapsed() < WAIT_TIMEOUT, "timed out waiting for {what}");
        thread::sleep(POLL_INTERVAL);
    }
}

/// A test player wrapping a real session and its event stream.
pub struct TestPlayer {
    pub session: SessionHandle,
    events: Receiver<SessionEvent>,
    /// Every event received so far, in order.
    pub seen: Vec<SessionEvent>,
}

impl TestPlayer {
    pub fn start(mode: GameMode, settings: Settings, options: SessionOptions) -> Self {
        let (session, events) = SessionHandle::start(mode, settings, options);
        Self {
            session,
            events,
            seen: Vec::new(),
        }
    }

    /// Join the relay at `addr` with default local settings.
    pub fn join(addr: SocketAddr) -> Self {
        Self::start(
            GameMode::Networked {
                server_address: addr.to_string(),
            },
            Settings::default(),
            test_options(),
        )
    }

    /// Join and block until the connection is up (network controls
    /// enabled), so seats are assigned in call order and chat can be sent.
    pub fn join_and_wait(addr: SocketAddr) -> Self {
        let mut player = Self::join(addr);
        player.wait_for("connection", |e| {
            matches!(e, SessionEvent::NetworkControls(true))
        });
        player
    }

    /// Receive events until one matches `pred`, returning a copy of it.
    pub fn wait_for(
        &mut self,
        what: &str,
        mut pred: impl FnMut(&SessionEvent) -> bool,
    ) -> SessionEvent {
        let start = Instant::now();
        loop {
            let left = WAIT_TIMEOUT.saturating_sub(start.elapsed());
            let event = self
                .events
                .recv_timeout(left)
                .unwrap_or_else(|_| panic!("timed out waiting for {what}; saw {:?}", self.seen));
            self.seen.push(event.clone());
            if pred(&event) {
                return event;
            }
        }
    }

    /// Block until it is this player's turn at the board.
    pub fn wait_for_local_turn(&mut self) -> usize {
        match self.wait_for("local turn", |e| {
            matches!(
                e,
                SessionEvent::TurnStarted {
                    kind: ParticipantKind::LocalHuman,
                    ..
                }
            )
        }) {
            SessionEvent::TurnStarted { move_number, .. } => move_number,
            _ => unreachable!(),
        }
    }

    /// Wait for the local turn, click `(row, col)`, and wait until the stone
    /// is on the board. Returns the move number.
    pub fn play(&mut self, row: usize, col: usize) -> usize {
        let n = self.wait_for_local_turn();
        self.session.click(row, col);
        self.wait_for_stone(n);
        n
    }

    /// Wait until move `n` (from either side) is on the board.
    pub fn wait_for_stone(&mut self, n: usize) {
        self.wait_for("stone placement", |e| {
            matches!(e, SessionEvent::StonePlaced { move_number, .. } if *move_number == n)
        });
    }

    pub fn wait_for_outcome(&mut self) -> Outcome {
        match self.wait_for("game outcome", |e| matches!(e, SessionEvent::Finished(_))) {
            SessionEvent::Finished(outcome) => outcome,
            _ => unreachable!(),
        }
    }

    pub fn wait_for_state(&self, state: Lifecycle) {
        wait_until(&format!("state {state:?}"), || {
            self.session.current_state() == state
        });
    }
}
