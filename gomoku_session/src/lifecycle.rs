// Session lifecycle, game modes and the forced-end interrupt.
//
// A session's control loop is in one of three states. It starts in `Run`,
// moves to `Wait` when the game ends (win, draw, disconnect or failed setup)
// and to `Restart` when the owner asks it to stop. `Restart` is terminal: the
// control loop exits and a new session is started for the next game.
//
// `Interrupt` is the single forced-end signal. Everything that can cut a game
// short (a restart request, the peer leaving, a transport failure, a
// liveness timeout) triggers it, and every move acquisition polls it. The
// first reason recorded wins; later triggers are ignored, so the outcome
// reported to the player reflects what actually happened first.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Run,
    Wait,
    Restart,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameMode {
    /// Local human against the built-in computer opponent.
    LocalVsComputer,
    /// Two humans sharing one board (hot seat).
    LocalVsLocal,
    /// Local human against a remote human through a relay server.
    Networked { server_address: String },
}

impl GameMode {
    pub fn is_networked(&self) -> bool {
        matches!(self, GameMode::Networked { .. })
    }
}

/// Why a running game was cut short.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EndReason {
    /// The owner asked for a new game.
    Restart,
    /// The remote player left (EXIT received).
    PeerExit,
    /// Send/receive failed or the peer broke the protocol.
    Transport(String),
    /// No heartbeat acknowledgement within the liveness window.
    TimedOut,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::Restart => write!(f, "restart requested"),
            EndReason::PeerExit => write!(f, "the other player left"),
            EndReason::Transport(e) => write!(f, "transport failure: {e}"),
            EndReason::TimedOut => write!(f, "the connection timed out"),
        }
    }
}

/// Shared forced-end flag. Cloning yields another handle to the same flag.
#[derive(Clone, Debug, Default)]
pub struct Interrupt {
    reason: Arc<Mutex<Option<EndReason>>>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `reason` unless another reason is already set. Returns true if
    /// this call set it.
    pub fn trigger(&self, reason: EndReason) -> bool {
        let mut slot = self.reason.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }
        *slot = Some(reason);
        true
    }

    pub fn reason(&self) -> Option<EndReason> {
        self.reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_set(&self) -> bool {
        self.reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reason_wins() {
        let interrupt = Interrupt::new();
        assert!(!interrupt.is_set());

        let other = interrupt.clone();
        assert!(other.trigger(EndReason::PeerExit));
        assert!(!interrupt.trigger(EndReason::TimedOut));
        assert!(interrupt.is_set());
        assert_eq!(interrupt.reason(), Some(EndReason::PeerExit));
    }

    #[test]
    fn networked_mode_is_recognized() {
        assert!(
            GameMode::Networked {
                server_address: "127.0.0.1:5000".into()
            }
            .is_networked()
        );
        assert!(!GameMode::LocalVsLocal.is_networked());
    }
}
