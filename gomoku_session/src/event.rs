// Typed events from the session to its front end, plus front-end input.
//
// The control loop never formats text or calls UI code. It sends
// `SessionEvent`s over a channel and the presentation layer
// (`frontend::Presenter`, or any other consumer) decides how to show them.
// Board clicks travel the other way as `CellClick`.

use gomoku_board::{CellState, Coord, Move, Settings};

use crate::lifecycle::{EndReason, GameMode};

/// How a participant produces moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticipantKind {
    /// Moves come from board clicks on this machine.
    LocalHuman,
    /// Moves arrive over the network.
    RemoteHuman,
    Computer,
}

/// Display identity of a participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerLabel {
    You,
    Computer,
    /// 1-based player number (hot seat, or the remote side of a network game).
    Player(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cursor {
    /// Local player's turn: the board accepts clicks.
    Pointer,
    /// Waiting for the other side.
    Wait,
    /// No game running.
    Default,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundCue {
    Move,
    Info,
    Success,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Won {
        winner: CellState,
        player: PlayerLabel,
        /// Winning run, ordered from one end to the other.
        line: Vec<Coord>,
        move_number: usize,
        /// The player at this machine won (against the computer, the remote
        /// side, or in hot seat where either player is local).
        local_victory: bool,
    },
    Draw {
        move_number: usize,
    },
    Disconnected {
        reason: EndReason,
    },
    CantConnect {
        reason: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Started {
        mode: GameMode,
        settings: Settings,
        black: PlayerLabel,
        white: PlayerLabel,
    },
    /// A networked client replaced its settings with the server's.
    SettingsAdopted(Settings),
    NetworkControls(bool),
    TurnStarted {
        move_number: usize,
        stone: CellState,
        player: PlayerLabel,
        kind: ParticipantKind,
    },
    StonePlaced {
        mv: Move,
        move_number: usize,
        /// Human cell label such as `H8`.
        label: String,
    },
    ChatReceived {
        from: PlayerLabel,
        text: String,
    },
    ChatSent(String),
    Cursor(Cursor),
    Sound(SoundCue),
    /// Sent exactly once per game that ends on its own (not on restart).
    Finished(Outcome),
}

/// A click on the board surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellClick {
    pub row: usize,
    pub col: usize,
}
