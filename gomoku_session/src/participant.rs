// Participants: the two sides of a game and how each produces its moves.
//
// The control loop asks the participant whose turn it is for a move through
// `Participant::acquire_move`. Every implementation blocks in short bounded
// waits (a channel `recv_timeout` or a connection `receive_timeout`) and
// checks the session's `Interrupt` between waits, so a forced end is noticed
// within one poll interval no matter what the participant was waiting for.
//
// - `LocalHuman`: waits for a board click.
// - `RemoteHuman`: waits for a MOVE from the peer; shows chat as it arrives
//   and turns EXIT into a forced end.
// - `NetworkedLocal`: a `LocalHuman` whose turn runs a background
//   `MessageReader` so the peer's chat keeps flowing. Once the board accepts
//   the move, the reader is stopped (STOP_MESSAGES round trip) and only then
//   is the MOVE sent, so the peer never sees the move before the reader has
//   released the connection.
// - `ComputerPlayer`: picks a move synchronously with `computer::choose_move`.
//
// A participant only proposes a move. The control loop applies it to the
// board, which stays exclusively owned by the loop.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use gomoku_board::{Board, CellState, Move};
use gomoku_protocol::Command;
use gomoku_relay::{Connection, MessageReader, ReaderEvent, TransportError};
use tracing::{debug, warn};

use crate::computer::choose_move;
use crate::event::{CellClick, ParticipantKind, PlayerLabel, SessionEvent};
use crate::lifecycle::{EndReason, Interrupt};

/// Longest a move acquisition waits before re-checking the interrupt.
pub const POLL: Duration = Duration::from_millis(25);

/// What a participant can see and use during its turn.
pub struct TurnContext<'a> {
    pub board: &'a Board,
    pub interrupt: &'a Interrupt,
    pub events: &'a Sender<SessionEvent>,
    pub input: &'a Receiver<CellClick>,
}

pub trait Participant: Send {
    fn stone(&self) -> CellState;

    fn label(&self) -> PlayerLabel;

    fn kind(&self) -> ParticipantKind;

    /// Block until this participant proposes a move. `Ok(None)` means the
    /// turn was cut short by the interrupt.
    fn acquire_move(&mut self, ctx: &TurnContext<'_>) -> Result<Option<Move>, TransportError>;

    /// Called once the board has accepted this participant's move.
    fn on_move_applied(&mut self, _mv: &Move) -> Result<(), TransportError> {
        Ok(())
    }

    /// Release anything still running for an interrupted turn.
    fn end_turn(&mut self) {}
}

// ---------------------------------------------------------------------------
// Local human
// ---------------------------------------------------------------------------

pub struct LocalHuman {
    stone: CellState,
    label: PlayerLabel,
}

impl LocalHuman {
    pub fn new(stone: CellState, label: PlayerLabel) -> Self {
        Self { stone, label }
    }
}

impl Participant for LocalHuman {
    fn stone(&self) -> CellState {
        self.stone
    }

    fn label(&self) -> PlayerLabel {
        self.label
    }

    fn kind(&self) -> ParticipantKind {
        ParticipantKind::LocalHuman
    }

    fn acquire_move(&mut self, ctx: &TurnContext<'_>) -> Result<Option<Move>, TransportError> {
        loop {
            if ctx.interrupt.is_set() {
                return Ok(None);
            }
            match ctx.input.recv_timeout(POLL) {
                Ok(click) => return Ok(Some(Move::new(click.row, click.col, self.stone))),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    // The session handle is gone; nobody can click any more.
                    ctx.interrupt.trigger(EndReason::Restart);
                    return Ok(None);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Remote human
// ---------------------------------------------------------------------------

pub struct RemoteHuman {
    stone: CellState,
    label: PlayerLabel,
    conn: Arc<Connection>,
}

impl RemoteHuman {
    pub fn new(stone: CellState, label: PlayerLabel, conn: Arc<Connection>) -> Self {
        Self { stone, label, conn }
    }
}

impl Participant for RemoteHuman {
    fn stone(&self) -> CellState {
        self.stone
    }

    fn label(&self) -> PlayerLabel {
        self.label
    }

    fn kind(&self) -> ParticipantKind {
        ParticipantKind::RemoteHuman
    }

    fn acquire_move(&mut self, ctx: &TurnContext<'_>) -> Result<Option<Move>, TransportError> {
        loop {
            if ctx.interrupt.is_set() {
                return Ok(None);
            }
            let Some(command) = self.conn.receive_timeout(POLL)? else {
                continue;
            };
            match command {
                Command::Move(mv) => {
                    if mv.state != self.stone {
                        return Err(TransportError::ProtocolViolation(format!(
                            "peer moved with {} stones but plays {}",
                            mv.state, self.stone
                        )));
                    }
                    return Ok(Some(mv));
                }
                Command::Message(text) => {
                    let _ = ctx.events.send(SessionEvent::ChatReceived {
                        from: self.label,
                        text,
                    });
                }
                Command::Exit => {
                    ctx.interrupt.trigger(EndReason::PeerExit);
                    return Ok(None);
                }
                Command::StopMessages | Command::Heartbeat(_) | Command::HeartbeatAck(_) => {
                    debug!(tag = %command.tag(), "ignoring control command during remote turn");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Networked local human
// ---------------------------------------------------------------------------

pub struct NetworkedLocal {
    inner: LocalHuman,
    conn: Arc<Connection>,
    peer: PlayerLabel,
    events: Sender<SessionEvent>,
    interrupt: Interrupt,
    reader: Option<MessageReader>,
}

impl NetworkedLocal {
    pub fn new(
        inner: LocalHuman,
        conn: Arc<Connection>,
        peer: PlayerLabel,
        events: Sender<SessionEvent>,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            inner,
            conn,
            peer,
            events,
            interrupt,
            reader: None,
        }
    }

    fn start_reader(&mut self) {
        let events = self.events.clone();
        let interrupt = self.interrupt.clone();
        let peer = self.peer;
        self.reader = Some(MessageReader::start(self.conn.clone(), move |event| {
            match event {
                ReaderEvent::Chat(text) => {
                    let _ = events.send(SessionEvent::ChatReceived { from: peer, text });
                }
                ReaderEvent::PeerExit => {
                    interrupt.trigger(EndReason::PeerExit);
                }
                ReaderEvent::Closed => {
                    interrupt.trigger(EndReason::Transport("connection closed".into()));
                }
            }
        }));
    }
}

impl Participant for NetworkedLocal {
    fn stone(&self) -> CellState {
        self.inner.stone()
    }

    fn label(&self) -> PlayerLabel {
        self.inner.label()
    }

    fn kind(&self) -> ParticipantKind {
        ParticipantKind::LocalHuman
    }

    fn acquire_move(&mut self, ctx: &TurnContext<'_>) -> Result<Option<Move>, TransportError> {
        if self.reader.is_none() {
            self.start_reader();
        }
        let result = self.inner.acquire_move(ctx);
        if !matches!(result, Ok(Some(_))) {
            self.end_turn();
        }
        result
    }

    fn on_move_applied(&mut self, mv: &Move) -> Result<(), TransportError> {
        if let Some(reader) = self.reader.take() {
            reader.stop()?;
        }
        self.conn.send(&Command::Move(*mv))
    }

    fn end_turn(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.cancel();
        }
    }
}

// ---------------------------------------------------------------------------
// Computer
// ---------------------------------------------------------------------------

pub struct ComputerPlayer {
    stone: CellState,
}

impl ComputerPlayer {
    pub fn new(stone: CellState) -> Self {
        Self { stone }
    }
}

impl Participant for ComputerPlayer {
    fn stone(&self) -> CellState {
        self.stone
    }

    fn label(&self) -> PlayerLabel {
        PlayerLabel::Computer
    }

    fn kind(&self) -> ParticipantKind {
        ParticipantKind::Computer
    }

    fn acquire_move(&mut self, ctx: &TurnContext<'_>) -> Result<Option<Move>, TransportError> {
        if ctx.interrupt.is_set() {
            return Ok(None);
        }
        match choose_move(ctx.board, self.stone) {
            Some(c) => Ok(Some(Move::new(c.row, c.col, self.stone))),
            None => {
                warn!("computer asked to move on a full board");
                Ok(None)
            }
        }
    }
}
