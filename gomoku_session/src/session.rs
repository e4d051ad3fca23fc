// Session control loop and its handle.
//
// `SessionHandle::start` spawns one control thread per game. The thread:
//
// 1. Sets up the board and the two participants for the chosen mode. For a
//    networked game this connects to the server, adopts the server's
//    settings, and starts the liveness monitor. If setup fails the game
//    never runs: the thread reports `Outcome::CantConnect` and parks.
// 2. Runs turns in strict alternation, black first. Each turn drains stale
//    clicks, announces the turn, and blocks in the participant's
//    `acquire_move`. A proposed move is applied to the board; an illegal
//    local move is dropped and the participant asked again, while an illegal
//    remote move is a protocol violation. After every accepted move the
//    verdict is checked before the move counter and turn pointer advance.
// 3. Tears down: interrupted turns are released, the liveness monitor is
//    stopped, and in a networked game EXIT is sent best-effort before the
//    connection is closed.
// 4. Reports exactly one `Finished` outcome (unless the game was stopped by a
//    restart request) and parks in `Wait` until `request_restart`.
//
// The board is owned by the control thread alone. Other threads reach the
// game only through the `Interrupt` (forced end), the click channel, and the
// shared connection used for chat.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use gomoku_board::{Board, CellState, Move, Settings, Verdict};
use gomoku_protocol::{Command, ParticipantNumber};
use gomoku_relay::{
    ConnectOptions, Connection, LivenessConfig, LivenessFailure, LivenessMonitor, TransportError,
};
use tracing::{debug, info, warn};

use crate::error::SetupFailure;
use crate::event::{
    CellClick, Cursor, Outcome, ParticipantKind, PlayerLabel, SessionEvent, SoundCue,
};
use crate::lifecycle::{EndReason, GameMode, Interrupt, Lifecycle};
use crate::participant::{
    ComputerPlayer, LocalHuman, NetworkedLocal, Participant, RemoteHuman, TurnContext,
};

/// Transport tuning for networked games.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub connect: ConnectOptions,
    pub liveness: LivenessConfig,
}

/// State shared between the handle and the control thread.
struct Shared {
    state: Mutex<Lifecycle>,
    changed: Condvar,
    /// Live connection of a networked game, for chat sends.
    connection: Mutex<Option<Arc<Connection>>>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, Lifecycle> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn connection(&self) -> MutexGuard<'_, Option<Arc<Connection>>> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owner's handle to a running game.
pub struct SessionHandle {
    shared: Arc<Shared>,
    interrupt: Interrupt,
    input: Sender<CellClick>,
    events: Sender<SessionEvent>,
    thread: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Start a game on its own control thread. The returned receiver yields
    /// the game's events in order.
    pub fn start(
        mode: GameMode,
        settings: Settings,
        options: SessionOptions,
    ) -> (Self, Receiver<SessionEvent>) {
        let (events_tx, events_rx) = mpsc::channel();
        let (input_tx, input_rx) = mpsc::channel();
        let shared = Arc::new(Shared {
            state: Mutex::new(Lifecycle::Run),
            changed: Condvar::new(),
            connection: Mutex::new(None),
        });
        let interrupt = Interrupt::new();

        let control = Control {
            mode,
            settings,
            options,
            shared: shared.clone(),
            interrupt: interrupt.clone(),
            events: events_tx.clone(),
            input: input_rx,
        };
        let thread = thread::spawn(move || control.run());

        (
            Self {
                shared,
                interrupt,
                input: input_tx,
                events: events_tx,
                thread: Some(thread),
            },
            events_rx,
        )
    }

    pub fn current_state(&self) -> Lifecycle {
        *self.shared.state()
    }

    /// Stop this game: end any pending turn, wake a parked `Wait`, and join
    /// the control thread. The state is `Restart` afterwards.
    pub fn request_restart(&mut self) {
        {
            let mut state = self.shared.state();
            if *state != Lifecycle::Restart {
                info!(from = ?*state, "restart requested");
            }
            *state = Lifecycle::Restart;
            self.shared.changed.notify_all();
        }
        self.interrupt.trigger(EndReason::Restart);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    /// Feed a board click to the game. Clicks outside a local turn are
    /// discarded when the next turn starts.
    pub fn click(&self, row: usize, col: usize) {
        let _ = self.input.send(CellClick { row, col });
    }

    /// Send a chat line to the remote player. Only available while a
    /// networked game is connected.
    pub fn send_chat(&self, text: &str) -> Result<(), TransportError> {
        let conn = self
            .shared
            .connection()
            .clone()
            .ok_or(TransportError::Closed)?;
        conn.send(&Command::Message(text.to_string()))?;
        let _ = self.events.send(SessionEvent::ChatSent(text.to_string()));
        Ok(())
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.request_restart();
    }
}

/// One game's worth of live state, built by `Control::setup`.
struct Game {
    board: Board,
    /// Index 0 plays black and moves first.
    players: [Box<dyn Participant>; 2],
    connection: Option<Arc<Connection>>,
    monitor: Option<LivenessMonitor>,
}

/// Everything the control thread owns.
struct Control {
    mode: GameMode,
    settings: Settings,
    options: SessionOptions,
    shared: Arc<Shared>,
    interrupt: Interrupt,
    events: Sender<SessionEvent>,
    input: Receiver<CellClick>,
}

impl Control {
    fn run(self) {
        info!(mode = ?self.mode, "session started");
        let outcome = match self.setup() {
            Ok(mut game) => {
                let outcome = self.play(&mut game);
                self.teardown(game);
                outcome
            }
            Err(failure) => {
                warn!(error = %failure, "game setup failed");
                Some(Outcome::CantConnect {
                    reason: failure.to_string(),
                })
            }
        };

        if let Some(outcome) = outcome {
            info!(?outcome, "game finished");
            {
                let mut state = self.shared.state();
                if *state == Lifecycle::Run {
                    *state = Lifecycle::Wait;
                }
            }
            self.emit(SessionEvent::Cursor(Cursor::Default));
            self.emit(SessionEvent::Finished(outcome));
        }

        // Park until the owner asks for the next game.
        let mut state = self.shared.state();
        while *state != Lifecycle::Restart {
            state = self
                .shared
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        debug!("session control thread exiting");
    }

    fn setup(&self) -> Result<Game, SetupFailure> {
        match &self.mode {
            GameMode::LocalVsComputer => {
                let board = Board::new(&self.settings)?;
                let (black, white): (Box<dyn Participant>, Box<dyn Participant>) =
                    if self.settings.computer_starts {
                        (
                            Box::new(ComputerPlayer::new(CellState::Black)),
                            Box::new(LocalHuman::new(CellState::White, PlayerLabel::You)),
                        )
                    } else {
                        (
                            Box::new(LocalHuman::new(CellState::Black, PlayerLabel::You)),
                            Box::new(ComputerPlayer::new(CellState::White)),
                        )
                    };
                Ok(Game {
                    board,
                    players: [black, white],
                    connection: None,
                    monitor: None,
                })
            }
            GameMode::LocalVsLocal => Ok(Game {
                board: Board::new(&self.settings)?,
                players: [
                    Box::new(LocalHuman::new(CellState::Black, PlayerLabel::Player(1))),
                    Box::new(LocalHuman::new(CellState::White, PlayerLabel::Player(2))),
                ],
                connection: None,
                monitor: None,
            }),
            GameMode::Networked { server_address } => self.setup_networked(server_address),
        }
    }

    fn setup_networked(&self, server_address: &str) -> Result<Game, SetupFailure> {
        let conn = Connection::connect(server_address, &self.options.connect)?;

        // The server's settings override ours.
        let mut settings = self.settings;
        settings.adopt(&conn.settings());
        let board = Board::new(&settings)?;
        self.emit(SessionEvent::SettingsAdopted(settings));

        let local = conn.participant();
        let remote = local.other();
        let local_player: Box<dyn Participant> = Box::new(NetworkedLocal::new(
            LocalHuman::new(local.stone(), PlayerLabel::You),
            conn.clone(),
            player_label(remote),
            self.events.clone(),
            self.interrupt.clone(),
        ));
        let remote_player: Box<dyn Participant> = Box::new(RemoteHuman::new(
            remote.stone(),
            player_label(remote),
            conn.clone(),
        ));
        let players = if local == ParticipantNumber::FIRST {
            [local_player, remote_player]
        } else {
            [remote_player, local_player]
        };

        let interrupt = self.interrupt.clone();
        let monitor = LivenessMonitor::start(conn.clone(), self.options.liveness, move |failure| {
            let reason = match failure {
                LivenessFailure::TimedOut => EndReason::TimedOut,
                LivenessFailure::SendFailed(e) => EndReason::Transport(e),
            };
            interrupt.trigger(reason);
        });

        *self.shared.connection() = Some(conn.clone());
        self.emit(SessionEvent::NetworkControls(true));
        info!(participant = %local, "joined networked game");

        Ok(Game {
            board,
            players,
            connection: Some(conn),
            monitor: Some(monitor),
        })
    }

    /// Turn loop. Returns the outcome, or `None` when stopped by a restart.
    fn play(&self, game: &mut Game) -> Option<Outcome> {
        self.emit(SessionEvent::Started {
            mode: self.mode.clone(),
            settings: self.settings_of(&game.board),
            black: game.players[0].label(),
            white: game.players[1].label(),
        });
        self.emit(SessionEvent::Sound(SoundCue::Info));

        let mut move_number = 1;
        let mut turn = 0;
        loop {
            if self.interrupt.is_set() {
                break;
            }
            // Clicks made outside this turn do not count.
            while self.input.try_recv().is_ok() {}

            let player = &mut game.players[turn];
            self.emit(SessionEvent::TurnStarted {
                move_number,
                stone: player.stone(),
                player: player.label(),
                kind: player.kind(),
            });
            self.emit(SessionEvent::Cursor(match player.kind() {
                ParticipantKind::LocalHuman => Cursor::Pointer,
                ParticipantKind::RemoteHuman | ParticipantKind::Computer => Cursor::Wait,
            }));

            let ctx = TurnContext {
                board: &game.board,
                interrupt: &self.interrupt,
                events: &self.events,
                input: &self.input,
            };
            let Some(candidate) = self.acquire_legal_move(player.as_mut(), &ctx) else {
                player.end_turn();
                break;
            };
            let mv = match game.board.apply_move(&candidate) {
                Ok(mv) => mv,
                Err(e) => {
                    // Checked in acquire_legal_move; only reachable on a bug.
                    warn!(error = %e, "legal move rejected on apply");
                    self.interrupt.trigger(EndReason::Transport(e.to_string()));
                    break;
                }
            };
            debug!(?mv, move_number, "move applied");

            self.emit(SessionEvent::StonePlaced {
                mv,
                move_number,
                label: game.board.field_name(mv.row, mv.col),
            });
            self.emit(SessionEvent::Sound(SoundCue::Move));

            if let Err(e) = player.on_move_applied(&mv) {
                warn!(error = %e, "could not deliver move to peer");
                self.interrupt.trigger(EndReason::Transport(e.to_string()));
                break;
            }

            if let Some(verdict) = game.board.verdict(&mv) {
                self.emit(SessionEvent::Sound(SoundCue::Success));
                return Some(match verdict {
                    Verdict::Won(line) => Outcome::Won {
                        winner: mv.state,
                        player: player.label(),
                        line,
                        move_number,
                        local_victory: player.kind() == ParticipantKind::LocalHuman,
                    },
                    Verdict::Draw => Outcome::Draw { move_number },
                });
            }

            move_number += 1;
            turn = 1 - turn;
        }

        match self.interrupt.reason() {
            Some(EndReason::Restart) | None => None,
            Some(reason) => Some(Outcome::Disconnected { reason }),
        }
    }

    /// Ask `player` until it proposes a move the board accepts. Illegal local
    /// moves are dropped silently; an illegal remote move ends the game.
    fn acquire_legal_move(
        &self,
        player: &mut dyn Participant,
        ctx: &TurnContext<'_>,
    ) -> Option<Move> {
        loop {
            let candidate = match player.acquire_move(ctx) {
                Ok(Some(candidate)) => candidate,
                Ok(None) => return None,
                Err(e) => {
                    warn!(error = %e, "move acquisition failed");
                    self.interrupt.trigger(EndReason::Transport(e.to_string()));
                    return None;
                }
            };
            match ctx.board.check(candidate.row, candidate.col, candidate.state) {
                Ok(()) => return Some(candidate),
                Err(e) if player.kind() == ParticipantKind::RemoteHuman => {
                    warn!(error = %e, "peer sent an illegal move");
                    self.interrupt.trigger(EndReason::Transport(format!(
                        "protocol violation: peer sent an illegal move ({e})"
                    )));
                    return None;
                }
                Err(e) => debug!(error = %e, "ignoring illegal move"),
            }
        }
    }

    fn teardown(&self, game: Game) {
        let Game {
            mut players,
            connection,
            monitor,
            ..
        } = game;
        for player in &mut players {
            player.end_turn();
        }
        if let Some(mut monitor) = monitor {
            monitor.stop_pinging();
        }
        if let Some(conn) = connection {
            if let Err(e) = conn.send(&Command::Exit) {
                debug!(error = %e, "EXIT not delivered during teardown");
            }
            conn.close();
            *self.shared.connection() = None;
            self.emit(SessionEvent::NetworkControls(false));
        }
    }

    fn settings_of(&self, board: &Board) -> Settings {
        let mut settings = self.settings;
        settings.board_size = board.size();
        settings.win_length = board.win_length();
        settings.strict_exact_length = board.strict_exact_length();
        settings
    }

    fn emit(&self, event: SessionEvent) {
        // The receiver may be gone if the owner stopped listening; the game
        // still runs to completion.
        let _ = self.events.send(event);
    }
}

/// Label of a seat as seen from the other side: seat 0 is "Player 1".
fn player_label(seat: ParticipantNumber) -> PlayerLabel {
    PlayerLabel::Player(seat.0 + 1)
}
