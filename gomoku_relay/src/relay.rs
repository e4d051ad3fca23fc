// Seat table and command routing for the relay server.
//
// `Relay` is the central data structure that `server.rs` drives. It tracks
// the two seats, routes each command from one seat to the other, and answers
// the protocol's server-side duties (heartbeat acks, STOP_MESSAGES echo).
// All mutation happens through methods called from the server's
// single-threaded main loop, so there is no internal locking.
//
// Key responsibilities:
// - Seating: the first connection becomes participant 0, the second
//   participant 1. Each receives a `Welcome` with the server's settings as
//   soon as it is seated.
// - Routing: MOVE, MESSAGE and EXIT go to the other seat. Commands sent
//   before the other seat exists are kept in a backlog and delivered when it
//   is filled, in the order they arrived.
// - Departure: when a seat's reader fails the seat is vacated and the other
//   seat is told with EXIT (unless the leaver already said EXIT itself).
//   A seat that has sent nothing for too long is vacated the same way;
//   connected clients heartbeat on a fixed interval, so silence means the
//   peer is hung even if its socket is still open.
//
// Writing to client streams: `Relay` holds cloned `TcpStream` write halves
// wrapped in `BufWriter`. Write errors on a single seat are logged but do not
// stop the relay; that seat's reader thread will detect the broken pipe and
// report `Disconnected`.

use std::io::BufWriter;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use gomoku_board::Settings;
use gomoku_protocol::{Command, ParticipantNumber, WireError, Welcome, write_frame};
use tracing::{debug, info, warn};

/// Seats per game.
pub const SEATS: usize = 2;

/// Relay state for one two-player game.
pub struct Relay {
    settings: Settings,
    seats: [Option<SeatState>; SEATS],
    /// Seats filled so far. Seats are never re-filled once vacated.
    seated: usize,
    /// Commands addressed to a seat that has not been filled yet.
    backlog: [Vec<Command>; SEATS],
}

struct SeatState {
    addr: SocketAddr,
    writer: BufWriter<TcpStream>,
    /// This seat already announced its departure with EXIT.
    sent_exit: bool,
    last_heard: Instant,
}

impl Relay {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            seats: [None, None],
            seated: 0,
            backlog: [Vec::new(), Vec::new()],
        }
    }

    /// Seat a new connection and send its `Welcome`. Returns `None` when both
    /// seats have already been handed out.
    pub fn seat(&mut self, stream: TcpStream, addr: SocketAddr) -> Option<ParticipantNumber> {
        if self.seated >= SEATS {
            return None;
        }
        let participant = ParticipantNumber(self.seated as u8);
        self.seated += 1;

        self.seats[participant.index()] = Some(SeatState {
            addr,
            writer: BufWriter::new(stream),
            sent_exit: false,
            last_heard: Instant::now(),
        });
        info!(%addr, %participant, "seated participant");

        let welcome = Welcome {
            participant,
            settings: self.settings,
        };
        self.send_to(participant, &welcome);

        // Flush anything the other seat sent while this one was empty.
        for command in std::mem::take(&mut self.backlog[participant.index()]) {
            self.send_to(participant, &command);
        }
        Some(participant)
    }

    /// Route one command received from `from`.
    pub fn route(&mut self, from: ParticipantNumber, command: Command) {
        let Some(seat) = self.seats[from.index()].as_mut() else {
            debug!(%from, "ignoring command from an empty seat");
            return;
        };
        seat.last_heard = Instant::now();
        debug!(%from, tag = %command.tag(), "routing command");
        match command {
            Command::Heartbeat(seq) => {
                self.send_to(from, &Command::HeartbeatAck(seq));
            }
            Command::HeartbeatAck(_) => {}
            Command::StopMessages => {
                self.send_to(from, &Command::StopMessages);
            }
            Command::Exit => {
                if let Some(seat) = self.seats[from.index()].as_mut() {
                    seat.sent_exit = true;
                }
                self.forward(from, Command::Exit);
            }
            Command::Move(_) | Command::Message(_) => {
                self.forward(from, command);
            }
        }
    }

    /// Vacate a seat whose connection failed or closed. The other seat is
    /// sent EXIT unless the leaver already announced itself. If the other
    /// seat is not filled yet, the EXIT waits in its backlog.
    pub fn vacate(&mut self, who: ParticipantNumber) {
        let Some(seat) = self.seats[who.index()].take() else {
            return;
        };
        info!(addr = %seat.addr, participant = %who, "participant left");
        let _ = seat.writer.get_ref().shutdown(Shutdown::Both);
        if !seat.sent_exit {
            self.forward(who, Command::Exit);
        }
    }

    /// Vacate every seat that has sent nothing for longer than `timeout`.
    /// Returns the seats that were vacated.
    pub fn vacate_silent(&mut self, now: Instant, timeout: Duration) -> Vec<ParticipantNumber> {
        let silent: Vec<ParticipantNumber> = (0..SEATS)
            .map(|i| ParticipantNumber(i as u8))
            .filter(|p| {
                self.seats[p.index()]
                    .as_ref()
                    .is_some_and(|seat| now.saturating_duration_since(seat.last_heard) > timeout)
            })
            .collect();
        for &participant in &silent {
            warn!(%participant, ?timeout, "participant went silent, vacating seat");
            self.vacate(participant);
        }
        silent
    }

    /// Close every seat's socket so blocked reader threads return.
    pub fn close_all(&mut self) {
        for seat in self.seats.iter_mut().filter_map(Option::take) {
            let _ = seat.writer.get_ref().shutdown(Shutdown::Both);
        }
    }

    /// Both seats were filled and both have since left.
    pub fn is_finished(&self) -> bool {
        self.seated == SEATS && self.seats.iter().all(Option::is_none)
    }

    pub fn occupied(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    /// Send to the other seat, or keep the command until it is filled.
    fn forward(&mut self, from: ParticipantNumber, command: Command) {
        let to = from.other();
        if self.seats[to.index()].is_some() {
            self.send_to(to, &command);
        } else if self.seated <= to.index() {
            self.backlog[to.index()].push(command);
        } else {
            debug!(%to, "dropping command for a vacated seat");
        }
    }

    /// Send a frame to a specific seat. Write errors are logged and otherwise
    /// ignored (the reader thread will detect the broken pipe).
    fn send_to<T: serde::Serialize>(&mut self, to: ParticipantNumber, value: &T) {
        if let Some(seat) = self.seats[to.index()].as_mut() {
            if let Err(e) = write_frame(&mut seat.writer, value) {
                log_write_error(to, &e);
            }
        }
    }
}

fn log_write_error(to: ParticipantNumber, err: &WireError) {
    warn!(participant = %to, error = %err, "write to participant failed");
}
