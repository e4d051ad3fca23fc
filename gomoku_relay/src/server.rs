// TCP server and main event loop for the Gomoku relay.
//
// Architecture: thread-per-reader with a central `mpsc` channel.
//
// - **Listener thread** (non-blocking `accept()` polled every 20 ms): hands
//   the first two connections to the main thread as
//   `InternalEvent::NewConnection`, then switches to `deny::deny_loop` and
//   refuses everything after that.
// - **Reader threads** (one per seat): call `read_frame()` in a loop and send
//   `InternalEvent::CommandFrom` to the main thread. On error/EOF, send
//   `InternalEvent::Disconnected`.
// - **Main thread**: owns the `Relay`, receives events from the channel and
//   dispatches them. Uses `recv_timeout` so it notices `keep_running` going
//   false even when no client is talking.
//
// The main thread is the only writer to seated TCP streams (via `Relay`).
// Reader threads only read. This avoids concurrent read/write on the same
// `TcpStream`.
//
// Liveness: every pass of the main loop vacates seats that have been silent
// for longer than `ServerConfig::seat_timeout`. Clients heartbeat while
// connected, so only a hung peer trips it.
//
// Shutdown: `ServerHandle::stop` clears `keep_running`. The server also stops
// on its own once both seats were filled and both players have left, since a
// game is never re-seated.

use std::io::{self, BufReader};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use gomoku_board::Settings;
use gomoku_protocol::{Command, ParticipantNumber, read_frame};
use tracing::{debug, info, warn};

use crate::deny::{ACCEPT_POLL, deny_loop, refuse};
use crate::relay::{Relay, SEATS};

/// How long the main loop waits for an event before re-checking
/// `keep_running`.
const EVENT_POLL: Duration = Duration::from_millis(100);

/// Well above the client heartbeat timeout, so a client's own monitor
/// reports a broken link before the relay gives up on it.
pub const DEFAULT_SEAT_TIMEOUT: Duration = Duration::from_secs(10);

/// Events sent from listener/reader threads to the main thread.
enum InternalEvent {
    NewConnection {
        stream: TcpStream,
        addr: SocketAddr,
    },
    CommandFrom {
        participant: ParticipantNumber,
        command: Command,
    },
    Disconnected {
        participant: ParticipantNumber,
    },
}

/// Handle returned by `start_server` to control the running server.
pub struct ServerHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Signal the server to stop and wait for it to shut down.
    pub fn stop(mut self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    /// True once the main loop has exited, either through `stop` or because
    /// both players left.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(thread::JoinHandle::is_finished)
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Configuration for starting a server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub bind_address: String,
    /// Authoritative game settings sent to both seats.
    pub settings: Settings,
    /// Vacate a seat that sends nothing for this long. `None` disables the
    /// check.
    pub seat_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            bind_address: "0.0.0.0".into(),
            settings: Settings::default(),
            seat_timeout: Some(DEFAULT_SEAT_TIMEOUT),
        }
    }
}

/// Start the server on a background thread. Returns a handle for stopping it
/// and the actual bound address (useful when port 0 is used to let the OS
/// pick a free port).
pub fn start_server(config: ServerConfig) -> io::Result<(ServerHandle, SocketAddr)> {
    config
        .settings
        .validate()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let listener = TcpListener::bind((config.bind_address.as_str(), config.port))?;
    let addr = listener.local_addr()?;
    info!(%addr, settings = ?config.settings, "server listening");

    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();
    let thread = thread::spawn(move || {
        run_server(listener, &config, keep_running_clone);
    });

    Ok((
        ServerHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Main server loop. Runs until `keep_running` is cleared or the game is over.
fn run_server(listener: TcpListener, config: &ServerConfig, keep_running: Arc<AtomicBool>) {
    let mut relay = Relay::new(config.settings);
    let (tx, rx): (Sender<InternalEvent>, Receiver<InternalEvent>) = mpsc::channel();

    // Non-blocking so the accept loops can check keep_running periodically.
    if let Err(e) = listener.set_nonblocking(true) {
        warn!(error = %e, "could not make listener non-blocking");
        return;
    }

    let keep_running_listener = keep_running.clone();
    let tx_listener = tx.clone();
    let listener_thread = thread::spawn(move || {
        accept_seats(&listener, &tx_listener, &keep_running_listener);
        drop(tx_listener);
        deny_loop(&listener, &keep_running_listener);
    });

    while keep_running.load(Ordering::SeqCst) {
        match rx.recv_timeout(EVENT_POLL) {
            Ok(event) => {
                handle_event(&mut relay, event, &tx);
                // Drain any additional events that arrived during handling.
                while let Ok(event) = rx.try_recv() {
                    handle_event(&mut relay, event, &tx);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
        if let Some(timeout) = config.seat_timeout {
            relay.vacate_silent(Instant::now(), timeout);
        }
        if relay.is_finished() {
            info!("both players left, shutting down");
            break;
        }
    }

    keep_running.store(false, Ordering::SeqCst);
    relay.close_all();
    let _ = listener_thread.join();
    debug!("server stopped");
}

/// Accept until both seats have a connection (or shutdown is requested).
fn accept_seats(listener: &TcpListener, tx: &Sender<InternalEvent>, keep_running: &AtomicBool) {
    let mut accepted = 0;
    while accepted < SEATS && keep_running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, addr)) => {
                stream.set_nonblocking(false).ok();
                stream.set_nodelay(true).ok();
                if tx.send(InternalEvent::NewConnection { stream, addr }).is_err() {
                    return;
                }
                accepted += 1;
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                warn!(error = %e, "accept failed");
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

/// Dispatch a single event to the relay.
fn handle_event(relay: &mut Relay, event: InternalEvent, tx: &Sender<InternalEvent>) {
    match event {
        InternalEvent::NewConnection { stream, addr } => {
            handle_new_connection(relay, stream, addr, tx);
        }
        InternalEvent::CommandFrom {
            participant,
            command,
        } => {
            relay.route(participant, command);
        }
        InternalEvent::Disconnected { participant } => {
            relay.vacate(participant);
        }
    }
}

/// Seat a new connection and spawn its reader thread.
fn handle_new_connection(
    relay: &mut Relay,
    stream: TcpStream,
    addr: SocketAddr,
    tx: &Sender<InternalEvent>,
) {
    let read_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            warn!(%addr, error = %e, "could not clone accepted stream");
            return;
        }
    };

    let Some(participant) = relay.seat(stream, addr) else {
        // The listener only forwards two connections, but refuse rather than
        // leak the socket if that ever changes.
        refuse(read_stream);
        return;
    };

    let tx_reader = tx.clone();
    thread::spawn(move || {
        reader_loop(BufReader::new(read_stream), participant, tx_reader);
    });
}

/// Reader loop for a single seat. Runs in its own thread until the stream
/// fails or closes.
fn reader_loop(
    mut reader: BufReader<TcpStream>,
    participant: ParticipantNumber,
    tx: Sender<InternalEvent>,
) {
    loop {
        match read_frame::<_, Command>(&mut reader) {
            Ok(command) => {
                if tx
                    .send(InternalEvent::CommandFrom {
                        participant,
                        command,
                    })
                    .is_err()
                {
                    break;
                }
            }
            Err(e) => {
                debug!(%participant, error = %e, "reader finished");
                let _ = tx.send(InternalEvent::Disconnected { participant });
                break;
            }
        }
    }
}
