// TCP client connection to the Gomoku relay.
//
// Architecture:
// - `Connection::connect()` performs the TCP connect and reads the server's
//   greeting on the calling thread, both bounded by timeouts. A `Welcome`
//   carries the seat number and the authoritative settings; a bare EXIT means
//   the server is full.
// - A background reader thread then calls `read_frame()` in a loop. Heartbeat
//   acknowledgements are recorded in the shared `LivenessState`; every other
//   command is pushed into an `mpsc` inbox. On error/EOF the thread pushes a
//   final `Inbound::Closed` and exits.
// - Writers (the session's move path, chat sends, the liveness monitor) share
//   one `BufWriter<TcpStream>` behind a mutex, so frames never interleave.
//
// The inbox has one consumer at a time: either the primary wait-for-move read
// (`receive`) or the background chat drain (`message_reader.rs`). The chat
// drain hands back anything that is not chat through `requeue`, which puts it
// in front of the inbox.
//
// The connection never reconnects. After any failure every further `send` or
// `receive` returns `TransportError::Closed`.

use std::collections::VecDeque;
use std::io::{self, BufReader, BufWriter};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gomoku_board::Settings;
use gomoku_protocol::{Command, Greeting, ParticipantNumber, read_frame, read_message, write_frame};
use tracing::{debug, info};

use crate::error::TransportError;
use crate::liveness::LivenessState;

/// Timeouts for establishing a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectOptions {
    pub connect_timeout: Duration,
    /// How long to wait for the server's greeting after the TCP connect.
    pub handshake_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            handshake_timeout: Duration::from_secs(5),
        }
    }
}

/// What the reader thread hands to the consumer.
enum Inbound {
    Command(Command),
    Closed(String),
}

/// A seated connection to the relay.
#[derive(Debug)]
pub struct Connection {
    participant: ParticipantNumber,
    settings: Settings,
    peer_addr: SocketAddr,
    /// Kept only to shut the socket down from `close`.
    stream: TcpStream,
    writer: Mutex<BufWriter<TcpStream>>,
    inbox: Mutex<Receiver<Inbound>>,
    requeued: Mutex<VecDeque<Command>>,
    closed: AtomicBool,
    liveness: Arc<LivenessState>,
    reader_thread: Mutex<Option<JoinHandle<()>>>,
}

impl Connection {
    /// Connect to a server, read the greeting and spawn the reader thread.
    pub fn connect(addr: &str, options: &ConnectOptions) -> Result<Arc<Self>, TransportError> {
        let sock_addr = addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("could not resolve {addr}"))
        })?;

        let stream =
            TcpStream::connect_timeout(&sock_addr, options.connect_timeout).map_err(timeout_aware)?;
        stream.set_nodelay(true).ok();
        stream.set_read_timeout(Some(options.handshake_timeout))?;

        let mut reader = BufReader::new(stream.try_clone()?);
        let bytes = read_message(&mut reader).map_err(timeout_aware)?;
        let welcome = match Greeting::parse(&bytes)? {
            Greeting::Welcome(welcome) => welcome,
            Greeting::Refused => {
                info!(%sock_addr, "server refused the connection");
                return Err(TransportError::Rejected);
            }
            Greeting::Unexpected(command) => {
                return Err(TransportError::ProtocolViolation(format!(
                    "expected a welcome, got {}",
                    command.tag()
                )));
            }
        };
        welcome.settings.validate().map_err(|e| {
            TransportError::ProtocolViolation(format!("server sent unusable settings: {e}"))
        })?;

        // Clear the handshake timeout for the long-lived reader loop.
        stream.set_read_timeout(None)?;
        info!(
            %sock_addr,
            participant = %welcome.participant,
            settings = ?welcome.settings,
            "connected"
        );

        let liveness = Arc::new(LivenessState::new());
        let (tx, rx) = mpsc::channel();
        let reader_liveness = liveness.clone();
        let reader_thread = thread::spawn(move || {
            reader_loop(reader, tx, &reader_liveness);
        });

        let writer = BufWriter::new(stream.try_clone()?);
        Ok(Arc::new(Self {
            participant: welcome.participant,
            settings: welcome.settings,
            peer_addr: sock_addr,
            stream,
            writer: Mutex::new(writer),
            inbox: Mutex::new(rx),
            requeued: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
            liveness,
            reader_thread: Mutex::new(Some(reader_thread)),
        }))
    }

    pub fn participant(&self) -> ParticipantNumber {
        self.participant
    }

    /// Settings received from the server; these override local settings.
    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn liveness(&self) -> &LivenessState {
        &self.liveness
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Send one command. Concurrent callers are serialized.
    pub fn send(&self, command: &Command) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let mut writer = lock(&self.writer);
        write_frame(&mut *writer, command)?;
        Ok(())
    }

    /// Block until the next command arrives.
    pub fn receive(&self) -> Result<Command, TransportError> {
        if let Some(command) = lock(&self.requeued).pop_front() {
            return Ok(command);
        }
        let inbox = lock(&self.inbox);
        match inbox.recv() {
            Ok(Inbound::Command(command)) => Ok(command),
            Ok(Inbound::Closed(reason)) => Err(self.mark_closed(&reason)),
            Err(_) => Err(self.mark_closed("reader thread gone")),
        }
    }

    /// Wait up to `timeout` for the next command. `Ok(None)` means nothing
    /// arrived in time.
    pub fn receive_timeout(&self, timeout: Duration) -> Result<Option<Command>, TransportError> {
        if let Some(command) = lock(&self.requeued).pop_front() {
            return Ok(Some(command));
        }
        let inbox = lock(&self.inbox);
        match inbox.recv_timeout(timeout) {
            Ok(Inbound::Command(command)) => Ok(Some(command)),
            Ok(Inbound::Closed(reason)) => Err(self.mark_closed(&reason)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(self.mark_closed("reader thread gone")),
        }
    }

    /// Put commands back in front of the inbox, keeping their order.
    pub fn requeue(&self, commands: Vec<Command>) {
        if commands.is_empty() {
            return;
        }
        let mut requeued = lock(&self.requeued);
        for command in commands.into_iter().rev() {
            requeued.push_front(command);
        }
    }

    /// Shut the socket down and wait for the reader thread. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let _ = self.stream.shutdown(Shutdown::Both);
        let handle = lock(&self.reader_thread).take();
        if let Some(handle) = handle {
            let _ = handle.join();
            debug!(peer = %self.peer_addr, "connection closed");
        }
    }

    fn mark_closed(&self, reason: &str) -> TransportError {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(peer = %self.peer_addr, reason, "connection lost");
        }
        TransportError::Closed
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Socket timeouts surface as `WouldBlock` or `TimedOut` depending on the
/// platform; report both as `TransportError::TimedOut`.
fn timeout_aware(err: io::Error) -> TransportError {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => TransportError::TimedOut,
        _ => TransportError::Io(err),
    }
}

/// Reader thread: read framed commands in a loop, push to channel.
fn reader_loop(mut reader: BufReader<TcpStream>, tx: Sender<Inbound>, liveness: &LivenessState) {
    loop {
        match read_frame::<_, Command>(&mut reader) {
            Ok(Command::HeartbeatAck(seq)) => liveness.acknowledge(seq),
            Ok(command) => {
                if tx.send(Inbound::Command(command)).is_err() {
                    break; // Connection dropped the receiver
                }
            }
            Err(e) => {
                let _ = tx.send(Inbound::Closed(e.to_string()));
                break;
            }
        }
    }
}
