// Rejection loop for connections beyond the two seats.
//
// Once both seats are handed out, the listener thread calls `deny_loop` and
// stays in it for the rest of the server's life. Every further connection is
// sent a single EXIT frame and closed straight away, so a latecomer's
// handshake fails fast with `TransportError::Rejected` instead of hanging.
//
// This loop touches only the listener and the late sockets; it never sees
// the seated connections, which are owned by the main loop.

use std::io::{BufWriter, ErrorKind};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use gomoku_protocol::{Command, write_frame};
use tracing::{info, warn};

/// Pause between accept attempts on the non-blocking listener.
pub const ACCEPT_POLL: Duration = Duration::from_millis(20);

/// Refuse every connection on `listener` until `keep_running` goes false.
/// The listener must already be non-blocking.
pub fn deny_loop(listener: &TcpListener, keep_running: &AtomicBool) {
    while keep_running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, addr)) => {
                info!(%addr, "refusing connection: both seats are taken");
                refuse(stream);
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                warn!(error = %e, "accept failed in deny loop");
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

/// Send EXIT and close. Errors are ignored; the peer may already be gone.
pub fn refuse(stream: TcpStream) {
    stream.set_nonblocking(false).ok();
    let mut writer = BufWriter::new(stream);
    let _ = write_frame(&mut writer, &Command::Exit);
    let _ = writer.get_ref().shutdown(Shutdown::Both);
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;
    use std::sync::Arc;

    use gomoku_protocol::read_frame;

    use super::*;

    #[test]
    fn late_connections_get_exit_then_eof() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        listener.set_nonblocking(true).unwrap();
        let keep_running = Arc::new(AtomicBool::new(true));

        let flag = keep_running.clone();
        let thread = thread::spawn(move || deny_loop(&listener, &flag));

        for _ in 0..2 {
            let stream = TcpStream::connect(addr).unwrap();
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .unwrap();
            let mut reader = BufReader::new(stream);
            let first: Command = read_frame(&mut reader).unwrap();
            assert_eq!(first, Command::Exit);
            assert!(read_frame::<_, Command>(&mut reader).is_err());
        }

        keep_running.store(false, Ordering::SeqCst);
        thread.join().unwrap();
    }
}
