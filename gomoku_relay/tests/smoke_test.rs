// Integration smoke test for the relay server and client transport.
//
// Starts a server on localhost and drives it two ways: with plain framed TCP
// sockets (to check the wire behavior exactly) and with `Connection`,
// `MessageReader` and `LivenessMonitor` (to check the client side against the
// real relay). No session or board logic is involved beyond the wire types.

use std::io::{BufReader, BufWriter};
use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use gomoku_board::{CellState, Move, Settings};
use gomoku_protocol::{Command, ParticipantNumber, Welcome, read_frame, write_frame};
use gomoku_relay::server::{ServerConfig, start_server};
use gomoku_relay::{
    ConnectOptions, Connection, LivenessConfig, LivenessFailure, LivenessMonitor, MessageReader,
    ReaderEvent, TransportError,
};

fn test_config(settings: Settings) -> ServerConfig {
    ServerConfig {
        port: 0, // OS picks a free port
        bind_address: "127.0.0.1".into(),
        settings,
        ..ServerConfig::default()
    }
}

/// Connect a raw socket and read its Welcome.
fn raw_seat(addr: SocketAddr) -> (BufReader<TcpStream>, BufWriter<TcpStream>, Welcome) {
    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let writer = BufWriter::new(stream);
    let welcome: Welcome = read_frame(&mut reader).unwrap();
    (reader, writer, welcome)
}

fn recv(reader: &mut BufReader<TcpStream>) -> Command {
    read_frame(reader).unwrap()
}

fn send(writer: &mut BufWriter<TcpStream>, command: &Command) {
    write_frame(writer, command).unwrap();
}

fn connect(addr: SocketAddr) -> Arc<Connection> {
    Connection::connect(&addr.to_string(), &ConnectOptions::default()).unwrap()
}

#[test]
fn two_seats_then_refusal() {
    let settings = Settings::new(13, 4, true);
    let (handle, addr) = start_server(test_config(settings)).unwrap();

    let (_ra, _wa, welcome_a) = raw_seat(addr);
    let (_rb, _wb, welcome_b) = raw_seat(addr);
    assert_eq!(welcome_a.participant, ParticipantNumber(0));
    assert_eq!(welcome_b.participant, ParticipantNumber(1));
    assert_eq!(welcome_a.settings, settings);
    assert_eq!(welcome_b.settings, settings);

    // A third connection gets EXIT and is closed, through the client API too.
    let err = Connection::connect(&addr.to_string(), &ConnectOptions::default()).unwrap_err();
    assert!(matches!(err, TransportError::Rejected));

    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut late = BufReader::new(stream);
    assert_eq!(recv(&mut late), Command::Exit);
    assert!(read_frame::<_, Command>(&mut late).is_err());

    handle.stop();
}

#[test]
fn relays_moves_chat_and_control_commands() {
    let (handle, addr) = start_server(test_config(Settings::default())).unwrap();
    let (mut ra, mut wa, _) = raw_seat(addr);
    let (mut rb, mut wb, _) = raw_seat(addr);

    let mv = Command::Move(Move::new(7, 7, CellState::Black));
    send(&mut wa, &mv);
    assert_eq!(recv(&mut rb), mv);

    send(&mut wb, &Command::Message("nice opening".into()));
    assert_eq!(recv(&mut ra), Command::Message("nice opening".into()));

    // STOP_MESSAGES comes back to its sender; heartbeats are acked.
    send(&mut wa, &Command::StopMessages);
    assert_eq!(recv(&mut ra), Command::StopMessages);
    send(&mut wb, &Command::Heartbeat(11));
    assert_eq!(recv(&mut rb), Command::HeartbeatAck(11));

    handle.stop();
}

#[test]
fn commands_sent_before_opponent_arrives_are_delivered() {
    let (handle, addr) = start_server(test_config(Settings::default())).unwrap();
    let (_ra, mut wa, _) = raw_seat(addr);

    let mv = Command::Move(Move::new(0, 0, CellState::Black));
    send(&mut wa, &mv);
    // Let the relay handle the move before the second seat exists.
    thread::sleep(Duration::from_millis(100));

    let (mut rb, _wb, welcome_b) = raw_seat(addr);
    assert_eq!(welcome_b.participant, ParticipantNumber(1));
    assert_eq!(recv(&mut rb), mv);

    handle.stop();
}

#[test]
fn disconnect_sends_exit_and_server_finishes() {
    let (handle, addr) = start_server(test_config(Settings::default())).unwrap();
    let (mut ra, _wa, _) = raw_seat(addr);
    let (rb, wb, _) = raw_seat(addr);

    drop(rb);
    drop(wb);
    assert_eq!(recv(&mut ra), Command::Exit);
    drop(ra);
    drop(_wa);

    let deadline = Instant::now() + Duration::from_secs(5);
    while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert!(handle.is_finished());
    handle.stop();
}

#[test]
fn second_player_is_told_when_the_first_left_before_it_joined() {
    let (handle, addr) = start_server(test_config(Settings::default())).unwrap();
    let (ra, wa, welcome_a) = raw_seat(addr);
    assert_eq!(welcome_a.participant, ParticipantNumber(0));
    drop(ra);
    drop(wa);
    // Let the relay notice the departure before the second seat is filled.
    thread::sleep(Duration::from_millis(300));

    let b = connect(addr);
    assert_eq!(b.participant(), ParticipantNumber(1));
    assert_eq!(
        b.receive_timeout(Duration::from_secs(3)).unwrap(),
        Some(Command::Exit)
    );

    b.close();
    let deadline = Instant::now() + Duration::from_secs(5);
    while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert!(handle.is_finished());
    handle.stop();
}

#[test]
fn hung_seat_is_dropped_and_the_other_told() {
    let config = ServerConfig {
        seat_timeout: Some(Duration::from_millis(200)),
        ..test_config(Settings::default())
    };
    let (handle, addr) = start_server(config).unwrap();
    // Seat 0 stays connected but never sends anything.
    let (mut ra, _wa, _) = raw_seat(addr);
    let (mut rb, mut wb, _) = raw_seat(addr);

    let mut told = false;
    for seq in 0..100 {
        send(&mut wb, &Command::Heartbeat(seq));
        match recv(&mut rb) {
            Command::HeartbeatAck(_) => thread::sleep(Duration::from_millis(20)),
            Command::Exit => {
                told = true;
                break;
            }
            other => panic!("unexpected {other:?}"),
        }
    }
    assert!(told, "the live seat never heard that the hung one was dropped");
    assert!(read_frame::<_, Command>(&mut ra).is_err());

    handle.stop();
}

#[test]
fn connection_round_trip_through_relay() {
    let (handle, addr) = start_server(test_config(Settings::new(9, 5, false))).unwrap();
    let a = connect(addr);
    let b = connect(addr);
    assert_eq!(a.participant(), ParticipantNumber(0));
    assert_eq!(b.participant(), ParticipantNumber(1));
    assert_eq!(b.settings(), Settings::new(9, 5, false));

    let mv = Command::Move(Move::new(4, 4, CellState::Black));
    a.send(&mv).unwrap();
    assert_eq!(b.receive().unwrap(), mv);

    a.send(&Command::Exit).unwrap();
    assert_eq!(b.receive().unwrap(), Command::Exit);

    a.close();
    b.close();
    handle.stop();
}

#[test]
fn message_reader_drains_chat_until_stopped() {
    let (handle, addr) = start_server(test_config(Settings::default())).unwrap();
    let a = connect(addr);
    let b = connect(addr);

    let (tx, rx) = mpsc::channel();
    let reader = MessageReader::start(a.clone(), move |event| {
        let _ = tx.send(event);
    });

    b.send(&Command::Message("hello".into())).unwrap();
    b.send(&Command::Message("still there?".into())).unwrap();
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        ReaderEvent::Chat("hello".into())
    );
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        ReaderEvent::Chat("still there?".into())
    );

    reader.stop().unwrap();

    // After the reader stops, moves reach the primary reader again.
    let mv = Command::Move(Move::new(1, 1, CellState::White));
    b.send(&mv).unwrap();
    assert_eq!(a.receive().unwrap(), mv);

    a.close();
    b.close();
    handle.stop();
}

#[test]
fn message_reader_hands_back_commands_it_should_not_consume() {
    let (handle, addr) = start_server(test_config(Settings::default())).unwrap();
    let a = connect(addr);
    let b = connect(addr);

    let (tx, rx) = mpsc::channel();
    let reader = MessageReader::start(a.clone(), move |event| {
        let _ = tx.send(event);
    });

    let mv = Command::Move(Move::new(2, 3, CellState::White));
    b.send(&mv).unwrap();
    b.send(&Command::Message("after the move".into())).unwrap();
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        ReaderEvent::Chat("after the move".into())
    );

    reader.stop().unwrap();
    assert_eq!(a.receive().unwrap(), mv);

    a.close();
    b.close();
    handle.stop();
}

#[test]
fn message_reader_reports_peer_exit() {
    let (handle, addr) = start_server(test_config(Settings::default())).unwrap();
    let a = connect(addr);
    let b = connect(addr);

    let (tx, rx) = mpsc::channel();
    let reader = MessageReader::start(a.clone(), move |event| {
        let _ = tx.send(event);
    });

    b.close();
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        ReaderEvent::PeerExit
    );
    reader.cancel();

    a.close();
    handle.stop();
}

#[test]
fn liveness_stays_quiet_while_server_acks() {
    let (handle, addr) = start_server(test_config(Settings::default())).unwrap();
    let a = connect(addr);
    let _b = connect(addr);

    let config = LivenessConfig {
        interval: Duration::from_millis(50),
        timeout_factor: 3,
    };
    let (tx, rx) = mpsc::channel();
    let mut monitor = LivenessMonitor::start(a.clone(), config, move |failure| {
        let _ = tx.send(failure);
    });

    thread::sleep(Duration::from_millis(500));
    assert!(!monitor.is_timed_out());
    assert!(rx.try_recv().is_err());
    assert!(a.liveness().last_ack() >= 1);

    monitor.stop_pinging();
    a.close();
    handle.stop();
}

#[test]
fn liveness_reports_send_failure_after_close() {
    let (handle, addr) = start_server(test_config(Settings::default())).unwrap();
    let a = connect(addr);
    let _b = connect(addr);
    a.close();

    let config = LivenessConfig {
        interval: Duration::from_millis(20),
        timeout_factor: 3,
    };
    let (tx, rx) = mpsc::channel();
    let _monitor = LivenessMonitor::start(a.clone(), config, move |failure| {
        let _ = tx.send(failure);
    });

    let failure = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(matches!(failure, LivenessFailure::SendFailed(_)));
    handle.stop();
}
