// gomoku_protocol: wire protocol for networked Gomoku.
//
// This crate defines the messages, framing and serialization shared by the
// relay server (`gomoku_relay::server`) and game clients
// (`gomoku_relay::client`). It depends only on `gomoku_board` for the `Move`
// and `Settings` payload types.
//
// Module overview:
// - `types.rs`:     `ParticipantNumber`, the seat a client was given.
// - `command.rs`:   `Command` envelope (MOVE / MESSAGE / EXIT / STOP_MESSAGES
//                   plus the heartbeat marker) and its `CommandTag`.
// - `handshake.rs`: `Welcome` (seat + authoritative settings) and the
//                   client-side `Greeting` classifier.
// - `framing.rs`:   Length-delimited framing over any `Read`/`Write` stream:
//                   4-byte big-endian length prefix, then JSON payload.
//
// Design decisions:
// - **JSON serialization.** Externally tagged serde enums give a stable,
//   order-preserving encoding that both ends decode identically.
// - **No schema negotiation.** Peers are assumed to run compatible builds;
//   a mismatch shows up as a serialization error and ends the connection.
// - **No async runtime.** Framing uses `std::io::Read`/`Write`, compatible
//   with blocking TCP streams and buffered wrappers.

pub mod command;
pub mod framing;
pub mod handshake;
pub mod types;

pub use command::{Command, CommandTag};
pub use framing::{MAX_MESSAGE_SIZE, WireError, read_frame, read_message, write_frame, write_message};
pub use handshake::{Greeting, Welcome};
pub use types::ParticipantNumber;

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use gomoku_board::{CellState, Move, Settings};

    use super::*;

    /// Frame a Command, read it back and compare.
    fn command_roundtrip(cmd: &Command) {
        let mut wire = Vec::new();
        write_frame(&mut wire, cmd).unwrap();

        let mut cursor = Cursor::new(&wire);
        let recovered: Command = read_frame(&mut cursor).unwrap();
        assert_eq!(&recovered, cmd);
    }

    #[test]
    fn roundtrip_move() {
        command_roundtrip(&Command::Move(Move::new(0, 2, CellState::Black)));
        command_roundtrip(&Command::Move(Move::new(14, 14, CellState::White)));
    }

    #[test]
    fn roundtrip_message() {
        command_roundtrip(&Command::Message("good luck!".into()));
    }

    #[test]
    fn roundtrip_message_unicode_and_empty() {
        command_roundtrip(&Command::Message("Powodzenia, gracz \u{2192} \u{1F600}".into()));
        command_roundtrip(&Command::Message(String::new()));
    }

    #[test]
    fn roundtrip_exit() {
        command_roundtrip(&Command::Exit);
    }

    #[test]
    fn roundtrip_stop_messages() {
        command_roundtrip(&Command::StopMessages);
    }

    #[test]
    fn roundtrip_heartbeat_pair() {
        command_roundtrip(&Command::Heartbeat(7));
        command_roundtrip(&Command::HeartbeatAck(7));
    }

    #[test]
    fn encoding_is_externally_tagged() {
        let json = serde_json::to_string(&Command::Exit).unwrap();
        assert_eq!(json, r#""Exit""#);
        let json = serde_json::to_string(&Command::Move(Move::new(1, 2, CellState::White))).unwrap();
        assert_eq!(json, r#"{"Move":{"row":1,"col":2,"state":"White"}}"#);
    }

    #[test]
    fn tags_match_variants() {
        assert_eq!(Command::Exit.tag(), CommandTag::Exit);
        assert_eq!(Command::StopMessages.tag(), CommandTag::StopMessages);
        assert_eq!(Command::Message("x".into()).tag(), CommandTag::Message);
        assert_eq!(CommandTag::StopMessages.to_string(), "STOP_MESSAGES");
        assert!(Command::Heartbeat(1).is_liveness());
        assert!(!Command::Exit.is_liveness());
    }

    #[test]
    fn greeting_welcome() {
        let welcome = Welcome {
            participant: ParticipantNumber(1),
            settings: Settings::new(9, 4, true),
        };
        let json = serde_json::to_vec(&welcome).unwrap();
        assert_eq!(Greeting::parse(&json).unwrap(), Greeting::Welcome(welcome));
    }

    #[test]
    fn greeting_refused_on_exit() {
        let json = serde_json::to_vec(&Command::Exit).unwrap();
        assert_eq!(Greeting::parse(&json).unwrap(), Greeting::Refused);
    }

    #[test]
    fn greeting_unexpected_command() {
        let json = serde_json::to_vec(&Command::StopMessages).unwrap();
        assert_eq!(
            Greeting::parse(&json).unwrap(),
            Greeting::Unexpected(Command::StopMessages)
        );
        assert!(Greeting::parse(b"[1,2]").is_err());
    }

    #[test]
    fn participant_numbers_map_to_stones() {
        assert_eq!(ParticipantNumber::FIRST.stone(), CellState::Black);
        assert_eq!(ParticipantNumber::SECOND.stone(), CellState::White);
        assert_eq!(ParticipantNumber::FIRST.other(), ParticipantNumber::SECOND);
    }
}
