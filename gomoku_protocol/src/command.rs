// The command envelope exchanged between networked peers.
//
// Every frame after the handshake carries one `Command`. The four game
// commands are relayed by the server to the other seat:
// - `Move`: a stone placement, already validated by the sender's own board.
//   The receiver trusts it and replays it verbatim.
// - `Message`: a chat line for display.
// - `Exit`: the sender is leaving; the game is over for both sides.
// - `StopMessages`: ends the sender's background chat drain. The server
//   echoes it back to the sender so the drain sees a clean boundary.
//
// `Heartbeat` / `HeartbeatAck` are the liveness marker. The server answers a
// heartbeat with an ack carrying the same sequence number and never relays
// either of them.
//
// Serialized with serde's default externally tagged representation, e.g.
// `{"Move":{"row":0,"col":2,"state":"Black"}}` or `"Exit"`.

use gomoku_board::Move;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single protocol command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Move(Move),
    Message(String),
    Exit,
    StopMessages,
    Heartbeat(u64),
    HeartbeatAck(u64),
}

/// Payload-free discriminant of a `Command`, for logging and dispatch tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandTag {
    Move,
    Message,
    Exit,
    StopMessages,
    Heartbeat,
    HeartbeatAck,
}

impl Command {
    pub fn tag(&self) -> CommandTag {
        match self {
            Command::Move(_) => CommandTag::Move,
            Command::Message(_) => CommandTag::Message,
            Command::Exit => CommandTag::Exit,
            Command::StopMessages => CommandTag::StopMessages,
            Command::Heartbeat(_) => CommandTag::Heartbeat,
            Command::HeartbeatAck(_) => CommandTag::HeartbeatAck,
        }
    }

    /// Liveness traffic is consumed by the transport and never reaches the
    /// game.
    pub fn is_liveness(&self) -> bool {
        matches!(self, Command::Heartbeat(_) | Command::HeartbeatAck(_))
    }
}

impl fmt::Display for CommandTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandTag::Move => "MOVE",
            CommandTag::Message => "MESSAGE",
            CommandTag::Exit => "EXIT",
            CommandTag::StopMessages => "STOP_MESSAGES",
            CommandTag::Heartbeat => "HEARTBEAT",
            CommandTag::HeartbeatAck => "HEARTBEAT_ACK",
        };
        f.write_str(name)
    }
}
