// Connection handshake.
//
// Immediately after accepting a seat the server sends one `Welcome` frame
// carrying the seat number and the authoritative game settings. There is no
// version negotiation: both ends are assumed to run compatible builds.
//
// A connection the server refuses (both seats taken) gets a bare
// `Command::Exit` frame instead and is closed. `Greeting::parse` tells the
// two apart on the client side.

use gomoku_board::Settings;
use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::types::ParticipantNumber;

/// First frame on an accepted connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Welcome {
    pub participant: ParticipantNumber,
    pub settings: Settings,
}

/// What a client can receive as its first frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Greeting {
    Welcome(Welcome),
    /// The server refused the connection.
    Refused,
    /// Any other command: a protocol violation.
    Unexpected(Command),
}

impl Greeting {
    /// Decode the first frame's JSON payload.
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        if let Ok(welcome) = serde_json::from_slice::<Welcome>(payload) {
            return Ok(Greeting::Welcome(welcome));
        }
        match serde_json::from_slice::<Command>(payload)? {
            Command::Exit => Ok(Greeting::Refused),
            other => Ok(Greeting::Unexpected(other)),
        }
    }
}
