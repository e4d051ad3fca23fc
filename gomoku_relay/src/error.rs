// Transport error taxonomy.
//
// Every I/O or decoding failure on a connection surfaces as a
// `TransportError`. The transport never retries or reconnects; the session
// decides what a failure means for the game.

use std::io;

use gomoku_protocol::WireError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("connection closed")]
    Closed,
    #[error("server refused the connection: both seats are taken")]
    Rejected,
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("peer stopped acknowledging heartbeats")]
    TimedOut,
}

impl From<WireError> for TransportError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::Io(e) => TransportError::Io(e),
            WireError::Serialization(e) => TransportError::Serialization(e),
        }
    }
}
