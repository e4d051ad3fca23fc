// Participant numbering for networked games.
//
// The server seats connections in accept order: the first becomes
// participant 0 and plays black (moves first), the second becomes
// participant 1 and plays white.

use gomoku_board::CellState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned seat number, 0 or 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantNumber(pub u8);

impl ParticipantNumber {
    pub const FIRST: Self = Self(0);
    pub const SECOND: Self = Self(1);

    /// Stone colour played by this seat.
    pub fn stone(self) -> CellState {
        if self.0 == 0 {
            CellState::Black
        } else {
            CellState::White
        }
    }

    /// The other seat.
    pub fn other(self) -> Self {
        if self.0 == 0 { Self::SECOND } else { Self::FIRST }
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for ParticipantNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
