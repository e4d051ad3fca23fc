// Core types shared by the board, the wire protocol and the session.
//
// Defines cell states (`CellState`), grid coordinates (`Coord`), the
// immutable `Move` triple and the per-session `Settings`. All types derive
// `Serialize` and `Deserialize` because moves and settings travel over the
// network (see `gomoku_protocol`).
//
// Participant A always plays `Black` and moves first; participant B plays
// `White`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SettingsError;

/// Supported board edge lengths.
pub const BOARD_SIZES: [usize; 5] = [7, 9, 11, 13, 15];

/// Supported winning run lengths.
pub const WIN_LENGTHS: [usize; 3] = [3, 4, 5];

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// State of a single board cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Empty,
    /// Participant A's stones.
    Black,
    /// Participant B's stones.
    White,
}

impl CellState {
    /// The opposing stone colour. `Empty` has no opponent and maps to itself.
    pub fn opponent(self) -> Self {
        match self {
            CellState::Black => CellState::White,
            CellState::White => CellState::Black,
            CellState::Empty => CellState::Empty,
        }
    }

    pub fn is_stone(self) -> bool {
        self != CellState::Empty
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellState::Empty => "empty",
            CellState::Black => "black",
            CellState::White => "white",
        };
        f.write_str(name)
    }
}

/// A cell position. Row 0 is the top edge, column 0 the left edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A stone placement. Created by a participant, consumed once by
/// `Board::apply`, then kept only as the "last move" for win scanning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub row: usize,
    pub col: usize,
    pub state: CellState,
}

impl Move {
    pub const fn new(row: usize, col: usize, state: CellState) -> Self {
        Self { row, col, state }
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Per-session game settings. In a networked game the server's copy is
/// authoritative and every client adopts it on connect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Edge length of the square board; one of `BOARD_SIZES`.
    pub board_size: usize,
    /// Stones in a row needed to win; one of `WIN_LENGTHS`.
    pub win_length: usize,
    /// When set, only a run of exactly `win_length` wins. An overline
    /// (longer run of the same colour) does not count.
    pub strict_exact_length: bool,
    /// Local-vs-computer only: the computer takes participant A (black).
    pub computer_starts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            board_size: 15,
            win_length: 5,
            strict_exact_length: false,
            computer_starts: false,
        }
    }
}

impl Settings {
    pub fn new(board_size: usize, win_length: usize, strict_exact_length: bool) -> Self {
        Self {
            board_size,
            win_length,
            strict_exact_length,
            computer_starts: false,
        }
    }

    /// Check the settings against the supported sizes and lengths.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !BOARD_SIZES.contains(&self.board_size) {
            return Err(SettingsError::BoardSize(self.board_size));
        }
        if !WIN_LENGTHS.contains(&self.win_length) {
            return Err(SettingsError::WinLength(self.win_length));
        }
        Ok(())
    }

    /// Replace the game-shaping fields with another side's settings, keeping
    /// local-only preferences. Used when a client adopts server settings.
    pub fn adopt(&mut self, authoritative: &Settings) {
        self.board_size = authoritative.board_size;
        self.win_length = authoritative.win_length;
        self.strict_exact_length = authoritative.strict_exact_length;
    }
}
