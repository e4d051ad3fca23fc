// Error types for board operations and settings validation.

use thiserror::Error;

/// A rejected stone placement. Recoverable: the caller asks the participant
/// for another move and the board is left untouched.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IllegalMove {
    #[error("cell ({row}, {col}) is outside the {size}x{size} board")]
    OutOfRange { row: usize, col: usize, size: usize },
    #[error("cell ({row}, {col}) is already occupied")]
    Occupied { row: usize, col: usize },
    #[error("cannot place an empty stone at ({row}, {col})")]
    EmptyStone { row: usize, col: usize },
}

/// Settings outside the supported ranges.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("unsupported board size {0} (expected one of 7, 9, 11, 13, 15)")]
    BoardSize(usize),
    #[error("unsupported win length {0} (expected one of 3, 4, 5)")]
    WinLength(usize),
}
