// gomoku_board: logical board and win detection for Gomoku.
//
// This crate holds the game rules and nothing else: no I/O, no threads. It is
// shared by the wire protocol (moves and settings are wire types), the relay
// server (settings only) and the session control loop (which owns the
// `Board` for the duration of one game).
//
// Module overview:
// - `types.rs`:  `CellState`, `Coord`, `Move`, `Settings` and the supported
//                board sizes / win lengths.
// - `board.rs`:  `Board`: grid state, move legality, free-field counting,
//                human-readable cell labels.
// - `win.rs`:    last-move seeded win scan (exact-N or at-least-N rule) and
//                draw detection, returning a `Verdict`.
// - `error.rs`:  `IllegalMove` and `SettingsError`.

pub mod board;
pub mod error;
pub mod types;
pub mod win;

pub use board::{Board, field_name};
pub use error::{IllegalMove, SettingsError};
pub use types::{BOARD_SIZES, CellState, Coord, Move, Settings, WIN_LENGTHS};
pub use win::{Verdict, run_wins};
