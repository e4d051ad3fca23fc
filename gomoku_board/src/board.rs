// Logical board state.
//
// `Board` is an N×N grid of `CellState`s plus the bookkeeping the session
// needs: the number of free fields left and the last accepted move. It is
// owned by the session's control loop for one game and replaced wholesale
// when a new game starts or the settings change.
//
// Invariant: exactly the cells set by accepted moves are non-empty, and
// `free_fields == size² − accepted moves`. `apply` is the only mutator and it
// leaves the board untouched when it rejects a move.
//
// Win and draw detection lives in `win.rs` as further `impl Board` methods.

use crate::error::{IllegalMove, SettingsError};
use crate::types::{CellState, Coord, Move, Settings};

/// Game board for a single session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    pub(crate) win_length: usize,
    pub(crate) strict_exact_length: bool,
    cells: Vec<CellState>,
    free_fields: usize,
    last_move: Option<Move>,
}

impl Board {
    /// Create an empty board shaped by `settings`.
    pub fn new(settings: &Settings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let size = settings.board_size;
        Ok(Self {
            size,
            win_length: settings.win_length,
            strict_exact_length: settings.strict_exact_length,
            cells: vec![CellState::Empty; size * size],
            free_fields: size * size,
            last_move: None,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn win_length(&self) -> usize {
        self.win_length
    }

    pub fn strict_exact_length(&self) -> bool {
        self.strict_exact_length
    }

    /// Number of empty cells. Decreases by exactly one per accepted move.
    pub fn free_fields(&self) -> usize {
        self.free_fields
    }

    pub fn is_full(&self) -> bool {
        self.free_fields == 0
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size
    }

    /// State of the cell at `(row, col)`, or `None` off the board.
    pub fn get(&self, row: usize, col: usize) -> Option<CellState> {
        if self.in_bounds(row, col) {
            Some(self.cells[row * self.size + col])
        } else {
            None
        }
    }

    /// Like `get`, but with signed coordinates so scans can step past the
    /// edges without underflow.
    pub(crate) fn get_signed(&self, row: isize, col: isize) -> Option<CellState> {
        if row < 0 || col < 0 {
            return None;
        }
        self.get(row as usize, col as usize)
    }

    pub fn is_empty_at(&self, row: usize, col: usize) -> bool {
        self.get(row, col) == Some(CellState::Empty)
    }

    /// Check whether `state` could be placed at `(row, col)` without
    /// changing anything.
    pub fn check(&self, row: usize, col: usize, state: CellState) -> Result<(), IllegalMove> {
        if !self.in_bounds(row, col) {
            return Err(IllegalMove::OutOfRange {
                row,
                col,
                size: self.size,
            });
        }
        if !state.is_stone() {
            return Err(IllegalMove::EmptyStone { row, col });
        }
        if !self.is_empty_at(row, col) {
            return Err(IllegalMove::Occupied { row, col });
        }
        Ok(())
    }

    /// Place a stone. Fails when the cell is occupied, off the board, or the
    /// requested state is `Empty`; the board is unchanged on failure.
    pub fn apply(&mut self, row: usize, col: usize, state: CellState) -> Result<Move, IllegalMove> {
        self.check(row, col, state)?;
        self.cells[row * self.size + col] = state;
        self.free_fields -= 1;
        let mv = Move::new(row, col, state);
        self.last_move = Some(mv);
        Ok(mv)
    }

    /// Apply a `Move` value (for example one received from a peer).
    pub fn apply_move(&mut self, mv: &Move) -> Result<Move, IllegalMove> {
        self.apply(mv.row, mv.col, mv.state)
    }

    /// All empty cells in row-major order.
    pub fn empty_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == CellState::Empty)
            .map(|(i, _)| Coord::new(i / self.size, i % self.size))
    }

    /// Human-readable cell label: column letter then 1-based row, so
    /// `(0, 2)` is `C1` and `(14, 14)` is `O15`.
    pub fn field_name(&self, row: usize, col: usize) -> String {
        field_name(row, col)
    }
}

/// Cell label independent of any particular board.
pub fn field_name(row: usize, col: usize) -> String {
    let letter = char::from(b'A' + (col % 26) as u8);
    format!("{letter}{}", row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(size: usize) -> Board {
        Board::new(&Settings::new(size, 5, false)).unwrap()
    }

    #[test]
    fn new_board_is_empty() {
        let b = board(9);
        assert_eq!(b.size(), 9);
        assert_eq!(b.free_fields(), 81);
        assert!(b.last_move().is_none());
        assert_eq!(b.empty_cells().count(), 81);
    }

    #[test]
    fn rejects_invalid_settings() {
        let err = Board::new(&Settings::new(10, 5, false)).unwrap_err();
        assert_eq!(err, SettingsError::BoardSize(10));
    }

    #[test]
    fn apply_places_stone_and_counts_down() {
        let mut b = board(7);
        let mv = b.apply(3, 4, CellState::Black).unwrap();
        assert_eq!(mv, Move::new(3, 4, CellState::Black));
        assert_eq!(b.get(3, 4), Some(CellState::Black));
        assert_eq!(b.free_fields(), 48);
        assert_eq!(b.last_move(), Some(mv));
    }

    #[test]
    fn occupied_cell_is_rejected_and_board_unchanged() {
        let mut b = board(7);
        b.apply(2, 2, CellState::Black).unwrap();
        let before = b.clone();

        let err = b.apply(2, 2, CellState::White).unwrap_err();
        assert_eq!(err, IllegalMove::Occupied { row: 2, col: 2 });
        assert_eq!(b, before);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mut b = board(7);
        let err = b.apply(7, 0, CellState::Black).unwrap_err();
        assert_eq!(
            err,
            IllegalMove::OutOfRange {
                row: 7,
                col: 0,
                size: 7
            }
        );
        assert_eq!(b.free_fields(), 49);
    }

    #[test]
    fn empty_stone_is_rejected() {
        let mut b = board(7);
        assert_eq!(
            b.apply(0, 0, CellState::Empty).unwrap_err(),
            IllegalMove::EmptyStone { row: 0, col: 0 }
        );
    }

    #[test]
    fn free_fields_reach_zero_and_stop() {
        let mut b = board(7);
        let mut state = CellState::Black;
        for row in 0..7 {
            for col in 0..7 {
                let before = b.free_fields();
                b.apply(row, col, state).unwrap();
                assert_eq!(b.free_fields(), before - 1);
                state = state.opponent();
            }
        }
        assert!(b.is_full());
        assert!(b.apply(0, 0, CellState::Black).is_err());
        assert_eq!(b.free_fields(), 0);
    }

    #[test]
    fn field_names() {
        let b = board(15);
        assert_eq!(b.field_name(0, 0), "A1");
        assert_eq!(b.field_name(0, 2), "C1");
        assert_eq!(b.field_name(14, 14), "O15");
    }
}
