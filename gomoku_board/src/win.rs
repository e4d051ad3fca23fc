// Win and draw detection.
//
// Only the last placed stone can have created a new line, so the scan is
// seeded from it: for each of the four axes (horizontal, vertical and the two
// diagonals) walk outward in both directions collecting contiguous stones of
// the same colour. The cost is bounded by the board edge per axis and does
// not depend on how many moves have been played.
//
// Two rules decide whether a run wins, selected by the explicit
// `strict_exact_length` setting:
// - at-least-N: any run of `win_length` or more stones wins.
// - exact-N: the run must be exactly `win_length` long; an overline of the
//   same colour does not win.
//
// A draw is declared when no free fields remain and the final move did not
// win.

use crate::board::Board;
use crate::types::{CellState, Coord, Move};

/// Axis step vectors: horizontal, vertical, main diagonal, anti-diagonal.
const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// How a game ended after a move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The mover completed a line. Cells are ordered from one end of the run
    /// to the other.
    Won(Vec<Coord>),
    /// Board full without a winner.
    Draw,
}

/// Whether a contiguous run of `run` stones satisfies the win rule.
pub fn run_wins(run: usize, win_length: usize, strict_exact_length: bool) -> bool {
    if strict_exact_length {
        run == win_length
    } else {
        run >= win_length
    }
}

impl Board {
    /// Scan the four axes through `last` for a winning line. Returns `None`
    /// when the cell does not hold `last.state` or no axis qualifies.
    pub fn winning_line(&self, last: &Move) -> Option<Vec<Coord>> {
        if !last.state.is_stone() || self.get(last.row, last.col) != Some(last.state) {
            return None;
        }
        AXES.iter()
            .map(|&axis| self.run_through(last, axis))
            .find(|run| run_wins(run.len(), self.win_length, self.strict_exact_length))
    }

    /// Outcome after `last` was applied, or `None` if the game continues.
    pub fn verdict(&self, last: &Move) -> Option<Verdict> {
        if let Some(line) = self.winning_line(last) {
            return Some(Verdict::Won(line));
        }
        if self.is_full() {
            return Some(Verdict::Draw);
        }
        None
    }

    /// Would placing `state` at `(row, col)` win? Does not modify the board.
    pub fn would_win(&self, row: usize, col: usize, state: CellState) -> bool {
        let mut probe = self.clone();
        match probe.apply(row, col, state) {
            Ok(mv) => probe.winning_line(&mv).is_some(),
            Err(_) => false,
        }
    }

    /// Contiguous run of `last.state` along `axis`, ordered from the
    /// negative end to the positive end.
    fn run_through(&self, last: &Move, (dr, dc): (isize, isize)) -> Vec<Coord> {
        let (row, col) = (last.row as isize, last.col as isize);
        let same = |r: isize, c: isize| self.get_signed(r, c) == Some(last.state);

        // Walk back to the start of the run.
        let mut steps_back = 0;
        while same(row - dr * (steps_back + 1), col - dc * (steps_back + 1)) {
            steps_back += 1;
        }

        let mut run = Vec::new();
        let (mut r, mut c) = (row - dr * steps_back, col - dc * steps_back);
        while same(r, c) {
            run.push(Coord::new(r as usize, c as usize));
            r += dr;
            c += dc;
        }
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Settings;

    fn board(size: usize, win_length: usize, strict: bool) -> Board {
        Board::new(&Settings::new(size, win_length, strict)).unwrap()
    }

    fn coords(cells: &[(usize, usize)]) -> Vec<Coord> {
        cells.iter().map(|&(r, c)| Coord::new(r, c)).collect()
    }

    #[test]
    fn scenario_row_of_three_on_small_board() {
        let mut b = board(7, 3, false);
        let moves = [
            (0, 0, CellState::Black),
            (5, 5, CellState::White),
            (0, 1, CellState::Black),
            (6, 1, CellState::White),
        ];
        for (r, c, s) in moves {
            let mv = b.apply(r, c, s).unwrap();
            assert_eq!(b.verdict(&mv), None);
        }
        let last = b.apply(0, 2, CellState::Black).unwrap();
        assert_eq!(
            b.verdict(&last),
            Some(Verdict::Won(coords(&[(0, 0), (0, 1), (0, 2)])))
        );
    }

    #[test]
    fn vertical_and_diagonal_lines() {
        let mut b = board(9, 4, false);
        for r in 2..5 {
            b.apply(r, 6, CellState::White).unwrap();
        }
        let mv = b.apply(5, 6, CellState::White).unwrap();
        assert_eq!(
            b.winning_line(&mv),
            Some(coords(&[(2, 6), (3, 6), (4, 6), (5, 6)]))
        );

        let mut b = board(9, 4, false);
        for (r, c) in [(0, 8), (1, 7), (3, 5)] {
            b.apply(r, c, CellState::Black).unwrap();
        }
        let mv = b.apply(2, 6, CellState::Black).unwrap();
        assert_eq!(
            b.winning_line(&mv),
            Some(coords(&[(0, 8), (1, 7), (2, 6), (3, 5)]))
        );
    }

    #[test]
    fn loose_rule_detects_win_at_kth_stone() {
        // K+1 colinear stones placed in order: the win is already reported
        // when the Kth one lands.
        for k in [3, 4, 5] {
            let mut b = board(11, k, false);
            for col in 0..k - 1 {
                let mv = b.apply(4, col, CellState::Black).unwrap();
                assert!(b.winning_line(&mv).is_none());
            }
            let kth = b.apply(4, k - 1, CellState::Black).unwrap();
            assert_eq!(b.winning_line(&kth).map(|l| l.len()), Some(k));
        }
    }

    #[test]
    fn loose_rule_accepts_overline() {
        let mut b = board(9, 4, false);
        for col in [0, 1, 3, 4] {
            b.apply(0, col, CellState::Black).unwrap();
        }
        let mv = b.apply(0, 2, CellState::Black).unwrap();
        assert_eq!(b.winning_line(&mv).map(|l| l.len()), Some(5));
    }

    #[test]
    fn strict_rule_rejects_overline() {
        let mut b = board(9, 4, true);
        for col in [0, 1, 3, 4] {
            b.apply(0, col, CellState::Black).unwrap();
        }
        let mv = b.apply(0, 2, CellState::Black).unwrap();
        assert_eq!(b.winning_line(&mv), None);
        assert_eq!(b.verdict(&mv), None);
    }

    #[test]
    fn strict_rule_accepts_exact_run() {
        let mut b = board(9, 4, true);
        for col in 1..4 {
            b.apply(0, col, CellState::Black).unwrap();
        }
        let mv = b.apply(0, 4, CellState::Black).unwrap();
        assert_eq!(
            b.winning_line(&mv),
            Some(coords(&[(0, 1), (0, 2), (0, 3), (0, 4)]))
        );
    }

    #[test]
    fn strict_rule_wins_on_other_axis_despite_overline() {
        let mut b = board(9, 3, true);
        // Horizontal overline through (2, 2) and an exact vertical three.
        for col in [0, 1, 3] {
            b.apply(2, col, CellState::Black).unwrap();
        }
        for row in [3, 4] {
            b.apply(row, 2, CellState::Black).unwrap();
        }
        let mv = b.apply(2, 2, CellState::Black).unwrap();
        assert_eq!(
            b.winning_line(&mv),
            Some(coords(&[(2, 2), (3, 2), (4, 2)]))
        );
    }

    #[test]
    fn opponent_stones_break_a_run() {
        let mut b = board(7, 3, false);
        b.apply(0, 0, CellState::Black).unwrap();
        b.apply(0, 1, CellState::White).unwrap();
        b.apply(0, 2, CellState::Black).unwrap();
        let mv = b.apply(0, 3, CellState::Black).unwrap();
        assert_eq!(b.winning_line(&mv), None);
    }

    #[test]
    fn full_board_without_line_is_draw() {
        // 7x7, win length 5. Rows alternate colour in pairs of columns so
        // no colour ever gets five in any direction.
        let mut b = board(7, 5, false);
        let mut last = None;
        for row in 0..7 {
            for col in 0..7 {
                let black = ((col / 2) + row) % 2 == 0;
                let state = if black {
                    CellState::Black
                } else {
                    CellState::White
                };
                let mv = b.apply(row, col, state).unwrap();
                if b.free_fields() > 0 {
                    assert!(b.winning_line(&mv).is_none(), "unexpected win at {mv:?}");
                }
                last = Some(mv);
            }
        }
        assert_eq!(b.free_fields(), 0);
        assert_eq!(b.verdict(&last.unwrap()), Some(Verdict::Draw));
    }

    #[test]
    fn would_win_does_not_touch_board() {
        let mut b = board(7, 3, false);
        b.apply(1, 1, CellState::White).unwrap();
        b.apply(1, 2, CellState::White).unwrap();
        assert!(b.would_win(1, 3, CellState::White));
        assert!(!b.would_win(1, 3, CellState::Black));
        assert!(b.is_empty_at(1, 3));
        assert_eq!(b.free_fields(), 47);
    }

    #[test]
    fn run_rule_table() {
        assert!(run_wins(5, 5, true));
        assert!(!run_wins(6, 5, true));
        assert!(run_wins(6, 5, false));
        assert!(!run_wins(4, 5, false));
    }
}
