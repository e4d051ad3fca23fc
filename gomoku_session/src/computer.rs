// Computer opponent.
//
// A deliberately simple placeholder: take a winning cell if there is one,
// otherwise block the opponent's immediate win, otherwise play next to the
// most stones, preferring cells near the centre. Ties fall to the first cell
// in row-major order, so the choice is deterministic.

use gomoku_board::{Board, CellState, Coord};

/// Pick a cell for `stone`, or `None` on a full board.
pub fn choose_move(board: &Board, stone: CellState) -> Option<Coord> {
    let empty: Vec<Coord> = board.empty_cells().collect();
    if let Some(win) = empty.iter().find(|c| board.would_win(c.row, c.col, stone)) {
        return Some(*win);
    }
    let opponent = stone.opponent();
    if let Some(block) = empty.iter().find(|c| board.would_win(c.row, c.col, opponent)) {
        return Some(*block);
    }

    let centre = board.size() / 2;
    empty.into_iter().max_by(|a, b| {
        let key = |c: &Coord| (neighbours(board, *c), std::cmp::Reverse(distance(*c, centre)));
        // `max_by` keeps the last of equal elements; invert the position
        // ordering so the first one wins instead.
        key(a).cmp(&key(b)).then_with(|| b.cmp(a))
    })
}

/// Stones of either colour in the eight cells around `c`.
fn neighbours(board: &Board, c: Coord) -> usize {
    let mut count = 0;
    for dr in -1isize..=1 {
        for dc in -1isize..=1 {
            if dr == 0 && dc == 0 {
                continue;
            }
            let (Some(r), Some(col)) = (c.row.checked_add_signed(dr), c.col.checked_add_signed(dc))
            else {
                continue;
            };
            if board.get(r, col).is_some_and(CellState::is_stone) {
                count += 1;
            }
        }
    }
    count
}

/// Chebyshev distance to the centre cell.
fn distance(c: Coord, centre: usize) -> usize {
    c.row.abs_diff(centre).max(c.col.abs_diff(centre))
}

#[cfg(test)]
mod tests {
    use gomoku_board::Settings;

    use super::*;

    fn board(size: usize, win: usize) -> Board {
        Board::new(&Settings::new(size, win, false)).unwrap()
    }

    #[test]
    fn opens_in_the_centre() {
        let b = board(15, 5);
        assert_eq!(choose_move(&b, CellState::Black), Some(Coord::new(7, 7)));
    }

    #[test]
    fn takes_a_winning_cell() {
        let mut b = board(9, 4);
        for col in 2..5 {
            b.apply(0, col, CellState::White).unwrap();
        }
        // Black threatens too, but winning comes first.
        for col in 2..5 {
            b.apply(5, col, CellState::Black).unwrap();
        }
        let choice = choose_move(&b, CellState::White).unwrap();
        assert!(b.would_win(choice.row, choice.col, CellState::White));
        assert_eq!(choice.row, 0);
    }

    #[test]
    fn blocks_an_immediate_threat() {
        let mut b = board(9, 4);
        for row in 3..6 {
            b.apply(row, 8, CellState::Black).unwrap();
        }
        b.apply(0, 0, CellState::White).unwrap();
        let choice = choose_move(&b, CellState::White).unwrap();
        assert!(b.would_win(choice.row, choice.col, CellState::Black));
    }

    #[test]
    fn plays_next_to_existing_stones() {
        let mut b = board(15, 5);
        b.apply(2, 2, CellState::Black).unwrap();
        let choice = choose_move(&b, CellState::White).unwrap();
        assert_eq!(
            choice.row.abs_diff(2).max(choice.col.abs_diff(2)),
            1,
            "expected a neighbour of (2, 2), got {choice}"
        );
    }

    #[test]
    fn full_board_has_no_move() {
        let mut b = board(7, 5);
        for row in 0..7 {
            for col in 0..7 {
                let state = if ((col / 2) + row) % 2 == 0 {
                    CellState::Black
                } else {
                    CellState::White
                };
                b.apply(row, col, state).unwrap();
            }
        }
        assert_eq!(choose_move(&b, CellState::Black), None);
    }
}
