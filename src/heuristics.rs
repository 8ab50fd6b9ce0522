//! Remaining-cost estimate used by the informed strategies.
//!
//! The estimate is Manhattan distance plus a linear-conflict penalty. Both terms count moves,
//! not price, so the estimate is only admissible when every tile costs 1 per move. With the
//! mixed constrained/free pricing a free tile's step costs far more than one unit while a
//! constrained tile's step costs exactly one, and A*/IDA* may return a more expensive path
//! than the cheapest one. The estimate is used as-is.
use crate::engine::{Board, Goal, State};

/// Penalty per inverted pair of tiles sharing their goal line.
pub const LINEAR_CONFLICT_PENALTY: u64 = 2;

/// Sum over all non-blank tiles of the grid distance to their goal cell.
pub fn manhattan_distance(board: &Board, goal: &Goal) -> u64 {
    let mut distance = 0;
    for r in 0..board.rows() {
        for c in 0..board.cols() {
            let value = board.value(r, c);
            if value == 0 {
                continue;
            }
            let (goal_r, goal_c) = goal.position_of(value);
            distance += (goal_r.abs_diff(r) + goal_c.abs_diff(c)) as u64;
        }
    }
    distance
}

/// Linear-conflict penalty for the whole board.
///
/// For a tile already sitting in its goal row, every tile further right in that row that also
/// belongs to the row and whose goal column lies strictly left of the first tile's *current*
/// column adds `LINEAR_CONFLICT_PENALTY`. Columns are scanned the same way, downward, against
/// the first tile's current row.
pub fn linear_conflict(board: &Board, goal: &Goal) -> u64 {
    let mut conflict = 0;
    for r in 0..board.rows() {
        for c in 0..board.cols() {
            let value = board.value(r, c);
            if value == 0 {
                continue;
            }
            let (goal_r, goal_c) = goal.position_of(value);
            if goal_r == r {
                conflict += row_conflicts(board, goal, r, c);
            }
            if goal_c == c {
                conflict += column_conflicts(board, goal, r, c);
            }
        }
    }
    conflict
}

fn row_conflicts(board: &Board, goal: &Goal, row: usize, col: usize) -> u64 {
    let mut conflict = 0;
    for other_c in col + 1..board.cols() {
        let other = board.value(row, other_c);
        if other == 0 {
            continue;
        }
        let (other_goal_r, other_goal_c) = goal.position_of(other);
        if other_goal_r == row && other_goal_c < col {
            conflict += LINEAR_CONFLICT_PENALTY;
        }
    }
    conflict
}

fn column_conflicts(board: &Board, goal: &Goal, row: usize, col: usize) -> u64 {
    let mut conflict = 0;
    for other_r in row + 1..board.rows() {
        let other = board.value(other_r, col);
        if other == 0 {
            continue;
        }
        let (other_goal_r, other_goal_c) = goal.position_of(other);
        if other_goal_c == col && other_goal_r < row {
            conflict += LINEAR_CONFLICT_PENALTY;
        }
    }
    conflict
}

/// Heuristic estimate for a board: Manhattan distance plus linear conflict.
///
/// # Arguments
/// * `board`: The board to evaluate.
/// * `goal`: The goal layout; must have the same dimensions as `board`.
///
/// # Returns
/// A non-negative estimate that is 0 exactly when `board` matches `goal`.
///
/// # Examples
/// ```
/// use slide_solver::engine::{Board, Goal};
/// use slide_solver::heuristics::evaluate_board;
///
/// let goal = Goal::ascending(2, 2);
/// let solved = Board::uniform(2, 2, &[1, 2, 3, 0], 1).unwrap();
/// assert_eq!(evaluate_board(&solved, &goal), 0);
///
/// let one_off = Board::uniform(2, 2, &[1, 2, 0, 3], 1).unwrap();
/// assert_eq!(evaluate_board(&one_off, &goal), 1);
/// ```
pub fn evaluate_board(board: &Board, goal: &Goal) -> u64 {
    manhattan_distance(board, goal) + linear_conflict(board, goal)
}

/// Heuristic estimate for a state.
pub fn heuristic(state: &State, goal: &Goal) -> u64 {
    evaluate_board(state.board(), goal)
}

/// Computes `h` for `state` and stores it alongside `f = g + h`.
pub fn annotate(state: &mut State, goal: &Goal) {
    let h = heuristic(state, goal);
    state.set_estimate(h);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Direction, SearchContext};
    use std::collections::{HashSet, VecDeque};

    fn board(rows: usize, cols: usize, values: &[u32]) -> Board {
        Board::uniform(rows, cols, values, 1).unwrap()
    }

    #[test]
    fn test_manhattan_distance_sums_tile_offsets() {
        let goal = Goal::ascending(3, 3);
        let b = board(3, 3, &[8, 1, 3, 4, 5, 6, 7, 0, 2]);
        // 8: (0,0)->(2,1) = 3, 1: (0,1)->(0,0) = 1, 2: (2,2)->(0,1) = 3
        assert_eq!(manhattan_distance(&b, &goal), 7);
    }

    #[test]
    fn test_row_conflict_counts_tile_behind_current_column() {
        let goal = Goal::ascending(3, 3);
        // 3 sits in column 1 with 1 to its right; 1 belongs in column 0 < 1.
        let b = board(3, 3, &[2, 3, 1, 4, 5, 6, 7, 8, 0]);
        assert_eq!(manhattan_distance(&b, &goal), 4);
        assert_eq!(linear_conflict(&b, &goal), 2);
        assert_eq!(evaluate_board(&b, &goal), 6);
    }

    #[test]
    fn test_row_conflict_compares_against_current_column() {
        let goal = Goal::ascending(3, 3);
        // 2 sits in column 0; 1's goal column is 0, which is not strictly left of it.
        let b = board(3, 3, &[2, 1, 3, 4, 5, 6, 7, 8, 0]);
        assert_eq!(linear_conflict(&b, &goal), 0);
        assert_eq!(evaluate_board(&b, &goal), 2);
    }

    #[test]
    fn test_column_conflict_counts_tile_above_current_row() {
        let goal = Goal::ascending(3, 3);
        // 7 sits in row 1 of column 0 with 1 below it; 1 belongs in row 0 < 1.
        let b = board(3, 3, &[4, 2, 3, 7, 5, 6, 1, 8, 0]);
        assert_eq!(linear_conflict(&b, &goal), 2);
    }

    #[test]
    fn test_column_conflict_on_non_square_board() {
        let goal = Goal::ascending(3, 2);
        // Goal: 1 2 / 3 4 / 5 _. 3 sits in row 1 of column 0 with 1 below it.
        let b = board(3, 2, &[5, 2, 3, 4, 1, 0]);
        assert_eq!(linear_conflict(&b, &goal), 2);
        assert_eq!(manhattan_distance(&b, &goal), 4);
    }

    #[test]
    fn test_no_conflicts_when_only_blank_is_misplaced() {
        let goal = Goal::ascending(3, 3);
        let b = board(3, 3, &[1, 2, 3, 4, 5, 6, 7, 0, 8]);
        assert_eq!(linear_conflict(&b, &goal), 0);
        assert_eq!(evaluate_board(&b, &goal), 1);
    }

    #[test]
    fn test_heuristic_is_zero_only_at_goal() {
        // Every layout reachable on a 2x3 board.
        let goal = Goal::ascending(2, 3);
        let start = State::new(board(2, 3, &[1, 2, 3, 4, 5, 0]));
        let mut ctx = SearchContext::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(start.key().clone());
        queue.push_back(start);
        while let Some(state) = queue.pop_front() {
            let h = heuristic(&state, &goal);
            assert_eq!(h == 0, goal.is_reached(&state), "layout {}", state.key());
            for dir in Direction::ALL {
                if let Some(child) = state.try_move(dir, &mut ctx) {
                    if seen.insert(child.key().clone()) {
                        queue.push_back(child);
                    }
                }
            }
        }
        // Half of the 6! permutations are reachable.
        assert_eq!(seen.len(), 360);
    }

    #[test]
    fn test_annotate_sets_f() {
        let goal = Goal::ascending(2, 2);
        let mut state = State::new(board(2, 2, &[0, 1, 3, 2]));
        annotate(&mut state, &goal);
        assert_eq!(state.h(), evaluate_board(state.board(), &goal));
        assert_eq!(state.f(), state.g() + state.h());
    }
}
