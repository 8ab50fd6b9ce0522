use crate::engine::{Board, BoardError, Goal, Move, SearchContext, SearchOptions, State, Tile};
use crate::solver::{SearchResult, Status};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while reading a puzzle description.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read puzzle description: {0}")]
    Io(#[from] io::Error),

    #[error("puzzle description ends before the {0} line")]
    MissingLine(&'static str),

    #[error("invalid board dimensions '{0}', expected RxC")]
    InvalidDimensions(String),

    #[error("invalid constrained tile list '{0}', expected White:(value,budget),...")]
    InvalidBudgets(String),

    #[error("invalid cell '{cell}' at row {row}, column {col}")]
    InvalidCell { row: usize, col: usize, cell: String },

    #[error("expected {expected} board rows, found {found}")]
    RowCount { expected: usize, found: usize },

    #[error("row {row} has {found} cells, expected {expected}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Everything a puzzle description file carries.
#[derive(Clone, Debug)]
pub struct PuzzleDescription {
    /// Strategy name as written. Validated only when the search is dispatched.
    pub algorithm: String,
    /// `with time`: append the elapsed seconds to the report.
    pub with_time: bool,
    /// `with open`: log the frontier before each expansion.
    pub with_open: bool,
    /// Constrained tiles and their move budgets.
    pub budgets: BTreeMap<u32, u32>,
    pub board: Board,
}

impl PuzzleDescription {
    pub fn start_state(&self) -> State {
        State::new(self.board.clone())
    }

    pub fn goal(&self) -> Goal {
        Goal::for_board(&self.board)
    }

    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            show_open: self.with_open,
            ..SearchOptions::default()
        }
    }
}

/// Parses a puzzle description.
///
/// The layout is five header lines (strategy name, `with time`/`no time`,
/// `with open`/`no open`, `RxC`, `White:(value,budget),...`) followed by the board rows,
/// comma separated with `_` for the blank. Blank lines after the board are ignored.
///
/// # Arguments
/// * `text`: The full contents of the description.
///
/// # Returns
/// * `Ok(PuzzleDescription)` if every line parses and the board is a valid permutation.
/// * `Err(ParseError)` naming the first line or cell that could not be read.
///
/// # Examples
/// ```
/// use slide_solver::utils::parse_description;
///
/// let text = "A*\nwith time\nno open\n2x3\nWhite:(1,2)\n1,2,3\n4,_,5\n";
/// let description = parse_description(text).unwrap();
/// assert_eq!(description.algorithm, "A*");
/// assert!(description.with_time);
/// assert!(!description.with_open);
/// assert_eq!(description.board.rows(), 2);
/// assert_eq!(description.board.tile(0, 0).move_budget(), 2);
/// assert_eq!(description.board.to_string(), "1,2,3\n4,_,5");
///
/// assert!(parse_description("A*\nwith time\n").is_err());
/// ```
pub fn parse_description(text: &str) -> Result<PuzzleDescription, ParseError> {
    let mut lines = text.lines();
    let mut next = |what: &'static str| lines.next().ok_or(ParseError::MissingLine(what));

    let algorithm = next("algorithm")?.trim().to_string();
    let with_time = next("time flag")?.trim() == "with time";
    let with_open = next("open flag")?.trim() == "with open";
    let (rows, cols) = parse_dimensions(next("dimensions")?)?;
    let budgets = parse_budgets(next("constrained tiles")?)?;

    let board_lines: Vec<&str> = lines.filter(|line| !line.trim().is_empty()).collect();
    if board_lines.len() != rows {
        return Err(ParseError::RowCount {
            expected: rows,
            found: board_lines.len(),
        });
    }

    // Grows with the cells actually read, not with the declared size.
    let mut values = Vec::new();
    for (r, line) in board_lines.iter().enumerate() {
        let row = parse_row(r, line)?;
        if row.len() != cols {
            return Err(ParseError::ColumnCount {
                row: r,
                expected: cols,
                found: row.len(),
            });
        }
        values.extend(row);
    }

    let board = Board::new(rows, cols, tiles_from_values(&values, &budgets))?;
    Ok(PuzzleDescription {
        algorithm,
        with_time,
        with_open,
        budgets,
        board,
    })
}

/// Reads and parses the description file at `path`.
pub fn read_description(path: impl AsRef<Path>) -> Result<PuzzleDescription, ParseError> {
    let text = fs::read_to_string(path)?;
    parse_description(&text)
}

fn parse_dimensions(line: &str) -> Result<(usize, usize), ParseError> {
    let invalid = || ParseError::InvalidDimensions(line.trim().to_string());
    let (rows, cols) = line.trim().split_once('x').ok_or_else(invalid)?;
    let rows: usize = rows.trim().parse().map_err(|_| invalid())?;
    let cols: usize = cols.trim().parse().map_err(|_| invalid())?;
    rows.checked_mul(cols).ok_or_else(invalid)?;
    Ok((rows, cols))
}

fn parse_row(row: usize, line: &str) -> Result<Vec<u32>, ParseError> {
    line.split(',')
        .enumerate()
        .map(|(col, cell)| {
            let cell = cell.trim();
            if cell == "_" {
                return Ok(0);
            }
            cell.parse().map_err(|_| ParseError::InvalidCell {
                row,
                col,
                cell: cell.to_string(),
            })
        })
        .collect()
}

/// Parses the constrained tile line, e.g. `White:(3,1),(5,2)`.
///
/// `White:` on its own means no tile is constrained.
///
/// ```
/// use slide_solver::utils::parse_budgets;
/// let budgets = parse_budgets("White:(3,1),(5,2)").unwrap();
/// assert_eq!(budgets.get(&3), Some(&1));
/// assert_eq!(budgets.get(&5), Some(&2));
/// assert!(parse_budgets("White:").unwrap().is_empty());
/// assert!(parse_budgets("Red:(1,1)").is_err());
/// ```
pub fn parse_budgets(line: &str) -> Result<BTreeMap<u32, u32>, ParseError> {
    let invalid = || ParseError::InvalidBudgets(line.trim().to_string());
    let rest = line
        .trim()
        .strip_prefix("White:")
        .ok_or_else(invalid)?
        .trim();

    let mut budgets = BTreeMap::new();
    if rest.is_empty() {
        return Ok(budgets);
    }
    if !rest.ends_with(')') {
        return Err(invalid());
    }

    for group in rest.split(')') {
        let group = group.trim().trim_start_matches(',').trim();
        if group.is_empty() {
            continue;
        }
        let inner = group.strip_prefix('(').ok_or_else(invalid)?;
        let (value, budget) = inner.split_once(',').ok_or_else(invalid)?;
        let value = value.trim().parse().map_err(|_| invalid())?;
        let budget = budget.trim().parse().map_err(|_| invalid())?;
        budgets.insert(value, budget);
    }
    Ok(budgets)
}

/// Turns row-major values into tiles: listed values become constrained with their budget,
/// 0 becomes the blank, everything else is free.
pub fn tiles_from_values(values: &[u32], budgets: &BTreeMap<u32, u32>) -> Vec<Tile> {
    values
        .iter()
        .map(|&value| match budgets.get(&value) {
            _ if value == 0 => Tile::blank(),
            Some(&budget) => Tile::constrained(value, budget),
            None => Tile::free(value),
        })
        .collect()
}

/// Renders the report file contents for a finished run.
///
/// A solved run prints the path, the generated node count and the cost. A run without a
/// solution prints `no path` with an empty cost. An input error prints only `Input Error`.
/// With `elapsed`, a `<seconds> seconds` line follows.
///
/// ```
/// use slide_solver::solver::{SearchResult, Status};
/// use slide_solver::utils::render_report;
/// let result = SearchResult { status: Status::NoPath, path: vec![], total_cost: None, nodes_generated: 12 };
/// assert_eq!(render_report(&result, None), "no path\nNum: 12\nCost:\n");
/// ```
pub fn render_report(result: &SearchResult, elapsed: Option<Duration>) -> String {
    let mut report = match result.status {
        Status::Solved => format!(
            "{}\nNum: {}\nCost: {}\n",
            result.path_string(),
            result.nodes_generated,
            result.total_cost.unwrap_or_default()
        ),
        Status::NoPath => format!("no path\nNum: {}\nCost:\n", result.nodes_generated),
        Status::InputError => "Input Error\n".to_string(),
    };
    if let Some(elapsed) = elapsed {
        report.push_str(&format!("{:.3} seconds\n", elapsed.as_secs_f64()));
    }
    report
}

/// Writes the rendered report to `path`, replacing any existing file.
pub fn write_report(
    path: impl AsRef<Path>,
    result: &SearchResult,
    elapsed: Option<Duration>,
) -> io::Result<()> {
    fs::write(path, render_report(result, elapsed))
}

/// Re-applies a recorded move sequence through the move generator.
///
/// # Returns
/// * `Some(State)`: the state reached after the last move.
/// * `None`: if some move is illegal from the state it is applied to, or names a different
///   tile than the one the generator would slide.
///
/// # Examples
/// ```
/// use slide_solver::engine::{Board, Direction, Move, State};
/// use slide_solver::utils::replay_path;
///
/// let start = State::new(Board::uniform(2, 2, &[1, 2, 0, 3], 1).unwrap());
/// let end = replay_path(&start, &[Move { tile: 3, direction: Direction::Left }]).unwrap();
/// assert_eq!(end.key().values(), &[1, 2, 3, 0]);
/// assert_eq!(end.g(), 1);
///
/// assert!(replay_path(&start, &[Move { tile: 1, direction: Direction::Left }]).is_none());
/// ```
pub fn replay_path(start: &State, path: &[Move]) -> Option<State> {
    let mut ctx = SearchContext::new();
    let mut state = start.clone();
    for step in path {
        let child = state.try_move(step.direction, &mut ctx)?;
        if child.path().last() != Some(step) {
            return None;
        }
        state = child;
    }
    Some(state)
}

/// Builds a scrambled start state by walking the blank `walk` steps away from the goal.
///
/// Every step is a random legal move that does not undo the previous one, so the layout is
/// always reachable from the goal. Tiles listed in `budgets` are constrained on the returned
/// board; a tight budget can still make the puzzle unsolvable.
///
/// # Arguments
/// * `rows`, `cols`: Board dimensions.
/// * `walk`: Number of random blank moves.
/// * `budgets`: Constrained tiles and their budgets.
/// * `seed`: Seed for `SmallRng`. The same seed always yields the same puzzle.
///
/// # Examples
/// ```
/// use slide_solver::utils::random_puzzle;
/// use std::collections::BTreeMap;
///
/// let a = random_puzzle(3, 3, 20, &BTreeMap::new(), 7).unwrap();
/// let b = random_puzzle(3, 3, 20, &BTreeMap::new(), 7).unwrap();
/// assert_eq!(a.key(), b.key());
/// ```
pub fn random_puzzle(
    rows: usize,
    cols: usize,
    walk: usize,
    budgets: &BTreeMap<u32, u32>,
    seed: u64,
) -> Result<State, BoardError> {
    if rows == 0 || cols == 0 {
        return Err(BoardError::EmptyBoard { rows, cols });
    }
    let goal = Goal::ascending(rows, cols);
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut ctx = SearchContext::new();
    let mut state = State::new(Board::uniform(rows, cols, goal.values(), 1)?);

    for _ in 0..walk {
        let mut children = state.successors(&mut ctx);
        if children.is_empty() {
            break;
        }
        let pick = rng.gen_range(0..children.len());
        state = children.swap_remove(pick);
    }

    let cells = tiles_from_values(state.key().values(), budgets);
    Ok(State::new(Board::new(rows, cols, cells)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CostClass, Direction, FREE_MOVE_PRICE};
    use crate::solver::testing::bfs_distance;

    const SAMPLE: &str = "\
DFBnB
no time
with open
3x3
White:(1,2),(8,1)
1,2,3
4,5,6
7,_,8
";

    #[test]
    fn test_parse_sample_description() {
        let description = parse_description(SAMPLE).unwrap();
        assert_eq!(description.algorithm, "DFBnB");
        assert!(!description.with_time);
        assert!(description.with_open);
        assert!(description.options().show_open);
        assert_eq!(description.budgets.len(), 2);

        let board = &description.board;
        assert_eq!(board.blank_position(), (2, 1));
        assert_eq!(board.tile(0, 0).cost_class(), CostClass::Constrained);
        assert_eq!(board.tile(0, 0).move_budget(), 2);
        assert_eq!(board.tile(2, 2).move_budget(), 1);
        assert_eq!(board.tile(1, 1).cost_class(), CostClass::Free);
        assert_eq!(board.tile(1, 1).move_price(), FREE_MOVE_PRICE);
        assert_eq!(description.goal(), Goal::ascending(3, 3));
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_trailing_blank_lines() {
        let text = "IDA*\r\nwith time\r\nno open\r\n 2 x 2 \r\nWhite:\r\n1, 2\r\n _ ,3\r\n\r\n\r\n";
        let description = parse_description(text).unwrap();
        assert_eq!(description.algorithm, "IDA*");
        assert!(description.budgets.is_empty());
        assert_eq!(description.board.to_string(), "1,2\n_,3");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_description("A*\nno time\nno open\n"),
            Err(ParseError::MissingLine("dimensions"))
        ));
        assert!(matches!(
            parse_description("A*\nno time\nno open\n2by2\nWhite:\n1,2\n3,_\n"),
            Err(ParseError::InvalidDimensions(_))
        ));
        assert!(matches!(
            parse_description("A*\nno time\nno open\n2x2\nWhite:(1)\n1,2\n3,_\n"),
            Err(ParseError::InvalidBudgets(_))
        ));
        assert!(matches!(
            parse_description("A*\nno time\nno open\n2x2\nWhite:\n1,2\n3,x\n"),
            Err(ParseError::InvalidCell { row: 1, col: 1, .. })
        ));
        assert!(matches!(
            parse_description("A*\nno time\nno open\n2x2\nWhite:\n1,2\n"),
            Err(ParseError::RowCount { expected: 2, found: 1 })
        ));
        assert!(matches!(
            parse_description("A*\nno time\nno open\n2x2\nWhite:\n1,2,3\n_\n"),
            Err(ParseError::ColumnCount { row: 0, expected: 2, found: 3 })
        ));
        assert!(matches!(
            parse_description("A*\nno time\nno open\n2x2\nWhite:\n1,2\n2,_\n"),
            Err(ParseError::Board(BoardError::DuplicateValue(2)))
        ));
    }

    #[test]
    fn test_huge_dimensions_are_parse_errors() {
        assert!(matches!(
            parse_description("A*\nno time\nno open\n1x100000000000000\nWhite:\n1,_\n"),
            Err(ParseError::ColumnCount { row: 0, expected: 100000000000000, found: 2 })
        ));
        let overflow = format!("A*\nno time\nno open\n{0}x{0}\nWhite:\n1,_\n", usize::MAX);
        assert!(matches!(
            parse_description(&overflow),
            Err(ParseError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_unknown_algorithm_is_not_a_parse_error() {
        let text = "BFS\nno time\nno open\n2x2\nWhite:\n1,2\n3,_\n";
        assert_eq!(parse_description(text).unwrap().algorithm, "BFS");
    }

    #[test]
    fn test_tiles_from_values() {
        let budgets = BTreeMap::from([(2, 3)]);
        let tiles = tiles_from_values(&[1, 2, 0], &budgets);
        assert_eq!(tiles[0], Tile::free(1));
        assert_eq!(tiles[1], Tile::constrained(2, 3));
        assert!(tiles[2].is_blank());
    }

    #[test]
    fn test_render_reports() {
        let solved = SearchResult {
            status: Status::Solved,
            path: vec![
                Move {
                    tile: 4,
                    direction: Direction::Left,
                },
                Move {
                    tile: 7,
                    direction: Direction::Up,
                },
            ],
            total_cost: Some(31),
            nodes_generated: 9,
        };
        assert_eq!(render_report(&solved, None), "4L-7U\nNum: 9\nCost: 31\n");
        assert_eq!(
            render_report(&solved, Some(Duration::from_millis(1250))),
            "4L-7U\nNum: 9\nCost: 31\n1.250 seconds\n"
        );
        assert_eq!(
            render_report(&SearchResult::input_error(), None),
            "Input Error\n"
        );
    }

    #[test]
    fn test_read_and_write_files() {
        let dir = std::env::temp_dir().join(format!("slide_solver_utils_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let input = dir.join("input.txt");
        let output = dir.join("output.txt");
        fs::write(&input, SAMPLE).unwrap();

        let description = read_description(&input).unwrap();
        assert_eq!(description.algorithm, "DFBnB");
        assert!(matches!(
            read_description(dir.join("missing.txt")),
            Err(ParseError::Io(_))
        ));

        write_report(&output, &SearchResult::input_error(), None).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "Input Error\n");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_replay_rejects_illegal_moves() {
        let start = State::new(Board::uniform(2, 2, &[1, 2, 0, 3], 1).unwrap());
        assert!(replay_path(&start, &[]).is_some());
        // Nothing sits below the blank.
        let up = Move {
            tile: 3,
            direction: Direction::Up,
        };
        assert!(replay_path(&start, &[up]).is_none());
        // Left then Right undoes the previous move.
        let there = Move {
            tile: 3,
            direction: Direction::Left,
        };
        let back = Move {
            tile: 3,
            direction: Direction::Right,
        };
        assert!(replay_path(&start, &[there, back]).is_none());
    }

    #[test]
    fn test_random_puzzle_is_reachable_and_seeded() {
        let budgets = BTreeMap::from([(1, 5)]);
        let a = random_puzzle(2, 3, 25, &budgets, 42).unwrap();
        let b = random_puzzle(2, 3, 25, &budgets, 42).unwrap();
        assert_eq!(a.key(), b.key());
        assert_eq!(a.board().tiles().find(|t| t.value() == 1).unwrap().move_budget(), 5);

        let free = random_puzzle(2, 3, 25, &BTreeMap::new(), 42).unwrap();
        assert_eq!(free.key(), a.key());
        assert!(bfs_distance(&free, &Goal::ascending(2, 3)).is_some());

        assert_eq!(
            random_puzzle(0, 3, 5, &BTreeMap::new(), 1).unwrap_err(),
            BoardError::EmptyBoard { rows: 0, cols: 3 }
        );
    }
}
