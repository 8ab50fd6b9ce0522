//! Core puzzle model for the weighted sliding-tile puzzle.
//!
//! This module defines the pieces every search strategy is built on:
//! - `Tile`: a numbered tile with its cost class, move price and (for constrained tiles) a
//!   personal move budget.
//! - `Board`: an R×C grid of tiles with exactly one blank (value 0).
//! - `State`: a board plus search bookkeeping (accumulated cost, path, last move, key).
//! - `Goal`: the target layout, ascending row-major with the blank in the last cell.
//! - `SearchContext`: run-scoped bookkeeping shared by the move generator and the strategies.
//!
//! Moves are named after the direction the *tile* travels: `Left` slides the tile to the
//! right of the blank into it, so the blank itself shifts one column to the right.
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Price charged each time a constrained tile slides into the blank.
pub const CONSTRAINED_MOVE_PRICE: u64 = 1;

/// Price charged each time a free tile slides into the blank.
pub const FREE_MOVE_PRICE: u64 = 30;

/// Errors raised when assembling a `Board` from raw tiles.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("board must have at least one row and one column, got {rows}x{cols}")]
    EmptyBoard { rows: usize, cols: usize },

    #[error("expected {expected} tiles for the board dimensions, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("tile value {value} is out of range for a board with {cells} cells")]
    ValueOutOfRange { value: u32, cells: usize },

    #[error("tile value {0} appears more than once")]
    DuplicateValue(u32),
}

/// Movement class of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CostClass {
    /// Cheap to move, but only a limited number of times.
    Constrained,
    /// Unlimited moves at a higher price.
    Free,
}

/// A single tile on the board.
///
/// The value is fixed for the lifetime of the tile; the remaining move budget is the only
/// field that changes, and only on the copy owned by a freshly generated child state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    value: u32,
    class: CostClass,
    move_price: u64,
    move_budget: u32,
}

impl Tile {
    /// Creates a constrained tile that may move at most `budget` times.
    ///
    /// # Examples
    ///
    /// ```
    /// use slide_solver::engine::{CostClass, Tile};
    /// let tile = Tile::constrained(4, 2);
    /// assert_eq!(tile.cost_class(), CostClass::Constrained);
    /// assert_eq!(tile.move_budget(), 2);
    /// assert_eq!(tile.move_price(), 1);
    /// ```
    pub fn constrained(value: u32, budget: u32) -> Self {
        Tile {
            value,
            class: CostClass::Constrained,
            move_price: CONSTRAINED_MOVE_PRICE,
            move_budget: budget,
        }
    }

    /// Creates a free tile charged `FREE_MOVE_PRICE` per move.
    pub fn free(value: u32) -> Self {
        Tile {
            value,
            class: CostClass::Free,
            move_price: FREE_MOVE_PRICE,
            move_budget: 0,
        }
    }

    /// The blank cell. It is never the tile being moved, so its price is irrelevant.
    pub fn blank() -> Self {
        Tile::free(0)
    }

    /// Returns the same tile with a different per-move price.
    pub fn with_price(mut self, price: u64) -> Self {
        self.move_price = price;
        self
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn cost_class(&self) -> CostClass {
        self.class
    }

    pub fn move_price(&self) -> u64 {
        self.move_price
    }

    /// Remaining moves for a constrained tile. Meaningless for free tiles.
    pub fn move_budget(&self) -> u32 {
        self.move_budget
    }

    pub fn is_blank(&self) -> bool {
        self.value == 0
    }

    /// Whether this tile may still be slid into the blank.
    ///
    /// A constrained tile with an exhausted budget is frozen in place for good.
    pub fn can_move(&self) -> bool {
        match self.class {
            CostClass::Constrained => self.move_budget > 0,
            CostClass::Free => true,
        }
    }

    fn spend_move(&mut self) {
        if self.class == CostClass::Constrained {
            self.move_budget -= 1;
        }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_blank() {
            write!(f, "_")
        } else {
            write!(f, "{}", self.value)
        }
    }
}

/// Direction a tile travels when it slides into the blank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Left,
    Up,
    Right,
    Down,
}

impl Direction {
    /// Fixed expansion order used by every strategy.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Up,
        Direction::Right,
        Direction::Down,
    ];

    /// The move that would undo this one.
    pub fn reverse(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Single-letter label used in rendered paths.
    pub fn letter(self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Up => 'U',
            Direction::Right => 'R',
            Direction::Down => 'D',
        }
    }

    /// Offset from the blank to the tile that slides into it.
    fn source_offset(self) -> (isize, isize) {
        match self {
            Direction::Left => (0, 1),
            Direction::Up => (1, 0),
            Direction::Right => (0, -1),
            Direction::Down => (-1, 0),
        }
    }
}

/// One step of a solution: which tile moved and where it went.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Move {
    pub tile: u32,
    pub direction: Direction,
}

impl fmt::Display for Move {
    /// Renders the move as `<tileValue><directionLetter>`, e.g. `5L`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.tile, self.direction.letter())
    }
}

/// An R×C grid of tiles stored row-major in a flat buffer.
///
/// Every `State` owns its own `Board`; generating a child clones the buffer, so no two states
/// ever share tiles.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Tile>,
}

impl Board {
    /// Creates a board from row-major tiles.
    ///
    /// # Arguments
    /// * `rows`, `cols`: Board dimensions, both at least 1.
    /// * `cells`: `rows * cols` tiles whose values form a permutation of `0..rows * cols`.
    ///
    /// # Returns
    /// * `Ok(Board)` for a well-formed grid.
    /// * `Err(BoardError)` if the dimensions are zero, the tile count is wrong, or a value is
    ///   out of range or repeated (which also covers a missing blank).
    pub fn new(rows: usize, cols: usize, cells: Vec<Tile>) -> Result<Self, BoardError> {
        if rows == 0 || cols == 0 {
            return Err(BoardError::EmptyBoard { rows, cols });
        }
        let expected = rows * cols;
        if cells.len() != expected {
            return Err(BoardError::DimensionMismatch {
                expected,
                found: cells.len(),
            });
        }

        let mut seen = vec![false; expected];
        for tile in &cells {
            let idx = tile.value as usize;
            if idx >= expected {
                return Err(BoardError::ValueOutOfRange {
                    value: tile.value,
                    cells: expected,
                });
            }
            if seen[idx] {
                return Err(BoardError::DuplicateValue(tile.value));
            }
            seen[idx] = true;
        }

        Ok(Board { rows, cols, cells })
    }

    /// Builds a board of free tiles that all cost `price` per move.
    ///
    /// Handy for uniform-cost puzzles, where the heuristic is admissible.
    ///
    /// ```
    /// use slide_solver::engine::Board;
    /// let board = Board::uniform(2, 2, &[1, 2, 3, 0], 1).unwrap();
    /// assert_eq!(board.blank_position(), (1, 1));
    /// ```
    pub fn uniform(rows: usize, cols: usize, values: &[u32], price: u64) -> Result<Self, BoardError> {
        let cells = values
            .iter()
            .map(|&v| Tile::free(v).with_price(price))
            .collect();
        Board::new(rows, cols, cells)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the tile at (`r`, `c`).
    ///
    /// # Panics
    /// Panics if the coordinates are outside the board.
    pub fn tile(&self, r: usize, c: usize) -> &Tile {
        &self.cells[r * self.cols + c]
    }

    pub fn value(&self, r: usize, c: usize) -> u32 {
        self.tile(r, c).value
    }

    /// Iterates over tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.cells.iter()
    }

    /// Location of the blank.
    pub fn blank_position(&self) -> (usize, usize) {
        // Board::new guarantees exactly one zero.
        let idx = self
            .cells
            .iter()
            .position(Tile::is_blank)
            .unwrap_or(self.cells.len() - 1);
        (idx / self.cols, idx % self.cols)
    }

    fn tile_mut(&mut self, r: usize, c: usize) -> &mut Tile {
        &mut self.cells[r * self.cols + c]
    }

    fn swap(&mut self, a: (usize, usize), b: (usize, usize)) {
        self.cells.swap(a.0 * self.cols + a.1, b.0 * self.cols + b.1);
    }
}

impl fmt::Display for Board {
    /// One line per row, comma separated, `_` for the blank (the input file format).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.cells.chunks(self.cols).enumerate() {
            if r > 0 {
                writeln!(f)?;
            }
            for (c, tile) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", tile)?;
            }
        }
        Ok(())
    }
}

/// Canonical duplicate-detection key: tile values in row-major order.
///
/// Remaining move budgets are not part of the key, so two boards with the same
/// layout but different budgets compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(Box<[u32]>);

impl StateKey {
    pub fn of(board: &Board) -> Self {
        StateKey(board.cells.iter().map(|t| t.value).collect())
    }

    pub fn values(&self) -> &[u32] {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

/// A node in the search space.
///
/// The board content of a state never changes after construction. Strategies only fill in
/// the heuristic estimate via `set_estimate`.
#[derive(Clone, Debug)]
pub struct State {
    board: Board,
    blank: (usize, usize),
    g: u64,
    h: u64,
    f: u64,
    path: Vec<Move>,
    last_move: Option<Direction>,
    key: StateKey,
}

impl State {
    /// Wraps the externally supplied start board. Cost and path start empty.
    pub fn new(board: Board) -> Self {
        let blank = board.blank_position();
        let key = StateKey::of(&board);
        State {
            board,
            blank,
            g: 0,
            h: 0,
            f: 0,
            path: Vec::new(),
            last_move: None,
            key,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn blank(&self) -> (usize, usize) {
        self.blank
    }

    /// Accumulated cost from the start state.
    pub fn g(&self) -> u64 {
        self.g
    }

    pub fn h(&self) -> u64 {
        self.h
    }

    /// `g + h`. Equal to `g` until an estimate has been set.
    pub fn f(&self) -> u64 {
        self.f
    }

    pub fn path(&self) -> &[Move] {
        &self.path
    }

    pub fn last_move(&self) -> Option<Direction> {
        self.last_move
    }

    pub fn key(&self) -> &StateKey {
        &self.key
    }

    /// Records the heuristic estimate and refreshes `f`.
    pub fn set_estimate(&mut self, h: u64) {
        self.h = h;
        self.f = self.g + h;
    }

    /// Attempts to slide a tile into the blank in the given direction.
    ///
    /// The move is rejected when it would undo `last_move`, when there is no tile on that
    /// side of the blank, or when that tile is constrained and out of budget.
    ///
    /// # Arguments
    /// * `direction`: Direction the tile should travel.
    /// * `ctx`: Run context; its node counter is incremented for every child produced.
    ///
    /// # Returns
    /// * `Some(State)`: a new, independently owned child with updated cost, path and key.
    /// * `None`: if the move is illegal.
    ///
    /// # Examples
    /// ```
    /// use slide_solver::engine::{Board, Direction, SearchContext, State};
    /// let start = State::new(Board::uniform(2, 2, &[1, 2, 0, 3], 1).unwrap());
    /// let mut ctx = SearchContext::new();
    /// let child = start.try_move(Direction::Left, &mut ctx).unwrap();
    /// assert_eq!(child.key().values(), &[1, 2, 3, 0]);
    /// assert_eq!(child.g(), 1);
    /// assert_eq!(ctx.nodes_generated(), 1);
    /// // Moving tile 3 back right would undo the last move.
    /// assert!(child.try_move(Direction::Right, &mut ctx).is_none());
    /// ```
    pub fn try_move(&self, direction: Direction, ctx: &mut SearchContext) -> Option<State> {
        if self.last_move == Some(direction.reverse()) {
            return None;
        }

        let (dr, dc) = direction.source_offset();
        let (br, bc) = self.blank;
        let sr = br.checked_add_signed(dr)?;
        let sc = bc.checked_add_signed(dc)?;
        if sr >= self.board.rows || sc >= self.board.cols {
            return None;
        }

        let moved = *self.board.tile(sr, sc);
        if !moved.can_move() {
            return None;
        }

        let mut board = self.board.clone();
        board.tile_mut(sr, sc).spend_move();
        board.swap((br, bc), (sr, sc));

        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend_from_slice(&self.path);
        path.push(Move {
            tile: moved.value,
            direction,
        });

        let g = self.g + moved.move_price;
        let key = StateKey::of(&board);
        ctx.record_node();

        Some(State {
            board,
            blank: (sr, sc),
            g,
            h: 0,
            f: g,
            path,
            last_move: Some(direction),
            key,
        })
    }

    /// All legal children in `Direction::ALL` order.
    pub fn successors(&self, ctx: &mut SearchContext) -> Vec<State> {
        Direction::ALL
            .iter()
            .filter_map(|&d| self.try_move(d, ctx))
            .collect()
    }
}

/// Free-function form of `State::try_move`.
pub fn try_move(state: &State, direction: Direction, ctx: &mut SearchContext) -> Option<State> {
    state.try_move(direction, ctx)
}

/// The target layout of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Goal {
    rows: usize,
    cols: usize,
    cells: Vec<u32>,
    // positions[v] is where value v belongs.
    positions: Vec<(usize, usize)>,
}

impl Goal {
    /// Ascending row-major numbering with the blank in the bottom-right cell.
    ///
    /// # Panics
    /// Panics if `rows` or `cols` is zero.
    ///
    /// ```
    /// use slide_solver::engine::Goal;
    /// let goal = Goal::ascending(2, 3);
    /// assert_eq!(goal.values(), &[1, 2, 3, 4, 5, 0]);
    /// assert_eq!(goal.position_of(5), (1, 1));
    /// ```
    pub fn ascending(rows: usize, cols: usize) -> Self {
        assert!(
            rows > 0 && cols > 0,
            "goal needs at least one row and one column, got {}x{}",
            rows,
            cols
        );
        let n = rows * cols;
        let cells: Vec<u32> = (1..n as u32).chain(std::iter::once(0)).collect();
        let mut positions = vec![(0, 0); n];
        for (idx, &v) in cells.iter().enumerate() {
            positions[v as usize] = (idx / cols, idx % cols);
        }
        Goal {
            rows,
            cols,
            cells,
            positions,
        }
    }

    /// Goal matching the dimensions of `board`.
    pub fn for_board(board: &Board) -> Self {
        Goal::ascending(board.rows(), board.cols())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn values(&self) -> &[u32] {
        &self.cells
    }

    /// Goal (row, column) of a tile value.
    ///
    /// # Panics
    /// Panics if `value` does not occur on a board of this size.
    pub fn position_of(&self, value: u32) -> (usize, usize) {
        self.positions[value as usize]
    }

    /// Value-by-position comparison against a board.
    pub fn matches(&self, board: &Board) -> bool {
        board.rows() == self.rows
            && board.cols() == self.cols
            && board.tiles().map(Tile::value).eq(self.cells.iter().copied())
    }

    pub fn is_reached(&self, state: &State) -> bool {
        self.matches(state.board())
    }
}

/// Per-run knobs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Log the frontier before every expansion (the "with open" input flag).
    pub show_open: bool,
    /// Deepest bound DFID will try before reporting no path. `None` means unbounded.
    pub max_depth: Option<usize>,
}

/// Optional record of the values that drive pruning, for inspection after a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchTrace {
    /// A*: `f` of each state in the order it was moved to the closed set.
    pub expanded_f: Vec<u64>,
    /// IDA*: threshold used by each outer iteration.
    pub thresholds: Vec<u64>,
    /// DFBnB: the initial bound followed by every tightening.
    pub bounds: Vec<u64>,
}

/// Run-scoped state shared by the move generator and a strategy.
///
/// Each run owns its context; nothing here is global, so independent runs never interfere.
#[derive(Debug, Default)]
pub struct SearchContext {
    nodes_generated: u64,
    options: SearchOptions,
    trace: Option<SearchTrace>,
}

impl SearchContext {
    pub fn new() -> Self {
        SearchContext::default()
    }

    pub fn with_options(options: SearchOptions) -> Self {
        SearchContext {
            options,
            ..SearchContext::default()
        }
    }

    /// Enables trace recording for this run.
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(SearchTrace::default());
        self
    }

    /// Number of states produced by the move generator so far.
    pub fn nodes_generated(&self) -> u64 {
        self.nodes_generated
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn trace(&self) -> Option<&SearchTrace> {
        self.trace.as_ref()
    }

    pub(crate) fn trace_mut(&mut self) -> Option<&mut SearchTrace> {
        self.trace.as_mut()
    }

    fn record_node(&mut self) {
        self.nodes_generated += 1;
    }
}
