//! Search strategies and the entry point that dispatches between them.
//!
//! Four interchangeable strategies share the same move generator and heuristic:
//! - `dfid`: depth-first iterative deepening with a path-local visited set.
//! - `astar`: best-first search with a closed set and keyed decrease-key on the frontier.
//! - `ida_star`: f-threshold iterative deepening on an explicit stack.
//! - `dfbnb`: depth-first branch-and-bound on an explicit stack with a tightening cost bound.
//!
//! Every run takes a `SearchContext` owned by the caller; the node counter and optional trace
//! live there, so separate runs never share bookkeeping.
pub mod astar;
pub mod dfbnb;
pub mod dfid;
pub mod ida_star;

use crate::engine::{Goal, Move, SearchContext, State, StateKey};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

/// Returned when a strategy name is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown search strategy '{0}' (expected DFID, A*, IDA* or DFBnB)")]
pub struct UnknownStrategy(pub String);

/// The available search strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    Dfid,
    AStar,
    IdaStar,
    DfBnB,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Dfid,
        Strategy::AStar,
        Strategy::IdaStar,
        Strategy::DfBnB,
    ];

    /// Name as written in puzzle descriptions.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Dfid => "DFID",
            Strategy::AStar => "A*",
            Strategy::IdaStar => "IDA*",
            Strategy::DfBnB => "DFBnB",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    /// Parses a strategy name. Matching is exact apart from surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == trimmed)
            .ok_or_else(|| UnknownStrategy(trimmed.to_string()))
    }
}

/// Terminal outcome of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Status {
    Solved,
    NoPath,
    InputError,
}

/// Structured result handed back to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub status: Status,
    /// Moves from the start state to the goal; empty unless solved.
    pub path: Vec<Move>,
    /// Accumulated move price of `path`; `None` unless solved.
    pub total_cost: Option<u64>,
    /// Every state the move generator produced during the run, pruned ones included.
    pub nodes_generated: u64,
}

impl SearchResult {
    pub fn solved(state: &State, ctx: &SearchContext) -> Self {
        SearchResult {
            status: Status::Solved,
            path: state.path().to_vec(),
            total_cost: Some(state.g()),
            nodes_generated: ctx.nodes_generated(),
        }
    }

    /// Result for a path recorded earlier in the run, at the given cost.
    pub fn from_path(path: Vec<Move>, total_cost: u64, ctx: &SearchContext) -> Self {
        SearchResult {
            status: Status::Solved,
            path,
            total_cost: Some(total_cost),
            nodes_generated: ctx.nodes_generated(),
        }
    }

    pub fn no_path(ctx: &SearchContext) -> Self {
        SearchResult {
            status: Status::NoPath,
            path: Vec::new(),
            total_cost: None,
            nodes_generated: ctx.nodes_generated(),
        }
    }

    /// Result for a request that could not be run at all.
    pub fn input_error() -> Self {
        SearchResult {
            status: Status::InputError,
            path: Vec::new(),
            total_cost: None,
            nodes_generated: 0,
        }
    }

    pub fn is_solved(&self) -> bool {
        self.status == Status::Solved
    }

    /// Renders the path as `<tile><letter>` moves joined by `-`, e.g. `4L-7U-8R`.
    ///
    /// ```
    /// use slide_solver::engine::{Direction, Move};
    /// use slide_solver::solver::{SearchResult, Status};
    /// let result = SearchResult {
    ///     status: Status::Solved,
    ///     path: vec![
    ///         Move { tile: 4, direction: Direction::Left },
    ///         Move { tile: 7, direction: Direction::Up },
    ///     ],
    ///     total_cost: Some(31),
    ///     nodes_generated: 9,
    /// };
    /// assert_eq!(result.path_string(), "4L-7U");
    /// ```
    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Runs `strategy` from `start` towards `goal`.
///
/// # Arguments
/// * `strategy`: Which search to run.
/// * `start`: The initial state. It is cloned, never modified.
/// * `goal`: The target layout, same dimensions as `start`.
/// * `ctx`: Run context owned by the caller. Pass a fresh one per run.
///
/// # Returns
/// A `SearchResult` with status `Solved` or `NoPath`.
pub fn solve(
    strategy: Strategy,
    start: &State,
    goal: &Goal,
    ctx: &mut SearchContext,
) -> SearchResult {
    info!(
        strategy = %strategy,
        rows = goal.rows(),
        cols = goal.cols(),
        "search started"
    );

    let result = match strategy {
        Strategy::Dfid => dfid::search(start, goal, ctx),
        Strategy::AStar => astar::search(start, goal, ctx),
        Strategy::IdaStar => ida_star::search(start, goal, ctx),
        Strategy::DfBnB => dfbnb::search(start, goal, ctx),
    };

    info!(
        strategy = %strategy,
        status = ?result.status,
        nodes = result.nodes_generated,
        cost = ?result.total_cost,
        "search finished"
    );
    result
}

/// Name-based entry point. An unknown name yields `Status::InputError` without searching.
///
/// ```
/// use slide_solver::engine::{Board, Goal, SearchContext, State};
/// use slide_solver::solver::{solve_by_name, Status};
///
/// let board = Board::uniform(2, 2, &[1, 2, 0, 3], 1).unwrap();
/// let goal = Goal::for_board(&board);
/// let start = State::new(board);
///
/// let result = solve_by_name("A*", &start, &goal, &mut SearchContext::new());
/// assert_eq!(result.status, Status::Solved);
/// assert_eq!(result.path_string(), "3L");
///
/// let bad = solve_by_name("BFS", &start, &goal, &mut SearchContext::new());
/// assert_eq!(bad.status, Status::InputError);
/// ```
pub fn solve_by_name(
    name: &str,
    start: &State,
    goal: &Goal,
    ctx: &mut SearchContext,
) -> SearchResult {
    match name.parse::<Strategy>() {
        Ok(strategy) => solve(strategy, start, goal, ctx),
        Err(err) => {
            warn!(error = %err, "refusing to search");
            SearchResult::input_error()
        }
    }
}

/// Logs the current frontier when the run asked to see it.
fn log_open<'a>(ctx: &SearchContext, strategy: Strategy, keys: impl Iterator<Item = &'a StateKey>) {
    if !ctx.options().show_open {
        return;
    }
    let rendered: Vec<String> = keys.map(|key| format!("[{}]", key)).collect();
    info!(
        target: "open_list",
        strategy = %strategy,
        size = rendered.len(),
        "{}",
        rendered.join(" ")
    );
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::engine::{Board, SearchOptions, Tile};

    #[test]
    fn test_strategy_names_round_trip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.name().parse::<Strategy>(), Ok(strategy));
        }
        assert_eq!(" IDA* ".parse::<Strategy>(), Ok(Strategy::IdaStar));
        for name in ["a*", "dfid", "Ida*", "DFBNB"] {
            assert_eq!(
                name.parse::<Strategy>(),
                Err(UnknownStrategy(name.to_string()))
            );
        }
        assert_eq!(
            "BFS".parse::<Strategy>(),
            Err(UnknownStrategy("BFS".to_string()))
        );
    }

    #[test]
    fn test_unknown_strategy_is_input_error() {
        let start = uniform_state(2, 2, &[1, 2, 0, 3]);
        let goal = Goal::ascending(2, 2);
        let mut ctx = SearchContext::new();
        let result = solve_by_name("Dijkstra", &start, &goal, &mut ctx);
        assert_eq!(result, SearchResult::input_error());
        assert_eq!(ctx.nodes_generated(), 0);

        let lowercase = solve_by_name("a*", &start, &goal, &mut ctx);
        assert_eq!(lowercase.status, Status::InputError);
        assert_eq!(ctx.nodes_generated(), 0);
    }

    #[test]
    fn test_start_at_goal_is_solved_immediately() {
        let start = uniform_state(2, 2, &[1, 2, 3, 0]);
        let goal = Goal::ascending(2, 2);
        for strategy in Strategy::ALL {
            let mut ctx = SearchContext::new();
            let result = solve(strategy, &start, &goal, &mut ctx);
            assert_eq!(result.status, Status::Solved, "{}", strategy);
            assert!(result.path.is_empty());
            assert_eq!(result.total_cost, Some(0));
            assert_eq!(result.nodes_generated, 0);
        }
    }

    #[test]
    fn test_one_move_puzzle() {
        let start = uniform_state(2, 2, &[1, 2, 0, 3]);
        let goal = Goal::ascending(2, 2);
        for strategy in Strategy::ALL {
            let mut ctx = SearchContext::new();
            let result = solve(strategy, &start, &goal, &mut ctx);
            assert_eq!(result.status, Status::Solved, "{}", strategy);
            assert_eq!(result.path_string(), "3L", "{}", strategy);
            assert_eq!(result.total_cost, Some(1));
            assert!(result.nodes_generated >= 1);
        }
    }

    #[test]
    fn test_unreachable_goal_is_no_path_for_every_strategy() {
        // On a single row the order of the tiles can never change.
        let start = uniform_state(1, 3, &[2, 1, 0]);
        let goal = Goal::ascending(1, 3);
        for strategy in Strategy::ALL {
            let mut ctx = SearchContext::new();
            let result = solve(strategy, &start, &goal, &mut ctx);
            assert_eq!(result.status, Status::NoPath, "{}", strategy);
            assert!(result.path.is_empty());
            assert_eq!(result.total_cost, None);
            assert!(result.nodes_generated > 0);
        }
    }

    #[test]
    fn test_every_strategy_returns_a_replayable_path() {
        // 2 _ 5 / 1 3 4 with tiles 3 and 4 limited to two moves each.
        let cells = vec![
            Tile::free(2),
            Tile::blank(),
            Tile::free(5),
            Tile::free(1),
            Tile::constrained(3, 2),
            Tile::constrained(4, 2),
        ];
        let start = State::new(Board::new(2, 3, cells).unwrap());
        let goal = Goal::ascending(2, 3);
        for strategy in Strategy::ALL {
            let mut ctx = SearchContext::new();
            let result = solve(strategy, &start, &goal, &mut ctx);
            assert_eq!(result.status, Status::Solved, "{}", strategy);
            assert_replays_to_goal(&start, &goal, &result);
        }
    }

    #[test]
    fn test_open_list_logging_does_not_change_results() {
        let start = uniform_state(2, 3, &[4, 1, 3, 0, 2, 5]);
        let goal = Goal::ascending(2, 3);
        let options = SearchOptions {
            show_open: true,
            ..SearchOptions::default()
        };
        for strategy in Strategy::ALL {
            let quiet = solve(strategy, &start, &goal, &mut SearchContext::new());
            let mut ctx = SearchContext::with_options(options.clone());
            let verbose = solve(strategy, &start, &goal, &mut ctx);
            assert_eq!(quiet, verbose, "{}", strategy);
        }
    }

    #[test]
    fn test_runs_do_not_share_counters() {
        let start = uniform_state(2, 2, &[0, 3, 2, 1]);
        let goal = Goal::ascending(2, 2);
        let mut first = SearchContext::new();
        let a = solve(Strategy::AStar, &start, &goal, &mut first);
        let mut second = SearchContext::new();
        let b = solve(Strategy::AStar, &start, &goal, &mut second);
        assert_eq!(a, b);
        assert_eq!(first.nodes_generated(), second.nodes_generated());
    }
}
