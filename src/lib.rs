//! # Slide Solver Library
//!
//! This library models a weighted sliding-tile puzzle and solves it with four interchangeable
//! state-space searches.
//!
//! Tiles come in two cost classes. Constrained tiles cost 1 per move but may only move a
//! limited number of times; free tiles move without limit at a higher price. A solution is a
//! sequence of moves from the start layout to the ascending goal layout.
//!
//! It is used by two binaries:
//! - `puzzle_solver`: Reads a puzzle description file, runs the requested strategy and writes
//!   the report.
//! - `strategy_evaluator`: Runs every strategy over seeded scrambled puzzles and prints
//!   averages.
//!
//! ## Modules
//! - `engine`: Tiles, boards, search states, the move generator, the goal layout and the
//!   run-scoped `SearchContext`.
//! - `heuristics`: Manhattan distance plus linear conflict.
//! - `solver`: DFID, A*, IDA* and DFBnB, and the `solve`/`solve_by_name` entry points.
//! - `utils`: Puzzle description parsing, report rendering, path replay and scrambled puzzle
//!   generation.

pub mod engine;
pub mod heuristics;
pub mod solver;
pub mod utils;
