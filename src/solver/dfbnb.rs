//! Depth-first branch-and-bound.
//!
//! Uses the same pre-order/post-order stack as IDA*, but a single pass with a global cost bound
//! that tightens every time a cheaper goal is generated.
use super::ida_star::{Admission, PathStack};
use super::{log_open, SearchResult, Strategy};
use crate::engine::{Goal, Move, SearchContext, State, Tile};
use crate::heuristics::annotate;
use tracing::debug;

/// Starting cost ceiling: `(R*C)!` scaled by the dearest tile price.
///
/// Falls back to `u64::MAX` once the product no longer fits.
///
/// # Examples
/// ```
/// use slide_solver::engine::{Board, State};
/// use slide_solver::solver::dfbnb::initial_bound;
///
/// let start = State::new(Board::uniform(2, 2, &[1, 2, 0, 3], 1).unwrap());
/// assert_eq!(initial_bound(&start), 24);
///
/// let large = State::new(Board::uniform(5, 5, &(0..25u32).collect::<Vec<_>>(), 1).unwrap());
/// assert_eq!(initial_bound(&large), u64::MAX);
/// ```
pub fn initial_bound(start: &State) -> u64 {
    let board = start.board();
    let cells = (board.rows() * board.cols()) as u64;
    let price = board.tiles().map(Tile::move_price).max().unwrap_or(1).max(1);
    (1..=cells)
        .try_fold(price, |acc, n| acc.checked_mul(n))
        .unwrap_or(u64::MAX)
}

/// Runs DFBnB from `start`.
///
/// On each pre-order visit the children with `f` below the bound are sorted ascending by `f`.
/// A goal child tightens the bound to its cost and is recorded rather than pushed; the rest are
/// pushed in reverse so the lowest `f` is popped first. Children at or above the bound, including
/// those left behind after a tightening, are pruned.
pub fn search(start: &State, goal: &Goal, ctx: &mut SearchContext) -> SearchResult {
    let mut root = start.clone();
    annotate(&mut root, goal);
    if goal.is_reached(&root) {
        return SearchResult::solved(&root, ctx);
    }

    let mut bound = initial_bound(&root);
    let mut best: Option<Vec<Move>> = None;
    if let Some(trace) = ctx.trace_mut() {
        trace.bounds.push(bound);
    }
    debug!(bound, "DFBnB initial bound");

    let mut stack = PathStack::default();
    stack.push(root);

    while let Some(frame) = stack.pop() {
        if frame.expanded {
            continue;
        }
        if frame.state.f() >= bound {
            // Pushed before the bound tightened.
            stack.reopen_expanded(frame);
            continue;
        }
        log_open(ctx, Strategy::DfBnB, stack.keys());

        let mut children: Vec<State> = frame
            .state
            .successors(ctx)
            .into_iter()
            .map(|mut child| {
                annotate(&mut child, goal);
                child
            })
            .filter(|child| child.f() < bound)
            .collect();
        stack.reopen_expanded(frame);
        // Stable: equal f keeps the direction order.
        children.sort_by_key(State::f);

        let mut staged = Vec::with_capacity(children.len());
        for child in children {
            if child.f() >= bound {
                break;
            }
            if goal.is_reached(&child) {
                bound = child.g();
                debug!(bound, nodes = ctx.nodes_generated(), "DFBnB bound tightened");
                if let Some(trace) = ctx.trace_mut() {
                    trace.bounds.push(bound);
                }
                best = Some(child.path().to_vec());
            } else {
                staged.push(child);
            }
        }

        for child in staged.into_iter().rev() {
            if let Admission::Admit = stack.admit(&child) {
                stack.push(child);
            }
        }
    }

    match best {
        Some(path) => SearchResult::from_path(path, bound, ctx),
        None => SearchResult::no_path(ctx),
    }
}
