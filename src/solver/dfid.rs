//! Depth-first iterative deepening.
//!
//! Each bound runs a depth-limited DFS. Cycle avoidance only covers the states on the current
//! path; the set is emptied as the recursion unwinds, so memory stays proportional to depth.
use super::{log_open, SearchResult, Strategy};
use crate::engine::{Direction, Goal, SearchContext, State, StateKey};
use std::collections::HashSet;
use tracing::debug;

/// Outcome of one depth-limited traversal.
#[derive(Debug)]
enum DepthOutcome {
    Found(State),
    /// Some branch hit the depth bound, so a deeper bound might still succeed.
    Cutoff,
    /// Every branch ended without a goal and without hitting the bound.
    Exhausted,
}

/// Runs DFID with bounds `1, 2, 3, …` up to `SearchOptions::max_depth`.
///
/// Returns as soon as a bound does not report a cutoff: either the goal was found, or the
/// reachable space is exhausted. Reaching the depth ceiling also yields no path.
pub fn search(start: &State, goal: &Goal, ctx: &mut SearchContext) -> SearchResult {
    if goal.is_reached(start) {
        return SearchResult::solved(start, ctx);
    }

    let max_depth = ctx.options().max_depth.unwrap_or(usize::MAX);
    for limit in 1..=max_depth {
        debug!(limit, nodes = ctx.nodes_generated(), "DFID depth bound");
        let mut visited = HashSet::new();
        match limited_dfs(start, goal, limit, &mut visited, ctx) {
            DepthOutcome::Found(state) => return SearchResult::solved(&state, ctx),
            DepthOutcome::Exhausted => return SearchResult::no_path(ctx),
            DepthOutcome::Cutoff => {}
        }
    }

    debug!(max_depth, "DFID depth ceiling reached");
    SearchResult::no_path(ctx)
}

fn limited_dfs(
    state: &State,
    goal: &Goal,
    limit: usize,
    visited: &mut HashSet<StateKey>,
    ctx: &mut SearchContext,
) -> DepthOutcome {
    if goal.is_reached(state) {
        return DepthOutcome::Found(state.clone());
    }
    if limit == 0 {
        return DepthOutcome::Cutoff;
    }

    visited.insert(state.key().clone());
    log_open(ctx, Strategy::Dfid, visited.iter());

    let mut cutoff = false;
    for direction in Direction::ALL {
        let Some(child) = state.try_move(direction, ctx) else {
            continue;
        };
        if visited.contains(child.key()) {
            continue;
        }
        match limited_dfs(&child, goal, limit - 1, visited, ctx) {
            DepthOutcome::Found(found) => return DepthOutcome::Found(found),
            DepthOutcome::Cutoff => cutoff = true,
            DepthOutcome::Exhausted => {}
        }
    }

    visited.remove(state.key());
    if cutoff {
        DepthOutcome::Cutoff
    } else {
        DepthOutcome::Exhausted
    }
}
