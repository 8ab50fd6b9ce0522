//! Iterative deepening A* on an explicit stack.
//!
//! Each iteration is a depth-first traversal bounded by an f-threshold. A node is pushed once
//! for its pre-order visit; on that visit it is pushed back marked as expanded, so popping it
//! again is its post-order return. The next threshold is the smallest f that exceeded the
//! current one.
use super::{log_open, SearchResult, Strategy};
use crate::engine::{Goal, SearchContext, State, StateKey};
use crate::heuristics::annotate;
use std::collections::HashMap;
use tracing::debug;

/// A stack entry. `id` ties it to its slot in the key index.
pub(crate) struct Frame {
    pub(crate) state: State,
    pub(crate) id: u64,
    pub(crate) expanded: bool,
}

/// What the key index remembers about the node currently holding a key.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Slot {
    pub(crate) id: u64,
    pub(crate) f: u64,
    pub(crate) expanded: bool,
}

/// Outcome of checking a child against the key index.
pub(crate) enum Admission {
    /// The key is free (or was just freed by evicting a worse open node).
    Admit,
    /// An expanded node on the current path, or an open node at least as good, holds the key.
    Reject,
}

/// Explicit stack plus key index shared by IDA* and DFBnB.
#[derive(Default)]
pub(crate) struct PathStack {
    frames: Vec<Frame>,
    index: HashMap<StateKey, Slot>,
    next_id: u64,
}

impl PathStack {
    pub(crate) fn push(&mut self, state: State) {
        let id = self.next_id;
        self.next_id += 1;
        self.index.insert(
            state.key().clone(),
            Slot {
                id,
                f: state.f(),
                expanded: false,
            },
        );
        self.frames.push(Frame {
            state,
            id,
            expanded: false,
        });
    }

    /// Pops the next frame that still owns its key.
    ///
    /// A post-order frame releases its key before being returned.
    pub(crate) fn pop(&mut self) -> Option<Frame> {
        while let Some(frame) = self.frames.pop() {
            let live = self
                .index
                .get(frame.state.key())
                .is_some_and(|slot| slot.id == frame.id);
            if !live {
                // Evicted by a cheaper duplicate.
                continue;
            }
            if frame.expanded {
                self.index.remove(frame.state.key());
            }
            return Some(frame);
        }
        None
    }

    /// Marks a freshly popped pre-order frame as expanded and puts it back on the stack.
    pub(crate) fn reopen_expanded(&mut self, mut frame: Frame) {
        frame.expanded = true;
        if let Some(slot) = self.index.get_mut(frame.state.key()) {
            slot.expanded = true;
        }
        self.frames.push(frame);
    }

    /// Decides whether `child` may be pushed, evicting a worse open duplicate if needed.
    pub(crate) fn admit(&mut self, child: &State) -> Admission {
        match self.index.get(child.key()) {
            None => Admission::Admit,
            Some(slot) if slot.expanded || slot.f <= child.f() => Admission::Reject,
            Some(_) => {
                // The stale frame stays on the stack and is skipped when popped.
                self.index.remove(child.key());
                Admission::Admit
            }
        }
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &StateKey> {
        self.index.keys()
    }
}

/// Runs IDA* starting from `threshold = h(start)`.
///
/// Children above the threshold only lower `min_excess`. Children that reach the goal end
/// the search immediately. When an iteration ends without any child above the threshold,
/// the space is exhausted and there is no path.
pub fn search(start: &State, goal: &Goal, ctx: &mut SearchContext) -> SearchResult {
    let mut root = start.clone();
    annotate(&mut root, goal);
    if goal.is_reached(&root) {
        return SearchResult::solved(&root, ctx);
    }

    let mut threshold = root.h();
    loop {
        debug!(threshold, nodes = ctx.nodes_generated(), "IDA* iteration");
        if let Some(trace) = ctx.trace_mut() {
            trace.thresholds.push(threshold);
        }

        let mut min_excess: Option<u64> = None;
        let mut stack = PathStack::default();
        stack.push(root.clone());

        while let Some(frame) = stack.pop() {
            if frame.expanded {
                continue;
            }
            log_open(ctx, Strategy::IdaStar, stack.keys());

            let children = frame.state.successors(ctx);
            stack.reopen_expanded(frame);

            for mut child in children {
                annotate(&mut child, goal);
                if child.f() > threshold {
                    min_excess = Some(min_excess.map_or(child.f(), |m| m.min(child.f())));
                    continue;
                }
                if let Admission::Reject = stack.admit(&child) {
                    continue;
                }
                if goal.is_reached(&child) {
                    return SearchResult::solved(&child, ctx);
                }
                stack.push(child);
            }
        }

        match min_excess {
            Some(next) => threshold = next,
            None => return SearchResult::no_path(ctx),
        }
    }
}
