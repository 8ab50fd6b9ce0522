//! A* search.
//!
//! The frontier is a binary heap keyed by `f`, paired with an index from state key to the
//! handle of the live frontier entry for that key. Replacing a frontier entry with a cheaper
//! duplicate re-points the index at a new handle; the superseded heap entry is dropped when it
//! surfaces, so exactly the stale instance is discarded.
use super::{log_open, SearchResult, Strategy};
use crate::engine::{Goal, SearchContext, State, StateKey};
use crate::heuristics::annotate;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use tracing::debug;

/// Handle and `f` of the live frontier entry for a key.
#[derive(Clone, Copy, Debug)]
struct OpenSlot {
    handle: u64,
    f: u64,
}

struct OpenEntry {
    f: u64,
    handle: u64,
    state: State,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for a min-heap on f; older entries first among equals.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.handle.cmp(&self.handle))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.handle == other.handle
    }
}

impl Eq for OpenEntry {}

/// Frontier with O(1) membership lookup and keyed replacement.
#[derive(Default)]
struct Frontier {
    heap: BinaryHeap<OpenEntry>,
    slots: HashMap<StateKey, OpenSlot>,
    next_handle: u64,
}

impl Frontier {
    fn push(&mut self, state: State) {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.slots.insert(
            state.key().clone(),
            OpenSlot {
                handle,
                f: state.f(),
            },
        );
        self.heap.push(OpenEntry {
            f: state.f(),
            handle,
            state,
        });
    }

    /// Removes and returns the live state with the lowest `f`.
    fn pop(&mut self) -> Option<State> {
        while let Some(entry) = self.heap.pop() {
            let live = self
                .slots
                .get(entry.state.key())
                .is_some_and(|slot| slot.handle == entry.handle);
            if live {
                self.slots.remove(entry.state.key());
                return Some(entry.state);
            }
        }
        None
    }

    fn get(&self, key: &StateKey) -> Option<OpenSlot> {
        self.slots.get(key).copied()
    }

    fn keys(&self) -> impl Iterator<Item = &StateKey> {
        self.slots.keys()
    }

    fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Best-first search on `f = g + h`.
///
/// A child whose key is already closed is discarded. A child whose key is on the frontier
/// replaces that entry only if its `f` is strictly lower.
pub fn search(start: &State, goal: &Goal, ctx: &mut SearchContext) -> SearchResult {
    let mut root = start.clone();
    annotate(&mut root, goal);

    let mut frontier = Frontier::default();
    let mut closed: HashSet<StateKey> = HashSet::new();
    frontier.push(root);

    loop {
        log_open(ctx, Strategy::AStar, frontier.keys());
        let Some(current) = frontier.pop() else {
            break;
        };

        if goal.is_reached(&current) {
            return SearchResult::solved(&current, ctx);
        }

        if let Some(trace) = ctx.trace_mut() {
            trace.expanded_f.push(current.f());
        }
        closed.insert(current.key().clone());

        for mut child in current.successors(ctx) {
            if closed.contains(child.key()) {
                continue;
            }
            annotate(&mut child, goal);
            if let Some(slot) = frontier.get(child.key()) {
                if slot.f <= child.f() {
                    continue;
                }
                debug!(key = %child.key(), old_f = slot.f, new_f = child.f(), "A* frontier entry improved");
            }
            frontier.push(child);
        }
    }

    debug!(closed = closed.len(), open = frontier.len(), "A* frontier exhausted");
    SearchResult::no_path(ctx)
}
