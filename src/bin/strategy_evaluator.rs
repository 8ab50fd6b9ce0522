use slide_solver::engine::{Goal, SearchContext};
use slide_solver::solver::{solve, Strategy};
use slide_solver::utils::random_puzzle;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const NUM_PUZZLES_FOR_EVALUATION: usize = 10;
const START_SEED: u64 = 0;
const ROWS: usize = 3;
const COLS: usize = 3;
// DFID slows down quickly past this depth.
const SCRAMBLE_STEPS: usize = 10;

#[derive(Default)]
struct Totals {
    solved: usize,
    nodes: u64,
    cost: u64,
    seconds: f64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // The top row is constrained, with enough budget to undo the scramble.
    let budgets: BTreeMap<u32, u32> = (1..=COLS as u32)
        .map(|value| (value, SCRAMBLE_STEPS as u32))
        .collect();
    let goal = Goal::ascending(ROWS, COLS);

    let mut totals: HashMap<Strategy, Totals> = HashMap::new();

    println!(
        "Starting strategy evaluation for {} puzzles ({}x{}, {} scramble steps)...",
        NUM_PUZZLES_FOR_EVALUATION, ROWS, COLS, SCRAMBLE_STEPS
    );

    for puzzle_idx in 0..NUM_PUZZLES_FOR_EVALUATION {
        let seed = START_SEED + puzzle_idx as u64;
        let start = match random_puzzle(ROWS, COLS, SCRAMBLE_STEPS, &budgets, seed) {
            Ok(start) => start,
            Err(err) => {
                warn!(seed, error = %err, "skipping puzzle");
                continue;
            }
        };

        println!("\nEvaluating Puzzle {} (Seed: {})\n{}", puzzle_idx, seed, start.board());

        for strategy in Strategy::ALL {
            let mut ctx = SearchContext::new();
            let started = Instant::now();
            let result = solve(strategy, &start, &goal, &mut ctx);
            let seconds = started.elapsed().as_secs_f64();

            let entry = totals.entry(strategy).or_default();
            entry.nodes += result.nodes_generated;
            entry.seconds += seconds;
            match result.total_cost {
                Some(cost) if result.is_solved() => {
                    entry.solved += 1;
                    entry.cost += cost;
                    println!(
                        "  Strategy: {:<6}, Cost: {:<5}, Nodes: {:<8}, Path: {}",
                        strategy,
                        cost,
                        result.nodes_generated,
                        result.path_string()
                    );
                }
                _ => println!(
                    "  Strategy: {:<6}, no path, Nodes: {}",
                    strategy, result.nodes_generated
                ),
            }
        }
    }

    println!("\n--- Evaluation Complete ---");
    println!("\n--- Averages ---");
    for strategy in Strategy::ALL {
        let Some(total) = totals.get(&strategy) else {
            println!("Strategy {}: No runs recorded.", strategy);
            continue;
        };
        let runs = NUM_PUZZLES_FOR_EVALUATION as f64;
        let avg_cost = if total.solved > 0 {
            total.cost as f64 / total.solved as f64
        } else {
            0.0
        };
        println!(
            "Strategy {:<6}: Solved = {}/{}, Average Cost = {:.2}, Average Nodes = {:.1}, Average Time = {:.4}s",
            strategy,
            total.solved,
            NUM_PUZZLES_FOR_EVALUATION,
            avg_cost,
            total.nodes as f64 / runs,
            total.seconds / runs
        );
    }
}
