use clap::Parser;
use slide_solver::engine::SearchContext;
use slide_solver::solver::solve_by_name;
use slide_solver::utils::{read_description, write_report};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the puzzle description file
    #[clap(default_value = "input.txt")]
    input: PathBuf,

    /// Where to write the report
    #[clap(short, long, default_value = "output.txt")]
    output: PathBuf,

    /// Strategy to run instead of the one named in the description (DFID, A*, IDA*, DFBnB)
    #[clap(short, long)]
    algorithm: Option<String>,

    /// Deepest bound DFID tries before giving up
    #[clap(long)]
    max_depth: Option<usize>,

    /// Write the result as JSON instead of the text report
    #[clap(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let description = match read_description(&args.input) {
        Ok(description) => description,
        Err(err) => {
            error!(path = %args.input.display(), error = %err, "cannot load puzzle");
            return ExitCode::FAILURE;
        }
    };
    info!(path = %args.input.display(), "loaded puzzle\n{}", description.board);

    let algorithm = args
        .algorithm
        .clone()
        .unwrap_or_else(|| description.algorithm.clone());
    let mut options = description.options();
    options.max_depth = args.max_depth;

    let start = description.start_state();
    let goal = description.goal();
    let mut ctx = SearchContext::with_options(options);

    let started = Instant::now();
    let result = solve_by_name(&algorithm, &start, &goal, &mut ctx);
    let elapsed = started.elapsed();

    let written = if args.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => fs::write(&args.output, json + "\n"),
            Err(err) => {
                error!(error = %err, "cannot serialize result");
                return ExitCode::FAILURE;
            }
        }
    } else {
        write_report(&args.output, &result, description.with_time.then_some(elapsed))
    };
    if let Err(err) = written {
        error!(path = %args.output.display(), error = %err, "cannot write report");
        return ExitCode::FAILURE;
    }
    info!(
        path = %args.output.display(),
        status = ?result.status,
        seconds = elapsed.as_secs_f64(),
        "report written"
    );
    ExitCode::SUCCESS
}
