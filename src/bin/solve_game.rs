//! Reference Game Solver
//!
//! Runs vanilla CFR on one of the bundled games, reports exploitability at
//! every checkpoint, and optionally writes the average strategies as JSON.
//!
//! ```text
//! solve_game --game kuhn --iterations 20000 --output kuhn.json
//! RUST_LOG=debug solve_game --game litigation --config solver.json
//! ```

use std::fs;
use std::ops::ControlFlow;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use cfr_equilibrium::cfr::{ActionStrategy, CFRConfig, CFRSolver, LogTrace, SolverResult};
use cfr_equilibrium::games::{KuhnPoker, LitigationGame, MatchingPennies};

#[derive(Clone, Copy, ValueEnum)]
enum GameKind {
    /// Matching pennies, zero-sum.
    Pennies,
    /// Matching pennies with a bonus for matching heads.
    #[value(name = "biased-pennies")]
    BiasedPennies,
    /// Three-card Kuhn poker.
    Kuhn,
    /// Pretrial settlement bargaining.
    Litigation,
}

#[derive(Parser)]
#[command(name = "solve_game", about = "Solve a bundled game with vanilla CFR.")]
struct Cli {
    /// Game to solve.
    #[arg(long, value_enum, default_value = "kuhn")]
    game: GameKind,

    /// Solver configuration as JSON; missing fields take defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of iterations (overrides the configuration).
    #[arg(long)]
    iterations: Option<u64>,

    /// Iterations between exploitability checkpoints (overrides the configuration).
    #[arg(long)]
    reporting_interval: Option<u64>,

    /// Evaluate chance nodes in parallel.
    #[arg(long)]
    parallel: bool,

    /// Log every decision evaluation at trace level.
    #[arg(long)]
    trace: bool,

    /// Write the final solver state as JSON.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> SolverResult<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CFRConfig::from_json_file(path)?,
        None => CFRConfig::default(),
    };
    if let Some(iterations) = cli.iterations {
        config.iterations = iterations;
    }
    if let Some(interval) = cli.reporting_interval {
        config.reporting_interval = interval;
    }
    config.parallel |= cli.parallel;

    if let Some(threads) = config.num_threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
            log::warn!("could not size the thread pool to {}: {}", threads, e);
        }
    }

    let solver = match cli.game {
        GameKind::Pennies => CFRSolver::from_game(&MatchingPennies::new(), config)?,
        GameKind::BiasedPennies => CFRSolver::from_game(&MatchingPennies::biased(), config)?,
        GameKind::Kuhn => CFRSolver::from_game(&KuhnPoker::new(), config)?,
        GameKind::Litigation => CFRSolver::from_game(&LitigationGame::new(), config)?,
    };
    let mut solver = if cli.trace { solver.with_trace(LogTrace) } else { solver };

    println!("=== CFR Solver ===\n");
    println!(
        "Tree: {} nodes, {} info sets, depth {}",
        solver.tree().num_nodes(),
        solver.num_info_sets(),
        solver.tree().max_depth()
    );
    println!(
        "Iterations: {} | pruning after {} | checkpoint every {}\n",
        solver.config().iterations,
        solver.config().pruning_start_iteration,
        solver.config().reporting_interval
    );

    let iterations = solver.config().iterations;
    let interval = solver.config().reporting_interval;
    let progress = ProgressBar::new(iterations);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let stats = solver.train_with_callback(iterations, interval, |stats| {
        progress.set_position(stats.iterations);
        if let Some(exploitability) = stats.exploitability {
            progress.set_message(format!("exploitability {:.6}", exploitability));
        }
        ControlFlow::Continue(())
    })?;
    progress.finish();

    println!("\n=== Complete ===");
    println!(
        "{} iterations in {:.2}s ({:.0} it/s)",
        stats.iterations, stats.elapsed_seconds, stats.iterations_per_second
    );
    if let Some(exploitability) = stats.exploitability {
        println!("Exploitability: {:.6}", exploitability);
    }

    let values = solver.expected_utilities(ActionStrategy::AverageStrategy);
    for (player, value) in values.iter().enumerate() {
        println!("P{} value: {:+.6}", player, value);
    }

    println!("\nAverage strategies:");
    for (key, probs) in solver.average_strategies() {
        let formatted: Vec<String> = probs.iter().map(|p| format!("{:.3}", p)).collect();
        println!("  {:<24} [{}]", key, formatted.join(", "));
    }

    if let Some(path) = &cli.output {
        fs::write(path, solver.export_strategies_json()?)?;
        println!("\nSaved JSON: {}", path.display());
    }
    Ok(())
}
