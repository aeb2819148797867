//! The CFR solver driver.
//!
//! [`CFRSolver`] owns a [`HistoryTree`] and runs vanilla CFR over it: each
//! iteration makes one pass per non-chance player, pruning is switched on
//! after a warm-up window, and every `reporting_interval` iterations the
//! driver measures best responses and exploitability.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cfr::best_response;
use crate::cfr::config::{CFRConfig, CFRStats, ExploitabilityPoint};
use crate::cfr::error::SolverResult;
use crate::cfr::game::Game;
use crate::cfr::policy::ActionStrategy;
use crate::cfr::storage::{export_key, StorageExport, StrategySnapshot};
use crate::cfr::trace::{NoTrace, TraceSink};
use crate::cfr::tree::HistoryTree;
use crate::cfr::vanilla::VanillaCfr;

/// The main CFR solver.
///
/// # Example
/// ```
/// use cfr_equilibrium::cfr::{CFRConfig, CFRSolver};
/// use cfr_equilibrium::games::MatchingPennies;
///
/// let config = CFRConfig::vanilla().with_iterations(2_000);
/// let mut solver = CFRSolver::from_game(&MatchingPennies::new(), config).unwrap();
/// solver.train(2_000);
///
/// let strategy = solver.get_average_strategy(0, "P0").unwrap();
/// assert!((strategy[0] - 0.5).abs() < 0.05);
/// ```
pub struct CFRSolver {
    /// The game history tree and its tallies.
    tree: HistoryTree,

    /// Configuration for the solver.
    config: CFRConfig,

    /// Current iteration count.
    iteration: u64,

    /// Statistics tracking.
    stats: CFRStats,

    /// Per-node event sink for every CFR pass.
    trace: Box<dyn TraceSink + Send>,
}

impl CFRSolver {
    /// Create a solver over an already built tree.
    ///
    /// The configuration is validated and the tree is cross-checked against
    /// its tally lookup table before any iteration runs.
    pub fn new(tree: HistoryTree, config: CFRConfig) -> SolverResult<Self> {
        config.validate()?;
        tree.verify()?;

        let stats = CFRStats {
            info_sets: tree.tallies().num_info_sets(),
            ..CFRStats::new()
        };
        log::debug!(
            "solver ready: {} nodes, {} info sets, depth {}",
            tree.num_nodes(),
            stats.info_sets,
            tree.max_depth()
        );

        Ok(Self {
            tree,
            config,
            iteration: 0,
            stats,
            trace: Box::new(NoTrace),
        })
    }

    /// Enumerate `game`, build its tree and create a solver over it.
    pub fn from_game<G: Game>(game: &G, config: CFRConfig) -> SolverResult<Self> {
        let tree = HistoryTree::from_game(game)?;
        Self::new(tree, config)
    }

    /// Builder method: send per-node CFR events to `trace`.
    pub fn with_trace(mut self, trace: impl TraceSink + Send + 'static) -> Self {
        self.trace = Box::new(trace);
        self
    }

    /// Run a single iteration: one vanilla CFR pass per player.
    pub fn run_iteration(&mut self) {
        self.iteration += 1;
        let use_pruning = self.config.use_pruning(self.iteration);
        if use_pruning && self.iteration == self.config.pruning_start_iteration + 1 {
            log::info!("iteration {}: pruning enabled", self.iteration);
        }

        let num_players = self.tree.num_players();
        let root = self.tree.root();
        let pi_values = vec![1.0; num_players];
        let cfr = VanillaCfr::new(&self.tree, self.config.pruning_threshold)
            .with_parallelism(self.config.parallel, self.config.parallel_min_actions)
            .with_trace(&*self.trace);

        if self.config.parallel_players {
            (0..num_players).into_par_iter().for_each(|player| {
                cfr.solve(root, player, &pi_values, use_pruning);
            });
        } else {
            for player in 0..num_players {
                let value = cfr.solve(root, player, &pi_values, use_pruning);
                log::trace!("iteration {} P{}: root value {:.6}", self.iteration, player, value);
            }
        }
    }

    /// Train the solver for a specified number of iterations.
    ///
    /// No best responses are measured; use [`train_with_callback`] for
    /// checkpoints.
    ///
    /// [`train_with_callback`]: CFRSolver::train_with_callback
    pub fn train(&mut self, iterations: u64) -> &CFRStats {
        let start_time = Instant::now();
        let elapsed_before = self.stats.elapsed_seconds;

        for _ in 0..iterations {
            self.run_iteration();
        }

        self.update_stats(elapsed_before, start_time);
        &self.stats
    }

    /// Train with a checkpoint every `callback_interval` iterations.
    ///
    /// At each checkpoint exploitability is measured and recorded, progress
    /// is logged, and `callback` decides whether training continues. The
    /// callback is only consulted between iterations.
    pub fn train_with_callback<F>(
        &mut self,
        iterations: u64,
        callback_interval: u64,
        mut callback: F,
    ) -> SolverResult<&CFRStats>
    where
        F: FnMut(&CFRStats) -> ControlFlow<()>,
    {
        let start_time = Instant::now();
        let elapsed_before = self.stats.elapsed_seconds;
        let interval = callback_interval.max(1);

        for _ in 0..iterations {
            self.run_iteration();

            if self.iteration % interval == 0 {
                let point = self.exploitability()?;
                self.update_stats(elapsed_before, start_time);
                log::info!(
                    "iteration {}: exploitability {:.6} (best responses {:?}), {:.0} it/s",
                    self.iteration,
                    point.exploitability,
                    point.best_response,
                    self.stats.iterations_per_second
                );
                self.stats.record_exploitability(point);

                if callback(&self.stats).is_break() {
                    log::info!("training stopped at iteration {}", self.iteration);
                    break;
                }
            }
        }

        self.update_stats(elapsed_before, start_time);
        Ok(&self.stats)
    }

    /// Run `config.iterations` iterations with checkpoints every
    /// `config.reporting_interval`.
    pub fn solve(&mut self) -> SolverResult<&CFRStats> {
        let iterations = self.config.iterations;
        let interval = self.config.reporting_interval;
        self.train_with_callback(iterations, interval, |_| ControlFlow::Continue(()))
    }

    fn update_stats(&mut self, elapsed_before: f64, start_time: Instant) {
        self.stats.iterations = self.iteration;
        self.stats.info_sets = self.tree.tallies().num_info_sets();
        self.stats.elapsed_seconds = elapsed_before + start_time.elapsed().as_secs_f64();
        self.stats.update_rate();
    }

    /// Best-response value of `player` against everyone else playing
    /// `opponents_strategy`.
    ///
    /// Leaves every information set of `player` holding its best-response
    /// action, playable through [`ActionStrategy::BestResponse`].
    pub fn calculate_best_response(&mut self, player: usize, opponents_strategy: ActionStrategy) -> SolverResult<f64> {
        best_response::calculate_best_response(
            &mut self.tree,
            player,
            opponents_strategy,
            self.config.pruning_threshold,
        )
    }

    /// Measure NashConv of the configured best-response strategy profile.
    ///
    /// Returns each player's best-response value, each player's value under
    /// the profile itself, and the summed gap.
    pub fn exploitability(&mut self) -> SolverResult<ExploitabilityPoint> {
        let strategy = self.config.best_response_strategy;
        let profile_utilities = self
            .tree
            .expected_utilities(strategy, self.config.pruning_threshold);
        let best_response = (0..self.tree.num_players())
            .map(|player| self.calculate_best_response(player, strategy))
            .collect::<SolverResult<Vec<_>>>()?;
        Ok(ExploitabilityPoint::new(self.iteration, best_response, profile_utilities))
    }

    /// Expected utility of every player when all follow `strategy`.
    pub fn expected_utilities(&self, strategy: ActionStrategy) -> Vec<f64> {
        self.tree.expected_utilities(strategy, self.config.pruning_threshold)
    }

    /// Get the current (regret-matching) strategy for an information set.
    pub fn get_current_strategy(&self, player: usize, signature: &str) -> Option<Vec<f64>> {
        let tally = self.tree.tallies().find(player, signature)?;
        let mut probs = vec![0.0; tally.num_actions()];
        tally.get_regret_matching_probabilities(&mut probs);
        Some(probs)
    }

    /// Get the average strategy for an information set.
    ///
    /// This returns the time-averaged strategy which converges to Nash equilibrium.
    pub fn get_average_strategy(&self, player: usize, signature: &str) -> Option<Vec<f64>> {
        let tally = self.tree.tallies().find(player, signature)?;
        let mut probs = vec![0.0; tally.num_actions()];
        tally.get_average_strategies(&mut probs);
        Some(probs)
    }

    /// Average strategy of every information set, keyed `P{player}:{signature}`.
    pub fn average_strategies(&self) -> BTreeMap<String, Vec<f64>> {
        self.tree
            .tallies()
            .iter()
            .map(|(_, tally)| {
                let mut probs = vec![0.0; tally.num_actions()];
                tally.get_average_strategies(&mut probs);
                (export_key(tally), probs)
            })
            .collect()
    }

    /// Take a snapshot of current average strategies for CI calculation.
    pub fn snapshot_strategies(&self) -> StrategySnapshot {
        self.tree.tallies().snapshot_strategies()
    }

    /// Mean strategy movement since `snapshot` (see [`TallyStore::calculate_ci`]).
    ///
    /// [`TallyStore::calculate_ci`]: crate::cfr::storage::TallyStore::calculate_ci
    pub fn calculate_ci(&self, snapshot: &StrategySnapshot) -> f64 {
        self.tree.tallies().calculate_ci(snapshot)
    }

    /// Export solver state for reporting.
    pub fn export_state(&self) -> SolverState {
        SolverState {
            iteration: self.iteration,
            average_strategies: self.average_strategies(),
            storage: self.tree.tallies().export(),
            stats: self.stats.clone(),
        }
    }

    /// Export solver state as pretty-printed JSON.
    pub fn export_strategies_json(&self) -> SolverResult<String> {
        Ok(serde_json::to_string_pretty(&self.export_state())?)
    }

    /// Get the current iteration count.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Get the number of information sets in the tree.
    pub fn num_info_sets(&self) -> usize {
        self.tree.tallies().num_info_sets()
    }

    /// Get current statistics.
    pub fn stats(&self) -> &CFRStats {
        &self.stats
    }

    /// Get reference to the tree for analysis.
    pub fn tree(&self) -> &HistoryTree {
        &self.tree
    }

    /// Mutable access to the tree, e.g. for custom best-response runs.
    pub fn tree_mut(&mut self) -> &mut HistoryTree {
        &mut self.tree
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &CFRConfig {
        &self.config
    }
}

/// Serializable solver state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverState {
    /// Current iteration.
    pub iteration: u64,
    /// Average strategy per information set.
    pub average_strategies: BTreeMap<String, Vec<f64>>,
    /// Raw cumulative regrets and strategy sums.
    pub storage: StorageExport,
    /// Statistics.
    pub stats: CFRStats,
}
