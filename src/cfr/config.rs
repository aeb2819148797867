//! Configuration options for the CFR solver.
//!
//! This module provides the driver configuration (iteration count, pruning
//! warm-up, reporting cadence, parallelism) and the statistics it records.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cfr::error::{ConfigError, SolverResult};
use crate::cfr::policy::ActionStrategy;
use crate::cfr::vanilla::DEFAULT_PARALLEL_MIN_ACTIONS;

/// Configuration for the CFR solver.
///
/// # Example
/// ```
/// use cfr_equilibrium::cfr::CFRConfig;
///
/// let config = CFRConfig::default();
/// assert!(config.pruning_start_iteration > 0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CFRConfig {
    /// Number of iterations `CFRSolver::solve` runs.
    pub iterations: u64,

    /// Pruning is off for iterations `1..=pruning_start_iteration` and on
    /// afterwards. `u64::MAX` disables pruning entirely.
    pub pruning_start_iteration: u64,

    /// Regret-matching probabilities below this floor are pruned to zero.
    pub pruning_threshold: f64,

    /// Best responses are measured every `reporting_interval` iterations.
    pub reporting_interval: u64,

    /// Evaluate chance nodes on the rayon pool.
    pub parallel: bool,

    /// Minimum chance fan-out that goes parallel.
    pub parallel_min_actions: usize,

    /// Run the optimizing players' passes of one iteration concurrently.
    ///
    /// Each pass only writes its own player's tallies, but reads the others'
    /// while they are being updated, so results are no longer reproducible.
    pub parallel_players: bool,

    /// Opponent policy used for best-response measurements.
    pub best_response_strategy: ActionStrategy,

    /// Number of threads for the rayon pool. `None` uses all cores.
    pub num_threads: Option<usize>,
}

impl Default for CFRConfig {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            pruning_start_iteration: 100,
            pruning_threshold: 1e-7,
            reporting_interval: 1_000,
            parallel: false,
            parallel_min_actions: DEFAULT_PARALLEL_MIN_ACTIONS,
            parallel_players: false,
            best_response_strategy: ActionStrategy::AverageStrategy,
            num_threads: None,
        }
    }
}

impl CFRConfig {
    /// Create a new CFRConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain vanilla CFR: no pruning, no parallelism.
    pub fn vanilla() -> Self {
        Self {
            pruning_start_iteration: u64::MAX,
            ..Default::default()
        }
    }

    /// Pruning from the start and parallel chance fan-out.
    pub fn fast() -> Self {
        Self {
            pruning_start_iteration: 10,
            parallel: true,
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> SolverResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method: set the iteration count.
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Builder method: set the last unpruned iteration.
    pub fn with_pruning_start(mut self, iteration: u64) -> Self {
        self.pruning_start_iteration = iteration;
        self
    }

    /// Builder method: set the pruning probability floor.
    pub fn with_pruning_threshold(mut self, threshold: f64) -> Self {
        self.pruning_threshold = threshold;
        self
    }

    /// Builder method: set the reporting interval.
    pub fn with_reporting_interval(mut self, interval: u64) -> Self {
        self.reporting_interval = interval;
        self
    }

    /// Builder method: enable or disable parallel chance fan-out.
    pub fn with_parallel(mut self, enable: bool) -> Self {
        self.parallel = enable;
        self
    }

    /// Builder method: enable or disable parallel player passes.
    pub fn with_parallel_players(mut self, enable: bool) -> Self {
        self.parallel_players = enable;
        self
    }

    /// Builder method: set the opponents' policy for best responses.
    pub fn with_best_response_strategy(mut self, strategy: ActionStrategy) -> Self {
        self.best_response_strategy = strategy;
        self
    }

    /// Builder method: set number of threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Whether iteration `iteration` (1-based) runs with pruning.
    pub fn use_pruning(&self, iteration: u64) -> bool {
        iteration > self.pruning_start_iteration
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reporting_interval == 0 {
            return Err(ConfigError::ZeroReportingInterval);
        }
        if !(0.0..1.0).contains(&self.pruning_threshold) {
            return Err(ConfigError::InvalidPruningThreshold(self.pruning_threshold));
        }
        if self.parallel_min_actions < 2 {
            return Err(ConfigError::InvalidParallelThreshold(self.parallel_min_actions));
        }
        Ok(())
    }
}

/// Statistics tracked during CFR training.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CFRStats {
    /// Total number of iterations completed.
    pub iterations: u64,

    /// Number of information sets in the tree.
    pub info_sets: usize,

    /// Total time spent training (in seconds).
    pub elapsed_seconds: f64,

    /// Iterations per second.
    pub iterations_per_second: f64,

    /// Most recent exploitability (NashConv), if measured.
    pub exploitability: Option<f64>,

    /// History of exploitability measurements.
    pub exploitability_history: Vec<ExploitabilityPoint>,
}

/// A single best-response measurement at a specific iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploitabilityPoint {
    /// Iteration number when this measurement was taken.
    pub iteration: u64,
    /// Best-response value of each player.
    pub best_response: Vec<f64>,
    /// Value of each player under the measured profile.
    pub profile_utilities: Vec<f64>,
    /// Sum over players of best response minus profile value.
    pub exploitability: f64,
}

impl ExploitabilityPoint {
    /// Build a point, computing NashConv from the two vectors.
    pub fn new(iteration: u64, best_response: Vec<f64>, profile_utilities: Vec<f64>) -> Self {
        let exploitability = best_response
            .iter()
            .zip(&profile_utilities)
            .map(|(br, u)| br - u)
            .sum();
        Self {
            iteration,
            best_response,
            profile_utilities,
            exploitability,
        }
    }
}

impl CFRStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update iterations per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.iterations_per_second = self.iterations as f64 / self.elapsed_seconds;
        }
    }

    /// Record an exploitability measurement.
    pub fn record_exploitability(&mut self, point: ExploitabilityPoint) {
        self.exploitability = Some(point.exploitability);
        self.exploitability_history.push(point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(CFRConfig::default().validate().is_ok());
        assert!(CFRConfig::vanilla().validate().is_ok());
        assert!(CFRConfig::fast().validate().is_ok());
    }

    #[test]
    fn test_pruning_warm_up() {
        let config = CFRConfig::default().with_pruning_start(5);
        assert!(!config.use_pruning(5));
        assert!(config.use_pruning(6));
        assert!(!CFRConfig::vanilla().use_pruning(u64::MAX));
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(
            CFRConfig::default().with_reporting_interval(0).validate(),
            Err(ConfigError::ZeroReportingInterval)
        );
        assert_eq!(
            CFRConfig::default().with_pruning_threshold(1.5).validate(),
            Err(ConfigError::InvalidPruningThreshold(1.5))
        );
        let config = CFRConfig {
            parallel_min_actions: 1,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidParallelThreshold(1)));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CFRConfig =
            serde_json::from_str(r#"{"iterations": 50, "best_response_strategy": "regret_matching"}"#).unwrap();
        assert_eq!(config.iterations, 50);
        assert_eq!(config.best_response_strategy, ActionStrategy::RegretMatching);
        assert_eq!(config.reporting_interval, CFRConfig::default().reporting_interval);
    }

    #[test]
    fn test_exploitability_point() {
        let point = ExploitabilityPoint::new(10, vec![0.5, 0.25], vec![0.25, -0.25]);
        assert_eq!(point.exploitability, 0.75);

        let mut stats = CFRStats::new();
        stats.record_exploitability(point);
        assert_eq!(stats.exploitability, Some(0.75));
        assert_eq!(stats.exploitability_history.len(), 1);
    }
}
