//! CFR (Counterfactual Regret Minimization) Solver Module.
//!
//! This module provides a vanilla CFR implementation over an explicit game
//! history tree, together with a generalized best-response engine for
//! measuring exploitability.
//!
//! # Overview
//!
//! CFR is an iterative algorithm that converges to Nash equilibrium by:
//! 1. Computing counterfactual regret for each action at each decision point
//! 2. Updating strategies to minimize regret over time
//! 3. Averaging strategies across iterations to converge to equilibrium
//!
//! # Pipeline
//!
//! 1. A type implementing [`Game`] is walked once by [`enumerate_paths`].
//! 2. The paths are folded into a [`HistoryTree`]: one node per distinct
//!    history prefix, with every decision node pointing at the shared
//!    [`InformationSetTally`] of its information set.
//! 3. [`CFRSolver`] runs [`VanillaCfr`] passes over the tree, enabling
//!    regret pruning after a warm-up window.
//! 4. [`calculate_best_response`] measures how exploitable the resulting
//!    profile is and records a playable best response.
//!
//! # Example
//!
//! ```
//! use cfr_equilibrium::cfr::{ActionStrategy, CFRConfig, CFRSolver};
//! use cfr_equilibrium::games::KuhnPoker;
//!
//! let mut solver = CFRSolver::from_game(&KuhnPoker::new(), CFRConfig::default()).unwrap();
//! let stats = solver.train(500);
//! println!("Trained {} info sets in {:.2}s", stats.info_sets, stats.elapsed_seconds);
//!
//! // Player 1 holding the Jack, before any action.
//! let strategy = solver.get_average_strategy(0, "0:").unwrap();
//! assert_eq!(strategy.len(), 2);
//!
//! let best = solver.calculate_best_response(1, ActionStrategy::AverageStrategy).unwrap();
//! assert!(best.is_finite());
//! ```
//!
//! # Theory
//!
//! **Regret**: The difference between the value of an action and the value of the current strategy.
//! ```text
//! Regret(a) = Value(a) - Value(current_strategy)
//! ```
//!
//! **Regret Matching**: Set strategy proportional to positive regrets.
//! ```text
//! Strategy(a) = max(0, Regret(a)) / sum(max(0, Regret(a')))
//! ```
//!
//! **Convergence**: Average regret decreases as O(1/sqrt(T)), and the average strategy
//! converges to Nash equilibrium in two-player zero-sum games.
//!
//! # References
//!
//! - Zinkevich, M., et al. "Regret Minimization in Games with Incomplete Information" (2007)
//! - Lanctot, M. "Monte Carlo Sampling and Regret Minimization for Equilibrium
//!   Computation and Decision-Making in Large Extensive Form Games" (2013)

pub mod atomic;
pub mod best_response;
pub mod chance;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod game;
pub mod policy;
pub mod solver;
pub mod storage;
pub mod tally;
pub mod trace;
pub mod tree;
pub mod vanilla;

// Re-export main types for convenient access
pub use best_response::{calculate_best_response, BestResponse};
pub use chance::{ChanceNode, ChanceProbabilities};
pub use config::{CFRConfig, CFRStats, ExploitabilityPoint};
pub use enumerate::{enumerate_paths, GamePath, PathStep, StepKind};
pub use error::{ConfigError, SolverError, SolverResult};
pub use game::{ActionCode, Decision, Game, GameState, InfoState, Player};
pub use policy::{action_probabilities, ActionStrategy};
pub use solver::{CFRSolver, SolverState};
pub use storage::{StorageExport, StrategySnapshot, TallyId, TallyStore};
pub use tally::InformationSetTally;
pub use trace::{BestResponseTrace, DecisionTrace, LogTrace, NoTrace, TraceSink};
pub use tree::{HistoryNode, HistoryTree, NodeId, Playout, MAX_TREE_DEPTH};
pub use vanilla::{inverse_pi, next_pi_values, VanillaCfr};
