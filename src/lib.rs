//! # CFR Equilibrium
//!
//! A vanilla Counterfactual Regret Minimization (CFR) solver for computing
//! Nash equilibrium strategies in extensive-form games with chance and
//! imperfect information.
//!
//! ## Features
//!
//! - **Explicit game tree**: Any game implementing the `Game` trait is
//!   enumerated once into an arena-backed history tree
//! - **Shared information sets**: Every history in an information set points
//!   at the same tally
//! - **Regret pruning**: Optional after a warm-up window
//! - **Parallel chance fan-out**: Chance layers run on rayon with atomic tallies
//! - **Generalized best response**: Exploitability measurement and playable
//!   best responses
//!
//! ## Quick Start
//!
//! ```
//! use cfr_equilibrium::{CFRConfig, CFRSolver};
//! use cfr_equilibrium::games::MatchingPennies;
//!
//! let mut solver = CFRSolver::from_game(&MatchingPennies::new(), CFRConfig::default()).unwrap();
//! solver.train(1_000);
//!
//! let strategy = solver.get_average_strategy(0, "P0").unwrap();
//! assert!((strategy[0] - 0.5).abs() < 0.1);
//! ```
//!
//! ## Modules
//!
//! - [`cfr`]: Core CFR algorithm and solver
//! - [`games`]: Example game implementations (Kuhn Poker, etc.)
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   paths   ┌──────────────┐  tallies  ┌──────────────┐
//! │  Game trait  │ ────────▶ │ History tree │ ◀───────▶ │  Vanilla CFR │
//! │ (enumerated) │           │   (arena)    │           │    + GEBR    │
//! └──────────────┘           └──────────────┘           └──────────────┘
//!                                                              ▲
//!                                                              │
//!                                                       ┌──────────────┐
//!                                                       │  CFRSolver   │
//!                                                       │   driver     │
//!                                                       └──────────────┘
//! ```

#![warn(missing_docs)]

/// CFR (Counterfactual Regret Minimization) solver module.
///
/// This is the core module containing the tree, the CFR iterator and the
/// best-response engine.
pub mod cfr;

/// Game implementations module.
///
/// Contains example games like Kuhn Poker for testing and validation.
pub mod games;

// Re-export commonly used types at crate root for convenience
pub use cfr::{
    ActionStrategy, CFRConfig, CFRSolver, CFRStats, Decision, Game, GameState, HistoryTree, InfoState,
    SolverError, SolverResult,
};
