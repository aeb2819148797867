//! Game implementations for the CFR solver.
//!
//! This module contains implementations of various games that can be solved
//! using the generic CFR solver. These serve as:
//!
//! 1. **Validation**: Games with known Nash equilibria (matching pennies,
//!    Kuhn Poker) verify that the CFR implementation is correct.
//!
//! 2. **Examples**: Demonstrate how to implement the `Game` trait for new games,
//!    including state-dependent chance probabilities ([`litigation`]).
//!
//! 3. **Benchmarks**: Provide standardized games for performance testing.
//!
//! ## Available Games
//!
//! - [`pennies`]: Matching pennies played sequentially, plus a biased variant
//! - [`kuhn`]: Kuhn Poker - A simplified 3-card poker game with known Nash equilibrium
//! - [`litigation`]: Pretrial settlement bargaining with noisy signals
//!
//! ## Adding New Games
//!
//! To add a new game:
//!
//! 1. Create a new module under `src/games/`
//! 2. Define state and info state types and the decision list
//! 3. Implement the `Game` trait
//! 4. Add tests that verify expected behavior
//!
//! See the [`kuhn`] module for a complete example.

pub mod kuhn;
pub mod litigation;
pub mod pennies;

pub use kuhn::KuhnPoker;
pub use litigation::{LitigationConfig, LitigationGame};
pub use pennies::MatchingPennies;
