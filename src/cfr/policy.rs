//! Action-selection policies.
//!
//! The set of policies is closed, so they are an enum with one dispatch
//! function rather than trait objects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cfr::error::SolverError;
use crate::cfr::game::Decision;
use crate::cfr::tally::InformationSetTally;

/// How a decision's action distribution is derived from its tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStrategy {
    /// Current regret-matching strategy.
    RegretMatching,
    /// Regret matching with tiny probabilities pruned.
    RegretMatchingWithPruning,
    /// Time-averaged strategy (the equilibrium approximation).
    #[default]
    AverageStrategy,
    /// One-hot on the action chosen by the last best-response computation.
    BestResponse,
}

impl ActionStrategy {
    /// All variants.
    pub const ALL: [ActionStrategy; 4] = [
        ActionStrategy::RegretMatching,
        ActionStrategy::RegretMatchingWithPruning,
        ActionStrategy::AverageStrategy,
        ActionStrategy::BestResponse,
    ];

    /// Stable name, matching the serde representation.
    pub fn name(self) -> &'static str {
        match self {
            ActionStrategy::RegretMatching => "regret_matching",
            ActionStrategy::RegretMatchingWithPruning => "regret_matching_with_pruning",
            ActionStrategy::AverageStrategy => "average_strategy",
            ActionStrategy::BestResponse => "best_response",
        }
    }
}

impl fmt::Display for ActionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionStrategy {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == normalized)
            .ok_or_else(|| SolverError::UnsupportedActionStrategy(s.to_string()))
    }
}

/// Fill `probs` with the action distribution at a decision.
///
/// A forced action (`always_do_action`) overrides every policy.
pub fn action_probabilities(
    strategy: ActionStrategy,
    decision: &Decision,
    tally: &InformationSetTally,
    pruning_threshold: f64,
    probs: &mut [f64],
) {
    if let Some(forced) = decision.always_do_action {
        one_hot(forced as usize - 1, probs);
        return;
    }
    match strategy {
        ActionStrategy::RegretMatching => tally.get_regret_matching_probabilities(probs),
        ActionStrategy::RegretMatchingWithPruning => {
            tally.get_regret_matching_probabilities_with_pruning(pruning_threshold, probs)
        }
        ActionStrategy::AverageStrategy => tally.get_average_strategies(probs),
        ActionStrategy::BestResponse => {
            one_hot(tally.get_best_response_action() as usize - 1, probs)
        }
    }
}

fn one_hot(index: usize, probs: &mut [f64]) {
    probs.fill(0.0);
    probs[index] = 1.0;
}
