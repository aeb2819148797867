//! Chance-node descriptors.

use crate::cfr::error::{SolverError, SolverResult};
use crate::cfr::game::ActionCode;

const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// How a chance node distributes probability over its actions.
#[derive(Debug, Clone, PartialEq)]
pub enum ChanceProbabilities {
    /// `1 / num_actions` for every action.
    Equal { num_actions: u8 },
    /// State-dependent vector captured when the node was first visited.
    Explicit(Vec<f64>),
}

/// Chance node stored in the history tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ChanceNode {
    /// Originating decision index.
    pub decision_index: usize,
    /// Probability of each action.
    pub probabilities: ChanceProbabilities,
}

impl ChanceNode {
    /// Chance node with equal probabilities.
    pub fn equal(decision_index: usize, num_actions: u8) -> Self {
        Self {
            decision_index,
            probabilities: ChanceProbabilities::Equal { num_actions },
        }
    }

    /// Chance node with an explicit vector, validated to lie on the simplex.
    pub fn explicit(decision_index: usize, num_actions: u8, probabilities: Vec<f64>) -> SolverResult<Self> {
        let invalid = |reason: String| SolverError::InvalidChanceProbabilities {
            decision: decision_index,
            reason,
        };

        if probabilities.len() != num_actions as usize {
            return Err(invalid(format!(
                "{} probabilities for {} actions",
                probabilities.len(),
                num_actions
            )));
        }
        if let Some(p) = probabilities.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(invalid(format!("probability {} is not a finite non-negative number", p)));
        }
        let sum: f64 = probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(invalid(format!("probabilities sum to {}", sum)));
        }

        Ok(Self {
            decision_index,
            probabilities: ChanceProbabilities::Explicit(probabilities),
        })
    }

    /// Number of actions.
    pub fn num_actions(&self) -> u8 {
        match &self.probabilities {
            ChanceProbabilities::Equal { num_actions } => *num_actions,
            ChanceProbabilities::Explicit(v) => v.len() as u8,
        }
    }

    /// Probability of a 1-based action code.
    pub fn probability(&self, action: ActionCode) -> f64 {
        match &self.probabilities {
            ChanceProbabilities::Equal { num_actions } => 1.0 / *num_actions as f64,
            ChanceProbabilities::Explicit(v) => v[action as usize - 1],
        }
    }

    /// Whether the child for `action` must exist in an exhaustive tree.
    pub fn is_reachable(&self, action: ActionCode) -> bool {
        self.probability(action) > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_probabilities() {
        let node = ChanceNode::equal(0, 4);
        assert_eq!(node.num_actions(), 4);
        for action in 1..=4 {
            assert_eq!(node.probability(action), 0.25);
        }
    }

    #[test]
    fn test_explicit_probabilities() {
        let node = ChanceNode::explicit(2, 3, vec![0.2, 0.0, 0.8]).unwrap();
        assert_eq!(node.probability(3), 0.8);
        assert!(!node.is_reachable(2));
    }

    #[test]
    fn test_explicit_rejects_bad_vectors() {
        assert!(ChanceNode::explicit(0, 2, vec![0.5]).is_err());
        assert!(ChanceNode::explicit(0, 2, vec![0.7, 0.7]).is_err());
        assert!(ChanceNode::explicit(0, 2, vec![1.5, -0.5]).is_err());
        assert!(ChanceNode::explicit(0, 2, vec![f64::NAN, 1.0]).is_err());
    }
}
