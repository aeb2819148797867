//! Vanilla CFR over the history tree.
//!
//! One call to [`VanillaCfr::solve`] walks the whole tree for a single
//! optimizing player, returns that player's counterfactual value at the
//! node, and updates the player's own tallies in place.
//!
//! `pi_values` holds one reach probability per non-chance player. Chance
//! probability is folded into every other player's entry, so
//! [`inverse_pi`] for the optimizing player includes chance.

use rayon::prelude::*;

use crate::cfr::game::ActionCode;
use crate::cfr::policy::{action_probabilities, ActionStrategy};
use crate::cfr::trace::{DecisionTrace, NoTrace, TraceSink};
use crate::cfr::tree::{HistoryNode, HistoryTree, NodeId};

/// Default minimum chance fan-out before the chance layer goes parallel.
pub const DEFAULT_PARALLEL_MIN_ACTIONS: usize = 4;

/// The vanilla CFR iterator bound to one tree.
pub struct VanillaCfr<'a> {
    tree: &'a HistoryTree,
    pruning_threshold: f64,
    parallel: bool,
    parallel_min_actions: usize,
    trace: &'a dyn TraceSink,
}

impl<'a> VanillaCfr<'a> {
    /// Sequential iterator without tracing.
    pub fn new(tree: &'a HistoryTree, pruning_threshold: f64) -> Self {
        Self {
            tree,
            pruning_threshold,
            parallel: false,
            parallel_min_actions: DEFAULT_PARALLEL_MIN_ACTIONS,
            trace: &NoTrace,
        }
    }

    /// Builder method: evaluate chance nodes with at least `min_actions`
    /// actions on the rayon pool.
    pub fn with_parallelism(mut self, enabled: bool, min_actions: usize) -> Self {
        self.parallel = enabled;
        self.parallel_min_actions = min_actions;
        self
    }

    /// Builder method: send per-node events to `trace`.
    pub fn with_trace(mut self, trace: &'a dyn TraceSink) -> Self {
        self.trace = trace;
        self
    }

    /// Counterfactual value of `node` for `optimizing_player`, updating that
    /// player's cumulative regrets and strategies along the way.
    pub fn solve(&self, node: NodeId, optimizing_player: usize, pi_values: &[f64], use_pruning: bool) -> f64 {
        self.solve_at(node, optimizing_player, pi_values, use_pruning, 1)
    }

    fn solve_at(
        &self,
        node: NodeId,
        optimizing_player: usize,
        pi_values: &[f64],
        use_pruning: bool,
        depth: usize,
    ) -> f64 {
        self.trace.node_entered(node, depth);
        if use_pruning && pi_values.iter().all(|&p| p == 0.0) {
            return 0.0;
        }

        match self.tree.node(node) {
            HistoryNode::Leaf { utilities } => utilities[optimizing_player],
            HistoryNode::Chance { chance, children } => {
                let value_of = |i: usize| -> f64 {
                    let action = i as ActionCode + 1;
                    let probability = chance.probability(action);
                    match children[i] {
                        Some(child) if probability > 0.0 => {
                            let next = next_pi_values(pi_values, optimizing_player, probability, true);
                            probability * self.solve_at(child, optimizing_player, &next, use_pruning, depth + 1)
                        }
                        _ => 0.0,
                    }
                };
                if self.parallel && children.len() >= self.parallel_min_actions {
                    (0..children.len()).into_par_iter().map(value_of).sum()
                } else {
                    (0..children.len()).map(value_of).sum()
                }
            }
            HistoryNode::Decision {
                decision_index,
                tally,
                children,
            } => {
                let decision = self.tree.decision(*decision_index);
                let tally = self.tree.tallies().get(*tally);
                let player = tally.player();
                let forced = decision.always_do_action.is_some();
                let is_optimizing = player == optimizing_player;

                let policy = if use_pruning {
                    ActionStrategy::RegretMatchingWithPruning
                } else {
                    ActionStrategy::RegretMatching
                };
                let mut probs = vec![0.0; children.len()];
                action_probabilities(policy, decision, tally, self.pruning_threshold, &mut probs);

                // The optimizing player needs a value for every action to
                // compute regrets; opponents' zero-probability actions
                // contribute nothing.
                let mut action_values = vec![0.0; children.len()];
                let mut expected_value = 0.0;
                for (i, child) in children.iter().enumerate() {
                    let probability = probs[i];
                    let evaluate = if is_optimizing && !forced {
                        true
                    } else {
                        probability > 0.0
                    };
                    let Some(child) = child else { continue };
                    if !evaluate {
                        continue;
                    }
                    let next = next_pi_values(pi_values, player, probability, false);
                    let value = self.solve_at(*child, optimizing_player, &next, use_pruning, depth + 1);
                    action_values[i] = value;
                    expected_value += probability * value;
                }

                if is_optimizing && !forced {
                    let inverse = inverse_pi(pi_values, player);
                    let own = pi_values[player];
                    for (i, (&value, &probability)) in action_values.iter().zip(&probs).enumerate() {
                        let action = i as ActionCode + 1;
                        tally.increment_cumulative_regret(action, inverse * (value - expected_value));
                        tally.increment_cumulative_strategy(action, own * probability);
                    }
                }

                self.trace.decision_evaluated(&DecisionTrace {
                    node,
                    depth,
                    player,
                    optimizing_player,
                    signature: tally.signature(),
                    probabilities: &probs,
                    action_values: &action_values,
                    expected_value,
                });
                expected_value
            }
        }
    }
}

/// Reach probabilities after `player` (or chance, on behalf of `player`)
/// takes an action with `probability`.
///
/// With `change_other_players` every entry except `player`'s is scaled;
/// otherwise only `player`'s entry is.
pub fn next_pi_values(pi_values: &[f64], player: usize, probability: f64, change_other_players: bool) -> Vec<f64> {
    pi_values
        .iter()
        .enumerate()
        .map(|(i, &pi)| {
            if (i == player) != change_other_players {
                pi * probability
            } else {
                pi
            }
        })
        .collect()
}

/// Product of every reach probability except `player`'s.
pub fn inverse_pi(pi_values: &[f64], player: usize) -> f64 {
    pi_values
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != player)
        .map(|(_, &pi)| pi)
        .product()
}
