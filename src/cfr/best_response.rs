//! Generalized best response (GEBR).
//!
//! Best response is not decomposable top-down: an ancestor's choice depends
//! on values that descendants' choices determine. The computation therefore
//! runs in two passes:
//!
//! 1. [`BestResponse::pass1`] records every depth at which the target player
//!    decides and clears that player's best-response accumulators.
//! 2. [`BestResponse::pass2`] runs once per recorded depth, deepest first.
//!    At the target depth each of the player's nodes accumulates
//!    `inverse_pi * value` per action; deeper nodes replay the action frozen
//!    by an earlier pass. A final pass at depth 0 replays every frozen action
//!    and returns the best-response value at the root.
//!
//! Opponents (and the target player above the target depth) follow the
//! opponents' [`ActionStrategy`]; forced actions always override it.

use std::collections::BTreeSet;

use crate::cfr::error::{SolverError, SolverResult};
use crate::cfr::game::{ActionCode, Decision};
use crate::cfr::policy::{action_probabilities, ActionStrategy};
use crate::cfr::storage::TallyStore;
use crate::cfr::trace::{BestResponseTrace, NoTrace, TraceSink};
use crate::cfr::tree::{HistoryNode, HistoryTree, NodeId};

/// Best-response computation for one player against fixed opponents.
pub struct BestResponse<'a> {
    nodes: &'a [HistoryNode],
    decisions: &'a [Decision],
    tallies: &'a mut TallyStore,
    player: usize,
    opponents_strategy: ActionStrategy,
    pruning_threshold: f64,
    trace: &'a dyn TraceSink,
}

impl<'a> BestResponse<'a> {
    /// Prepare a best response for `player`.
    pub fn new(
        tree: &'a mut HistoryTree,
        player: usize,
        opponents_strategy: ActionStrategy,
        pruning_threshold: f64,
    ) -> SolverResult<Self> {
        let num_players = tree.num_players();
        if player >= num_players {
            return Err(SolverError::InvalidPlayer { player, num_players });
        }
        let (nodes, decisions, tallies) = tree.split_mut();
        Ok(Self {
            nodes,
            decisions,
            tallies,
            player,
            opponents_strategy,
            pruning_threshold,
            trace: &NoTrace,
        })
    }

    /// Builder method: send accumulator events to `trace`.
    pub fn with_trace(mut self, trace: &'a dyn TraceSink) -> Self {
        self.trace = trace;
        self
    }

    /// Run both passes and return the best-response value at the root.
    pub fn run(&mut self) -> f64 {
        let depths = self.pass1();
        for &depth in depths.iter().rev() {
            self.pass2(depth);
        }
        self.pass2(0)
    }

    /// Depths (root = 1) at which the player decides. Clears the player's
    /// best-response accumulators.
    pub fn pass1(&mut self) -> BTreeSet<usize> {
        let mut depths = BTreeSet::new();
        self.visit_pass1(NodeId::ROOT, 1, &mut depths);
        depths
    }

    fn visit_pass1(&mut self, id: NodeId, depth: usize, depths: &mut BTreeSet<usize>) {
        let nodes = self.nodes;
        let node = &nodes[id.0 as usize];
        if let HistoryNode::Decision { tally, .. } = node {
            let tally = self.tallies.get_mut(*tally);
            if tally.player() == self.player {
                depths.insert(depth);
                tally.reset_best_response_data();
            }
        }
        for child in node.children().iter().flatten() {
            self.visit_pass1(*child, depth + 1, depths);
        }
    }

    /// One depth pass. Returns the root value, which is only meaningful for
    /// `depth_to_target == 0`.
    pub fn pass2(&mut self, depth_to_target: usize) -> f64 {
        self.visit_pass2(NodeId::ROOT, depth_to_target, 1, 1.0)
    }

    fn visit_pass2(&mut self, id: NodeId, depth_to_target: usize, depth_so_far: usize, inverse_pi: f64) -> f64 {
        let nodes = self.nodes;
        let decisions = self.decisions;
        match &nodes[id.0 as usize] {
            HistoryNode::Leaf { utilities } => utilities[self.player],
            HistoryNode::Chance { chance, children } => {
                let mut value = 0.0;
                for (i, child) in children.iter().enumerate() {
                    let probability = chance.probability(i as ActionCode + 1);
                    if let (Some(child), true) = (child, probability > 0.0) {
                        value += probability
                            * self.visit_pass2(*child, depth_to_target, depth_so_far + 1, inverse_pi * probability);
                    }
                }
                value
            }
            HistoryNode::Decision {
                decision_index,
                tally: tally_id,
                children,
            } => {
                let decision = &decisions[*decision_index];
                let deciding_player = self.tallies.get(*tally_id).player();
                let is_target = deciding_player == self.player;

                if is_target && depth_so_far > depth_to_target {
                    let action = decision
                        .always_do_action
                        .unwrap_or_else(|| self.tallies.get(*tally_id).get_best_response_action());
                    return match children[action as usize - 1] {
                        Some(child) => self.visit_pass2(child, depth_to_target, depth_so_far + 1, inverse_pi),
                        None => 0.0,
                    };
                }

                let mut probs = vec![0.0; children.len()];
                action_probabilities(
                    self.opponents_strategy,
                    decision,
                    self.tallies.get(*tally_id),
                    self.pruning_threshold,
                    &mut probs,
                );

                let at_target_depth = is_target && depth_so_far == depth_to_target;
                let mut expected_value = 0.0;
                for (i, child) in children.iter().enumerate() {
                    let Some(child) = child else { continue };
                    let action = i as ActionCode + 1;
                    let probability = probs[i];
                    if is_target {
                        // Own actions never scale inverse_pi; every branch
                        // is explored so deeper target nodes are reached.
                        let value = self.visit_pass2(*child, depth_to_target, depth_so_far + 1, inverse_pi);
                        if at_target_depth {
                            self.tallies
                                .get_mut(*tally_id)
                                .increment_best_response(action, inverse_pi, value);
                            self.trace.best_response_accumulated(&BestResponseTrace {
                                node: id,
                                depth: depth_so_far,
                                tally: *tally_id,
                                action,
                                inverse_pi,
                                value,
                            });
                        }
                        expected_value += probability * value;
                    } else if probability > 0.0 {
                        let value = self.visit_pass2(
                            *child,
                            depth_to_target,
                            depth_so_far + 1,
                            inverse_pi * probability,
                        );
                        expected_value += probability * value;
                    }
                }

                if at_target_depth {
                    0.0
                } else {
                    expected_value
                }
            }
        }
    }
}

/// Best-response value of `player` against the other players following
/// `opponents_strategy`.
///
/// Afterwards every information set of `player` reports its best-response
/// action through `get_best_response_action`, so the best response can be
/// played with [`ActionStrategy::BestResponse`].
pub fn calculate_best_response(
    tree: &mut HistoryTree,
    player: usize,
    opponents_strategy: ActionStrategy,
    pruning_threshold: f64,
) -> SolverResult<f64> {
    let value = BestResponse::new(tree, player, opponents_strategy, pruning_threshold)?.run();
    log::debug!(
        "best response for P{} against {}: {:.6}",
        player,
        opponents_strategy,
        value
    );
    Ok(value)
}
