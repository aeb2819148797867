//! Injectable tracing for one solve or best-response call.
//!
//! Every method has a no-op default, so a sink only implements what it
//! needs. Sinks are shared with rayon workers and must be `Sync`.

use crate::cfr::game::ActionCode;
use crate::cfr::storage::TallyId;
use crate::cfr::tree::NodeId;

/// A decision node finished evaluating during a CFR pass.
#[derive(Debug)]
pub struct DecisionTrace<'a> {
    /// History node.
    pub node: NodeId,
    /// Depth of the node (root = 1).
    pub depth: usize,
    /// Deciding player.
    pub player: usize,
    /// Player being optimized in this pass.
    pub optimizing_player: usize,
    /// Information-set signature.
    pub signature: &'a str,
    /// Action distribution used at the node.
    pub probabilities: &'a [f64],
    /// Value of each action (zero for skipped actions).
    pub action_values: &'a [f64],
    /// Probability-weighted value of the node.
    pub expected_value: f64,
}

/// A best-response accumulator was incremented.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestResponseTrace {
    /// History node.
    pub node: NodeId,
    /// Depth of the node (root = 1).
    pub depth: usize,
    /// Tally receiving the increment.
    pub tally: TallyId,
    /// Action credited.
    pub action: ActionCode,
    /// Opponents' and chance's reach probability.
    pub inverse_pi: f64,
    /// Value of the action.
    pub value: f64,
}

/// Receiver of per-node solver events.
pub trait TraceSink: Sync {
    /// A node is about to be evaluated by the CFR iterator.
    fn node_entered(&self, _node: NodeId, _depth: usize) {}

    /// A decision node was evaluated by the CFR iterator.
    fn decision_evaluated(&self, _event: &DecisionTrace<'_>) {}

    /// A best-response accumulator was updated.
    fn best_response_accumulated(&self, _event: &BestResponseTrace) {}
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrace;

impl TraceSink for NoTrace {}

/// Sink that forwards decision and best-response events to `log::trace!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTrace;

impl TraceSink for LogTrace {
    fn decision_evaluated(&self, event: &DecisionTrace<'_>) {
        log::trace!(
            "{:>indent$}P{} [{}] probs={:?} values={:?} ev={:.6} (optimizing P{})",
            "",
            event.player,
            event.signature,
            event.probabilities,
            event.action_values,
            event.expected_value,
            event.optimizing_player,
            indent = event.depth * 2,
        );
    }

    fn best_response_accumulated(&self, event: &BestResponseTrace) {
        log::trace!(
            "{:>indent$}best response tally {:?} action {} inverse_pi={:.6} value={:.6}",
            "",
            event.tally,
            event.action,
            event.inverse_pi,
            event.value,
            indent = event.depth * 2,
        );
    }
}
