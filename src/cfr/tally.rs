//! Per-information-set regret and strategy accumulators.
//!
//! One [`InformationSetTally`] exists per (player, information set). Every
//! history node that the player cannot tell apart points at the same tally,
//! so an update through one path is seen through all of them.
//!
//! Cumulative regret and strategy slots are [`AtomicF64`]s: two parallel
//! chance branches may update the same information set within one iteration.
//! Best-response scratch data is only touched by the sequential best-response
//! passes and is plain `f64`.

use crate::cfr::atomic::AtomicF64;
use crate::cfr::game::ActionCode;

/// Regret/strategy record for one information set.
#[derive(Debug, Clone)]
pub struct InformationSetTally {
    decision_index: usize,
    player: usize,
    signature: String,
    cumulative_regret: Vec<AtomicF64>,
    cumulative_strategy: Vec<AtomicF64>,
    best_response_numerator: Vec<f64>,
    best_response_denominator: Vec<f64>,
}

impl InformationSetTally {
    /// Create a zeroed tally sized to `num_actions`.
    pub fn new(decision_index: usize, player: usize, signature: impl Into<String>, num_actions: u8) -> Self {
        let n = num_actions as usize;
        Self {
            decision_index,
            player,
            signature: signature.into(),
            cumulative_regret: (0..n).map(|_| AtomicF64::new(0.0)).collect(),
            cumulative_strategy: (0..n).map(|_| AtomicF64::new(0.0)).collect(),
            best_response_numerator: vec![0.0; n],
            best_response_denominator: vec![0.0; n],
        }
    }

    /// Decision this information set belongs to.
    pub fn decision_index(&self) -> usize {
        self.decision_index
    }

    /// Deciding player.
    pub fn player(&self) -> usize {
        self.player
    }

    /// Opaque information-set signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Number of actions at this information set.
    pub fn num_actions(&self) -> usize {
        self.cumulative_regret.len()
    }

    /// Cumulative regret of an action.
    pub fn cumulative_regret(&self, action: ActionCode) -> f64 {
        self.cumulative_regret[action as usize - 1].load()
    }

    /// Cumulative strategy weight of an action.
    pub fn cumulative_strategy(&self, action: ActionCode) -> f64 {
        self.cumulative_strategy[action as usize - 1].load()
    }

    /// Add to an action's cumulative regret. No clamping: regret may go
    /// arbitrarily negative.
    #[inline]
    pub fn increment_cumulative_regret(&self, action: ActionCode, amount: f64) {
        self.cumulative_regret[action as usize - 1].fetch_add(amount);
    }

    /// Add to an action's cumulative strategy weight.
    #[inline]
    pub fn increment_cumulative_strategy(&self, action: ActionCode, amount: f64) {
        self.cumulative_strategy[action as usize - 1].fetch_add(amount);
    }

    /// Regret matching: probability proportional to positive cumulative
    /// regret, uniform when no regret is positive.
    pub fn get_regret_matching_probabilities(&self, probs: &mut [f64]) {
        debug_assert_eq!(probs.len(), self.num_actions());
        let mut sum = 0.0;
        for (p, r) in probs.iter_mut().zip(&self.cumulative_regret) {
            *p = r.load().max(0.0);
            sum += *p;
        }
        if sum > 0.0 {
            for p in probs.iter_mut() {
                *p /= sum;
            }
        } else {
            fill_uniform(probs);
        }
    }

    /// Regret matching with pruning.
    ///
    /// Actions whose regret-matching probability is positive but below
    /// `threshold` are set to zero and the rest renormalized. If pruning
    /// would remove every action the unpruned distribution is kept.
    pub fn get_regret_matching_probabilities_with_pruning(&self, threshold: f64, probs: &mut [f64]) {
        self.get_regret_matching_probabilities(probs);

        let mut pruned_any = false;
        let mut kept = 0.0;
        for p in probs.iter() {
            if *p < threshold {
                pruned_any |= *p > 0.0;
            } else {
                kept += *p;
            }
        }
        if !pruned_any || kept <= 0.0 {
            return;
        }
        for p in probs.iter_mut() {
            *p = if *p < threshold { 0.0 } else { *p / kept };
        }
    }

    /// Normalized cumulative strategy weights, uniform when all are zero.
    pub fn get_average_strategies(&self, probs: &mut [f64]) {
        debug_assert_eq!(probs.len(), self.num_actions());
        let mut sum = 0.0;
        for (p, s) in probs.iter_mut().zip(&self.cumulative_strategy) {
            *p = s.load();
            sum += *p;
        }
        if sum > 0.0 {
            for p in probs.iter_mut() {
                *p /= sum;
            }
        } else {
            fill_uniform(probs);
        }
    }

    /// Zero the best-response accumulators before a depth pass.
    pub fn reset_best_response_data(&mut self) {
        self.best_response_numerator.fill(0.0);
        self.best_response_denominator.fill(0.0);
    }

    /// Accumulate `inverse_pi * expected_value` for an action.
    pub fn increment_best_response(&mut self, action: ActionCode, inverse_pi: f64, expected_value: f64) {
        let i = action as usize - 1;
        self.best_response_numerator[i] += inverse_pi * expected_value;
        self.best_response_denominator[i] += inverse_pi;
    }

    /// The action with the largest accumulated value; ties go to the lowest
    /// action code.
    pub fn get_best_response_action(&self) -> ActionCode {
        let mut best = 0;
        for (i, &value) in self.best_response_numerator.iter().enumerate() {
            if value > self.best_response_numerator[best] {
                best = i;
            }
        }
        best as ActionCode + 1
    }

    /// Reach-weighted average value of an action from the last
    /// best-response pass, if the action was reached with positive weight.
    pub fn best_response_value(&self, action: ActionCode) -> Option<f64> {
        let i = action as usize - 1;
        let denominator = self.best_response_denominator[i];
        (denominator > 0.0).then(|| self.best_response_numerator[i] / denominator)
    }
}

fn fill_uniform(probs: &mut [f64]) {
    let uniform = 1.0 / probs.len() as f64;
    probs.fill(uniform);
}
