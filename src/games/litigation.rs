//! A small pretrial settlement game with noisy private signals.
//!
//! Nature draws the defendant's true liability level. Each side then
//! receives a private signal of that level, the plaintiff makes a
//! take-it-or-leave-it settlement demand, and the defendant accepts or goes
//! to trial. At trial nature picks the verdict with a probability that
//! depends on the true liability level, so every chance decision after the
//! first has state-dependent probabilities.
//!
//! Player 0 is the plaintiff, player 1 the defendant. Payoffs are in units
//! of the damages at stake.

use serde::{Deserialize, Serialize};

use crate::cfr::game::{ActionCode, Decision, Game, InfoState};
use crate::impl_game_state;

const LIABILITY: usize = 0;
const PLAINTIFF_SIGNAL: usize = 1;
const DEFENDANT_SIGNAL: usize = 2;
const DEMAND: usize = 3;
const RESPONSE: usize = 4;
const VERDICT: usize = 5;

/// Defendant accepts the demand.
pub const ACCEPT: ActionCode = 1;
/// Defendant rejects and the case goes to trial.
pub const REJECT: ActionCode = 2;

/// Parameters of the settlement game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LitigationConfig {
    /// Prior over liability levels (weak, moderate, strong case).
    pub liability_prior: Vec<f64>,
    /// Probability a signal reports the true level; the rest is spread
    /// evenly over the other levels.
    pub signal_accuracy: f64,
    /// Settlement demands as fractions of damages.
    pub demands: Vec<f64>,
    /// Plaintiff's probability of winning at trial, per liability level.
    pub win_probability: Vec<f64>,
    /// Each side's trial cost.
    pub trial_cost: f64,
}

impl Default for LitigationConfig {
    fn default() -> Self {
        Self {
            liability_prior: vec![0.3, 0.4, 0.3],
            signal_accuracy: 0.6,
            demands: vec![0.3, 0.5, 0.7],
            win_probability: vec![0.25, 0.5, 0.75],
            trial_cost: 0.1,
        }
    }
}

/// Where the case stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LitigationState {
    /// True liability level, 0-based.
    pub liability: Option<u8>,
    /// Plaintiff's signal, 0-based.
    pub plaintiff_signal: Option<u8>,
    /// Defendant's signal, 0-based.
    pub defendant_signal: Option<u8>,
    /// Index of the demand made.
    pub demand: Option<u8>,
    /// Defendant's response action code.
    pub response: Option<ActionCode>,
    /// Whether the plaintiff won at trial.
    pub plaintiff_won: Option<bool>,
}

impl_game_state!(LitigationState);

/// What a party knows when deciding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LitigationInfoState {
    /// Plaintiff sees only their own signal.
    Plaintiff {
        /// Plaintiff's signal.
        signal: u8,
    },
    /// Defendant sees their own signal and the demand.
    Defendant {
        /// Defendant's signal.
        signal: u8,
        /// Demand index.
        demand: u8,
    },
}

impl InfoState for LitigationInfoState {
    fn key(&self) -> String {
        match self {
            Self::Plaintiff { signal } => format!("signal{}", signal),
            Self::Defendant { signal, demand } => format!("signal{}:demand{}", signal, demand),
        }
    }
}

/// The settlement game.
#[derive(Debug, Clone)]
pub struct LitigationGame {
    config: LitigationConfig,
    decisions: Vec<Decision>,
}

impl LitigationGame {
    /// Game with the default parameters.
    pub fn new() -> Self {
        Self::with_config(LitigationConfig::default())
    }

    /// Game with custom parameters.
    pub fn with_config(config: LitigationConfig) -> Self {
        let levels = config.liability_prior.len() as u8;
        let decisions = vec![
            Decision::chance("liability", LIABILITY, levels).with_unequal_probabilities(),
            Decision::chance("plaintiff signal", PLAINTIFF_SIGNAL, levels).with_unequal_probabilities(),
            Decision::chance("defendant signal", DEFENDANT_SIGNAL, levels).with_unequal_probabilities(),
            Decision::player("demand", DEMAND, 0, config.demands.len() as u8),
            Decision::player("response", RESPONSE, 1, 2),
            Decision::chance("verdict", VERDICT, 2).with_unequal_probabilities(),
        ];
        Self { config, decisions }
    }

    /// The game's parameters.
    pub fn config(&self) -> &LitigationConfig {
        &self.config
    }

    fn signal_probabilities(&self, liability: u8) -> Vec<f64> {
        let levels = self.config.liability_prior.len();
        let miss = if levels > 1 {
            (1.0 - self.config.signal_accuracy) / (levels - 1) as f64
        } else {
            0.0
        };
        (0..levels)
            .map(|level| {
                if level == liability as usize {
                    self.config.signal_accuracy
                } else {
                    miss
                }
            })
            .collect()
    }
}

impl Default for LitigationGame {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for LitigationGame {
    type State = LitigationState;
    type InfoState = LitigationInfoState;

    fn num_players(&self) -> usize {
        2
    }

    fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    fn initial_state(&self) -> Self::State {
        LitigationState::default()
    }

    fn current_decision(&self, state: &Self::State) -> Option<usize> {
        if state.liability.is_none() {
            Some(LIABILITY)
        } else if state.plaintiff_signal.is_none() {
            Some(PLAINTIFF_SIGNAL)
        } else if state.defendant_signal.is_none() {
            Some(DEFENDANT_SIGNAL)
        } else if state.demand.is_none() {
            Some(DEMAND)
        } else if state.response.is_none() {
            Some(RESPONSE)
        } else if state.response == Some(REJECT) && state.plaintiff_won.is_none() {
            Some(VERDICT)
        } else {
            None
        }
    }

    fn apply_action(&self, state: &Self::State, action: ActionCode) -> Self::State {
        let mut next = state.clone();
        let index = action - 1;
        match self.current_decision(state) {
            Some(LIABILITY) => next.liability = Some(index),
            Some(PLAINTIFF_SIGNAL) => next.plaintiff_signal = Some(index),
            Some(DEFENDANT_SIGNAL) => next.defendant_signal = Some(index),
            Some(DEMAND) => next.demand = Some(index),
            Some(RESPONSE) => next.response = Some(action),
            Some(VERDICT) => next.plaintiff_won = Some(action == 1),
            _ => {}
        }
        next
    }

    fn info_state(&self, state: &Self::State, player: usize) -> Self::InfoState {
        if player == 0 {
            LitigationInfoState::Plaintiff {
                signal: state.plaintiff_signal.unwrap_or_default(),
            }
        } else {
            LitigationInfoState::Defendant {
                signal: state.defendant_signal.unwrap_or_default(),
                demand: state.demand.unwrap_or_default(),
            }
        }
    }

    fn utilities(&self, state: &Self::State) -> Vec<f64> {
        match (state.response, state.plaintiff_won) {
            (Some(ACCEPT), _) => {
                let demand = state
                    .demand
                    .and_then(|d| self.config.demands.get(d as usize))
                    .copied()
                    .unwrap_or_default();
                vec![demand, -demand]
            }
            (_, Some(won)) => {
                let award = if won { 1.0 } else { 0.0 };
                let cost = self.config.trial_cost;
                vec![award - cost, -award - cost]
            }
            _ => vec![0.0, 0.0],
        }
    }

    fn chance_probabilities(&self, state: &Self::State, decision: &Decision) -> Vec<f64> {
        let liability = state.liability.unwrap_or_default();
        match decision.execution_order {
            LIABILITY => self.config.liability_prior.clone(),
            PLAINTIFF_SIGNAL | DEFENDANT_SIGNAL => self.signal_probabilities(liability),
            VERDICT => {
                let win = self
                    .config
                    .win_probability
                    .get(liability as usize)
                    .copied()
                    .unwrap_or_default();
                vec![win, 1.0 - win]
            }
            _ => vec![1.0 / decision.num_actions as f64; decision.num_actions as usize],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::{enumerate_paths, ActionStrategy, CFRConfig, CFRSolver, HistoryTree, StepKind};

    #[test]
    fn test_signal_probabilities_sum_to_one() {
        let game = LitigationGame::new();
        for liability in 0..3 {
            let probs = game.signal_probabilities(liability);
            assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            assert_eq!(probs[liability as usize], 0.6);
        }
    }

    #[test]
    fn test_enumeration_carries_explicit_chance() {
        let paths = enumerate_paths(&LitigationGame::new()).unwrap();
        // 27 chance draws x 3 demands x (accept + 2 verdicts)
        assert_eq!(paths.len(), 27 * 3 * 3);
        assert!(matches!(
            &paths[0].steps[0].kind,
            StepKind::Chance { probabilities: Some(p) } if p == &vec![0.3, 0.4, 0.3]
        ));
    }

    #[test]
    fn test_tree_has_one_tally_per_signal() {
        let tree = HistoryTree::from_game(&LitigationGame::new()).unwrap();
        assert!(tree.chance_player_exists());
        assert_eq!(tree.tallies().for_player(0).count(), 3);
        assert_eq!(tree.tallies().for_player(1).count(), 9);
    }

    #[test]
    fn test_trial_payoffs() {
        let game = LitigationGame::new();
        let state = LitigationState {
            liability: Some(2),
            plaintiff_signal: Some(2),
            defendant_signal: Some(1),
            demand: Some(1),
            response: Some(REJECT),
            plaintiff_won: None,
        };
        assert_eq!(game.current_decision(&state), Some(VERDICT));
        let won = game.apply_action(&state, 1);
        assert_eq!(game.current_decision(&won), None);
        let u = game.utilities(&won);
        assert!((u[0] - 0.9).abs() < 1e-12 && (u[1] + 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_solving_reduces_exploitability() {
        let config = CFRConfig::default().with_pruning_start(50);
        let mut solver = CFRSolver::from_game(&LitigationGame::new(), config).unwrap();

        let start = solver.exploitability().unwrap().exploitability;
        solver.train(500);
        let end = solver.exploitability().unwrap().exploitability;
        assert!(end < start, "exploitability went from {} to {}", start, end);

        // Trial costs are deadweight: the pair never does better than zero-sum.
        let values = solver.expected_utilities(ActionStrategy::AverageStrategy);
        assert!(values[0] + values[1] <= 1e-9);
    }
}
