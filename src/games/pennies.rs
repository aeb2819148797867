//! Matching pennies, played sequentially.
//!
//! Player 0 picks heads (1) or tails (2), then player 1 picks without
//! seeing player 0's coin. The standard game pays the matcher 1 and is
//! zero-sum with a (0.5, 0.5) equilibrium. The biased variant pays 2 for
//! matching heads, which moves the equilibrium to 0.4 heads for both
//! players with value 0.2 for player 0.

use std::fmt;

use crate::cfr::game::{ActionCode, Decision, Game, InfoState};
use crate::impl_game_state;

/// Payoff to player 0 for each (player 0 action, player 1 action).
type PayoffMatrix = [[f64; 2]; 2];

const STANDARD: PayoffMatrix = [[1.0, -1.0], [-1.0, 1.0]];
const BIASED: PayoffMatrix = [[2.0, -1.0], [-1.0, 1.0]];

/// Actions taken so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PenniesState {
    /// Coins shown, in turn order.
    pub coins: Vec<ActionCode>,
}

impl_game_state!(PenniesState);

/// What the player to act knows: only who they are.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PenniesInfoState {
    /// Player to act.
    pub player: usize,
}

impl InfoState for PenniesInfoState {
    fn key(&self) -> String {
        format!("P{}", self.player)
    }
}

/// Two-player matching pennies.
#[derive(Debug, Clone)]
pub struct MatchingPennies {
    decisions: Vec<Decision>,
    payoffs: PayoffMatrix,
}

impl MatchingPennies {
    /// Standard zero-sum matching pennies.
    pub fn new() -> Self {
        Self::with_payoffs(STANDARD)
    }

    /// Matching pennies with a bonus for matching heads.
    pub fn biased() -> Self {
        Self::with_payoffs(BIASED)
    }

    fn with_payoffs(payoffs: PayoffMatrix) -> Self {
        Self {
            decisions: vec![
                Decision::player("P0 coin", 0, 0, 2),
                Decision::player("P1 coin", 1, 1, 2),
            ],
            payoffs,
        }
    }
}

impl Default for MatchingPennies {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PenniesState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .coins
            .iter()
            .map(|&c| if c == 1 { "H" } else { "T" })
            .collect();
        write!(f, "[{}]", names.join(" "))
    }
}

impl Game for MatchingPennies {
    type State = PenniesState;
    type InfoState = PenniesInfoState;

    fn num_players(&self) -> usize {
        2
    }

    fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    fn initial_state(&self) -> Self::State {
        PenniesState::default()
    }

    fn current_decision(&self, state: &Self::State) -> Option<usize> {
        (state.coins.len() < 2).then_some(state.coins.len())
    }

    fn apply_action(&self, state: &Self::State, action: ActionCode) -> Self::State {
        let mut next = state.clone();
        next.coins.push(action);
        next
    }

    fn info_state(&self, _state: &Self::State, player: usize) -> Self::InfoState {
        PenniesInfoState { player }
    }

    fn utilities(&self, state: &Self::State) -> Vec<f64> {
        let a = state.coins[0] as usize - 1;
        let b = state.coins[1] as usize - 1;
        let u = self.payoffs[a][b];
        vec![u, -u]
    }

    fn state_description(&self, state: &Self::State) -> String {
        state.to_string()
    }
}
