//! Kuhn Poker implementation for CFR validation.
//!
//! Kuhn Poker is a simplified poker game used to validate CFR implementations
//! because it has a known, mathematically proven Nash equilibrium.
//!
//! ## Game Rules
//!
//! - 3 cards: Jack (0), Queen (1), King (2)
//! - 2 players, each antes 1 chip
//! - Each player receives 1 card
//! - Player 1 acts first: Pass or Bet (1 chip)
//! - Player 2 responds based on P1's action
//! - Higher card wins at showdown
//!
//! ## Decisions
//!
//! | index | who    | actions                                   |
//! |-------|--------|-------------------------------------------|
//! | 0     | chance | deal P1's card (J, Q, K)                  |
//! | 1     | chance | deal P2's card (lower / higher remaining) |
//! | 2     | P1     | pass / bet                                |
//! | 3     | P2     | pass / bet                                |
//! | 4     | P1     | pass / bet, after pass-bet                |
//!
//! ## Game Tree
//!
//! ```text
//! P1 (first to act)
//! ├── Pass
//! │   └── P2
//! │       ├── Pass → Showdown (pot = 2)
//! │       └── Bet
//! │           └── P1
//! │               ├── Pass → P2 wins (pot = 3)
//! │               └── Bet → Showdown (pot = 4)
//! └── Bet
//!     └── P2
//!         ├── Pass → P1 wins (pot = 3)
//!         └── Bet → Showdown (pot = 4)
//! ```
//!
//! ## Known Nash Equilibrium
//!
//! - **Player 1 with Jack**: Bet with probability α ∈ [0, 1/3]
//! - **Player 1 with Queen**: Always Pass
//! - **Player 1 with King**: Bet with probability 3α
//! - **Player 2 facing Bet with Jack**: Always Fold
//! - **Player 2 facing Bet with Queen**: Call with probability 1/3
//! - **Player 2 facing Bet with King**: Always Call
//!
//! **Expected Value**: Player 1 EV = -1/18 ≈ -0.0556

use std::fmt;

use crate::cfr::game::{ActionCode, Decision, Game, InfoState};
use crate::impl_game_state;

/// Pass (check if no bet, fold if facing bet).
pub const PASS: ActionCode = 1;
/// Bet (or call if facing bet).
pub const BET: ActionCode = 2;

/// Information state in Kuhn Poker.
///
/// What a player knows: their card and the action history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KuhnInfoState {
    /// Player's card (0=Jack, 1=Queen, 2=King)
    pub card: u8,
    /// Action history as string (e.g., "pb" = pass then bet)
    pub history: String,
}

impl InfoState for KuhnInfoState {
    fn key(&self) -> String {
        format!("{}:{}", self.card, self.history)
    }
}

impl fmt::Display for KuhnInfoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", card_symbol(self.card), self.history)
    }
}

/// Complete game state in Kuhn Poker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KuhnState {
    /// Cards dealt so far; `cards[0]` is Player 1's card.
    pub cards: Vec<u8>,
    /// Action history as string
    pub history: String,
}

impl_game_state!(KuhnState);

impl fmt::Display for KuhnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cards: Vec<&str> = self.cards.iter().map(|&c| card_symbol(c)).collect();
        write!(f, "cards:[{}] history:{}", cards.join(" "), self.history)
    }
}

fn card_symbol(card: u8) -> &'static str {
    match card {
        0 => "J",
        1 => "Q",
        2 => "K",
        _ => "?",
    }
}

/// Kuhn Poker game.
#[derive(Debug, Clone)]
pub struct KuhnPoker {
    decisions: Vec<Decision>,
}

impl KuhnPoker {
    /// Create a new Kuhn Poker game.
    pub fn new() -> Self {
        Self {
            decisions: vec![
                Decision::chance("deal P1", 0, 3),
                Decision::chance("deal P2", 1, 2),
                Decision::player("P1 open", 2, 0, 2),
                Decision::player("P2 respond", 3, 1, 2),
                Decision::player("P1 facing bet", 4, 0, 2),
            ],
        }
    }

    /// Get card name for display.
    pub fn card_name(card: u8) -> &'static str {
        match card {
            0 => "Jack",
            1 => "Queen",
            2 => "King",
            _ => "Unknown",
        }
    }

    fn is_terminal(history: &str) -> bool {
        matches!(history, "pp" | "pbp" | "pbb" | "bp" | "bb")
    }

    /// Payoff to player 1 at a terminal history.
    fn p0_payoff(state: &KuhnState) -> f64 {
        let p0_wins = state.cards[0] > state.cards[1];
        let showdown = |stake: f64| if p0_wins { stake } else { -stake };
        match state.history.as_str() {
            "pp" => showdown(1.0),
            "bp" => 1.0,
            "pbp" => -1.0,
            "bb" | "pbb" => showdown(2.0),
            _ => 0.0,
        }
    }
}

impl Default for KuhnPoker {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for KuhnPoker {
    type State = KuhnState;
    type InfoState = KuhnInfoState;

    fn num_players(&self) -> usize {
        2
    }

    fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    fn initial_state(&self) -> Self::State {
        KuhnState::default()
    }

    fn current_decision(&self, state: &Self::State) -> Option<usize> {
        if state.cards.len() < 2 {
            return Some(state.cards.len());
        }
        match state.history.as_str() {
            "" => Some(2),
            "p" | "b" => Some(3),
            "pb" => Some(4),
            h => {
                debug_assert!(Self::is_terminal(h), "unexpected history {}", h);
                None
            }
        }
    }

    fn apply_action(&self, state: &Self::State, action: ActionCode) -> Self::State {
        let mut next = state.clone();
        match state.cards.len() {
            0 => next.cards.push(action - 1),
            1 => {
                let remaining: Vec<u8> = (0..3).filter(|&c| c != state.cards[0]).collect();
                next.cards.push(remaining[action as usize - 1]);
            }
            _ => next.history.push(if action == BET { 'b' } else { 'p' }),
        }
        next
    }

    fn info_state(&self, state: &Self::State, player: usize) -> Self::InfoState {
        KuhnInfoState {
            card: state.cards[player],
            history: state.history.clone(),
        }
    }

    fn utilities(&self, state: &Self::State) -> Vec<f64> {
        let u = Self::p0_payoff(state);
        vec![u, -u]
    }

    fn state_description(&self, state: &Self::State) -> String {
        state.to_string()
    }
}
