//! Game trait definition for the CFR solver.
//!
//! The solver never plays the game itself during an iteration. A game that
//! implements [`Game`] is enumerated once (see [`crate::cfr::enumerate`]) and
//! the resulting paths are folded into a [`crate::cfr::HistoryTree`]. This
//! keeps a clean boundary between the game engine and the algorithm.

use std::fmt::{self, Debug};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// A 1-based action code, unique within one decision's action set.
pub type ActionCode = u8;

/// Trait for information states (what a player knows at a decision point).
///
/// Two game states that look identical to a player (same private
/// information, same observed history) must produce the same key. The key
/// is opaque to the solver; it only compares keys for equality.
pub trait InfoState: Clone + Eq + Hash + Debug + Send + Sync {
    /// Generate a unique string key for this information state.
    fn key(&self) -> String;
}

/// Trait for game states.
///
/// A game state contains all information about the current state of the game,
/// including private information that players may not see.
pub trait GameState: Clone + Debug + Send + Sync {}

/// Who acts at a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    /// Nature. Chance is excluded from player indexing.
    Chance,
    /// A real player, indexed `0..num_players`.
    Index(u8),
}

impl Player {
    /// The player index, or `None` for chance.
    pub fn index(self) -> Option<usize> {
        match self {
            Player::Chance => None,
            Player::Index(i) => Some(i as usize),
        }
    }

    /// Whether this is the chance player.
    pub fn is_chance(self) -> bool {
        matches!(self, Player::Chance)
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Chance => write!(f, "chance"),
            Player::Index(i) => write!(f, "P{}", i),
        }
    }
}

/// Immutable descriptor of one decision in the game's execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Human-readable name, used in errors and traces.
    pub name: String,
    /// 0-based position in the execution order.
    pub execution_order: usize,
    /// Owning player, or chance.
    pub player: Player,
    /// Number of possible actions; codes are `1..=num_actions`.
    pub num_actions: u8,
    /// Collapses the action distribution onto a single action.
    pub always_do_action: Option<ActionCode>,
    /// For chance decisions: probabilities come from the game state instead
    /// of being uniform.
    pub unequal_chance_probabilities: bool,
}

impl Decision {
    /// A player decision with uniform defaults.
    pub fn player(name: impl Into<String>, execution_order: usize, player: u8, num_actions: u8) -> Self {
        Self {
            name: name.into(),
            execution_order,
            player: Player::Index(player),
            num_actions,
            always_do_action: None,
            unequal_chance_probabilities: false,
        }
    }

    /// A chance decision with equal probabilities.
    pub fn chance(name: impl Into<String>, execution_order: usize, num_actions: u8) -> Self {
        Self {
            name: name.into(),
            execution_order,
            player: Player::Chance,
            num_actions,
            always_do_action: None,
            unequal_chance_probabilities: false,
        }
    }

    /// Builder method: force this decision to always take `action`.
    pub fn with_forced_action(mut self, action: ActionCode) -> Self {
        self.always_do_action = Some(action);
        self
    }

    /// Builder method: chance probabilities depend on the game state.
    pub fn with_unequal_probabilities(mut self) -> Self {
        self.unequal_chance_probabilities = true;
        self
    }

    /// Iterator over this decision's action codes.
    pub fn actions(&self) -> impl Iterator<Item = ActionCode> {
        1..=self.num_actions
    }
}

/// The main Game trait that defines the interface for any game.
///
/// Implement this trait to use the CFR solver with your game. The game must
/// be deterministic: enumerating it twice must yield the same paths.
///
/// # Example
/// ```ignore
/// struct MyGame { decisions: Vec<Decision> }
///
/// impl Game for MyGame {
///     type State = MyGameState;
///     type InfoState = MyInfoState;
///
///     // ... implement required methods
/// }
/// ```
pub trait Game: Send + Sync {
    /// The type representing a complete game state.
    type State: GameState;

    /// The type representing what a player knows at a decision point.
    type InfoState: InfoState;

    /// Number of non-chance players.
    fn num_players(&self) -> usize;

    /// Every decision in execution order; `decisions()[i].execution_order == i`.
    fn decisions(&self) -> &[Decision];

    /// Create the initial game state.
    fn initial_state(&self) -> Self::State;

    /// Index of the decision to be made at `state`, or `None` when the
    /// state is terminal.
    fn current_decision(&self, state: &Self::State) -> Option<usize>;

    /// Apply an action code to a state and return the resulting new state.
    ///
    /// This should not modify the input state (immutable transition).
    fn apply_action(&self, state: &Self::State, action: ActionCode) -> Self::State;

    /// Information state of `player`, who is about to decide at `state`.
    fn info_state(&self, state: &Self::State, player: usize) -> Self::InfoState;

    /// Terminal utilities, one per non-chance player.
    fn utilities(&self, state: &Self::State) -> Vec<f64>;

    /// Chance probabilities for a state-dependent chance decision.
    ///
    /// Only called for decisions with `unequal_chance_probabilities`. The
    /// default is uniform.
    fn chance_probabilities(&self, _state: &Self::State, decision: &Decision) -> Vec<f64> {
        vec![1.0 / decision.num_actions as f64; decision.num_actions as usize]
    }

    /// Get a human-readable description of a state.
    ///
    /// Used for debugging and visualization.
    fn state_description(&self, state: &Self::State) -> String {
        format!("{:?}", state)
    }
}

/// Macro to simplify implementing the GameState trait.
#[macro_export]
macro_rules! impl_game_state {
    ($type:ty) => {
        impl $crate::cfr::game::GameState for $type {}
    };
}
