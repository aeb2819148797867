//! Error types for tree construction, configuration, and solving.
//!
//! Every variant here is a contract violation: a malformed game, a
//! desynchronized tree, or a bad configuration. None of them are retried.

use thiserror::Error;

use crate::cfr::game::ActionCode;

/// Errors that can occur when validating CFR configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Reporting interval must be at least one iteration.
    #[error("reporting interval must be positive")]
    ZeroReportingInterval,

    /// Pruning threshold is a probability floor and must lie in [0, 1).
    #[error("pruning threshold {0} is out of range [0, 1)")]
    InvalidPruningThreshold(f64),

    /// Parallel chance fan-out needs at least two actions to be meaningful.
    #[error("parallel_min_actions must be at least 2, got {0}")]
    InvalidParallelThreshold(usize),
}

/// Errors surfaced by the solver.
#[derive(Error, Debug)]
pub enum SolverError {
    /// A path referenced a decision index that is not in the execution order.
    #[error("decision {index} is not in the execution order ({available} decisions)")]
    UnknownDecision { index: usize, available: usize },

    /// A decision's execution-order index does not match its position.
    #[error("decision '{name}' declares execution order {declared} but sits at position {position}")]
    MisorderedDecision {
        name: String,
        declared: usize,
        position: usize,
    },

    /// A decision declares zero actions.
    #[error("decision '{name}' has no actions")]
    NoActions { name: String },

    /// An action code lies outside 1..=num_actions.
    #[error("action {action} is out of range for decision {decision} ({num_actions} actions)")]
    ActionOutOfRange {
        decision: usize,
        action: ActionCode,
        num_actions: u8,
    },

    /// A decision owned by a player index that does not exist.
    #[error("player {player} is out of range ({num_players} non-chance players)")]
    InvalidPlayer { player: usize, num_players: usize },

    /// The same prefix was reached once as one kind of node and later as another.
    #[error("history {path:?} was already recorded as {existing}, now seen as {found}")]
    NodeKindConflict {
        path: Vec<ActionCode>,
        existing: String,
        found: String,
    },

    /// A path step disagrees with the decision it names.
    #[error("step for decision {decision} is malformed: {reason}")]
    MalformedStep { decision: usize, reason: String },

    /// One information set was reached from decisions that disagree.
    #[error(
        "information set '{signature}' of player {player} was created for decision {existing} \
         but reached again from decision {found}"
    )]
    InformationSetConflict {
        player: usize,
        signature: String,
        existing: usize,
        found: usize,
    },

    /// A terminal utility vector has the wrong length.
    #[error("terminal utilities for {path:?} have {got} entries, expected {expected}")]
    UtilityLengthMismatch {
        path: Vec<ActionCode>,
        expected: usize,
        got: usize,
    },

    /// A chance probability vector is malformed.
    #[error("chance probabilities for decision {decision} are invalid: {reason}")]
    InvalidChanceProbabilities { decision: usize, reason: String },

    /// The enumeration left a reachable child unvisited.
    #[error("enumeration is not exhaustive: action {action} after {path:?} was never played")]
    IncompleteEnumeration {
        path: Vec<ActionCode>,
        action: ActionCode,
    },

    /// The enumeration produced no paths at all.
    #[error("enumeration produced no paths")]
    EmptyEnumeration,

    /// A path exceeds the supported recursion depth.
    #[error("path depth {depth} exceeds the maximum tree depth {max}")]
    TreeTooDeep { depth: usize, max: usize },

    /// A decision node's tally disagrees with the independent lookup.
    #[error("tree/tally desynchronization at {path:?}: {reason}")]
    InconsistentTally { path: Vec<ActionCode>, reason: String },

    /// An action-selection policy name that is not recognised.
    #[error("unsupported action strategy '{0}'")]
    UnsupportedActionStrategy(String),

    /// Invalid solver configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type SolverResult<T> = Result<T, SolverError>;
