//! Hand-built trees shared by the integration tests.

#![allow(dead_code)]

use cfr_equilibrium::cfr::{ActionCode, Decision, GamePath, HistoryTree, PathStep, StepKind};

pub fn player_step(decision_index: usize, action: ActionCode, player: usize, signature: &str) -> PathStep {
    PathStep {
        decision_index,
        action,
        kind: StepKind::Player {
            player,
            signature: signature.to_string(),
        },
    }
}

pub fn chance_step(decision_index: usize, action: ActionCode, probabilities: Option<Vec<f64>>) -> PathStep {
    PathStep {
        decision_index,
        action,
        kind: StepKind::Chance { probabilities },
    }
}

/// One equal-probability chance decision with three leaves worth 1, 2, 3.
pub fn single_chance_tree() -> HistoryTree {
    let decisions = vec![Decision::chance("roll", 0, 3)];
    let paths = (1..=3).map(|a| GamePath {
        steps: vec![chance_step(0, a, None)],
        utilities: vec![a as f64],
    });
    HistoryTree::from_paths(1, decisions, paths).unwrap()
}

/// P0 payoff for the three-move game below, indexed `[a][b][c]`.
pub const THREE_MOVE_PAYOFFS: [[[f64; 2]; 2]; 2] = [[[4.0, 0.0], [-2.0, 1.0]], [[1.0, 3.0], [1.0, 0.0]]];

/// P0 moves (depth 1), P1 moves without seeing it (depth 2), then P0 moves
/// again remembering only its own first move (depth 3). Zero-sum.
pub fn three_move_tree() -> HistoryTree {
    let decisions = vec![
        Decision::player("open", 0, 0, 2),
        Decision::player("reply", 1, 1, 2),
        Decision::player("close", 2, 0, 2),
    ];
    let mut paths = Vec::new();
    for a in 1..=2u8 {
        for b in 1..=2u8 {
            for c in 1..=2u8 {
                let u = THREE_MOVE_PAYOFFS[a as usize - 1][b as usize - 1][c as usize - 1];
                paths.push(GamePath {
                    steps: vec![
                        player_step(0, a, 0, "open"),
                        player_step(1, b, 1, "reply"),
                        player_step(2, c, 0, &format!("close{}", a)),
                    ],
                    utilities: vec![u, -u],
                });
            }
        }
    }
    HistoryTree::from_paths(2, decisions, paths).unwrap()
}
