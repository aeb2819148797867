//! Exhaustive path enumeration over a [`Game`].
//!
//! This is the pre-pass that plays every reachable action sequence once.
//! Its output is the only input the history tree is built from.

use crate::cfr::error::{SolverError, SolverResult};
use crate::cfr::game::{ActionCode, Decision, Game, InfoState, Player};
use crate::cfr::tree::MAX_TREE_DEPTH;

/// What happened at one step of a path.
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    /// Nature moved. `probabilities` is set for state-dependent decisions.
    Chance { probabilities: Option<Vec<f64>> },
    /// A player decided at the information set `signature`.
    Player { player: usize, signature: String },
}

/// One step of a complete path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStep {
    /// Index into the execution order.
    pub decision_index: usize,
    /// Action code taken.
    pub action: ActionCode,
    /// Chance or player details.
    pub kind: StepKind,
}

/// A complete path from the root to a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub struct GamePath {
    /// Steps in order of play.
    pub steps: Vec<PathStep>,
    /// Terminal utilities, one per non-chance player.
    pub utilities: Vec<f64>,
}

impl GamePath {
    /// The action codes of this path.
    pub fn actions(&self) -> Vec<ActionCode> {
        self.steps.iter().map(|s| s.action).collect()
    }
}

/// Enumerate every reachable terminal path of `game`.
///
/// Actions are visited in ascending code order, so the output is
/// deterministic. Forced decisions only contribute their forced action and
/// zero-probability chance outcomes are skipped. A game that runs deeper
/// than [`MAX_TREE_DEPTH`] is rejected with [`SolverError::TreeTooDeep`].
pub fn enumerate_paths<G: Game>(game: &G) -> SolverResult<Vec<GamePath>> {
    let mut paths = Vec::new();
    let mut steps = Vec::new();
    let initial = game.initial_state();
    walk(game, &initial, &mut steps, &mut paths)?;
    log::debug!("enumerated {} terminal paths", paths.len());
    Ok(paths)
}

fn walk<G: Game>(
    game: &G,
    state: &G::State,
    steps: &mut Vec<PathStep>,
    paths: &mut Vec<GamePath>,
) -> SolverResult<()> {
    // The node at `state` sits one level below the steps taken to reach it.
    let depth = steps.len() + 1;
    if depth > MAX_TREE_DEPTH {
        return Err(SolverError::TreeTooDeep {
            depth,
            max: MAX_TREE_DEPTH,
        });
    }

    let decision_index = match game.current_decision(state) {
        Some(index) => index,
        None => {
            paths.push(GamePath {
                steps: steps.clone(),
                utilities: game.utilities(state),
            });
            return Ok(());
        }
    };

    let decisions = game.decisions();
    let decision = decisions
        .get(decision_index)
        .ok_or(SolverError::UnknownDecision {
            index: decision_index,
            available: decisions.len(),
        })?;

    match decision.player {
        Player::Chance => {
            let probabilities = if decision.unequal_chance_probabilities {
                Some(game.chance_probabilities(state, decision))
            } else {
                None
            };
            for action in playable_actions(decision) {
                if let Some(probs) = &probabilities {
                    if probs.get(action as usize - 1).copied().unwrap_or(0.0) <= 0.0 {
                        continue;
                    }
                }
                steps.push(PathStep {
                    decision_index,
                    action,
                    kind: StepKind::Chance {
                        probabilities: probabilities.clone(),
                    },
                });
                let next = game.apply_action(state, action);
                walk(game, &next, steps, paths)?;
                steps.pop();
            }
        }
        Player::Index(player) => {
            let player = player as usize;
            let signature = game.info_state(state, player).key();
            for action in playable_actions(decision) {
                steps.push(PathStep {
                    decision_index,
                    action,
                    kind: StepKind::Player {
                        player,
                        signature: signature.clone(),
                    },
                });
                let next = game.apply_action(state, action);
                walk(game, &next, steps, paths)?;
                steps.pop();
            }
        }
    }
    Ok(())
}

fn playable_actions(decision: &Decision) -> Vec<ActionCode> {
    match decision.always_do_action {
        Some(action) => vec![action],
        None => decision.actions().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::tree::HistoryTree;
    use crate::games::pennies::MatchingPennies;
    use crate::impl_game_state;

    /// A coin that nature keeps flipping with a single outcome, forever.
    struct EndlessFlips {
        decisions: Vec<Decision>,
    }

    #[derive(Debug, Clone)]
    struct Flips(usize);

    impl_game_state!(Flips);

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Nobody;

    impl InfoState for Nobody {
        fn key(&self) -> String {
            String::new()
        }
    }

    impl Game for EndlessFlips {
        type State = Flips;
        type InfoState = Nobody;

        fn num_players(&self) -> usize {
            1
        }

        fn decisions(&self) -> &[Decision] {
            &self.decisions
        }

        fn initial_state(&self) -> Flips {
            Flips(0)
        }

        fn current_decision(&self, _state: &Flips) -> Option<usize> {
            Some(0)
        }

        fn apply_action(&self, state: &Flips, _action: ActionCode) -> Flips {
            Flips(state.0 + 1)
        }

        fn info_state(&self, _state: &Flips, _player: usize) -> Nobody {
            Nobody
        }

        fn utilities(&self, _state: &Flips) -> Vec<f64> {
            vec![0.0]
        }
    }

    #[test]
    fn test_enumerates_every_action_pair() {
        let game = MatchingPennies::new();
        let paths = enumerate_paths(&game).unwrap();

        assert_eq!(paths.len(), 4);
        let actions: Vec<Vec<ActionCode>> = paths.iter().map(|p| p.actions()).collect();
        assert_eq!(actions, vec![vec![1, 1], vec![1, 2], vec![2, 1], vec![2, 2]]);
    }

    #[test]
    fn test_second_player_signature_hides_first_action() {
        let game = MatchingPennies::new();
        let paths = enumerate_paths(&game).unwrap();

        let signatures: Vec<&str> = paths
            .iter()
            .map(|p| match &p.steps[1].kind {
                StepKind::Player { signature, .. } => signature.as_str(),
                StepKind::Chance { .. } => panic!("unexpected chance step"),
            })
            .collect();
        assert!(signatures.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_unbounded_game_stops_at_depth_limit() {
        let game = EndlessFlips {
            decisions: vec![Decision::chance("flip", 0, 1)],
        };
        let err = enumerate_paths(&game).unwrap_err();
        assert!(matches!(
            err,
            SolverError::TreeTooDeep { depth, max } if depth == MAX_TREE_DEPTH + 1 && max == MAX_TREE_DEPTH
        ));

        let err = HistoryTree::from_game(&game).unwrap_err();
        assert!(matches!(err, SolverError::TreeTooDeep { .. }));
    }
}
