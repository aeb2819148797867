//! Invariants of the regret-matching readouts, the CFR iterator and the
//! best-response engine.

mod common;

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cfr_equilibrium::cfr::{
    ActionStrategy, BestResponse, BestResponseTrace, CFRConfig, CFRSolver, HistoryTree, InformationSetTally,
    NodeId, TraceSink, VanillaCfr,
};
use cfr_equilibrium::games::{KuhnPoker, MatchingPennies};

use common::{single_chance_tree, three_move_tree};

fn random_tally(rng: &mut StdRng, num_actions: u8) -> InformationSetTally {
    let tally = InformationSetTally::new(0, 0, "random", num_actions);
    for action in 1..=num_actions {
        // Leave some slots untouched so all-zero and mixed states occur.
        if rng.gen_bool(0.7) {
            tally.increment_cumulative_regret(action, rng.gen_range(-5.0..5.0));
        }
        if rng.gen_bool(0.7) {
            tally.increment_cumulative_strategy(action, rng.gen_range(0.0..3.0));
        }
    }
    tally
}

fn assert_on_simplex(probs: &[f64]) {
    assert!(probs.iter().all(|&p| p >= 0.0), "negative probability in {:?}", probs);
    assert_abs_diff_eq!(probs.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
}

#[test]
fn distributions_stay_on_the_simplex() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..500 {
        let num_actions = rng.gen_range(1..=6u8);
        let tally = random_tally(&mut rng, num_actions);
        let mut probs = vec![0.0; num_actions as usize];

        tally.get_regret_matching_probabilities(&mut probs);
        assert_on_simplex(&probs);
        tally.get_regret_matching_probabilities_with_pruning(rng.gen_range(0.0..0.5), &mut probs);
        assert_on_simplex(&probs);
        tally.get_average_strategies(&mut probs);
        assert_on_simplex(&probs);
    }
}

#[test]
fn all_zero_tally_is_uniform() {
    let tally = InformationSetTally::new(0, 0, "fresh", 4);
    let mut probs = vec![0.0; 4];
    tally.get_regret_matching_probabilities(&mut probs);
    assert_eq!(probs, vec![0.25; 4]);
    tally.get_average_strategies(&mut probs);
    assert_eq!(probs, vec![0.25; 4]);
}

#[test]
fn pruning_only_removes_small_positive_probabilities() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let num_actions = rng.gen_range(2..=6u8);
        let tally = random_tally(&mut rng, num_actions);
        let threshold = rng.gen_range(0.0..0.4);

        let mut unpruned = vec![0.0; num_actions as usize];
        let mut pruned = vec![0.0; num_actions as usize];
        tally.get_regret_matching_probabilities(&mut unpruned);
        tally.get_regret_matching_probabilities_with_pruning(threshold, &mut pruned);

        for (u, p) in unpruned.iter().zip(&pruned) {
            if *p == 0.0 && *u > 0.0 {
                assert!(*u < threshold, "pruned {} at threshold {}", u, threshold);
            }
        }
        if !unpruned.iter().any(|&u| u > 0.0 && u < threshold) {
            assert_eq!(pruned, unpruned);
        }
    }
}

#[test]
fn average_strategy_readout_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(3);
    let tally = random_tally(&mut rng, 5);
    let mut first = vec![0.0; 5];
    let mut second = vec![0.0; 5];
    tally.get_average_strategies(&mut first);
    tally.get_average_strategies(&mut second);
    assert_eq!(first, second);
}

#[derive(Default)]
struct CountingTrace {
    entered: AtomicUsize,
}

impl TraceSink for CountingTrace {
    fn node_entered(&self, _node: NodeId, _depth: usize) {
        self.entered.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn zero_reach_returns_without_recursing() {
    let tree = HistoryTree::from_game(&KuhnPoker::new()).unwrap();
    let trace = CountingTrace::default();
    let cfr = VanillaCfr::new(&tree, 1e-7).with_trace(&trace);

    let value = cfr.solve(tree.root(), 1, &[0.0, 0.0], true);
    assert_eq!(value, 0.0);
    assert_eq!(trace.entered.load(Ordering::Relaxed), 1);
    // Nothing was learned.
    assert!(tree.tallies().iter().all(|(_, t)| t.cumulative_regret(1) == 0.0));
}

#[test]
fn single_chance_node_is_the_average_leaf() {
    let tree = single_chance_tree();
    assert!(tree.chance_player_exists());
    for use_pruning in [false, true] {
        let cfr = VanillaCfr::new(&tree, 1e-7);
        assert_relative_eq!(cfr.solve(tree.root(), 0, &[1.0], use_pruning), 2.0, epsilon = 1e-12);
        let parallel = VanillaCfr::new(&tree, 1e-7).with_parallelism(true, 2);
        assert_relative_eq!(parallel.solve(tree.root(), 0, &[1.0], use_pruning), 2.0, epsilon = 1e-12);
    }
}

#[test]
fn best_response_dominates_the_profile() {
    let mut solver = CFRSolver::from_game(&KuhnPoker::new(), CFRConfig::default()).unwrap();
    for checkpoint in 0..4 {
        for strategy in [ActionStrategy::RegretMatching, ActionStrategy::AverageStrategy] {
            let profile = solver.expected_utilities(strategy);
            for player in 0..2 {
                let best = solver.calculate_best_response(player, strategy).unwrap();
                assert!(
                    best >= profile[player] - 1e-12,
                    "checkpoint {}: BR {} below profile {} for P{}",
                    checkpoint,
                    best,
                    profile[player],
                    player
                );
            }
        }
        solver.train(25);
    }
}

#[test]
fn best_response_matches_closed_form() {
    // Biased pennies against a uniform opponent: P0 earns 0.5 by playing
    // heads, P1 earns 0 by playing tails.
    let mut tree = HistoryTree::from_game(&MatchingPennies::biased()).unwrap();
    let strategy = ActionStrategy::RegretMatching;
    let profile = tree.expected_utilities(strategy, 0.0);
    assert_relative_eq!(profile[0], 0.25, epsilon = 1e-12);

    let mut best = Vec::new();
    for player in 0..2 {
        best.push(BestResponse::new(&mut tree, player, strategy, 0.0).unwrap().run());
    }
    assert_relative_eq!(best[0], 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(best[1], 0.0, epsilon = 1e-12);
    assert!(best[0] >= profile[0] && best[1] >= profile[1]);

    // Playing the frozen best response reproduces its value.
    let played = tree.expected_utilities(ActionStrategy::BestResponse, 0.0);
    assert!(played[0] <= best[0] + 1e-12);
}

#[derive(Default)]
struct RecordingTrace {
    events: Mutex<Vec<BestResponseTrace>>,
}

impl RecordingTrace {
    fn take(&self) -> Vec<BestResponseTrace> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl TraceSink for RecordingTrace {
    fn best_response_accumulated(&self, event: &BestResponseTrace) {
        self.events.lock().unwrap().push(*event);
    }
}

#[test]
fn deeper_best_responses_are_frozen_before_shallower_passes() {
    let trace = RecordingTrace::default();
    let mut tree = three_move_tree();
    let mut br = BestResponse::new(&mut tree, 0, ActionStrategy::RegretMatching, 0.0)
        .unwrap()
        .with_trace(&trace);

    let depths = br.pass1();
    assert_eq!(depths, BTreeSet::from([1, 3]));

    br.pass2(3);
    let deep = trace.take();
    // Four depth-3 nodes, two actions each.
    assert_eq!(deep.len(), 8);
    assert!(deep.iter().all(|e| e.depth == 3));
    assert!(deep.iter().all(|e| (e.inverse_pi - 0.5).abs() < 1e-12));

    br.pass2(1);
    let shallow = trace.take();
    assert_eq!(shallow.len(), 2);
    assert!(shallow.iter().all(|e| e.depth == 1));

    let value = br.pass2(0);
    assert!(trace.take().is_empty());
    assert_relative_eq!(value, 1.5, epsilon = 1e-12);
    drop(br);

    let tallies = tree.tallies();
    assert_eq!(tallies.find(0, "open").unwrap().get_best_response_action(), 2);
    assert_eq!(tallies.find(0, "close1").unwrap().get_best_response_action(), 1);
    assert_eq!(tallies.find(0, "close2").unwrap().get_best_response_action(), 2);
}

#[test]
fn full_run_equals_brute_force_over_pure_strategies() {
    use common::THREE_MOVE_PAYOFFS as U;

    let mut tree = three_move_tree();
    let value = BestResponse::new(&mut tree, 0, ActionStrategy::RegretMatching, 0.0)
        .unwrap()
        .run();

    // P0 picks (a, c_a) without seeing b; P1 is uniform.
    let mut best = f64::NEG_INFINITY;
    for a in 0..2 {
        for c in 0..2 {
            best = best.max(0.5 * (U[a][0][c] + U[a][1][c]));
        }
    }
    assert_relative_eq!(value, best, epsilon = 1e-12);
}
