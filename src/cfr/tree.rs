//! The game-history tree.
//!
//! An n-ary tree keyed by the action codes chosen so far. Internal nodes are
//! chance nodes or decision nodes (which point at a shared
//! [`InformationSetTally`](crate::cfr::tally::InformationSetTally) by
//! [`TallyId`]); leaves hold terminal utilities. Nodes live in one arena and
//! are built once from an exhaustive path enumeration.
//!
//! Every traversal in this crate recurses over the tree. Depth is validated
//! against [`MAX_TREE_DEPTH`] at construction, which bounds the recursion.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cfr::chance::ChanceNode;
use crate::cfr::enumerate::{enumerate_paths, GamePath, PathStep, StepKind};
use crate::cfr::error::{SolverError, SolverResult};
use crate::cfr::game::{ActionCode, Decision, Game, Player};
use crate::cfr::policy::{action_probabilities, ActionStrategy};
use crate::cfr::storage::{TallyId, TallyStore};

/// Deepest supported history, counting the root as depth 1.
pub const MAX_TREE_DEPTH: usize = 512;

/// Index of a node in a [`HistoryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root node.
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of the history tree. The variant is fixed on creation.
#[derive(Debug, Clone)]
pub enum HistoryNode {
    /// Nature moves.
    Chance {
        /// Probabilities and originating decision.
        chance: ChanceNode,
        /// Child per action code (index = code - 1).
        children: Vec<Option<NodeId>>,
    },
    /// A player decides.
    Decision {
        /// Originating decision.
        decision_index: usize,
        /// Shared information-set tally.
        tally: TallyId,
        /// Child per action code (index = code - 1).
        children: Vec<Option<NodeId>>,
    },
    /// Terminal history.
    Leaf {
        /// One utility per non-chance player.
        utilities: Vec<f64>,
    },
}

impl HistoryNode {
    /// Child reached by `action`, if it exists.
    #[inline]
    pub fn child(&self, action: ActionCode) -> Option<NodeId> {
        self.children()
            .get(action as usize - 1)
            .copied()
            .flatten()
    }

    /// Children slots; empty for leaves.
    pub fn children(&self) -> &[Option<NodeId>] {
        match self {
            HistoryNode::Chance { children, .. } | HistoryNode::Decision { children, .. } => children,
            HistoryNode::Leaf { .. } => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Option<NodeId>>> {
        match self {
            HistoryNode::Chance { children, .. } | HistoryNode::Decision { children, .. } => Some(children),
            HistoryNode::Leaf { .. } => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            HistoryNode::Chance { chance, .. } => format!("a chance node of decision {}", chance.decision_index),
            HistoryNode::Decision {
                decision_index, tally, ..
            } => format!("a decision node of decision {} ({:?})", decision_index, tally),
            HistoryNode::Leaf { .. } => "a leaf".to_string(),
        }
    }

    /// Whether `other`, built from a later visit of the same history, agrees
    /// with this node.
    fn same_kind(&self, other: &HistoryNode) -> bool {
        match (self, other) {
            (HistoryNode::Chance { chance: a, .. }, HistoryNode::Chance { chance: b, .. }) => {
                a.decision_index == b.decision_index
            }
            (
                HistoryNode::Decision {
                    decision_index: a,
                    tally: ta,
                    ..
                },
                HistoryNode::Decision {
                    decision_index: b,
                    tally: tb,
                    ..
                },
            ) => a == b && ta == tb,
            _ => false,
        }
    }
}

/// A single sampled play through the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Playout {
    /// Action codes taken.
    pub actions: Vec<ActionCode>,
    /// Terminal utilities reached.
    pub utilities: Vec<f64>,
}

/// The game-history tree and the tallies it points at.
#[derive(Debug, Clone)]
pub struct HistoryTree {
    decisions: Vec<Decision>,
    nodes: Vec<HistoryNode>,
    tallies: TallyStore,
    num_players: usize,
    chance_player_exists: bool,
    max_depth: usize,
}

impl HistoryTree {
    /// Enumerate `game` and build its tree.
    pub fn from_game<G: Game>(game: &G) -> SolverResult<Self> {
        let paths = enumerate_paths(game)?;
        Self::from_paths(game.num_players(), game.decisions().to_vec(), paths)
    }

    /// Build the tree from an exhaustive, deterministic path enumeration.
    ///
    /// One node is created per distinct path prefix; decision nodes with the
    /// same (player, signature) share one tally.
    pub fn from_paths<I>(num_players: usize, decisions: Vec<Decision>, paths: I) -> SolverResult<Self>
    where
        I: IntoIterator<Item = GamePath>,
    {
        validate_decisions(num_players, &decisions)?;

        let mut tree = Self {
            decisions,
            nodes: Vec::new(),
            tallies: TallyStore::new(),
            num_players,
            chance_player_exists: false,
            max_depth: 0,
        };

        let mut num_paths = 0usize;
        for path in paths {
            tree.insert_path(&path)?;
            num_paths += 1;
        }
        if tree.nodes.is_empty() {
            return Err(SolverError::EmptyEnumeration);
        }
        tree.check_exhaustive(NodeId::ROOT, &mut Vec::new())?;

        log::debug!(
            "built history tree: {} paths, {} nodes, {} information sets, depth {}",
            num_paths,
            tree.nodes.len(),
            tree.tallies.num_info_sets(),
            tree.max_depth
        );
        Ok(tree)
    }

    fn insert_path(&mut self, path: &GamePath) -> SolverResult<()> {
        let depth = path.steps.len() + 1;
        if depth > MAX_TREE_DEPTH {
            return Err(SolverError::TreeTooDeep {
                depth,
                max: MAX_TREE_DEPTH,
            });
        }
        self.max_depth = self.max_depth.max(depth);

        let mut prefix: Vec<ActionCode> = Vec::with_capacity(path.steps.len());
        let mut parent: Option<(NodeId, ActionCode)> = None;
        for step in &path.steps {
            let node = self.node_for_step(step)?;
            let id = self.attach(parent, node, &prefix)?;
            parent = Some((id, step.action));
            prefix.push(step.action);
        }

        if path.utilities.len() != self.num_players {
            return Err(SolverError::UtilityLengthMismatch {
                path: prefix,
                expected: self.num_players,
                got: path.utilities.len(),
            });
        }
        let leaf = HistoryNode::Leaf {
            utilities: path.utilities.clone(),
        };
        self.attach(parent, leaf, &prefix)?;
        Ok(())
    }

    /// Node a step would create if its history has not been seen yet.
    fn node_for_step(&mut self, step: &PathStep) -> SolverResult<HistoryNode> {
        let decision = self
            .decisions
            .get(step.decision_index)
            .ok_or(SolverError::UnknownDecision {
                index: step.decision_index,
                available: self.decisions.len(),
            })?;
        if step.action == 0 || step.action > decision.num_actions {
            return Err(SolverError::ActionOutOfRange {
                decision: step.decision_index,
                action: step.action,
                num_actions: decision.num_actions,
            });
        }
        let children = vec![None; decision.num_actions as usize];
        let malformed = |reason: &str| SolverError::MalformedStep {
            decision: step.decision_index,
            reason: reason.to_string(),
        };

        match (&step.kind, decision.player) {
            (StepKind::Chance { probabilities }, Player::Chance) => {
                let chance = match (decision.unequal_chance_probabilities, probabilities) {
                    (false, _) => ChanceNode::equal(step.decision_index, decision.num_actions),
                    (true, Some(probs)) => {
                        ChanceNode::explicit(step.decision_index, decision.num_actions, probs.clone())?
                    }
                    (true, None) => {
                        return Err(malformed("state-dependent chance step carries no probabilities"))
                    }
                };
                self.chance_player_exists = true;
                Ok(HistoryNode::Chance { chance, children })
            }
            (StepKind::Player { player, signature }, Player::Index(owner)) => {
                if *player != owner as usize {
                    return Err(malformed(&format!(
                        "step names player {} but decision belongs to player {}",
                        player, owner
                    )));
                }
                let tally = self.tallies.get_or_insert(
                    step.decision_index,
                    decision.num_actions,
                    *player,
                    signature,
                )?;
                Ok(HistoryNode::Decision {
                    decision_index: step.decision_index,
                    tally,
                    children,
                })
            }
            (StepKind::Chance { .. }, Player::Index(_)) => Err(malformed("chance step at a player decision")),
            (StepKind::Player { .. }, Player::Chance) => Err(malformed("player step at a chance decision")),
        }
    }

    /// Attach `node` under `parent` (or as the root), or confirm that the
    /// existing node at that position agrees with it.
    fn attach(
        &mut self,
        parent: Option<(NodeId, ActionCode)>,
        node: HistoryNode,
        prefix: &[ActionCode],
    ) -> SolverResult<NodeId> {
        let existing = match parent {
            None => (!self.nodes.is_empty()).then_some(NodeId::ROOT),
            Some((p, action)) => self.nodes[p.index()].child(action),
        };

        if let Some(id) = existing {
            let current = &self.nodes[id.index()];
            if !current.same_kind(&node) {
                return Err(SolverError::NodeKindConflict {
                    path: prefix.to_vec(),
                    existing: current.describe(),
                    found: node.describe(),
                });
            }
            return Ok(id);
        }

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        if let Some((p, action)) = parent {
            if let Some(children) = self.nodes[p.index()].children_mut() {
                children[action as usize - 1] = Some(id);
            }
        }
        Ok(id)
    }

    /// Every child that can carry probability must have been visited.
    fn check_exhaustive(&self, id: NodeId, path: &mut Vec<ActionCode>) -> SolverResult<()> {
        let node = &self.nodes[id.index()];
        for (i, child) in node.children().iter().enumerate() {
            let action = i as ActionCode + 1;
            match child {
                Some(child) => {
                    path.push(action);
                    self.check_exhaustive(*child, path)?;
                    path.pop();
                }
                None if self.is_required_child(node, action) => {
                    return Err(SolverError::IncompleteEnumeration {
                        path: path.clone(),
                        action,
                    });
                }
                None => {}
            }
        }
        Ok(())
    }

    fn is_required_child(&self, node: &HistoryNode, action: ActionCode) -> bool {
        match node {
            HistoryNode::Chance { chance, .. } => chance.is_reachable(action),
            HistoryNode::Decision { decision_index, .. } => {
                match self.decisions[*decision_index].always_do_action {
                    Some(forced) => forced == action,
                    None => true,
                }
            }
            HistoryNode::Leaf { .. } => false,
        }
    }

    /// Cross-check every decision node's tally against the independent
    /// (player, signature) lookup and the decision it hangs under.
    pub fn verify(&self) -> SolverResult<()> {
        self.verify_node(NodeId::ROOT, &mut Vec::new())
    }

    fn verify_node(&self, id: NodeId, path: &mut Vec<ActionCode>) -> SolverResult<()> {
        let node = &self.nodes[id.index()];
        if let HistoryNode::Decision {
            decision_index,
            tally,
            children,
        } = node
        {
            let inconsistent = |reason: String| SolverError::InconsistentTally {
                path: path.clone(),
                reason,
            };
            let decision = &self.decisions[*decision_index];
            let record = self.tallies.get(*tally);

            if decision.player.index() != Some(record.player()) {
                return Err(inconsistent(format!(
                    "tally belongs to player {} but decision '{}' is owned by {}",
                    record.player(),
                    decision.name,
                    decision.player
                )));
            }
            if record.decision_index() != *decision_index {
                return Err(inconsistent(format!(
                    "tally was created for decision {} but sits under decision {}",
                    record.decision_index(),
                    decision_index
                )));
            }
            if record.num_actions() != children.len() {
                return Err(inconsistent(format!(
                    "tally has {} actions, node has {}",
                    record.num_actions(),
                    children.len()
                )));
            }
            if self.tallies.lookup(record.player(), record.signature()) != Some(*tally) {
                return Err(inconsistent(format!(
                    "lookup of '{}' does not resolve to {:?}",
                    record.signature(),
                    tally
                )));
            }
        }

        for (i, child) in node.children().iter().enumerate() {
            if let Some(child) = child {
                path.push(i as ActionCode + 1);
                self.verify_node(*child, path)?;
                path.pop();
            }
        }
        Ok(())
    }

    /// Root node id.
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Borrow a node.
    #[inline]
    pub fn node(&self, id: NodeId) -> &HistoryNode {
        &self.nodes[id.index()]
    }

    /// All nodes, indexable by `NodeId`.
    pub fn nodes(&self) -> &[HistoryNode] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest history, root = 1.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Follow `actions` from the root.
    pub fn find(&self, actions: &[ActionCode]) -> Option<NodeId> {
        actions
            .iter()
            .try_fold(NodeId::ROOT, |id, &action| self.node(id).child(action))
    }

    /// The execution order.
    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    /// One decision.
    #[inline]
    pub fn decision(&self, index: usize) -> &Decision {
        &self.decisions[index]
    }

    /// Tally arena.
    pub fn tallies(&self) -> &TallyStore {
        &self.tallies
    }

    /// Mutable tally arena.
    pub fn tallies_mut(&mut self) -> &mut TallyStore {
        &mut self.tallies
    }

    /// Nodes, decisions and a mutable tally arena at once.
    pub fn split_mut(&mut self) -> (&[HistoryNode], &[Decision], &mut TallyStore) {
        (&self.nodes, &self.decisions, &mut self.tallies)
    }

    /// Number of non-chance players.
    pub fn num_players(&self) -> usize {
        self.num_players
    }

    /// Whether any chance node exists.
    pub fn chance_player_exists(&self) -> bool {
        self.chance_player_exists
    }

    /// Expected utility of every player when all players follow `strategy`.
    pub fn expected_utilities(&self, strategy: ActionStrategy, pruning_threshold: f64) -> Vec<f64> {
        let mut totals = vec![0.0; self.num_players];
        self.accumulate_utilities(NodeId::ROOT, 1.0, strategy, pruning_threshold, &mut totals);
        totals
    }

    fn accumulate_utilities(
        &self,
        id: NodeId,
        reach: f64,
        strategy: ActionStrategy,
        pruning_threshold: f64,
        totals: &mut [f64],
    ) {
        match self.node(id) {
            HistoryNode::Leaf { utilities } => {
                for (total, u) in totals.iter_mut().zip(utilities) {
                    *total += reach * u;
                }
            }
            HistoryNode::Chance { chance, children } => {
                for (i, child) in children.iter().enumerate() {
                    let p = chance.probability(i as ActionCode + 1);
                    if let (Some(child), true) = (child, p > 0.0) {
                        self.accumulate_utilities(*child, reach * p, strategy, pruning_threshold, totals);
                    }
                }
            }
            HistoryNode::Decision {
                decision_index,
                tally,
                children,
            } => {
                let mut probs = vec![0.0; children.len()];
                action_probabilities(
                    strategy,
                    self.decision(*decision_index),
                    self.tallies.get(*tally),
                    pruning_threshold,
                    &mut probs,
                );
                for (child, &p) in children.iter().zip(&probs) {
                    if let (Some(child), true) = (child, p > 0.0) {
                        self.accumulate_utilities(*child, reach * p, strategy, pruning_threshold, totals);
                    }
                }
            }
        }
    }

    /// Play one path through the tree, sampling chance and every player's
    /// action from `strategy`.
    pub fn sample_playout<R: Rng>(&self, strategy: ActionStrategy, pruning_threshold: f64, rng: &mut R) -> Playout {
        let mut actions = Vec::new();
        let mut id = NodeId::ROOT;
        loop {
            let probs = match self.node(id) {
                HistoryNode::Leaf { utilities } => {
                    return Playout {
                        actions,
                        utilities: utilities.clone(),
                    }
                }
                HistoryNode::Chance { chance, .. } => (1..=chance.num_actions())
                    .map(|a| chance.probability(a))
                    .collect::<Vec<_>>(),
                HistoryNode::Decision {
                    decision_index,
                    tally,
                    children,
                } => {
                    let mut probs = vec![0.0; children.len()];
                    action_probabilities(
                        strategy,
                        self.decision(*decision_index),
                        self.tallies.get(*tally),
                        pruning_threshold,
                        &mut probs,
                    );
                    probs
                }
            };
            let action = sample_action(&probs, rng);
            actions.push(action);
            // Children with positive probability exist after construction.
            match self.node(id).child(action) {
                Some(child) => id = child,
                None => {
                    return Playout {
                        actions,
                        utilities: vec![0.0; self.num_players],
                    }
                }
            }
        }
    }
}

/// Sample an action code according to a probability distribution.
pub fn sample_action<R: Rng>(probs: &[f64], rng: &mut R) -> ActionCode {
    let r: f64 = rng.gen();
    let mut cumsum = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        cumsum += p;
        if r < cumsum {
            return i as ActionCode + 1;
        }
    }
    // Floating point imprecision: fall back to the last action with mass.
    probs
        .iter()
        .rposition(|&p| p > 0.0)
        .map_or(probs.len(), |i| i + 1) as ActionCode
}

fn validate_decisions(num_players: usize, decisions: &[Decision]) -> SolverResult<()> {
    for (position, decision) in decisions.iter().enumerate() {
        if decision.execution_order != position {
            return Err(SolverError::MisorderedDecision {
                name: decision.name.clone(),
                declared: decision.execution_order,
                position,
            });
        }
        if decision.num_actions == 0 {
            return Err(SolverError::NoActions {
                name: decision.name.clone(),
            });
        }
        if let Some(player) = decision.player.index() {
            if player >= num_players {
                return Err(SolverError::InvalidPlayer { player, num_players });
            }
        }
        if let Some(forced) = decision.always_do_action {
            if forced == 0 || forced > decision.num_actions {
                return Err(SolverError::ActionOutOfRange {
                    decision: position,
                    action: forced,
                    num_actions: decision.num_actions,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::kuhn::KuhnPoker;
    use crate::games::pennies::MatchingPennies;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn player_step(decision_index: usize, action: ActionCode, player: usize, signature: &str) -> PathStep {
        PathStep {
            decision_index,
            action,
            kind: StepKind::Player {
                player,
                signature: signature.to_string(),
            },
        }
    }

    fn one_decision_paths() -> (Vec<Decision>, Vec<GamePath>) {
        let decisions = vec![Decision::player("pick", 0, 0, 2)];
        let paths = vec![
            GamePath {
                steps: vec![player_step(0, 1, 0, "root")],
                utilities: vec![1.0],
            },
            GamePath {
                steps: vec![player_step(0, 2, 0, "root")],
                utilities: vec![-1.0],
            },
        ];
        (decisions, paths)
    }

    #[test]
    fn test_one_node_per_prefix() {
        let tree = HistoryTree::from_game(&MatchingPennies::new()).unwrap();
        // root + 2 P1 nodes + 4 leaves
        assert_eq!(tree.num_nodes(), 7);
        assert_eq!(tree.max_depth(), 3);
        assert_eq!(tree.num_players(), 2);
        assert!(!tree.chance_player_exists());
        // P1 cannot see P0's action: one shared tally
        assert_eq!(tree.tallies().num_info_sets(), 2);
        let a = tree.find(&[1]).unwrap();
        let b = tree.find(&[2]).unwrap();
        match (tree.node(a), tree.node(b)) {
            (HistoryNode::Decision { tally: ta, .. }, HistoryNode::Decision { tally: tb, .. }) => {
                assert_eq!(ta, tb)
            }
            _ => panic!("expected decision nodes"),
        }
        tree.verify().unwrap();
    }

    #[test]
    fn test_kuhn_tree_shape() {
        let tree = HistoryTree::from_game(&KuhnPoker::new()).unwrap();
        assert!(tree.chance_player_exists());
        // 3 cards x 4 histories (root, p, b, pb)
        assert_eq!(tree.tallies().num_info_sets(), 12);
        tree.verify().unwrap();
    }

    #[test]
    fn test_incomplete_enumeration_is_rejected() {
        let (decisions, mut paths) = one_decision_paths();
        paths.pop();
        let err = HistoryTree::from_paths(1, decisions, paths).unwrap_err();
        assert!(matches!(err, SolverError::IncompleteEnumeration { action: 2, .. }));
    }

    #[test]
    fn test_unknown_decision_is_rejected() {
        let (decisions, mut paths) = one_decision_paths();
        paths[0].steps[0].decision_index = 7;
        let err = HistoryTree::from_paths(1, decisions, paths).unwrap_err();
        assert!(matches!(err, SolverError::UnknownDecision { index: 7, .. }));
    }

    #[test]
    fn test_action_out_of_range_is_rejected() {
        let (decisions, mut paths) = one_decision_paths();
        paths[1].steps[0].action = 3;
        let err = HistoryTree::from_paths(1, decisions, paths).unwrap_err();
        assert!(matches!(err, SolverError::ActionOutOfRange { action: 3, .. }));
    }

    #[test]
    fn test_utility_length_is_checked() {
        let (decisions, mut paths) = one_decision_paths();
        paths[0].utilities.push(0.0);
        let err = HistoryTree::from_paths(1, decisions, paths).unwrap_err();
        assert!(matches!(err, SolverError::UtilityLengthMismatch { expected: 1, got: 2, .. }));
    }

    #[test]
    fn test_node_kind_conflict() {
        let (decisions, mut paths) = one_decision_paths();
        // Same history, different information set.
        paths[1].steps[0] = player_step(0, 2, 0, "elsewhere");
        let err = HistoryTree::from_paths(1, decisions, paths).unwrap_err();
        assert!(matches!(err, SolverError::NodeKindConflict { .. }));
    }

    #[test]
    fn test_chance_step_at_player_decision() {
        let (decisions, mut paths) = one_decision_paths();
        paths[0].steps[0].kind = StepKind::Chance { probabilities: None };
        let err = HistoryTree::from_paths(1, decisions, paths).unwrap_err();
        assert!(matches!(err, SolverError::MalformedStep { decision: 0, .. }));
    }

    #[test]
    fn test_player_step_at_chance_decision() {
        let decisions = vec![Decision::chance("coin", 0, 2)];
        let paths = vec![
            GamePath {
                steps: vec![player_step(0, 1, 0, "coin")],
                utilities: vec![1.0],
            },
            GamePath {
                steps: vec![player_step(0, 2, 0, "coin")],
                utilities: vec![0.0],
            },
        ];
        let err = HistoryTree::from_paths(1, decisions, paths).unwrap_err();
        assert!(matches!(err, SolverError::MalformedStep { decision: 0, .. }));
    }

    #[test]
    fn test_step_player_must_own_decision() {
        let decisions = vec![Decision::player("pick", 0, 1, 2)];
        let paths = vec![GamePath {
            steps: vec![player_step(0, 1, 0, "root")],
            utilities: vec![0.0, 0.0],
        }];
        let err = HistoryTree::from_paths(2, decisions, paths).unwrap_err();
        match err {
            SolverError::MalformedStep { decision, reason } => {
                assert_eq!(decision, 0);
                assert!(reason.contains("player 0"), "{}", reason);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unequal_chance_step_needs_probabilities() {
        let decisions = vec![Decision::chance("coin", 0, 2).with_unequal_probabilities()];
        let paths = vec![GamePath {
            steps: vec![PathStep {
                decision_index: 0,
                action: 1,
                kind: StepKind::Chance { probabilities: None },
            }],
            utilities: vec![1.0],
        }];
        let err = HistoryTree::from_paths(1, decisions, paths).unwrap_err();
        assert!(matches!(err, SolverError::MalformedStep { decision: 0, .. }));
    }

    /// Point the decision node at `path` to another tally.
    fn retarget(tree: &mut HistoryTree, path: &[ActionCode], to: TallyId) {
        let id = tree.find(path).unwrap();
        match &mut tree.nodes[id.index()] {
            HistoryNode::Decision { tally, .. } => *tally = to,
            other => panic!("expected a decision node, found {}", other.describe()),
        }
    }

    fn tally_at(tree: &HistoryTree, path: &[ActionCode]) -> TallyId {
        match tree.node(tree.find(path).unwrap()) {
            HistoryNode::Decision { tally, .. } => *tally,
            _ => panic!("expected a decision node"),
        }
    }

    #[test]
    fn test_verify_detects_tally_of_another_player() {
        let mut tree = HistoryTree::from_game(&MatchingPennies::new()).unwrap();
        let p1_tally = tally_at(&tree, &[1]);
        retarget(&mut tree, &[], p1_tally);

        let err = tree.verify().unwrap_err();
        match err {
            SolverError::InconsistentTally { path, reason } => {
                assert!(path.is_empty());
                assert!(reason.contains("player 1"), "{}", reason);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_verify_detects_tally_of_another_decision() {
        // Kuhn P1 opens at decision 2 and faces a bet at decision 4.
        let mut tree = HistoryTree::from_game(&KuhnPoker::new()).unwrap();
        let facing_bet = tally_at(&tree, &[1, 1, 1, 2]);
        retarget(&mut tree, &[1, 1], facing_bet);

        let err = tree.verify().unwrap_err();
        assert!(matches!(err, SolverError::InconsistentTally { ref path, .. } if path == &vec![1, 1]));
    }

    #[test]
    fn test_solver_refuses_desynchronized_tree() {
        let mut tree = HistoryTree::from_game(&MatchingPennies::new()).unwrap();
        let p1_tally = tally_at(&tree, &[2]);
        retarget(&mut tree, &[], p1_tally);

        let err = crate::cfr::CFRSolver::new(tree, crate::cfr::CFRConfig::default()).err();
        assert!(matches!(err, Some(SolverError::InconsistentTally { .. })));
    }

    #[test]
    fn test_misordered_decisions() {
        let decisions = vec![Decision::player("pick", 3, 0, 2)];
        let err = HistoryTree::from_paths(1, decisions, Vec::new()).unwrap_err();
        assert!(matches!(err, SolverError::MisorderedDecision { .. }));
    }

    #[test]
    fn test_empty_enumeration() {
        let err = HistoryTree::from_paths(1, Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, SolverError::EmptyEnumeration));
    }

    #[test]
    fn test_forced_decision_only_needs_forced_child() {
        let decisions = vec![Decision::player("pick", 0, 0, 3).with_forced_action(2)];
        let paths = vec![GamePath {
            steps: vec![player_step(0, 2, 0, "root")],
            utilities: vec![5.0],
        }];
        let tree = HistoryTree::from_paths(1, decisions, paths).unwrap();
        assert_eq!(tree.expected_utilities(ActionStrategy::RegretMatching, 0.0), vec![5.0]);
    }

    #[test]
    fn test_expected_utilities_uniform_profile() {
        let tree = HistoryTree::from_game(&MatchingPennies::new()).unwrap();
        let utilities = tree.expected_utilities(ActionStrategy::AverageStrategy, 0.0);
        assert!(utilities.iter().all(|u| u.abs() < 1e-12));
    }

    #[test]
    fn test_sample_playout_reaches_a_leaf() {
        let tree = HistoryTree::from_game(&KuhnPoker::new()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let playout = tree.sample_playout(ActionStrategy::RegretMatching, 0.0, &mut rng);
            let leaf = tree.find(&playout.actions).unwrap();
            assert!(matches!(tree.node(leaf), HistoryNode::Leaf { .. }));
            assert_eq!(playout.utilities.iter().sum::<f64>(), 0.0);
        }
    }

    #[test]
    fn test_sample_action_falls_back_to_last_mass() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(sample_action(&[0.0, 1.0, 0.0], &mut rng), 2);
        }
    }
}
