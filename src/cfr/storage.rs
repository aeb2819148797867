//! Arena of information-set tallies.
//!
//! Tallies live in a single `Vec` and history nodes refer to them by
//! [`TallyId`]. An identity-keyed table maps (player, signature) to the
//! index so every path through the same information set shares one tally.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cfr::error::{SolverError, SolverResult};
use crate::cfr::tally::InformationSetTally;

/// Index of a tally in a [`TallyStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TallyId(pub u32);

impl TallyId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Storage for every information-set tally of a game.
#[derive(Debug, Clone, Default)]
pub struct TallyStore {
    tallies: Vec<InformationSetTally>,
    index: FxHashMap<(usize, String), TallyId>,
}

impl TallyStore {
    /// Create new empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the tally for `(player, signature)`, creating it on first use.
    ///
    /// Reaching an existing information set from a different decision or
    /// with a different action count is a construction error.
    pub fn get_or_insert(
        &mut self,
        decision_index: usize,
        num_actions: u8,
        player: usize,
        signature: &str,
    ) -> SolverResult<TallyId> {
        if let Some(&id) = self.index.get(&(player, signature.to_string())) {
            let tally = &self.tallies[id.index()];
            if tally.decision_index() != decision_index || tally.num_actions() != num_actions as usize {
                return Err(SolverError::InformationSetConflict {
                    player,
                    signature: signature.to_string(),
                    existing: tally.decision_index(),
                    found: decision_index,
                });
            }
            return Ok(id);
        }

        let id = TallyId(self.tallies.len() as u32);
        self.tallies.push(InformationSetTally::new(decision_index, player, signature, num_actions));
        self.index.insert((player, signature.to_string()), id);
        Ok(id)
    }

    /// Look up a tally id independently of the tree.
    pub fn lookup(&self, player: usize, signature: &str) -> Option<TallyId> {
        self.index.get(&(player, signature.to_string())).copied()
    }

    /// Borrow a tally.
    #[inline]
    pub fn get(&self, id: TallyId) -> &InformationSetTally {
        &self.tallies[id.index()]
    }

    /// Mutably borrow a tally.
    #[inline]
    pub fn get_mut(&mut self, id: TallyId) -> &mut InformationSetTally {
        &mut self.tallies[id.index()]
    }

    /// Look up a tally by (player, signature).
    pub fn find(&self, player: usize, signature: &str) -> Option<&InformationSetTally> {
        self.lookup(player, signature).map(|id| self.get(id))
    }

    /// Get the number of information sets stored.
    pub fn num_info_sets(&self) -> usize {
        self.tallies.len()
    }

    /// Iterate over all tallies in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (TallyId, &InformationSetTally)> {
        self.tallies
            .iter()
            .enumerate()
            .map(|(i, t)| (TallyId(i as u32), t))
    }

    /// Iterate over every tally owned by `player`.
    pub fn for_player(&self, player: usize) -> impl Iterator<Item = &InformationSetTally> {
        self.tallies.iter().filter(move |t| t.player() == player)
    }

    /// Get total memory usage estimate in bytes.
    pub fn memory_usage(&self) -> usize {
        self.tallies
            .iter()
            .map(|t| t.signature().len() + t.num_actions() * 4 * std::mem::size_of::<f64>())
            .sum()
    }

    /// Export cumulative regrets and strategy sums.
    pub fn export(&self) -> StorageExport {
        let mut regrets = FxHashMap::default();
        let mut strategy_sums = FxHashMap::default();
        for (_, tally) in self.iter() {
            let key = export_key(tally);
            let actions = 1..=tally.num_actions() as u8;
            regrets.insert(key.clone(), actions.clone().map(|a| tally.cumulative_regret(a)).collect());
            strategy_sums.insert(key, actions.map(|a| tally.cumulative_strategy(a)).collect());
        }
        StorageExport {
            regrets,
            strategy_sums,
        }
    }
}

/// Key used in exports: `P{player}:{signature}`.
pub fn export_key(tally: &InformationSetTally) -> String {
    format!("P{}:{}", tally.player(), tally.signature())
}

/// Serializable export format for storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageExport {
    /// Cumulative regrets
    pub regrets: FxHashMap<String, Vec<f64>>,
    /// Cumulative strategy sums
    pub strategy_sums: FxHashMap<String, Vec<f64>>,
}

/// Snapshot of average strategies, used for the convergence indicator and
/// for reporting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategySnapshot {
    /// Average strategies: export key -> [probability per action]
    pub strategies: FxHashMap<String, Vec<f64>>,
    /// Strategy sum totals: export key -> sum of all strategy weights.
    /// Used to determine if an info set has been visited.
    pub totals: FxHashMap<String, f64>,
}

impl TallyStore {
    /// Create a snapshot of all current average strategies.
    pub fn snapshot_strategies(&self) -> StrategySnapshot {
        let mut snapshot = StrategySnapshot::default();
        for (_, tally) in self.iter() {
            let mut probs = vec![0.0; tally.num_actions()];
            tally.get_average_strategies(&mut probs);
            let total = (1..=tally.num_actions() as u8)
                .map(|a| tally.cumulative_strategy(a))
                .sum();
            let key = export_key(tally);
            snapshot.strategies.insert(key.clone(), probs);
            snapshot.totals.insert(key, total);
        }
        snapshot
    }

    /// Convergence Indicator: 100 × mean L1 change of average strategies
    /// since `snapshot`, over information sets visited in either.
    ///
    /// Returns infinity when nothing can be compared.
    pub fn calculate_ci(&self, snapshot: &StrategySnapshot) -> f64 {
        let mut total_change = 0.0;
        let mut num_info_sets = 0;

        for (_, tally) in self.iter() {
            let key = export_key(tally);
            let current_total: f64 = (1..=tally.num_actions() as u8)
                .map(|a| tally.cumulative_strategy(a))
                .sum();
            let old_total = snapshot.totals.get(&key).copied().unwrap_or(0.0);
            if current_total == 0.0 && old_total == 0.0 {
                continue;
            }

            let mut current = vec![0.0; tally.num_actions()];
            tally.get_average_strategies(&mut current);
            let uniform = vec![1.0 / tally.num_actions() as f64; tally.num_actions()];
            let old = snapshot.strategies.get(&key).unwrap_or(&uniform);

            total_change += current
                .iter()
                .zip(old)
                .map(|(new, old)| (new - old).abs())
                .sum::<f64>();
            num_info_sets += 1;
        }

        if num_info_sets == 0 {
            return f64::INFINITY;
        }
        100.0 * total_change / num_info_sets as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_signature_shares_tally() {
        let mut store = TallyStore::new();
        let a = store.get_or_insert(1, 2, 0, "K").unwrap();
        let b = store.get_or_insert(1, 2, 0, "K").unwrap();
        let c = store.get_or_insert(1, 2, 1, "K").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.num_info_sets(), 2);
        assert_eq!(store.lookup(1, "K"), Some(c));

        store.get(a).increment_cumulative_regret(1, 2.0);
        assert_eq!(store.get(b).cumulative_regret(1), 2.0);
    }

    #[test]
    fn test_conflicting_information_set_is_rejected() {
        let mut store = TallyStore::new();
        store.get_or_insert(1, 2, 0, "K").unwrap();
        assert!(matches!(
            store.get_or_insert(1, 3, 0, "K"),
            Err(SolverError::InformationSetConflict { .. })
        ));
        assert!(store.get_or_insert(4, 2, 0, "K").is_err());
    }

    #[test]
    fn test_snapshot_and_ci() {
        let mut store = TallyStore::new();
        let id = store.get_or_insert(0, 2, 0, "root").unwrap();
        assert!(store.calculate_ci(&store.snapshot_strategies()).is_infinite());

        store.get(id).increment_cumulative_strategy(1, 1.0);
        let snapshot = store.snapshot_strategies();
        assert_eq!(snapshot.strategies["P0:root"], vec![1.0, 0.0]);
        assert_eq!(store.calculate_ci(&snapshot), 0.0);

        store.get(id).increment_cumulative_strategy(2, 1.0);
        // [1, 0] -> [0.5, 0.5]: L1 change of 1.0
        assert!((store.calculate_ci(&snapshot) - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_export_round_trips_through_json() {
        let mut store = TallyStore::new();
        let id = store.get_or_insert(0, 2, 1, "b").unwrap();
        store.get(id).increment_cumulative_regret(2, -1.5);
        let json = serde_json::to_string(&store.export()).unwrap();
        let back: StorageExport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.regrets["P1:b"], vec![0.0, -1.5]);
    }
}
