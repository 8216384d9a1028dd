//! Tabular Q-learning over exact-match state keys

use fxhash::FxHashMap;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::encoder::StateKey;

/// Fixed learning constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QLearningParams {
    /// Step size of each update (alpha)
    pub learning_rate: f64,
    /// Weight of the bootstrapped next-state value (gamma)
    pub discount: f64,
    /// Probability of acting greedily; exploration happens with `1 - epsilon`
    pub epsilon: f64,
}

impl Default for QLearningParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            discount: 0.9,
            epsilon: 0.9,
        }
    }
}

/// Successor of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextState {
    Terminal,
    State(StateKey),
}

/// The persisted part of the table: column labels and value rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: FxHashMap<StateKey, Vec<f64>>,
}

impl TableData {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: FxHashMap::default(),
        }
    }

    /// Every row has one value per column
    pub fn is_well_formed(&self) -> bool {
        self.rows.values().all(|r| r.len() == self.columns.len())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    data: TableData,
    params: QLearningParams,
}

impl QTable {
    /// An empty table with one column per action label
    pub fn new(columns: Vec<String>, params: QLearningParams) -> Self {
        Self {
            data: TableData::new(columns),
            params,
        }
    }

    pub fn from_data(data: TableData, params: QLearningParams) -> Self {
        Self { data, params }
    }

    pub fn data(&self) -> &TableData {
        &self.data
    }

    pub fn params(&self) -> &QLearningParams {
        &self.params
    }

    pub fn num_actions(&self) -> usize {
        self.data.columns.len()
    }

    /// Number of states seen so far
    pub fn len(&self) -> usize {
        self.data.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.rows.is_empty()
    }

    pub fn contains(&self, key: StateKey) -> bool {
        self.data.rows.contains_key(&key)
    }

    /// Stored row for `key`, without creating it
    pub fn row(&self, key: StateKey) -> Option<&[f64]> {
        self.data.rows.get(&key).map(Vec::as_slice)
    }

    /// Value of `action` in `key`; unseen states read as zero
    pub fn value(&self, key: StateKey, action: usize) -> f64 {
        self.row(key)
            .and_then(|r| r.get(action).copied())
            .unwrap_or(0.0)
    }

    fn ensure_row(&mut self, key: StateKey) -> &mut Vec<f64> {
        let width = self.data.columns.len();
        self.data.rows.entry(key).or_insert_with(|| vec![0.0; width])
    }

    /// Epsilon-greedy selection. The greedy branch breaks ties uniformly at
    /// random; the exploring branch ignores the row entirely.
    pub fn choose_action<R: Rng + ?Sized>(&mut self, key: StateKey, rng: &mut R) -> usize {
        let epsilon = self.params.epsilon;
        let num_actions = self.num_actions();
        let row = self.ensure_row(key);

        if rng.random::<f64>() < epsilon {
            greedy_action(row, rng)
        } else {
            rng.random_range(0..num_actions.max(1))
        }
    }

    /// One Q-learning update. Returns the new value of `(prev, action)`.
    ///
    /// A terminal successor uses the reward as the target without reading
    /// any other row.
    pub fn learn(&mut self, prev: StateKey, action: usize, reward: f64, next: NextState) -> f64 {
        let QLearningParams {
            learning_rate,
            discount,
            ..
        } = self.params;

        let target = match next {
            NextState::Terminal => reward,
            NextState::State(next) => {
                let best_next = max_value(self.ensure_row(next));
                reward + discount * best_next
            }
        };

        let row = self.ensure_row(prev);
        let width = row.len();
        match row.get_mut(action) {
            Some(q) => {
                *q += learning_rate * (target - *q);
                *q
            }
            None => {
                tracing::warn!(action, width, "Learn on out-of-range action ignored");
                0.0
            }
        }
    }
}

fn max_value(row: &[f64]) -> f64 {
    if row.is_empty() {
        return 0.0;
    }
    row.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn greedy_action<R: Rng + ?Sized>(row: &[f64], rng: &mut R) -> usize {
    let best = max_value(row);
    let tied: Vec<usize> = row
        .iter()
        .enumerate()
        .filter(|(_, v)| **v == best)
        .map(|(i, _)| i)
        .collect();
    tied.choose(rng).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::encoder::StateVector;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn key(values: [u16; 8]) -> StateKey {
        StateVector::new(values).key()
    }

    fn table(actions: usize, params: QLearningParams) -> QTable {
        QTable::new((0..actions).map(|i| format!("a{i}")).collect(), params)
    }

    #[test]
    fn test_unseen_row_reads_zero() {
        let mut table = table(5, QLearningParams::default());
        let s = key([1, 0, 0, 0, 0, 0, 0, 0]);

        assert!(table.row(s).is_none());
        assert_eq!(table.value(s, 3), 0.0);

        let mut rng = StdRng::seed_from_u64(1);
        table.choose_action(s, &mut rng);
        assert_eq!(table.row(s), Some(&[0.0; 5][..]));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_terminal_learn_uses_only_reward() {
        let params = QLearningParams::default();
        let s = key([0; 8]);
        let other = key([1, 1, 1, 1, 1, 1, 1, 1]);

        let mut a = table(4, params);
        let mut b = table(4, params);
        // give b a large value elsewhere; a terminal update must not see it
        b.learn(other, 0, 1000.0, NextState::Terminal);

        let va = a.learn(s, 2, 1.0, NextState::Terminal);
        let vb = b.learn(s, 2, 1.0, NextState::Terminal);
        assert_eq!(va, vb);
        assert!((va - 0.01).abs() < 1e-12);
        assert!(!a.contains(other));
    }

    #[test]
    fn test_learn_bootstraps_from_next_row_max() {
        let params = QLearningParams {
            learning_rate: 0.5,
            discount: 0.9,
            epsilon: 0.9,
        };
        let mut table = table(3, params);
        let s = key([0; 8]);
        let next = key([0, 1, 0, 0, 0, 0, 0, 0]);

        table.learn(next, 1, 2.0, NextState::Terminal); // next row: [0, 1, 0]
        table.learn(next, 2, -4.0, NextState::Terminal); // next row: [0, 1, -2]

        let value = table.learn(s, 0, 0.0, NextState::State(next));
        assert!((value - 0.5 * 0.9 * 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_learn_creates_next_row() {
        let mut table = table(3, QLearningParams::default());
        let s = key([0; 8]);
        let next = key([0, 0, 0, 9, 0, 0, 0, 0]);

        let value = table.learn(s, 1, 0.0, NextState::State(next));
        assert_eq!(value, 0.0);
        assert!(table.contains(next));
        assert!(table.contains(s));
    }

    #[test]
    fn test_greedy_picks_maximum() {
        let params = QLearningParams {
            learning_rate: 1.0,
            discount: 0.9,
            epsilon: 1.0,
        };
        let mut table = table(6, params);
        let s = key([0; 8]);
        table.learn(s, 4, 3.0, NextState::Terminal);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(table.choose_action(s, &mut rng), 4);
        }
    }

    #[test]
    fn test_greedy_ties_are_not_biased_to_lowest_index() {
        let params = QLearningParams {
            epsilon: 1.0,
            ..QLearningParams::default()
        };
        let mut table = table(4, params);
        let s = key([0; 8]);

        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [0usize; 4];
        for _ in 0..400 {
            seen[table.choose_action(s, &mut rng)] += 1;
        }
        assert!(seen.iter().all(|&n| n > 50), "tie-break counts: {seen:?}");
    }

    #[test]
    fn test_exploration_ignores_values() {
        let params = QLearningParams {
            learning_rate: 1.0,
            discount: 0.9,
            epsilon: 0.0,
        };
        let mut table = table(4, params);
        let s = key([0; 8]);
        table.learn(s, 0, 10.0, NextState::Terminal);

        let mut rng = StdRng::seed_from_u64(3);
        let picks: Vec<usize> = (0..200).map(|_| table.choose_action(s, &mut rng)).collect();
        assert!(picks.iter().any(|&a| a != 0));
        assert!(picks.iter().all(|&a| a < 4));
    }

    #[test]
    fn test_out_of_range_action_is_ignored() {
        let mut table = table(2, QLearningParams::default());
        let s = key([0; 8]);
        assert_eq!(table.learn(s, 5, 1.0, NextState::Terminal), 0.0);
        assert_eq!(table.row(s), Some(&[0.0, 0.0][..]));
    }
}
