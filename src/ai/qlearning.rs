use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::agent::{Agent, EvalState};
use super::q_table::{ActionValues, QTable};
use crate::game::{Board, StateKey};

/// Q-learning hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    /// Learning rate α.
    pub alpha: f64,
    /// Discount γ on the best next-state value.
    pub gamma: f64,
    /// Initial exploration probability ε.
    pub epsilon: f64,
    /// Multiplier applied to ε after every learning ply.
    pub epsilon_decay: f64,
    /// Floor for ε.
    pub epsilon_min: f64,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        QLearningConfig {
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 1.0,
            epsilon_decay: 0.995,
            epsilon_min: 0.01,
        }
    }
}

/// Mutable training state written alongside the table in checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QLearningTrainingState {
    pub epsilon: f64,
    pub update_count: u64,
    pub config: QLearningConfig,
}

/// Tabular Q-learning agent with ε-greedy exploration.
///
/// Selection and learning are separate calls; the caller decides which
/// plies are learned from and when ε decays.
pub struct QLearningAgent {
    table: QTable,
    config: QLearningConfig,
    epsilon: f64,
    update_count: u64,
    rng: StdRng,
}

impl QLearningAgent {
    pub fn new(config: QLearningConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    pub fn with_seed(config: QLearningConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: QLearningConfig, rng: StdRng) -> Self {
        QLearningAgent {
            table: QTable::new(),
            epsilon: config.epsilon,
            config,
            update_count: 0,
            rng,
        }
    }

    /// ε-greedy choice among `legal`.
    ///
    /// Explores with probability ε, and also when the state has never been
    /// entered in the table. Otherwise takes the first column in `legal` with
    /// the highest stored value, unstored columns counting as `0.0`.
    pub fn select_action(&mut self, board: &Board, legal: &[usize]) -> usize {
        assert!(!legal.is_empty(), "select_action called with no legal columns");

        if self.rng.random::<f64>() < self.epsilon {
            return self.random_column(legal);
        }

        let key = board.state_key();
        match self.table.get(&key) {
            Some(values) => greedy_column(values, legal),
            None => self.random_column(legal),
        }
    }

    fn random_column(&mut self, legal: &[usize]) -> usize {
        *legal.choose(&mut self.rng).expect("legal is non-empty")
    }

    /// One-step Q-learning update for `action` taken on `pre`, landing on `post`.
    ///
    /// Both states get a table entry, even if `post` is never looked up again.
    pub fn update(&mut self, pre: &Board, action: usize, reward: f64, post: &Board) {
        assert!(action < pre.cols(), "update with out-of-range column {action}");
        assert!(
            !pre.is_column_full(action) && post.column_height(action) == pre.column_height(action) + 1,
            "update with column {action} that was not played between the two boards"
        );

        let pre_key = pre.state_key();
        let post_key = post.state_key();
        self.table.ensure_entry(pre_key);
        self.table.ensure_entry(post_key);

        let target = self.table.max_value(&post_key);
        let current = self.table.value(&pre_key, action);
        let updated = current + self.config.alpha * (reward + self.config.gamma * target - current);
        self.table.set(pre_key, action, updated);
        self.update_count += 1;
    }

    /// ε ← max(ε_min, ε · decay)
    pub fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Up to `limit` table entries in the order states were first seen.
    pub fn q_table_entries(&self, limit: usize) -> impl Iterator<Item = (&StateKey, &ActionValues)> {
        self.table.entries(limit)
    }

    pub fn training_state(&self) -> QLearningTrainingState {
        QLearningTrainingState {
            epsilon: self.epsilon,
            update_count: self.update_count,
            config: self.config.clone(),
        }
    }

    /// Replace the table and counters with ones loaded from a checkpoint.
    /// The hyperparameters this agent was built with are kept.
    pub fn restore(&mut self, table: QTable, state: &QLearningTrainingState) {
        self.table = table;
        self.epsilon = state.epsilon;
        self.update_count = state.update_count;
    }
}

fn greedy_column(values: &ActionValues, legal: &[usize]) -> usize {
    let q = |col: usize| values.get(&col).copied().unwrap_or(0.0);
    let mut best = legal[0];
    let mut best_q = q(best);
    for &col in &legal[1..] {
        let value = q(col);
        if value > best_q {
            best = col;
            best_q = value;
        }
    }
    best
}

impl Agent for QLearningAgent {
    fn select_action(&mut self, board: &Board, legal: &[usize]) -> usize {
        QLearningAgent::select_action(self, board, legal)
    }

    fn name(&self) -> &str {
        "Q-learning"
    }

    fn enter_eval_mode(&mut self) -> EvalState {
        let saved = self.epsilon;
        self.epsilon = 0.0;
        EvalState::Epsilon(saved)
    }

    fn exit_eval_mode(&mut self, state: EvalState) {
        if let EvalState::Epsilon(epsilon) = state {
            self.epsilon = epsilon;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Cell, COLS};

    fn greedy_agent() -> QLearningAgent {
        QLearningAgent::with_seed(
            QLearningConfig {
                epsilon: 0.0,
                ..Default::default()
            },
            11,
        )
    }

    fn played(board: &Board, col: usize, cell: Cell) -> Board {
        let mut next = *board;
        next.drop_piece(col, cell).unwrap();
        next
    }

    #[test]
    fn test_default_config() {
        let config = QLearningConfig::default();
        assert_eq!(config.alpha, 0.1);
        assert_eq!(config.gamma, 0.9);
        assert_eq!(config.epsilon, 1.0);
        assert_eq!(config.epsilon_decay, 0.995);
        assert_eq!(config.epsilon_min, 0.01);
    }

    #[test]
    fn test_single_update_from_zero() {
        let mut agent = QLearningAgent::with_seed(QLearningConfig::default(), 0);
        let pre = Board::new();
        let post = played(&pre, 3, Cell::Yellow);

        agent.update(&pre, 3, 5.0, &post);

        assert_eq!(agent.table().value(&pre.state_key(), 3), 0.5);
        assert_eq!(agent.update_count(), 1);
    }

    #[test]
    fn test_update_creates_post_state_entry() {
        let mut agent = greedy_agent();
        let pre = Board::new();
        let post = played(&pre, 0, Cell::Red);

        agent.update(&pre, 0, 0.0, &post);

        let post_values = agent.table().get(&post.state_key()).unwrap();
        assert!(post_values.is_empty());
        assert_eq!(agent.table().len(), 2);
    }

    #[test]
    fn test_update_bootstraps_from_best_next_value() {
        let mut agent = QLearningAgent::with_seed(QLearningConfig::default(), 0);
        let pre = Board::new();
        let post = played(&pre, 2, Cell::Red);
        let after = played(&post, 4, Cell::Red);

        // Seed the next state with a value of 0.5 for column 4
        agent.update(&post, 4, 5.0, &after);
        agent.update(&pre, 2, 1.0, &post);

        let expected = 0.0 + 0.1 * (1.0 + 0.9 * 0.5 - 0.0);
        assert_eq!(agent.table().value(&pre.state_key(), 2), expected);
    }

    #[test]
    fn test_update_is_reproducible() {
        let run = || {
            let mut agent = greedy_agent();
            let mut board = Board::new();
            for (i, &col) in [3, 3, 2, 4, 1].iter().enumerate() {
                let cell = if i % 2 == 0 { Cell::Red } else { Cell::Yellow };
                let next = played(&board, col, cell);
                agent.update(&board, col, i as f64 - 1.5, &next);
                agent.update(&board, col, 0.7, &next);
                board = next;
            }
            agent
                .table()
                .iter()
                .flat_map(|(_, v)| v.values().map(|q| q.to_bits()).collect::<Vec<_>>())
                .collect::<Vec<u64>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_greedy_selection_picks_argmax_repeatably() {
        let mut agent = greedy_agent();
        let board = Board::new();
        let key = board.state_key();
        agent.table.set(key, 1, 0.2);
        agent.table.set(key, 5, 0.9);
        agent.table.set(key, 6, -1.0);

        let legal = board.legal_columns();
        let first = agent.select_action(&board, &legal);
        let second = agent.select_action(&board, &legal);
        assert_eq!(first, 5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_greedy_ties_go_to_first_legal_column() {
        let mut agent = greedy_agent();
        let board = Board::new();
        // Entry exists but holds no values: every column reads 0.0
        agent.table.ensure_entry(board.state_key());
        assert_eq!(agent.select_action(&board, &[2, 4, 6]), 2);

        // Unstored columns read 0.0 and beat negatives
        agent.table.set(board.state_key(), 2, -0.5);
        assert_eq!(agent.select_action(&board, &[2, 4, 6]), 4);
    }

    #[test]
    fn test_greedy_ignores_illegal_columns() {
        let mut agent = greedy_agent();
        let board = Board::new();
        agent.table.set(board.state_key(), 0, 10.0);
        agent.table.set(board.state_key(), 3, 1.0);
        assert_eq!(agent.select_action(&board, &[1, 3, 5]), 3);
    }

    #[test]
    fn test_unseen_state_falls_back_to_random() {
        let mut agent = greedy_agent();
        let board = Board::new();
        let legal = [0, 6];
        let mut seen = [false; COLS];
        for _ in 0..200 {
            seen[agent.select_action(&board, &legal)] = true;
        }
        assert!(seen[0] && seen[6]);
        // Selection alone never creates entries
        assert!(agent.table().is_empty());
    }

    #[test]
    fn test_full_exploration_is_uniform() {
        let mut agent = QLearningAgent::with_seed(QLearningConfig::default(), 42);
        let board = Board::new();
        // A strongly preferred column must not matter at ε = 1
        agent.table.set(board.state_key(), 3, 100.0);
        let legal = [0, 2, 3, 5];
        let samples = 40_000;
        let mut counts = [0usize; COLS];
        for _ in 0..samples {
            counts[agent.select_action(&board, &legal)] += 1;
        }

        let expected = samples as f64 / legal.len() as f64;
        for &col in &legal {
            let deviation = (counts[col] as f64 - expected).abs() / expected;
            assert!(deviation < 0.05, "column {col}: {} of {samples}", counts[col]);
        }
        assert_eq!(counts.iter().sum::<usize>(), samples);
    }

    #[test]
    fn test_epsilon_decay_matches_closed_form() {
        let mut agent = QLearningAgent::with_seed(QLearningConfig::default(), 0);
        for n in 1..=1500 {
            agent.decay_epsilon();
            let expected = 0.995f64.powi(n).max(0.01);
            assert!(
                (agent.epsilon() - expected).abs() < 1e-9,
                "after {n} decays: {} vs {expected}",
                agent.epsilon()
            );
        }
        assert_eq!(agent.epsilon(), 0.01);
        agent.decay_epsilon();
        assert_eq!(agent.epsilon(), 0.01);
    }

    #[test]
    fn test_eval_mode_restores_epsilon() {
        let mut agent = QLearningAgent::with_seed(QLearningConfig::default(), 0);
        agent.decay_epsilon();
        let before = agent.epsilon();
        let saved = agent.enter_eval_mode();
        assert_eq!(agent.epsilon(), 0.0);
        agent.exit_eval_mode(saved);
        assert_eq!(agent.epsilon(), before);
    }

    #[test]
    fn test_restore_replaces_table_and_counters() {
        let mut source = greedy_agent();
        let pre = Board::new();
        let post = played(&pre, 1, Cell::Red);
        source.update(&pre, 1, 2.0, &post);
        source.set_epsilon(0.3);

        let mut target = QLearningAgent::with_seed(QLearningConfig::default(), 5);
        target.restore(source.table().clone(), &source.training_state());

        assert_eq!(target.epsilon(), 0.3);
        assert_eq!(target.update_count(), 1);
        assert_eq!(target.table().value(&pre.state_key(), 1), 0.2);
        assert_eq!(target.q_table_entries(1).count(), 1);
    }

    #[test]
    #[should_panic(expected = "no legal columns")]
    fn test_select_with_no_legal_columns_panics() {
        greedy_agent().select_action(&Board::new(), &[]);
    }

    #[test]
    #[should_panic(expected = "was not played")]
    fn test_update_with_unplayed_column_panics() {
        let pre = Board::new();
        let post = played(&pre, 2, Cell::Red);
        greedy_agent().update(&pre, 4, 1.0, &post);
    }
}
