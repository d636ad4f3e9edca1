use std::collections::VecDeque;

use crate::game::Player;

/// Result of a single training game, from the learning player's side.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub winner: Option<Player>,
    pub agent_player: Player,
    pub plies: usize,
    /// Sum of the rewards fed to the agent's updates this game.
    pub agent_reward: f64,
}

impl GameRecord {
    pub fn agent_won(&self) -> bool {
        self.winner == Some(self.agent_player)
    }

    pub fn agent_lost(&self) -> bool {
        self.winner == Some(self.agent_player.other())
    }

    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

/// Training metrics tracker with rolling window computations.
pub struct TrainingMetrics {
    games: VecDeque<GameRecord>,
    capacity: usize,
    total_games: usize, // lifetime count, never capped
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            games: VecDeque::with_capacity(capacity),
            capacity,
            total_games: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_game(&mut self, record: GameRecord) {
        self.total_games += 1;
        self.games.push_back(record);
        if self.games.len() > self.capacity {
            self.games.pop_front();
        }
    }

    fn rate(&self, last_n: usize, pred: impl Fn(&GameRecord) -> bool) -> f32 {
        let n = self.games.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let hits = self.games.iter().rev().take(n).filter(|r| pred(r)).count();
        hits as f32 / n as f32
    }

    /// Agent win rate in the last N games.
    pub fn win_rate(&self, last_n: usize) -> f32 {
        self.rate(last_n, GameRecord::agent_won)
    }

    pub fn loss_rate(&self, last_n: usize) -> f32 {
        self.rate(last_n, GameRecord::agent_lost)
    }

    pub fn draw_rate(&self, last_n: usize) -> f32 {
        self.rate(last_n, GameRecord::is_draw)
    }

    /// Average plies per game over the last N games.
    pub fn average_game_length(&self, last_n: usize) -> f32 {
        let n = self.games.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self.games.iter().rev().take(n).map(|r| r.plies).sum();
        total as f32 / n as f32
    }

    /// Average per-game reward collected by the agent over the last N games.
    pub fn average_reward(&self, last_n: usize) -> f32 {
        let n = self.games.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: f64 = self.games.iter().rev().take(n).map(|r| r.agent_reward).sum();
        (total / n as f64) as f32
    }

    pub fn total_games(&self) -> usize {
        self.total_games
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}
