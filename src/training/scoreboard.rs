use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::game::Player;

/// Win tallies published by the training loop.
///
/// Only the loop writes; any thread may read a [`ScoreSnapshot`]. The board
/// and value table are never shared this way.
#[derive(Debug, Default)]
pub struct Scoreboard {
    agent_wins: AtomicU64,
    opponent_wins: AtomicU64,
    draws: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreSnapshot {
    pub agent_wins: u64,
    pub opponent_wins: u64,
    pub draws: u64,
}

impl ScoreSnapshot {
    pub fn total(&self) -> u64 {
        self.agent_wins + self.opponent_wins + self.draws
    }
}

impl fmt::Display for ScoreSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Random: {} | AI: {} | Draws: {}",
            self.opponent_wins, self.agent_wins, self.draws
        )
    }
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, winner: Option<Player>, agent_player: Player) {
        let counter = match winner {
            Some(p) if p == agent_player => &self.agent_wins,
            Some(_) => &self.opponent_wins,
            None => &self.draws,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            agent_wins: self.agent_wins.load(Ordering::Relaxed),
            opponent_wins: self.opponent_wins.load(Ordering::Relaxed),
            draws: self.draws.load(Ordering::Relaxed),
        }
    }
}
