use crate::game::{count_open_runs, is_immediate_threat, Board, GameOutcome, Player};

/// Weight of a new open run of three relative to a run of two.
pub const THREE_RUN_WEIGHT: f64 = 4.0;

/// Bonus for a move that removes the opponent's playable three.
pub const BLOCK_BONUS: f64 = 10.0;

/// Score one ply by `mover` from the open runs it built and the threat it
/// blocked. Win, loss and draw are not part of this signal.
pub fn shape_reward(pre: &Board, post: &Board, mover: Player) -> f64 {
    let delta = |length| {
        count_open_runs(post, mover, length) as f64 - count_open_runs(pre, mover, length) as f64
    };
    let mut reward = delta(2) + THREE_RUN_WEIGHT * delta(3);

    let opponent = mover.other();
    if is_immediate_threat(pre, opponent) && !is_immediate_threat(post, opponent) {
        reward += BLOCK_BONUS;
    }
    reward
}

/// Extra reward for the learning player's terminal plies.
///
/// All zero by default, which leaves learning driven by shaping alone.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TerminalRewards {
    pub win: f64,
    pub loss: f64,
    pub draw: f64,
}

impl Default for TerminalRewards {
    fn default() -> Self {
        TerminalRewards {
            win: 0.0,
            loss: 0.0,
            draw: 0.0,
        }
    }
}

impl TerminalRewards {
    pub fn is_enabled(&self) -> bool {
        self.win != 0.0 || self.loss != 0.0 || self.draw != 0.0
    }

    /// Reward for `player` given how the game ended.
    pub fn for_outcome(&self, outcome: GameOutcome, player: Player) -> f64 {
        match outcome {
            GameOutcome::Winner(winner) if winner == player => self.win,
            GameOutcome::Winner(_) => self.loss,
            GameOutcome::Draw => self.draw,
        }
    }
}
