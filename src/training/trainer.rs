use std::sync::Arc;

use crate::ai::{QLearningAgent, RandomAgent, TerminalRewards};
use crate::checkpoint::{CheckpointManager, CheckpointMetrics};
use crate::error::TrainingError;
use crate::game::Player;
use crate::training::episode::{evaluate, play_training_game};
use crate::training::metrics::TrainingMetrics;
use crate::training::scoreboard::{ScoreSnapshot, Scoreboard};

/// Trainer configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub num_games: usize,
    /// Games between progress lines; 0 disables them.
    pub log_interval: usize,
    /// Games between greedy evaluations; 0 disables them.
    pub eval_interval: usize,
    pub eval_games: usize,
    /// Games between checkpoints; 0 disables them.
    pub checkpoint_interval: usize,
    /// Table entries written to the debug log at each log interval.
    pub dump_entries: usize,
    pub seed: Option<u64>,
    pub agent_player: Player,
    pub terminal_rewards: TerminalRewards,
    pub metrics_window: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_games: 10_000,
            log_interval: 100,
            eval_interval: 500,
            eval_games: 100,
            checkpoint_interval: 1000,
            dump_entries: 5,
            seed: None,
            agent_player: Player::Yellow,
            terminal_rewards: TerminalRewards::default(),
            metrics_window: 100,
        }
    }
}

/// What a finished training run reports.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub games: usize,
    pub scores: ScoreSnapshot,
    pub final_epsilon: f64,
    pub table_states: usize,
    pub final_eval_win_rate: Option<f32>,
}

/// Plays a Q-learning agent against a random opponent for a fixed number of
/// games.
pub struct Trainer {
    config: TrainerConfig,
    checkpoint_manager: Option<CheckpointManager>,
    scoreboard: Arc<Scoreboard>,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Trainer {
            config,
            checkpoint_manager: None,
            scoreboard: Arc::new(Scoreboard::new()),
        }
    }

    pub fn with_checkpoints(mut self, manager: CheckpointManager) -> Self {
        self.checkpoint_manager = Some(manager);
        self
    }

    /// Shared tallies, readable from a status thread while `train` runs.
    pub fn scoreboard(&self) -> Arc<Scoreboard> {
        Arc::clone(&self.scoreboard)
    }

    fn opponent(&self, offset: u64) -> RandomAgent {
        match self.config.seed {
            Some(seed) => RandomAgent::with_seed(seed.wrapping_add(offset)),
            None => RandomAgent::new(),
        }
    }

    /// Run the full training loop. `games_already_played` offsets game
    /// numbering when resuming from a checkpoint.
    pub fn train(
        &self,
        agent: &mut QLearningAgent,
        games_already_played: usize,
    ) -> Result<TrainingSummary, TrainingError> {
        let mut metrics = TrainingMetrics::with_capacity(self.config.metrics_window);
        let mut opponent = self.opponent(1);
        let mut eval_opponent = self.opponent(2);

        let start_game = games_already_played + 1;
        let end_game = games_already_played + self.config.num_games;

        log::info!(
            "starting Q-learning training for {} games (games {}..={}), agent plays {}",
            self.config.num_games,
            start_game,
            end_game,
            self.config.agent_player.name()
        );

        for game in start_game..=end_game {
            let record = play_training_game(
                agent,
                &mut opponent,
                self.config.agent_player,
                &self.config.terminal_rewards,
            )?;
            self.scoreboard.record(record.winner, record.agent_player);
            log::debug!(
                "game {}: winner {:?} after {} plies, reward {:.1}",
                game,
                record.winner,
                record.plies,
                record.agent_reward
            );
            metrics.record_game(record);

            if self.config.log_interval > 0 && game % self.config.log_interval == 0 {
                let window = self.config.metrics_window;
                log::info!(
                    "game {}/{} | eps: {:.3} | states: {} | win: {:.1}% | loss: {:.1}% | draw: {:.1}% | avg_len: {:.1} | avg_reward: {:.2} | {}",
                    game,
                    end_game,
                    agent.epsilon(),
                    agent.table().len(),
                    metrics.win_rate(window) * 100.0,
                    metrics.loss_rate(window) * 100.0,
                    metrics.draw_rate(window) * 100.0,
                    metrics.average_game_length(window),
                    metrics.average_reward(window),
                    self.scoreboard.snapshot(),
                );
                self.dump_entries(agent);
            }

            let mut eval_win_rate = None;
            if self.config.eval_interval > 0 && game % self.config.eval_interval == 0 {
                let wr = evaluate(agent, &mut eval_opponent, self.config.eval_games)?;
                log::info!(
                    "eval vs random ({} games): {:.1}% win rate",
                    self.config.eval_games,
                    wr * 100.0
                );
                eval_win_rate = Some(wr);
            }

            if self.config.checkpoint_interval > 0 && game % self.config.checkpoint_interval == 0 {
                self.checkpoint(agent, &metrics, eval_win_rate, game);
            }
        }

        let final_eval_win_rate = if self.config.eval_games > 0 {
            let wr = evaluate(agent, &mut eval_opponent, self.config.eval_games)?;
            log::info!("final eval vs random: {:.1}% win rate", wr * 100.0);
            Some(wr)
        } else {
            None
        };

        let scores = self.scoreboard.snapshot();
        log::info!(
            "training complete: {} games, {} | final eps {:.4}, {} states",
            metrics.total_games(),
            scores,
            agent.epsilon(),
            agent.table().len()
        );

        Ok(TrainingSummary {
            games: metrics.total_games(),
            scores,
            final_epsilon: agent.epsilon(),
            table_states: agent.table().len(),
            final_eval_win_rate,
        })
    }

    fn dump_entries(&self, agent: &QLearningAgent) {
        if self.config.dump_entries == 0 || !log::log_enabled!(log::Level::Debug) {
            return;
        }
        for (state, actions) in agent.q_table_entries(self.config.dump_entries) {
            log::debug!("q[{}] = {:?}", state, actions);
        }
    }

    /// Save a checkpoint if a manager is attached. Failures are logged, not
    /// fatal.
    fn checkpoint(
        &self,
        agent: &QLearningAgent,
        metrics: &TrainingMetrics,
        eval_win_rate: Option<f32>,
        game: usize,
    ) {
        let Some(manager) = &self.checkpoint_manager else {
            return;
        };
        let window = self.config.metrics_window;
        let ckpt_metrics = CheckpointMetrics {
            win_rate: eval_win_rate.unwrap_or_else(|| metrics.win_rate(window)),
            loss_rate: metrics.loss_rate(window),
            draw_rate: metrics.draw_rate(window),
            average_game_length: metrics.average_game_length(window),
            average_reward: metrics.average_reward(window),
            table_states: agent.table().len(),
        };
        match manager.save_checkpoint(agent, &ckpt_metrics, game) {
            Ok(path) => log::info!("checkpoint saved: {}", path.display()),
            Err(e) => log::warn!("checkpoint failed at game {}: {}", game, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::QLearningConfig;
    use crate::checkpoint::CheckpointManagerConfig;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn small_config(num_games: usize) -> TrainerConfig {
        TrainerConfig {
            num_games,
            log_interval: 10,
            eval_interval: 0,
            eval_games: 0,
            checkpoint_interval: 0,
            seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_scores_add_up_to_games_played() {
        init_logging();
        let trainer = Trainer::new(small_config(30));
        let mut agent = QLearningAgent::with_seed(QLearningConfig::default(), 1);

        let summary = trainer.train(&mut agent, 0).unwrap();
        assert_eq!(summary.games, 30);
        assert_eq!(summary.scores.total(), 30);
        assert_eq!(trainer.scoreboard().snapshot(), summary.scores);
        assert!(summary.final_epsilon < 1.0);
        assert_eq!(summary.table_states, agent.table().len());
        assert!(summary.final_eval_win_rate.is_none());
    }

    #[test]
    fn test_zero_log_interval_disables_progress_lines() {
        let mut config = small_config(3);
        config.log_interval = 0;
        let trainer = Trainer::new(config);
        let mut agent = QLearningAgent::with_seed(QLearningConfig::default(), 4);

        let summary = trainer.train(&mut agent, 0).unwrap();
        assert_eq!(summary.scores.total(), 3);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = || {
            let trainer = Trainer::new(small_config(20));
            let mut agent = QLearningAgent::with_seed(QLearningConfig::default(), 7);
            let summary = trainer.train(&mut agent, 0).unwrap();
            (summary.scores, agent.table().len(), agent.update_count())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_eval_restores_exploration() {
        let mut config = small_config(10);
        config.eval_interval = 5;
        config.eval_games = 4;
        let trainer = Trainer::new(config);
        let mut agent = QLearningAgent::with_seed(QLearningConfig::default(), 2);

        let summary = trainer.train(&mut agent, 0).unwrap();
        let wr = summary.final_eval_win_rate.unwrap();
        assert!((0.0..=1.0).contains(&wr));
        assert!(agent.epsilon() > 0.0);
    }

    #[test]
    fn test_checkpoints_written_at_interval() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(CheckpointManagerConfig {
            checkpoint_dir: dir.path().to_path_buf(),
            keep_last_n: 10,
            keep_best_n: 0,
        })
        .unwrap();
        let mut config = small_config(20);
        config.checkpoint_interval = 10;
        let trainer = Trainer::new(config).with_checkpoints(manager);
        let mut agent = QLearningAgent::with_seed(QLearningConfig::default(), 3);

        trainer.train(&mut agent, 100).unwrap();

        let reader = CheckpointManager::new(CheckpointManagerConfig {
            checkpoint_dir: dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();
        let games: Vec<usize> = reader
            .list_checkpoints()
            .unwrap()
            .iter()
            .map(|(_, m)| m.game)
            .collect();
        assert_eq!(games, vec![110, 120]);

        let latest = reader.load_latest().unwrap();
        assert_eq!(latest.metadata.game, 120);
        assert_eq!(latest.training_state.update_count, agent.update_count());
    }
}
