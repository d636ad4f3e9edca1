//! Training infrastructure: the game loop against a random opponent,
//! rolling metrics, and the shared scoreboard read by the status thread.

pub mod episode;
pub mod metrics;
pub mod scoreboard;
pub mod trainer;

pub use episode::{evaluate, play_eval_game, play_training_game};
pub use metrics::{GameRecord, TrainingMetrics};
pub use scoreboard::{ScoreSnapshot, Scoreboard};
pub use trainer::{Trainer, TrainerConfig, TrainingSummary};
