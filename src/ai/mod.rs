mod agent;
pub mod q_table;
pub mod qlearning;
mod random;
pub mod reward;

pub use agent::{Agent, EvalState, Experience};
pub use q_table::{ActionValues, QTable, QTableRecord};
pub use qlearning::{QLearningAgent, QLearningConfig, QLearningTrainingState};
pub use random::RandomAgent;
pub use reward::{shape_reward, TerminalRewards};
