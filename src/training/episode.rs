use crate::ai::{shape_reward, Agent, Experience, QLearningAgent, TerminalRewards};
use crate::error::TrainingError;
use crate::game::{GameOutcome, GameState, Player};
use crate::training::metrics::GameRecord;

fn apply(
    state: &mut GameState,
    action: usize,
    mover: &dyn Agent,
    legal: &[usize],
) -> Result<(), TrainingError> {
    state
        .apply_move_mut(action)
        .map_err(|_| TrainingError::IllegalAction {
            agent: mover.name().to_string(),
            action,
            legal: legal.to_vec(),
        })
}

/// Play one game against `opponent`, learning from every ply `agent` makes.
///
/// Red moves first. After each of the agent's drops the shaped reward (plus
/// any configured terminal reward) is fed to [`QLearningAgent::update`] and
/// ε decays once. When the opponent ends the game, a non-zero terminal
/// reward is applied as one more update on the agent's last transition.
pub fn play_training_game(
    agent: &mut QLearningAgent,
    opponent: &mut dyn Agent,
    agent_player: Player,
    terminal: &TerminalRewards,
) -> Result<GameRecord, TrainingError> {
    let mut state = GameState::initial();
    let mut last_agent_step: Option<Experience> = None;
    let mut agent_reward = 0.0;
    let mut plies = 0;

    while !state.is_terminal() {
        let mover = state.current_player();
        let legal = state.legal_actions();
        let pre = *state.board();

        if mover == agent_player {
            let action = agent.select_action(&pre, &legal);
            apply(&mut state, action, &*agent, &legal)?;
            let post = *state.board();

            let mut reward = shape_reward(&pre, &post, mover);
            if let Some(outcome) = state.outcome() {
                reward += terminal.for_outcome(outcome, agent_player);
            }
            agent.update(&pre, action, reward, &post);
            agent.decay_epsilon();
            agent_reward += reward;
            last_agent_step = Some(Experience {
                state: pre,
                action,
                reward,
                next_state: post,
            });
        } else {
            let action = opponent.select_action(&pre, &legal);
            apply(&mut state, action, &*opponent, &legal)?;

            if let (Some(outcome), Some(step)) = (state.outcome(), &last_agent_step) {
                let extra = terminal.for_outcome(outcome, agent_player);
                if extra != 0.0 {
                    agent.update(&step.state, step.action, extra, &step.next_state);
                    agent_reward += extra;
                }
            }
        }
        plies += 1;
    }

    Ok(GameRecord {
        winner: winner_of(state.outcome()),
        agent_player,
        plies,
        agent_reward,
    })
}

fn winner_of(outcome: Option<GameOutcome>) -> Option<Player> {
    match outcome {
        Some(GameOutcome::Winner(p)) => Some(p),
        _ => None,
    }
}

/// Play a single evaluation game between two agents, nobody learning.
/// Returns Some(true) if agent won, Some(false) if agent lost, None if draw.
pub fn play_eval_game(
    agent: &mut dyn Agent,
    opponent: &mut dyn Agent,
    agent_player: Player,
) -> Result<Option<bool>, TrainingError> {
    let mut state = GameState::initial();

    while !state.is_terminal() {
        let legal = state.legal_actions();
        let mover: &mut dyn Agent = if state.current_player() == agent_player {
            &mut *agent
        } else {
            &mut *opponent
        };
        let action = mover.select_action(state.board(), &legal);
        apply(&mut state, action, mover, &legal)?;
    }

    Ok(winner_of(state.outcome()).map(|winner| winner == agent_player))
}

/// Greedy win rate of `agent` against `opponent` over `games`, alternating
/// who moves first.
pub fn evaluate(
    agent: &mut dyn Agent,
    opponent: &mut dyn Agent,
    games: usize,
) -> Result<f32, TrainingError> {
    let eval_state = agent.enter_eval_mode();
    let mut wins = 0;

    let mut result = Ok(());
    for game_idx in 0..games {
        let agent_player = if game_idx % 2 == 0 { Player::Red } else { Player::Yellow };
        match play_eval_game(agent, opponent, agent_player) {
            Ok(Some(true)) => wins += 1,
            Ok(_) => {}
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }

    agent.exit_eval_mode(eval_state);
    result?;
    Ok(if games == 0 { 0.0 } else { wins as f32 / games as f32 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{QLearningConfig, RandomAgent};
    use crate::game::Board;

    /// Always plays the lowest legal column.
    struct LeftmostAgent;

    impl Agent for LeftmostAgent {
        fn select_action(&mut self, _board: &Board, legal: &[usize]) -> usize {
            legal[0]
        }

        fn name(&self) -> &str {
            "Leftmost"
        }
    }

    /// Plays a fixed column whether or not it is legal.
    struct StubbornAgent(usize);

    impl Agent for StubbornAgent {
        fn select_action(&mut self, _board: &Board, _legal: &[usize]) -> usize {
            self.0
        }

        fn name(&self) -> &str {
            "Stubborn"
        }
    }

    fn seeded_agent(seed: u64) -> QLearningAgent {
        QLearningAgent::with_seed(QLearningConfig::default(), seed)
    }

    #[test]
    fn test_training_game_terminates_and_learns() {
        let mut agent = seeded_agent(1);
        let mut opponent = RandomAgent::with_seed(2);

        let record =
            play_training_game(&mut agent, &mut opponent, Player::Yellow, &TerminalRewards::default())
                .unwrap();

        assert!(record.plies >= 7 && record.plies <= 42);
        let agent_plies = record.plies / 2;
        assert_eq!(agent.update_count(), agent_plies as u64);
        let expected_eps = 0.995f64.powi(agent_plies as i32);
        assert!((agent.epsilon() - expected_eps).abs() < 1e-12);
        assert!(!agent.table().is_empty());
    }

    #[test]
    fn test_agent_as_first_mover() {
        let mut agent = seeded_agent(3);
        let mut opponent = RandomAgent::with_seed(4);
        let record =
            play_training_game(&mut agent, &mut opponent, Player::Red, &TerminalRewards::default())
                .unwrap();
        assert_eq!(agent.update_count(), ((record.plies + 1) / 2) as u64);
    }

    #[test]
    fn test_opponent_win_is_recorded() {
        // Exactly one of win, loss and draw holds
        let mut agent = seeded_agent(5);
        let mut opponent = LeftmostAgent;
        let record =
            play_training_game(&mut agent, &mut opponent, Player::Yellow, &TerminalRewards::default())
                .unwrap();
        assert_eq!(record.agent_won() as u8 + record.agent_lost() as u8 + record.is_draw() as u8, 1);
    }

    #[test]
    fn test_loss_reward_applied_when_opponent_wins() {
        let terminal = TerminalRewards {
            win: 0.0,
            loss: -100.0,
            draw: 0.0,
        };
        // Repeat until the opponent wins at least once
        for seed in 0..50 {
            let mut agent = seeded_agent(seed);
            let mut opponent = LeftmostAgent;
            let record =
                play_training_game(&mut agent, &mut opponent, Player::Yellow, &terminal).unwrap();
            if record.agent_lost() {
                let agent_plies = record.plies / 2;
                assert_eq!(agent.update_count(), agent_plies as u64 + 1);
                assert!(record.agent_reward < 0.0);
                return;
            }
        }
        panic!("Leftmost never beat a random explorer in 50 games");
    }

    #[test]
    fn test_illegal_opponent_move_is_an_error() {
        let mut agent = seeded_agent(6);
        // Column 7 is off the board
        let mut opponent = StubbornAgent(7);
        let err = play_training_game(&mut agent, &mut opponent, Player::Yellow, &TerminalRewards::default())
            .unwrap_err();
        let TrainingError::IllegalAction { agent, action, .. } = err;
        assert_eq!(agent, "Stubborn");
        assert_eq!(action, 7);
    }

    #[test]
    fn test_play_eval_game_terminates() {
        let mut agent = RandomAgent::with_seed(7);
        let mut opponent = RandomAgent::with_seed(8);
        play_eval_game(&mut agent, &mut opponent, Player::Red).unwrap();
    }

    #[test]
    fn test_eval_game_result_side() {
        // Leftmost as Red wins column 0 outright against Stubborn column 6
        let mut agent = LeftmostAgent;
        let mut opponent = StubbornAgent(6);
        assert_eq!(play_eval_game(&mut agent, &mut opponent, Player::Red).unwrap(), Some(true));
        assert_eq!(play_eval_game(&mut opponent, &mut agent, Player::Yellow).unwrap(), Some(false));
    }

    #[test]
    fn test_evaluate_restores_epsilon() {
        let mut agent = seeded_agent(9);
        agent.set_epsilon(0.4);
        let mut opponent = RandomAgent::with_seed(10);
        let win_rate = evaluate(&mut agent, &mut opponent, 10).unwrap();
        assert!((0.0..=1.0).contains(&win_rate));
        assert_eq!(agent.epsilon(), 0.4);
    }
}
