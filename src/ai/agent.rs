use crate::game::Board;

/// A single learning step for the value table: the board the mover saw, the
/// column it played, the shaped reward, and the board after its drop.
#[derive(Debug, Clone, PartialEq)]
pub struct Experience {
    pub state: Board,
    pub action: usize,
    pub reward: f64,
    pub next_state: Board,
}

/// Anything that can pick a column for the side to move.
pub trait Agent {
    /// Choose one of `legal` (non-empty, ascending) for `board`.
    fn select_action(&mut self, board: &Board, legal: &[usize]) -> usize;

    /// Return the agent's display name.
    fn name(&self) -> &str;

    /// Stop exploring until [`Agent::exit_eval_mode`]. Returns state to restore.
    fn enter_eval_mode(&mut self) -> EvalState {
        EvalState::NoOp
    }

    /// Exit eval mode, restoring previous state.
    fn exit_eval_mode(&mut self, _state: EvalState) {}
}

/// Opaque eval state for enter/exit eval mode.
pub enum EvalState {
    Epsilon(f64),
    NoOp,
}
