use super::patterns::{has_four_in_a_row, is_board_full};
use super::{Board, Player};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Winner(Player),
    Draw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    ColumnFull,
    InvalidColumn,
    GameOver,
}

impl From<super::board::MoveError> for MoveError {
    fn from(e: super::board::MoveError) -> Self {
        match e {
            super::board::MoveError::ColumnFull => MoveError::ColumnFull,
            super::board::MoveError::InvalidColumn => MoveError::InvalidColumn,
        }
    }
}

/// One game in progress: the live board, whose turn it is, and the result
/// once the game is decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameState {
    board: Board,
    current_player: Player,
    outcome: Option<GameOutcome>,
}

impl GameState {
    /// Create initial game state
    pub fn initial() -> Self {
        GameState {
            board: Board::new(),
            current_player: Player::Red, // Red starts
            outcome: None,
        }
    }

    /// Get current player
    pub fn current_player(&self) -> Player {
        self.current_player
    }

    /// Get reference to board
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Get game outcome if game is over
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Check if game is over
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// Get list of legal columns (not full)
    pub fn legal_actions(&self) -> Vec<usize> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.board.legal_columns()
    }

    /// Drop the current player's piece and pass the turn.
    ///
    /// A win is checked before a full board, so a last-cell win is a win.
    pub fn apply_move_mut(&mut self, column: usize) -> Result<(), MoveError> {
        if self.is_terminal() {
            return Err(MoveError::GameOver);
        }

        self.board.drop_piece(column, self.current_player.to_cell())?;

        if has_four_in_a_row(&self.board, self.current_player) {
            self.outcome = Some(GameOutcome::Winner(self.current_player));
        } else if is_board_full(&self.board) {
            self.outcome = Some(GameOutcome::Draw);
        }

        self.current_player = self.current_player.other();
        Ok(())
    }

    /// Apply a move and return new state (immutable)
    pub fn apply_move(&self, column: usize) -> Result<GameState, MoveError> {
        let mut next = *self;
        next.apply_move_mut(column)?;
        Ok(next)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Cell, COLS, ROWS};

    #[test]
    fn test_initial_state() {
        let state = GameState::initial();
        assert_eq!(state.current_player(), Player::Red);
        assert!(!state.is_terminal());
        assert_eq!(state.legal_actions().len(), 7);
    }

    #[test]
    fn test_apply_move() {
        let state = GameState::initial();
        let new_state = state.apply_move(3).unwrap();

        assert_eq!(new_state.current_player(), Player::Yellow);
        assert_eq!(new_state.board().get(0, 3), Cell::Red);
        // Original untouched
        assert_eq!(state.board().get(0, 3), Cell::Empty);
    }

    #[test]
    fn test_win_detection() {
        let mut state = GameState::initial();

        // Red builds the bottom row, Yellow stacks on top
        for col in 0..4 {
            state = state.apply_move(col).unwrap(); // Red
            if col < 3 {
                state = state.apply_move(col).unwrap(); // Yellow
            }
        }

        assert!(state.is_terminal());
        assert_eq!(state.outcome(), Some(GameOutcome::Winner(Player::Red)));
        assert!(state.legal_actions().is_empty());
        assert_eq!(state.apply_move(5), Err(MoveError::GameOver));
    }

    #[test]
    fn test_column_full_error() {
        let mut state = GameState::initial();
        // Alternating colours in one column never wins
        for _ in 0..ROWS {
            state.apply_move_mut(0).unwrap();
        }
        assert_eq!(state.apply_move(0), Err(MoveError::ColumnFull));
        assert_eq!(state.apply_move(COLS), Err(MoveError::InvalidColumn));
    }

    #[test]
    fn test_draw() {
        let mut state = GameState::initial();

        // Column pairs filled in this order never line up four of a colour
        let pattern = [
            0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 2, 3, 2, 3, 2, 3, 3, 2, 3, 2, 3, 2, 4, 5, 4, 5,
            4, 5, 5, 4, 5, 4, 5, 4, 6, 6, 6, 6, 6, 6,
        ];

        for &col in &pattern {
            assert!(!state.is_terminal(), "game ended early\n{}", state.board());
            state.apply_move_mut(col).unwrap();
        }

        assert_eq!(state.outcome(), Some(GameOutcome::Draw));
    }
}
