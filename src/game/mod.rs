//! Core Connect Four game logic: board representation, player types, pattern
//! scans over the board, and the game state machine.

mod board;
pub mod patterns;
mod player;
mod state;

pub use board::{Board, Cell, ParseStateKeyError, StateKey, COLS, ROWS};
pub use patterns::{count_open_runs, has_four_in_a_row, is_board_full, is_immediate_threat};
pub use player::Player;
pub use state::{GameOutcome, GameState, MoveError};
