//! # Q Connect Four
//!
//! Connect Four on a 6×7 board with an online tabular Q-learning player that
//! learns against a uniformly random opponent from shaped rewards.
//!
//! ## Modules
//!
//! - [`game`] — Board, pieces, pattern evaluation and the game state machine
//! - [`ai`] — Agent trait, Q-table, Q-learning and random agents, reward shaping
//! - [`training`] — Game loop, rolling metrics, evaluation, shared scoreboard
//! - [`checkpoint`] — Q-table persistence and versioning
//! - [`config`] — TOML configuration loading and validation
//! - [`error`] — Structured error types

pub mod ai;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod game;
pub mod training;
