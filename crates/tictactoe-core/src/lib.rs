//! Tic-tac-toe game engine.
//!
//! This crate holds the pure, synchronous game logic behind the tic-tac-toe
//! service: a 9-cell board, win detection over the eight fixed lines, and a
//! single-move state transition with a strategy-injected opponent reply.
//! It owns no I/O and no long-lived resources; persistence, caching and
//! scheduling live with the service that calls it.
//!
//! # Modules
//!
//! - [`board`]: the 3x3 grid, marks, and the string wire form
//! - [`engine`]: move application, win detection, outcome state machine
//! - [`opponent`]: injected reply strategies (random and scripted)

pub mod board;
pub mod engine;
pub mod opponent;

// Re-export commonly used types
pub use board::{Board, Cell, Mark, ParseBoardError, BOARD_CELLS, WIN_LINES};
pub use engine::{apply_move, check_winner, MoveError, MoveOutcome, Outcome};
pub use opponent::{Opponent, RandomOpponent, ScriptedOpponent};
