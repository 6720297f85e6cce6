//! Move application and win detection.
//!
//! The engine is a pure state-transition function over a board: one player
//! move in, one (board, outcome, message) triple out. The only
//! non-determinism is the opponent's reply, which comes from an injected
//! [`Opponent`] strategy.

use crate::board::{Board, Cell, Mark, BOARD_CELLS, WIN_LINES};
use crate::opponent::Opponent;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status message when the player completes a line
pub const MSG_WIN: &str = "You win!";

/// Status message when the opponent completes a line
pub const MSG_LOSE: &str = "You lose!";

/// Status message when the board fills with no winner
pub const MSG_TIE: &str = "Tie!";

/// Status message while the game continues
pub const MSG_KEEP_MOVING: &str = "Keep moving.";

/// Status message for a move against a finished game
pub const MSG_GAME_OVER: &str = "Game already over!";

/// Where a game stands.
///
/// `InProgress` is the initial state; the other three are terminal and
/// absorbing: once reached, no further moves are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    InProgress,
    PlayerWin,
    OpponentWin,
    Tie,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    /// The winning side, if this outcome has one
    pub fn winner(&self) -> Option<Mark> {
        match self {
            Outcome::PlayerWin => Some(Mark::Player),
            Outcome::OpponentWin => Some(Mark::Opponent),
            Outcome::InProgress | Outcome::Tie => None,
        }
    }
}

/// Errors for a rejected move. Both are caller-input errors: never
/// retried, never silently corrected, and the board is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum MoveError {
    #[error("only move from 0-8!")]
    IndexOutOfRange,

    #[error("can not move here!")]
    CellOccupied,
}

/// The engine's reply to a move request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Board after the player's mark and any opponent reply
    pub board: Board,
    /// Outcome after this move
    pub outcome: Outcome,
    /// Human-readable status message
    pub message: &'static str,
    /// False only on the already-finished path, where nothing happened.
    /// Accepted moves are the ones the caller must record in history.
    pub accepted: bool,
}

/// True iff one of the eight lines is fully occupied by `mark`
pub fn check_winner(board: &Board, mark: Mark) -> bool {
    WIN_LINES
        .iter()
        .any(|line| line.iter().all(|&i| board.cell(i) == Some(Cell::Marked(mark))))
}

/// Apply the player's move at `index` and, if the game continues, the
/// opponent's reply.
///
/// Order of evaluation, which callers must not reorder:
/// 1. a terminal `outcome` short-circuits with [`MSG_GAME_OVER`];
/// 2. player mark placed, player win checked;
/// 3. opponent replies on one open cell (if any remain), opponent win
///    checked;
/// 4. a full board is a tie; note this runs *after* the opponent-win
///    check, so an opponent reply that fills the last cell without
///    completing a line reports a tie;
/// 5. otherwise the game continues.
pub fn apply_move(
    board: &Board,
    outcome: Outcome,
    index: usize,
    opponent: &mut dyn Opponent,
) -> Result<MoveOutcome, MoveError> {
    if outcome.is_terminal() {
        return Ok(MoveOutcome {
            board: *board,
            outcome,
            message: MSG_GAME_OVER,
            accepted: false,
        });
    }

    if index >= BOARD_CELLS {
        return Err(MoveError::IndexOutOfRange);
    }
    match board.cell(index) {
        Some(cell) if cell.is_empty() => {}
        _ => return Err(MoveError::CellOccupied),
    }

    let mut next = *board;
    next.set(index, Mark::Player);
    if check_winner(&next, Mark::Player) {
        return Ok(MoveOutcome {
            board: next,
            outcome: Outcome::PlayerWin,
            message: MSG_WIN,
            accepted: true,
        });
    }

    let open = next.open_cells();
    if !open.is_empty() {
        let reply = opponent.choose(&open);
        debug_assert!(open.contains(&reply), "opponent chose a taken cell");
        next.set(reply, Mark::Opponent);
        if check_winner(&next, Mark::Opponent) {
            return Ok(MoveOutcome {
                board: next,
                outcome: Outcome::OpponentWin,
                message: MSG_LOSE,
                accepted: true,
            });
        }
    }

    if next.is_full() {
        return Ok(MoveOutcome {
            board: next,
            outcome: Outcome::Tie,
            message: MSG_TIE,
            accepted: true,
        });
    }

    Ok(MoveOutcome {
        board: next,
        outcome: Outcome::InProgress,
        message: MSG_KEEP_MOVING,
        accepted: true,
    })
}
