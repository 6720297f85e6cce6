//! Integration tests for the tic-tac-toe engine.
//!
//! These tests drive whole games through `apply_move`, the way the service
//! layer does, and pin down the observable contract: messages, outcome
//! ordering, and the terminal-absorbing law.

use tictactoe_core::*;

/// Play one move against an in-progress game
fn play(
    board: &str,
    index: usize,
    opponent: &mut dyn Opponent,
) -> Result<MoveOutcome, MoveError> {
    let board: Board = board.parse().unwrap();
    apply_move(&board, Outcome::InProgress, index, opponent)
}

#[test]
fn player_win_on_completed_column() {
    let mut opponent = ScriptedOpponent::new([]);
    let result = play("XXOXXO---", 6, &mut opponent).unwrap();

    assert_eq!(result.outcome, Outcome::PlayerWin);
    assert_eq!(result.message, "You win!");
    assert_eq!(result.board.to_string(), "XXOXXOX--");
}

#[test]
fn opening_move_continues_with_two_marks() {
    let mut opponent = RandomOpponent::with_seed(123);
    let result = play("---------", 6, &mut opponent).unwrap();

    assert_eq!(result.outcome, Outcome::InProgress);
    assert_eq!(result.message, "Keep moving.");
    assert_eq!(result.board.cell(6), Some(Cell::Marked(Mark::Player)));
    assert_eq!(result.board.count(Mark::Player), 1);
    assert_eq!(result.board.count(Mark::Opponent), 1);
    assert_eq!(result.board.open_cells().len(), 7);
}

#[test]
fn filling_the_last_cell_without_a_line_ties() {
    let mut opponent = ScriptedOpponent::new([]);
    let result = play("XOXXOOOX-", 8, &mut opponent).unwrap();

    assert_eq!(result.outcome, Outcome::Tie);
    assert_eq!(result.message, "Tie!");
    assert!(result.board.is_full());
}

#[test]
fn opponent_reply_filling_the_board_reports_tie_not_loss() {
    // O's forced reply at 8 completes no line. The opponent-win check runs
    // before the tie check, so the result is a tie.
    let mut opponent = ScriptedOpponent::new([8]);
    let result = play("XOXXOOO--", 7, &mut opponent).unwrap();

    assert_eq!(result.outcome, Outcome::Tie);
    assert_eq!(result.message, "Tie!");
}

#[test]
fn finished_game_rejects_further_moves_unchanged() {
    let board: Board = "XXX-OO---".parse().unwrap();
    let mut opponent = ScriptedOpponent::new([3]);
    let result = apply_move(&board, Outcome::PlayerWin, 3, &mut opponent).unwrap();

    assert_eq!(result.board, board);
    assert_eq!(result.outcome, Outcome::PlayerWin);
    assert_eq!(result.message, "Game already over!");
    assert!(!result.accepted);
}

#[test]
fn scripted_full_game_to_player_win() {
    // X: 0, 1, 2 across three turns; O scripted away from the top row.
    let mut opponent = ScriptedOpponent::new([4, 5]);
    let mut board = Board::new();
    let mut outcome = Outcome::InProgress;

    for (index, expected) in [
        (0, Outcome::InProgress),
        (1, Outcome::InProgress),
        (2, Outcome::PlayerWin),
    ] {
        let result = apply_move(&board, outcome, index, &mut opponent).unwrap();
        assert_eq!(result.outcome, expected);
        board = result.board;
        outcome = result.outcome;
    }

    assert_eq!(board.to_string(), "XXX-OO---");
}

#[test]
fn seeded_games_replay_identically() {
    let run = |seed| {
        let mut opponent = RandomOpponent::with_seed(seed);
        let mut board = Board::new();
        let mut outcome = Outcome::InProgress;
        let mut trace = Vec::new();

        for index in [0, 1, 2, 3, 4, 5, 6, 7, 8] {
            if outcome.is_terminal() {
                break;
            }
            match apply_move(&board, outcome, index, &mut opponent) {
                Ok(result) => {
                    board = result.board;
                    outcome = result.outcome;
                    trace.push(board.to_string());
                }
                Err(_) => trace.push("rejected".to_string()),
            }
        }
        trace
    };

    assert_eq!(run(99), run(99));
}
