//! Datastore entities for the tic-tac-toe service.
//!
//! These are the records the persistence port stores: user profiles with
//! their win aggregates, games, the append-only move history, and the
//! score ledger derived from finished games. Each entity knows how to
//! render itself as its outbound protocol form.

use chrono::{DateTime, NaiveDate, Utc};
use tictactoe_core::{Board, Mark, Outcome};
use uuid::Uuid;

use crate::protocol::{GameInfo, HistoryInfo, ScoreInfo, UserInfo};

/// Render format for history timestamps
const HISTORY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// User profile with derived win aggregates
#[derive(Debug, Clone)]
pub struct User {
    pub name: String,
    pub email: Option<String>,
    pub wins: u32,
    pub total: u32,
    /// wins / total over finished games; 0 until the first game ends
    pub rate: f64,
}

impl User {
    pub fn new(name: String, email: Option<String>) -> Self {
        Self {
            name,
            email,
            wins: 0,
            total: 0,
            rate: 0.0,
        }
    }

    /// Fold one finished game into the aggregates
    pub fn record_finished_game(&mut self, won: bool) {
        if won {
            self.wins += 1;
        }
        self.total += 1;
        self.rate = f64::from(self.wins) / f64::from(self.total);
    }

    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            name: self.name.clone(),
            wins: self.wins,
            total: self.total,
            rate: self.rate,
        }
    }
}

/// A single game owned by one user
#[derive(Debug, Clone)]
pub struct Game {
    pub id: Uuid,
    pub user_name: String,
    pub board: Board,
    pub outcome: Outcome,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Game {
    pub fn new(user_name: String, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_name,
            board: Board::new(),
            outcome: Outcome::InProgress,
            message,
            created_at: Utc::now(),
        }
    }

    pub fn game_over(&self) -> bool {
        self.outcome.is_terminal()
    }

    /// Symbol of the winning side, if the game has one
    pub fn winner_symbol(&self) -> Option<String> {
        self.outcome.winner().map(|mark| mark.symbol().to_string())
    }

    pub fn to_info(&self) -> GameInfo {
        GameInfo {
            game_id: self.id,
            user_name: self.user_name.clone(),
            board: self.board.to_string(),
            game_over: self.game_over(),
            winner: self.winner_symbol(),
            message: self.message.clone(),
        }
    }
}

/// One record per accepted move, append-only
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub game_id: Uuid,
    /// Cell index the player moved on
    pub pos: usize,
    /// Status message the move produced
    pub result: String,
    pub at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn new(game_id: Uuid, pos: usize, result: String) -> Self {
        Self {
            game_id,
            pos,
            result,
            at: Utc::now(),
        }
    }

    pub fn to_info(&self) -> HistoryInfo {
        HistoryInfo {
            pos: self.pos,
            result: self.result.clone(),
            datetime: self.at.format(HISTORY_TIME_FORMAT).to_string(),
        }
    }
}

/// Score ledger entry, created exactly once per finished game
#[derive(Debug, Clone)]
pub struct ScoreRecord {
    pub user_name: String,
    pub date: NaiveDate,
    /// Winning side's symbol, or `None` for a tie
    pub winner: Option<String>,
    /// +1 player win, -1 opponent win, 0 tie
    pub point: i32,
}

impl ScoreRecord {
    /// Build the ledger entry for a finished game
    pub fn for_outcome(user_name: String, outcome: Outcome) -> Self {
        let point = match outcome.winner() {
            Some(Mark::Player) => 1,
            Some(Mark::Opponent) => -1,
            None => 0,
        };
        Self {
            user_name,
            date: Utc::now().date_naive(),
            winner: outcome.winner().map(|mark| mark.symbol().to_string()),
            point,
        }
    }

    pub fn to_info(&self) -> ScoreInfo {
        ScoreInfo {
            user_name: self.user_name.clone(),
            date: self.date.to_string(),
            winner: self.winner.clone(),
            point: self.point,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_starts_empty_and_open() {
        let game = Game::new("lisa".into(), "Good luck playing Tic Tac Toe!".into());
        assert_eq!(game.board.to_string(), "---------");
        assert!(!game.game_over());
        assert_eq!(game.winner_symbol(), None);
    }

    #[test]
    fn test_user_aggregates_fold_per_game() {
        let mut user = User::new("lisa".into(), None);
        user.record_finished_game(true);
        user.record_finished_game(false);
        assert_eq!(user.wins, 1);
        assert_eq!(user.total, 2);
        assert!((user.rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_score_points_per_outcome() {
        let score = |o| ScoreRecord::for_outcome("lisa".into(), o).point;
        assert_eq!(score(Outcome::PlayerWin), 1);
        assert_eq!(score(Outcome::OpponentWin), -1);
        assert_eq!(score(Outcome::Tie), 0);
    }

    #[test]
    fn test_history_timestamp_render() {
        let mut record = HistoryRecord::new(Uuid::new_v4(), 4, "Keep moving.".into());
        record.at = DateTime::parse_from_rfc3339("2016-05-01T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(record.to_info().datetime, "2016-05-01 09:30:00");
    }
}
