//! WebSocket protocol messages for the tic-tac-toe service.
//!
//! One client variant per API method; responses carry the outbound forms
//! the original RPC surface returned.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Create a user; the name must be unique
    CreateUser {
        user_name: String,
        email: Option<String>,
    },

    /// All users ranked by win rate
    GetUserRankings,

    /// Create a new game for an existing user
    NewGame { user_name: String },

    /// Current state of one game
    GetGame { game_id: Uuid },

    /// Make a move in an existing game
    MakeMove { game_id: Uuid, pos: i64 },

    /// Delete a game
    CancelGame { game_id: Uuid },

    /// Move history of one game
    GetGameHistory { game_id: Uuid },

    /// A user's games that are still in progress
    GetUserGames { user_name: String },

    /// Every score on the ledger
    GetScores,

    /// One user's scores
    GetUserScores { user_name: String },

    /// Top scores by point value
    GetHighScores { number_of_results: Option<usize> },

    /// The cached aggregate win rate
    GetAverageWinRates,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned client ID
    Welcome { client_id: Uuid },

    /// Single outbound string (user created, cancelled, ...)
    Message { message: String },

    /// Users ranked by win rate
    UserRankings { items: Vec<UserInfo> },

    /// One game's state
    Game { game: GameInfo },

    /// Several games
    Games { items: Vec<GameInfo> },

    /// One game's move history
    History { items: Vec<HistoryInfo> },

    /// Score ledger entries
    Scores { items: Vec<ScoreInfo> },

    /// The cached aggregate win rate, empty when not yet computed
    AverageWinRates { message: String },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}

/// Outbound game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInfo {
    pub game_id: Uuid,
    pub user_name: String,
    /// Nine-character board string
    pub board: String,
    pub game_over: bool,
    /// `"X"` or `"O"` once someone has won
    pub winner: Option<String>,
    pub message: String,
}

/// Outbound user profile with aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub wins: u32,
    pub total: u32,
    pub rate: f64,
}

/// Outbound history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryInfo {
    pub pos: usize,
    pub result: String,
    /// `%Y-%m-%d %H:%M:%S`
    pub datetime: String,
}

/// Outbound score ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreInfo {
    pub user_name: String,
    pub date: String,
    pub winner: Option<String>,
    pub point: i32,
}
