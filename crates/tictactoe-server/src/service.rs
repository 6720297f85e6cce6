//! The game service: every API operation over the engine and its
//! collaborator ports.
//!
//! This layer owns the side-effect contract around the engine: one
//! history record per accepted move, and exactly one score-ledger entry
//! plus one user-aggregate update per finished game.

use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use tictactoe_core::{apply_move, MoveError, Opponent, Outcome};

use crate::models::{Game, HistoryRecord, ScoreRecord, User};
use crate::protocol::{GameInfo, HistoryInfo, ScoreInfo, UserInfo};
use crate::store::{GameStore, Notifier, Task, TaskQueue, WinRateCache};

/// Greeting on a freshly created game
const NEW_GAME_MESSAGE: &str = "Good luck playing Tic Tac Toe!";

/// Reminder mail subject
const REMINDER_SUBJECT: &str = "This is a reminder!";

/// Caller-input errors. Surfaced immediately, never retried, never
/// silently corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("A User with that name already exists!")]
    UserExists,

    #[error("A User with that name does not exist!")]
    UserNotFound,

    #[error("Game not found!")]
    GameNotFound,

    #[error(transparent)]
    InvalidMove(#[from] MoveError),
}

/// The service, wired to its injected collaborators.
pub struct GameService {
    store: Arc<dyn GameStore>,
    cache: Arc<dyn WinRateCache>,
    queue: Arc<dyn TaskQueue>,
    notifier: Arc<dyn Notifier>,
    opponent: Mutex<Box<dyn Opponent + Send>>,
}

impl GameService {
    pub fn new(
        store: Arc<dyn GameStore>,
        cache: Arc<dyn WinRateCache>,
        queue: Arc<dyn TaskQueue>,
        notifier: Arc<dyn Notifier>,
        opponent: Box<dyn Opponent + Send>,
    ) -> Self {
        Self {
            store,
            cache,
            queue,
            notifier,
            opponent: Mutex::new(opponent),
        }
    }

    /// Create a user; the name must be unique.
    pub fn create_user(
        &self,
        user_name: &str,
        email: Option<String>,
    ) -> Result<String, ServiceError> {
        self.store
            .create_user(User::new(user_name.to_string(), email))
            .map_err(|_| ServiceError::UserExists)?;
        info!(user = user_name, "user created");
        Ok(format!("User {user_name} created!"))
    }

    /// All users, best win rate first.
    pub fn get_user_rankings(&self) -> Vec<UserInfo> {
        self.store
            .users_by_rate()
            .iter()
            .map(User::to_info)
            .collect()
    }

    /// Create a game for an existing user and kick off the win-rate
    /// recompute. The recompute is not needed to complete creation, so a
    /// failed enqueue only logs.
    pub fn new_game(&self, user_name: &str) -> Result<GameInfo, ServiceError> {
        self.store
            .get_user(user_name)
            .ok_or(ServiceError::UserNotFound)?;

        let game = Game::new(user_name.to_string(), NEW_GAME_MESSAGE.to_string());
        self.store.insert_game(game.clone());
        info!(game = %game.id, user = user_name, "new game");

        if !self.queue.enqueue(Task::RefreshWinRates) {
            warn!("win-rate refresh could not be queued");
        }

        Ok(game.to_info())
    }

    /// Current state of one game.
    pub fn get_game(&self, game_id: Uuid) -> Result<GameInfo, ServiceError> {
        self.store
            .get_game(game_id)
            .map(|game| game.to_info())
            .ok_or(ServiceError::GameNotFound)
    }

    /// Make a move. On an accepted move the game is persisted and one
    /// history record appended; a terminal result additionally writes the
    /// score ledger and the user aggregates. A move against a finished
    /// game returns the unchanged board with its "already over" message
    /// and records nothing.
    pub fn make_move(&self, game_id: Uuid, pos: i64) -> Result<GameInfo, ServiceError> {
        if !(0..=8).contains(&pos) {
            return Err(ServiceError::InvalidMove(MoveError::IndexOutOfRange));
        }
        let index = pos as usize;

        let mut game = self
            .store
            .get_game(game_id)
            .ok_or(ServiceError::GameNotFound)?;

        let result = {
            let mut opponent = self.opponent.lock().expect("opponent lock poisoned");
            apply_move(&game.board, game.outcome, index, opponent.as_mut())?
        };

        game.message = result.message.to_string();
        if !result.accepted {
            return Ok(game.to_info());
        }

        game.board = result.board;
        game.outcome = result.outcome;
        self.store.update_game(game.clone());
        self.store
            .append_history(HistoryRecord::new(game.id, index, game.message.clone()));

        if game.outcome.is_terminal() {
            self.finish_game(&game);
        }

        Ok(game.to_info())
    }

    /// Delete a game. The original API allowed cancelling finished games
    /// too; deletion is administrative, not part of the state machine.
    pub fn cancel_game(&self, game_id: Uuid) -> Result<String, ServiceError> {
        if !self.store.delete_game(game_id) {
            return Err(ServiceError::GameNotFound);
        }
        info!(game = %game_id, "game cancelled");
        Ok("cancelled".to_string())
    }

    /// Move history of one game, in move order.
    pub fn get_game_history(&self, game_id: Uuid) -> Result<Vec<HistoryInfo>, ServiceError> {
        self.store
            .get_game(game_id)
            .ok_or(ServiceError::GameNotFound)?;
        Ok(self
            .store
            .history_for(game_id)
            .iter()
            .map(HistoryRecord::to_info)
            .collect())
    }

    /// A user's games that are still in progress.
    pub fn get_user_games(&self, user_name: &str) -> Result<Vec<GameInfo>, ServiceError> {
        self.store
            .get_user(user_name)
            .ok_or(ServiceError::UserNotFound)?;
        Ok(self
            .store
            .active_games_for(user_name)
            .iter()
            .map(Game::to_info)
            .collect())
    }

    /// Every score on the ledger.
    pub fn get_scores(&self) -> Vec<ScoreInfo> {
        self.store.scores().iter().map(ScoreRecord::to_info).collect()
    }

    /// One user's scores.
    pub fn get_user_scores(&self, user_name: &str) -> Result<Vec<ScoreInfo>, ServiceError> {
        self.store
            .get_user(user_name)
            .ok_or(ServiceError::UserNotFound)?;
        Ok(self
            .store
            .scores_for(user_name)
            .iter()
            .map(ScoreRecord::to_info)
            .collect())
    }

    /// Scores by point value, best first. An omitted count returns the
    /// whole ledger.
    pub fn get_high_scores(&self, number_of_results: Option<usize>) -> Vec<ScoreInfo> {
        self.store
            .top_scores(number_of_results)
            .iter()
            .map(ScoreRecord::to_info)
            .collect()
    }

    /// The cached aggregate win rate; empty until first computed.
    pub fn get_average_win_rates(&self) -> String {
        self.cache.get().unwrap_or_default()
    }

    /// Recompute the aggregate and refresh the cache. Run by the queue
    /// worker; a deployment with no finished games leaves the cache as is.
    pub fn refresh_win_rate_cache(&self) {
        let counts = self.store.game_counts();
        if counts.finished > 0 {
            let average = counts.player_wins as f64 / counts.finished as f64;
            self.cache
                .set(format!("The average win rate is {average:.2}"));
        }
    }

    /// Remind every user with an email address about their unfinished
    /// games. Run on the hourly sweep.
    pub fn send_reminders(&self) {
        for user in self.store.users_by_rate() {
            if user.email.is_none() {
                continue;
            }
            if self.store.active_games_for(&user.name).is_empty() {
                continue;
            }
            let body = format!("Hello {}, try to finish Tic Tac Toe!", user.name);
            self.notifier.remind(&user, REMINDER_SUBJECT, &body);
        }
    }

    /// Terminal-transition side effects: score ledger entry and user
    /// aggregates, exactly once per game.
    fn finish_game(&self, game: &Game) {
        self.store.append_score(ScoreRecord::for_outcome(
            game.user_name.clone(),
            game.outcome,
        ));

        if let Some(mut user) = self.store.get_user(&game.user_name) {
            user.record_finished_game(game.outcome == Outcome::PlayerWin);
            self.store.update_user(user);
        }
    }
}
