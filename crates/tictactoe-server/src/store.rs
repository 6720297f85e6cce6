//! Platform collaborator ports and their in-memory adapters.
//!
//! The service never touches ambient global services: persistence, the
//! win-rate cache, the task queue, and the reminder notifier are all
//! injected through the traits here. The in-memory adapters are the
//! default single-process deployment; a real datastore slots in behind
//! the same traits.

use dashmap::DashMap;
use std::sync::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::models::{Game, HistoryRecord, ScoreRecord, User};

/// Counts feeding the aggregate win-rate statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameCounts {
    /// Finished games won by the player
    pub player_wins: u64,
    /// All finished games
    pub finished: u64,
}

/// Persistence port.
///
/// Writer contract: the engine does not coordinate concurrent moves, so a
/// store implementation (or its deployment) must serialize writes per
/// game: at most one writer per game at a time. The in-memory adapter
/// satisfies this only as far as the connection handler drives one move
/// at a time per client; a multi-process deployment needs an equivalent
/// lock or transaction in its backing datastore.
pub trait GameStore: Send + Sync {
    /// Insert a user; fails when the name is taken
    fn create_user(&self, user: User) -> Result<(), UserExists>;
    fn get_user(&self, name: &str) -> Option<User>;
    fn update_user(&self, user: User);
    /// All users, best win rate first
    fn users_by_rate(&self) -> Vec<User>;

    fn insert_game(&self, game: Game);
    fn get_game(&self, id: Uuid) -> Option<Game>;
    fn update_game(&self, game: Game);
    /// Remove a game; true when it existed
    fn delete_game(&self, id: Uuid) -> bool;
    /// A user's games that are still in progress
    fn active_games_for(&self, user_name: &str) -> Vec<Game>;

    fn append_history(&self, record: HistoryRecord);
    /// History for one game, in insertion order
    fn history_for(&self, game_id: Uuid) -> Vec<HistoryRecord>;

    fn append_score(&self, score: ScoreRecord);
    fn scores(&self) -> Vec<ScoreRecord>;
    fn scores_for(&self, user_name: &str) -> Vec<ScoreRecord>;
    /// Scores by point value, best first; `None` returns the whole ledger
    fn top_scores(&self, limit: Option<usize>) -> Vec<ScoreRecord>;

    /// Counts for the win-rate aggregate
    fn game_counts(&self) -> GameCounts;
}

/// Duplicate-name conflict from [`GameStore::create_user`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserExists;

/// Cache port for the single aggregate win-rate string. Best-effort and
/// staleness-tolerant; never required for correctness.
pub trait WinRateCache: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, value: String);
}

/// Background jobs the service can enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    RefreshWinRates,
}

/// Task-scheduling port. Fire-and-forget: enqueue failure is reported but
/// never fatal to the operation that requested the job.
pub trait TaskQueue: Send + Sync {
    /// True when the job was queued
    fn enqueue(&self, task: Task) -> bool;
}

/// Notifier port for the reminder sweep
pub trait Notifier: Send + Sync {
    fn remind(&self, user: &User, subject: &str, body: &str);
}

/// In-memory persistence adapter, keyed the way the datastore was.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    games: DashMap<Uuid, Game>,
    history: DashMap<Uuid, Vec<HistoryRecord>>,
    scores: Mutex<Vec<ScoreRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryStore {
    fn create_user(&self, user: User) -> Result<(), UserExists> {
        if self.users.contains_key(&user.name) {
            return Err(UserExists);
        }
        self.users.insert(user.name.clone(), user);
        Ok(())
    }

    fn get_user(&self, name: &str) -> Option<User> {
        self.users.get(name).map(|u| u.clone())
    }

    fn update_user(&self, user: User) {
        self.users.insert(user.name.clone(), user);
    }

    fn users_by_rate(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.clone()).collect();
        users.sort_by(|a, b| b.rate.total_cmp(&a.rate));
        users
    }

    fn insert_game(&self, game: Game) {
        self.games.insert(game.id, game);
    }

    fn get_game(&self, id: Uuid) -> Option<Game> {
        self.games.get(&id).map(|g| g.clone())
    }

    fn update_game(&self, game: Game) {
        self.games.insert(game.id, game);
    }

    fn delete_game(&self, id: Uuid) -> bool {
        self.games.remove(&id).is_some()
    }

    fn active_games_for(&self, user_name: &str) -> Vec<Game> {
        let mut games: Vec<Game> = self
            .games
            .iter()
            .filter(|g| g.user_name == user_name && !g.game_over())
            .map(|g| g.clone())
            .collect();
        games.sort_by_key(|g| g.created_at);
        games
    }

    fn append_history(&self, record: HistoryRecord) {
        self.history.entry(record.game_id).or_default().push(record);
    }

    fn history_for(&self, game_id: Uuid) -> Vec<HistoryRecord> {
        self.history
            .get(&game_id)
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    fn append_score(&self, score: ScoreRecord) {
        self.scores.lock().expect("score ledger poisoned").push(score);
    }

    fn scores(&self) -> Vec<ScoreRecord> {
        self.scores.lock().expect("score ledger poisoned").clone()
    }

    fn scores_for(&self, user_name: &str) -> Vec<ScoreRecord> {
        self.scores
            .lock()
            .expect("score ledger poisoned")
            .iter()
            .filter(|s| s.user_name == user_name)
            .cloned()
            .collect()
    }

    fn top_scores(&self, limit: Option<usize>) -> Vec<ScoreRecord> {
        let mut scores = self.scores();
        scores.sort_by(|a, b| b.point.cmp(&a.point));
        if let Some(limit) = limit {
            scores.truncate(limit);
        }
        scores
    }

    fn game_counts(&self) -> GameCounts {
        let mut counts = GameCounts::default();
        for game in self.games.iter() {
            if game.game_over() {
                counts.finished += 1;
                if game.winner_symbol().as_deref() == Some("X") {
                    counts.player_wins += 1;
                }
            }
        }
        counts
    }
}

/// In-memory cache adapter for the single aggregate entry
#[derive(Default)]
pub struct MemoryCache {
    value: RwLock<Option<String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WinRateCache for MemoryCache {
    fn get(&self) -> Option<String> {
        self.value.read().expect("cache lock poisoned").clone()
    }

    fn set(&self, value: String) {
        *self.value.write().expect("cache lock poisoned") = Some(value);
    }
}

/// Sender half of the background job queue; the worker drains the
/// receiver on its own task.
pub struct QueueHandle {
    tx: mpsc::UnboundedSender<Task>,
}

impl QueueHandle {
    /// Create the queue, returning the enqueue handle and the worker's
    /// receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Task>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl TaskQueue for QueueHandle {
    fn enqueue(&self, task: Task) -> bool {
        self.tx.send(task).is_ok()
    }
}

/// Default notifier: logs the reminder instead of sending mail
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn remind(&self, user: &User, subject: &str, body: &str) {
        info!(user = %user.name, subject, body, "reminder");
    }
}
