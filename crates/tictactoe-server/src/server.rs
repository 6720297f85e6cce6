//! WebSocket server, connection handling, and background jobs.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::service::GameService;
use crate::store::Task;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Reminder sweep cadence; the original ran it as an hourly cron.
const REMINDER_INTERVAL: Duration = Duration::from_secs(3600);

/// Server state shared across all connections.
pub struct ServerState {
    /// The game service behind the API
    pub service: GameService,
    /// Mapping from client ID to their message sender
    pub client_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
}

impl ServerState {
    pub fn new(service: GameService) -> Self {
        Self {
            service,
            client_senders: DashMap::new(),
        }
    }

    /// Send a message to a specific client.
    pub fn send_to_client(&self, client_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.client_senders.get(&client_id) {
            let _ = sender.send(msg);
        }
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Tic-tac-toe server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Drain the task queue: each job recomputes the aggregate and refreshes
/// the cache.
pub async fn run_queue_worker(state: Arc<ServerState>, mut rx: mpsc::UnboundedReceiver<Task>) {
    while let Some(task) = rx.recv().await {
        match task {
            Task::RefreshWinRates => {
                state.service.refresh_win_rate_cache();
                info!("win-rate cache refreshed");
            }
        }
    }
}

/// Periodic reminder sweep over users with unfinished games.
pub async fn run_reminder_sweep(state: Arc<ServerState>) {
    let mut ticker = tokio::time::interval(REMINDER_INTERVAL);
    // The first tick fires immediately; skip it so a fresh server does
    // not remind anyone at startup.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        state.service.send_reminders();
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Assign a client ID
    let client_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.client_senders.insert(client_id, tx);

    // Send welcome message
    let welcome = ServerMessage::Welcome { client_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text.into())).await?;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) {
                    let reply = handle_message(client_msg, &state);
                    state.send_to_client(client_id, reply);
                } else {
                    warn!("Invalid message from {}: {}", client_id, text);
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", client_id);
                break;
            }
            Ok(Message::Ping(data)) => {
                state.send_to_client(client_id, ServerMessage::Pong);
                let _ = data; // Just consume it
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", client_id, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    state.client_senders.remove(&client_id);
    send_task.abort();

    info!("Connection closed for {}", client_id);
    Ok(())
}

/// Map one client message to a service call and its reply.
fn handle_message(msg: ClientMessage, state: &Arc<ServerState>) -> ServerMessage {
    let service = &state.service;
    let result = match msg {
        ClientMessage::CreateUser { user_name, email } => service
            .create_user(&user_name, email)
            .map(|message| ServerMessage::Message { message }),

        ClientMessage::GetUserRankings => Ok(ServerMessage::UserRankings {
            items: service.get_user_rankings(),
        }),

        ClientMessage::NewGame { user_name } => service
            .new_game(&user_name)
            .map(|game| ServerMessage::Game { game }),

        ClientMessage::GetGame { game_id } => service
            .get_game(game_id)
            .map(|game| ServerMessage::Game { game }),

        ClientMessage::MakeMove { game_id, pos } => service
            .make_move(game_id, pos)
            .map(|game| ServerMessage::Game { game }),

        ClientMessage::CancelGame { game_id } => service
            .cancel_game(game_id)
            .map(|message| ServerMessage::Message { message }),

        ClientMessage::GetGameHistory { game_id } => service
            .get_game_history(game_id)
            .map(|items| ServerMessage::History { items }),

        ClientMessage::GetUserGames { user_name } => service
            .get_user_games(&user_name)
            .map(|items| ServerMessage::Games { items }),

        ClientMessage::GetScores => Ok(ServerMessage::Scores {
            items: service.get_scores(),
        }),

        ClientMessage::GetUserScores { user_name } => service
            .get_user_scores(&user_name)
            .map(|items| ServerMessage::Scores { items }),

        ClientMessage::GetHighScores { number_of_results } => Ok(ServerMessage::Scores {
            items: service.get_high_scores(number_of_results),
        }),

        ClientMessage::GetAverageWinRates => Ok(ServerMessage::AverageWinRates {
            message: service.get_average_win_rates(),
        }),

        ClientMessage::Ping => Ok(ServerMessage::Pong),
    };

    result.unwrap_or_else(|e| ServerMessage::Error {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LogNotifier, MemoryCache, MemoryStore, QueueHandle};
    use tictactoe_core::ScriptedOpponent;

    fn test_state() -> (Arc<ServerState>, mpsc::UnboundedReceiver<Task>) {
        let (queue, rx) = QueueHandle::channel();
        let service = GameService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryCache::new()),
            Arc::new(queue),
            Arc::new(LogNotifier),
            Box::new(ScriptedOpponent::new([4, 5])),
        );
        (Arc::new(ServerState::new(service)), rx)
    }

    fn dispatch(state: &Arc<ServerState>, msg: ClientMessage) -> ServerMessage {
        handle_message(msg, state)
    }

    #[test]
    fn test_full_game_over_the_protocol() {
        let (state, _rx) = test_state();

        let reply = dispatch(
            &state,
            ClientMessage::CreateUser {
                user_name: "lisa".into(),
                email: None,
            },
        );
        assert!(matches!(reply, ServerMessage::Message { .. }));

        let game_id = match dispatch(
            &state,
            ClientMessage::NewGame {
                user_name: "lisa".into(),
            },
        ) {
            ServerMessage::Game { game } => game.game_id,
            other => panic!("expected game, got {other:?}"),
        };

        for pos in [0, 1] {
            let reply = dispatch(&state, ClientMessage::MakeMove { game_id, pos });
            match reply {
                ServerMessage::Game { game } => assert_eq!(game.message, "Keep moving."),
                other => panic!("expected game, got {other:?}"),
            }
        }

        match dispatch(&state, ClientMessage::MakeMove { game_id, pos: 2 }) {
            ServerMessage::Game { game } => {
                assert!(game.game_over);
                assert_eq!(game.message, "You win!");
            }
            other => panic!("expected game, got {other:?}"),
        }

        match dispatch(&state, ClientMessage::GetGameHistory { game_id }) {
            ServerMessage::History { items } => assert_eq!(items.len(), 3),
            other => panic!("expected history, got {other:?}"),
        }
    }

    #[test]
    fn test_errors_surface_with_original_messages() {
        let (state, _rx) = test_state();

        let reply = dispatch(
            &state,
            ClientMessage::NewGame {
                user_name: "nobody".into(),
            },
        );
        match reply {
            ServerMessage::Error { message } => {
                assert_eq!(message, "A User with that name does not exist!");
            }
            other => panic!("expected error, got {other:?}"),
        }

        let reply = dispatch(
            &state,
            ClientMessage::MakeMove {
                game_id: Uuid::new_v4(),
                pos: 42,
            },
        );
        match reply {
            ServerMessage::Error { message } => assert_eq!(message, "only move from 0-8!"),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_queued_refresh_reaches_the_cache() {
        let (state, mut rx) = test_state();

        dispatch(
            &state,
            ClientMessage::CreateUser {
                user_name: "lisa".into(),
                email: None,
            },
        );
        let game_id = match dispatch(
            &state,
            ClientMessage::NewGame {
                user_name: "lisa".into(),
            },
        ) {
            ServerMessage::Game { game } => game.game_id,
            other => panic!("expected game, got {other:?}"),
        };
        for pos in [0, 1, 2] {
            dispatch(&state, ClientMessage::MakeMove { game_id, pos });
        }

        // The job was queued at game creation; the game has finished by
        // the time the worker would pick it up, exactly the out-of-
        // sequence shape the task queue exists for.
        assert_eq!(rx.recv().await, Some(Task::RefreshWinRates));
        state.service.refresh_win_rate_cache();

        match dispatch(&state, ClientMessage::GetAverageWinRates) {
            ServerMessage::AverageWinRates { message } => {
                assert_eq!(message, "The average win rate is 1.00");
            }
            other => panic!("expected win rates, got {other:?}"),
        }
    }
}
