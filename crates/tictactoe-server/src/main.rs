//! Tic-tac-toe game server.

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod models;
mod protocol;
mod server;
mod service;
mod store;

use server::ServerState;
use service::GameService;
use store::{LogNotifier, MemoryCache, MemoryStore, QueueHandle};
use tictactoe_core::RandomOpponent;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse address from env or use default
    let addr: SocketAddr = std::env::var("SERVER_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()?;

    info!("Starting tic-tac-toe server...");

    let (queue, queue_rx) = QueueHandle::channel();
    let service = GameService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryCache::new()),
        Arc::new(queue),
        Arc::new(LogNotifier),
        Box::new(RandomOpponent::new()),
    );
    let state = Arc::new(ServerState::new(service));

    tokio::spawn(server::run_queue_worker(Arc::clone(&state), queue_rx));
    tokio::spawn(server::run_reminder_sweep(Arc::clone(&state)));

    server::run_server(addr, state).await
}
