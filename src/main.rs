//! In-Memory Chat Broker - Entry Point
//!
//! Starts the TCP listener, the ChatBroker actor and the expiry
//! sweeper, then accepts connections.

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_broker::{handle_connection, run_sweeper, ChatBroker, Config};

/// Channel buffer size for broker commands
const CHANNEL_BUFFER_SIZE: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_broker=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_broker=info")),
        )
        .init();

    let config = Config::from_env();

    // Start TCP listener
    let listener = TcpListener::bind(&config.addr).await?;
    info!("Chat broker listening on {}", config.addr);

    // Create the broker actor channel and start it
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let broker = ChatBroker::new(cmd_rx, config.temp_ttl);
    tokio::spawn(broker.run());

    // Start the expiry sweeper
    tokio::spawn(run_sweeper(config.sweep_interval, cmd_tx.clone()));

    info!(
        "ChatBroker actor started (sweep every {:?}, TEMPORARY ttl {:?})",
        config.sweep_interval, config.temp_ttl
    );

    // Connection accept loop
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();

                // Spawn handler task for each connection
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
