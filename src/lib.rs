//! In-Memory Chat Broker Library
//!
//! A WebSocket chat broker that assigns each connected session a stable
//! identity and routes structured messages between sessions: broadcast,
//! direct, ephemeral, reply and delete. Ephemeral (TEMPORARY) messages
//! are expired by a background sweeper.
//!
//! # Features
//! - Login handshake with reconnection (resume a previously issued identity)
//! - Broadcast ("all") and direct fan-out with per-session mailboxes
//! - Owner-only message deletion with shared-record rewrite
//! - TEMPORARY messages expired on a fixed sweep interval
//! - Presence (ACTIVE_CLIENT) rosters on every join and leave
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatBroker` is the central actor owning all state (identity
//!   registry, session directory, mailbox store)
//! - Each connection has a `handler` task communicating with the broker
//! - The expiry sweeper is a separate task ticking commands into the
//!   same actor, so sweeps serialize with client traffic
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use std::time::Duration;
//! use chat_broker::{ChatBroker, handle_connection, run_sweeper};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:65432").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(ChatBroker::new(cmd_rx, Duration::from_secs(60)).run());
//!     tokio::spawn(run_sweeper(Duration::from_secs(5), cmd_tx.clone()));
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         tokio::spawn(handle_connection(stream, cmd_tx));
//!     }
//! }
//! ```

pub mod broker;
pub mod config;
pub mod directory;
pub mod error;
pub mod handler;
pub mod mailbox;
pub mod message;
pub mod registry;
pub mod session;
pub mod sweeper;
pub mod types;

// Re-export main types for convenience
pub use broker::{BrokerCommand, ChatBroker};
pub use config::Config;
pub use directory::SessionDirectory;
pub use error::{BrokerError, SendError};
pub use handler::handle_connection;
pub use mailbox::{MailboxStore, MessageRecord, EXPIRED_PLACEHOLDER, REMOVED_PLACEHOLDER};
pub use message::{Action, ErrorReply, Frame, LoginReply, LoginRequest, Outbound, Recipients};
pub use registry::IdentityRegistry;
pub use session::Session;
pub use sweeper::run_sweeper;
pub use types::{MessageId, SessionId};
