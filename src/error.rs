//! Error types for the chat broker
//!
//! Defines application-level errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::{MessageId, SessionId};

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and
/// business errors (send error message to the requesting session).
#[derive(Debug, Error)]
pub enum BrokerError {
    /// WebSocket protocol error (fatal for that connection)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal for that connection)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (broker actor gone)
    #[error("Channel send error")]
    ChannelSend,

    /// Referenced message does not exist in any mailbox
    #[error("message {0} not found")]
    MessageNotFound(MessageId),

    /// Delete requested by a session that did not author the message
    #[error("message {0} was not sent by {1}")]
    NotOwner(MessageId, SessionId),

    /// Delete request carried neither a content token nor an id
    #[error("delete request does not reference a message")]
    MissingTarget,
}

/// Message send errors
///
/// Occurs when attempting to push frames through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
