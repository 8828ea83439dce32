//! Session struct definition
//!
//! Represents a connected, identified chat participant and the channel
//! used to push frames to its connection handler.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::Outbound;
use crate::types::SessionId;

/// Live session information
///
/// The transport handle is a bounded channel drained by the session's
/// write task; the broker borrows it only for the duration of a push.
#[derive(Debug)]
pub struct Session {
    /// Stable identity, issued by the registry
    pub identity: SessionId,
    /// Name shown to other participants
    pub display_name: String,
    /// Broker → connection handler frame channel
    pub handle: mpsc::Sender<Outbound>,
}

impl Session {
    pub fn new(identity: SessionId, display_name: String, handle: mpsc::Sender<Outbound>) -> Self {
        Self {
            identity,
            display_name,
            handle,
        }
    }

    /// Push a frame to this session
    ///
    /// Returns an error if the channel is closed (connection gone).
    pub async fn send(&self, out: Outbound) -> Result<(), SendError> {
        self.handle
            .send(out)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Whether `other` belongs to the same connection as this session.
    ///
    /// Distinguishes a live entry from the stale handle of a superseded
    /// connection after a reconnect.
    pub fn uses_channel(&self, other: &mpsc::Sender<Outbound>) -> bool {
        self.handle.same_channel(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Frame;

    #[tokio::test]
    async fn test_session_send() {
        let (tx, mut rx) = mpsc::channel(32);
        let session = Session::new(
            SessionId("alice_1234".to_string()),
            "alice".to_string(),
            tx,
        );

        session
            .send(Outbound::Frame(Frame::login_prompt()))
            .await
            .unwrap();
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_session_send_closed_channel() {
        let (tx, rx) = mpsc::channel(32);
        drop(rx);
        let session = Session::new(
            SessionId("alice_1234".to_string()),
            "alice".to_string(),
            tx,
        );

        let result = session.send(Outbound::Frame(Frame::login_prompt())).await;
        assert!(result.is_err());
    }
}
