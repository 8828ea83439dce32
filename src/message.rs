//! Wire protocol definitions
//!
//! JSON frames exchanged with clients. Unlike a tagged enum protocol,
//! every chat frame shares one flat record shape
//! `{id, action, sender, receiver, content, time, private, reply_to}`
//! so clients can treat their history as a uniform list; the `action`
//! field selects the handling.

use serde::{Deserialize, Serialize};

use crate::error::BrokerError;
use crate::types::{MessageId, SessionId};

/// Frame action, rendered in SCREAMING_SNAKE_CASE on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Server prompt for the login handshake
    Login,
    /// Plain message
    Post,
    /// Ephemeral message, expired by the sweeper after its TTL
    Temporary,
    /// Message referencing an earlier message via `reply_to`
    Reply,
    /// Inbound: delete request. Outbound: removal notification.
    /// Also the terminal state of a removed or expired record.
    Delete,
    /// Client is leaving
    Exit,
    /// Presence notification; `receiver` carries the live roster
    ActiveClient,
    /// Expiry notification; `content` carries the affected message id
    Outdated,
}

/// Declared receivers of a frame
///
/// On the wire this is a JSON array of identities; the single element
/// `"all"` (case-insensitive) is the broadcast sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum Recipients {
    /// Broadcast to every other live session
    Everyone,
    /// Explicit receiver list
    Sessions(Vec<SessionId>),
}

impl Default for Recipients {
    fn default() -> Self {
        Recipients::Sessions(Vec::new())
    }
}

impl From<Vec<String>> for Recipients {
    fn from(raw: Vec<String>) -> Self {
        if raw.iter().any(|r| r.eq_ignore_ascii_case("all")) {
            Recipients::Everyone
        } else {
            Recipients::Sessions(raw.into_iter().map(SessionId).collect())
        }
    }
}

impl From<Recipients> for Vec<String> {
    fn from(recipients: Recipients) -> Self {
        match recipients {
            Recipients::Everyone => vec!["all".to_string()],
            Recipients::Sessions(ids) => ids.into_iter().map(|id| id.0).collect(),
        }
    }
}

/// One chat frame, inbound or outbound
///
/// Inbound frames omit `id` and `time` (the broker assigns both).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Server-assigned message id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    pub action: Action,
    /// Submitting session; outbound system frames leave this unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<SessionId>,
    /// Declared receivers; delete and exit frames carry none
    #[serde(default, deserialize_with = "recipients_or_null")]
    pub receiver: Recipients,
    #[serde(default)]
    pub content: String,
    /// Server-assigned `YYYY-MM-DD HH:MM:SS` UTC timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default)]
    pub private: bool,
    /// Id of the message being replied to (REPLY only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,
}

/// Accept `"receiver": null` as an empty receiver list
fn recipients_or_null<'de, D>(deserializer: D) -> Result<Recipients, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Vec<String>>::deserialize(deserializer)?;
    Ok(raw.map(Recipients::from).unwrap_or_default())
}

impl Frame {
    fn system(action: Action) -> Self {
        Self {
            id: None,
            action,
            sender: None,
            receiver: Recipients::default(),
            content: String::new(),
            time: None,
            private: false,
            reply_to: None,
        }
    }

    /// Login prompt sent right after the WebSocket handshake
    pub fn login_prompt() -> Self {
        Self::system(Action::Login)
    }

    /// Presence frame carrying the live roster for one recipient
    pub fn presence(roster: Vec<SessionId>) -> Self {
        let mut frame = Self::system(Action::ActiveClient);
        frame.receiver = Recipients::Sessions(roster);
        frame
    }

    /// Removal notification; `content` names the affected message
    pub fn removal_notice(message_id: &MessageId, sender: SessionId, audience: Vec<SessionId>) -> Self {
        let mut frame = Self::system(Action::Delete);
        frame.sender = Some(sender);
        frame.receiver = Recipients::Sessions(audience);
        frame.content = message_id.0.clone();
        frame
    }

    /// Expiry notification; `content` names the affected message
    pub fn expiry_notice(message_id: &MessageId, audience: Vec<SessionId>) -> Self {
        let mut frame = Self::system(Action::Outdated);
        frame.receiver = Recipients::Sessions(audience);
        frame.content = message_id.0.clone();
        frame
    }
}

/// First client frame of the login handshake
///
/// `user_id` is present when the client resumes a previously issued
/// identity (reconnection).
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    #[serde(default)]
    pub user_id: Option<SessionId>,
}

/// Login confirmation carrying the issued (or resumed) identity
#[derive(Debug, Serialize)]
pub struct LoginReply {
    pub status: String,
    pub user_id: SessionId,
}

impl LoginReply {
    pub fn success(user_id: SessionId) -> Self {
        Self {
            status: "SUCCESS".to_string(),
            user_id,
        }
    }
}

/// Error response, sent to a single session and never broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}

/// Convert BrokerError to ErrorReply for client notification
impl From<BrokerError> for ErrorReply {
    fn from(err: BrokerError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Anything the broker pushes through a session's transport handle
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    Frame(Frame),
    Error(ErrorReply),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_names() {
        let json = serde_json::to_string(&Action::ActiveClient).unwrap();
        assert_eq!(json, "\"ACTIVE_CLIENT\"");
        let action: Action = serde_json::from_str("\"TEMPORARY\"").unwrap();
        assert_eq!(action, Action::Temporary);
    }

    #[test]
    fn test_recipients_all_sentinel() {
        let recipients: Recipients = serde_json::from_str(r#"["All"]"#).unwrap();
        assert_eq!(recipients, Recipients::Everyone);
        let json = serde_json::to_string(&Recipients::Everyone).unwrap();
        assert_eq!(json, r#"["all"]"#);
    }

    #[test]
    fn test_recipients_explicit_list() {
        let recipients: Recipients = serde_json::from_str(r#"["bob_1234","carol_5678"]"#).unwrap();
        match recipients {
            Recipients::Sessions(ids) => {
                assert_eq!(ids.len(), 2);
                assert_eq!(ids[0], SessionId("bob_1234".to_string()));
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_inbound_frame_deserialize() {
        let json = r#"{"action":"POST","sender":"alice_1234","receiver":["all"],"content":"hi","private":false}"#;
        let frame: Frame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.action, Action::Post);
        assert_eq!(frame.receiver, Recipients::Everyone);
        assert!(frame.id.is_none());
        assert!(frame.reply_to.is_none());
    }

    #[test]
    fn test_delete_frame_with_null_fields() {
        let json = r#"{"id":null,"action":"DELETE","sender":"alice_1234","receiver":null,"content":"100001","time":null,"private":false,"reply_to":null}"#;
        let frame: Frame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.action, Action::Delete);
        assert_eq!(frame.receiver, Recipients::Sessions(vec![]));
        assert_eq!(frame.content, "100001");
    }

    #[test]
    fn test_outbound_error_serialize() {
        let out = Outbound::Error(ErrorReply {
            error: "message 123456 not found".to_string(),
        });
        let json = serde_json::to_string(&out).unwrap();
        assert_eq!(json, r#"{"error":"message 123456 not found"}"#);
    }

    #[test]
    fn test_presence_frame_serialize() {
        let frame = Frame::presence(vec![SessionId("bob_1234".to_string())]);
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"action\":\"ACTIVE_CLIENT\""));
        assert!(json.contains("\"receiver\":[\"bob_1234\"]"));
        // no server-assigned id on presence frames
        assert!(!json.contains("\"id\""));
    }
}
