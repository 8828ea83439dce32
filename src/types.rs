//! Basic type definitions for the chat broker
//!
//! Provides newtype wrappers for type safety:
//! - `SessionId`: display-name-prefixed session identity
//! - `MessageId`: short numeric message token

use serde::{Deserialize, Serialize};

/// Unique session identity (newtype pattern)
///
/// Formed as `<display_name>_<4-digit suffix>` so identities stay
/// human-readable in client rosters. Uniqueness is enforced by the
/// `IdentityRegistry`, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a candidate identity for the given display name.
    ///
    /// The caller is responsible for retrying on collision.
    pub fn generate(display_name: &str) -> Self {
        use rand::Rng;
        let suffix: u32 = rand::thread_rng().gen_range(1000..10_000);
        Self(format!("{}_{}", display_name, suffix))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique message identity (6-digit random token)
///
/// Issued once per accepted message and never reused for the life of
/// the process, even after the message is deleted or expires.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a candidate message token.
    ///
    /// The caller is responsible for retrying on collision.
    pub fn generate() -> Self {
        use rand::Rng;
        let token: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
        Self(token.to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_prefix() {
        let id = SessionId::generate("alice");
        assert!(id.0.starts_with("alice_"));
    }

    #[test]
    fn test_session_id_suffix_length() {
        let id = SessionId::generate("bob");
        let suffix = id.0.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_message_id_is_six_digits() {
        let id = MessageId::generate();
        assert_eq!(id.0.len(), 6);
        assert!(id.0.chars().all(|c| c.is_ascii_digit()));
    }
}
