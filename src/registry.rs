//! Identity registry
//!
//! Issues session and message identities. Both sets grow for the life
//! of the process and are never pruned: an identity is never handed out
//! twice, even after its owner disconnects or its message is deleted,
//! so history and reply references stay unambiguous.
//!
//! The registry is owned by the broker actor; the actor loop serializes
//! all issuance, which makes the check-and-insert of each `issue_*`
//! call atomic with respect to every other issuer.

use std::collections::{HashMap, HashSet};

use crate::types::{MessageId, SessionId};

/// Issued-identity bookkeeping
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    /// Every session identity ever issued, with its display name
    issued_sessions: HashMap<SessionId, String>,
    /// Every message identity ever issued
    issued_messages: HashSet<MessageId>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh session identity for the given display name.
    ///
    /// Candidates are regenerated until one is unused; the winning
    /// identity is recorded before it is returned.
    pub fn issue_session_identity(&mut self, display_name: &str) -> SessionId {
        loop {
            let candidate = SessionId::generate(display_name);
            if !self.issued_sessions.contains_key(&candidate) {
                self.issued_sessions
                    .insert(candidate.clone(), display_name.to_string());
                return candidate;
            }
        }
    }

    /// Check whether `identity` was previously issued to `display_name`.
    ///
    /// Used by the login handshake to accept reconnections.
    pub fn is_reconnect(&self, identity: &SessionId, display_name: &str) -> bool {
        self.issued_sessions
            .get(identity)
            .map_or(false, |name| name == display_name)
    }

    /// Issue a fresh message identity.
    pub fn issue_message_identity(&mut self) -> MessageId {
        loop {
            let candidate = MessageId::generate();
            if self.issued_messages.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_session_identities_distinct() {
        let mut registry = IdentityRegistry::new();
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let id = registry.issue_session_identity("alice");
            assert!(seen.insert(id), "identity issued twice");
        }
    }

    #[test]
    fn test_message_identities_distinct() {
        let mut registry = IdentityRegistry::new();
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let id = registry.issue_message_identity();
            assert!(seen.insert(id), "message identity issued twice");
        }
    }

    #[test]
    fn test_reconnect_requires_matching_name() {
        let mut registry = IdentityRegistry::new();
        let id = registry.issue_session_identity("alice");

        assert!(registry.is_reconnect(&id, "alice"));
        assert!(!registry.is_reconnect(&id, "mallory"));
        assert!(!registry.is_reconnect(&SessionId("ghost_0000".to_string()), "alice"));
    }
}
