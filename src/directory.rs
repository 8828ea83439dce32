//! Session directory
//!
//! Maps live session identities to their transport handles; the source
//! of truth for "who is currently reachable". Mailbox history is kept
//! elsewhere and survives removal from this directory.

use std::collections::HashMap;

use crate::session::Session;
use crate::types::SessionId;

/// Live sessions, in registration order
#[derive(Debug, Default)]
pub struct SessionDirectory {
    sessions: HashMap<SessionId, Session>,
    /// Insertion order for stable rosters
    order: Vec<SessionId>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the live entry for a session.
    ///
    /// A reconnecting session overwrites its stale transport handle and
    /// keeps its original roster position.
    pub fn register(&mut self, session: Session) {
        let identity = session.identity.clone();
        if self.sessions.insert(identity.clone(), session).is_none() {
            self.order.push(identity);
        }
    }

    /// Remove a live entry; no-op when already absent.
    pub fn remove(&mut self, identity: &SessionId) -> Option<Session> {
        let removed = self.sessions.remove(identity);
        if removed.is_some() {
            self.order.retain(|id| id != identity);
        }
        removed
    }

    pub fn get(&self, identity: &SessionId) -> Option<&Session> {
        self.sessions.get(identity)
    }

    pub fn contains(&self, identity: &SessionId) -> bool {
        self.sessions.contains_key(identity)
    }

    /// All live identities other than `excluding`, in registration order.
    ///
    /// Used both for presence rosters and for resolving "all" receivers.
    pub fn list_active(&self, excluding: &SessionId) -> Vec<SessionId> {
        self.order
            .iter()
            .filter(|id| *id != excluding)
            .cloned()
            .collect()
    }

    /// Iterate live sessions in registration order.
    pub fn iter_live(&self) -> impl Iterator<Item = &Session> + '_ {
        self.order.iter().filter_map(|id| self.sessions.get(id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn session(id: &str) -> Session {
        let (tx, _rx) = mpsc::channel(32);
        Session::new(SessionId(id.to_string()), id.to_string(), tx)
    }

    #[test]
    fn test_list_active_excludes_caller() {
        let mut directory = SessionDirectory::new();
        directory.register(session("alice_1111"));
        directory.register(session("bob_2222"));
        directory.register(session("carol_3333"));

        let active = directory.list_active(&SessionId("bob_2222".to_string()));
        assert_eq!(
            active,
            vec![
                SessionId("alice_1111".to_string()),
                SessionId("carol_3333".to_string()),
            ]
        );
    }

    #[test]
    fn test_register_keeps_insertion_order() {
        let mut directory = SessionDirectory::new();
        directory.register(session("alice_1111"));
        directory.register(session("bob_2222"));

        // reconnect replaces the handle but keeps the roster position
        directory.register(session("alice_1111"));

        let active = directory.list_active(&SessionId("nobody_0000".to_string()));
        assert_eq!(
            active,
            vec![
                SessionId("alice_1111".to_string()),
                SessionId("bob_2222".to_string()),
            ]
        );
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut directory = SessionDirectory::new();
        directory.register(session("alice_1111"));

        assert!(directory.remove(&SessionId("ghost_0000".to_string())).is_none());
        assert_eq!(directory.len(), 1);

        assert!(directory.remove(&SessionId("alice_1111".to_string())).is_some());
        assert!(directory.remove(&SessionId("alice_1111".to_string())).is_none());
        assert!(directory.is_empty());
    }
}
