//! Mailbox store
//!
//! Canonical message records live in one arena keyed by message id;
//! per-session sent and received logs hold ids into the arena rather
//! than copies. A message fanned out to N receivers therefore has one
//! record and up to 1 + N log entries, and a single rewrite (delete or
//! expiry) is visible from every mailbox at once.
//!
//! Logs are append-only with respect to id and order; only a record's
//! content and action may be corrected in place, and only through
//! `mark_removed` / `mark_expired`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::message::{Action, Frame, Recipients};
use crate::types::{MessageId, SessionId};

/// Replacement text applied by an owner delete
pub const REMOVED_PLACEHOLDER: &str = "THIS MESSAGE IS REMOVED";

/// Replacement text applied by the expiry sweeper
pub const EXPIRED_PLACEHOLDER: &str = "THIS MESSAGE IS EXPIRED";

/// Canonical record of one accepted message
///
/// `receivers` is the resolved receiver set, sender excluded; the
/// sender's own copy is filed through its sent log.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub id: MessageId,
    pub sender: SessionId,
    pub receivers: Vec<SessionId>,
    pub content: String,
    pub action: Action,
    pub time: String,
    pub private: bool,
    pub reply_to: Option<MessageId>,
    /// Acceptance instant, used for expiry age
    pub posted_at: Instant,
    /// Time-to-live; set only for TEMPORARY messages
    pub expires_after: Option<Duration>,
}

impl MessageRecord {
    /// Whether this record is a TEMPORARY message past its TTL at `now`.
    ///
    /// Records already rewritten (action DELETE) are never expired again.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.action == Action::Temporary
            && self
                .expires_after
                .map_or(false, |ttl| now.duration_since(self.posted_at) > ttl)
    }

    /// Render this record as an outbound frame.
    pub fn to_frame(&self) -> Frame {
        Frame {
            id: Some(self.id.clone()),
            action: self.action,
            sender: Some(self.sender.clone()),
            receiver: Recipients::Sessions(self.receivers.clone()),
            content: self.content.clone(),
            time: Some(self.time.clone()),
            private: self.private,
            reply_to: self.reply_to.clone(),
        }
    }
}

/// Arena of message records plus per-session logs
#[derive(Debug, Default)]
pub struct MailboxStore {
    records: HashMap<MessageId, MessageRecord>,
    sent: HashMap<SessionId, Vec<MessageId>>,
    received: HashMap<SessionId, Vec<MessageId>>,
}

impl MailboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a new record into the arena.
    pub fn insert(&mut self, record: MessageRecord) {
        self.records.insert(record.id.clone(), record);
    }

    /// Append a message id to the owner's sent log.
    pub fn record_sent(&mut self, owner: &SessionId, message_id: &MessageId) {
        self.sent
            .entry(owner.clone())
            .or_default()
            .push(message_id.clone());
    }

    /// Append a message id to the owner's received log.
    pub fn record_received(&mut self, owner: &SessionId, message_id: &MessageId) {
        self.received
            .entry(owner.clone())
            .or_default()
            .push(message_id.clone());
    }

    /// Look up a message in the owner's sent log.
    ///
    /// This is the delete authorization check: a record that exists but
    /// sits in someone else's sent log is not found here.
    pub fn find_owned(&self, owner: &SessionId, message_id: &MessageId) -> Option<&MessageRecord> {
        let owns = self
            .sent
            .get(owner)
            .map_or(false, |log| log.contains(message_id));
        if owns {
            self.records.get(message_id)
        } else {
            None
        }
    }

    /// Look up a message regardless of mailbox (reply context).
    pub fn find_by_id(&self, message_id: &MessageId) -> Option<&MessageRecord> {
        self.records.get(message_id)
    }

    /// Rewrite a record with the removal placeholder.
    ///
    /// Returns true when the record was rewritten, false when it was
    /// absent or already rewritten (idempotent).
    pub fn mark_removed(&mut self, message_id: &MessageId) -> bool {
        self.rewrite(message_id, REMOVED_PLACEHOLDER)
    }

    /// Rewrite a record with the expiry placeholder.
    ///
    /// Same idempotency contract as [`mark_removed`](Self::mark_removed);
    /// whichever rewrite lands first wins.
    pub fn mark_expired(&mut self, message_id: &MessageId) -> bool {
        self.rewrite(message_id, EXPIRED_PLACEHOLDER)
    }

    fn rewrite(&mut self, message_id: &MessageId, replacement: &str) -> bool {
        let Some(record) = self.records.get_mut(message_id) else {
            return false;
        };
        if record.action == Action::Delete {
            return false;
        }
        record.content = replacement.to_string();
        record.action = Action::Delete;
        true
    }

    /// Ids of every TEMPORARY record past its TTL at `now`.
    pub fn expired_ids(&self, now: Instant) -> Vec<MessageId> {
        self.records
            .values()
            .filter(|record| record.is_expired(now))
            .map(|record| record.id.clone())
            .collect()
    }

    /// The owner's sent log, oldest first.
    pub fn sent_log(&self, owner: &SessionId) -> &[MessageId] {
        self.sent.get(owner).map_or(&[], |log| log.as_slice())
    }

    /// The owner's received log, oldest first.
    pub fn received_log(&self, owner: &SessionId) -> &[MessageId] {
        self.received.get(owner).map_or(&[], |log| log.as_slice())
    }
}
