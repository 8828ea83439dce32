//! ChatBroker actor implementation
//!
//! The central actor that owns all shared state: the identity registry,
//! the session directory and the mailbox store. Uses the Actor pattern
//! with mpsc channels for message passing; the actor loop is the single
//! exclusion zone, so identity issuance, receiver resolution + mailbox
//! append, delete, and the expiry sweep are each atomic with respect to
//! one another. The actor never touches a socket: it pushes frames into
//! per-session channels drained by the connection write tasks.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::directory::SessionDirectory;
use crate::error::BrokerError;
use crate::mailbox::{MailboxStore, MessageRecord};
use crate::message::{Action, Frame, Outbound, Recipients};
use crate::registry::IdentityRegistry;
use crate::session::Session;
use crate::types::{MessageId, SessionId};

/// Commands sent from connection handlers and the sweeper to the broker
#[derive(Debug)]
pub enum BrokerCommand {
    /// Login handshake completed; issue or resume an identity
    Register {
        display_name: String,
        /// Previously issued identity presented by a reconnecting client
        presented: Option<SessionId>,
        handle: mpsc::Sender<Outbound>,
        reply: oneshot::Sender<SessionId>,
    },
    /// Structured frame submitted by a live session
    Submit { identity: SessionId, frame: Frame },
    /// Transport-level disconnect (close frame, dead socket, empty read).
    /// Carries the connection's own handle so a disconnect arriving after
    /// a reconnect cannot remove the superseding session.
    Disconnect {
        identity: SessionId,
        handle: mpsc::Sender<Outbound>,
    },
    /// Periodic tick from the expiry sweeper
    SweepExpired,
}

/// The main ChatBroker actor
///
/// Processes commands until all senders are dropped. Mailbox history
/// outlives session removal; only the directory tracks liveness.
pub struct ChatBroker {
    registry: IdentityRegistry,
    directory: SessionDirectory,
    mailboxes: MailboxStore,
    /// Time-to-live applied to TEMPORARY messages
    temp_ttl: Duration,
    receiver: mpsc::Receiver<BrokerCommand>,
}

impl ChatBroker {
    pub fn new(receiver: mpsc::Receiver<BrokerCommand>, temp_ttl: Duration) -> Self {
        Self {
            registry: IdentityRegistry::new(),
            directory: SessionDirectory::new(),
            mailboxes: MailboxStore::new(),
            temp_ttl,
            receiver,
        }
    }

    /// Run the broker event loop
    pub async fn run(mut self) {
        info!("ChatBroker started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd).await;
        }

        info!("ChatBroker shutting down");
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: BrokerCommand) {
        match cmd {
            BrokerCommand::Register {
                display_name,
                presented,
                handle,
                reply,
            } => {
                self.handle_register(display_name, presented, handle, reply)
                    .await;
            }
            BrokerCommand::Submit { identity, frame } => {
                self.handle_submit(identity, frame).await;
            }
            BrokerCommand::Disconnect { identity, handle } => {
                self.handle_disconnect(identity, handle).await;
            }
            BrokerCommand::SweepExpired => {
                self.handle_sweep().await;
            }
        }
    }

    /// Handle session registration or reconnection
    async fn handle_register(
        &mut self,
        display_name: String,
        presented: Option<SessionId>,
        handle: mpsc::Sender<Outbound>,
        reply: oneshot::Sender<SessionId>,
    ) {
        let identity = match presented {
            Some(id) if self.registry.is_reconnect(&id, &display_name) => {
                info!("Session {} reconnected", id);
                id
            }
            _ => {
                let id = self.registry.issue_session_identity(&display_name);
                info!("New session {} registered as '{}'", id, display_name);
                id
            }
        };

        self.directory
            .register(Session::new(identity.clone(), display_name, handle));
        let _ = reply.send(identity);

        debug!("Total live sessions: {}", self.directory.len());

        // roster reflects the directory state after the mutation
        self.broadcast_presence().await;
    }

    /// Handle transport-level disconnect; no-op when already removed or
    /// when the session has since reconnected on a different channel
    async fn handle_disconnect(&mut self, identity: SessionId, handle: mpsc::Sender<Outbound>) {
        let superseded = self
            .directory
            .get(&identity)
            .map_or(false, |session| !session.uses_channel(&handle));
        if superseded {
            debug!("Ignoring disconnect for superseded connection of {}", identity);
            return;
        }

        if self.directory.remove(&identity).is_some() {
            info!("Session {} disconnected", identity);
            self.broadcast_presence().await;
        }
    }

    /// Dispatch a submitted frame by action
    async fn handle_submit(&mut self, identity: SessionId, frame: Frame) {
        match frame.action {
            Action::Post | Action::Temporary | Action::Reply => {
                self.handle_message(identity, frame).await;
            }
            Action::Delete => {
                self.handle_delete(identity, frame).await;
            }
            Action::Exit => {
                self.handle_exit(identity).await;
            }
            other => {
                warn!("Ignoring inbound {:?} frame from {}", other, identity);
            }
        }
    }

    /// Handle POST / TEMPORARY / REPLY: assign an id, resolve receivers,
    /// file mailbox entries, fan out.
    async fn handle_message(&mut self, identity: SessionId, frame: Frame) {
        if !self.directory.contains(&identity) {
            warn!("Dropping frame from unregistered session {}", identity);
            return;
        }

        let id = self.registry.issue_message_identity();

        // a REPLY whose target is unknown degrades to a normal post
        let (action, reply_to) = match frame.action {
            Action::Reply => match frame.reply_to {
                Some(target) if self.mailboxes.find_by_id(&target).is_some() => {
                    (Action::Reply, Some(target))
                }
                _ => {
                    debug!("Reply target missing, treating {} as a plain post", id);
                    (Action::Post, None)
                }
            },
            other => (other, None),
        };

        // "all" resolves against the live directory; declared lists keep
        // offline receivers (accepted and recorded, not dropped) but
        // collapse duplicates and never include the sender
        let receivers: Vec<SessionId> = match frame.receiver {
            Recipients::Everyone => self.directory.list_active(&identity),
            Recipients::Sessions(declared) => {
                let mut seen = HashSet::new();
                declared
                    .into_iter()
                    .filter(|r| *r != identity && seen.insert(r.clone()))
                    .collect()
            }
        };

        let record = MessageRecord {
            id: id.clone(),
            sender: identity.clone(),
            receivers: receivers.clone(),
            content: frame.content,
            action,
            time: timestamp(),
            private: frame.private,
            reply_to,
            posted_at: Instant::now(),
            expires_after: (action == Action::Temporary).then_some(self.temp_ttl),
        };
        let out = record.to_frame();

        self.mailboxes.insert(record);
        self.mailboxes.record_sent(&identity, &id);
        for receiver in &receivers {
            self.mailboxes.record_received(receiver, &id);
        }

        debug!(
            "Message {} from {} fanned out to {} receiver(s)",
            id,
            identity,
            receivers.len()
        );

        // the sender's echo plus every live receiver; push_to skips
        // identities that are not currently reachable
        let mut targets = vec![identity];
        targets.extend(receivers);
        self.push_to(&targets, Outbound::Frame(out)).await;
    }

    /// Handle a delete request (owner-only)
    async fn handle_delete(&mut self, identity: SessionId, frame: Frame) {
        let target = match delete_target(&frame) {
            Some(target) => target,
            None => {
                self.push_error(&identity, BrokerError::MissingTarget).await;
                return;
            }
        };

        let audience = self.mailboxes.find_owned(&identity, &target).map(|record| {
            let mut audience = record.receivers.clone();
            audience.push(record.sender.clone());
            audience
        });

        match audience {
            Some(audience) => {
                if self.mailboxes.mark_removed(&target) {
                    info!("Message {} removed by {}", target, identity);
                    let notice =
                        Frame::removal_notice(&target, identity, audience.clone());
                    self.push_to(&audience, Outbound::Frame(notice)).await;
                }
            }
            None => {
                let err = if self.mailboxes.find_by_id(&target).is_some() {
                    BrokerError::NotOwner(target, identity.clone())
                } else {
                    BrokerError::MessageNotFound(target)
                };
                self.push_error(&identity, err).await;
            }
        }
    }

    /// Handle a voluntary exit; mailbox history is kept
    async fn handle_exit(&mut self, identity: SessionId) {
        if self.directory.remove(&identity).is_some() {
            info!("Session {} exited", identity);
            self.broadcast_presence().await;
        }
    }

    /// Rewrite every TEMPORARY record past its TTL and notify the
    /// original participants. A record already deleted by its owner is
    /// skipped (the earlier rewrite won).
    async fn handle_sweep(&mut self) {
        let now = Instant::now();
        for id in self.mailboxes.expired_ids(now) {
            let Some((sender, receivers)) = self
                .mailboxes
                .find_by_id(&id)
                .map(|record| (record.sender.clone(), record.receivers.clone()))
            else {
                continue;
            };

            if self.mailboxes.mark_expired(&id) {
                info!("Message {} expired", id);
                let mut audience = receivers;
                audience.push(sender);
                let notice = Frame::expiry_notice(&id, audience.clone());
                self.push_to(&audience, Outbound::Frame(notice)).await;
            }
        }
    }

    /// Push a frame to every live session in `targets`.
    ///
    /// A session whose channel is gone is removed from the directory and
    /// the rest of the fan-out continues; removals trigger a presence
    /// rebroadcast.
    async fn push_to(&mut self, targets: &[SessionId], out: Outbound) {
        let mut dead = Vec::new();
        for identity in targets {
            if let Some(session) = self.directory.get(identity) {
                if session.send(out.clone()).await.is_err() {
                    dead.push(identity.clone());
                }
            }
        }

        if !dead.is_empty() {
            for identity in &dead {
                warn!("Dropping unreachable session {}", identity);
                self.directory.remove(identity);
            }
            self.broadcast_presence().await;
        }
    }

    /// Send each live session its current roster (ACTIVE_CLIENT).
    ///
    /// Sessions found dead while broadcasting are removed and the
    /// broadcast restarts so every survivor sees the final roster.
    async fn broadcast_presence(&mut self) {
        loop {
            let mut dead = Vec::new();
            for session in self.directory.iter_live() {
                let roster = self.directory.list_active(&session.identity);
                if session
                    .send(Outbound::Frame(Frame::presence(roster)))
                    .await
                    .is_err()
                {
                    dead.push(session.identity.clone());
                }
            }

            if dead.is_empty() {
                break;
            }
            for identity in &dead {
                warn!("Dropping unreachable session {}", identity);
                self.directory.remove(identity);
            }
        }
    }

    /// Report an error to a single session; never broadcast
    async fn push_error(&mut self, identity: &SessionId, err: BrokerError) {
        debug!("Rejecting request from {}: {}", identity, err);
        self.push_to(std::slice::from_ref(identity), Outbound::Error(err.into()))
            .await;
    }
}

/// Which message a delete request refers to.
///
/// The token travels in `content`; older clients put it in `id`.
fn delete_target(frame: &Frame) -> Option<MessageId> {
    let token = frame.content.trim();
    if !token.is_empty() {
        return Some(MessageId(token.to_string()));
    }
    frame.id.clone()
}

/// Server-assigned wire timestamp
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
