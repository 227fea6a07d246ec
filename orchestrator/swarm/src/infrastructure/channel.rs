// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0
//! In-Process Communication Channel
//!
//! Delivers swarm messages between a coordinator and agents living in the same
//! process.
//!
//! - Each connected agent owns an unbounded mailbox for messages addressed to it.
//! - Broadcasts go out on a tokio broadcast topic; agents that fall behind lose
//!   the oldest broadcasts, not their direct assignments.
//! - Agents post messages back through a [`Reporter`], which fans them out to
//!   every subscribed inbox.

use crate::application::ports::{CommunicationChannel, MessageInbox};
use async_trait::async_trait;
use dashmap::DashMap;
use hive_core::domain::agent::{AgentId, AgentStatus};
use hive_core::domain::message::SwarmMessage;
use hive_core::domain::task::{TaskId, TaskResult};
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace};

const DEFAULT_BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Agent {0} is not connected to the channel")]
    UnknownRecipient(AgentId),

    #[error("Mailbox for agent {0} is closed")]
    MailboxClosed(AgentId),
}

type Subscribers = Arc<RwLock<Vec<MessageInbox>>>;

fn deliver(subscribers: &Subscribers, message: SwarmMessage) -> usize {
    let mut inboxes = subscribers.write();
    inboxes.retain(|inbox| !inbox.is_closed());
    for inbox in inboxes.iter() {
        // closed between retain and send; dropped on the next delivery
        let _ = inbox.send(message.clone());
    }
    inboxes.len()
}

pub struct InProcessChannel {
    mailboxes: DashMap<AgentId, mpsc::UnboundedSender<SwarmMessage>>,
    topic: broadcast::Sender<SwarmMessage>,
    subscribers: Subscribers,
}

impl InProcessChannel {
    pub fn new(broadcast_capacity: usize) -> Self {
        let (topic, _) = broadcast::channel(broadcast_capacity);
        Self {
            mailboxes: DashMap::new(),
            topic,
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Attach an agent. Reconnecting replaces the previous mailbox.
    pub fn connect(&self, agent_id: AgentId) -> AgentEndpoint {
        let (tx, mailbox) = mpsc::unbounded_channel();
        if self.mailboxes.insert(agent_id.clone(), tx).is_some() {
            debug!(agent_id = %agent_id, "Agent reconnected; previous mailbox dropped");
        }

        AgentEndpoint {
            reporter: Reporter {
                agent_id: agent_id.clone(),
                subscribers: self.subscribers.clone(),
            },
            agent_id,
            mailbox,
            broadcasts: self.topic.subscribe(),
        }
    }

    pub fn disconnect(&self, agent_id: &AgentId) -> bool {
        self.mailboxes.remove(agent_id).is_some()
    }

    pub fn is_connected(&self, agent_id: &AgentId) -> bool {
        self.mailboxes.contains_key(agent_id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Reporter not bound to a connected agent, for posting on an agent's behalf.
    pub fn reporter(&self, agent_id: AgentId) -> Reporter {
        Reporter {
            agent_id,
            subscribers: self.subscribers.clone(),
        }
    }
}

impl Default for InProcessChannel {
    fn default() -> Self {
        Self::new(DEFAULT_BROADCAST_CAPACITY)
    }
}

#[async_trait]
impl CommunicationChannel for InProcessChannel {
    async fn broadcast(&self, message: SwarmMessage) -> anyhow::Result<()> {
        // Err only means nobody is listening
        let listeners = self.topic.send(message).unwrap_or(0);
        trace!(listeners, "Broadcast published");
        Ok(())
    }

    async fn send(&self, agent_id: &AgentId, message: SwarmMessage) -> anyhow::Result<()> {
        let mailbox = self
            .mailboxes
            .get(agent_id)
            .ok_or_else(|| ChannelError::UnknownRecipient(agent_id.clone()))?;
        mailbox
            .send(message)
            .map_err(|_| ChannelError::MailboxClosed(agent_id.clone()))?;
        Ok(())
    }

    fn subscribe(&self, inbox: MessageInbox) {
        self.subscribers.write().push(inbox);
    }
}

/// The agent side of an [`InProcessChannel`] connection.
pub struct AgentEndpoint {
    pub agent_id: AgentId,
    pub mailbox: mpsc::UnboundedReceiver<SwarmMessage>,
    pub broadcasts: broadcast::Receiver<SwarmMessage>,
    pub reporter: Reporter,
}

/// Posts agent-originated messages to every subscribed inbox.
#[derive(Clone)]
pub struct Reporter {
    agent_id: AgentId,
    subscribers: Subscribers,
}

impl Reporter {
    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Returns how many inboxes received the message.
    pub fn report(&self, message: SwarmMessage) -> usize {
        deliver(&self.subscribers, message)
    }

    pub fn report_status(&self, status: AgentStatus) -> usize {
        self.report(SwarmMessage::status_update(&self.agent_id, status))
    }

    pub fn report_completion(&self, task_id: &TaskId, result: &TaskResult) -> usize {
        self.report(SwarmMessage::task_completed(task_id, result))
    }
}
