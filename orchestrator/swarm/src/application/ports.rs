// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Coordinator Collaborator Ports
//!
//! Capability interfaces the [`UnifiedCoordinator`](super::coordinator::UnifiedCoordinator)
//! consumes. Implementations are injected at construction; the coordinator's
//! correctness must not depend on which one is plugged in.
//!
//! | Trait | Contract |
//! |-------|----------|
//! | [`TaskDistributor`] | task + candidates → assignments |
//! | [`ConsensusManager`] | proposal → approved?, leader identity |
//! | [`CommunicationChannel`] | send, broadcast, inbound subscription |
//! | [`EventPublisher`] | ordered, acknowledged event sink |
//!
//! Collaborator failures are returned as `anyhow::Error` and propagated to the
//! caller without retries.

use crate::domain::proposal::Proposal;
use anyhow::Result;
use async_trait::async_trait;
use hive_core::domain::agent::{AgentDescriptor, AgentId};
use hive_core::domain::events::DomainEvent;
use hive_core::domain::message::SwarmMessage;
use hive_core::domain::task::{CoordinationTask, TaskAssignment};
use tokio::sync::mpsc;

/// Inbound side of a communication channel: the channel pushes every message
/// addressed to the coordinator into this sender.
pub type MessageInbox = mpsc::UnboundedSender<SwarmMessage>;

#[async_trait]
pub trait TaskDistributor: Send + Sync {
    /// Map a task onto some or all of the candidates. Candidates arrive sorted
    /// by priority, highest first, and are never empty.
    async fn distribute(
        &self,
        task: &CoordinationTask,
        candidates: &[AgentDescriptor],
    ) -> Result<Vec<TaskAssignment>>;

    /// Re-derive assignments for live reallocation of a long-running task.
    async fn rebalance(&self, assignments: Vec<TaskAssignment>) -> Result<Vec<TaskAssignment>>;
}

#[async_trait]
pub trait ConsensusManager: Send + Sync {
    async fn propose(&self, proposal: Proposal) -> Result<bool>;

    fn leader(&self) -> Option<AgentId>;

    fn is_leader(&self, agent_id: &AgentId) -> bool;
}

#[async_trait]
pub trait CommunicationChannel: Send + Sync {
    async fn broadcast(&self, message: SwarmMessage) -> Result<()>;

    async fn send(&self, agent_id: &AgentId, message: SwarmMessage) -> Result<()>;

    /// Register the inbox that receives inbound messages. Fan-out to several
    /// subscribers is the channel's business.
    fn subscribe(&self, inbox: MessageInbox);
}

/// Event sink. Events published by one coordinator must be observed by
/// consumers in publish-call order.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: DomainEvent) -> Result<()>;
}
