// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::agent::{AgentId, AgentType};
use crate::domain::swarm::Topology;
use crate::domain::task::{duration_millis, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Swarm state transitions recorded in the event trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all_fields = "camelCase")]
pub enum SwarmEvent {
    CoordinatorInitialized {
        topology: Topology,
        max_agents: usize,
    },
    AgentAddedToSwarm {
        agent_id: AgentId,
        agent_type: AgentType,
    },
    AgentRemovedFromSwarm {
        agent_id: AgentId,
    },
    TaskCoordinationCompleted {
        task_id: TaskId,
        #[serde(with = "duration_millis")]
        duration: Duration,
        participating_agents: Vec<AgentId>,
    },
    CoordinatorShutdown {},
}

impl SwarmEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            SwarmEvent::CoordinatorInitialized { .. } => "CoordinatorInitialized",
            SwarmEvent::AgentAddedToSwarm { .. } => "AgentAddedToSwarm",
            SwarmEvent::AgentRemovedFromSwarm { .. } => "AgentRemovedFromSwarm",
            SwarmEvent::TaskCoordinationCompleted { .. } => "TaskCoordinationCompleted",
            SwarmEvent::CoordinatorShutdown {} => "CoordinatorShutdown",
        }
    }
}

/// A timestamped [`SwarmEvent`] as handed to an event publisher.
///
/// Serializes flat: `{"type": ..., "payload": ..., "timestamp": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    #[serde(flatten)]
    pub event: SwarmEvent,
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    pub fn now(event: SwarmEvent) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}

impl From<SwarmEvent> for DomainEvent {
    fn from(event: SwarmEvent) -> Self {
        Self::now(event)
    }
}
