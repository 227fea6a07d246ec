// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Swarm messages exchanged between the coordinator and agents over a
//! communication channel.

use crate::domain::agent::{AgentId, AgentStatus, AgentType};
use crate::domain::task::{TaskAssignment, TaskId, TaskResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Sender id used by the coordinator on every outbound message.
pub const COORDINATOR_ID: &str = "coordinator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    AgentJoined,
    AgentLeft,
    TaskAssigned,
    TaskCompleted,
    AgentStatusUpdate,
    CoordinatorShutdown,
    /// Any tag this build does not know about.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recipient {
    Broadcast,
    #[serde(untagged)]
    Agent(AgentId),
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Broadcast => f.write_str("broadcast"),
            Recipient::Agent(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub payload: Value,
    pub from: String,
    pub to: Recipient,
}

impl SwarmMessage {
    pub fn new(kind: MessageKind, payload: Value, from: impl Into<String>, to: Recipient) -> Self {
        Self {
            kind,
            payload,
            from: from.into(),
            to,
        }
    }

    pub fn agent_joined(agent_id: &AgentId, agent_type: AgentType) -> Self {
        Self::new(
            MessageKind::AgentJoined,
            json!({ "agentId": agent_id, "type": agent_type }),
            COORDINATOR_ID,
            Recipient::Broadcast,
        )
    }

    pub fn agent_left(agent_id: &AgentId) -> Self {
        Self::new(
            MessageKind::AgentLeft,
            json!({ "agentId": agent_id }),
            COORDINATOR_ID,
            Recipient::Broadcast,
        )
    }

    pub fn coordinator_shutdown() -> Self {
        Self::new(
            MessageKind::CoordinatorShutdown,
            json!({}),
            COORDINATOR_ID,
            Recipient::Broadcast,
        )
    }

    pub fn task_assigned(assignment: &TaskAssignment) -> Self {
        Self::new(
            MessageKind::TaskAssigned,
            serde_json::to_value(assignment).unwrap_or(Value::Null),
            COORDINATOR_ID,
            Recipient::Agent(assignment.agent_id.clone()),
        )
    }

    /// Status report an agent sends about itself.
    pub fn status_update(agent_id: &AgentId, status: AgentStatus) -> Self {
        Self::new(
            MessageKind::AgentStatusUpdate,
            json!({ "agentId": agent_id, "status": status }),
            agent_id.as_str(),
            Recipient::Agent(AgentId::new(COORDINATOR_ID)),
        )
    }

    /// Completion report an agent sends after executing its assignment.
    pub fn task_completed(task_id: &TaskId, result: &TaskResult) -> Self {
        let report = CompletionReport {
            task_id: task_id.clone(),
            agent_id: result.agent_id.clone(),
            success: result.success,
            output: result.output.clone(),
            error: result.error.clone(),
        };
        Self::new(
            MessageKind::TaskCompleted,
            serde_json::to_value(&report).unwrap_or(Value::Null),
            result.agent_id.as_str(),
            Recipient::Agent(AgentId::new(COORDINATOR_ID)),
        )
    }

    pub fn is_broadcast(&self) -> bool {
        matches!(self.to, Recipient::Broadcast)
    }
}

/// Payload of an `AgentStatusUpdate` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub agent_id: AgentId,
    pub status: AgentStatus,
}

/// Payload of a `TaskCompleted` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    pub task_id: TaskId,
    pub agent_id: AgentId,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompletionReport {
    pub fn into_result(self) -> TaskResult {
        TaskResult {
            agent_id: self.agent_id,
            success: self.success,
            output: self.output,
            error: self.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_message_type_is_tolerated() {
        let message: SwarmMessage = serde_json::from_value(json!({
            "type": "Heartbeat",
            "payload": {},
            "from": "agent-1",
            "to": "broadcast"
        }))
        .unwrap();

        assert_eq!(message.kind, MessageKind::Unknown);
        assert!(message.is_broadcast());
    }

    #[test]
    fn test_recipient_wire_format() {
        assert_eq!(serde_json::to_value(Recipient::Broadcast).unwrap(), json!("broadcast"));
        assert_eq!(
            serde_json::to_value(Recipient::Agent(AgentId::new("agent-1"))).unwrap(),
            json!("agent-1")
        );

        let parsed: Recipient = serde_json::from_value(json!("agent-2")).unwrap();
        assert_eq!(parsed, Recipient::Agent(AgentId::new("agent-2")));
    }

    #[test]
    fn test_status_update_payload_parses() {
        let message = SwarmMessage::status_update(&AgentId::new("agent-1"), AgentStatus::Offline);
        let update: StatusUpdate = serde_json::from_value(message.payload).unwrap();
        assert_eq!(update.status, AgentStatus::Offline);
        assert_eq!(update.agent_id, AgentId::new("agent-1"));
    }

    #[test]
    fn test_task_assigned_carries_assignment() {
        let assignment = TaskAssignment::new(
            AgentId::new("agent-1"),
            TaskId::new("task-1"),
            json!({"part": 1}),
        );
        let message = SwarmMessage::task_assigned(&assignment);

        assert_eq!(message.kind, MessageKind::TaskAssigned);
        assert_eq!(message.from, COORDINATOR_ID);
        assert_eq!(message.to, Recipient::Agent(AgentId::new("agent-1")));
        assert_eq!(message.payload["subtask"]["part"], 1);
    }
}
