// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::agent::AgentId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(format!("task-{}", Uuid::new_v4()))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A unit of work submitted to the swarm. The payload is opaque to the
/// coordinator and is forwarded to distributors and agents untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinationTask {
    pub id: TaskId,

    #[serde(rename = "type")]
    pub task_type: String,

    #[serde(default)]
    pub payload: Value,

    /// Empty means any agent qualifies.
    #[serde(default)]
    pub required_capabilities: BTreeSet<String>,

    #[serde(default)]
    pub priority: i32,
}

impl CoordinationTask {
    pub fn new(id: impl Into<TaskId>, task_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            task_type: task_type.into(),
            payload: Value::Object(Default::default()),
            required_capabilities: BTreeSet::new(),
            priority: 50,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn requiring<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Binding of one agent to one (sub)task, produced by a task distributor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssignment {
    pub agent_id: AgentId,
    pub task_id: TaskId,
    #[serde(default)]
    pub subtask: Value,
}

impl TaskAssignment {
    pub fn new(agent_id: AgentId, task_id: TaskId, subtask: Value) -> Self {
        Self {
            agent_id,
            task_id,
            subtask,
        }
    }
}

/// Outcome reported for a single agent's share of a coordination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub agent_id: AgentId,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResult {
    pub fn succeeded(agent_id: AgentId, output: Option<Value>) -> Self {
        Self {
            agent_id,
            success: true,
            output,
            error: None,
        }
    }

    pub fn failed(agent_id: AgentId, error: impl Into<String>) -> Self {
        Self {
            agent_id,
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinationResult {
    pub task_id: TaskId,
    pub success: bool,
    pub results: Vec<TaskResult>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    pub participating_agents: Vec<AgentId>,
}

/// Durations cross the wire as integer milliseconds.
pub mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_wire_shape() {
        let task = CoordinationTask::new("task-1", "implementation")
            .requiring(["coding"])
            .with_payload(json!({"file": "lib.rs"}));

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["id"], "task-1");
        assert_eq!(value["type"], "implementation");
        assert_eq!(value["requiredCapabilities"], json!(["coding"]));
        assert_eq!(value["payload"]["file"], "lib.rs");
    }

    #[test]
    fn test_coordination_result_duration_in_millis() {
        let result = CoordinationResult {
            task_id: TaskId::new("task-1"),
            success: true,
            results: vec![TaskResult::succeeded(AgentId::new("agent-1"), None)],
            duration: Duration::from_millis(42),
            participating_agents: vec![AgentId::new("agent-1")],
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["duration"], 42);
        assert_eq!(value["participatingAgents"], json!(["agent-1"]));
        assert!(value["results"][0].get("error").is_none());
    }
}
