// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Opaque agent identity. Callers choose the string; [`AgentId::generate`]
/// is available when they do not care.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(format!("agent-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AgentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Role an agent plays in the swarm.
///
/// The fifteen roles of the reference swarm layout plus the generic worker
/// roles used by smaller swarms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentType {
    QueenCoordinator,
    SecurityArchitect,
    SecurityAuditor,
    MemorySpecialist,
    SwarmSpecialist,
    IntegrationArchitect,
    PerformanceEngineer,
    CoreArchitect,
    TestArchitect,
    ProjectCoordinator,
    Coder,
    Reviewer,
    Tester,
    Planner,
    Researcher,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::QueenCoordinator => "queen-coordinator",
            AgentType::SecurityArchitect => "security-architect",
            AgentType::SecurityAuditor => "security-auditor",
            AgentType::MemorySpecialist => "memory-specialist",
            AgentType::SwarmSpecialist => "swarm-specialist",
            AgentType::IntegrationArchitect => "integration-architect",
            AgentType::PerformanceEngineer => "performance-engineer",
            AgentType::CoreArchitect => "core-architect",
            AgentType::TestArchitect => "test-architect",
            AgentType::ProjectCoordinator => "project-coordinator",
            AgentType::Coder => "coder",
            AgentType::Reviewer => "reviewer",
            AgentType::Tester => "tester",
            AgentType::Planner => "planner",
            AgentType::Researcher => "researcher",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability of a registered agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Busy,
    Offline,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Idle => f.write_str("idle"),
            AgentStatus::Busy => f.write_str("busy"),
            AgentStatus::Offline => f.write_str("offline"),
        }
    }
}

/// An agent as registered with the swarm. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub id: AgentId,

    #[serde(rename = "type")]
    pub agent_type: AgentType,

    #[serde(default)]
    pub capabilities: BTreeSet<String>,

    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    50
}

impl AgentDescriptor {
    pub fn new(id: impl Into<AgentId>, agent_type: AgentType) -> Self {
        Self {
            id: id.into(),
            agent_type,
            capabilities: BTreeSet::new(),
            priority: default_priority(),
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// True when every required capability is present. An empty requirement
    /// set matches any agent.
    pub fn satisfies(&self, required: &BTreeSet<String>) -> bool {
        required.is_empty() || required.is_subset(&self.capabilities)
    }
}
