// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Configuration Types
//!
//! Value objects describing the shape of a swarm: its [`Topology`], the
//! [`ConsensusProtocol`] used to gate hierarchical work, and the capacity bound
//! carried by [`SwarmConfig`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Logical shape of agent communication and authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    Hierarchical,
    #[default]
    Mesh,
    Adaptive,
    HierarchicalMesh,
}

impl Topology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topology::Hierarchical => "hierarchical",
            Topology::Mesh => "mesh",
            Topology::Adaptive => "adaptive",
            Topology::HierarchicalMesh => "hierarchical-mesh",
        }
    }

    /// Hierarchical topologies route every task through the consensus gate.
    pub fn requires_consensus(&self) -> bool {
        self.as_str().contains("hierarchical")
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topology {
    type Err = SwarmConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hierarchical" => Ok(Topology::Hierarchical),
            "mesh" => Ok(Topology::Mesh),
            "adaptive" => Ok(Topology::Adaptive),
            "hierarchical-mesh" => Ok(Topology::HierarchicalMesh),
            other => Err(SwarmConfigError::UnknownTopology(other.to_string())),
        }
    }
}

/// Consensus protocol selector. Opaque to the coordinator; only used to pick a
/// consensus manager implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusProtocol {
    #[default]
    Raft,
    Pbft,
    Gossip,
}

impl fmt::Display for ConsensusProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsensusProtocol::Raft => f.write_str("raft"),
            ConsensusProtocol::Pbft => f.write_str("pbft"),
            ConsensusProtocol::Gossip => f.write_str("gossip"),
        }
    }
}

/// Configuration handed to the coordinator at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwarmConfig {
    pub topology: Topology,
    pub max_agents: usize,
    pub consensus_protocol: ConsensusProtocol,
}

impl SwarmConfig {
    pub fn new(topology: Topology, max_agents: usize, consensus_protocol: ConsensusProtocol) -> Self {
        Self {
            topology,
            max_agents,
            consensus_protocol,
        }
    }

    pub fn validate(&self) -> Result<(), SwarmConfigError> {
        if self.max_agents == 0 {
            return Err(SwarmConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            topology: Topology::HierarchicalMesh,
            max_agents: 15,
            consensus_protocol: ConsensusProtocol::Raft,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SwarmConfigError {
    #[error("maxAgents must be a positive integer")]
    ZeroCapacity,

    #[error("Unknown topology: {0}")]
    UnknownTopology(String),
}
