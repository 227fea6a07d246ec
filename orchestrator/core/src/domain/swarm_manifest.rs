// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0

// Swarm Configuration Manifest
//
// Kubernetes-style YAML document (apiVersion/kind/metadata/spec) describing a
// swarm: topology, capacity, consensus protocol, distribution strategy,
// completion policy and the agents to register at startup.

use crate::domain::agent::AgentDescriptor;
use crate::domain::swarm::{ConsensusProtocol, SwarmConfig, Topology};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_VERSION: &str = "hive.dev/v1";
pub const KIND: &str = "SwarmConfig";

/// Top-level swarm configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmManifest {
    /// API version (must be "hive.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "SwarmConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: SwarmSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable swarm name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Swarm specification (content under spec:)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwarmSpec {
    #[serde(default = "default_topology")]
    pub topology: Topology,

    #[serde(default = "default_max_agents")]
    pub max_agents: usize,

    #[serde(default)]
    pub consensus_protocol: ConsensusProtocol,

    #[serde(default)]
    pub distribution: DistributionStrategy,

    #[serde(default)]
    pub completion: CompletionSettings,

    /// Agents registered when the swarm starts
    #[serde(default)]
    pub agents: Vec<AgentDescriptor>,
}

/// Which reference task distributor to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DistributionStrategy {
    #[default]
    HighestPriority,
    FanOut,
    RoundRobin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionMode {
    /// Results are synthesized once assignments are sent
    #[default]
    Immediate,
    /// Results come from agents' TaskCompleted reports
    AwaitReports,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSettings {
    #[serde(default)]
    pub mode: CompletionMode,

    #[serde(default = "default_completion_timeout")]
    pub timeout_seconds: u64,
}

impl CompletionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            mode: CompletionMode::Immediate,
            timeout_seconds: default_completion_timeout(),
        }
    }
}

fn default_topology() -> Topology {
    Topology::HierarchicalMesh
}

fn default_max_agents() -> usize {
    15
}

fn default_completion_timeout() -> u64 {
    30
}

impl Default for SwarmSpec {
    fn default() -> Self {
        Self {
            topology: default_topology(),
            max_agents: default_max_agents(),
            consensus_protocol: ConsensusProtocol::Raft,
            distribution: DistributionStrategy::default(),
            completion: CompletionSettings::default(),
            agents: Vec::new(),
        }
    }
}

impl Default for SwarmManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "default-swarm".to_string(),
                labels: None,
            },
            spec: SwarmSpec::default(),
        }
    }
}

impl SwarmManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. HIVE_CONFIG_PATH environment variable
    /// 2. ./hive-swarm.yaml (working directory)
    /// 3. ~/.hive/swarm.yaml (user home)
    /// 4. /etc/hive/swarm.yaml (Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("HIVE_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./hive-swarm.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".hive").join("swarm.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/hive/swarm.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading swarm configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load swarm config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading swarm configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No swarm configuration found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HIVE_MAX_AGENTS") {
            match val.trim().parse::<usize>() {
                Ok(max) if max > 0 => {
                    tracing::info!("Environment override: HIVE_MAX_AGENTS={}", max);
                    self.spec.max_agents = max;
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for HIVE_MAX_AGENTS: '{}'. Expected a positive integer. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("HIVE_TOPOLOGY") {
            match val.parse::<Topology>() {
                Ok(topology) => {
                    tracing::info!("Environment override: HIVE_TOPOLOGY={}", topology);
                    self.spec.topology = topology;
                }
                Err(e) => {
                    tracing::warn!("Invalid value for HIVE_TOPOLOGY: {}. Ignoring.", e);
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        self.swarm_config().validate()?;

        if self.spec.agents.len() > self.spec.max_agents {
            anyhow::bail!(
                "spec.agents declares {} agents but maxAgents is {}",
                self.spec.agents.len(),
                self.spec.max_agents
            );
        }

        let mut seen = HashSet::new();
        for agent in &self.spec.agents {
            if agent.id.as_str().is_empty() {
                anyhow::bail!("Agent id cannot be empty");
            }
            if !seen.insert(agent.id.clone()) {
                anyhow::bail!("Duplicate agent id: {}", agent.id);
            }
        }

        if self.spec.completion.mode == CompletionMode::AwaitReports
            && self.spec.completion.timeout_seconds == 0
        {
            anyhow::bail!("spec.completion.timeoutSeconds must be positive in await-reports mode");
        }

        Ok(())
    }

    /// The coordinator-facing subset of the manifest
    pub fn swarm_config(&self) -> SwarmConfig {
        SwarmConfig::new(
            self.spec.topology,
            self.spec.max_agents,
            self.spec.consensus_protocol,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{AgentId, AgentType};

    const SAMPLE: &str = r#"
apiVersion: hive.dev/v1
kind: SwarmConfig
metadata:
  name: review-swarm
spec:
  topology: hierarchical-mesh
  maxAgents: 15
  consensusProtocol: raft
  distribution: fan-out
  completion:
    mode: await-reports
    timeoutSeconds: 5
  agents:
    - id: agent-1
      type: coder
      capabilities: [coding, debugging]
      priority: 50
    - id: agent-2
      type: tester
      capabilities: [testing]
      priority: 60
"#;

    #[test]
    fn test_default_manifest() {
        let manifest = SwarmManifest::default();
        assert_eq!(manifest.api_version, API_VERSION);
        assert_eq!(manifest.kind, KIND);
        assert_eq!(manifest.spec.max_agents, 15);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_parse_sample() {
        let manifest = SwarmManifest::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(manifest.metadata.name, "review-swarm");
        assert_eq!(manifest.spec.topology, Topology::HierarchicalMesh);
        assert_eq!(manifest.spec.distribution, DistributionStrategy::FanOut);
        assert_eq!(manifest.spec.completion.mode, CompletionMode::AwaitReports);
        assert_eq!(manifest.spec.completion.timeout(), Duration::from_secs(5));
        assert_eq!(manifest.spec.agents.len(), 2);
        assert_eq!(manifest.spec.agents[1].agent_type, AgentType::Tester);
        assert_eq!(manifest.spec.agents[1].priority, 60);
        assert!(manifest.validate().is_ok());

        let config = manifest.swarm_config();
        assert_eq!(config.max_agents, 15);
        assert_eq!(config.consensus_protocol, ConsensusProtocol::Raft);
    }

    // Serializes tests that read or write the HIVE_* override variables.
    static ENV_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

    #[test]
    fn test_omitted_fields_match_default_manifest() {
        let manifest = SwarmManifest::from_yaml_str(
            "apiVersion: hive.dev/v1\nkind: SwarmConfig\nmetadata:\n  name: bare\nspec: {}\n",
        )
        .unwrap();
        let defaults = SwarmSpec::default();

        assert_eq!(manifest.spec.topology, defaults.topology);
        assert_eq!(manifest.spec.topology, Topology::HierarchicalMesh);
        assert_eq!(manifest.spec.max_agents, defaults.max_agents);
        assert_eq!(manifest.spec.consensus_protocol, defaults.consensus_protocol);
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let _env = ENV_LOCK.lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swarm.yaml");

        let manifest = SwarmManifest::from_yaml_str(SAMPLE).unwrap();
        manifest.to_yaml_file(&path).unwrap();

        let loaded = SwarmManifest::load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.metadata.name, "review-swarm");
        assert_eq!(loaded.spec.agents.len(), 2);
        assert_eq!(loaded.spec.max_agents, 15);
        assert_eq!(loaded.spec.topology, Topology::HierarchicalMesh);
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let _env = ENV_LOCK.lock();
        let dir = tempfile::tempdir().unwrap();
        let result = SwarmManifest::load_or_default(Some(dir.path().join("missing.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_validation() {
        let mut manifest = SwarmManifest::default();
        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());

        let mut manifest = SwarmManifest::default();
        manifest.spec.max_agents = 0;
        assert!(manifest.validate().is_err());

        let mut manifest = SwarmManifest::default();
        manifest.spec.max_agents = 1;
        manifest.spec.agents = vec![
            AgentDescriptor::new("agent-1", AgentType::Coder),
            AgentDescriptor::new("agent-2", AgentType::Coder),
        ];
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("maxAgents"));

        let mut manifest = SwarmManifest::default();
        manifest.spec.agents = vec![
            AgentDescriptor::new("agent-1", AgentType::Coder),
            AgentDescriptor::new(AgentId::new("agent-1"), AgentType::Tester),
        ];
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate agent id"));

        let mut manifest = SwarmManifest::default();
        manifest.spec.completion = CompletionSettings {
            mode: CompletionMode::AwaitReports,
            timeout_seconds: 0,
        };
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let _env = ENV_LOCK.lock();
        std::env::set_var("HIVE_MAX_AGENTS", "7");
        std::env::set_var("HIVE_TOPOLOGY", "mesh");
        let mut manifest = SwarmManifest::default();
        manifest.apply_env_overrides();
        assert_eq!(manifest.spec.max_agents, 7);
        assert_eq!(manifest.spec.topology, Topology::Mesh);

        std::env::set_var("HIVE_MAX_AGENTS", "zero");
        std::env::set_var("HIVE_TOPOLOGY", "ring");
        let mut manifest = SwarmManifest::default();
        manifest.apply_env_overrides();
        assert_eq!(manifest.spec.max_agents, 15);
        assert_eq!(manifest.spec.topology, Topology::HierarchicalMesh);

        std::env::remove_var("HIVE_MAX_AGENTS");
        std::env::remove_var("HIVE_TOPOLOGY");
    }
}
