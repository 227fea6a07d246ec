// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Domain Layer
//!
//! Pure domain types. No I/O apart from manifest file loading.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`agent`] | `AgentId`, `AgentType`, `AgentStatus`, `AgentDescriptor` |
//! | [`swarm`] | `Topology`, `ConsensusProtocol`, `SwarmConfig` |
//! | [`task`] | `CoordinationTask`, `TaskAssignment`, `TaskResult`, `CoordinationResult` |
//! | [`message`] | `SwarmMessage`, `MessageKind`, `Recipient` |
//! | [`events`] | `SwarmEvent`, `DomainEvent` |
//! | [`swarm_manifest`] | `SwarmManifest` (YAML configuration) |

pub mod agent;
pub mod events;
pub mod message;
pub mod swarm;
pub mod swarm_manifest;
pub mod task;
