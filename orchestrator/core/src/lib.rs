// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # `hive-core` - Swarm Domain Primitives
//!
//! Shared vocabulary for the Hive swarm orchestrator: agent descriptors and
//! availability, swarm configuration, coordination tasks and results, swarm
//! messages, domain events, and the in-process [`infrastructure::event_bus::EventBus`]
//! that records the ordered event trail.
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `AgentDescriptor`, `SwarmConfig`, `CoordinationTask`, `SwarmMessage`, `DomainEvent`, `SwarmManifest` |
//! | [`infrastructure`] | Infrastructure | `EventBus`, `EventLog` |

pub mod domain;
pub mod infrastructure;

pub use domain::*;
