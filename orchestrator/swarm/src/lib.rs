// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # `hive-swarm` - Swarm Coordination Engine
//!
//! The [`UnifiedCoordinator`](application::UnifiedCoordinator) runs a swarm: it
//! registers agents up to a capacity, tracks whether each one is idle, busy or
//! offline, gates hierarchical work behind consensus, splits tasks into
//! per-agent assignments, and records every transition as a domain event.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `AgentRegistry`, `Proposal` |
//! | [`application`] | Application | `UnifiedCoordinator`, collaborator ports |
//! | [`infrastructure`] | Infrastructure | `InProcessChannel`, distributors, consensus managers, `EventBus` publisher |
//!
//! ## Collaborators
//!
//! Distribution, consensus, messaging and event publishing are injected as
//! `Arc<dyn …>` trait objects. The in-process implementations here are enough
//! to run a whole swarm inside one process; anything that speaks the port
//! traits can replace them.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{CompletionPolicy, CoordinatorError, Lifecycle, UnifiedCoordinator};
pub use domain::*;
