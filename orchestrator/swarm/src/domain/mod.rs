// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Domain Layer
//!
//! Pure coordination state. No I/O dependencies.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`registry`] | `AgentRegistry`, `RegistryError` |
//! | [`proposal`] | `Proposal`, `ProposalKind` |

pub mod proposal;
pub mod registry;

pub use proposal::*;
pub use registry::*;
