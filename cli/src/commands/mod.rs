// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Hive CLI

pub mod config;
pub mod swarm;

pub use self::config::ConfigCommand;
pub use self::swarm::SwarmCommand;
