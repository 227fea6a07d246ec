// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Application layer: the coordinator use cases and the ports they depend on.

pub mod coordinator;
pub mod ports;

pub use coordinator::{
    CompletionPolicy, CoordinatorError, Lifecycle, UnifiedCoordinator, REPORT_TIMEOUT_ERROR,
};
pub use ports::{
    CommunicationChannel, ConsensusManager, EventPublisher, MessageInbox, TaskDistributor,
};
