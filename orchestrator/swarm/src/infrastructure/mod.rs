// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0
//! In-process implementations of the coordinator ports.

pub mod channel;
pub mod consensus;
pub mod distributor;
pub mod publisher;

pub use channel::{AgentEndpoint, ChannelError, InProcessChannel, Reporter};
pub use consensus::{
    consensus_for, ProposalVoter, QuorumConsensus, StaticConsensus, StaticVoter,
};
pub use distributor::{
    distributor_for, rebalance_evenly, FanOutDistributor, HighestPriorityDistributor,
    RoundRobinDistributor,
};
