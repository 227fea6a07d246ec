// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Consensus Managers
//!
//! [`StaticConsensus`] returns a fixed verdict and suits single-node swarms and
//! tests. [`QuorumConsensus`] polls a set of [`ProposalVoter`]s concurrently and
//! approves when the protocol's quorum is met:
//!
//! | Protocol | Quorum | Leader |
//! |----------|--------|--------|
//! | raft | `n/2 + 1` | first voter |
//! | pbft | `2f + 1`, `f = (n-1)/3` | voter at `view % n` |
//! | gossip | `n/2 + 1` | none |
//!
//! A voter that fails counts as a rejection. With no voters nothing is approved.

use crate::application::ports::ConsensusManager;
use crate::domain::proposal::Proposal;
use async_trait::async_trait;
use futures::future::join_all;
use hive_core::domain::agent::AgentId;
use hive_core::domain::swarm::ConsensusProtocol;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

#[async_trait]
pub trait ProposalVoter: Send + Sync {
    fn voter_id(&self) -> &AgentId;

    async fn vote(&self, proposal: &Proposal) -> anyhow::Result<bool>;
}

/// Voter with a fixed answer.
#[derive(Debug, Clone)]
pub struct StaticVoter {
    id: AgentId,
    approve: bool,
}

impl StaticVoter {
    pub fn new(id: impl Into<AgentId>, approve: bool) -> Self {
        Self {
            id: id.into(),
            approve,
        }
    }
}

#[async_trait]
impl ProposalVoter for StaticVoter {
    fn voter_id(&self) -> &AgentId {
        &self.id
    }

    async fn vote(&self, _proposal: &Proposal) -> anyhow::Result<bool> {
        Ok(self.approve)
    }
}

/// Build the consensus manager for `protocol` over `voters`. Without voters the
/// swarm approves everything on its own.
pub fn consensus_for(
    protocol: ConsensusProtocol,
    voters: Vec<Arc<dyn ProposalVoter>>,
) -> Arc<dyn ConsensusManager> {
    if voters.is_empty() {
        return Arc::new(StaticConsensus::approving());
    }
    Arc::new(QuorumConsensus::new(protocol, voters))
}

#[derive(Debug, Clone, Default)]
pub struct StaticConsensus {
    approve: bool,
    leader: Option<AgentId>,
}

impl StaticConsensus {
    pub fn approving() -> Self {
        Self {
            approve: true,
            leader: None,
        }
    }

    pub fn rejecting() -> Self {
        Self {
            approve: false,
            leader: None,
        }
    }

    pub fn with_leader(mut self, leader: impl Into<AgentId>) -> Self {
        self.leader = Some(leader.into());
        self
    }
}

#[async_trait]
impl ConsensusManager for StaticConsensus {
    async fn propose(&self, proposal: Proposal) -> anyhow::Result<bool> {
        debug!(task_id = %proposal.payload.id, approved = self.approve, "Static consensus verdict");
        Ok(self.approve)
    }

    fn leader(&self) -> Option<AgentId> {
        self.leader.clone()
    }

    fn is_leader(&self, agent_id: &AgentId) -> bool {
        self.leader.as_ref() == Some(agent_id)
    }
}

pub struct QuorumConsensus {
    protocol: ConsensusProtocol,
    voters: Vec<Arc<dyn ProposalVoter>>,
    /// pbft view number; advances whenever a round misses quorum
    view: AtomicU64,
}

impl QuorumConsensus {
    pub fn new(protocol: ConsensusProtocol, voters: Vec<Arc<dyn ProposalVoter>>) -> Self {
        Self {
            protocol,
            voters,
            view: AtomicU64::new(0),
        }
    }

    pub fn protocol(&self) -> ConsensusProtocol {
        self.protocol
    }

    pub fn view(&self) -> u64 {
        self.view.load(Ordering::Acquire)
    }

    /// Approvals needed for the current voter count.
    pub fn quorum(&self) -> usize {
        let n = self.voters.len();
        match self.protocol {
            ConsensusProtocol::Raft | ConsensusProtocol::Gossip => n / 2 + 1,
            ConsensusProtocol::Pbft => {
                let f = n.saturating_sub(1) / 3;
                2 * f + 1
            }
        }
    }
}

#[async_trait]
impl ConsensusManager for QuorumConsensus {
    async fn propose(&self, proposal: Proposal) -> anyhow::Result<bool> {
        if self.voters.is_empty() {
            warn!(protocol = %self.protocol, "Proposal rejected: no voters");
            return Ok(false);
        }

        let ballots = join_all(self.voters.iter().map(|voter| {
            let proposal = &proposal;
            async move {
                match voter.vote(proposal).await {
                    Ok(approve) => approve,
                    Err(e) => {
                        warn!(voter = %voter.voter_id(), error = %e, "Voter failed; counted as rejection");
                        false
                    }
                }
            }
        }))
        .await;

        let approvals = ballots.into_iter().filter(|approve| *approve).count();
        let quorum = self.quorum();
        let approved = approvals >= quorum;

        if !approved && self.protocol == ConsensusProtocol::Pbft {
            self.view.fetch_add(1, Ordering::AcqRel);
        }

        debug!(
            protocol = %self.protocol,
            task_id = %proposal.payload.id,
            approvals,
            quorum,
            approved,
            "Consensus round finished"
        );
        Ok(approved)
    }

    fn leader(&self) -> Option<AgentId> {
        if self.voters.is_empty() {
            return None;
        }
        match self.protocol {
            ConsensusProtocol::Raft => Some(self.voters[0].voter_id().clone()),
            ConsensusProtocol::Pbft => {
                let primary = (self.view() % self.voters.len() as u64) as usize;
                Some(self.voters[primary].voter_id().clone())
            }
            ConsensusProtocol::Gossip => None,
        }
    }

    fn is_leader(&self, agent_id: &AgentId) -> bool {
        self.leader().as_ref() == Some(agent_id)
    }
}
