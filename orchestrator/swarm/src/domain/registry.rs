// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Registry
//!
//! Owns the agents registered with a swarm and their [`AgentStatus`].
//!
//! # Invariants
//!
//! - At most `capacity` agents are registered.
//! - Every registered agent has exactly one status entry; removal drops both.
//! - Iteration follows registration order, which is what breaks priority ties
//!   in [`AgentRegistry::select`].
//! - A busy agent remembers the [`ClaimToken`] of the coordination that claimed
//!   it; only that token can release it. Re-registering an id starts unclaimed.

use hive_core::domain::agent::{AgentDescriptor, AgentId, AgentStatus};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Identifies one coordination's hold on the agents it claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaimToken(u64);

#[derive(Debug, Clone)]
struct AgentRecord {
    descriptor: AgentDescriptor,
    status: AgentStatus,
    claim: Option<ClaimToken>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Maximum agent limit reached ({0})")]
    CapacityReached(usize),

    #[error("Agent already registered: {0}")]
    AlreadyRegistered(AgentId),

    #[error("Agent not found: {0}")]
    NotFound(AgentId),
}

#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    capacity: usize,
    order: Vec<AgentId>,
    records: HashMap<AgentId, AgentRecord>,
    /// Never reset, so tokens stay unique across clear and re-registration.
    next_claim: u64,
}

impl AgentRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            order: Vec::with_capacity(capacity),
            records: HashMap::with_capacity(capacity),
            next_claim: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, agent_id: &AgentId) -> bool {
        self.records.contains_key(agent_id)
    }

    /// Register an agent as idle.
    pub fn register(&mut self, descriptor: AgentDescriptor) -> Result<(), RegistryError> {
        if self.records.contains_key(&descriptor.id) {
            return Err(RegistryError::AlreadyRegistered(descriptor.id));
        }
        if self.order.len() >= self.capacity {
            return Err(RegistryError::CapacityReached(self.capacity));
        }

        self.order.push(descriptor.id.clone());
        self.records.insert(
            descriptor.id.clone(),
            AgentRecord {
                descriptor,
                status: AgentStatus::Idle,
                claim: None,
            },
        );
        Ok(())
    }

    pub fn remove(&mut self, agent_id: &AgentId) -> Result<AgentDescriptor, RegistryError> {
        let record = self
            .records
            .remove(agent_id)
            .ok_or_else(|| RegistryError::NotFound(agent_id.clone()))?;
        self.order.retain(|id| id != agent_id);
        Ok(record.descriptor)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.records.clear();
    }

    pub fn get(&self, agent_id: &AgentId) -> Option<&AgentDescriptor> {
        self.records.get(agent_id).map(|r| &r.descriptor)
    }

    pub fn status(&self, agent_id: &AgentId) -> Option<AgentStatus> {
        self.records.get(agent_id).map(|r| r.status)
    }

    /// Overwrite the status of a registered agent. Returns the previous status.
    pub fn set_status(
        &mut self,
        agent_id: &AgentId,
        status: AgentStatus,
    ) -> Result<AgentStatus, RegistryError> {
        let record = self
            .records
            .get_mut(agent_id)
            .ok_or_else(|| RegistryError::NotFound(agent_id.clone()))?;
        Ok(std::mem::replace(&mut record.status, status))
    }

    pub fn issue_claim_token(&mut self) -> ClaimToken {
        self.next_claim += 1;
        ClaimToken(self.next_claim)
    }

    /// Mark an agent busy on behalf of `token`.
    pub fn claim(&mut self, agent_id: &AgentId, token: ClaimToken) -> Result<(), RegistryError> {
        let record = self
            .records
            .get_mut(agent_id)
            .ok_or_else(|| RegistryError::NotFound(agent_id.clone()))?;
        record.status = AgentStatus::Busy;
        record.claim = Some(token);
        Ok(())
    }

    /// Drop `token`'s hold on an agent, returning it to idle if it is still busy.
    ///
    /// Returns false when the agent is gone or another claim owns it now.
    pub fn release(&mut self, agent_id: &AgentId, token: ClaimToken) -> bool {
        match self.records.get_mut(agent_id) {
            Some(record) if record.claim == Some(token) => {
                record.claim = None;
                if record.status == AgentStatus::Busy {
                    record.status = AgentStatus::Idle;
                }
                true
            }
            _ => false,
        }
    }

    /// Registered agents in registration order.
    pub fn agents(&self) -> Vec<AgentDescriptor> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .map(|r| r.descriptor.clone())
            .collect()
    }

    /// Idle agents holding every required capability, highest priority first.
    ///
    /// The sort is stable so equal priorities keep registration order.
    pub fn select(&self, required: &BTreeSet<String>) -> Vec<AgentDescriptor> {
        let mut eligible: Vec<AgentDescriptor> = self
            .order
            .iter()
            .filter_map(|id| self.records.get(id))
            .filter(|r| r.status == AgentStatus::Idle && r.descriptor.satisfies(required))
            .map(|r| r.descriptor.clone())
            .collect();

        eligible.sort_by(|a, b| b.priority.cmp(&a.priority));
        eligible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_core::domain::agent::AgentType;

    fn agent(id: &str, priority: i32, caps: &[&str]) -> AgentDescriptor {
        AgentDescriptor::new(id, AgentType::Coder)
            .with_capabilities(caps.iter().copied())
            .with_priority(priority)
    }

    fn required(caps: &[&str]) -> BTreeSet<String> {
        caps.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_capacity_enforced() {
        let mut registry = AgentRegistry::with_capacity(2);
        registry.register(agent("a", 1, &[])).unwrap();
        registry.register(agent("b", 1, &[])).unwrap();

        assert_eq!(
            registry.register(agent("c", 1, &[])),
            Err(RegistryError::CapacityReached(2))
        );
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains(&AgentId::new("c")));
    }

    #[test]
    fn test_duplicate_rejected_before_capacity() {
        let mut registry = AgentRegistry::with_capacity(1);
        registry.register(agent("a", 1, &[])).unwrap();

        assert_eq!(
            registry.register(agent("a", 9, &[])),
            Err(RegistryError::AlreadyRegistered(AgentId::new("a")))
        );
        assert_eq!(registry.get(&AgentId::new("a")).unwrap().priority, 1);
    }

    #[test]
    fn test_remove_drops_agent_and_status() {
        let mut registry = AgentRegistry::with_capacity(3);
        registry.register(agent("a", 1, &[])).unwrap();
        registry.register(agent("b", 1, &[])).unwrap();

        registry.remove(&AgentId::new("a")).unwrap();
        assert_eq!(registry.status(&AgentId::new("a")), None);
        assert_eq!(registry.agents().len(), 1);

        assert_eq!(
            registry.remove(&AgentId::new("a")),
            Err(RegistryError::NotFound(AgentId::new("a")))
        );
        assert_eq!(registry.status(&AgentId::new("b")), Some(AgentStatus::Idle));
    }

    #[test]
    fn test_select_sorts_by_priority_and_keeps_ties_stable() {
        let mut registry = AgentRegistry::with_capacity(5);
        registry.register(agent("low", 10, &[])).unwrap();
        registry.register(agent("tie-1", 50, &[])).unwrap();
        registry.register(agent("high", 90, &[])).unwrap();
        registry.register(agent("tie-2", 50, &[])).unwrap();

        let ids: Vec<String> = registry
            .select(&BTreeSet::new())
            .into_iter()
            .map(|a| a.id.0)
            .collect();
        assert_eq!(ids, vec!["high", "tie-1", "tie-2", "low"]);
    }

    #[test]
    fn test_select_filters_status_and_capabilities() {
        let mut registry = AgentRegistry::with_capacity(5);
        registry.register(agent("coder", 50, &["coding", "debugging"])).unwrap();
        registry.register(agent("tester", 60, &["testing"])).unwrap();
        registry.register(agent("busy-coder", 70, &["coding"])).unwrap();
        registry
            .set_status(&AgentId::new("busy-coder"), AgentStatus::Busy)
            .unwrap();

        let coding = registry.select(&required(&["coding"]));
        assert_eq!(coding.len(), 1);
        assert_eq!(coding[0].id, AgentId::new("coder"));

        assert!(registry.select(&required(&["coding", "testing"])).is_empty());
        assert_eq!(registry.select(&BTreeSet::new()).len(), 2);
    }

    #[test]
    fn test_release_only_by_claiming_token() {
        let mut registry = AgentRegistry::with_capacity(2);
        registry.register(agent("a", 1, &[])).unwrap();
        let id = AgentId::new("a");

        let first = registry.issue_claim_token();
        registry.claim(&id, first).unwrap();

        // re-registration starts a fresh, unclaimed record
        registry.remove(&id).unwrap();
        registry.register(agent("a", 1, &[])).unwrap();
        let second = registry.issue_claim_token();
        assert_ne!(first, second);
        registry.claim(&id, second).unwrap();

        assert!(!registry.release(&id, first));
        assert_eq!(registry.status(&id), Some(AgentStatus::Busy));

        assert!(registry.release(&id, second));
        assert_eq!(registry.status(&id), Some(AgentStatus::Idle));
        assert!(!registry.release(&id, second));
    }

    #[test]
    fn test_release_keeps_offline_report() {
        let mut registry = AgentRegistry::with_capacity(1);
        registry.register(agent("a", 1, &[])).unwrap();
        let id = AgentId::new("a");
        let token = registry.issue_claim_token();
        registry.claim(&id, token).unwrap();

        registry.set_status(&id, AgentStatus::Offline).unwrap();

        assert!(registry.release(&id, token));
        assert_eq!(registry.status(&id), Some(AgentStatus::Offline));
    }

    #[test]
    fn test_set_status_requires_registration() {
        let mut registry = AgentRegistry::with_capacity(1);
        assert!(registry
            .set_status(&AgentId::new("ghost"), AgentStatus::Offline)
            .is_err());
        assert_eq!(registry.status(&AgentId::new("ghost")), None);

        registry.register(agent("a", 1, &[])).unwrap();
        let previous = registry
            .set_status(&AgentId::new("a"), AgentStatus::Offline)
            .unwrap();
        assert_eq!(previous, AgentStatus::Idle);
    }
}
