// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Reference task distributors, selectable by [`DistributionStrategy`].

use crate::application::ports::TaskDistributor;
use async_trait::async_trait;
use hive_core::domain::agent::{AgentDescriptor, AgentId};
use hive_core::domain::swarm_manifest::DistributionStrategy;
use hive_core::domain::task::{CoordinationTask, TaskAssignment};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

pub fn distributor_for(strategy: DistributionStrategy) -> Arc<dyn TaskDistributor> {
    match strategy {
        DistributionStrategy::HighestPriority => Arc::new(HighestPriorityDistributor),
        DistributionStrategy::FanOut => Arc::new(FanOutDistributor::default()),
        DistributionStrategy::RoundRobin => Arc::new(RoundRobinDistributor::default()),
    }
}

/// Spread subtasks evenly over the distinct agents already present, keeping
/// subtask order. Agents are visited in order of first appearance.
pub fn rebalance_evenly(assignments: Vec<TaskAssignment>) -> Vec<TaskAssignment> {
    let mut agents: Vec<AgentId> = Vec::new();
    for assignment in &assignments {
        if !agents.contains(&assignment.agent_id) {
            agents.push(assignment.agent_id.clone());
        }
    }

    assignments
        .into_iter()
        .enumerate()
        .map(|(i, mut assignment)| {
            assignment.agent_id = agents[i % agents.len()].clone();
            assignment
        })
        .collect()
}

/// Hands the whole task to the first (highest priority) candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighestPriorityDistributor;

#[async_trait]
impl TaskDistributor for HighestPriorityDistributor {
    async fn distribute(
        &self,
        task: &CoordinationTask,
        candidates: &[AgentDescriptor],
    ) -> anyhow::Result<Vec<TaskAssignment>> {
        Ok(candidates
            .first()
            .map(|agent| {
                TaskAssignment::new(agent.id.clone(), task.id.clone(), task.payload.clone())
            })
            .into_iter()
            .collect())
    }

    async fn rebalance(
        &self,
        assignments: Vec<TaskAssignment>,
    ) -> anyhow::Result<Vec<TaskAssignment>> {
        Ok(rebalance_evenly(assignments))
    }
}

/// One part of the task per candidate, optionally capped.
#[derive(Debug, Default, Clone, Copy)]
pub struct FanOutDistributor {
    max_agents: Option<usize>,
}

impl FanOutDistributor {
    pub fn capped(max_agents: usize) -> Self {
        Self {
            max_agents: Some(max_agents),
        }
    }
}

#[async_trait]
impl TaskDistributor for FanOutDistributor {
    async fn distribute(
        &self,
        task: &CoordinationTask,
        candidates: &[AgentDescriptor],
    ) -> anyhow::Result<Vec<TaskAssignment>> {
        let take = self
            .max_agents
            .map_or(candidates.len(), |cap| cap.min(candidates.len()));

        let assignments: Vec<TaskAssignment> = candidates[..take]
            .iter()
            .enumerate()
            .map(|(part, agent)| {
                TaskAssignment::new(
                    agent.id.clone(),
                    task.id.clone(),
                    json!({ "part": part, "of": take, "payload": task.payload }),
                )
            })
            .collect();

        debug!(task_id = %task.id, parts = take, "Task fanned out");
        Ok(assignments)
    }

    async fn rebalance(
        &self,
        assignments: Vec<TaskAssignment>,
    ) -> anyhow::Result<Vec<TaskAssignment>> {
        Ok(rebalance_evenly(assignments))
    }
}

/// One candidate per call, rotating across calls.
#[derive(Debug, Default)]
pub struct RoundRobinDistributor {
    cursor: AtomicUsize,
}

#[async_trait]
impl TaskDistributor for RoundRobinDistributor {
    async fn distribute(
        &self,
        task: &CoordinationTask,
        candidates: &[AgentDescriptor],
    ) -> anyhow::Result<Vec<TaskAssignment>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let turn = self.cursor.fetch_add(1, Ordering::Relaxed);
        let agent = &candidates[turn % candidates.len()];

        Ok(vec![TaskAssignment::new(
            agent.id.clone(),
            task.id.clone(),
            task.payload.clone(),
        )])
    }

    async fn rebalance(
        &self,
        assignments: Vec<TaskAssignment>,
    ) -> anyhow::Result<Vec<TaskAssignment>> {
        Ok(rebalance_evenly(assignments))
    }
}
