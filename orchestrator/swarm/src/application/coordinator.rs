// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Unified Coordinator Application Service
//!
//! Single coordination engine for a swarm. Owns the agent registry, gates
//! hierarchical work behind the consensus manager, hands candidates to the task
//! distributor, drives agent availability, and publishes an event for every
//! externally visible transition.
//!
//! Lifecycle: `Uninitialized --initialize--> Initialized --shutdown--> Shutdown`.
//!
//! Concurrency:
//! - Mutating phases run under a per-instance async operation lock, so two
//!   coordinations can never claim the same idle agent and events leave in
//!   mutation order.
//! - Registry reads go through a synchronous lock that is never held across an
//!   `.await`, which keeps [`UnifiedCoordinator::topology`] and
//!   [`UnifiedCoordinator::agent_status`] non-blocking.
//! - Consensus proposals and agent dispatch run outside the operation lock.
//! - Each claim carries its own token, and release only frees agents still
//!   held by that token.
//! - `shutdown` waits for in-flight coordinations to drain before clearing state.

use crate::application::ports::{
    CommunicationChannel, ConsensusManager, EventPublisher, MessageInbox, TaskDistributor,
};
use crate::domain::proposal::Proposal;
use crate::domain::registry::{AgentRegistry, ClaimToken, RegistryError};
use futures::future::join_all;
use hive_core::domain::agent::{AgentDescriptor, AgentId, AgentStatus};
use hive_core::domain::events::{DomainEvent, SwarmEvent};
use hive_core::domain::message::{CompletionReport, MessageKind, StatusUpdate, SwarmMessage};
use hive_core::domain::swarm::{SwarmConfig, SwarmConfigError, Topology};
use hive_core::domain::swarm_manifest::{CompletionMode, CompletionSettings};
use hive_core::domain::task::{
    CoordinationResult, CoordinationTask, TaskAssignment, TaskId, TaskResult,
};
use parking_lot::{Mutex as SyncMutex, RwLock as SyncRwLock};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Error recorded for an agent that never reported back in await-reports mode.
pub const REPORT_TIMEOUT_ERROR: &str = "timed out waiting for completion report";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Coordinator already initialized")]
    AlreadyInitialized,

    #[error("Coordinator not initialized")]
    NotInitialized,

    #[error("Invalid swarm configuration: {0}")]
    InvalidConfig(#[from] SwarmConfigError),

    #[error("Maximum agent limit reached ({max})")]
    MaxAgentsReached { max: usize },

    #[error("Agent already registered: {0}")]
    DuplicateAgent(AgentId),

    #[error("Agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("No available agents with required capabilities")]
    NoAvailableAgents { task_id: TaskId },

    #[error("Task coordination not approved by consensus")]
    ConsensusRejected { task_id: TaskId },

    #[error("Distributor assigned task to non-candidate agent {agent_id}")]
    InvalidAssignment { agent_id: AgentId },

    #[error("Agent {agent_id} changed status while the task was being distributed")]
    AgentUnavailable { agent_id: AgentId },

    #[error("Task distributor failed: {0}")]
    Distributor(#[source] anyhow::Error),

    #[error("Consensus manager failed: {0}")]
    Consensus(#[source] anyhow::Error),

    #[error("Communication channel failed: {0}")]
    Channel(#[source] anyhow::Error),

    #[error("Event publisher failed: {0}")]
    Publisher(#[source] anyhow::Error),
}

impl From<RegistryError> for CoordinatorError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::CapacityReached(max) => CoordinatorError::MaxAgentsReached { max },
            RegistryError::AlreadyRegistered(id) => CoordinatorError::DuplicateAgent(id),
            RegistryError::NotFound(id) => CoordinatorError::AgentNotFound(id),
        }
    }
}

// ============================================================================
// Settings & State
// ============================================================================

/// How per-agent results of a coordination are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionPolicy {
    /// Results are synthesized as successful once assignments are sent.
    #[default]
    Immediate,
    /// Results come from `TaskCompleted` reports; agents that stay silent past
    /// `timeout` get a failed result.
    AwaitReports { timeout: Duration },
}

impl From<&CompletionSettings> for CompletionPolicy {
    fn from(settings: &CompletionSettings) -> Self {
        match settings.mode {
            CompletionMode::Immediate => CompletionPolicy::Immediate,
            CompletionMode::AwaitReports => CompletionPolicy::AwaitReports {
                timeout: settings.timeout(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Initialized,
    Shutdown,
}

struct SwarmState {
    lifecycle: Lifecycle,
    config: Option<SwarmConfig>,
    registry: AgentRegistry,
}

impl SwarmState {
    fn ensure_initialized(&self) -> Result<(), CoordinatorError> {
        match self.lifecycle {
            Lifecycle::Initialized => Ok(()),
            _ => Err(CoordinatorError::NotInitialized),
        }
    }

    fn topology(&self) -> Topology {
        self.config.as_ref().map(|c| c.topology).unwrap_or_default()
    }
}

type ReportKey = (TaskId, AgentId);

/// Completion slots awaiting `TaskCompleted` reports.
#[derive(Default)]
struct PendingReports {
    slots: HashMap<ReportKey, VecDeque<oneshot::Sender<TaskResult>>>,
}

impl PendingReports {
    fn register(&mut self, key: ReportKey) -> oneshot::Receiver<TaskResult> {
        let (tx, rx) = oneshot::channel();
        self.slots.entry(key).or_default().push_back(tx);
        rx
    }

    fn take(&mut self, key: &ReportKey) -> Option<oneshot::Sender<TaskResult>> {
        let queue = self.slots.get_mut(key)?;
        let slot = queue.pop_front();
        if queue.is_empty() {
            self.slots.remove(key);
        }
        slot
    }

    fn discard(&mut self, assignments: &[TaskAssignment]) {
        for assignment in assignments {
            self.slots
                .remove(&(assignment.task_id.clone(), assignment.agent_id.clone()));
        }
    }
}

/// State reachable from both the coordinator and its inbox task.
struct Shared {
    state: SyncRwLock<SwarmState>,
    pending: SyncMutex<PendingReports>,
}

impl Shared {
    fn handle_message(&self, message: SwarmMessage) {
        match message.kind {
            MessageKind::AgentStatusUpdate => {
                let update: StatusUpdate = match serde_json::from_value(message.payload) {
                    Ok(update) => update,
                    Err(e) => {
                        warn!(from = %message.from, error = %e, "Malformed AgentStatusUpdate payload");
                        return;
                    }
                };

                let mut state = self.state.write();
                match state.registry.set_status(&update.agent_id, update.status) {
                    Ok(previous) => debug!(
                        agent_id = %update.agent_id,
                        from = %previous,
                        to = %update.status,
                        "Agent status updated"
                    ),
                    Err(_) => warn!(
                        agent_id = %update.agent_id,
                        "Ignoring status update for unregistered agent"
                    ),
                }
            }
            MessageKind::TaskCompleted => {
                let report: CompletionReport = match serde_json::from_value(message.payload) {
                    Ok(report) => report,
                    Err(e) => {
                        warn!(from = %message.from, error = %e, "Malformed TaskCompleted payload");
                        return;
                    }
                };

                let key = (report.task_id.clone(), report.agent_id.clone());
                let slot = self.pending.lock().take(&key);
                match slot {
                    Some(tx) => {
                        // receiver is gone once the wait timed out
                        if tx.send(report.into_result()).is_err() {
                            debug!(task_id = %key.0, agent_id = %key.1, "Completion report arrived too late");
                        }
                    }
                    None => debug!(
                        task_id = %key.0,
                        agent_id = %key.1,
                        "No coordination waiting for this completion report"
                    ),
                }
            }
            other => trace!(kind = ?other, from = %message.from, "Ignoring message"),
        }
    }
}

async fn run_inbox(shared: Arc<Shared>, mut inbox: mpsc::UnboundedReceiver<SwarmMessage>) {
    while let Some(message) = inbox.recv().await {
        shared.handle_message(message);
    }
    debug!("Coordinator inbox closed");
}

// ============================================================================
// Coordinator
// ============================================================================

pub struct UnifiedCoordinator {
    shared: Arc<Shared>,
    /// Serializes every mutating phase.
    operations: Mutex<()>,
    /// Held shared by each coordination and exclusively by shutdown.
    in_flight: RwLock<()>,
    inbox_task: SyncMutex<Option<JoinHandle<()>>>,
    completion: CompletionPolicy,
    distributor: Arc<dyn TaskDistributor>,
    consensus: Arc<dyn ConsensusManager>,
    channel: Arc<dyn CommunicationChannel>,
    publisher: Arc<dyn EventPublisher>,
}

impl UnifiedCoordinator {
    pub fn new(
        distributor: Arc<dyn TaskDistributor>,
        consensus: Arc<dyn ConsensusManager>,
        channel: Arc<dyn CommunicationChannel>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: SyncRwLock::new(SwarmState {
                    lifecycle: Lifecycle::Uninitialized,
                    config: None,
                    registry: AgentRegistry::default(),
                }),
                pending: SyncMutex::new(PendingReports::default()),
            }),
            operations: Mutex::new(()),
            in_flight: RwLock::new(()),
            inbox_task: SyncMutex::new(None),
            completion: CompletionPolicy::default(),
            distributor,
            consensus,
            channel,
            publisher,
        }
    }

    pub fn with_completion_policy(mut self, completion: CompletionPolicy) -> Self {
        self.completion = completion;
        self
    }

    pub async fn initialize(&self, config: SwarmConfig) -> Result<(), CoordinatorError> {
        let _op = self.operations.lock().await;

        if self.shared.state.read().lifecycle != Lifecycle::Uninitialized {
            return Err(CoordinatorError::AlreadyInitialized);
        }
        config.validate()?;

        let (inbox, receiver): (MessageInbox, _) = mpsc::unbounded_channel();
        self.channel.subscribe(inbox);
        *self.inbox_task.lock() = Some(tokio::spawn(run_inbox(self.shared.clone(), receiver)));

        {
            let mut state = self.shared.state.write();
            state.registry = AgentRegistry::with_capacity(config.max_agents);
            state.config = Some(config.clone());
            state.lifecycle = Lifecycle::Initialized;
        }

        info!(
            topology = %config.topology,
            max_agents = config.max_agents,
            consensus = %config.consensus_protocol,
            "Swarm coordinator initialized"
        );

        self.publish(SwarmEvent::CoordinatorInitialized {
            topology: config.topology,
            max_agents: config.max_agents,
        })
        .await
    }

    pub async fn add_agent(&self, agent: AgentDescriptor) -> Result<(), CoordinatorError> {
        let _op = self.operations.lock().await;

        let registered = {
            let mut state = self.shared.state.write();
            state.ensure_initialized()?;
            state.registry.register(agent.clone())?;
            state.registry.len()
        };
        metrics::gauge!("hive_swarm_agents_registered").set(registered as f64);
        info!(agent_id = %agent.id, agent_type = %agent.agent_type, "Agent joined swarm");

        self.broadcast(SwarmMessage::agent_joined(&agent.id, agent.agent_type))
            .await?;
        self.publish(SwarmEvent::AgentAddedToSwarm {
            agent_id: agent.id,
            agent_type: agent.agent_type,
        })
        .await
    }

    pub async fn remove_agent(&self, agent_id: &AgentId) -> Result<(), CoordinatorError> {
        let _op = self.operations.lock().await;

        let registered = {
            let mut state = self.shared.state.write();
            state.ensure_initialized()?;
            state.registry.remove(agent_id)?;
            state.registry.len()
        };
        metrics::gauge!("hive_swarm_agents_registered").set(registered as f64);
        info!(agent_id = %agent_id, "Agent left swarm");

        self.broadcast(SwarmMessage::agent_left(agent_id)).await?;
        self.publish(SwarmEvent::AgentRemovedFromSwarm {
            agent_id: agent_id.clone(),
        })
        .await
    }

    pub async fn coordinate(
        &self,
        task: CoordinationTask,
    ) -> Result<CoordinationResult, CoordinatorError> {
        let _flight = self.in_flight.read().await;
        let started = Instant::now();

        let requires_consensus = {
            let _op = self.operations.lock().await;
            let state = self.shared.state.read();
            state.ensure_initialized()?;
            if state.registry.select(&task.required_capabilities).is_empty() {
                return Err(self.reject(CoordinatorError::NoAvailableAgents {
                    task_id: task.id.clone(),
                }));
            }
            state.topology().requires_consensus()
        };

        if requires_consensus {
            let approved = self
                .consensus
                .propose(Proposal::task_coordination(&task))
                .await
                .map_err(CoordinatorError::Consensus)?;
            if !approved {
                warn!(task_id = %task.id, "Task coordination rejected by consensus");
                return Err(self.reject(CoordinatorError::ConsensusRejected {
                    task_id: task.id.clone(),
                }));
            }
        }

        let (assignments, claim) = self.claim(&task).await?;

        let dispatched = self.dispatch(&assignments).await;
        self.shared.pending.lock().discard(&assignments);

        let _op = self.operations.lock().await;
        self.release(&assignments, claim);

        let results = match dispatched {
            Ok(results) => results,
            Err(e) => {
                metrics::counter!("hive_swarm_coordinations_total", "outcome" => "failed")
                    .increment(1);
                return Err(e);
            }
        };

        let duration = started.elapsed();
        let participating_agents: Vec<AgentId> =
            assignments.iter().map(|a| a.agent_id.clone()).collect();
        let success = results.iter().all(|r| r.success);

        metrics::counter!(
            "hive_swarm_coordinations_total",
            "outcome" => if success { "succeeded" } else { "failed" }
        )
        .increment(1);
        metrics::histogram!("hive_swarm_coordination_duration_seconds")
            .record(duration.as_secs_f64());
        info!(
            task_id = %task.id,
            agents = participating_agents.len(),
            success,
            duration_ms = duration.as_millis() as u64,
            "Task coordination completed"
        );

        self.publish(SwarmEvent::TaskCoordinationCompleted {
            task_id: task.id.clone(),
            duration,
            participating_agents: participating_agents.clone(),
        })
        .await?;

        Ok(CoordinationResult {
            task_id: task.id,
            success,
            results,
            duration,
            participating_agents,
        })
    }

    /// Broadcast shutdown, drop all agents and publish the terminal event.
    ///
    /// Waits for in-flight coordinations to finish first. A coordinator that
    /// was never initialized, or is already shut down, is left untouched.
    pub async fn shutdown(&self) -> Result<(), CoordinatorError> {
        let _drain = self.in_flight.write().await;
        let _op = self.operations.lock().await;

        if self.shared.state.read().lifecycle != Lifecycle::Initialized {
            debug!("Shutdown requested on a coordinator that is not running");
            return Ok(());
        }

        self.broadcast(SwarmMessage::coordinator_shutdown()).await?;

        {
            let mut state = self.shared.state.write();
            state.registry.clear();
            state.lifecycle = Lifecycle::Shutdown;
        }
        if let Some(handle) = self.inbox_task.lock().take() {
            handle.abort();
        }
        metrics::gauge!("hive_swarm_agents_registered").set(0.0);
        info!("Swarm coordinator shut down");

        self.publish(SwarmEvent::CoordinatorShutdown {}).await
    }

    /// Configured topology, or mesh before initialization.
    pub fn topology(&self) -> Topology {
        self.shared.state.read().topology()
    }

    pub fn agent_status(&self, agent_id: &AgentId) -> Option<AgentStatus> {
        self.shared.state.read().registry.status(agent_id)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.state.read().lifecycle
    }

    pub fn config(&self) -> Option<SwarmConfig> {
        self.shared.state.read().config.clone()
    }

    /// Registered agents in registration order.
    pub fn agents(&self) -> Vec<AgentDescriptor> {
        self.shared.state.read().registry.agents()
    }

    pub fn agent_count(&self) -> usize {
        self.shared.state.read().registry.len()
    }

    // ------------------------------------------------------------------------

    /// Pick candidates, ask the distributor, and mark the assigned agents busy
    /// under a fresh claim token.
    async fn claim(
        &self,
        task: &CoordinationTask,
    ) -> Result<(Vec<TaskAssignment>, ClaimToken), CoordinatorError> {
        let _op = self.operations.lock().await;

        let candidates = {
            let state = self.shared.state.read();
            state.ensure_initialized()?;
            state.registry.select(&task.required_capabilities)
        };
        if candidates.is_empty() {
            return Err(self.reject(CoordinatorError::NoAvailableAgents {
                task_id: task.id.clone(),
            }));
        }

        let assignments = self
            .distributor
            .distribute(task, &candidates)
            .await
            .map_err(CoordinatorError::Distributor)?;

        let candidate_ids: HashSet<&AgentId> = candidates.iter().map(|a| &a.id).collect();
        if let Some(stray) = assignments
            .iter()
            .find(|a| !candidate_ids.contains(&a.agent_id))
        {
            return Err(CoordinatorError::InvalidAssignment {
                agent_id: stray.agent_id.clone(),
            });
        }

        let mut state = self.shared.state.write();
        // status reports may have landed while the distributor was running
        if let Some(moved) = assignments
            .iter()
            .find(|a| state.registry.status(&a.agent_id) != Some(AgentStatus::Idle))
        {
            return Err(CoordinatorError::AgentUnavailable {
                agent_id: moved.agent_id.clone(),
            });
        }
        let token = state.registry.issue_claim_token();
        for assignment in &assignments {
            state.registry.claim(&assignment.agent_id, token)?;
        }
        debug!(task_id = %task.id, assignments = assignments.len(), "Agents claimed");

        Ok((assignments, token))
    }

    /// Send every assignment and gather one result per assignment.
    async fn dispatch(
        &self,
        assignments: &[TaskAssignment],
    ) -> Result<Vec<TaskResult>, CoordinatorError> {
        let waiting = match self.completion {
            CompletionPolicy::Immediate => Vec::new(),
            CompletionPolicy::AwaitReports { .. } => {
                let mut pending = self.shared.pending.lock();
                assignments
                    .iter()
                    .map(|a| {
                        let key = (a.task_id.clone(), a.agent_id.clone());
                        (a.agent_id.clone(), pending.register(key))
                    })
                    .collect()
            }
        };

        for assignment in assignments {
            self.channel
                .send(&assignment.agent_id, SwarmMessage::task_assigned(assignment))
                .await
                .map_err(CoordinatorError::Channel)?;
            debug!(
                agent_id = %assignment.agent_id,
                task_id = %assignment.task_id,
                "Task assignment sent"
            );
        }

        let results = match self.completion {
            CompletionPolicy::Immediate => assignments
                .iter()
                .map(|a| TaskResult::succeeded(a.agent_id.clone(), None))
                .collect(),
            CompletionPolicy::AwaitReports { timeout } => {
                join_all(waiting.into_iter().map(|(agent_id, report)| async move {
                    match tokio::time::timeout(timeout, report).await {
                        Ok(Ok(result)) => result,
                        Ok(Err(_)) => TaskResult::failed(agent_id, "completion slot dropped"),
                        Err(_) => {
                            warn!(agent_id = %agent_id, "Agent did not report completion in time");
                            TaskResult::failed(agent_id, REPORT_TIMEOUT_ERROR)
                        }
                    }
                }))
                .await
            }
        };

        Ok(results)
    }

    /// Return agents still held by `claim` to idle. Agents removed, re-added
    /// or claimed by another coordination meanwhile are left alone.
    fn release(&self, assignments: &[TaskAssignment], claim: ClaimToken) {
        let mut state = self.shared.state.write();
        for assignment in assignments {
            if !state.registry.release(&assignment.agent_id, claim) {
                debug!(agent_id = %assignment.agent_id, "Agent no longer held by this coordination");
            }
        }
    }

    fn reject(&self, err: CoordinatorError) -> CoordinatorError {
        metrics::counter!("hive_swarm_coordinations_total", "outcome" => "rejected").increment(1);
        err
    }

    async fn broadcast(&self, message: SwarmMessage) -> Result<(), CoordinatorError> {
        self.channel
            .broadcast(message)
            .await
            .map_err(CoordinatorError::Channel)
    }

    async fn publish(&self, event: SwarmEvent) -> Result<(), CoordinatorError> {
        self.publisher
            .publish(DomainEvent::now(event))
            .await
            .map_err(CoordinatorError::Publisher)
    }
}

impl Drop for UnifiedCoordinator {
    fn drop(&mut self) {
        if let Some(handle) = self.inbox_task.get_mut().take() {
            handle.abort();
        }
    }
}
