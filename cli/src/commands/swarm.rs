// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Swarm commands
//!
//! `hive swarm run` boots every agent declared in the manifest as an in-process
//! worker, coordinates the requested task, and prints the coordination result.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use hive_core::domain::message::MessageKind;
use hive_core::domain::swarm_manifest::SwarmManifest;
use hive_core::domain::task::{CoordinationResult, CoordinationTask, TaskAssignment, TaskId, TaskResult};
use hive_core::infrastructure::event_bus::EventBus;
use hive_swarm::infrastructure::{
    consensus_for, distributor_for, AgentEndpoint, InProcessChannel, ProposalVoter, StaticVoter,
};
use hive_swarm::{CompletionPolicy, UnifiedCoordinator};

#[derive(Subcommand)]
pub enum SwarmCommand {
    /// Start the configured swarm and coordinate a task
    Run {
        /// Task type label
        #[arg(long, default_value = "general")]
        task_type: String,

        /// Task payload as JSON
        #[arg(long, value_name = "JSON")]
        payload: Option<String>,

        /// Capability every participating agent must hold (repeatable)
        #[arg(long = "require", value_name = "CAPABILITY")]
        required: Vec<String>,

        /// Number of tasks to coordinate
        #[arg(long, default_value_t = 1)]
        repeat: usize,

        /// Print the recorded event trail after shutdown
        #[arg(long)]
        events: bool,

        /// Serve Prometheus metrics on this address while running
        #[arg(long, value_name = "ADDR")]
        metrics_listen: Option<SocketAddr>,
    },
}

pub async fn handle_command(command: SwarmCommand, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        SwarmCommand::Run {
            task_type,
            payload,
            required,
            repeat,
            events,
            metrics_listen,
        } => {
            if let Some(addr) = metrics_listen {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .with_http_listener(addr)
                    .install()
                    .context("Failed to install Prometheus metrics exporter")?;
                info!(%addr, "Serving Prometheus metrics");
            }

            let payload = match payload {
                Some(raw) => serde_json::from_str(&raw).context("--payload is not valid JSON")?,
                None => Value::Null,
            };

            let manifest = SwarmManifest::load_or_default(config_path)
                .context("Failed to load configuration")?;
            run(&manifest, &task_type, payload, required, repeat, events).await
        }
    }
}

async fn run(
    manifest: &SwarmManifest,
    task_type: &str,
    payload: Value,
    required: Vec<String>,
    repeat: usize,
    print_events: bool,
) -> Result<()> {
    let swarm = SwarmRuntime::start(manifest).await?;
    println!(
        "{}",
        format!(
            "Swarm '{}' running: {} topology, {} agents",
            manifest.metadata.name,
            swarm.coordinator.topology(),
            swarm.coordinator.agent_count()
        )
        .bold()
    );

    let mut outcome = Ok(());
    for _ in 0..repeat {
        let task = CoordinationTask::new(TaskId::generate(), task_type)
            .with_payload(payload.clone())
            .requiring(required.iter().cloned());

        match swarm.coordinator.coordinate(task).await {
            Ok(result) => print_result(&result)?,
            Err(e) => {
                outcome = Err(anyhow::Error::new(e).context("Task coordination failed"));
                break;
            }
        }
    }

    let bus = swarm.bus.clone();
    swarm.shutdown().await?;

    if print_events {
        println!("{}", "Event trail:".bold());
        for recorded in bus.snapshot() {
            println!("{}", serde_json::to_string(&recorded)?);
        }
    }

    outcome
}

fn print_result(result: &CoordinationResult) -> Result<()> {
    let status = if result.success {
        "✓ succeeded".green()
    } else {
        "✗ failed".red()
    };
    println!(
        "Task {} {} in {}ms",
        result.task_id,
        status,
        result.duration.as_millis()
    );
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

/// A swarm whose agents all live in this process.
pub struct SwarmRuntime {
    pub coordinator: UnifiedCoordinator,
    pub channel: Arc<InProcessChannel>,
    pub bus: Arc<EventBus>,
    workers: Vec<JoinHandle<()>>,
}

impl SwarmRuntime {
    /// Initialize a coordinator from the manifest and register every declared
    /// agent. Each agent also votes on proposals, always approving.
    pub async fn start(manifest: &SwarmManifest) -> Result<Self> {
        manifest
            .validate()
            .context("Configuration validation failed")?;
        let spec = &manifest.spec;

        let voters: Vec<Arc<dyn ProposalVoter>> = spec
            .agents
            .iter()
            .map(|agent| Arc::new(StaticVoter::new(agent.id.clone(), true)) as Arc<dyn ProposalVoter>)
            .collect();

        let channel = Arc::new(InProcessChannel::default());
        let bus = Arc::new(EventBus::with_default_capacity());
        let coordinator = UnifiedCoordinator::new(
            distributor_for(spec.distribution),
            consensus_for(spec.consensus_protocol, voters),
            channel.clone(),
            bus.clone(),
        )
        .with_completion_policy(CompletionPolicy::from(&spec.completion));

        coordinator.initialize(manifest.swarm_config()).await?;

        let mut workers = Vec::with_capacity(spec.agents.len());
        for agent in &spec.agents {
            workers.push(spawn_agent(channel.connect(agent.id.clone())));
            coordinator.add_agent(agent.clone()).await?;
        }

        Ok(Self {
            coordinator,
            channel,
            bus,
            workers,
        })
    }

    pub async fn shutdown(self) -> Result<()> {
        self.coordinator.shutdown().await?;
        for worker in self.workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "Agent task ended abnormally");
            }
        }
        Ok(())
    }
}

/// Simulated agent: acknowledges every assignment with a successful report and
/// exits when the coordinator shuts down.
fn spawn_agent(endpoint: AgentEndpoint) -> JoinHandle<()> {
    let AgentEndpoint {
        agent_id,
        mut mailbox,
        mut broadcasts,
        reporter,
    } = endpoint;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                message = mailbox.recv() => {
                    let Some(message) = message else { break };
                    if message.kind != MessageKind::TaskAssigned {
                        continue;
                    }
                    let assignment: TaskAssignment = match serde_json::from_value(message.payload) {
                        Ok(assignment) => assignment,
                        Err(e) => {
                            warn!(agent_id = %agent_id, error = %e, "Unreadable assignment");
                            continue;
                        }
                    };
                    debug!(agent_id = %agent_id, task_id = %assignment.task_id, "Executing assignment");
                    let result = TaskResult::succeeded(
                        agent_id.clone(),
                        Some(json!({ "agent": agent_id, "subtask": assignment.subtask })),
                    );
                    reporter.report_completion(&assignment.task_id, &result);
                }
                broadcast = broadcasts.recv() => match broadcast {
                    Ok(message) if message.kind == MessageKind::CoordinatorShutdown => break,
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                },
            }
        }
        debug!(agent_id = %agent_id, "Agent stopped");
    })
}
