// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use hive_core::domain::swarm_manifest::{CompletionMode, SwarmManifest};

pub const MINIMAL_TEMPLATE: &str = include_str!("../../templates/swarm-minimal.yaml");
pub const EXAMPLES_TEMPLATE: &str = include_str!("../../templates/swarm-with-examples.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective manifest as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./hive-swarm.yaml)
        #[arg(short, long, default_value = "./hive-swarm.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(&output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let manifest = SwarmManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. HIVE_CONFIG_PATH: {}",
            std::env::var("HIVE_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./hive-swarm.yaml");
        println!("  4. ~/.hive/swarm.yaml");
        println!("  5. /etc/hive/swarm.yaml");
        println!();
    }

    if as_yaml {
        print!(
            "{}",
            serde_yaml::to_string(&manifest).context("Failed to render configuration")?
        );
        return Ok(());
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Swarm:".bold());
    println!("  Name: {}", manifest.metadata.name);
    println!("  Topology: {}", manifest.spec.topology);
    println!("  Max agents: {}", manifest.spec.max_agents);
    println!("  Consensus: {}", manifest.spec.consensus_protocol);
    println!("  Distribution: {:?}", manifest.spec.distribution);
    match manifest.spec.completion.mode {
        CompletionMode::Immediate => println!("  Completion: immediate"),
        CompletionMode::AwaitReports => println!(
            "  Completion: await reports ({}s timeout)",
            manifest.spec.completion.timeout_seconds
        ),
    }
    println!();

    println!("{}", "Agents:".bold());
    if manifest.spec.agents.is_empty() {
        println!("  {}", "(none declared)".dimmed());
    }
    for agent in &manifest.spec.agents {
        let capabilities: Vec<&str> = agent.capabilities.iter().map(String::as_str).collect();
        println!(
            "  {} ({}) priority {}",
            agent.id.as_str().bold(),
            agent.agent_type,
            agent.priority
        );
        if !capabilities.is_empty() {
            println!("    Capabilities: {}", capabilities.join(", "));
        }
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let manifest = SwarmManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    manifest
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: &Path, with_examples: bool) -> Result<()> {
    write_template(output, with_examples)?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

pub fn write_template(output: &Path, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        EXAMPLES_TEMPLATE
    } else {
        MINIMAL_TEMPLATE
    };

    std::fs::write(output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))
}
