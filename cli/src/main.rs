// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # mindloop CLI
//!
//! The `mindloop` binary drives the plugin mutation loop over a workspace
//! directory (`plugins/`, `tasks/`, `state/`, `backups/`).
//!
//! ## Commands
//!
//! - `mindloop run [--steps N] [--mode sequential|pipeline]` - Run the life loop
//! - `mindloop step` - Run exactly one step
//! - `mindloop status [--json]` - Show persisted state
//! - `mindloop reset [--curriculum] --yes` - Archive and reseed the workspace
//! - `mindloop config show|validate|generate` - Configuration management
//! - `mindloop harness-worker --job FILE` - Test runner child process (hidden)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use mindloop_cli::commands::{self, ConfigCommand, RunArgs};

/// mindloop - a self-improving plugin mutation agent
#[derive(Parser)]
#[command(name = "mindloop")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "MINDLOOP_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "MINDLOOP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Expose Prometheus metrics on this port
    #[arg(long, global = true, env = "MINDLOOP_METRICS_PORT")]
    metrics_port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the life loop until max steps or Ctrl+C
    #[command(name = "run")]
    Run {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Run a single step
    #[command(name = "step")]
    Step,

    /// Show persisted state
    #[command(name = "status")]
    Status {
        /// Print the raw state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Archive state, plugins and tasks, then reseed the workspace
    #[command(name = "reset")]
    Reset {
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,

        /// Only rewind curriculum progress; keep plugins and tasks
        #[arg(long)]
        curriculum: bool,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Evaluate a harness job and print outcomes as JSON
    #[command(name = "harness-worker", hide = true)]
    HarnessWorker {
        #[arg(long, value_name = "FILE")]
        job: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // The worker's stdout is a protocol channel; keep it free of logs.
    if let Some(Commands::HarnessWorker { job }) = &cli.command {
        return commands::worker::run(job).await;
    }

    let config = commands::load_config(cli.config.clone())?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.spec.observability.log_level.clone());
    init_logging(&level)?;

    if let Some(port) = cli.metrics_port.or(config.spec.observability.metrics_port) {
        init_metrics(port)?;
    }

    match cli.command {
        Some(Commands::Run { args }) => commands::run::run(config, args).await,
        Some(Commands::Step) => commands::run::step(config).await,
        Some(Commands::Status { json }) => commands::status::show(config, json).await,
        Some(Commands::Reset { yes, curriculum }) => {
            commands::reset::reset(config, yes, curriculum).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, config, cli.config).await
        }
        Some(Commands::HarnessWorker { .. }) => Ok(()),
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}

fn init_metrics(port: u16) -> Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to start Prometheus exporter")?;
    info!(port, "Prometheus metrics exporter listening");
    Ok(())
}
