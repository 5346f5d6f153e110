// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `run` and `step` commands

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use mindloop_core::application::build_life_loop;
use mindloop_core::domain::mind_config::{LoopMode, MindConfigManifest};
use mindloop_core::domain::repository::StateRepository;
use mindloop_core::domain::state::MindState;
use mindloop_core::infrastructure::event_bus::EventBus;

use super::require_valid;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    Sequential,
    Pipeline,
}

impl From<ModeArg> for LoopMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sequential => LoopMode::Sequential,
            ModeArg::Pipeline => LoopMode::Pipeline,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Stop after this many steps
    #[arg(long)]
    pub steps: Option<u64>,

    /// Loop mode (overrides configuration)
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Milliseconds between steps (overrides configuration)
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,
}

impl RunArgs {
    pub fn apply(&self, config: &mut MindConfigManifest) {
        let life_loop = &mut config.spec.life_loop;
        if let Some(steps) = self.steps {
            life_loop.max_steps = Some(steps);
        }
        if let Some(mode) = self.mode {
            life_loop.mode = mode.into();
        }
        if let Some(ms) = self.interval_ms {
            life_loop.step_interval = Duration::from_millis(ms);
        }
    }
}

pub async fn run(mut config: MindConfigManifest, args: RunArgs) -> Result<()> {
    args.apply(&mut config);
    require_valid(&config)?;

    let event_bus = Arc::new(EventBus::with_default_capacity());
    let life = build_life_loop(&config.spec, event_bus).await?;

    let shutdown = life.shutdown_token();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C signal");
            shutdown.cancel();
        }
    });

    let state = life.run().await.context("Life loop failed")?;
    print_summary(&state);
    Ok(())
}

pub async fn step(config: MindConfigManifest) -> Result<()> {
    require_valid(&config)?;

    let event_bus = Arc::new(EventBus::with_default_capacity());
    let life = build_life_loop(&config.spec, event_bus).await?;
    let state = life
        .components()
        .repository
        .load()
        .await
        .context("Failed to load state")?;

    let state = life.step(state).await;
    print_summary(&state);
    Ok(())
}

fn print_summary(state: &MindState) {
    println!(
        "{} age {}, stage {}, phase {}, {} accepted, {} rejected, {} mastered",
        "✓".green(),
        state.memory.age,
        state.stage,
        state.curriculum.phase,
        state.metrics.accepted,
        state.metrics.rejected,
        state.metrics.tasks_mastered,
    );
}
