// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `status` command

use anyhow::{Context, Result};
use colored::Colorize;

use mindloop_core::application::factory::{create_state_repository, create_task_source};
use mindloop_core::domain::mind_config::MindConfigManifest;
use mindloop_core::domain::repository::StateRepository;
use mindloop_core::domain::state::MindState;
use mindloop_core::domain::task::{Task, TaskSource, TaskStatus};

use super::require_valid;

pub async fn show(config: MindConfigManifest, json: bool) -> Result<()> {
    require_valid(&config)?;
    let workspace = &config.spec.workspace;
    let state = create_state_repository(workspace)
        .load()
        .await
        .context("Failed to load state")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    let tasks = create_task_source(workspace).load().await;
    print!("{}", render(&state, &tasks));
    Ok(())
}

pub fn render(state: &MindState, tasks: &[Task]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Mind:".bold()));
    out.push_str(&format!(
        "  Age: {}  Stage: {}  Phase: {}\n",
        state.memory.age, state.stage, state.curriculum.phase
    ));
    let m = &state.metrics;
    out.push_str(&format!(
        "  Steps: {}  Accepted: {}  Rejected: {} (safety {}, harness {}, timeouts {})  Consults: {}\n",
        m.steps, m.accepted, m.rejected, m.safety_rejections, m.harness_errors, m.timeouts, m.consults
    ));
    if let Some(reflection) = &state.memory.last_reflection {
        out.push_str(&format!("  Last reflection: {}\n", reflection.dimmed()));
    }

    out.push_str(&format!("\n{}\n", "Tasks:".bold()));
    if tasks.is_empty() {
        out.push_str(&format!("  {}\n", "(none)".dimmed()));
    }
    for task in tasks {
        let task_state = state.tasks.get(&task.name).cloned().unwrap_or_default();
        let status = match (task_state.mastered, task_state.status) {
            (true, _) => "mastered".green(),
            (false, TaskStatus::Passing) => "passing".green(),
            (false, TaskStatus::Failing) => "failing".red(),
            (false, TaskStatus::Unknown) => "untried".dimmed(),
        };
        out.push_str(&format!(
            "  {} [{}] phase {} -> {}::{}  streak +{}/-{}\n",
            task.name.bold(),
            status,
            task.phase,
            task.plugin,
            task.function,
            task_state.success_streak,
            task_state.failure_streak,
        ));
    }

    let streaks: Vec<_> = state
        .memory
        .error_streaks
        .iter()
        .filter(|(_, _, n)| *n > 0)
        .collect();
    if !streaks.is_empty() {
        out.push_str(&format!("\n{}\n", "Error streaks:".bold()));
        for (plugin, signature, n) in streaks {
            out.push_str(&format!("  {} {}: {}\n", plugin, signature, n));
        }
    }
    out
}
