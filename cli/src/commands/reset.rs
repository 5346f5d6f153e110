// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `reset` command

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{BufRead, Write};
use std::sync::Arc;

use mindloop_core::application::build_reset_service;
use mindloop_core::application::curriculum::CurriculumController;
use mindloop_core::domain::mind_config::MindConfigManifest;
use mindloop_core::infrastructure::event_bus::EventBus;

use super::require_valid;

pub async fn reset(config: MindConfigManifest, yes: bool, curriculum_only: bool) -> Result<()> {
    require_valid(&config)?;
    let workspace = &config.spec.workspace;

    let question = if curriculum_only {
        format!(
            "Rewind curriculum progress under {}?",
            workspace.state_dir().display()
        )
    } else {
        format!(
            "Archive and clear state, plugins and tasks under {}?",
            workspace.root.display()
        )
    };
    if !yes && !confirm(&question)? {
        println!("{}", "Reset cancelled".yellow());
        return Ok(());
    }

    let service = build_reset_service(workspace).await?;
    if curriculum_only {
        let curriculum = CurriculumController::new(
            config.spec.curriculum.clone(),
            Arc::new(EventBus::with_default_capacity()),
        );
        let report = service.reset_curriculum(&curriculum).await?;
        println!(
            "{}",
            format!("✓ Curriculum reset; backup at {}", report.backup_dir.display()).green()
        );
        println!("  Archived {} state documents", report.state_documents);
        return Ok(());
    }

    let report = service.reset().await?;
    println!(
        "{}",
        format!("✓ Workspace reset; backup at {}", report.backup_dir.display()).green()
    );
    println!(
        "  Archived {} state documents, {} plugins, {} tasks",
        report.state_documents, report.plugins, report.tasks
    );
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindloop_core::application::factory::{create_state_repository, create_task_source};
    use mindloop_core::domain::repository::StateRepository;
    use mindloop_core::domain::state::MindState;
    use mindloop_core::domain::task::TaskSource;

    #[tokio::test]
    async fn test_curriculum_flag_rewinds_progress_only() {
        let root = tempfile::tempdir().unwrap();
        let mut config = MindConfigManifest::default();
        config.spec.workspace.root = root.path().to_path_buf();
        reset(config.clone(), true, false).await.unwrap();

        let repository = create_state_repository(&config.spec.workspace);
        let mut state = MindState::default();
        state.curriculum.phase = 2;
        state.memory.age = 8;
        repository.save(&state).await.unwrap();

        reset(config.clone(), true, true).await.unwrap();

        let reloaded = repository.load().await.unwrap();
        assert_eq!(reloaded.curriculum.phase, 0);
        assert_eq!(reloaded.memory.age, 8);
        assert_eq!(create_task_source(&config.spec.workspace).load().await.len(), 1);
    }
}
