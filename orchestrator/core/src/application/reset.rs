// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Reset
//!
//! Copies every persisted state document, plugin and task definition into
//! `<backups>/<timestamp>/`, removes the originals, then seeds the workspace
//! with one sample unit and one sample task. Running it twice leaves the
//! same workspace behind. A curriculum-only reset rewinds the persisted
//! progress and leaves plugins and tasks alone.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Fresh-start operation with a recoverable backup

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::application::curriculum::CurriculumController;
use crate::domain::plugin::{PluginId, PLUGIN_EXTENSION};
use crate::domain::repository::{DocumentKind, StateRepository};
use crate::domain::task::{Task, TaskSource};
use crate::domain::workspace::WorkspaceStore;

pub const SAMPLE_PLUGIN: &str = "sample_plugin";
pub const SAMPLE_PLUGIN_SOURCE: &str = "fn process(values) {\n    return 0;\n}\n";

pub fn sample_task() -> Result<Task> {
    Ok(Task {
        name: "list_sum".to_string(),
        plugin: PluginId::new(SAMPLE_PLUGIN)?,
        function: "process".to_string(),
        phase: 0,
        difficulty: 1,
        category: "sum".to_string(),
        description: "Return the sum of a list of numbers.".to_string(),
        requirements: vec![
            "process([1, 2, 3]) == 6".to_string(),
            "process([]) == 0".to_string(),
            "process([-1, 1]) == 0".to_string(),
        ],
        prerequisites: vec![],
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetReport {
    pub backup_dir: PathBuf,
    pub state_documents: usize,
    pub plugins: usize,
    pub tasks: usize,
}

pub struct ResetService {
    store: Arc<dyn WorkspaceStore>,
    tasks: Arc<dyn TaskSource>,
    repository: Arc<dyn StateRepository>,
    backups_dir: PathBuf,
}

impl ResetService {
    pub fn new(
        store: Arc<dyn WorkspaceStore>,
        tasks: Arc<dyn TaskSource>,
        repository: Arc<dyn StateRepository>,
        backups_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            tasks,
            repository,
            backups_dir: backups_dir.into(),
        }
    }

    /// Archive and clear state, plugins and tasks, then reseed. Nothing is
    /// removed until every item has been written to the backup.
    pub async fn reset(&self) -> Result<ResetReport> {
        let backup_dir = self.backup_dir(&["state", "plugins", "tasks"]).await?;

        let documents = self
            .repository
            .export()
            .await
            .context("Failed to read state documents")?;
        let plugins = self.store.export().await.context("Failed to read plugins")?;
        let tasks = self.tasks.export().await.context("Failed to read tasks")?;

        archive_documents(&backup_dir, &documents).await?;
        for plugin in &plugins {
            let path = backup_dir
                .join("plugins")
                .join(format!("{}.{}", plugin.id, PLUGIN_EXTENSION));
            archive(&path, &plugin.source).await?;
        }
        for (file_name, raw) in &tasks {
            archive(&backup_dir.join("tasks").join(file_name), raw).await?;
        }

        self.repository
            .clear()
            .await
            .context("Failed to clear state documents")?;
        self.store.clear().await.context("Failed to clear plugins")?;
        self.tasks.clear().await.context("Failed to clear tasks")?;

        let sample = PluginId::new(SAMPLE_PLUGIN)?;
        self.store
            .write(&sample, SAMPLE_PLUGIN_SOURCE, None)
            .await
            .context("Failed to write sample plugin")?;
        self.tasks
            .save(&sample_task()?)
            .await
            .context("Failed to write sample task")?;

        info!(
            backup = %backup_dir.display(),
            state_documents = documents.len(),
            plugins = plugins.len(),
            tasks = tasks.len(),
            "Workspace reset"
        );
        Ok(ResetReport {
            backup_dir,
            state_documents: documents.len(),
            plugins: plugins.len(),
            tasks: tasks.len(),
        })
    }

    /// Rewind the persisted curriculum to phase 0 and clear every streak.
    /// Plugins, task definitions and the Stage are kept; the state
    /// documents are archived first.
    pub async fn reset_curriculum(&self, curriculum: &CurriculumController) -> Result<ResetReport> {
        let backup_dir = self.backup_dir(&["state"]).await?;
        let documents = self
            .repository
            .export()
            .await
            .context("Failed to read state documents")?;
        archive_documents(&backup_dir, &documents).await?;

        let mut state = self.repository.load().await.context("Failed to load state")?;
        curriculum.reset(&mut state);
        self.repository
            .save(&state)
            .await
            .context("Failed to save state")?;

        info!(
            backup = %backup_dir.display(),
            stage = %state.stage,
            "Curriculum reset"
        );
        Ok(ResetReport {
            backup_dir,
            state_documents: documents.len(),
            plugins: 0,
            tasks: 0,
        })
    }

    async fn backup_dir(&self, subdirs: &[&str]) -> Result<PathBuf> {
        let stamp = Utc::now().format("%Y%m%d-%H%M%S%.3f").to_string();
        let backup_dir = self.backups_dir.join(stamp);
        for sub in subdirs {
            tokio::fs::create_dir_all(backup_dir.join(sub))
                .await
                .with_context(|| format!("Failed to create backup directory {:?}", backup_dir))?;
        }
        Ok(backup_dir)
    }
}

async fn archive_documents(backup_dir: &Path, documents: &[(DocumentKind, Vec<u8>)]) -> Result<()> {
    for (kind, raw) in documents {
        let path = backup_dir.join("state").join(format!("{}.json", kind.file_stem()));
        archive(&path, raw).await?;
    }
    Ok(())
}

async fn archive(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to archive {:?}", path))
}
