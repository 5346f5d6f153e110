// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! YAML task definitions.
//!
//! One task per `<dir>/*.yml` file:
//!
//! ```yaml
//! name: list_sum
//! target_plugin: sample_plugin
//! target_function: process
//! phase: 0
//! category: sum
//! description: Sum a list of numbers.
//! requirements:
//!   - process([1, 2, 3]) == 6
//! ```
//!
//! Unreadable or invalid files are skipped with a warning; a later file
//! reusing an earlier task name is ignored.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::task::{Task, TaskSource, TaskSourceError};

pub const TASK_EXTENSION: &str = "yml";

pub struct YamlTaskSource {
    dir: PathBuf,
}

impl YamlTaskSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn task_files(&self) -> Result<Vec<PathBuf>, std::io::Error> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e),
        };
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yml") | Some("yaml")
            ) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

pub fn parse_task(yaml: &str) -> Result<Task, TaskSourceError> {
    let task: Task =
        serde_yaml::from_str(yaml).map_err(|e| TaskSourceError::Serialization(e.to_string()))?;
    if task.name.trim().is_empty() {
        return Err(TaskSourceError::Serialization("task name is empty".into()));
    }
    Ok(task)
}

fn file_name_for(task: &Task) -> String {
    let stem: String = task
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}.{}", stem, TASK_EXTENSION)
}

#[async_trait]
impl TaskSource for YamlTaskSource {
    async fn load(&self) -> Vec<Task> {
        let files = match self.task_files().await {
            Ok(files) => files,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Failed to list task directory");
                return vec![];
            }
        };

        let mut seen = BTreeSet::new();
        let mut tasks = Vec::new();
        for path in files {
            let yaml = match tokio::fs::read_to_string(&path).await {
                Ok(yaml) => yaml,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable task file");
                    continue;
                }
            };
            match parse_task(&yaml) {
                Ok(task) if !seen.insert(task.name.clone()) => {
                    warn!(path = %path.display(), task = %task.name, "Skipping duplicate task name");
                }
                Ok(task) => tasks.push(task),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping invalid task file"),
            }
        }
        debug!(count = tasks.len(), "Loaded tasks");
        tasks
    }

    async fn save(&self, task: &Task) -> Result<(), TaskSourceError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let yaml =
            serde_yaml::to_string(task).map_err(|e| TaskSourceError::Serialization(e.to_string()))?;
        tokio::fs::write(self.dir.join(file_name_for(task)), yaml).await?;
        Ok(())
    }

    async fn export(&self) -> Result<Vec<(String, Vec<u8>)>, TaskSourceError> {
        let mut files = Vec::new();
        for path in self.task_files().await? {
            let content = tokio::fs::read(&path).await?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            files.push((name, content));
        }
        Ok(files)
    }

    async fn clear(&self) -> Result<usize, TaskSourceError> {
        let mut removed = 0;
        for path in self.task_files().await? {
            tokio::fs::remove_file(&path).await?;
            removed += 1;
        }
        Ok(removed)
    }
}
