// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Task
//!
//! Declarative task specifications and their per-task learning state.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Task definitions (immutable once loaded), `TaskState`
//!   streak bookkeeping and the `TaskSource` port

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::outcome::ErrorSignature;
use crate::domain::plugin::PluginId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    #[serde(rename = "target_plugin")]
    pub plugin: PluginId,
    #[serde(rename = "target_function", default = "default_function")]
    pub function: String,
    #[serde(default)]
    pub phase: u32,
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<String>,
}

fn default_function() -> String {
    "process".to_string()
}

fn default_difficulty() -> u32 {
    1
}

#[derive(Debug, Error)]
pub enum TaskSourceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Loads the current task set. Reloading may add or remove tasks.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Every valid task definition. Invalid definitions are skipped.
    async fn load(&self) -> Vec<Task>;

    async fn save(&self, task: &Task) -> Result<(), TaskSourceError>;

    /// `(file name, raw content)` of every definition, leaving them in place.
    async fn export(&self) -> Result<Vec<(String, Vec<u8>)>, TaskSourceError>;

    /// Remove every definition, returning how many existed.
    async fn clear(&self) -> Result<usize, TaskSourceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Unknown,
    Passing,
    Failing,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskState {
    pub success_streak: u32,
    pub failure_streak: u32,
    pub mastered: bool,
    pub last_attempt: Option<DateTime<Utc>>,
    pub passes: u64,
    pub fails: u64,
    pub status: TaskStatus,
    pub last_signature: Option<ErrorSignature>,
    pub stale: bool,
}

impl TaskState {
    pub fn record_success(&mut self, mastery_threshold: u32, at: DateTime<Utc>) {
        self.passes += 1;
        self.success_streak += 1;
        self.failure_streak = 0;
        self.status = TaskStatus::Passing;
        self.last_signature = None;
        self.last_attempt = Some(at);
        if self.success_streak >= mastery_threshold {
            self.mastered = true;
        }
    }

    pub fn record_failure(&mut self, signature: Option<ErrorSignature>, at: DateTime<Utc>) {
        self.fails += 1;
        self.success_streak = 0;
        self.failure_streak += 1;
        self.status = TaskStatus::Failing;
        self.last_signature = signature;
        self.last_attempt = Some(at);
        self.mastered = false;
    }

    pub fn clear_streaks(&mut self) {
        self.success_streak = 0;
        self.failure_streak = 0;
        self.mastered = false;
    }
}

/// Per-task state, keyed by task name. Entries are never deleted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskBook(BTreeMap<String, TaskState>);

impl TaskBook {
    /// Creates entries for newly seen tasks and toggles the stale flag for
    /// tasks that disappeared or came back.
    pub fn sync(&mut self, tasks: &[Task]) {
        let live: BTreeSet<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        for task in tasks {
            self.0.entry(task.name.clone()).or_default().stale = false;
        }
        for (name, state) in self.0.iter_mut() {
            if !live.contains(name.as_str()) {
                state.stale = true;
            }
        }
    }

    pub fn get(&self, task: &str) -> Option<&TaskState> {
        self.0.get(task)
    }

    pub fn entry(&mut self, task: &str) -> &mut TaskState {
        self.0.entry(task.to_string()).or_default()
    }

    pub fn is_mastered(&self, task: &str) -> bool {
        self.0.get(task).map(|s| s.mastered).unwrap_or(false)
    }

    pub fn success_streak(&self, task: &str) -> u32 {
        self.0.get(task).map(|s| s.success_streak).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TaskState)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear_streaks(&mut self) {
        self.0.values_mut().for_each(TaskState::clear_streaks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str) -> Task {
        Task {
            name: name.to_string(),
            plugin: PluginId::new("sample_plugin").unwrap(),
            function: "process".into(),
            phase: 0,
            difficulty: 1,
            category: "sum".into(),
            description: String::new(),
            requirements: vec!["process([]) == 0".into()],
            prerequisites: vec![],
        }
    }

    #[test]
    fn test_task_yaml_field_names() {
        let yaml = "name: list_sum\ntarget_plugin: sample_plugin\nrequirements:\n  - process([1]) == 1\n";
        let task: Task = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(task.plugin.as_str(), "sample_plugin");
        assert_eq!(task.function, "process");
        assert_eq!(task.phase, 0);
        assert_eq!(task.difficulty, 1);
    }

    #[test]
    fn test_mastery_set_and_lost() {
        let mut state = TaskState::default();
        let now = Utc::now();
        state.record_success(2, now);
        assert!(!state.mastered);
        state.record_success(2, now);
        assert!(state.mastered);
        state.record_failure(Some(ErrorSignature::AssertionFailed), now);
        assert!(!state.mastered);
        assert_eq!(state.success_streak, 0);
        assert_eq!(state.failure_streak, 1);
        assert_eq!(state.passes, 2);
    }

    #[test]
    fn test_sync_marks_stale_and_revives() {
        let mut book = TaskBook::default();
        book.sync(&[task("a"), task("b")]);
        book.entry("a").success_streak = 3;
        book.sync(&[task("b")]);
        assert!(book.get("a").unwrap().stale);
        assert_eq!(book.success_streak("a"), 3);
        book.sync(&[task("a"), task("b")]);
        assert!(!book.get("a").unwrap().stale);
        assert_eq!(book.len(), 2);
    }
}
