// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Test harness port.
//!
//! A [`HarnessJob`] names a materialised source file and the requirement
//! expressions to evaluate against it. The same JSON shape is the contract
//! between the process runner and the `harness-worker` subcommand.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::outcome::TestOutcome;
use crate::domain::plugin::PluginId;
use crate::domain::task::Task;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub task: String,
    pub index: usize,
    pub expression: String,
}

impl Requirement {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Vec<Requirement> {
        tasks
            .into_iter()
            .flat_map(|task| {
                task.requirements
                    .iter()
                    .enumerate()
                    .map(|(index, expression)| Requirement {
                        task: task.name.clone(),
                        index,
                        expression: expression.clone(),
                    })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessJob {
    pub plugin: PluginId,
    pub source_path: PathBuf,
    pub requirements: Vec<Requirement>,
    pub fuel: u64,
    pub max_depth: usize,
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("test runner unavailable: {0}")]
    Unavailable(String),

    #[error("test runner crashed: {0}")]
    Crashed(String),

    #[error("malformed runner output: {0}")]
    Protocol(String),

    #[error("sandbox io error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait TestRunner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Evaluate every requirement of the job, in order. Wall-clock limits
    /// are applied by the caller.
    async fn run(&self, job: &HarnessJob) -> Result<Vec<TestOutcome>, HarnessError>;
}
