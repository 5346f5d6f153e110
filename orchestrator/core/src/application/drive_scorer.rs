// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Drive Scorer
//!
//! Priority of a (plugin, task) pair as a weighted sum of independent drive
//! signals. Each [`Drive`] reads a [`DriveInput`] and names the weight it
//! takes from the per-stage table. Scoring is pure and total: a non-finite
//! signal or weight contributes zero.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Target selection for the life loop

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::domain::mind_config::{DriveConfig, DriveWeights};
use crate::domain::plugin::PluginId;
use crate::domain::stage::Stage;
use crate::domain::state::MindState;
use crate::domain::task::{Task, TaskStatus};

/// Everything a drive may look at for one (plugin, task) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveInput {
    pub visits: u64,
    pub success_streak: u32,
    pub max_error_streak: u32,
    pub task_passing: bool,
}

impl DriveInput {
    pub fn from_state(state: &MindState, plugin: &PluginId, task: &Task) -> Self {
        let task_state = state.tasks.get(&task.name);
        Self {
            visits: state.memory.visits(plugin),
            success_streak: task_state.map(|s| s.success_streak).unwrap_or(0),
            max_error_streak: state.memory.error_streaks.max_for(plugin),
            task_passing: task_state
                .map(|s| s.status == TaskStatus::Passing)
                .unwrap_or(false),
        }
    }
}

pub trait Drive: Send + Sync {
    fn name(&self) -> &'static str;
    fn signal(&self, input: &DriveInput) -> f64;
    fn weight(&self, weights: &DriveWeights) -> f64;
}

/// Prefers rarely visited plugins.
pub struct Curiosity;

impl Drive for Curiosity {
    fn name(&self) -> &'static str {
        "curiosity"
    }

    fn signal(&self, input: &DriveInput) -> f64 {
        1.0 / (1.0 + input.visits as f64)
    }

    fn weight(&self, weights: &DriveWeights) -> f64 {
        weights.curiosity
    }
}

/// Prefers tasks that are not yet reliably solved.
pub struct Mastery;

impl Drive for Mastery {
    fn name(&self) -> &'static str {
        "mastery"
    }

    fn signal(&self, input: &DriveInput) -> f64 {
        1.0 / (1.0 + input.success_streak as f64)
    }

    fn weight(&self, weights: &DriveWeights) -> f64 {
        weights.mastery
    }
}

/// Backs away from plugins that keep failing the same way.
pub struct Stability;

impl Drive for Stability {
    fn name(&self) -> &'static str {
        "stability"
    }

    fn signal(&self, input: &DriveInput) -> f64 {
        1.0 / (1.0 + input.max_error_streak as f64)
    }

    fn weight(&self, weights: &DriveWeights) -> f64 {
        weights.stability
    }
}

/// Boost for active tasks that are not passing yet.
pub struct TaskPressure;

impl Drive for TaskPressure {
    fn name(&self) -> &'static str {
        "task_pressure"
    }

    fn signal(&self, input: &DriveInput) -> f64 {
        if input.task_passing {
            0.0
        } else {
            1.0
        }
    }

    fn weight(&self, weights: &DriveWeights) -> f64 {
        weights.task_pressure
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub plugin: PluginId,
    pub task: Task,
    pub score: f64,
}

pub struct DriveScorer {
    config: DriveConfig,
    drives: Vec<Box<dyn Drive>>,
}

impl DriveScorer {
    pub fn new(config: DriveConfig) -> Self {
        Self {
            config,
            drives: vec![
                Box::new(Curiosity),
                Box::new(Mastery),
                Box::new(Stability),
                Box::new(TaskPressure),
            ],
        }
    }

    pub fn with_drive(mut self, drive: Box<dyn Drive>) -> Self {
        self.drives.push(drive);
        self
    }

    pub fn score(&self, input: &DriveInput, stage: Stage) -> f64 {
        let Some(weights) = self.config.weights_for(stage.index()) else {
            return 0.0;
        };
        self.drives
            .iter()
            .map(|drive| {
                let contribution = drive.weight(weights) * drive.signal(input);
                if contribution.is_finite() {
                    contribution
                } else {
                    0.0
                }
            })
            .sum()
    }

    /// Rank every (plugin, active task) pair and keep the best `limit`
    /// pairs with distinct plugins. Ties break by plugin then task name.
    pub fn select_targets(
        &self,
        plugins: &[PluginId],
        active: &[&Task],
        state: &MindState,
        limit: usize,
    ) -> Vec<Target> {
        let known: BTreeSet<&PluginId> = plugins.iter().collect();
        let mut ranked: Vec<Target> = active
            .iter()
            .filter(|task| known.contains(&task.plugin))
            .map(|task| {
                let input = DriveInput::from_state(state, &task.plugin, task);
                Target {
                    plugin: task.plugin.clone(),
                    task: (*task).clone(),
                    score: self.score(&input, state.stage),
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.plugin.cmp(&b.plugin))
                .then_with(|| a.task.name.cmp(&b.task.name))
        });

        let mut seen = BTreeSet::new();
        ranked
            .into_iter()
            .filter(|target| seen.insert(target.plugin.clone()))
            .take(limit)
            .collect()
    }
}
