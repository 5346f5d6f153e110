// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Curriculum
//!
//! Phase pointer plus per-phase task sets and mastery counts. A task is
//! active when its phase is at or below the current phase, it is not
//! stale, and every prerequisite is mastered.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::task::{Task, TaskBook};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseProgress {
    pub tasks: Vec<String>,
    pub mastered: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurriculumState {
    pub phase: u32,
    pub phases: BTreeMap<u32, PhaseProgress>,
}

impl CurriculumState {
    /// Rebuild the per-phase task sets and mastery counts from the
    /// current task set. The phase pointer is untouched.
    pub fn sync(&mut self, tasks: &[Task], book: &TaskBook) {
        let mut phases: BTreeMap<u32, PhaseProgress> = BTreeMap::new();
        for task in tasks {
            let progress = phases.entry(task.phase).or_default();
            progress.tasks.push(task.name.clone());
            if book.is_mastered(&task.name) {
                progress.mastered += 1;
            }
        }
        for progress in phases.values_mut() {
            progress.tasks.sort();
        }
        self.phases = phases;
    }

    pub fn highest_phase(&self) -> Option<u32> {
        self.phases
            .iter()
            .rev()
            .find(|(_, p)| !p.tasks.is_empty())
            .map(|(phase, _)| *phase)
    }

    /// Advance at most one phase if the current phase met its quota.
    /// `quota_for` returns the configured quota for a phase, if any; the
    /// default quota is every task in the phase.
    pub fn try_advance(&mut self, quota_for: impl Fn(u32) -> Option<usize>) -> Option<u32> {
        let highest = self.highest_phase()?;
        if self.phase >= highest {
            return None;
        }
        let current = self.phases.get(&self.phase).cloned().unwrap_or_default();
        let quota = quota_for(self.phase)
            .unwrap_or(current.tasks.len())
            .min(current.tasks.len());
        if current.mastered >= quota {
            self.phase += 1;
            Some(self.phase)
        } else {
            None
        }
    }

    pub fn active_tasks<'a>(&self, tasks: &'a [Task], book: &TaskBook) -> Vec<&'a Task> {
        let known: BTreeSet<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        tasks
            .iter()
            .filter(|t| t.phase <= self.phase)
            .filter(|t| !book.get(&t.name).map(|s| s.stale).unwrap_or(false))
            .filter(|t| {
                t.prerequisites
                    .iter()
                    .all(|pre| known.contains(pre.as_str()) && book.is_mastered(pre))
            })
            .collect()
    }

    pub fn mastered_total(&self) -> usize {
        self.phases.values().map(|p| p.mastered).sum()
    }

    pub fn reset(&mut self) {
        self.phase = 0;
        for progress in self.phases.values_mut() {
            progress.mastered = 0;
        }
    }
}
