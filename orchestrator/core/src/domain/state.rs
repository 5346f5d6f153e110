// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mind state
//!
//! All mutable state of the agent lives in [`MindState`], which is passed
//! into and returned from each loop step. Candidate processing produces a
//! [`CandidateReport`]; [`MindState::apply`] turns the report into the
//! mastery, streak, pattern and counter deltas.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::brain::BrainMemory;
use crate::domain::curriculum::CurriculumState;
use crate::domain::metrics::MetricsCounters;
use crate::domain::mutation::{CandidateId, PatternKind};
use crate::domain::outcome::{ErrorSignature, TestOutcome};
use crate::domain::plugin::{Checksum, PluginId};
use crate::domain::safety::RejectReason;
use crate::domain::stage::Stage;
use crate::domain::task::TaskBook;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MindState {
    pub stage: Stage,
    pub curriculum: CurriculumState,
    pub tasks: TaskBook,
    pub memory: BrainMemory,
    pub metrics: MetricsCounters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum Decision {
    /// The live source already satisfies the task; nothing was mutated.
    Practice,
    Committed {
        checksum: Checksum,
    },
    RolledBack {
        signature: Option<ErrorSignature>,
        harness_failure: bool,
    },
    Rejected {
        reason: RejectReason,
    },
    /// Cancellation observed before execution started.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    pub plugin: PluginId,
    /// Task the candidate (or probe) was selected for.
    pub task: String,
    pub candidate_id: Option<CandidateId>,
    pub pattern: Option<PatternKind>,
    /// The plugin's last error signature when the candidate was proposed.
    pub context_signature: Option<ErrorSignature>,
    pub decision: Decision,
    pub outcomes: Vec<TestOutcome>,
    /// Pass/fail per task evaluated in this run.
    pub task_results: BTreeMap<String, bool>,
}

impl CandidateReport {
    pub fn is_commit(&self) -> bool {
        matches!(self.decision, Decision::Committed { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self.decision,
            Decision::Committed { .. } | Decision::Practice
        )
    }
}

impl MindState {
    /// Apply the deltas of one report. Returns tasks that became mastered.
    pub fn apply(
        &mut self,
        report: &CandidateReport,
        mastery_threshold: u32,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let mut newly_mastered = Vec::new();
        match &report.decision {
            Decision::Practice | Decision::Committed { .. } => {
                if let Decision::Committed { .. } = report.decision {
                    self.memory.accepted_mutations += 1;
                    self.metrics.accepted += 1;
                    if let Some(pattern) = report.pattern {
                        self.memory
                            .record_pattern(pattern, report.context_signature, true);
                    }
                } else {
                    self.metrics.practice_successes += 1;
                }
                self.memory.error_streaks.reset_plugin(&report.plugin);
                self.memory.last_signature.remove(&report.plugin);
                for (task, passed) in &report.task_results {
                    if !passed {
                        continue;
                    }
                    let state = self.tasks.entry(task);
                    let was_mastered = state.mastered;
                    state.record_success(mastery_threshold, now);
                    if state.mastered && !was_mastered {
                        newly_mastered.push(task.clone());
                    }
                }
            }
            // Counts against the task, but not against the pattern or the
            // plugin's error streaks.
            Decision::RolledBack {
                signature,
                harness_failure: true,
            } => {
                self.metrics.rejected += 1;
                self.metrics.harness_errors += 1;
                self.tasks.entry(&report.task).record_failure(*signature, now);
            }
            Decision::RolledBack { signature, .. } => {
                self.metrics.rejected += 1;
                if *signature == Some(ErrorSignature::Timeout) {
                    self.metrics.timeouts += 1;
                }
                if let Some(pattern) = report.pattern {
                    self.memory
                        .record_pattern(pattern, report.context_signature, false);
                }
                self.tasks.entry(&report.task).record_failure(*signature, now);
                if let Some(signature) = signature {
                    self.memory
                        .error_streaks
                        .increment(&report.plugin, *signature);
                    self.memory
                        .last_signature
                        .insert(report.plugin.clone(), *signature);
                }
            }
            Decision::Rejected { .. } => {
                self.metrics.rejected += 1;
                self.metrics.safety_rejections += 1;
                if let Some(pattern) = report.pattern {
                    self.memory
                        .record_pattern(pattern, report.context_signature, false);
                }
            }
            Decision::Cancelled => {}
        }
        self.metrics.tasks_mastered = self.tasks.iter().filter(|(_, s)| s.mastered).count() as u64;
        newly_mastered
    }
}
