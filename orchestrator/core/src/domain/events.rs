// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::knowledge::ConsultSource;
use crate::domain::mutation::{CandidateId, PatternKind};
use crate::domain::outcome::ErrorSignature;
use crate::domain::plugin::{Checksum, PluginId};
use crate::domain::safety::RejectReason;
use crate::domain::stage::Stage;

/// Outcome of a single mutation candidate or probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MutationEvent {
    CandidateCommitted {
        candidate_id: CandidateId,
        plugin: PluginId,
        pattern: PatternKind,
        task: String,
        checksum: Checksum,
        committed_at: DateTime<Utc>,
    },
    CandidateRolledBack {
        candidate_id: CandidateId,
        plugin: PluginId,
        pattern: PatternKind,
        task: String,
        signature: Option<ErrorSignature>,
        rolled_back_at: DateTime<Utc>,
    },
    CandidateRejected {
        candidate_id: CandidateId,
        plugin: PluginId,
        pattern: PatternKind,
        reason: RejectReason,
        rejected_at: DateTime<Utc>,
    },
    PracticeSucceeded {
        plugin: PluginId,
        task: String,
        practiced_at: DateTime<Utc>,
    },
}

impl MutationEvent {
    pub fn plugin(&self) -> &PluginId {
        match self {
            MutationEvent::CandidateCommitted { plugin, .. }
            | MutationEvent::CandidateRolledBack { plugin, .. }
            | MutationEvent::CandidateRejected { plugin, .. }
            | MutationEvent::PracticeSucceeded { plugin, .. } => plugin,
        }
    }
}

/// Progress of the agent itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LearningEvent {
    ConsultIssued {
        plugin: PluginId,
        signature: ErrorSignature,
        source: ConsultSource,
        succeeded: bool,
        issued_at: DateTime<Utc>,
    },
    TaskMastered {
        task: String,
        mastered_at: DateTime<Utc>,
    },
    PhaseAdvanced {
        from: u32,
        to: u32,
        advanced_at: DateTime<Utc>,
    },
    StageAdvanced {
        from: Stage,
        to: Stage,
        advanced_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LoopEvent {
    StepCompleted {
        step: u64,
        stage: Stage,
        phase: u32,
        targets: Vec<PluginId>,
        committed: usize,
        completed_at: DateTime<Utc>,
    },
    StepFailed {
        step: u64,
        error: String,
        failed_at: DateTime<Utc>,
    },
}
