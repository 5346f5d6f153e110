// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Process metrics emitted through the `metrics` facade. Without an
//! installed recorder every call is a no-op.

use std::time::Duration;

use metrics::{counter, gauge, histogram};

use crate::domain::outcome::{OutcomeSet, TestOutcome};
use crate::domain::stage::Stage;
use crate::domain::state::{Decision, MindState};

pub fn record_step(state: &MindState, elapsed: Duration) {
    counter!("mindloop_steps_total").increment(1);
    histogram!("mindloop_step_duration_seconds").record(elapsed.as_secs_f64());
    record_progress(state.stage, state.curriculum.phase, state.metrics.tasks_mastered);
}

pub fn record_progress(stage: Stage, phase: u32, tasks_mastered: u64) {
    gauge!("mindloop_stage").set(stage.0 as f64);
    gauge!("mindloop_curriculum_phase").set(phase as f64);
    gauge!("mindloop_tasks_mastered").set(tasks_mastered as f64);
}

pub fn record_decision(decision: &Decision) {
    let result = match decision {
        Decision::Practice => "practice",
        Decision::Committed { .. } => "committed",
        Decision::RolledBack {
            harness_failure: true,
            ..
        } => "harness_error",
        Decision::RolledBack { .. } => "rolled_back",
        Decision::Rejected { .. } => "rejected",
        Decision::Cancelled => "cancelled",
    };
    counter!("mindloop_candidates_total", "result" => result).increment(1);
}

pub fn record_harness_run(runner: &'static str, elapsed: Duration, outcomes: &[TestOutcome]) {
    histogram!("mindloop_harness_duration_seconds", "runner" => runner)
        .record(elapsed.as_secs_f64());
    counter!("mindloop_requirements_total", "result" => "passed")
        .increment(outcomes.pass_count() as u64);
    counter!("mindloop_requirements_total", "result" => "failed")
        .increment(outcomes.failure_count() as u64);
}

pub fn record_consult(source: &str, succeeded: bool) {
    let status = if succeeded { "ok" } else { "failed" };
    counter!("mindloop_consults_total", "source" => source.to_string(), "status" => status)
        .increment(1);
}
