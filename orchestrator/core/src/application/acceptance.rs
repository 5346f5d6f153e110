// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Acceptance Controller
//!
//! Drives one candidate through its lifecycle:
//!
//! ```text
//! lock ─► read live ─► validate ─► snapshot ─► execute ─► commit | rollback
//!              │            │
//!              │            └─► rejected (harness never invoked)
//!              └─► cancelled (only before execution)
//! ```
//!
//! The per-plugin lock is held from the live read to the terminal state,
//! and the commit write carries the pre-image checksum, so a stale
//! candidate can never overwrite newer content. Once execution starts the
//! candidate always reaches `committed` or `rolled_back`.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Sole writer of plugin content

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::harness::{task_results, HarnessAdapter};
use crate::application::locks::PluginLocks;
use crate::application::safety_validator::SafetyValidator;
use crate::domain::events::MutationEvent;
use crate::domain::harness::Requirement;
use crate::domain::mutation::{CandidateStatus, MutationCandidate};
use crate::domain::outcome::{ErrorSignature, OutcomeSet, TestOutcome};
use crate::domain::plugin::{Plugin, PluginId};
use crate::domain::safety::{RejectReason, SafetyVerdict};
use crate::domain::state::{CandidateReport, Decision};
use crate::domain::task::Task;
use crate::domain::workspace::{WorkspaceError, WorkspaceStore};
use crate::infrastructure::event_bus::EventBus;

pub struct AcceptanceController {
    store: Arc<dyn WorkspaceStore>,
    validator: SafetyValidator,
    harness: Arc<HarnessAdapter>,
    locks: PluginLocks,
    event_bus: Arc<EventBus>,
}

impl AcceptanceController {
    pub fn new(
        store: Arc<dyn WorkspaceStore>,
        validator: SafetyValidator,
        harness: Arc<HarnessAdapter>,
        locks: PluginLocks,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            validator,
            harness,
            locks,
            event_bus,
        }
    }

    pub fn harness(&self) -> &Arc<HarnessAdapter> {
        &self.harness
    }

    /// Evaluate the live content of `plugin` against `tasks` without
    /// mutating it. Reports `Practice` when every task passes.
    pub async fn probe(&self, plugin: &Plugin, selected: &Task, tasks: &[&Task]) -> CandidateReport {
        let requirements = Requirement::from_tasks(tasks.iter().copied());
        let outcomes = self.harness.probe(plugin, &requirements).await;
        let results = task_results(&outcomes);
        let passing = !outcomes.is_empty() && tasks.iter().all(|t| outcomes.task_passed(&t.name));
        let decision = if passing {
            self.event_bus
                .publish_mutation_event(MutationEvent::PracticeSucceeded {
                    plugin: plugin.id.clone(),
                    task: selected.name.clone(),
                    practiced_at: Utc::now(),
                });
            Decision::Practice
        } else {
            rolled_back(&outcomes)
        };
        CandidateReport {
            plugin: plugin.id.clone(),
            task: selected.name.clone(),
            candidate_id: None,
            pattern: None,
            context_signature: None,
            decision,
            outcomes,
            task_results: results,
        }
    }

    /// Run one candidate to a terminal state. `tasks` are the active tasks
    /// of the candidate's plugin; all of them must pass for a commit.
    pub async fn process(
        &self,
        mut candidate: MutationCandidate,
        tasks: &[&Task],
        known: &[PluginId],
        context_signature: Option<ErrorSignature>,
        cancel: &CancellationToken,
    ) -> Result<CandidateReport> {
        let mut report = CandidateReport {
            plugin: candidate.plugin.clone(),
            task: candidate.task.clone(),
            candidate_id: Some(candidate.id),
            pattern: Some(candidate.pattern),
            context_signature,
            decision: Decision::Cancelled,
            outcomes: vec![],
            task_results: Default::default(),
        };

        if cancel.is_cancelled() {
            return Ok(report);
        }

        let _guard = self.locks.acquire(&candidate.plugin).await;

        let live = match self.store.read(&candidate.plugin).await {
            Ok(live) => live,
            Err(WorkspaceError::NotFound(_)) => {
                let verdict = SafetyVerdict::reject(RejectReason::OutOfScope, "unit does not exist");
                return self.reject(candidate, verdict, report);
            }
            Err(e) => return Err(e).context("Failed to read live unit"),
        };

        let verdict = self.validator.validate(&candidate, &live, known);
        if !verdict.is_accept() {
            return self.reject(candidate, verdict, report);
        }
        candidate.transition(CandidateStatus::Validated)?;

        if cancel.is_cancelled() {
            candidate.transition(CandidateStatus::RolledBack)?;
            return Ok(report);
        }

        let snapshot = self
            .store
            .snapshot(&candidate.plugin)
            .await
            .context("Failed to snapshot unit before execution")?;

        candidate.transition(CandidateStatus::Executed)?;
        let requirements = Requirement::from_tasks(tasks.iter().copied());
        let outcomes = self.harness.run(&candidate, &live.source, &requirements).await;
        report.task_results = task_results(&outcomes);

        let accepted = !outcomes.is_empty() && tasks.iter().all(|t| outcomes.task_passed(&t.name));
        if accepted {
            let post = candidate.apply_to(&live.source)?;
            match self
                .store
                .write(&candidate.plugin, &post, Some(&candidate.pre_image))
                .await
            {
                Ok(checksum) => {
                    candidate.transition(CandidateStatus::Committed)?;
                    info!(
                        plugin = %candidate.plugin,
                        pattern = %candidate.pattern,
                        task = %candidate.task,
                        checksum = checksum.short(),
                        "Committed mutation"
                    );
                    self.event_bus
                        .publish_mutation_event(MutationEvent::CandidateCommitted {
                            candidate_id: candidate.id,
                            plugin: candidate.plugin.clone(),
                            pattern: candidate.pattern,
                            task: candidate.task.clone(),
                            checksum: checksum.clone(),
                            committed_at: Utc::now(),
                        });
                    report.decision = Decision::Committed { checksum };
                    report.outcomes = outcomes;
                    return Ok(report);
                }
                Err(WorkspaceError::ChecksumMismatch { actual, .. }) => {
                    warn!(
                        plugin = %candidate.plugin,
                        live = actual.short(),
                        "Live content drifted during execution; rolling back"
                    );
                    report.decision = Decision::RolledBack {
                        signature: None,
                        harness_failure: true,
                    };
                }
                Err(e) => {
                    warn!(plugin = %candidate.plugin, error = %e, "Commit write failed; rolling back");
                    report.decision = Decision::RolledBack {
                        signature: Some(ErrorSignature::HarnessError),
                        harness_failure: true,
                    };
                }
            }
        } else {
            report.decision = rolled_back(&outcomes);
        }

        // Rollback: the live unit must be byte-identical to the snapshot.
        let current = self.store.checksum(&candidate.plugin).await.ok();
        if current != snapshot.checksum() {
            self.store
                .restore(&snapshot)
                .await
                .context("Failed to restore snapshot during rollback")?;
        }
        candidate.transition(CandidateStatus::RolledBack)?;

        let signature = match &report.decision {
            Decision::RolledBack { signature, .. } => *signature,
            _ => None,
        };
        info!(
            plugin = %candidate.plugin,
            pattern = %candidate.pattern,
            task = %candidate.task,
            signature = signature.map(|s| s.as_str()).unwrap_or("none"),
            passed = outcomes.pass_count(),
            failed = outcomes.failure_count(),
            "Rolled back mutation"
        );
        self.event_bus
            .publish_mutation_event(MutationEvent::CandidateRolledBack {
                candidate_id: candidate.id,
                plugin: candidate.plugin.clone(),
                pattern: candidate.pattern,
                task: candidate.task.clone(),
                signature,
                rolled_back_at: Utc::now(),
            });
        report.outcomes = outcomes;
        Ok(report)
    }

    fn reject(
        &self,
        mut candidate: MutationCandidate,
        verdict: SafetyVerdict,
        mut report: CandidateReport,
    ) -> Result<CandidateReport> {
        let (reason, detail) = match verdict {
            SafetyVerdict::Reject { reason, detail } => (reason, detail),
            SafetyVerdict::Accept => return Ok(report),
        };
        candidate.transition(CandidateStatus::Rejected)?;
        info!(
            plugin = %candidate.plugin,
            pattern = %candidate.pattern,
            reason = %reason,
            detail = %detail,
            "Safety rejected candidate"
        );
        self.event_bus
            .publish_mutation_event(MutationEvent::CandidateRejected {
                candidate_id: candidate.id,
                plugin: candidate.plugin.clone(),
                pattern: candidate.pattern,
                reason,
                rejected_at: Utc::now(),
            });
        report.decision = Decision::Rejected { reason };
        Ok(report)
    }
}

/// Decision for a run that did not pass. Empty outcome sets and sets made
/// only of harness errors say nothing about the code under test.
fn rolled_back(outcomes: &[TestOutcome]) -> Decision {
    if outcomes.is_empty() || outcomes.is_harness_failure() {
        return Decision::RolledBack {
            signature: outcomes.dominant_signature(),
            harness_failure: true,
        };
    }
    let failures: Vec<TestOutcome> = outcomes
        .iter()
        .filter(|o| o.signature != Some(ErrorSignature::HarnessError))
        .cloned()
        .collect();
    Decision::RolledBack {
        signature: failures.dominant_signature(),
        harness_failure: false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::harness::{HarnessError, HarnessJob, TestRunner};
    use crate::domain::mind_config::{HarnessConfig, SafetyConfig};
    use crate::domain::mutation::{Patch, PatternKind};
    use crate::domain::plugin::Checksum;
    use crate::infrastructure::runners::InterpreterRunner;
    use crate::infrastructure::workspace::InMemoryWorkspaceStore;

    const SAMPLE: &str = "fn process(values) {\n    return 0;\n}\n";

    struct CountingRunner {
        inner: InterpreterRunner,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TestRunner for CountingRunner {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn run(&self, job: &HarnessJob) -> Result<Vec<TestOutcome>, HarnessError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.run(job).await
        }
    }

    fn list_sum() -> Task {
        Task {
            name: "list_sum".into(),
            plugin: PluginId::new("sample_plugin").unwrap(),
            function: "process".into(),
            phase: 0,
            difficulty: 1,
            category: "sum".into(),
            description: String::new(),
            requirements: vec![
                "process([1, 2, 3]) == 6".into(),
                "process([]) == 0".into(),
                "process([-1, 1]) == 0".into(),
            ],
            prerequisites: vec![],
        }
    }

    async fn setup() -> (AcceptanceController, Arc<InMemoryWorkspaceStore>, Arc<CountingRunner>) {
        let store = Arc::new(InMemoryWorkspaceStore::new());
        let id = PluginId::new("sample_plugin").unwrap();
        store.write(&id, SAMPLE, None).await.unwrap();
        let runner = Arc::new(CountingRunner {
            inner: InterpreterRunner::new(),
            calls: AtomicUsize::new(0),
        });
        let controller = AcceptanceController::new(
            store.clone(),
            SafetyValidator::new(SafetyConfig::default(), vec![]),
            Arc::new(HarnessAdapter::new(runner.clone(), HarnessConfig::default())),
            PluginLocks::new(),
            Arc::new(EventBus::with_default_capacity()),
        );
        (controller, store, runner)
    }

    fn candidate(patch: Patch) -> MutationCandidate {
        MutationCandidate::new(
            PluginId::new("sample_plugin").unwrap(),
            patch,
            PatternKind::KnownRecipe,
            BTreeMap::new(),
            Checksum::of(SAMPLE),
            "list_sum",
        )
    }

    fn body_patch(body: &str) -> Patch {
        let start = SAMPLE.find('{').unwrap() + 1;
        let end = SAMPLE.rfind('}').unwrap();
        Patch::replace(crate::lang::Span::new(start, end), body)
    }

    #[tokio::test]
    async fn test_probe_reports_partial_passes() {
        let (controller, store, _) = setup().await;
        let id = PluginId::new("sample_plugin").unwrap();
        let plugin = store.read(&id).await.unwrap();
        let task = list_sum();
        let report = controller.probe(&plugin, &task, &[&task]).await;
        assert_eq!(report.outcomes.pass_count(), 2);
        assert_eq!(report.outcomes.failure_count(), 1);
        assert!(matches!(
            report.decision,
            Decision::RolledBack {
                signature: Some(ErrorSignature::AssertionFailed),
                harness_failure: false
            }
        ));
    }

    #[tokio::test]
    async fn test_commit_changes_checksum_to_post_image() {
        let (controller, store, _) = setup().await;
        let id = PluginId::new("sample_plugin").unwrap();
        let body = "\n    return sum(values);\n";
        let c = candidate(body_patch(body));
        let expected = Checksum::of(&c.apply_to(SAMPLE).unwrap());
        let task = list_sum();

        let report = controller
            .process(c, &[&task], &[id.clone()], None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.decision, Decision::Committed { checksum: expected.clone() });
        assert_eq!(store.checksum(&id).await.unwrap(), expected);
        assert_eq!(report.task_results.get("list_sum"), Some(&true));
    }

    #[tokio::test]
    async fn test_rollback_leaves_store_identical() {
        let (controller, store, _) = setup().await;
        let id = PluginId::new("sample_plugin").unwrap();
        let task = list_sum();
        let c = candidate(body_patch("\n    return 1;\n"));

        let report = controller
            .process(c, &[&task], &[id.clone()], None, &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(report.decision, Decision::RolledBack { harness_failure: false, .. }));
        assert_eq!(store.read(&id).await.unwrap().source, SAMPLE);
    }

    #[tokio::test]
    async fn test_unparsable_candidate_never_reaches_runner() {
        let (controller, store, runner) = setup().await;
        let id = PluginId::new("sample_plugin").unwrap();
        let task = list_sum();
        let c = candidate(body_patch("\n    return (;\n"));

        let report = controller
            .process(c, &[&task], &[id.clone()], None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            report.decision,
            Decision::Rejected {
                reason: RejectReason::Unparsable
            }
        );
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.read(&id).await.unwrap().source, SAMPLE);
    }

    #[tokio::test]
    async fn test_cancelled_before_execution() {
        let (controller, _, runner) = setup().await;
        let id = PluginId::new("sample_plugin").unwrap();
        let task = list_sum();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = controller
            .process(candidate(body_patch("\n    return sum(values);\n")), &[&task], &[id], None, &cancel)
            .await
            .unwrap();

        assert_eq!(report.decision, Decision::Cancelled);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_candidate_is_rejected() {
        let (controller, store, runner) = setup().await;
        let id = PluginId::new("sample_plugin").unwrap();
        store
            .write(&id, "fn process(values) {\n    return 1;\n}\n", None)
            .await
            .unwrap();
        let task = list_sum();

        let report = controller
            .process(
                candidate(body_patch("\n    return sum(values);\n")),
                &[&task],
                &[id],
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            report.decision,
            Decision::Rejected {
                reason: RejectReason::StaleChecksum
            }
        );
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }
}
