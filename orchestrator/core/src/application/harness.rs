// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Execution/Test Harness Adapter
//!
//! Materialises a unit in a throwaway sandbox directory and hands it to
//! the configured [`TestRunner`] under a wall-clock timeout. Runner
//! failures never escape as errors: a timeout becomes a `timeout` outcome
//! and a crash becomes a `harness_error` outcome for every requirement.
//! The live workspace is never touched here.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Bounded, isolated evaluation of candidate and live
//!   source

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::application::telemetry;
use crate::domain::harness::{HarnessJob, Requirement, TestRunner};
use crate::domain::mind_config::HarnessConfig;
use crate::domain::mutation::MutationCandidate;
use crate::domain::outcome::{ErrorSignature, OutcomeSet, TestOutcome};
use crate::domain::plugin::{Plugin, PluginId, PLUGIN_EXTENSION};

pub struct HarnessAdapter {
    runner: Arc<dyn TestRunner>,
    config: HarnessConfig,
}

impl HarnessAdapter {
    pub fn new(runner: Arc<dyn TestRunner>, config: HarnessConfig) -> Self {
        Self { runner, config }
    }

    pub fn runner_name(&self) -> &'static str {
        self.runner.name()
    }

    /// Evaluate `requirements` against the candidate's post-image of
    /// `live_source`.
    pub async fn run(
        &self,
        candidate: &MutationCandidate,
        live_source: &str,
        requirements: &[Requirement],
    ) -> Vec<TestOutcome> {
        match candidate.apply_to(live_source) {
            Ok(post) => self.evaluate(&candidate.plugin, &post, requirements).await,
            Err(e) => all_failed(requirements, ErrorSignature::HarnessError, &e.to_string()),
        }
    }

    /// Evaluate `requirements` against the live content of a unit.
    pub async fn probe(&self, plugin: &Plugin, requirements: &[Requirement]) -> Vec<TestOutcome> {
        self.evaluate(&plugin.id, &plugin.source, requirements).await
    }

    async fn evaluate(
        &self,
        plugin: &PluginId,
        source: &str,
        requirements: &[Requirement],
    ) -> Vec<TestOutcome> {
        if requirements.is_empty() {
            return vec![];
        }

        let sandbox = match tempfile::Builder::new().prefix("mindloop-sandbox-").tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                warn!(plugin = %plugin, error = %e, "Failed to create harness sandbox");
                return all_failed(requirements, ErrorSignature::HarnessError, &e.to_string());
            }
        };
        let source_path = sandbox
            .path()
            .join(format!("{}.{}", plugin, PLUGIN_EXTENSION));
        if let Err(e) = tokio::fs::write(&source_path, source).await {
            warn!(plugin = %plugin, error = %e, "Failed to materialise unit in sandbox");
            return all_failed(requirements, ErrorSignature::HarnessError, &e.to_string());
        }

        let job = HarnessJob {
            plugin: plugin.clone(),
            source_path,
            requirements: requirements.to_vec(),
            fuel: self.config.fuel,
            max_depth: self.config.max_depth,
        };

        let started = Instant::now();
        let result = tokio::time::timeout(self.config.timeout, self.runner.run(&job)).await;
        let outcomes = match result {
            Ok(Ok(outcomes)) => complete(requirements, outcomes),
            Ok(Err(e)) => {
                warn!(
                    plugin = %plugin,
                    runner = self.runner.name(),
                    error = %e,
                    "Test runner failed"
                );
                all_failed(requirements, ErrorSignature::HarnessError, &e.to_string())
            }
            Err(_) => {
                warn!(
                    plugin = %plugin,
                    runner = self.runner.name(),
                    timeout = ?self.config.timeout,
                    "Test run exceeded its wall-clock limit"
                );
                all_failed(
                    requirements,
                    ErrorSignature::Timeout,
                    &format!("exceeded {:?}", self.config.timeout),
                )
            }
        };
        telemetry::record_harness_run(self.runner.name(), started.elapsed(), &outcomes);

        debug!(
            plugin = %plugin,
            passed = outcomes.pass_count(),
            failed = outcomes.failure_count(),
            "Harness run finished"
        );
        // Sandbox directory is removed when `sandbox` drops here.
        outcomes
    }
}

/// Pass/fail per task, over the tasks that have outcomes.
pub fn task_results(outcomes: &[TestOutcome]) -> BTreeMap<String, bool> {
    let mut results = BTreeMap::new();
    for outcome in outcomes {
        results
            .entry(outcome.task.clone())
            .or_insert_with(|| outcomes.task_passed(&outcome.task));
    }
    results
}

fn all_failed(
    requirements: &[Requirement],
    signature: ErrorSignature,
    detail: &str,
) -> Vec<TestOutcome> {
    requirements
        .iter()
        .map(|r| TestOutcome::fail(&r.task, r.index, &r.expression, signature, detail))
        .collect()
}

/// Align runner output to the requested requirements; anything the runner
/// did not report counts as a harness error.
fn complete(requirements: &[Requirement], reported: Vec<TestOutcome>) -> Vec<TestOutcome> {
    let mut by_key: BTreeMap<(String, usize), TestOutcome> = reported
        .into_iter()
        .map(|o| ((o.task.clone(), o.index), o))
        .collect();
    requirements
        .iter()
        .map(|r| {
            by_key.remove(&(r.task.clone(), r.index)).unwrap_or_else(|| {
                TestOutcome::fail(
                    &r.task,
                    r.index,
                    &r.expression,
                    ErrorSignature::HarnessError,
                    "no outcome reported",
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::harness::HarnessError;

    struct SleepyRunner;

    #[async_trait]
    impl TestRunner for SleepyRunner {
        fn name(&self) -> &'static str {
            "sleepy"
        }

        async fn run(&self, _job: &HarnessJob) -> Result<Vec<TestOutcome>, HarnessError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![])
        }
    }

    struct CrashingRunner;

    #[async_trait]
    impl TestRunner for CrashingRunner {
        fn name(&self) -> &'static str {
            "crashing"
        }

        async fn run(&self, _job: &HarnessJob) -> Result<Vec<TestOutcome>, HarnessError> {
            Err(HarnessError::Crashed("exit status 101".into()))
        }
    }

    /// Reports only the first requirement and checks the sandbox file.
    struct PartialRunner;

    #[async_trait]
    impl TestRunner for PartialRunner {
        fn name(&self) -> &'static str {
            "partial"
        }

        async fn run(&self, job: &HarnessJob) -> Result<Vec<TestOutcome>, HarnessError> {
            let source = tokio::fs::read_to_string(&job.source_path).await?;
            assert!(source.contains("fn process"));
            let r = &job.requirements[0];
            Ok(vec![TestOutcome::pass(&r.task, r.index, &r.expression)])
        }
    }

    fn requirements() -> Vec<Requirement> {
        vec![
            Requirement {
                task: "list_sum".into(),
                index: 0,
                expression: "process([1, 2, 3]) == 6".into(),
            },
            Requirement {
                task: "list_sum".into(),
                index: 1,
                expression: "process([]) == 0".into(),
            },
        ]
    }

    fn plugin() -> Plugin {
        Plugin::new(
            PluginId::new("sample_plugin").unwrap(),
            "fn process(values) {\n    return 0;\n}\n",
        )
    }

    fn adapter(runner: Arc<dyn TestRunner>) -> HarnessAdapter {
        let config = HarnessConfig {
            timeout: Duration::from_millis(50),
            ..HarnessConfig::default()
        };
        HarnessAdapter::new(runner, config)
    }

    #[tokio::test]
    async fn test_timeout_marks_every_requirement() {
        let outcomes = adapter(Arc::new(SleepyRunner))
            .probe(&plugin(), &requirements())
            .await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes
            .iter()
            .all(|o| o.signature == Some(ErrorSignature::Timeout)));
    }

    #[tokio::test]
    async fn test_crash_is_harness_error() {
        let outcomes = adapter(Arc::new(CrashingRunner))
            .probe(&plugin(), &requirements())
            .await;
        assert!(outcomes.is_harness_failure());
    }

    #[tokio::test]
    async fn test_missing_outcomes_are_filled() {
        let outcomes = adapter(Arc::new(PartialRunner))
            .probe(&plugin(), &requirements())
            .await;
        assert!(outcomes[0].passed);
        assert_eq!(outcomes[1].signature, Some(ErrorSignature::HarnessError));
        assert_eq!(task_results(&outcomes).get("list_sum"), Some(&false));
    }

    #[tokio::test]
    async fn test_no_requirements_skips_runner() {
        let outcomes = adapter(Arc::new(CrashingRunner)).probe(&plugin(), &[]).await;
        assert!(outcomes.is_empty());
    }
}
