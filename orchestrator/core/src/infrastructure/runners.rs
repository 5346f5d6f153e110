// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Test runners.
//!
//! [`InterpreterRunner`] evaluates requirements in-process on the blocking
//! pool. [`ProcessRunner`] hands the same [`HarnessJob`] to a child
//! `harness-worker` process so a runaway evaluation can be killed with the
//! process. Both produce outcomes through [`run_job_blocking`].

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::harness::{HarnessError, HarnessJob, TestRunner};
use crate::domain::mind_config::{HarnessConfig, RunnerKind};
use crate::domain::outcome::{ErrorSignature, TestOutcome};
use crate::lang::{parse_expression, parse_module, Interpreter, Limits, Value};

/// Evaluate every requirement of `job` against its source file. Each
/// requirement gets a fresh interpreter and its own fuel budget.
pub fn run_job_blocking(job: &HarnessJob) -> Result<Vec<TestOutcome>, HarnessError> {
    let source = std::fs::read_to_string(&job.source_path)?;
    let module = match parse_module(&source) {
        Ok(module) => module,
        Err(e) => {
            let detail = e.to_string();
            return Ok(job
                .requirements
                .iter()
                .map(|r| {
                    TestOutcome::fail(
                        &r.task,
                        r.index,
                        &r.expression,
                        ErrorSignature::SyntaxError,
                        detail.clone(),
                    )
                })
                .collect());
        }
    };

    let limits = Limits {
        fuel: job.fuel,
        max_depth: job.max_depth,
    };
    let outcomes = job
        .requirements
        .iter()
        .map(|r| {
            let expr = match parse_expression(&r.expression) {
                Ok(expr) => expr,
                Err(e) => {
                    return TestOutcome::fail(
                        &r.task,
                        r.index,
                        &r.expression,
                        ErrorSignature::SyntaxError,
                        format!("requirement: {}", e),
                    )
                }
            };
            match Interpreter::new(&module, limits).evaluate(&expr) {
                Ok(Value::Bool(true)) => TestOutcome::pass(&r.task, r.index, &r.expression),
                Ok(other) => TestOutcome::fail(
                    &r.task,
                    r.index,
                    &r.expression,
                    ErrorSignature::AssertionFailed,
                    format!("evaluated to {}", other),
                ),
                Err(e) => {
                    TestOutcome::fail(&r.task, r.index, &r.expression, e.signature(), e.to_string())
                }
            }
        })
        .collect();
    Ok(outcomes)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct InterpreterRunner;

impl InterpreterRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TestRunner for InterpreterRunner {
    fn name(&self) -> &'static str {
        "interpreter"
    }

    async fn run(&self, job: &HarnessJob) -> Result<Vec<TestOutcome>, HarnessError> {
        let job = job.clone();
        tokio::task::spawn_blocking(move || run_job_blocking(&job))
            .await
            .map_err(|e| HarnessError::Crashed(e.to_string()))?
    }
}

/// Runs each job in a child process: `<worker> harness-worker --job <file>`.
/// The child writes the outcomes to stdout as a JSON array.
pub struct ProcessRunner {
    program: PathBuf,
}

impl ProcessRunner {
    pub fn new(worker_command: Option<PathBuf>) -> Result<Self, HarnessError> {
        let program = match worker_command {
            Some(path) => path,
            None => std::env::current_exe()
                .map_err(|e| HarnessError::Unavailable(format!("cannot locate worker binary: {}", e)))?,
        };
        Ok(Self { program })
    }
}

#[async_trait]
impl TestRunner for ProcessRunner {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn run(&self, job: &HarnessJob) -> Result<Vec<TestOutcome>, HarnessError> {
        let job_path = job.source_path.with_extension("job.json");
        let payload =
            serde_json::to_vec(job).map_err(|e| HarnessError::Protocol(e.to_string()))?;
        tokio::fs::write(&job_path, payload).await?;

        debug!(program = %self.program.display(), job = %job_path.display(), "Spawning harness worker");
        let output = Command::new(&self.program)
            .arg("harness-worker")
            .arg("--job")
            .arg(&job_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| HarnessError::Unavailable(format!("{}: {}", self.program.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "Harness worker failed");
            return Err(HarnessError::Crashed(format!(
                "worker exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| HarnessError::Protocol(e.to_string()))
    }
}

pub fn build_runner(config: &HarnessConfig) -> Result<Arc<dyn TestRunner>, HarnessError> {
    Ok(match config.runner {
        RunnerKind::Interpreter => Arc::new(InterpreterRunner::new()),
        RunnerKind::Process => Arc::new(ProcessRunner::new(config.worker_command.clone())?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::harness::Requirement;
    use crate::domain::plugin::PluginId;

    fn job(dir: &std::path::Path, source: &str, requirements: &[&str]) -> HarnessJob {
        let source_path = dir.join("sample_plugin.plug");
        std::fs::write(&source_path, source).unwrap();
        HarnessJob {
            plugin: PluginId::new("sample_plugin").unwrap(),
            source_path,
            requirements: requirements
                .iter()
                .enumerate()
                .map(|(index, e)| Requirement {
                    task: "list_sum".into(),
                    index,
                    expression: e.to_string(),
                })
                .collect(),
            fuel: 10_000,
            max_depth: 16,
        }
    }

    #[tokio::test]
    async fn test_interpreter_runner_classifies_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(
            dir.path(),
            "fn process(values) {\n    return 0;\n}\n",
            &["process([]) == 0", "process([1, 2, 3]) == 6", "missing(1) == 1", "process("],
        );

        let outcomes = InterpreterRunner::new().run(&job).await.unwrap();

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].passed);
        assert_eq!(outcomes[1].signature, Some(ErrorSignature::AssertionFailed));
        assert_eq!(outcomes[2].signature, Some(ErrorSignature::UnknownName));
        assert_eq!(outcomes[3].signature, Some(ErrorSignature::SyntaxError));
    }

    #[tokio::test]
    async fn test_unparsable_unit_fails_every_requirement() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path(), "fn process(values {", &["process([]) == 0", "true"]);

        let outcomes = InterpreterRunner::new().run(&job).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes
            .iter()
            .all(|o| o.signature == Some(ErrorSignature::SyntaxError)));
    }

    #[tokio::test]
    async fn test_fuel_exhaustion_is_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(
            dir.path(),
            "fn spin(n) {\n    while true {\n        n = n + 1;\n    }\n    return n;\n}\n",
            &["spin(0) == 1"],
        );

        let outcomes = InterpreterRunner::new().run(&job).await.unwrap();
        assert_eq!(outcomes[0].signature, Some(ErrorSignature::Timeout));
    }

    #[tokio::test]
    async fn test_runaway_allocation_is_timeout_and_deep_requirement_is_syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        let deep = format!("{}process([]){} == 0", "(".repeat(8000), ")".repeat(8000));
        let job = job(
            dir.path(),
            "fn process(values) {\n    let s = [1];\n    while true {\n        s = s + s;\n    }\n}\n",
            &["process([]) == 0", deep.as_str()],
        );

        let outcomes = InterpreterRunner::new().run(&job).await.unwrap();

        assert_eq!(outcomes[0].signature, Some(ErrorSignature::Timeout));
        assert_eq!(outcomes[1].signature, Some(ErrorSignature::SyntaxError));
    }

    #[tokio::test]
    async fn test_missing_worker_binary_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path(), "fn process(v) { return 0; }", &["process([]) == 0"]);
        let runner = ProcessRunner::new(Some(dir.path().join("no-such-binary"))).unwrap();

        let err = runner.run(&job).await.unwrap_err();
        assert!(matches!(err, HarnessError::Unavailable(_)));
    }
}
