// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Hidden `harness-worker` command
//!
//! Child side of the process runner: reads a `HarnessJob` JSON file,
//! evaluates it and writes the outcomes to stdout as a JSON array. Any
//! failure exits non-zero with the reason on stderr.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use mindloop_core::domain::harness::HarnessJob;
use mindloop_core::infrastructure::runners::run_job_blocking;

pub async fn run(job_path: &Path) -> Result<()> {
    let raw = tokio::fs::read(job_path)
        .await
        .with_context(|| format!("Failed to read job {:?}", job_path))?;
    let job: HarnessJob = serde_json::from_slice(&raw).context("Malformed harness job")?;

    let outcomes = tokio::task::spawn_blocking(move || run_job_blocking(&job))
        .await
        .context("Evaluation task failed")??;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, &outcomes).context("Failed to write outcomes")?;
    stdout.flush()?;
    Ok(())
}
