// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Pipeline mode
//!
//! One step as four stages over bounded channels:
//!
//! ```text
//! planner --WorkOrder--> coder x N --CoderResult--> critic --> memory
//! ```
//!
//! - **planner**: [`LifeLoop::plan`], then feeds one order per target.
//! - **coders**: `coder_workers` tasks sharing the order queue; each runs
//!   probe/propose/validate/execute for a target. Distinct targets never
//!   share a plugin, and the per-plugin lock plus the checksum token keep
//!   concurrent writers apart anyway.
//! - **critic**: applies reports to the state in target order, so the
//!   result does not depend on worker scheduling.
//! - **memory**: [`LifeLoop::finish`] (escalation, curriculum, reflection,
//!   persistence).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::application::life_loop::{LifeLoop, WorkOrder};
use crate::domain::plugin::PluginId;
use crate::domain::state::{CandidateReport, MindState};

struct CoderResult {
    index: usize,
    plugin: PluginId,
    reports: Result<Vec<CandidateReport>>,
}

pub async fn run_step(life: &LifeLoop, state: &mut MindState, started: Instant) -> Result<()> {
    let plan = life.plan(state).await?;
    let workers = life.config().coder_workers.max(1);
    let (order_tx, order_rx) = mpsc::channel::<WorkOrder>(workers);
    let (result_tx, mut result_rx) = mpsc::channel::<CoderResult>(workers);
    let order_rx = Arc::new(Mutex::new(order_rx));
    let known = Arc::new(plan.plugins.clone());

    let mut coders = JoinSet::new();
    for worker in 0..workers {
        let components = life.components().clone();
        let order_rx = order_rx.clone();
        let result_tx = result_tx.clone();
        let known = known.clone();
        let cancel = life.shutdown_token();
        coders.spawn(async move {
            loop {
                let next = order_rx.lock().await.recv().await;
                let Some(order) = next else {
                    break;
                };
                debug!(worker, plugin = %order.target.plugin, "Coder picked up target");
                let reports = components.attempt(&order, &known, &cancel).await;
                let result = CoderResult {
                    index: order.index,
                    plugin: order.target.plugin,
                    reports,
                };
                if result_tx.send(result).await.is_err() {
                    break;
                }
            }
        });
    }
    drop(result_tx);

    let orders = plan.orders.clone();
    let planner = tokio::spawn(async move {
        for order in orders {
            if order_tx.send(order).await.is_err() {
                break;
            }
        }
    });

    let mut results = BTreeMap::new();
    while let Some(result) = result_rx.recv().await {
        results.insert(result.index, result);
    }
    if let Err(e) = planner.await {
        warn!(error = %e, "Pipeline planner task failed");
    }
    while let Some(joined) = coders.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "Coder worker failed");
        }
    }

    let mut committed = 0;
    for result in results.into_values() {
        match result.reports {
            Ok(reports) => committed += life.components().apply_reports(state, &reports),
            Err(e) => warn!(
                plugin = %result.plugin,
                error = %format!("{:#}", e),
                "Target attempt failed"
            ),
        }
    }

    life.finish(state, &plan, committed, started).await
}
