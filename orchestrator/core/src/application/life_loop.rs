// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Life Loop Driver
//!
//! Sequences one step of the agent:
//!
//! ```text
//! age++ -> reload tasks -> sync -> observe -> select targets
//!       -> per target: probe, then propose -> validate -> execute -> accept/rollback
//!       -> escalate-check -> curriculum-check -> reflection -> persist
//! ```
//!
//! All mutable state lives in the [`MindState`] passed into and returned
//! from [`LifeLoop::step`]. A failing step is logged and published as
//! `StepFailed`; the loop keeps going.
//!
//! The step is split into a plan (everything up to candidate generation),
//! per-target attempts, and a finish. Sequential mode runs the attempts in
//! order; pipeline mode hands them to concurrent workers.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Step clock and orchestration of the mutation loop

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::acceptance::AcceptanceController;
use crate::application::curriculum::CurriculumController;
use crate::application::drive_scorer::{DriveScorer, Target};
use crate::application::escalation::EscalationController;
use crate::application::pipeline;
use crate::application::proposer::MutationProposer;
use crate::application::telemetry;
use crate::domain::events::LoopEvent;
use crate::domain::knowledge::{ConsultRequest, Reflector};
use crate::domain::mind_config::{LoopConfig, LoopMode};
use crate::domain::mutation::MutationCandidate;
use crate::domain::outcome::ErrorSignature;
use crate::domain::plugin::{Plugin, PluginId};
use crate::domain::repository::StateRepository;
use crate::domain::state::{CandidateReport, Decision, MindState};
use crate::domain::task::{Task, TaskSource};
use crate::domain::workspace::WorkspaceStore;
use crate::infrastructure::event_bus::EventBus;

/// Every collaborator of a step. Cheap to clone.
#[derive(Clone)]
pub struct LoopComponents {
    pub store: Arc<dyn WorkspaceStore>,
    pub tasks: Arc<dyn TaskSource>,
    pub repository: Arc<dyn StateRepository>,
    pub scorer: Arc<DriveScorer>,
    pub proposer: Arc<MutationProposer>,
    pub acceptance: Arc<AcceptanceController>,
    pub escalation: Arc<EscalationController>,
    pub curriculum: Arc<CurriculumController>,
    pub reflector: Arc<dyn Reflector>,
    pub event_bus: Arc<EventBus>,
}

/// Work for one selected target.
#[derive(Debug, Clone)]
pub struct WorkOrder {
    /// Position in the step's target ranking.
    pub index: usize,
    pub target: Target,
    pub live: Plugin,
    /// Active tasks of the target plugin; all must pass for a commit.
    pub tasks: Vec<Task>,
    pub candidates: Vec<MutationCandidate>,
    pub context_signature: Option<ErrorSignature>,
}

#[derive(Debug, Clone)]
pub struct StepPlan {
    pub step: u64,
    pub tasks: Vec<Task>,
    pub plugins: Vec<PluginId>,
    pub orders: Vec<WorkOrder>,
}

impl StepPlan {
    pub fn targets(&self) -> Vec<PluginId> {
        self.orders.iter().map(|o| o.target.plugin.clone()).collect()
    }
}

impl LoopComponents {
    /// Probe the live unit, then try candidates in order until one
    /// commits. Touches no state; the returned reports carry the deltas.
    pub async fn attempt(
        &self,
        order: &WorkOrder,
        known: &[PluginId],
        cancel: &CancellationToken,
    ) -> Result<Vec<CandidateReport>> {
        let tasks: Vec<&Task> = order.tasks.iter().collect();
        let probe = self
            .acceptance
            .probe(&order.live, &order.target.task, &tasks)
            .await;
        if probe.decision == Decision::Practice {
            debug!(plugin = %order.live.id, task = %order.target.task.name, "Live unit already passes");
            return Ok(vec![probe]);
        }

        let mut reports = Vec::new();
        for candidate in order.candidates.iter().cloned() {
            if cancel.is_cancelled() {
                break;
            }
            let report = self
                .acceptance
                .process(candidate, &tasks, known, order.context_signature, cancel)
                .await?;
            let done = report.is_commit() || report.decision == Decision::Cancelled;
            reports.push(report);
            if done {
                break;
            }
        }
        Ok(reports)
    }

    /// Fold reports into the state in order. Returns the commit count.
    pub fn apply_reports(&self, state: &mut MindState, reports: &[CandidateReport]) -> usize {
        let threshold = self.curriculum.mastery_threshold();
        let mut committed = 0;
        for report in reports {
            telemetry::record_decision(&report.decision);
            let mastered = state.apply(report, threshold, Utc::now());
            self.curriculum.announce_mastered(&mastered);
            if report.is_commit() {
                committed += 1;
            }
        }
        committed
    }
}

pub struct LifeLoop {
    config: LoopConfig,
    components: LoopComponents,
    shutdown_token: CancellationToken,
}

impl LifeLoop {
    pub fn new(config: LoopConfig, components: LoopComponents) -> Self {
        Self {
            config,
            components,
            shutdown_token: CancellationToken::new(),
        }
    }

    pub fn components(&self) -> &LoopComponents {
        &self.components
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Get a handle to trigger shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Run one step. Never fails: errors are logged and published.
    pub async fn step(&self, mut state: MindState) -> MindState {
        let started = Instant::now();
        let result = match self.config.mode {
            LoopMode::Sequential => self.run_sequential(&mut state, started).await,
            LoopMode::Pipeline => pipeline::run_step(self, &mut state, started).await,
        };
        if let Err(e) = result {
            let error = format!("{:#}", e);
            warn!(step = state.memory.age, error = %error, "Step failed");
            self.components
                .event_bus
                .publish_loop_event(LoopEvent::StepFailed {
                    step: state.memory.age,
                    error,
                    failed_at: Utc::now(),
                });
        }
        state
    }

    async fn run_sequential(&self, state: &mut MindState, started: Instant) -> Result<()> {
        let plan = self.plan(state).await?;
        let mut committed = 0;
        for order in &plan.orders {
            if self.shutdown_token.is_cancelled() {
                break;
            }
            match self
                .components
                .attempt(order, &plan.plugins, &self.shutdown_token)
                .await
            {
                Ok(reports) => committed += self.components.apply_reports(state, &reports),
                Err(e) => warn!(
                    plugin = %order.target.plugin,
                    error = %format!("{:#}", e),
                    "Target attempt failed"
                ),
            }
        }
        self.finish(state, &plan, committed, started).await
    }

    /// Everything up to candidate generation.
    pub async fn plan(&self, state: &mut MindState) -> Result<StepPlan> {
        let c = &self.components;
        state.memory.age += 1;
        state.metrics.steps += 1;
        let step = state.memory.age;

        let tasks = c.tasks.load().await;
        c.curriculum.sync(state, &tasks);

        let plugins = c.store.list().await.context("Failed to list plugins")?;
        let mut live = BTreeMap::new();
        for id in &plugins {
            let plugin = match c.store.read(id).await {
                Ok(plugin) => plugin,
                Err(e) => {
                    warn!(plugin = %id, error = %e, "Failed to read unit");
                    continue;
                }
            };
            match plugin.summary() {
                Ok(summary) => state.memory.observe(summary),
                Err(e) => debug!(plugin = %id, error = %e, "Unit does not parse; not observed"),
            }
            live.insert(id.clone(), plugin);
        }

        let active = state.curriculum.active_tasks(&tasks, &state.tasks);
        let targets = c
            .scorer
            .select_targets(&plugins, &active, state, self.config.targets_per_step);

        let mut orders = Vec::with_capacity(targets.len());
        for (index, target) in targets.into_iter().enumerate() {
            let Some(plugin) = live.get(&target.plugin) else {
                continue;
            };
            state.memory.visit(&target.plugin);
            let plugin_tasks: Vec<Task> = active
                .iter()
                .filter(|t| t.plugin == target.plugin)
                .map(|t| (*t).clone())
                .collect();
            let candidates = c
                .proposer
                .propose(plugin, &target.task, state.stage, &state.memory);
            debug!(
                step,
                plugin = %target.plugin,
                task = %target.task.name,
                score = target.score,
                candidates = candidates.len(),
                "Selected target"
            );
            orders.push(WorkOrder {
                index,
                context_signature: state.memory.last_signature.get(&target.plugin).copied(),
                live: plugin.clone(),
                tasks: plugin_tasks,
                candidates,
                target,
            });
        }

        Ok(StepPlan {
            step,
            tasks,
            plugins,
            orders,
        })
    }

    /// Escalate-check, curriculum-check, reflection and persistence.
    pub async fn finish(
        &self,
        state: &mut MindState,
        plan: &StepPlan,
        committed: usize,
        started: Instant,
    ) -> Result<()> {
        let c = &self.components;
        let consult = c.escalation.check(state).await;
        c.curriculum.evaluate(state, &plan.tasks);
        self.reflect(state, plan, committed, consult.as_ref()).await;

        c.repository
            .save(state)
            .await
            .context("Failed to persist state")?;

        telemetry::record_step(state, started.elapsed());
        info!(
            step = plan.step,
            stage = %state.stage,
            phase = state.curriculum.phase,
            targets = plan.orders.len(),
            committed,
            "Step completed"
        );
        c.event_bus.publish_loop_event(LoopEvent::StepCompleted {
            step: plan.step,
            stage: state.stage,
            phase: state.curriculum.phase,
            targets: plan.targets(),
            committed,
            completed_at: Utc::now(),
        });
        Ok(())
    }

    async fn reflect(
        &self,
        state: &mut MindState,
        plan: &StepPlan,
        committed: usize,
        consult: Option<&ConsultRequest>,
    ) {
        let targets: Vec<String> = plan.targets().iter().map(|p| p.to_string()).collect();
        let summary = format!(
            "step {}: stage {}, phase {}, targets [{}], {} committed, {} accepted in total",
            plan.step,
            state.stage,
            state.curriculum.phase,
            targets.join(", "),
            committed,
            state.memory.accepted_mutations,
        );
        let knowledge = consult
            .and_then(|r| state.memory.knowledge.get(&r.signature))
            .map(|k| k.text.clone());
        let text = self
            .components
            .reflector
            .reflect(&summary, knowledge.as_deref())
            .await;
        if !text.is_empty() {
            state.memory.last_reflection = Some(text);
        }
    }

    /// Load the persisted state and step until `max_steps` or shutdown.
    pub async fn run(&self) -> Result<MindState> {
        let mut state = self
            .components
            .repository
            .load()
            .await
            .context("Failed to load state")?;

        info!(
            age = state.memory.age,
            stage = %state.stage,
            phase = state.curriculum.phase,
            max_steps = ?self.config.max_steps,
            interval = ?self.config.step_interval,
            mode = ?self.config.mode,
            "Starting life loop"
        );

        let mut steps = 0u64;
        loop {
            if self.shutdown_token.is_cancelled() {
                break;
            }
            state = self.step(state).await;
            steps += 1;
            if self.config.max_steps.is_some_and(|max| steps >= max) {
                break;
            }
            if self.pause(self.config.step_interval).await {
                break;
            }
        }

        info!(steps, age = state.memory.age, "Life loop stopped");
        Ok(state)
    }

    /// Sleep between steps. Returns true when shutdown was requested.
    async fn pause(&self, interval: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(interval) => false,
            _ = self.shutdown_token.cancelled() => {
                info!("Shutdown signal received, stopping life loop");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::harness::HarnessAdapter;
    use crate::application::locks::PluginLocks;
    use crate::application::safety_validator::SafetyValidator;
    use crate::domain::knowledge::SilentReflector;
    use crate::domain::mind_config::{
        CurriculumConfig, DriveConfig, EscalationConfig, HarnessConfig, ProposerConfig, SafetyConfig,
    };
    use crate::infrastructure::runners::InterpreterRunner;
    use crate::infrastructure::workspace::InMemoryWorkspaceStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FixedTasks(Vec<Task>);

    #[async_trait]
    impl TaskSource for FixedTasks {
        async fn load(&self) -> Vec<Task> {
            self.0.clone()
        }

        async fn save(&self, _task: &Task) -> Result<(), crate::domain::task::TaskSourceError> {
            Ok(())
        }

        async fn export(&self) -> Result<Vec<(String, Vec<u8>)>, crate::domain::task::TaskSourceError> {
            Ok(vec![])
        }

        async fn clear(&self) -> Result<usize, crate::domain::task::TaskSourceError> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct MemoryRepository {
        saved: Mutex<Option<MindState>>,
    }

    #[async_trait]
    impl StateRepository for MemoryRepository {
        async fn load(&self) -> Result<MindState, crate::domain::repository::StateError> {
            Ok(self.saved.lock().clone().unwrap_or_default())
        }

        async fn save(&self, state: &MindState) -> Result<(), crate::domain::repository::StateError> {
            *self.saved.lock() = Some(state.clone());
            Ok(())
        }

        async fn export(
            &self,
        ) -> Result<Vec<(crate::domain::repository::DocumentKind, Vec<u8>)>, crate::domain::repository::StateError>
        {
            Ok(vec![])
        }

        async fn clear(&self) -> Result<usize, crate::domain::repository::StateError> {
            Ok(0)
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

    async fn life_loop(store: Arc<InMemoryWorkspaceStore>, mode: LoopMode) -> (LifeLoop, Arc<MemoryRepository>) {
        let event_bus = Arc::new(EventBus::with_default_capacity());
        let harness = Arc::new(HarnessAdapter::new(
            Arc::new(InterpreterRunner::new()),
            HarnessConfig::default(),
        ));
        let acceptance = AcceptanceController::new(
            store.clone(),
            SafetyValidator::new(SafetyConfig::default(), Vec::<String>::new()),
            harness,
            PluginLocks::new(),
            event_bus.clone(),
        );
        let repository = Arc::new(MemoryRepository::default());
        let components = LoopComponents {
            store,
            tasks: Arc::new(FixedTasks(vec![list_sum()])),
            repository: repository.clone(),
            scorer: Arc::new(DriveScorer::new(DriveConfig::default())),
            proposer: Arc::new(MutationProposer::new(ProposerConfig::default())),
            acceptance: Arc::new(acceptance),
            escalation: Arc::new(EscalationController::new(
                EscalationConfig::default(),
                vec![],
                event_bus.clone(),
            )),
            curriculum: Arc::new(CurriculumController::new(
                CurriculumConfig::default(),
                event_bus.clone(),
            )),
            reflector: Arc::new(SilentReflector),
            event_bus,
        };
        let config = LoopConfig {
            step_interval: Duration::ZERO,
            max_steps: Some(3),
            mode,
            ..LoopConfig::default()
        };
        (LifeLoop::new(config, components), repository)
    }

    #[tokio::test]
    async fn test_step_commits_sum_recipe_then_practices() {
        let store = Arc::new(InMemoryWorkspaceStore::new());
        let id = PluginId::new("sample_plugin").unwrap();
        store
            .write(&id, "fn process(values) {\n    return 0;\n}\n", None)
            .await
            .unwrap();
        let (life, repository) = life_loop(store.clone(), LoopMode::Sequential).await;

        let state = life.step(MindState::default()).await;
        assert_eq!(state.memory.age, 1);
        assert_eq!(state.metrics.accepted, 1);
        assert_eq!(state.tasks.success_streak("list_sum"), 1);
        assert_eq!(state.memory.visits(&id), 1);
        assert!(repository.saved.lock().is_some());

        let committed = store.read(&id).await.unwrap();
        let state = life.step(state).await;
        assert_eq!(state.metrics.practice_successes, 1);
        assert_eq!(state.tasks.success_streak("list_sum"), 2);
        assert_eq!(store.read(&id).await.unwrap().checksum, committed.checksum);
    }

    #[tokio::test]
    async fn test_run_stops_after_max_steps() {
        let store = Arc::new(InMemoryWorkspaceStore::new());
        store
            .write(
                &PluginId::new("sample_plugin").unwrap(),
                "fn process(values) {\n    return 0;\n}\n",
                None,
            )
            .await
            .unwrap();
        let (life, _) = life_loop(store, LoopMode::Sequential).await;

        let state = life.run().await.unwrap();
        assert_eq!(state.metrics.steps, 3);
    }

    #[tokio::test]
    async fn test_cancelled_loop_does_not_step() {
        let store = Arc::new(InMemoryWorkspaceStore::new());
        let (life, _) = life_loop(store, LoopMode::Sequential).await;
        life.shutdown_token().cancel();

        let state = life.run().await.unwrap();
        assert_eq!(state.metrics.steps, 0);
    }

    #[tokio::test]
    async fn test_empty_workspace_step_still_completes() {
        let store = Arc::new(InMemoryWorkspaceStore::new());
        let (life, repository) = life_loop(store, LoopMode::Sequential).await;
        let mut events = life.components().event_bus.subscribe();

        let state = life.step(MindState::default()).await;

        assert_eq!(state.memory.age, 1);
        assert!(repository.saved.lock().is_some());
        let mut completed = false;
        while let Ok(event) = events.try_recv() {
            if let crate::infrastructure::event_bus::DomainEvent::Loop(LoopEvent::StepCompleted {
                targets,
                ..
            }) = event
            {
                assert!(targets.is_empty());
                completed = true;
            }
        }
        assert!(completed);
    }
}
