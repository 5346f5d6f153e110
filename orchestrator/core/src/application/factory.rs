// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Component Factory - Application Layer
//!
//! Creates the concrete adapters named by a [`MindConfig`] and wires them
//! into [`LoopComponents`]. The domain only sees the traits; this is the
//! one place that picks implementations.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Startup wiring; configuration errors surface here

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::application::acceptance::AcceptanceController;
use crate::application::curriculum::CurriculumController;
use crate::application::drive_scorer::DriveScorer;
use crate::application::escalation::EscalationController;
use crate::application::harness::HarnessAdapter;
use crate::application::life_loop::{LifeLoop, LoopComponents};
use crate::application::locks::PluginLocks;
use crate::application::proposer::MutationProposer;
use crate::application::reset::ResetService;
use crate::application::safety_validator::SafetyValidator;
use crate::domain::knowledge::{Reflector, SilentReflector};
use crate::domain::mind_config::{MindConfig, ReflectionConfig, WorkspaceConfig};
use crate::domain::repository::StateRepository;
use crate::domain::task::TaskSource;
use crate::domain::workspace::WorkspaceStore;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::knowledge::build_clients;
use crate::infrastructure::reflection::ChatReflector;
use crate::infrastructure::runners::build_runner;
use crate::infrastructure::state_store::JsonStateRepository;
use crate::infrastructure::task_loader::YamlTaskSource;
use crate::infrastructure::workspace::FsWorkspaceStore;

/// Opens the plugin directory. Fails when the root is not writable.
pub async fn create_workspace_store(config: &WorkspaceConfig) -> Result<Arc<dyn WorkspaceStore>> {
    let store = FsWorkspaceStore::open(config.plugins_dir())
        .await
        .context("Workspace root is not usable")?;
    Ok(Arc::new(store))
}

pub fn create_task_source(config: &WorkspaceConfig) -> Arc<dyn TaskSource> {
    Arc::new(YamlTaskSource::new(config.tasks_dir()))
}

pub fn create_state_repository(config: &WorkspaceConfig) -> Arc<dyn StateRepository> {
    Arc::new(JsonStateRepository::new(config.state_dir()))
}

pub fn create_reflector(config: &ReflectionConfig) -> Result<Arc<dyn Reflector>> {
    if !config.enabled {
        return Ok(Arc::new(SilentReflector));
    }
    Ok(Arc::new(ChatReflector::new(config)?))
}

pub async fn build_components(config: &MindConfig, event_bus: Arc<EventBus>) -> Result<LoopComponents> {
    let store = create_workspace_store(&config.workspace).await?;
    let runner = build_runner(&config.harness).context("Failed to create test runner")?;
    let harness = Arc::new(HarnessAdapter::new(runner, config.harness.clone()));
    let validator = SafetyValidator::new(
        config.safety.clone(),
        config.workspace.protected_plugins.iter().cloned(),
    );
    let acceptance = AcceptanceController::new(
        store.clone(),
        validator,
        harness.clone(),
        PluginLocks::new(),
        event_bus.clone(),
    );
    let clients = build_clients(&config.knowledge).context("Failed to create knowledge clients")?;

    info!(
        root = %config.workspace.root.display(),
        runner = harness.runner_name(),
        knowledge_sources = clients.len(),
        reflection = config.reflection.enabled,
        "Components ready"
    );

    Ok(LoopComponents {
        store,
        tasks: create_task_source(&config.workspace),
        repository: create_state_repository(&config.workspace),
        scorer: Arc::new(DriveScorer::new(config.drives.clone())),
        proposer: Arc::new(MutationProposer::new(config.proposer.clone())),
        acceptance: Arc::new(acceptance),
        escalation: Arc::new(EscalationController::new(
            config.escalation.clone(),
            clients,
            event_bus.clone(),
        )),
        curriculum: Arc::new(CurriculumController::new(
            config.curriculum.clone(),
            event_bus.clone(),
        )),
        reflector: create_reflector(&config.reflection)?,
        event_bus,
    })
}

pub async fn build_life_loop(config: &MindConfig, event_bus: Arc<EventBus>) -> Result<LifeLoop> {
    let components = build_components(config, event_bus).await?;
    Ok(LifeLoop::new(config.life_loop.clone(), components))
}

pub async fn build_reset_service(config: &WorkspaceConfig) -> Result<ResetService> {
    Ok(ResetService::new(
        create_workspace_store(config).await?,
        create_task_source(config),
        create_state_repository(config),
        config.backups_dir(),
    ))
}
