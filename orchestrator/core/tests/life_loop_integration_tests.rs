// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use mindloop_core::application::factory::{create_state_repository, create_task_source};
use mindloop_core::application::reset::{sample_task, SAMPLE_PLUGIN, SAMPLE_PLUGIN_SOURCE};
use mindloop_core::application::{build_life_loop, build_reset_service};
use mindloop_core::domain::events::LoopEvent;
use mindloop_core::domain::mind_config::{LoopMode, MindConfig};
use mindloop_core::domain::plugin::PluginId;
use mindloop_core::domain::repository::StateRepository;
use mindloop_core::domain::state::MindState;
use mindloop_core::domain::task::{Task, TaskSource};
use mindloop_core::domain::workspace::WorkspaceStore;
use mindloop_core::infrastructure::event_bus::{DomainEvent, EventBus};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn config_for(root: &TempDir) -> MindConfig {
    let mut config = MindConfig::default();
    config.workspace.root = root.path().to_path_buf();
    config.life_loop.step_interval = Duration::ZERO;
    config
}

fn sum_task(name: &str, plugin: &str) -> Task {
    let mut task = sample_task().unwrap();
    task.name = name.to_string();
    task.plugin = PluginId::new(plugin).unwrap();
    task
}

#[tokio::test]
async fn test_seeded_workspace_learns_list_sum() {
    let root = tempfile::tempdir().unwrap();
    let config = config_for(&root);
    build_reset_service(&config.workspace)
        .await
        .unwrap()
        .reset()
        .await
        .unwrap();

    let plugin_path = config
        .workspace
        .plugins_dir()
        .join(format!("{}.plug", SAMPLE_PLUGIN));
    assert_eq!(
        std::fs::read_to_string(&plugin_path).unwrap(),
        SAMPLE_PLUGIN_SOURCE
    );

    let event_bus = Arc::new(EventBus::with_default_capacity());
    let mut events = event_bus.subscribe();
    let life = build_life_loop(&config, event_bus).await.unwrap();

    let state = life.step(MindState::default()).await;

    assert_eq!(state.metrics.accepted, 1);
    assert_eq!(state.tasks.success_streak("list_sum"), 1);
    assert_ne!(
        std::fs::read_to_string(&plugin_path).unwrap(),
        SAMPLE_PLUGIN_SOURCE
    );

    // The committed plugin and the step's state survive a restart.
    let reloaded = create_state_repository(&config.workspace)
        .load()
        .await
        .unwrap();
    assert_eq!(reloaded.memory.age, 1);
    assert_eq!(reloaded.metrics.accepted, 1);
    assert_eq!(reloaded.tasks.success_streak("list_sum"), 1);

    let mut committed = false;
    while let Ok(event) = events.try_recv() {
        if let DomainEvent::Loop(LoopEvent::StepCompleted { targets, .. }) = event {
            assert_eq!(targets, vec![PluginId::new(SAMPLE_PLUGIN).unwrap()]);
            committed = true;
        }
    }
    assert!(committed);
}

#[tokio::test]
async fn test_practice_keeps_committed_plugin() {
    let root = tempfile::tempdir().unwrap();
    let config = config_for(&root);
    build_reset_service(&config.workspace)
        .await
        .unwrap()
        .reset()
        .await
        .unwrap();
    let life = build_life_loop(&config, Arc::new(EventBus::with_default_capacity()))
        .await
        .unwrap();
    let id = PluginId::new(SAMPLE_PLUGIN).unwrap();

    let state = life.step(MindState::default()).await;
    let committed = life.components().store.read(&id).await.unwrap();
    let state = life.step(state).await;

    assert_eq!(state.metrics.accepted, 1);
    assert_eq!(state.metrics.practice_successes, 1);
    assert_eq!(state.tasks.success_streak("list_sum"), 2);
    assert_eq!(
        life.components().store.read(&id).await.unwrap().checksum,
        committed.checksum
    );
}

#[tokio::test]
async fn test_pipeline_mode_commits_two_plugins() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config_for(&root);
    config.life_loop.mode = LoopMode::Pipeline;
    config.life_loop.targets_per_step = 2;
    config.life_loop.coder_workers = 2;

    let tasks = create_task_source(&config.workspace);
    tasks.save(&sum_task("alpha_sum", "alpha")).await.unwrap();
    tasks.save(&sum_task("beta_sum", "beta")).await.unwrap();

    let life = build_life_loop(&config, Arc::new(EventBus::with_default_capacity()))
        .await
        .unwrap();
    for name in ["alpha", "beta"] {
        life.components()
            .store
            .write(&PluginId::new(name).unwrap(), SAMPLE_PLUGIN_SOURCE, None)
            .await
            .unwrap();
    }

    let state = life.step(MindState::default()).await;

    assert_eq!(state.memory.age, 1);
    assert_eq!(state.metrics.accepted, 2);
    assert_eq!(state.tasks.success_streak("alpha_sum"), 1);
    assert_eq!(state.tasks.success_streak("beta_sum"), 1);
}

#[tokio::test]
async fn test_run_respects_max_steps_on_disk() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config_for(&root);
    config.life_loop.max_steps = Some(2);
    build_reset_service(&config.workspace)
        .await
        .unwrap()
        .reset()
        .await
        .unwrap();
    let life = build_life_loop(&config, Arc::new(EventBus::with_default_capacity()))
        .await
        .unwrap();

    let state = life.run().await.unwrap();

    assert_eq!(state.metrics.steps, 2);
    let reloaded = create_state_repository(&config.workspace)
        .load()
        .await
        .unwrap();
    assert_eq!(reloaded.metrics.steps, 2);
}

#[tokio::test]
async fn test_reset_archives_progress_and_starts_over() {
    let root = tempfile::tempdir().unwrap();
    let config = config_for(&root);
    let reset = build_reset_service(&config.workspace).await.unwrap();
    reset.reset().await.unwrap();
    let life = build_life_loop(&config, Arc::new(EventBus::with_default_capacity()))
        .await
        .unwrap();
    life.step(MindState::default()).await;

    let report = reset.reset().await.unwrap();

    assert!(report.state_documents > 0);
    assert_eq!(report.plugins, 1);
    assert_eq!(report.tasks, 1);
    assert!(report.backup_dir.join("plugins").is_dir());

    let state = create_state_repository(&config.workspace)
        .load()
        .await
        .unwrap();
    assert_eq!(state.curriculum.phase, 0);
    assert_eq!(state.memory.age, 0);
    assert_eq!(state.tasks.success_streak("list_sum"), 0);
    assert_eq!(
        std::fs::read_to_string(
            config
                .workspace
                .plugins_dir()
                .join(format!("{}.plug", SAMPLE_PLUGIN))
        )
        .unwrap(),
        SAMPLE_PLUGIN_SOURCE
    );
}

#[tokio::test]
async fn test_corrupt_state_document_falls_back_to_defaults() {
    let root = tempfile::tempdir().unwrap();
    let config = config_for(&root);
    build_reset_service(&config.workspace)
        .await
        .unwrap()
        .reset()
        .await
        .unwrap();
    let repository = create_state_repository(&config.workspace);
    let mut state = MindState::default();
    state.metrics.steps = 7;
    repository.save(&state).await.unwrap();

    for entry in std::fs::read_dir(config.workspace.state_dir()).unwrap() {
        std::fs::write(entry.unwrap().path(), "{ not json").unwrap();
    }

    let life = build_life_loop(&config, Arc::new(EventBus::with_default_capacity()))
        .await
        .unwrap();
    let loaded = repository.load().await.unwrap();
    assert_eq!(loaded.metrics.steps, 0);

    let stepped = life.step(loaded).await;
    assert_eq!(stepped.memory.age, 1);
}

#[tokio::test]
async fn test_non_utf8_state_document_does_not_stop_the_loop() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config_for(&root);
    config.life_loop.max_steps = Some(1);
    build_reset_service(&config.workspace)
        .await
        .unwrap()
        .reset()
        .await
        .unwrap();
    let repository = create_state_repository(&config.workspace);
    let mut state = MindState::default();
    state.memory.age = 4;
    repository.save(&state).await.unwrap();
    std::fs::write(
        config.workspace.state_dir().join("brain_memory.json"),
        [0xff, 0xfe, 0x00, 0x7b],
    )
    .unwrap();

    let life = build_life_loop(&config, Arc::new(EventBus::with_default_capacity()))
        .await
        .unwrap();
    let state = life.run().await.unwrap();

    assert_eq!(state.memory.age, 1);
    assert_eq!(state.metrics.steps, 1);
}
