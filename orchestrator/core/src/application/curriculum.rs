// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Curriculum Controller
//!
//! Keeps task state and the curriculum in sync with the loaded task set,
//! advances the phase pointer when a phase quota is met, and advances the
//! maturity Stage from accumulated skill. Neither ever moves backwards
//! except through [`CurriculumController::reset`].
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Phase and Stage progression

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::domain::events::LearningEvent;
use crate::domain::mind_config::CurriculumConfig;
use crate::domain::stage::Stage;
use crate::domain::state::MindState;
use crate::domain::task::Task;
use crate::infrastructure::event_bus::EventBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub phase: Option<(u32, u32)>,
    pub stage: Option<(Stage, Stage)>,
}

pub struct CurriculumController {
    config: CurriculumConfig,
    event_bus: Arc<EventBus>,
}

impl CurriculumController {
    pub fn new(config: CurriculumConfig, event_bus: Arc<EventBus>) -> Self {
        Self { config, event_bus }
    }

    pub fn mastery_threshold(&self) -> u32 {
        self.config.mastery_threshold
    }

    pub fn sync(&self, state: &mut MindState, tasks: &[Task]) {
        state.tasks.sync(tasks);
        state.curriculum.sync(tasks, &state.tasks);
    }

    pub fn announce_mastered(&self, tasks: &[String]) {
        for task in tasks {
            info!(task = %task, "Task mastered");
            self.event_bus
                .publish_learning_event(LearningEvent::TaskMastered {
                    task: task.clone(),
                    mastered_at: Utc::now(),
                });
        }
    }

    /// The curriculum-check of one step.
    pub fn evaluate(&self, state: &mut MindState, tasks: &[Task]) -> Progress {
        let mut progress = Progress::default();
        state.curriculum.sync(tasks, &state.tasks);

        let from = state.curriculum.phase;
        let quotas = &self.config.phase_quotas;
        if let Some(to) = state.curriculum.try_advance(|phase| quotas.get(&phase).copied()) {
            info!(from, to, "Curriculum phase advanced");
            self.event_bus
                .publish_learning_event(LearningEvent::PhaseAdvanced {
                    from,
                    to,
                    advanced_at: Utc::now(),
                });
            progress.phase = Some((from, to));
        }

        let implied = Stage::from_skill(state.memory.skill(), &self.config.stage_thresholds);
        let capped = Stage(implied.0.min(self.config.max_stage().min(u8::MAX as usize) as u8));
        if capped > state.stage {
            let from = state.stage;
            state.stage = capped;
            info!(from = %from, to = %capped, skill = state.memory.skill(), "Stage advanced");
            self.event_bus
                .publish_learning_event(LearningEvent::StageAdvanced {
                    from,
                    to: capped,
                    advanced_at: Utc::now(),
                });
            progress.stage = Some((from, capped));
        }
        progress
    }

    /// Back to phase 0 with every streak cleared. Idempotent.
    pub fn reset(&self, state: &mut MindState) {
        state.curriculum.reset();
        state.tasks.clear_streaks();
        state.memory.error_streaks.clear();
        state.metrics.tasks_mastered = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plugin::PluginId;

    fn task(name: &str, phase: u32) -> Task {
        Task {
            name: name.into(),
            plugin: PluginId::new("sample_plugin").unwrap(),
            function: "process".into(),
            phase,
            difficulty: 1,
            category: String::new(),
            description: String::new(),
            requirements: vec![],
            prerequisites: vec![],
        }
    }

    fn controller() -> CurriculumController {
        CurriculumController::new(
            CurriculumConfig::default(),
            Arc::new(EventBus::with_default_capacity()),
        )
    }

    fn master(state: &mut MindState, name: &str) {
        for _ in 0..3 {
            state.tasks.entry(name).record_success(3, Utc::now());
        }
    }

    #[test]
    fn test_phase_advances_once_per_evaluation() {
        let curriculum = controller();
        let tasks = vec![task("a", 0), task("b", 1), task("c", 2)];
        let mut state = MindState::default();
        curriculum.sync(&mut state, &tasks);

        assert_eq!(curriculum.evaluate(&mut state, &tasks).phase, None);
        master(&mut state, "a");
        master(&mut state, "b");
        assert_eq!(curriculum.evaluate(&mut state, &tasks).phase, Some((0, 1)));
        assert_eq!(curriculum.evaluate(&mut state, &tasks).phase, Some((1, 2)));
        assert_eq!(curriculum.evaluate(&mut state, &tasks).phase, None);
        assert_eq!(state.curriculum.phase, 2);
    }

    #[test]
    fn test_stage_is_monotonic_and_capped() {
        let curriculum = controller();
        let mut state = MindState::default();
        state.memory.age = 25;
        let progress = curriculum.evaluate(&mut state, &[]);
        assert_eq!(progress.stage, Some((Stage(0), Stage(2))));

        state.memory.age = 0;
        curriculum.evaluate(&mut state, &[]);
        assert_eq!(state.stage, Stage(2));

        state.memory.age = 10_000;
        curriculum.evaluate(&mut state, &[]);
        assert_eq!(state.stage, Stage(3));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let curriculum = controller();
        let tasks = vec![task("a", 0), task("b", 1)];
        let mut state = MindState::default();
        curriculum.sync(&mut state, &tasks);
        master(&mut state, "a");
        curriculum.evaluate(&mut state, &tasks);
        assert_eq!(state.curriculum.phase, 1);

        curriculum.reset(&mut state);
        let once = state.clone();
        curriculum.reset(&mut state);
        assert_eq!(state, once);
        assert_eq!(state.curriculum.phase, 0);
        assert_eq!(state.tasks.success_streak("a"), 0);
        assert!(!state.tasks.is_mastered("a"));
    }
}
