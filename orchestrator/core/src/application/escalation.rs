// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Escalation Controller
//!
//! Turns a sustained error streak into a single outbound knowledge
//! consult. A consult fires when a (plugin, signature) streak exceeds the
//! threshold, the agent's Stage is at least the configured minimum, and
//! the signature is outside its cooldown window. At most one consult is
//! issued per step; the cooldown restarts whether or not the consult
//! succeeded.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** External knowledge acquisition on repeated failure

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::application::telemetry;
use crate::domain::events::LearningEvent;
use crate::domain::knowledge::{ConsultRequest, ConsultSource, KnowledgeClient, KnowledgeEntry};
use crate::domain::mind_config::EscalationConfig;
use crate::domain::stage::Stage;
use crate::domain::state::MindState;
use crate::infrastructure::event_bus::EventBus;

pub struct EscalationController {
    config: EscalationConfig,
    clients: Vec<Arc<dyn KnowledgeClient>>,
    event_bus: Arc<EventBus>,
}

impl EscalationController {
    pub fn new(
        config: EscalationConfig,
        clients: Vec<Arc<dyn KnowledgeClient>>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            config,
            clients,
            event_bus,
        }
    }

    /// Whether a streak of `streak` at `stage` is eligible for a consult.
    pub fn fires(&self, streak: u32, stage: Stage) -> bool {
        streak > self.config.threshold && stage.0 >= self.config.min_stage
    }

    /// Pick the consult for this step, if any: the longest eligible streak
    /// outside its cooldown, ties going to the first plugin/signature.
    pub fn maybe_escalate(&self, state: &MindState) -> Option<ConsultRequest> {
        let memory = &state.memory;
        let (plugin, signature, streak) = memory
            .error_streaks
            .iter()
            .filter(|(_, _, streak)| self.fires(*streak, state.stage))
            .filter(|(_, signature, _)| {
                !memory.in_cooldown(*signature, memory.age, self.config.cooldown_steps)
            })
            .fold(None, |best: Option<(_, _, u32)>, current| match best {
                Some(b) if b.2 >= current.2 => Some(b),
                _ => Some(current),
            })?;
        let source = self.pick_source(memory.next_source)?;
        Some(ConsultRequest {
            plugin: plugin.clone(),
            signature,
            streak,
            source,
        })
    }

    /// Issue `request` and fold the result into the state.
    pub async fn consult(&self, request: &ConsultRequest, state: &mut MindState) {
        let Some(client) = self.clients.iter().find(|c| c.source() == request.source) else {
            return;
        };
        let step = state.memory.age;
        state
            .memory
            .consult_cooldowns
            .insert(request.signature, step);
        state.memory.next_source = request.source.other();
        state.metrics.consults += 1;

        info!(
            plugin = %request.plugin,
            signature = %request.signature,
            streak = request.streak,
            source = %request.source,
            "Consulting external knowledge"
        );
        let succeeded = match client.consult(request).await {
            Ok(text) => {
                let text: String = text.chars().take(self.config.knowledge_max_chars).collect();
                state.memory.knowledge.insert(
                    request.signature,
                    KnowledgeEntry {
                        source: request.source,
                        text,
                        step,
                        fetched_at: Utc::now(),
                    },
                );
                true
            }
            Err(e) => {
                warn!(
                    kind = "knowledge_unavailable",
                    source = %request.source,
                    signature = %request.signature,
                    error = %e,
                    "Knowledge consult failed; continuing without it"
                );
                false
            }
        };

        telemetry::record_consult(&request.source.to_string(), succeeded);
        self.event_bus
            .publish_learning_event(LearningEvent::ConsultIssued {
                plugin: request.plugin.clone(),
                signature: request.signature,
                source: request.source,
                succeeded,
                issued_at: Utc::now(),
            });
    }

    /// The escalate-check of one step.
    pub async fn check(&self, state: &mut MindState) -> Option<ConsultRequest> {
        let request = self.maybe_escalate(state)?;
        self.consult(&request, state).await;
        Some(request)
    }

    fn pick_source(&self, preferred: ConsultSource) -> Option<ConsultSource> {
        let has = |source: ConsultSource| self.clients.iter().any(|c| c.source() == source);
        if has(preferred) {
            Some(preferred)
        } else if has(preferred.other()) {
            Some(preferred.other())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::knowledge::KnowledgeError;
    use crate::domain::outcome::ErrorSignature;
    use crate::domain::plugin::PluginId;

    struct CountingClient {
        source: ConsultSource,
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingClient {
        fn new(source: ConsultSource, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                source,
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl KnowledgeClient for CountingClient {
        fn source(&self) -> ConsultSource {
            self.source
        }

        async fn consult(&self, request: &ConsultRequest) -> Result<String, KnowledgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(KnowledgeError::Timeout);
            }
            Ok(format!("notes about {}", request.signature))
        }
    }

    fn controller(clients: Vec<Arc<dyn KnowledgeClient>>) -> EscalationController {
        EscalationController::new(
            EscalationConfig::default(),
            clients,
            Arc::new(EventBus::with_default_capacity()),
        )
    }

    fn fail_once(state: &mut MindState, plugin: &PluginId) {
        state.memory.age += 1;
        state
            .memory
            .error_streaks
            .increment(plugin, ErrorSignature::TypeMismatch);
    }

    #[tokio::test]
    async fn test_five_failures_one_consult() {
        let graph = CountingClient::new(ConsultSource::Graph, false);
        let escalation = controller(vec![graph.clone()]);
        let plugin = PluginId::new("sample_plugin").unwrap();
        let mut state = MindState {
            stage: Stage(1),
            ..MindState::default()
        };

        for _ in 0..5 {
            fail_once(&mut state, &plugin);
            escalation.check(&mut state).await;
        }

        assert_eq!(graph.calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.metrics.consults, 1);
        let entry = state.memory.knowledge.get(&ErrorSignature::TypeMismatch).unwrap();
        assert_eq!(entry.text, "notes about type_mismatch");
    }

    #[tokio::test]
    async fn test_stage_gate() {
        let graph = CountingClient::new(ConsultSource::Graph, false);
        let escalation = controller(vec![graph.clone()]);
        let plugin = PluginId::new("sample_plugin").unwrap();
        let mut state = MindState::default();
        for _ in 0..10 {
            fail_once(&mut state, &plugin);
            escalation.check(&mut state).await;
        }
        assert_eq!(graph.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_consult_still_cools_down_and_alternates() {
        let graph = CountingClient::new(ConsultSource::Graph, true);
        let web = CountingClient::new(ConsultSource::Web, false);
        let escalation = controller(vec![graph.clone(), web.clone()]);
        let plugin = PluginId::new("sample_plugin").unwrap();
        let mut state = MindState {
            stage: Stage(2),
            ..MindState::default()
        };

        for _ in 0..4 {
            fail_once(&mut state, &plugin);
        }
        let request = escalation.check(&mut state).await.unwrap();
        assert_eq!(request.source, ConsultSource::Graph);
        assert!(state.memory.knowledge.is_empty());
        assert!(escalation.maybe_escalate(&state).is_none());

        state.memory.age += EscalationConfig::default().cooldown_steps;
        let next = escalation.maybe_escalate(&state).unwrap();
        assert_eq!(next.source, ConsultSource::Web);
    }

    #[tokio::test]
    async fn test_no_clients_no_consult() {
        let escalation = controller(vec![]);
        let plugin = PluginId::new("sample_plugin").unwrap();
        let mut state = MindState {
            stage: Stage(3),
            ..MindState::default()
        };
        for _ in 0..6 {
            fail_once(&mut state, &plugin);
        }
        assert!(escalation.check(&mut state).await.is_none());
        assert_eq!(state.metrics.consults, 0);
    }
}
