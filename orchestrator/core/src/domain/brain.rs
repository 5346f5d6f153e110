// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Brain memory
//!
//! Long-lived learning state: age, accepted mutations, structural
//! observations, per-plugin visits, learned pattern statistics, error
//! streaks, consult cooldowns and external knowledge.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::domain::knowledge::{ConsultSource, KnowledgeEntry};
use crate::domain::mutation::PatternKind;
use crate::domain::outcome::ErrorSignature;
use crate::domain::plugin::{PluginId, PluginSummary};

pub const MAX_OBSERVATIONS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PatternStats {
    pub attempts: u64,
    pub successes: u64,
}

impl PatternStats {
    pub fn record(&mut self, success: bool) {
        self.attempts += 1;
        if success {
            self.successes += 1;
        }
    }

    /// Laplace-smoothed success rate; 0.5 for an untried pattern.
    pub fn rate(&self) -> f64 {
        (self.successes as f64 + 1.0) / (self.attempts as f64 + 2.0)
    }
}

/// Consecutive failures keyed by (plugin, signature).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorStreaks(BTreeMap<PluginId, BTreeMap<ErrorSignature, u32>>);

impl ErrorStreaks {
    pub fn increment(&mut self, plugin: &PluginId, signature: ErrorSignature) -> u32 {
        let counter = self
            .0
            .entry(plugin.clone())
            .or_default()
            .entry(signature)
            .or_insert(0);
        *counter = counter.saturating_add(1);
        *counter
    }

    pub fn reset_plugin(&mut self, plugin: &PluginId) {
        if let Some(streaks) = self.0.get_mut(plugin) {
            streaks.values_mut().for_each(|v| *v = 0);
        }
    }

    pub fn get(&self, plugin: &PluginId, signature: ErrorSignature) -> u32 {
        self.0
            .get(plugin)
            .and_then(|s| s.get(&signature))
            .copied()
            .unwrap_or(0)
    }

    pub fn max_for(&self, plugin: &PluginId) -> u32 {
        self.0
            .get(plugin)
            .and_then(|s| s.values().max())
            .copied()
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PluginId, ErrorSignature, u32)> {
        self.0
            .iter()
            .flat_map(|(plugin, s)| s.iter().map(move |(sig, n)| (plugin, *sig, *n)))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub step: u64,
    pub summary: PluginSummary,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainMemory {
    pub age: u64,
    pub accepted_mutations: u64,
    pub observations: VecDeque<Observation>,
    pub visits: BTreeMap<PluginId, u64>,
    pub pattern_stats: BTreeMap<PatternKind, PatternStats>,
    pub signature_stats: BTreeMap<ErrorSignature, BTreeMap<PatternKind, PatternStats>>,
    pub last_signature: BTreeMap<PluginId, ErrorSignature>,
    pub error_streaks: ErrorStreaks,
    pub consult_cooldowns: BTreeMap<ErrorSignature, u64>,
    pub next_source: ConsultSource,
    pub knowledge: BTreeMap<ErrorSignature, KnowledgeEntry>,
    pub last_reflection: Option<String>,
}

impl BrainMemory {
    pub fn skill(&self) -> u64 {
        self.age + self.accepted_mutations
    }

    pub fn observe(&mut self, summary: PluginSummary) {
        if self.observations.len() >= MAX_OBSERVATIONS {
            self.observations.pop_front();
        }
        self.observations.push_back(Observation {
            step: self.age,
            summary,
        });
    }

    pub fn visits(&self, plugin: &PluginId) -> u64 {
        self.visits.get(plugin).copied().unwrap_or(0)
    }

    pub fn visit(&mut self, plugin: &PluginId) {
        *self.visits.entry(plugin.clone()).or_insert(0) += 1;
    }

    /// Record a pattern attempt. `context` is the plugin's last error
    /// signature at proposal time, if any.
    pub fn record_pattern(
        &mut self,
        pattern: PatternKind,
        context: Option<ErrorSignature>,
        success: bool,
    ) {
        self.pattern_stats.entry(pattern).or_default().record(success);
        if let Some(signature) = context {
            self.signature_stats
                .entry(signature)
                .or_default()
                .entry(pattern)
                .or_default()
                .record(success);
        }
    }

    pub fn pattern_rate(&self, pattern: PatternKind) -> f64 {
        self.pattern_stats
            .get(&pattern)
            .copied()
            .unwrap_or_default()
            .rate()
    }

    pub fn signature_rate(&self, signature: ErrorSignature, pattern: PatternKind) -> f64 {
        self.signature_stats
            .get(&signature)
            .and_then(|s| s.get(&pattern))
            .copied()
            .unwrap_or_default()
            .rate()
    }

    /// Whether a consult for `signature` is still cooling down at `step`.
    pub fn in_cooldown(&self, signature: ErrorSignature, step: u64, cooldown_steps: u64) -> bool {
        self.consult_cooldowns
            .get(&signature)
            .map(|last| step.saturating_sub(*last) < cooldown_steps)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_streaks_reset_per_plugin() {
        let a = PluginId::new("a").unwrap();
        let b = PluginId::new("b").unwrap();
        let mut streaks = ErrorStreaks::default();
        streaks.increment(&a, ErrorSignature::TypeMismatch);
        streaks.increment(&a, ErrorSignature::TypeMismatch);
        streaks.increment(&a, ErrorSignature::Timeout);
        streaks.increment(&b, ErrorSignature::Timeout);
        assert_eq!(streaks.get(&a, ErrorSignature::TypeMismatch), 2);
        assert_eq!(streaks.max_for(&a), 2);

        streaks.reset_plugin(&a);
        assert_eq!(streaks.max_for(&a), 0);
        assert_eq!(streaks.get(&b, ErrorSignature::Timeout), 1);
    }

    #[test]
    fn test_observations_are_bounded() {
        let mut brain = BrainMemory::default();
        for _ in 0..(MAX_OBSERVATIONS + 5) {
            brain.observe(PluginSummary {
                plugin: PluginId::new("a").unwrap(),
                functions: vec![],
                lines: 1,
            });
        }
        assert_eq!(brain.observations.len(), MAX_OBSERVATIONS);
    }

    #[test]
    fn test_cooldown_window() {
        let mut brain = BrainMemory::default();
        brain.consult_cooldowns.insert(ErrorSignature::Timeout, 10);
        assert!(brain.in_cooldown(ErrorSignature::Timeout, 15, 10));
        assert!(!brain.in_cooldown(ErrorSignature::Timeout, 20, 10));
        assert!(!brain.in_cooldown(ErrorSignature::TypeMismatch, 15, 10));
    }

    #[test]
    fn test_brain_memory_json_roundtrip_with_map_keys() {
        let mut brain = BrainMemory::default();
        let a = PluginId::new("a").unwrap();
        brain.error_streaks.increment(&a, ErrorSignature::AssertionFailed);
        brain.record_pattern(PatternKind::FillStub, Some(ErrorSignature::AssertionFailed), true);
        brain.visit(&a);
        let json = serde_json::to_string(&brain).unwrap();
        let back: BrainMemory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, brain);
    }
}
