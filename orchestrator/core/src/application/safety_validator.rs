// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Safety Validator
//!
//! Static checks run on every candidate before any execution. Validation
//! is a pure function of the candidate, the live unit and the config, so
//! the same inputs always produce the same verdict. Checks run cheapest
//! first and the first failing check decides the reason.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Gate in front of the harness; a rejected candidate never
//!   reaches the runner

use std::collections::BTreeSet;

use crate::domain::mind_config::SafetyConfig;
use crate::domain::mutation::MutationCandidate;
use crate::domain::plugin::{Plugin, PluginId};
use crate::domain::safety::{RejectReason, SafetyVerdict};
use crate::lang::parse_module;

/// Pre-images smaller than this many syntax nodes are measured as if they
/// had this many, so a stub can still receive a full body.
pub const GROWTH_FLOOR: usize = 16;

pub struct SafetyValidator {
    config: SafetyConfig,
    protected: BTreeSet<String>,
}

impl SafetyValidator {
    pub fn new(config: SafetyConfig, protected: impl IntoIterator<Item = String>) -> Self {
        Self {
            config,
            protected: protected.into_iter().collect(),
        }
    }

    pub fn validate(
        &self,
        candidate: &MutationCandidate,
        live: &Plugin,
        known: &[PluginId],
    ) -> SafetyVerdict {
        let target = &candidate.plugin;
        if !known.contains(target) || self.protected.contains(target.as_str()) || live.id != *target {
            return SafetyVerdict::reject(
                RejectReason::OutOfScope,
                format!("{} is not a mutable workspace unit", target),
            );
        }

        if live.checksum != candidate.pre_image {
            return SafetyVerdict::reject(
                RejectReason::StaleChecksum,
                format!(
                    "built against {} but live is {}",
                    candidate.pre_image.short(),
                    live.checksum.short()
                ),
            );
        }

        let patch_size = candidate.patch.size();
        if patch_size > self.config.max_patch_bytes {
            return SafetyVerdict::reject(
                RejectReason::PatchTooLarge,
                format!("{} bytes > {}", patch_size, self.config.max_patch_bytes),
            );
        }

        let post = match candidate.apply_to(&live.source) {
            Ok(post) => post,
            Err(e) => return SafetyVerdict::reject(RejectReason::Unparsable, e.to_string()),
        };

        if post.len() > self.config.max_source_bytes {
            return SafetyVerdict::reject(
                RejectReason::SourceTooLarge,
                format!("{} bytes > {}", post.len(), self.config.max_source_bytes),
            );
        }

        let after = match parse_module(&post) {
            Ok(module) => module,
            Err(e) => return SafetyVerdict::reject(RejectReason::Unparsable, e.to_string()),
        };

        let before = parse_module(&live.source)
            .map(|m| m.node_count())
            .unwrap_or(0)
            .max(GROWTH_FLOOR);
        let growth = after.node_count() as f64 / before as f64;
        if growth > self.config.max_growth_factor {
            return SafetyVerdict::reject(
                RejectReason::GrowthExceeded,
                format!(
                    "syntax tree grew {:.1}x (limit {:.1}x)",
                    growth, self.config.max_growth_factor
                ),
            );
        }

        SafetyVerdict::Accept
    }
}
