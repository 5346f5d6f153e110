// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Safety verdicts. Never persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The candidate was built against content that is no longer live.
    StaleChecksum,
    /// Unknown, protected, or not a plain unit name.
    OutOfScope,
    PatchTooLarge,
    SourceTooLarge,
    /// Resulting syntax tree grew past the configured factor.
    GrowthExceeded,
    Unparsable,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::StaleChecksum => "stale_checksum",
            RejectReason::OutOfScope => "out_of_scope",
            RejectReason::PatchTooLarge => "patch_too_large",
            RejectReason::SourceTooLarge => "source_too_large",
            RejectReason::GrowthExceeded => "growth_exceeded",
            RejectReason::Unparsable => "unparsable",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyVerdict {
    Accept,
    Reject { reason: RejectReason, detail: String },
}

impl SafetyVerdict {
    pub fn reject(reason: RejectReason, detail: impl Into<String>) -> Self {
        SafetyVerdict::Reject {
            reason,
            detail: detail.into(),
        }
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, SafetyVerdict::Accept)
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            SafetyVerdict::Accept => None,
            SafetyVerdict::Reject { reason, .. } => Some(*reason),
        }
    }
}
