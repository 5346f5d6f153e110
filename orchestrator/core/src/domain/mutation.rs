// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mutation
//!
//! Mutation candidates, their byte-range patches and the candidate
//! lifecycle:
//!
//! ```text
//! Proposed ──► Validated ──► Executed ──► Committed
//!    │                          │
//!    ▼                          └───────► RolledBack
//! Rejected
//! ```
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Candidate aggregate and its state machine

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::plugin::{Checksum, PluginId};
use crate::lang::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub Uuid);

impl CandidateId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CandidateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed starter library of mutation patterns, in library order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    KnownRecipe,
    FillStub,
    NoneGuard,
    EmptyGuard,
    AccumulateLoop,
    Annotate,
}

impl PatternKind {
    pub const ALL: [PatternKind; 6] = [
        PatternKind::KnownRecipe,
        PatternKind::FillStub,
        PatternKind::NoneGuard,
        PatternKind::EmptyGuard,
        PatternKind::AccumulateLoop,
        PatternKind::Annotate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::KnownRecipe => "known_recipe",
            PatternKind::FillStub => "fill_stub",
            PatternKind::NoneGuard => "none_guard",
            PatternKind::EmptyGuard => "empty_guard",
            PatternKind::AccumulateLoop => "accumulate_loop",
            PatternKind::Annotate => "annotate",
        }
    }

    pub fn library_index(&self) -> usize {
        Self::ALL.iter().position(|p| p == self).unwrap_or(Self::ALL.len())
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replace the bytes in `span` of the pre-image with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub span: Span,
    pub replacement: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("patch span {start}..{end} is outside the source (length {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("patch span {start}..{end} does not fall on character boundaries")]
    NotCharBoundary { start: usize, end: usize },
}

impl Patch {
    pub fn replace(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(Span::new(at, at), text)
    }

    /// Bytes touched by the patch: removed plus inserted.
    pub fn size(&self) -> usize {
        self.span.len() + self.replacement.len()
    }

    pub fn apply(&self, source: &str) -> Result<String, PatchError> {
        let Span { start, end } = self.span;
        if start > end || end > source.len() {
            return Err(PatchError::OutOfBounds {
                start,
                end,
                len: source.len(),
            });
        }
        if !source.is_char_boundary(start) || !source.is_char_boundary(end) {
            return Err(PatchError::NotCharBoundary { start, end });
        }
        let mut out = String::with_capacity(source.len() - self.span.len() + self.replacement.len());
        out.push_str(&source[..start]);
        out.push_str(&self.replacement);
        out.push_str(&source[end..]);
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Proposed,
    Validated,
    Rejected,
    Executed,
    Committed,
    RolledBack,
}

impl CandidateStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CandidateStatus::Rejected | CandidateStatus::Committed | CandidateStatus::RolledBack
        )
    }

    fn allows(&self, next: CandidateStatus) -> bool {
        use CandidateStatus::*;
        matches!(
            (self, next),
            (Proposed, Validated)
                | (Proposed, Rejected)
                | (Validated, Executed)
                | (Validated, RolledBack)
                | (Executed, Committed)
                | (Executed, RolledBack)
        )
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("illegal candidate transition {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: CandidateStatus,
    pub to: CandidateStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationCandidate {
    pub id: CandidateId,
    pub plugin: PluginId,
    pub patch: Patch,
    pub pattern: PatternKind,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    pub pre_image: Checksum,
    pub task: String,
    status: CandidateStatus,
    pub proposed_at: DateTime<Utc>,
}

impl MutationCandidate {
    pub fn new(
        plugin: PluginId,
        patch: Patch,
        pattern: PatternKind,
        params: BTreeMap<String, String>,
        pre_image: Checksum,
        task: impl Into<String>,
    ) -> Self {
        Self {
            id: CandidateId::new(),
            plugin,
            patch,
            pattern,
            params,
            pre_image,
            task: task.into(),
            status: CandidateStatus::Proposed,
            proposed_at: Utc::now(),
        }
    }

    pub fn status(&self) -> CandidateStatus {
        self.status
    }

    pub fn transition(&mut self, next: CandidateStatus) -> Result<(), TransitionError> {
        if !self.status.allows(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Post-image obtained by applying the patch to `source`.
    pub fn apply_to(&self, source: &str) -> Result<String, PatchError> {
        self.patch.apply(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> MutationCandidate {
        MutationCandidate::new(
            PluginId::new("p").unwrap(),
            Patch::insert(0, "// hi\n"),
            PatternKind::Annotate,
            BTreeMap::new(),
            Checksum::of(""),
            "t",
        )
    }

    #[test]
    fn test_patch_apply() {
        let source = "fn f() { return 0; }";
        let patch = Patch::replace(Span::new(9, 18), "return 1;");
        assert_eq!(patch.apply(source).unwrap(), "fn f() { return 1; }");
        assert_eq!(Patch::insert(0, "// x\n").apply("a").unwrap(), "// x\na");
    }

    #[test]
    fn test_patch_out_of_bounds() {
        let patch = Patch::replace(Span::new(2, 10), "");
        assert!(matches!(
            patch.apply("abc"),
            Err(PatchError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_lifecycle_happy_path() {
        let mut c = candidate();
        c.transition(CandidateStatus::Validated).unwrap();
        c.transition(CandidateStatus::Executed).unwrap();
        c.transition(CandidateStatus::Committed).unwrap();
        assert!(c.status().is_terminal());
    }

    #[test]
    fn test_lifecycle_rejects_skips() {
        let mut c = candidate();
        assert!(c.transition(CandidateStatus::Committed).is_err());
        c.transition(CandidateStatus::Rejected).unwrap();
        assert!(c.transition(CandidateStatus::Validated).is_err());
    }
}
