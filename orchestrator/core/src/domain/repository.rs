// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # State Repository Interface
//!
//! Persistence contract for [`MindState`]. The state is stored as four
//! versioned documents, each `{ version, saved_at, body }`:
//!
//! | Document | Body |
//! |----------|------|
//! | `brain_memory` | `BrainMemory` |
//! | `curriculum_state` | `CurriculumState` plus the maturity `Stage` |
//! | `tasks_state` | `TaskBook` |
//! | `metrics` | `MetricsCounters` |
//!
//! A missing document loads as its default. A corrupt or incompatible
//! document also loads as its default, with a `persistence_corrupt`
//! warning, so a bad file never stops the loop.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::curriculum::CurriculumState;
use crate::domain::stage::Stage;
use crate::domain::state::MindState;

pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    BrainMemory,
    CurriculumState,
    TasksState,
    Metrics,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::BrainMemory,
        DocumentKind::CurriculumState,
        DocumentKind::TasksState,
        DocumentKind::Metrics,
    ];

    pub fn file_stem(&self) -> &'static str {
        match self {
            DocumentKind::BrainMemory => "brain_memory",
            DocumentKind::CurriculumState => "curriculum_state",
            DocumentKind::TasksState => "tasks_state",
            DocumentKind::Metrics => "metrics",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDocument<T> {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub body: T,
}

impl<T> StateDocument<T> {
    pub fn new(body: T) -> Self {
        Self {
            version: STATE_VERSION,
            saved_at: Utc::now(),
            body,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurriculumDocument {
    pub curriculum: CurriculumState,
    pub stage: Stage,
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Load the full state. Never fails on a corrupt document.
    async fn load(&self) -> Result<MindState, StateError>;

    async fn save(&self, state: &MindState) -> Result<(), StateError>;

    /// Raw bytes of every document that exists, leaving them in place.
    async fn export(&self) -> Result<Vec<(DocumentKind, Vec<u8>)>, StateError>;

    /// Remove every document, returning how many existed.
    async fn clear(&self) -> Result<usize, StateError>;
}
