// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Workspace Store
//!
//! Versioned access to plugin source units. Writes carry the expected
//! pre-image checksum as an optimistic-concurrency token; snapshots allow
//! a unit to be restored byte-for-byte.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Storage port; `FsWorkspaceStore` and
//!   `InMemoryWorkspaceStore` live in `infrastructure::workspace`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::plugin::{Checksum, Plugin, PluginId};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("plugin not found: {0}")]
    NotFound(PluginId),

    #[error("checksum mismatch for {plugin}: expected {expected}, found {actual}")]
    ChecksumMismatch {
        plugin: PluginId,
        expected: Checksum,
        actual: Checksum,
    },

    #[error("workspace root is not writable: {0}")]
    NotWritable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Exact copy of a unit at a point in time. `content == None` records that
/// the unit did not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub plugin: PluginId,
    pub content: Option<String>,
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn checksum(&self) -> Option<Checksum> {
        self.content.as_deref().map(Checksum::of)
    }
}

#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    async fn read(&self, id: &PluginId) -> Result<Plugin, WorkspaceError>;

    /// Replace a unit's content. When `expected` is given, the write only
    /// happens if the live checksum still matches it.
    async fn write(
        &self,
        id: &PluginId,
        content: &str,
        expected: Option<&Checksum>,
    ) -> Result<Checksum, WorkspaceError>;

    async fn list(&self) -> Result<Vec<PluginId>, WorkspaceError>;

    async fn snapshot(&self, id: &PluginId) -> Result<Snapshot, WorkspaceError>;

    async fn restore(&self, snapshot: &Snapshot) -> Result<(), WorkspaceError>;

    /// Remove every unit, returning how many existed.
    async fn clear(&self) -> Result<usize, WorkspaceError>;

    /// Every unit currently stored, leaving them in place.
    async fn export(&self) -> Result<Vec<Plugin>, WorkspaceError> {
        let mut plugins = Vec::new();
        for id in self.list().await? {
            plugins.push(self.read(&id).await?);
        }
        Ok(plugins)
    }

    async fn checksum(&self, id: &PluginId) -> Result<Checksum, WorkspaceError> {
        Ok(self.read(id).await?.checksum)
    }
}
