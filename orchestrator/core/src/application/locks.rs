// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Per-plugin write locks.
//!
//! At most one candidate per plugin may be between snapshot and
//! commit/rollback. The guard is owned so it can be held across awaits and
//! is released on every exit path when dropped.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::plugin::PluginId;

#[derive(Default, Clone)]
pub struct PluginLocks {
    locks: Arc<DashMap<PluginId, Arc<Mutex<()>>>>,
}

impl PluginLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, plugin: &PluginId) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the map shard is not held across the await.
        let lock = self
            .locks
            .entry(plugin.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    pub fn try_acquire(&self, plugin: &PluginId) -> Option<OwnedMutexGuard<()>> {
        let lock = self
            .locks
            .entry(plugin.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.try_lock_owned().ok()
    }
}
