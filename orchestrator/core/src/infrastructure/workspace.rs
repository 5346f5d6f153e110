// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Workspace store implementations.
//!
//! [`FsWorkspaceStore`] keeps one `<id>.plug` file per unit and replaces
//! files with a temp-file-and-rename so readers never see a partial
//! write. [`InMemoryWorkspaceStore`] backs tests and dry runs.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::plugin::{Checksum, Plugin, PluginId, PLUGIN_EXTENSION};
use crate::domain::workspace::{Snapshot, WorkspaceError, WorkspaceStore};

pub struct FsWorkspaceStore {
    dir: PathBuf,
}

impl FsWorkspaceStore {
    /// Open (creating if needed) the plugin directory and verify that it
    /// is writable.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| WorkspaceError::NotWritable(format!("{}: {}", dir.display(), e)))?;
        let probe = dir.join(format!(".write-probe-{}", Uuid::new_v4()));
        tokio::fs::write(&probe, b"")
            .await
            .map_err(|e| WorkspaceError::NotWritable(format!("{}: {}", dir.display(), e)))?;
        let _ = tokio::fs::remove_file(&probe).await;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &PluginId) -> PathBuf {
        self.dir.join(format!("{}.{}", id, PLUGIN_EXTENSION))
    }

    async fn read_optional(&self, id: &PluginId) -> Result<Option<String>, WorkspaceError> {
        match tokio::fs::read_to_string(self.path_for(id)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_atomic(&self, id: &PluginId, content: &str) -> Result<(), WorkspaceError> {
        let target = self.path_for(id);
        let temp = self
            .dir
            .join(format!(".{}.{}.tmp-{}", id, PLUGIN_EXTENSION, Uuid::new_v4()));
        tokio::fs::write(&temp, content).await?;
        if let Err(e) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl WorkspaceStore for FsWorkspaceStore {
    async fn read(&self, id: &PluginId) -> Result<Plugin, WorkspaceError> {
        self.read_optional(id)
            .await?
            .map(|source| Plugin::new(id.clone(), source))
            .ok_or_else(|| WorkspaceError::NotFound(id.clone()))
    }

    async fn write(
        &self,
        id: &PluginId,
        content: &str,
        expected: Option<&Checksum>,
    ) -> Result<Checksum, WorkspaceError> {
        if let Some(expected) = expected {
            let current = self
                .read_optional(id)
                .await?
                .ok_or_else(|| WorkspaceError::NotFound(id.clone()))?;
            let actual = Checksum::of(&current);
            if &actual != expected {
                return Err(WorkspaceError::ChecksumMismatch {
                    plugin: id.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        self.write_atomic(id, content).await?;
        let checksum = Checksum::of(content);
        debug!(plugin = %id, checksum = checksum.short(), "Wrote unit");
        Ok(checksum)
    }

    async fn list(&self) -> Result<Vec<PluginId>, WorkspaceError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PLUGIN_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match PluginId::new(stem) {
                Ok(id) => ids.push(id),
                Err(e) => warn!(path = %path.display(), error = %e, "Ignoring unit with invalid name"),
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn snapshot(&self, id: &PluginId) -> Result<Snapshot, WorkspaceError> {
        Ok(Snapshot {
            plugin: id.clone(),
            content: self.read_optional(id).await?,
            taken_at: Utc::now(),
        })
    }

    async fn restore(&self, snapshot: &Snapshot) -> Result<(), WorkspaceError> {
        match &snapshot.content {
            Some(content) => self.write_atomic(&snapshot.plugin, content).await,
            None => match tokio::fs::remove_file(self.path_for(&snapshot.plugin)).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
        }
    }

    async fn clear(&self) -> Result<usize, WorkspaceError> {
        let mut removed = 0;
        for id in self.list().await? {
            match tokio::fs::remove_file(self.path_for(&id)).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}

#[derive(Default)]
pub struct InMemoryWorkspaceStore {
    units: RwLock<BTreeMap<PluginId, String>>,
}

impl InMemoryWorkspaceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkspaceStore for InMemoryWorkspaceStore {
    async fn read(&self, id: &PluginId) -> Result<Plugin, WorkspaceError> {
        self.units
            .read()
            .get(id)
            .map(|source| Plugin::new(id.clone(), source.clone()))
            .ok_or_else(|| WorkspaceError::NotFound(id.clone()))
    }

    async fn write(
        &self,
        id: &PluginId,
        content: &str,
        expected: Option<&Checksum>,
    ) -> Result<Checksum, WorkspaceError> {
        let mut units = self.units.write();
        if let Some(expected) = expected {
            let current = units
                .get(id)
                .ok_or_else(|| WorkspaceError::NotFound(id.clone()))?;
            let actual = Checksum::of(current);
            if &actual != expected {
                return Err(WorkspaceError::ChecksumMismatch {
                    plugin: id.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        units.insert(id.clone(), content.to_string());
        Ok(Checksum::of(content))
    }

    async fn list(&self) -> Result<Vec<PluginId>, WorkspaceError> {
        Ok(self.units.read().keys().cloned().collect())
    }

    async fn snapshot(&self, id: &PluginId) -> Result<Snapshot, WorkspaceError> {
        Ok(Snapshot {
            plugin: id.clone(),
            content: self.units.read().get(id).cloned(),
            taken_at: Utc::now(),
        })
    }

    async fn restore(&self, snapshot: &Snapshot) -> Result<(), WorkspaceError> {
        let mut units = self.units.write();
        match &snapshot.content {
            Some(content) => {
                units.insert(snapshot.plugin.clone(), content.clone());
            }
            None => {
                units.remove(&snapshot.plugin);
            }
        }
        Ok(())
    }

    async fn clear(&self) -> Result<usize, WorkspaceError> {
        Ok(std::mem::take(&mut *self.units.write()).len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> PluginId {
        PluginId::new("sample_plugin").unwrap()
    }

    #[tokio::test]
    async fn test_fs_write_read_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::open(dir.path().join("plugins")).await.unwrap();
        let checksum = store.write(&id(), "fn process(v) { return 0; }", None).await.unwrap();
        tokio::fs::write(store.dir().join("notes.txt"), "ignored").await.unwrap();

        let plugin = store.read(&id()).await.unwrap();
        assert_eq!(plugin.checksum, checksum);
        assert_eq!(store.list().await.unwrap(), vec![id()]);
    }

    #[tokio::test]
    async fn test_fs_expected_checksum_guards_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::open(dir.path()).await.unwrap();
        let first = store.write(&id(), "a", None).await.unwrap();
        store.write(&id(), "b", Some(&first)).await.unwrap();

        let err = store.write(&id(), "c", Some(&first)).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::ChecksumMismatch { .. }));
        assert_eq!(store.read(&id()).await.unwrap().source, "b");
    }

    #[tokio::test]
    async fn test_fs_snapshot_restore_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::open(dir.path()).await.unwrap();
        store.write(&id(), "original\n", None).await.unwrap();
        let snapshot = store.snapshot(&id()).await.unwrap();

        store.write(&id(), "changed", None).await.unwrap();
        store.restore(&snapshot).await.unwrap();
        assert_eq!(store.read(&id()).await.unwrap().source, "original\n");

        let missing = store.snapshot(&PluginId::new("ghost").unwrap()).await.unwrap();
        store.write(&PluginId::new("ghost").unwrap(), "x", None).await.unwrap();
        store.restore(&missing).await.unwrap();
        assert!(matches!(
            store.read(&PluginId::new("ghost").unwrap()).await,
            Err(WorkspaceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fs_export_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::open(dir.path()).await.unwrap();
        store.write(&id(), "a", None).await.unwrap();

        let exported = store.export().await.unwrap();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].source, "a");
        assert_eq!(store.list().await.unwrap(), vec![id()]);

        assert_eq!(store.clear().await.unwrap(), 1);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_store_checksum_token() {
        let store = InMemoryWorkspaceStore::new();
        let first = store.write(&id(), "a", None).await.unwrap();
        assert!(store.write(&id(), "b", Some(&Checksum::of("zzz"))).await.is_err());
        assert_eq!(store.checksum(&id()).await.unwrap(), first);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unwritable_root_is_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o500)).unwrap();

        // Root ignores permission bits.
        let probe = locked.join("probe");
        if std::fs::write(&probe, b"").is_ok() {
            return;
        }
        assert!(matches!(
            FsWorkspaceStore::open(&locked).await,
            Err(WorkspaceError::NotWritable(_))
        ));
    }
}
