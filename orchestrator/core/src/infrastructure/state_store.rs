// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! JSON state repository.
//!
//! Each [`DocumentKind`] is stored as `<dir>/<stem>.json`. Writes go through
//! a temp file and a rename. A document that cannot be decoded, or carries
//! a different version, loads as its default so the loop can continue.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::repository::{
    CurriculumDocument, DocumentKind, StateDocument, StateError, StateRepository, STATE_VERSION,
};
use crate::domain::state::MindState;

pub struct JsonStateRepository {
    dir: PathBuf,
}

impl JsonStateRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, kind: DocumentKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.file_stem()))
    }

    async fn read_raw(&self, kind: DocumentKind) -> Result<Option<Vec<u8>>, StateError> {
        match tokio::fs::read(self.path_for(kind)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_document<T>(&self, kind: DocumentKind) -> Result<T, StateError>
    where
        T: DeserializeOwned + Default,
    {
        let Some(raw) = self.read_raw(kind).await? else {
            return Ok(T::default());
        };
        match serde_json::from_slice::<StateDocument<T>>(&raw) {
            Ok(doc) if doc.version == STATE_VERSION => Ok(doc.body),
            Ok(doc) => {
                warn!(
                    kind = "persistence_corrupt",
                    document = kind.file_stem(),
                    version = doc.version,
                    expected = STATE_VERSION,
                    "Unsupported state document version, starting from default"
                );
                Ok(T::default())
            }
            Err(e) => {
                warn!(
                    kind = "persistence_corrupt",
                    document = kind.file_stem(),
                    error = %e,
                    "Corrupt state document, starting from default"
                );
                Ok(T::default())
            }
        }
    }

    async fn save_document<T: Serialize>(&self, kind: DocumentKind, body: T) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(&StateDocument::new(body))?;
        let target = self.path_for(kind);
        let temp = self
            .dir
            .join(format!(".{}.json.tmp-{}", kind.file_stem(), Uuid::new_v4()));
        tokio::fs::write(&temp, json).await?;
        if let Err(e) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl StateRepository for JsonStateRepository {
    async fn load(&self) -> Result<MindState, StateError> {
        let curriculum: CurriculumDocument =
            self.load_document(DocumentKind::CurriculumState).await?;
        Ok(MindState {
            stage: curriculum.stage,
            curriculum: curriculum.curriculum,
            tasks: self.load_document(DocumentKind::TasksState).await?,
            memory: self.load_document(DocumentKind::BrainMemory).await?,
            metrics: self.load_document(DocumentKind::Metrics).await?,
        })
    }

    async fn save(&self, state: &MindState) -> Result<(), StateError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        self.save_document(DocumentKind::BrainMemory, &state.memory).await?;
        self.save_document(
            DocumentKind::CurriculumState,
            CurriculumDocument {
                curriculum: state.curriculum.clone(),
                stage: state.stage,
            },
        )
        .await?;
        self.save_document(DocumentKind::TasksState, &state.tasks).await?;
        self.save_document(DocumentKind::Metrics, &state.metrics).await?;
        debug!(dir = %self.dir.display(), "Saved state");
        Ok(())
    }

    async fn export(&self) -> Result<Vec<(DocumentKind, Vec<u8>)>, StateError> {
        let mut documents = Vec::new();
        for kind in DocumentKind::ALL {
            if let Some(raw) = self.read_raw(kind).await? {
                documents.push((kind, raw));
            }
        }
        Ok(documents)
    }

    async fn clear(&self) -> Result<usize, StateError> {
        let mut removed = 0;
        for kind in DocumentKind::ALL {
            match tokio::fs::remove_file(self.path_for(kind)).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stage::Stage;

    #[tokio::test]
    async fn test_missing_state_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonStateRepository::new(dir.path().join("state"));
        assert_eq!(repo.load().await.unwrap(), MindState::default());
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonStateRepository::new(dir.path().join("state"));
        let mut state = MindState::default();
        state.stage = Stage(2);
        state.metrics.steps = 7;
        state.tasks.entry("list_sum").success_streak = 2;

        repo.save(&state).await.unwrap();
        let loaded = repo.load().await.unwrap();

        assert_eq!(loaded, state);
        for kind in DocumentKind::ALL {
            assert!(repo.dir().join(format!("{}.json", kind.file_stem())).exists());
        }
    }

    #[tokio::test]
    async fn test_corrupt_document_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonStateRepository::new(dir.path());
        let mut state = MindState::default();
        state.metrics.steps = 3;
        state.tasks.entry("list_sum").passes = 1;
        repo.save(&state).await.unwrap();

        tokio::fs::write(dir.path().join("metrics.json"), "{not json").await.unwrap();
        tokio::fs::write(
            dir.path().join("tasks_state.json"),
            r#"{"version": 99, "saved_at": "2026-01-01T00:00:00Z", "body": {}}"#,
        )
        .await
        .unwrap();

        let loaded = repo.load().await.unwrap();
        assert_eq!(loaded.metrics.steps, 0);
        assert!(loaded.tasks.is_empty());
    }

    #[tokio::test]
    async fn test_non_utf8_document_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonStateRepository::new(dir.path());
        let mut state = MindState::default();
        state.memory.age = 5;
        state.metrics.steps = 5;
        repo.save(&state).await.unwrap();

        tokio::fs::write(dir.path().join("brain_memory.json"), [0xff, 0xfe, 0x00, 0x7b])
            .await
            .unwrap();

        let loaded = repo.load().await.unwrap();
        assert_eq!(loaded.memory.age, 0);
        assert_eq!(loaded.metrics.steps, 5);
    }

    #[tokio::test]
    async fn test_export_keeps_documents_and_clear_removes_them() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonStateRepository::new(dir.path());
        repo.save(&MindState::default()).await.unwrap();
        tokio::fs::write(dir.path().join("metrics.json"), [0xff, 0xfe]).await.unwrap();

        let exported = repo.export().await.unwrap();
        assert_eq!(exported.len(), 4);
        assert!(exported
            .iter()
            .any(|(kind, raw)| *kind == DocumentKind::Metrics && raw[..] == [0xff, 0xfe]));
        assert_eq!(repo.export().await.unwrap().len(), 4);

        assert_eq!(repo.clear().await.unwrap(), 4);
        assert!(repo.export().await.unwrap().is_empty());
        assert_eq!(repo.clear().await.unwrap(), 0);
    }
}
