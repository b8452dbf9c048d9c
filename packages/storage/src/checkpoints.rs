// ABOUTME: Append-only checkpoint log, one JSON file per pipeline run
// ABOUTME: Any prior snapshot can be retrieved by index for rollback

use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use promptforge_core::{Checkpoint, Draft, QualityScore};

use crate::error::{StorageError, StorageResult};
use crate::STORAGE_VERSION;

#[derive(Debug, Serialize, Deserialize)]
struct RunRecord {
    version: String,
    run_id: String,
    checkpoints: Vec<Checkpoint>,
}

/// Append-only snapshot log for a single pipeline run.
pub struct CheckpointLog {
    dir: PathBuf,
    run_id: String,
    checkpoints: Vec<Checkpoint>,
}

impl CheckpointLog {
    pub fn new(dir: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            run_id: run_id.into(),
            checkpoints: Vec::new(),
        }
    }

    /// Appends a snapshot of the current stage and persists the run file.
    pub async fn snapshot(
        &mut self,
        stage: &str,
        draft: Option<Draft>,
        score: Option<QualityScore>,
        notes: impl Into<String>,
    ) -> StorageResult<&Checkpoint> {
        let checkpoint = Checkpoint {
            id: self.checkpoints.len() as u32,
            stage: stage.to_string(),
            timestamp: Utc::now(),
            draft,
            score,
            notes: notes.into(),
        };
        self.checkpoints.push(checkpoint);
        self.persist().await?;

        debug!(
            run_id = %self.run_id,
            stage,
            total = self.checkpoints.len(),
            "Checkpoint recorded"
        );
        Ok(self.checkpoints.last().expect("just pushed"))
    }

    /// Ordered list of checkpoints, oldest first. The newest is "current".
    pub fn list(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Returns the checkpoint at `index` for rollback inspection.
    pub fn rollback(&self, index: usize) -> StorageResult<&Checkpoint> {
        self.checkpoints
            .get(index)
            .ok_or(StorageError::CheckpointOutOfRange(index))
    }

    /// Reloads a previously persisted run.
    pub async fn load(dir: impl Into<PathBuf>, run_id: &str) -> StorageResult<Self> {
        let dir = dir.into();
        let path = dir.join(format!("{}.json", run_id));
        let content = fs::read_to_string(&path).await?;
        let record: RunRecord = serde_json::from_str(&content)?;

        Ok(Self {
            dir,
            run_id: record.run_id,
            checkpoints: record.checkpoints,
        })
    }

    async fn persist(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.dir).await?;
        let record = RunRecord {
            version: STORAGE_VERSION.to_string(),
            run_id: self.run_id.clone(),
            checkpoints: self.checkpoints.clone(),
        };
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(self.dir.join(format!("{}.json", self.run_id)), json).await?;
        Ok(())
    }
}
