//! Per-trail progress: completion flag and last reached step.
//!
//! The engine does not call this itself. Bindings consult it to resume a
//! trail or to avoid showing a finished one again.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Failed to access progress file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt progress file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailProgress {
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_step: Option<usize>,
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn is_completed(&self, trail_id: &str) -> Result<bool, ProgressError>;
    async fn mark_completed(&self, trail_id: &str) -> Result<(), ProgressError>;
    async fn last_step(&self, trail_id: &str) -> Result<Option<usize>, ProgressError>;
    async fn save_step(&self, trail_id: &str, index: usize) -> Result<(), ProgressError>;
    async fn reset(&self, trail_id: &str) -> Result<(), ProgressError>;
}

#[derive(Clone, Default)]
pub struct MemoryProgressStore {
    entries: Arc<Mutex<HashMap<String, TrailProgress>>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut HashMap<String, TrailProgress>) -> T) -> T {
        match self.entries.lock() {
            Ok(mut entries) => f(&mut entries),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn is_completed(&self, trail_id: &str) -> Result<bool, ProgressError> {
        Ok(self.with(|e| e.get(trail_id).is_some_and(|p| p.completed)))
    }

    async fn mark_completed(&self, trail_id: &str) -> Result<(), ProgressError> {
        self.with(|e| e.entry(trail_id.to_string()).or_default().completed = true);
        Ok(())
    }

    async fn last_step(&self, trail_id: &str) -> Result<Option<usize>, ProgressError> {
        Ok(self.with(|e| e.get(trail_id).and_then(|p| p.last_step)))
    }

    async fn save_step(&self, trail_id: &str, index: usize) -> Result<(), ProgressError> {
        self.with(|e| e.entry(trail_id.to_string()).or_default().last_step = Some(index));
        Ok(())
    }

    async fn reset(&self, trail_id: &str) -> Result<(), ProgressError> {
        self.with(|e| e.remove(trail_id));
        Ok(())
    }
}

/// All trails in one JSON object keyed by trail id.
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.trailguide/progress/progress.json`
    pub fn default_location() -> Option<Self> {
        dirs::home_dir().map(|home| {
            Self::new(
                home.join(".trailguide")
                    .join("progress")
                    .join("progress.json"),
            )
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<HashMap<String, TrailProgress>, ProgressError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, entries: &HashMap<String, TrailProgress>) -> Result<(), ProgressError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    async fn update(
        &self,
        trail_id: &str,
        f: impl FnOnce(&mut TrailProgress) + Send,
    ) -> Result<(), ProgressError> {
        let mut entries = self.read_all().await?;
        f(entries.entry(trail_id.to_string()).or_default());
        self.write_all(&entries).await
    }
}

#[async_trait]
impl ProgressStore for FileProgressStore {
    async fn is_completed(&self, trail_id: &str) -> Result<bool, ProgressError> {
        Ok(self
            .read_all()
            .await?
            .get(trail_id)
            .is_some_and(|p| p.completed))
    }

    async fn mark_completed(&self, trail_id: &str) -> Result<(), ProgressError> {
        self.update(trail_id, |p| p.completed = true).await
    }

    async fn last_step(&self, trail_id: &str) -> Result<Option<usize>, ProgressError> {
        Ok(self
            .read_all()
            .await?
            .get(trail_id)
            .and_then(|p| p.last_step))
    }

    async fn save_step(&self, trail_id: &str, index: usize) -> Result<(), ProgressError> {
        self.update(trail_id, |p| p.last_step = Some(index)).await
    }

    async fn reset(&self, trail_id: &str) -> Result<(), ProgressError> {
        let mut entries = self.read_all().await?;
        if entries.remove(trail_id).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}
