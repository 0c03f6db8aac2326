//! Learned-pattern storage port and its implementations.
//!
//! [`PatternStore`] is the load/save pair the learning manager talks to.
//! [`FsPatternStore`] keeps the patterns in one JSON file and writes it
//! atomically (temp file, fsync, rename) so a crash never leaves a torn file.
//! [`MemoryPatternStore`] is for tests and ephemeral runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{ParleyError, Result};
use crate::learning::patterns::LearnedPatterns;

/// Durable home for [`LearnedPatterns`].
#[async_trait]
pub trait PatternStore: Send + Sync {
    /// Load stored patterns; `Ok(None)` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<LearnedPatterns>>;

    /// Replace the stored patterns.
    async fn save(&self, patterns: &LearnedPatterns) -> Result<()>;

    /// Short human-readable label for logs.
    fn describe(&self) -> String;
}

/// Serialise `value` as pretty JSON and write it to `path` atomically.
///
/// The parent directory is created if missing.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| {
        ParleyError::Persistence(format!("failed to create {}: {e}", dir.display()))
    })?;

    let json = serde_json::to_string_pretty(value)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("parley");
    let tmp_path = dir.join(format!(".{file_name}.tmp"));

    std::fs::write(&tmp_path, json.as_bytes()).map_err(|e| {
        ParleyError::Persistence(format!(
            "failed to write temp file {}: {e}",
            tmp_path.display()
        ))
    })?;

    if let Ok(file) = std::fs::File::open(&tmp_path) {
        let _ = file.sync_all();
    }

    std::fs::rename(&tmp_path, path).map_err(|e| {
        ParleyError::Persistence(format!(
            "failed to rename temp file to {}: {e}",
            path.display()
        ))
    })
}

/// Patterns stored as a single JSON file.
#[derive(Debug, Clone)]
pub struct FsPatternStore {
    path: PathBuf,
}

impl FsPatternStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PatternStore for FsPatternStore {
    async fn load(&self) -> Result<Option<LearnedPatterns>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            ParleyError::Persistence(format!(
                "failed to read patterns file {}: {e}",
                self.path.display()
            ))
        })?;
        let patterns = serde_json::from_str(&content).map_err(|e| {
            ParleyError::Persistence(format!(
                "failed to parse patterns file {}: {e}",
                self.path.display()
            ))
        })?;
        Ok(Some(patterns))
    }

    async fn save(&self, patterns: &LearnedPatterns) -> Result<()> {
        write_json_atomic(&self.path, patterns)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory pattern store. Cheaply cloneable; clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryPatternStore {
    patterns: Arc<RwLock<Option<LearnedPatterns>>>,
}

impl MemoryPatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts out holding `patterns`.
    pub fn with_patterns(patterns: LearnedPatterns) -> Self {
        Self {
            patterns: Arc::new(RwLock::new(Some(patterns))),
        }
    }
}

#[async_trait]
impl PatternStore for MemoryPatternStore {
    async fn load(&self) -> Result<Option<LearnedPatterns>> {
        Ok(self.patterns.read().await.clone())
    }

    async fn save(&self, patterns: &LearnedPatterns) -> Result<()> {
        *self.patterns.write().await = Some(patterns.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_owned()
    }
}
