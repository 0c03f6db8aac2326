//! Session transcript storage.
//!
//! Finished sessions are written as one JSON file each so they can be audited
//! and replayed into the learner later.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::{ParleyError, Result};
use crate::learning::store::write_json_atomic;
use crate::session::transcript::SessionLog;

/// Longest slug taken from the session context for file names.
const SLUG_MAX_CHARS: usize = 30;

/// Durable home for finished session logs.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Persist one session log.
    async fn save(&self, log: &SessionLog) -> Result<()>;

    /// Every stored log, oldest first.
    async fn load_all(&self) -> Result<Vec<SessionLog>>;

    /// Short human-readable label for logs.
    fn describe(&self) -> String;
}

/// Turn free text into a lowercase file-name fragment.
fn slug(text: &str) -> String {
    let mut out = String::new();
    for c in text.chars().take(SLUG_MAX_CHARS) {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "session".to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Transcripts stored as `session_{context}_{timestamp}_{id}.json` files.
#[derive(Debug, Clone)]
pub struct FsTranscriptStore {
    dir: PathBuf,
}

impl FsTranscriptStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            ParleyError::Persistence(format!(
                "failed to create transcript directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn log_path(&self, log: &SessionLog) -> PathBuf {
        let stamp = log.session_start.format("%Y%m%d_%H%M%S");
        let short_id: String = log.id.chars().take(8).collect();
        self.dir.join(format!(
            "session_{}_{stamp}_{short_id}.json",
            slug(&log.super_context)
        ))
    }

    fn read_log(path: &Path) -> Result<SessionLog> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ParleyError::Persistence(format!(
                "failed to read transcript {}: {e}",
                path.display()
            ))
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl TranscriptStore for FsTranscriptStore {
    async fn save(&self, log: &SessionLog) -> Result<()> {
        write_json_atomic(&self.log_path(log), log)
    }

    async fn load_all(&self) -> Result<Vec<SessionLog>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            ParleyError::Persistence(format!(
                "failed to read transcript directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| name.starts_with("session_"))
            })
            .collect();
        paths.sort();

        let mut logs = Vec::with_capacity(paths.len());
        for path in paths {
            match Self::read_log(&path) {
                Ok(log) => logs.push(log),
                Err(e) => warn!(path = %path.display(), "skipping unreadable transcript: {e}"),
            }
        }
        logs.sort_by_key(|log| log.session_start);
        Ok(logs)
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

/// In-memory transcript store for tests and ephemeral runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryTranscriptStore {
    logs: Arc<RwLock<Vec<SessionLog>>>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored logs.
    pub async fn len(&self) -> usize {
        self.logs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.logs.read().await.is_empty()
    }
}

#[async_trait]
impl TranscriptStore for MemoryTranscriptStore {
    async fn save(&self, log: &SessionLog) -> Result<()> {
        self.logs.write().await.push(log.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<SessionLog>> {
        Ok(self.logs.read().await.clone())
    }

    fn describe(&self) -> String {
        "memory".to_owned()
    }
}
