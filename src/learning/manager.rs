//! Shared owner of the learned patterns.
//!
//! One [`LearningManager`] serves every conversation in a process. The
//! patterns sit behind a single async mutex, and every mutation holds it
//! through the following save, so two sessions ending together never
//! interleave their counters and a load never races a save.
//!
//! Persistence failures are never fatal: a failed load starts from empty
//! patterns, and a failed save is retried against the fallback store before
//! the increment is given up on.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::learning::insights::LearnedSuggestions;
use crate::learning::patterns::{LearnedPatterns, LearningStats};
use crate::learning::store::{MemoryPatternStore, PatternStore};
use crate::learning::transcripts::TranscriptStore;
use crate::session::transcript::SessionLogEntry;

/// Where the last save ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Primary,
    Fallback,
    /// Neither store accepted the write; the in-memory copy is still current.
    Lost,
}

/// Result of replaying stored transcripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelearnReport {
    pub sessions: usize,
    pub patterns_learned: usize,
    pub saved: SaveOutcome,
}

pub struct LearningManager {
    patterns: Mutex<LearnedPatterns>,
    primary: Arc<dyn PatternStore>,
    fallback: Option<Arc<dyn PatternStore>>,
}

impl std::fmt::Debug for LearningManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningManager")
            .field("primary", &self.primary.describe())
            .field("fallback", &self.fallback.as_ref().map(|s| s.describe()))
            .finish_non_exhaustive()
    }
}

impl LearningManager {
    /// Build a manager and load patterns from the primary store, then the
    /// fallback. Starts empty when neither yields anything.
    pub async fn load(
        primary: Arc<dyn PatternStore>,
        fallback: Option<Arc<dyn PatternStore>>,
    ) -> Self {
        let mut loaded = None;
        for store in std::iter::once(&primary).chain(fallback.iter()) {
            match store.load().await {
                Ok(Some(patterns)) => {
                    info!(store = %store.describe(), "loaded learned patterns");
                    loaded = Some(patterns);
                    break;
                }
                Ok(None) => {}
                Err(e) => warn!(store = %store.describe(), "failed to load learned patterns: {e}"),
            }
        }

        Self {
            patterns: Mutex::new(loaded.unwrap_or_default()),
            primary,
            fallback,
        }
    }

    /// A manager backed only by memory.
    pub fn in_memory() -> Self {
        Self {
            patterns: Mutex::new(LearnedPatterns::new()),
            primary: Arc::new(MemoryPatternStore::new()),
            fallback: None,
        }
    }

    async fn persist(&self, patterns: &LearnedPatterns) -> SaveOutcome {
        match self.primary.save(patterns).await {
            Ok(()) => return SaveOutcome::Primary,
            Err(e) => warn!(store = %self.primary.describe(), "failed to save learned patterns: {e}"),
        }
        if let Some(fallback) = &self.fallback {
            match fallback.save(patterns).await {
                Ok(()) => {
                    info!(store = %fallback.describe(), "saved learned patterns to fallback");
                    return SaveOutcome::Fallback;
                }
                Err(e) => warn!(store = %fallback.describe(), "fallback save failed: {e}"),
            }
        }
        error!("learned patterns could not be persisted");
        SaveOutcome::Lost
    }

    /// Fold a finished session into the patterns and save.
    pub async fn learn_from_session(&self, entries: &[SessionLogEntry]) -> (usize, SaveOutcome) {
        let mut patterns = self.patterns.lock().await;
        let learned = patterns.learn_from_session(entries);
        let saved = self.persist(&patterns).await;
        info!(learned, ?saved, "learned from session");
        (learned, saved)
    }

    /// Save the current patterns on request.
    pub async fn save(&self) -> SaveOutcome {
        let patterns = self.patterns.lock().await;
        self.persist(&patterns).await
    }

    /// Replay every stored transcript into the patterns, then save once.
    pub async fn relearn_from_transcripts(&self, store: &dyn TranscriptStore) -> Result<RelearnReport> {
        let logs = store.load_all().await?;
        let mut patterns = self.patterns.lock().await;
        let patterns_learned = logs
            .iter()
            .map(|log| patterns.learn_from_session(&log.responses))
            .sum();
        let saved = self.persist(&patterns).await;
        info!(sessions = logs.len(), patterns_learned, "relearned from transcripts");
        Ok(RelearnReport {
            sessions: logs.len(),
            patterns_learned,
            saved,
        })
    }

    pub async fn suggest_responses_for_topic(&self, topic: &str, limit: usize) -> Vec<String> {
        let patterns = self.patterns.lock().await;
        patterns.suggest_responses_for_topic(topic, limit, &mut rand::thread_rng())
    }

    pub async fn answer_for_question(&self, question: &str) -> Option<String> {
        let patterns = self.patterns.lock().await;
        patterns.answer_for_question(question).map(str::to_owned)
    }

    pub async fn preferred_emojis(&self, response_type: &str, limit: usize) -> Vec<String> {
        let patterns = self.patterns.lock().await;
        patterns.preferred_emojis(response_type, limit)
    }

    /// Pull everything the prompt needs from the patterns under one lock.
    ///
    /// `question` is only looked up when present.
    pub async fn suggestions(
        &self,
        topic: &str,
        question: Option<&str>,
        emoji_profile: &str,
        limit: usize,
    ) -> LearnedSuggestions {
        let patterns = self.patterns.lock().await;
        LearnedSuggestions {
            topic_suggestions: patterns.suggest_responses_for_topic(topic, limit, &mut rand::thread_rng()),
            previous_answer: question
                .and_then(|q| patterns.answer_for_question(q))
                .map(str::to_owned),
            preferred_emojis: patterns.preferred_emojis(emoji_profile, limit),
            ..LearnedSuggestions::default()
        }
    }

    pub async fn stats(&self) -> LearningStats {
        self.patterns.lock().await.stats()
    }

    /// A copy of the current patterns.
    pub async fn snapshot(&self) -> LearnedPatterns {
        self.patterns.lock().await.clone()
    }

    /// Clear every learned pattern and save the empty state.
    pub async fn reset(&self) -> SaveOutcome {
        let mut patterns = self.patterns.lock().await;
        patterns.reset();
        warn!("learned patterns reset");
        self.persist(&patterns).await
    }
}
