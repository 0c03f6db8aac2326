//! Cross-session pattern learning and its persistence.

pub mod insights;
pub mod manager;
pub mod patterns;
pub mod store;
pub mod transcripts;

pub use insights::{ConversationFlow, LearnedSuggestions};
pub use manager::{LearningManager, RelearnReport, SaveOutcome};
pub use patterns::{LearnedPatterns, LearningStats};
pub use store::{FsPatternStore, MemoryPatternStore, PatternStore};
pub use transcripts::{FsTranscriptStore, MemoryTranscriptStore, TranscriptStore};
