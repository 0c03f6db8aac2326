//! Configuration for the conversation engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ParleyError, Result};
use crate::learning::patterns::DEFAULT_SUGGESTION_LIMIT;
use crate::runner::MAX_SESSION_MINUTES;
use crate::session::tracker::{DEFAULT_TOPIC_INTERVAL_SECS, MAX_TOPIC_INTERVAL_SECS};
use crate::session::window::DEFAULT_WINDOW_SIZE;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    /// Who the bot is and what it talks about.
    pub persona: PersonaConfig,
    /// Session pacing and memory.
    pub session: SessionConfig,
    /// Reply generation and post-processing.
    pub generation: GenerationConfig,
    /// Cross-session learning.
    pub learning: LearningConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// Persona settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Free-form session context; also the seed topic.
    ///
    /// Name and role are read from it when not set explicitly, e.g.
    /// "You are Maya, a growth marketer".
    pub super_context: String,
    /// Explicit persona name (overrides extraction).
    pub name: Option<String>,
    /// Explicit persona role (overrides extraction).
    pub role: Option<String>,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            super_context: "technology and careers".to_owned(),
            name: None,
            role: None,
        }
    }
}

/// Session pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Messages kept in the context window.
    pub history_window: usize,
    /// Minimum seconds between automatic topic changes.
    pub topic_update_interval_secs: i64,
    /// How long a session runs before it ends itself.
    pub duration_minutes: u64,
    /// Delay before replying, lower bound in seconds.
    pub response_delay_min_secs: u64,
    /// Delay before replying, upper bound in seconds.
    pub response_delay_max_secs: u64,
    /// Delay between reply parts, lower bound in seconds.
    pub part_delay_min_secs: u64,
    /// Delay between reply parts, upper bound in seconds.
    pub part_delay_max_secs: u64,
    /// Whether the session is a group chat (affects prompts and openers).
    pub is_group_chat: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_WINDOW_SIZE,
            topic_update_interval_secs: DEFAULT_TOPIC_INTERVAL_SECS,
            duration_minutes: 30,
            response_delay_min_secs: 40,
            response_delay_max_secs: 60,
            part_delay_min_secs: 45,
            part_delay_max_secs: 65,
            is_group_chat: true,
        }
    }
}

/// Reply generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Generation attempts per turn before a canned fallback is used.
    pub max_attempts: u32,
    /// Chance of adding an emoji to an accepted reply part.
    pub emoji_probability: f64,
    /// Words kept per reply part.
    pub max_words_per_part: usize,
    /// Reply parts sent per turn.
    pub max_parts: usize,
    /// Chance of replying to a message that has no other reason for it.
    pub reply_probability: f64,
    /// Words kept in a group-chat opener.
    pub max_opener_words: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            emoji_probability: 0.45,
            max_words_per_part: 11,
            max_parts: 2,
            reply_probability: 0.3,
            max_opener_words: 8,
        }
    }
}

/// Cross-session learning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Whether sessions are learned from and insights used in prompts.
    pub enabled: bool,
    /// Suggestions and emojis pulled per lookup.
    pub suggestion_limit: usize,
    /// Primary learned-patterns file (`None` = default data dir location).
    pub patterns_file: Option<PathBuf>,
    /// Secondary patterns file used when the primary cannot be written.
    pub fallback_patterns_file: Option<PathBuf>,
    /// Session transcript directory (`None` = default data dir location).
    pub transcripts_dir: Option<PathBuf>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            patterns_file: None,
            fallback_patterns_file: None,
            transcripts_dir: None,
        }
    }
}

impl LearningConfig {
    /// Effective primary patterns file.
    #[must_use]
    pub fn patterns_path(&self) -> PathBuf {
        self.patterns_file
            .clone()
            .unwrap_or_else(crate::parley_dirs::patterns_file)
    }

    /// Effective transcript directory.
    #[must_use]
    pub fn transcripts_path(&self) -> PathBuf {
        self.transcripts_dir
            .clone()
            .unwrap_or_else(crate::parley_dirs::transcripts_dir)
    }
}

/// Log output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write daily-rotated log files under the logs directory.
    pub file_output: bool,
}

impl ParleyConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| ParleyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ParleyError::Config(e.to_string()))
    }

    /// Returns the default config file path: `config_dir()/config.toml`.
    pub fn default_config_path() -> PathBuf {
        crate::parley_dirs::config_file()
    }

    /// Reject settings that cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`ParleyError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let g = &self.generation;
        for (name, p) in [
            ("emoji_probability", g.emoji_probability),
            ("reply_probability", g.reply_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ParleyError::Config(format!("generation.{name} must be within 0..=1, got {p}")));
            }
        }
        if g.max_parts == 0 || g.max_words_per_part == 0 {
            return Err(ParleyError::Config(
                "generation.max_parts and generation.max_words_per_part must be positive".to_owned(),
            ));
        }
        let s = &self.session;
        if !(0..=MAX_TOPIC_INTERVAL_SECS).contains(&s.topic_update_interval_secs) {
            return Err(ParleyError::Config(format!(
                "session.topic_update_interval_secs must be within 0..={MAX_TOPIC_INTERVAL_SECS}, got {}",
                s.topic_update_interval_secs
            )));
        }
        if !(1..=MAX_SESSION_MINUTES).contains(&s.duration_minutes) {
            return Err(ParleyError::Config(format!(
                "session.duration_minutes must be within 1..={MAX_SESSION_MINUTES}, got {}",
                s.duration_minutes
            )));
        }
        if s.response_delay_min_secs > s.response_delay_max_secs || s.part_delay_min_secs > s.part_delay_max_secs {
            return Err(ParleyError::Config("session delay minimums must not exceed maximums".to_owned()));
        }
        Ok(())
    }
}
