//! Application directory paths.
//!
//! Uses the [`dirs`] crate for platform-appropriate locations.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Data | `~/Library/Application Support/parley/` | `~/.local/share/parley/` |
//! | Config | `~/Library/Application Support/parley/` | `~/.config/parley/` |
//!
//! # Environment Overrides
//!
//! - `PARLEY_DATA_DIR` overrides [`data_dir`]
//! - `PARLEY_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Data root: learned patterns, transcripts, logs.
///
/// Resolves to `dirs::data_dir()/parley/` unless `PARLEY_DATA_DIR` is set.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("PARLEY_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("parley"))
        .unwrap_or_else(|| PathBuf::from("/tmp/parley-data"))
}

/// Config directory holding `config.toml`.
///
/// Resolves to `dirs::config_dir()/parley/` unless `PARLEY_CONFIG_DIR` is set.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("PARLEY_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("parley"))
        .unwrap_or_else(|| PathBuf::from("/tmp/parley-config"))
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Learned patterns file (`data_dir()/learned_patterns.json`).
#[must_use]
pub fn patterns_file() -> PathBuf {
    data_dir().join("learned_patterns.json")
}

/// Session transcript directory (`data_dir()/transcripts/`).
#[must_use]
pub fn transcripts_dir() -> PathBuf {
    data_dir().join("transcripts")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_is_nonempty() {
        assert!(!data_dir().as_os_str().is_empty());
    }

    #[test]
    fn config_file_is_config_toml() {
        let path = config_file();
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn data_files_live_under_data_dir() {
        let root = data_dir();
        assert!(patterns_file().starts_with(&root));
        assert!(transcripts_dir().starts_with(&root));
        assert!(logs_dir().starts_with(&root));
    }
}
