//! Error types for the parley engine.

/// Top-level error type for the conversation engine.
#[derive(Debug, thiserror::Error)]
pub enum ParleyError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Learned-pattern or transcript storage error.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Chat transport error (send/receive).
    #[error("transport error: {0}")]
    Transport(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ParleyError>;
