//! Generative backend port.
//!
//! The engine never talks to a model directly. It builds a
//! [`PromptContext`] and hands it to a [`ResponseBackend`], which returns raw
//! text. Backends are expected to be slow and fallible; the engine holds no
//! locks while awaiting them.

use async_trait::async_trait;

use crate::generation::prompt::PromptContext;
use crate::session::validation::Rejection;

/// Why a generation attempt produced nothing usable.
///
/// Every variant counts as one failed attempt against the retry budget.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// The backend call itself failed (network, quota, server error).
    #[error("backend error: {0}")]
    Backend(String),

    /// The backend answered, but with nothing that could be used.
    #[error("malformed output: {0}")]
    Malformed(String),

    /// Every candidate failed the validation gate.
    #[error("all candidates rejected: {0}")]
    Rejected(Rejection),
}

/// A text generator the engine can ask for replies.
#[async_trait]
pub trait ResponseBackend: Send + Sync {
    /// Backend identifier for logs.
    fn name(&self) -> &str;

    /// Produce raw reply text for `prompt`.
    ///
    /// Multiple reply parts may be separated with `|`.
    async fn generate(&self, prompt: &PromptContext) -> Result<String, GenerationError>;
}
