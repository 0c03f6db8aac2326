//! Everything between a context decision and the text that gets sent:
//! the backend port, persona, prompt building, retries, and emoji garnish.

pub mod backend;
pub mod emoji;
pub mod persona;
pub mod prompt;
pub mod retry;

pub use backend::{GenerationError, ResponseBackend};
pub use persona::Persona;
pub use prompt::{PromptContext, PromptKind};
pub use retry::{GenerationOutcome, RetryPolicy};
