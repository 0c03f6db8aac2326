//! Parley: conversational state tracking and response-pattern learning for
//! chat personas.
//!
//! The crate watches a conversation, decides what a persona should say, and
//! learns across sessions which replies worked.
//!
//! # Architecture
//!
//! - **Session tracking**: topic drift, repeat detection, greeting counts and
//!   an in-session question/answer cache ([`session`])
//! - **Intent**: keyword-based conversational signals ([`intent`])
//! - **Generation**: prompt building, bounded retries, post-processing and
//!   a pluggable [`ResponseBackend`] ([`generation`])
//! - **Learning**: cross-session patterns behind a shared, locked
//!   [`LearningManager`] with pluggable stores ([`learning`])
//! - **Engine and runner**: [`ConversationEngine`] handles one message at a
//!   time; [`SessionRunner`] drives it over a [`ChatTransport`]

pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod generation;
pub mod intent;
pub mod learning;
pub mod logging;
pub mod message;
pub mod parley_dirs;
pub mod runner;
pub mod session;
pub mod similarity;
pub mod text;
pub mod transport;

pub use config::ParleyConfig;
pub use engine::{ConversationEngine, ReplyPlan, SessionEnd};
pub use error::{ParleyError, Result};
pub use generation::{GenerationError, Persona, PromptContext, ResponseBackend};
pub use intent::ContextSignals;
pub use learning::{LearnedPatterns, LearningManager};
pub use message::ChatMessage;
pub use runner::{Pacing, SessionRunner, StopHandle};
pub use session::{ContextDecision, ResponseType, SessionTracker};
pub use transport::{ChatTransport, InboundMessage, OutboundMessage};
