//! Per-conversation state: message window, context tracking, the validation
//! gate, and the session log.

pub mod decision;
pub mod tracker;
pub mod transcript;
pub mod validation;
pub mod window;

pub use decision::{ContextDecision, InstructionBranch, ResponseType};
pub use tracker::{ContextState, SessionTracker};
pub use transcript::{ContextData, SessionAnalytics, SessionLog, SessionLogEntry};
pub use validation::{FallbackKind, Rejection, validate_candidate};
pub use window::MessageWindow;
