//! The per-message context decision handed to response generation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;
use crate::intent::ContextSignals;

/// Coarse response category, used for logging and learned preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    IdentityQuestion,
    RepeatHandling,
    QuestionAnswer,
    Farewell,
    Greeting,
    Humor,
    Acknowledgment,
    General,
}

impl ResponseType {
    /// Stable snake_case key, as used in stored patterns.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentityQuestion => "identity_question",
            Self::RepeatHandling => "repeat_handling",
            Self::QuestionAnswer => "question_answer",
            Self::Farewell => "farewell",
            Self::Greeting => "greeting",
            Self::Humor => "humor",
            Self::Acknowledgment => "acknowledgment",
            Self::General => "general",
        }
    }

    /// Response type whose emoji habits should flavour this reply.
    ///
    /// Only questions, greetings, and farewells have their own emoji profile;
    /// everything else shares the general one.
    #[must_use]
    pub fn emoji_profile(signals: &ContextSignals) -> Self {
        if signals.greeting {
            Self::Greeting
        } else if signals.farewell {
            Self::Farewell
        } else if signals.question {
            Self::QuestionAnswer
        } else {
            Self::General
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which instruction steers the backend for this turn.
///
/// Variants are listed in precedence order: the first special case that
/// applies wins, and the signal-driven branches only apply when none do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionBranch {
    /// Someone asked who the persona is.
    IdentityQuestion,
    /// The message repeats an earlier one, or its question was already answered.
    RepeatOrAnswered,
    /// The sender has greeted more than once this session.
    MultiGreeting { count: u32 },
    /// A first, greeting-only message.
    SimpleGreeting,
    /// A short filler acknowledgment ("cool", "thanks").
    EmptyResponse,
    /// The window reads as a question.
    AnswerQuestion,
    /// The window reads as a goodbye.
    AcknowledgeFarewell,
    /// The window carries a greeting inside a longer message.
    ReturnGreeting,
    /// Nothing specific: keep the conversation going.
    Continue,
}

/// Everything the tracker concluded about one incoming message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDecision {
    pub sender: String,
    /// The message as a `Name: text` line.
    pub line: String,
    pub fingerprint: Fingerprint,
    /// Windowed signals over the last three messages.
    pub signals: ContextSignals,
    pub is_repeat: bool,
    pub is_question: bool,
    pub is_greeting_only: bool,
    /// The sender's greeting count after this message, or 0 when this message
    /// is not a greeting.
    pub greeting_count: u32,
    pub is_identity_question: bool,
    pub is_code_mixed: bool,
    pub is_empty_acknowledgment: bool,
    /// Answer already given this session to the same (or a near-identical)
    /// question.
    pub previous_answer: Option<String>,
    /// Whether this message moved the session topic.
    pub topic_changed: bool,
    pub instruction: InstructionBranch,
    pub response_type: ResponseType,
}

impl ContextDecision {
    /// Recompute [`Self::instruction`] and [`Self::response_type`] from the
    /// facts already set on the decision.
    #[must_use]
    pub fn resolved(mut self) -> Self {
        self.instruction = self.select_instruction();
        self.response_type = self.select_response_type();
        self
    }

    fn select_instruction(&self) -> InstructionBranch {
        if self.is_identity_question {
            InstructionBranch::IdentityQuestion
        } else if self.is_repeat || self.previous_answer.is_some() {
            InstructionBranch::RepeatOrAnswered
        } else if self.is_greeting_only && self.greeting_count > 1 {
            InstructionBranch::MultiGreeting {
                count: self.greeting_count,
            }
        } else if self.is_greeting_only {
            InstructionBranch::SimpleGreeting
        } else if self.is_empty_acknowledgment {
            InstructionBranch::EmptyResponse
        } else if self.signals.question {
            InstructionBranch::AnswerQuestion
        } else if self.signals.farewell {
            InstructionBranch::AcknowledgeFarewell
        } else if self.signals.greeting {
            InstructionBranch::ReturnGreeting
        } else {
            InstructionBranch::Continue
        }
    }

    fn select_response_type(&self) -> ResponseType {
        if self.is_identity_question {
            ResponseType::IdentityQuestion
        } else if self.is_repeat || self.previous_answer.is_some() {
            ResponseType::RepeatHandling
        } else if self.signals.question {
            ResponseType::QuestionAnswer
        } else if self.signals.farewell {
            ResponseType::Farewell
        } else if self.signals.greeting {
            ResponseType::Greeting
        } else if self.signals.joke {
            ResponseType::Humor
        } else if self.is_empty_acknowledgment {
            ResponseType::Acknowledgment
        } else {
            ResponseType::General
        }
    }

    /// Whether the message was repeated or already answered.
    #[must_use]
    pub fn is_repeat_or_answered(&self) -> bool {
        self.is_repeat || self.previous_answer.is_some()
    }
}
