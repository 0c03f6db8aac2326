//! Prompt context handed to the generative backend.
//!
//! [`PromptContext`] carries structured fields so backends can build their
//! own request format; [`PromptContext::render`] produces a plain-text prompt
//! for backends that just want a string.

use crate::generation::persona::Persona;
use crate::session::decision::{ContextDecision, InstructionBranch};

/// Topics shown in the evolution trail.
const TOPIC_TRAIL_LEN: usize = 3;

/// What the backend is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// A reply to the latest message.
    Reply,
    /// A short self-introduction opening a direct chat.
    DirectIntroduction,
    /// A very short opener for a group chat.
    GroupOpener,
}

/// Everything the backend needs to produce one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub kind: PromptKind,
    pub persona: Persona,
    pub super_context: String,
    pub topic: String,
    pub is_group_chat: bool,
    /// Recent conversation as `Name: text` lines, oldest first.
    pub recent_messages: Vec<String>,
    /// Facts about this session worth flagging (repeats, greetings, topic trail).
    pub session_notes: Vec<String>,
    /// The instruction for this turn.
    pub instruction: String,
    /// The latest message mixes in Hinglish.
    pub code_mixed: bool,
    /// Rendered learned-insight block, if learning produced anything.
    pub insights: Option<String>,
}

/// Instruction text for a branch.
#[must_use]
pub fn instruction_text(branch: &InstructionBranch, persona: &Persona, topic: &str) -> String {
    match branch {
        InstructionBranch::IdentityQuestion => format!(
            "IMPORTANT: The person is asking who you are. Respond naturally with:\n\
             1. Your name is {}\n\
             2. You're {}\n\
             3. Be friendly and conversational\n\
             4. Keep it brief (1-2 sentences)\n\
             5. End with a question to continue the conversation",
            persona.name, persona.role
        ),
        InstructionBranch::RepeatOrAnswered => "IMPORTANT: This is a repeat question or message. \
             Reference that you've already addressed this in the conversation. Be brief but friendly."
            .to_owned(),
        InstructionBranch::MultiGreeting { .. } => "IMPORTANT: This user has greeted multiple times. \
             Respond with a friendly greeting but add something new to the conversation."
            .to_owned(),
        InstructionBranch::SimpleGreeting => "IMPORTANT: Respond naturally to the greeting with a friendly tone. \
             You can ask how they are or what's new."
            .to_owned(),
        InstructionBranch::EmptyResponse => "IMPORTANT: Acknowledge their response, \
             then add something interesting to keep the conversation flowing."
            .to_owned(),
        InstructionBranch::AnswerQuestion => {
            "IMPORTANT: Answer the question directly and conversationally.".to_owned()
        }
        InstructionBranch::AcknowledgeFarewell => {
            "IMPORTANT: Someone said goodbye or is leaving. Respond appropriately to that.".to_owned()
        }
        InstructionBranch::ReturnGreeting => {
            "IMPORTANT: Respond to the greeting in a friendly, natural way.".to_owned()
        }
        InstructionBranch::Continue => format!(
            "IMPORTANT: Continue the conversation naturally, responding to whatever the person just said. \
             If appropriate, you can gently bring the discussion back to {topic}."
        ),
    }
}

/// Session facts worth flagging to the backend for this decision.
#[must_use]
pub fn session_notes(decision: &ContextDecision, topic_history: &[String]) -> Vec<String> {
    let mut notes = Vec::new();
    if decision.is_repeat {
        notes.push("IMPORTANT: This message is very similar to one seen earlier in the session.".to_owned());
    }
    if decision.greeting_count > 1 {
        notes.push(format!(
            "IMPORTANT: This user has greeted {} times during this session.",
            decision.greeting_count
        ));
    }
    if decision.is_question && decision.previous_answer.is_some() {
        notes.push("IMPORTANT: This question is similar to one already answered in this session.".to_owned());
    }
    if topic_history.len() > 1 {
        let start = topic_history.len().saturating_sub(TOPIC_TRAIL_LEN);
        notes.push(format!(
            "Topic evolution in this session: {}",
            topic_history[start..].join(" → ")
        ));
    }
    notes
}

const HINGLISH_GUIDANCE: &str = "IMPORTANT: The person is using Hinglish (Hindi-English mixed language).\n\
     You can occasionally mix in simple Hindi words in your reply.\n\
     For example: \"Haan, tech industry mein bahut opportunities hain!\"\n\
     Keep it mostly English with just a few Hindi words mixed in.";

const REPLY_STYLE: &str = "Generate 1-2 SHORT, natural responses (5-15 words each maximum).\n\
     Each response should be on its own line, separated by a \"|\" character.\n\
     \n\
     Write exactly like a real person texting on their phone:\n\
     - Casual and conversational\n\
     - Use contractions (I'm, you're, doesn't)\n\
     - Occasionally use abbreviations (tbh, lol, etc.)\n\
     - Sound friendly but not overly enthusiastic\n\
     - React naturally to what the other person just said\n\
     - Don't sound like you're following a script\n\
     - Be adaptive - if they change topics, go with it\n\
     \n\
     Remember: Sound like a real human having a casual conversation.";

impl PromptContext {
    /// Prompt for replying to the message behind `decision`.
    #[must_use]
    pub fn for_reply(
        persona: &Persona,
        super_context: &str,
        is_group_chat: bool,
        topic: &str,
        recent_messages: Vec<String>,
        decision: &ContextDecision,
        topic_history: &[String],
    ) -> Self {
        Self {
            kind: PromptKind::Reply,
            persona: persona.clone(),
            super_context: super_context.to_owned(),
            topic: topic.to_owned(),
            is_group_chat,
            recent_messages,
            session_notes: session_notes(decision, topic_history),
            instruction: instruction_text(&decision.instruction, persona, topic),
            code_mixed: decision.is_code_mixed,
            insights: None,
        }
    }

    /// Prompt for the first message of a session.
    #[must_use]
    pub fn for_opening(persona: &Persona, super_context: &str, is_group_chat: bool) -> Self {
        let (kind, instruction) = if is_group_chat {
            (
                PromptKind::GroupOpener,
                "Generate an extremely short, casual opening message (MAXIMUM 7-8 words).\n\
                 Sound exactly like someone texting quickly on their phone.\n\
                 Don't introduce the topic explicitly - just start naturally."
                    .to_owned(),
            )
        } else {
            (
                PromptKind::DirectIntroduction,
                format!(
                    "Create a brief, friendly introduction (2-3 sentences) that:\n\
                     1. Introduces myself as {name}\n\
                     2. Mentions I'm {role}\n\
                     3. Sounds casual and conversational\n\
                     4. Ends with a natural question to start the conversation about {super_context}\n\
                     \n\
                     Keep it under 25 words total and sound like a real person texting.",
                    name = persona.name,
                    role = persona.role,
                ),
            )
        };
        Self {
            kind,
            persona: persona.clone(),
            super_context: super_context.to_owned(),
            topic: super_context.to_owned(),
            is_group_chat,
            recent_messages: Vec::new(),
            session_notes: Vec::new(),
            instruction,
            code_mixed: false,
            insights: None,
        }
    }

    /// Attach a rendered insights block.
    #[must_use]
    pub fn with_insights(mut self, insights: Option<String>) -> Self {
        self.insights = insights;
        self
    }

    /// Flatten into a single plain-text prompt.
    #[must_use]
    pub fn render(&self) -> String {
        let chat = if self.is_group_chat {
            "Telegram group chat"
        } else {
            "one-on-one Telegram conversation"
        };

        let mut sections: Vec<String> = Vec::new();
        match self.kind {
            PromptKind::Reply => {
                sections.push(format!("You're in a {chat} as {}.", self.persona.name));
                sections.push(format!("You are {}, {}.", self.persona.name, self.persona.role));
                sections.push(format!("The conversation is about: {}", self.topic));
                sections.push(format!("Recent messages:\n{}", self.recent_messages.join("\n")));
                if !self.session_notes.is_empty() {
                    sections.push(self.session_notes.join("\n"));
                }
                sections.push(self.instruction.clone());
                if self.code_mixed {
                    sections.push(HINGLISH_GUIDANCE.to_owned());
                }
                if let Some(insights) = &self.insights {
                    sections.push(insights.clone());
                }
                sections.push(REPLY_STYLE.to_owned());
            }
            PromptKind::DirectIntroduction => {
                sections.push(format!("I'm {}, {}.", self.persona.name, self.persona.role));
                sections.push(self.instruction.clone());
            }
            PromptKind::GroupOpener => {
                sections.push(format!(
                    "I need to start a very brief conversation in a {chat} about:\n{}",
                    self.super_context
                ));
                sections.push(self.instruction.clone());
            }
        }
        sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use chrono::Utc;

    use super::*;
    use crate::message::ChatMessage;
    use crate::session::tracker::SessionTracker;

    fn persona() -> Persona {
        Persona {
            name: "Maya".into(),
            role: "growth marketer".into(),
        }
    }

    #[test]
    fn identity_instruction_names_persona() {
        let text = instruction_text(&InstructionBranch::IdentityQuestion, &persona(), "ai");
        assert!(text.contains("Your name is Maya"));
        assert!(text.contains("You're growth marketer"));
    }

    #[test]
    fn continue_mentions_topic() {
        let text = instruction_text(&InstructionBranch::Continue, &persona(), "remote work");
        assert!(text.contains("back to remote work"));
    }

    #[test]
    fn reply_prompt_carries_notes_and_hinglish() {
        let mut tracker = SessionTracker::new("jobs", Utc::now());
        let msg = ChatMessage::from_raw("Ravi: kya scene hai, naukri mil gayi?");
        let window = vec![msg.to_line()];
        let decision = tracker.observe(&msg, &window).unwrap();

        let history = vec!["jobs".to_owned(), "ai".to_owned(), "salaries".to_owned(), "remote".to_owned()];
        let prompt = PromptContext::for_reply(&persona(), "jobs", true, "remote", window, &decision, &history)
            .with_insights(Some("Recurring themes in this conversation: naukri".into()));
        let text = prompt.render();

        assert!(text.contains("Telegram group chat as Maya"));
        assert!(text.contains("Ravi: kya scene hai"));
        assert!(text.contains("Topic evolution in this session: ai → salaries → remote"));
        assert!(text.contains("Hinglish"));
        assert!(text.contains("Recurring themes"));
        assert!(text.contains("Answer the question directly"));
    }

    #[test]
    fn opening_prompts_differ_by_chat_type() {
        let dm = PromptContext::for_opening(&persona(), "AI careers", false);
        assert_eq!(dm.kind, PromptKind::DirectIntroduction);
        assert!(dm.render().contains("Introduces myself as Maya"));

        let group = PromptContext::for_opening(&persona(), "AI careers", true);
        assert_eq!(group.kind, PromptKind::GroupOpener);
        assert!(group.render().contains("MAXIMUM 7-8 words"));
    }
}
