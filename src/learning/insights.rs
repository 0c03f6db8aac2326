//! Conversation insights folded into the prompt.
//!
//! Combines what the learner remembers (topic suggestions, prior answers,
//! emoji habits) with what can be read off the current window (recurring
//! theme words, the shape of the conversation).

use std::collections::HashMap;

use crate::text::{MessageLine, char_len};

/// Windows must have more than this many messages for theme words.
pub const THEME_MIN_WINDOW: usize = 3;

/// Windows must have more than this many messages for a flow label.
pub const FLOW_MIN_WINDOW: usize = 5;

const THEME_WORD_LIMIT: usize = 3;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "and", "or", "but", "in", "on", "at", "to", "for", "with", "about",
    "like", "by", "as", "of", "that", "this", "it", "from", "be", "are", "was", "were", "been",
    "have", "has", "had", "do", "does", "did", "can", "could", "will", "would", "should", "i",
    "you", "he", "she", "we", "they", "me", "him", "her", "us", "them", "my", "your", "his",
    "our", "their", "its", "so", "just", "very", "really",
];

/// Coarse shape of the recent conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationFlow {
    QuestionHeavy,
    BackAndForth,
    MultiPerson,
    General,
}

impl ConversationFlow {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::QuestionHeavy => "Question-heavy discussion",
            Self::BackAndForth => "Back-and-forth dialogue",
            Self::MultiPerson => "Multi-person discussion",
            Self::General => "General conversation",
        }
    }
}

/// Up to three words that recur across the window, most frequent first.
///
/// Sender names are ignored. Words must be longer than three characters, not
/// stop words, and appear at least twice. Ties keep first-seen order.
#[must_use]
pub fn theme_words<S: AsRef<str>>(window: &[S]) -> Vec<String> {
    if window.len() < THEME_MIN_WINDOW {
        return Vec::new();
    }

    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for raw in window {
        let content = MessageLine::parse(raw.as_ref()).text.to_lowercase();
        for word in content.split_whitespace() {
            let clean: String = word
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            if char_len(&clean) <= 3 || STOP_WORDS.contains(&clean.as_str()) {
                continue;
            }
            let count = counts.entry(clean.clone()).or_insert(0);
            if *count == 0 {
                order.push(clean);
            }
            *count += 1;
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order
        .into_iter()
        .take(THEME_WORD_LIMIT)
        .filter(|w| counts[w] > 1)
        .collect()
}

/// Classify the shape of the last few messages.
///
/// Returns `None` for windows of five messages or fewer.
#[must_use]
pub fn conversation_flow<S: AsRef<str>>(window: &[S]) -> Option<ConversationFlow> {
    if window.len() <= FLOW_MIN_WINDOW {
        return None;
    }

    let questions = window[window.len() - 5..]
        .iter()
        .filter(|m| m.as_ref().contains('?'))
        .count();
    if questions >= 3 {
        return Some(ConversationFlow::QuestionHeavy);
    }

    let speakers: Vec<&str> = window[window.len().saturating_sub(6)..]
        .iter()
        .filter_map(|m| MessageLine::parse(m.as_ref()).sender)
        .collect();
    if speakers.len() >= 4 {
        let mut unique = speakers.clone();
        unique.sort_unstable();
        unique.dedup();
        if unique.len() == 2 && speakers[0] != speakers[1] && speakers[0] == speakers[2] {
            return Some(ConversationFlow::BackAndForth);
        }
        if unique.len() > 2 {
            return Some(ConversationFlow::MultiPerson);
        }
    }
    Some(ConversationFlow::General)
}

/// Everything worth telling the backend beyond the raw window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnedSuggestions {
    pub topic_suggestions: Vec<String>,
    pub previous_answer: Option<String>,
    pub theme_words: Vec<String>,
    pub flow: Option<ConversationFlow>,
    pub preferred_emojis: Vec<String>,
}

impl LearnedSuggestions {
    /// Add the window-derived parts (theme words and flow).
    #[must_use]
    pub fn with_window<S: AsRef<str>>(mut self, window: &[S]) -> Self {
        if window.len() > THEME_MIN_WINDOW {
            self.theme_words = theme_words(window);
            self.flow = conversation_flow(window);
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topic_suggestions.is_empty()
            && self.previous_answer.is_none()
            && self.theme_words.is_empty()
            && self.flow.is_none()
            && self.preferred_emojis.is_empty()
    }

    /// Render as prompt lines; `None` when there is nothing to say.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        let mut lines = Vec::new();
        if !self.topic_suggestions.is_empty() {
            lines.push(format!(
                "Previous successful responses on this topic include: {}",
                self.topic_suggestions.join("; ")
            ));
        }
        if let Some(answer) = &self.previous_answer {
            lines.push(format!("Similar question was previously answered with: {answer}"));
        }
        if !self.theme_words.is_empty() {
            lines.push(format!(
                "Recurring themes in this conversation: {}",
                self.theme_words.join(", ")
            ));
        }
        if let Some(flow) = self.flow {
            lines.push(format!("Conversation pattern: {}", flow.label()));
        }
        if !self.preferred_emojis.is_empty() {
            lines.push(format!(
                "Consider using these emojis that worked well in similar contexts: {}",
                self.preferred_emojis.join(" ")
            ));
        }
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}
