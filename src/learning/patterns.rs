//! Cross-session learned response patterns.
//!
//! [`LearnedPatterns`] is plain frequency counting over finished sessions:
//! which replies were used on which topic, which response types each user
//! received, the shortest known answer to each question, and which emoji went
//! with which response type. Every getter has default-on-missing semantics
//! (empty slice, zero, `None`) instead of auto-vivifying entries.
//!
//! The structure only grows or replaces answers in place; entries disappear
//! only through [`LearnedPatterns::reset`].

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::generation::emoji::emojis_in;
use crate::session::decision::ResponseType;
use crate::session::transcript::SessionLogEntry;
use crate::similarity::is_near_match;
use crate::text::{MessageLine, char_len};

/// Entries whose topic is shorter than this are not learned from.
pub const MIN_TOPIC_CHARS: usize = 3;

/// Individual replies must be longer than this to be kept for a topic.
pub const MIN_RESPONSE_CHARS: usize = 3;

/// Default number of suggestions returned per lookup.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 3;

/// Aggregated learning state, persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnedPatterns {
    /// Lowercased topic → replies used on it (duplicates kept).
    topic_responses: BTreeMap<String, Vec<String>>,
    /// User → response-type key → count.
    user_preferences: BTreeMap<String, BTreeMap<String, u64>>,
    /// Lowercased question → best (shortest) answer.
    question_answers: BTreeMap<String, String>,
    /// Response-type key → emoji → count.
    emoji_patterns: BTreeMap<String, BTreeMap<String, u64>>,
}

/// Summary counts for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningStats {
    pub topics_learned: usize,
    pub questions_learned: usize,
    pub users_tracked: usize,
    pub response_types_with_emojis: usize,
    pub total_responses: usize,
}

impl LearnedPatterns {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one session's exchanges into the patterns.
    ///
    /// Entries without replies are skipped. Returns a tally of what was
    /// learned: one per entry with replies, one per user-preference
    /// increment, one per stored answer, and one per entry contributing
    /// emoji counts.
    pub fn learn_from_session(&mut self, entries: &[SessionLogEntry]) -> usize {
        let mut learned = 0;

        for entry in entries {
            let topic = entry.topic.trim().to_lowercase();
            if entry.bot_responses.is_empty() || char_len(&topic) < MIN_TOPIC_CHARS {
                continue;
            }
            let key = entry.learning_key();

            let replies: Vec<String> = entry
                .bot_responses
                .iter()
                .filter(|r| char_len(r.trim()) > MIN_RESPONSE_CHARS)
                .cloned()
                .collect();
            if !replies.is_empty() {
                self.topic_responses.entry(topic).or_default().extend(replies);
            }
            learned += 1;

            if !entry.user.is_empty() {
                *self
                    .user_preferences
                    .entry(entry.user.clone())
                    .or_default()
                    .entry(key.clone())
                    .or_insert(0) += 1;
                learned += 1;
            }

            if !entry.fallback
                && entry.response_type == ResponseType::QuestionAnswer
                && entry.user_message.contains('?')
                && self.learn_answer(entry)
            {
                learned += 1;
            }

            let mut saw_emoji = false;
            for response in &entry.bot_responses {
                for emoji in emojis_in(response) {
                    *self
                        .emoji_patterns
                        .entry(key.clone())
                        .or_default()
                        .entry(emoji.to_owned())
                        .or_insert(0) += 1;
                    saw_emoji = true;
                }
            }
            if saw_emoji {
                learned += 1;
            }
        }

        debug!(entries = entries.len(), learned, "folded session into patterns");
        learned
    }

    /// Store the entry's first reply as the answer to its question, unless a
    /// shorter answer is already known.
    fn learn_answer(&mut self, entry: &SessionLogEntry) -> bool {
        let Some(answer) = entry.bot_responses.first() else {
            return false;
        };
        let question = MessageLine::parse(&entry.user_message)
            .text
            .trim()
            .to_lowercase();
        if question.is_empty() {
            return false;
        }
        let better = match self.question_answers.get(&question) {
            Some(existing) => char_len(answer) < char_len(existing),
            None => true,
        };
        if better {
            self.question_answers.insert(question, answer.clone());
        }
        better
    }

    /// Up to `limit` remembered replies for `topic`, in random order.
    ///
    /// Exact (lowercased) topic matches come first; when they fall short,
    /// replies from any topic containing or contained in the query are added
    /// before shuffling.
    pub fn suggest_responses_for_topic<R: Rng + ?Sized>(
        &self,
        topic: &str,
        limit: usize,
        rng: &mut R,
    ) -> Vec<String> {
        let key = topic.trim().to_lowercase();
        if key.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut found: Vec<String> = self.topic_responses.get(&key).cloned().unwrap_or_default();
        if found.len() < limit {
            for (stored, responses) in &self.topic_responses {
                if *stored != key && (stored.contains(&key) || key.contains(stored.as_str())) {
                    found.extend(responses.iter().cloned());
                }
            }
        }

        found.shuffle(rng);
        found.truncate(limit);
        found
    }

    /// Best known answer to `question`.
    ///
    /// Exact lowercase match first, then the first stored question that
    /// contains or is contained in it, or is more than 0.7 similar.
    #[must_use]
    pub fn answer_for_question(&self, question: &str) -> Option<&str> {
        let key = question.trim().to_lowercase();
        if let Some(answer) = self.question_answers.get(&key) {
            return Some(answer);
        }
        self.question_answers
            .iter()
            .find(|(stored, _)| is_near_match(&key, stored))
            .map(|(_, answer)| answer.as_str())
    }

    /// The `limit` most used emoji for a response-type key.
    #[must_use]
    pub fn preferred_emojis(&self, response_type: &str, limit: usize) -> Vec<String> {
        let Some(counts) = self.emoji_patterns.get(response_type) else {
            return Vec::new();
        };
        let mut ranked: Vec<(&String, &u64)> = counts.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        ranked
            .into_iter()
            .take(limit)
            .map(|(emoji, _)| emoji.clone())
            .collect()
    }

    /// Replies remembered for exactly `topic` (lowercased).
    #[must_use]
    pub fn topic_responses(&self, topic: &str) -> &[String] {
        self.topic_responses
            .get(&topic.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// How often `user` received `response_type`.
    #[must_use]
    pub fn user_preference(&self, user: &str, response_type: &str) -> u64 {
        self.user_preferences
            .get(user)
            .and_then(|types| types.get(response_type))
            .copied()
            .unwrap_or(0)
    }

    /// How often `emoji` appeared in replies of `response_type`.
    #[must_use]
    pub fn emoji_count(&self, response_type: &str, emoji: &str) -> u64 {
        self.emoji_patterns
            .get(response_type)
            .and_then(|counts| counts.get(emoji))
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn stats(&self) -> LearningStats {
        LearningStats {
            topics_learned: self.topic_responses.len(),
            questions_learned: self.question_answers.len(),
            users_tracked: self.user_preferences.len(),
            response_types_with_emojis: self.emoji_patterns.len(),
            total_responses: self.topic_responses.values().map(Vec::len).sum(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topic_responses.is_empty()
            && self.user_preferences.is_empty()
            && self.question_answers.is_empty()
            && self.emoji_patterns.is_empty()
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
