//! Per-conversation context tracking.
//!
//! A [`SessionTracker`] owns the [`ContextState`] of one live conversation:
//! the current topic and its history, the fingerprints seen so far, the
//! in-session question/answer cache, per-speaker greeting counts, and the last
//! few accepted replies. It turns each incoming message into a
//! [`ContextDecision`] and records what the persona said back.
//!
//! The tracker is not thread-safe on its own; callers hold it behind a lock
//! and process one message at a time.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::fingerprint::{Fingerprint, FingerprintIndex, fingerprint_message};
use crate::intent::{self, ContextSignals};
use crate::message::ChatMessage;
use crate::session::decision::{ContextDecision, InstructionBranch, ResponseType};
use crate::session::validation::{Rejection, validate_candidate};
use crate::similarity::is_near_match;
use crate::text::{char_len, content_lower, normalize, truncate_with_ellipsis};

/// Accepted replies remembered for anti-repetition.
pub const RECENT_RESPONSE_LIMIT: usize = 3;

/// Minimum time between automatic topic changes, in seconds.
pub const DEFAULT_TOPIC_INTERVAL_SECS: i64 = 120;

/// Longest accepted topic interval (one week).
pub const MAX_TOPIC_INTERVAL_SECS: i64 = 7 * 24 * 60 * 60;

/// Trailing messages scanned for a new topic.
pub const TOPIC_SCAN_WINDOW: usize = 3;

/// Topics are cut to this many characters.
pub const TOPIC_MAX_CHARS: usize = 30;

/// Phrases that introduce a topic; the text after them becomes the topic.
pub const TOPIC_STARTERS: &[&str] = &[
    "so,",
    "about",
    "speaking of",
    "regarding",
    "talking about",
    "on the topic of",
    "back to",
];

/// A question counts as a topic when its normalised body is longer than this.
const SUBSTANTIVE_QUESTION_MIN_CHARS: usize = 15;

/// A starter-derived topic must be longer than this.
const STARTER_TOPIC_MIN_CHARS: usize = 3;

#[derive(Debug, Clone)]
struct AnsweredQuestion {
    fingerprint: Fingerprint,
    normalized: String,
    answer: String,
}

/// Mutable memory of one conversation.
#[derive(Debug, Clone)]
pub struct ContextState {
    current_topic: String,
    topic_history: Vec<String>,
    last_topic_update: DateTime<Utc>,
    seen: FingerprintIndex,
    answers: Vec<AnsweredQuestion>,
    greeting_counts: HashMap<String, u32>,
    recent_responses: VecDeque<String>,
}

impl ContextState {
    /// Fresh state seeded with `topic` at `now`.
    #[must_use]
    pub fn new(topic: impl Into<String>, now: DateTime<Utc>) -> Self {
        let topic = topic.into();
        Self {
            topic_history: vec![topic.clone()],
            current_topic: topic,
            last_topic_update: now,
            seen: FingerprintIndex::new(),
            answers: Vec::new(),
            greeting_counts: HashMap::new(),
            recent_responses: VecDeque::with_capacity(RECENT_RESPONSE_LIMIT),
        }
    }

    #[must_use]
    pub fn current_topic(&self) -> &str {
        &self.current_topic
    }

    /// Every topic the session has had, oldest first.
    #[must_use]
    pub fn topic_history(&self) -> &[String] {
        &self.topic_history
    }

    #[must_use]
    pub fn last_topic_update(&self) -> DateTime<Utc> {
        self.last_topic_update
    }

    /// Greeting-only messages seen from `sender`; zero when unseen.
    #[must_use]
    pub fn greeting_count(&self, sender: &str) -> u32 {
        self.greeting_counts.get(sender).copied().unwrap_or(0)
    }

    /// Last accepted replies, oldest first.
    pub fn recent_responses(&self) -> impl Iterator<Item = &str> {
        self.recent_responses.iter().map(String::as_str)
    }

    /// Number of distinct messages seen.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Number of questions answered this session.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }
}

/// Drives a [`ContextState`] through incoming messages and outgoing replies.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    seed_topic: String,
    topic_interval: Duration,
    state: ContextState,
}

impl SessionTracker {
    /// Start tracking a conversation about `seed_topic`.
    ///
    /// The topic rate limit counts from `now`.
    #[must_use]
    pub fn new(seed_topic: impl Into<String>, now: DateTime<Utc>) -> Self {
        let seed_topic = seed_topic.into();
        Self {
            state: ContextState::new(seed_topic.clone(), now),
            seed_topic,
            topic_interval: Duration::seconds(DEFAULT_TOPIC_INTERVAL_SECS),
        }
    }

    /// Override the minimum time between topic changes.
    ///
    /// Clamped to `0..=MAX_TOPIC_INTERVAL_SECS`.
    #[must_use]
    pub fn with_topic_interval(mut self, secs: i64) -> Self {
        let secs = secs.clamp(0, MAX_TOPIC_INTERVAL_SECS);
        self.topic_interval =
            Duration::try_seconds(secs).unwrap_or_else(|| Duration::seconds(MAX_TOPIC_INTERVAL_SECS));
        self
    }

    #[must_use]
    pub fn state(&self) -> &ContextState {
        &self.state
    }

    /// Process one incoming message.
    ///
    /// `window` holds the recent conversation as `Name: text` lines, ending
    /// with `message` itself. Returns `None` for messages with no text, which
    /// leave every counter untouched.
    pub fn observe(&mut self, message: &ChatMessage, window: &[String]) -> Option<ContextDecision> {
        if !message.has_text() {
            debug!(sender = %message.sender, "skipping message without text");
            return None;
        }
        let line = message.to_line();

        let signals = intent::classify(window);
        let is_greeting_only = intent::is_greeting_only(&line);
        let is_question = intent::is_question(&line);

        // Exactly once per message: the index inserts on first sight.
        let is_repeat = self.state.seen.is_repeat(&line);

        let greeting_count = if is_greeting_only {
            let count = self
                .state
                .greeting_counts
                .entry(message.sender.clone())
                .or_insert(0);
            *count += 1;
            *count
        } else {
            0
        };

        let topic_changed = self.update_topic(window, message.timestamp);

        let previous_answer = if is_question {
            self.lookup_answer(&line)
        } else {
            None
        };

        let decision = ContextDecision {
            sender: message.sender.clone(),
            fingerprint: fingerprint_message(&line),
            signals,
            is_repeat,
            is_question,
            is_greeting_only,
            greeting_count,
            is_identity_question: intent::is_identity_question(&line),
            is_code_mixed: intent::is_code_mixed_language(&line),
            is_empty_acknowledgment: intent::is_empty_acknowledgment(&line),
            previous_answer,
            topic_changed,
            line,
            instruction: InstructionBranch::Continue,
            response_type: ResponseType::General,
        }
        .resolved();

        debug!(
            user = %decision.sender,
            repeat = decision.is_repeat,
            greeting_count = decision.greeting_count,
            instruction = ?decision.instruction,
            "observed message"
        );
        Some(decision)
    }

    /// Try to move the topic based on the last few window lines.
    ///
    /// Rate-limited by the topic interval and skipped until the window has at
    /// least [`TOPIC_SCAN_WINDOW`] messages. Within each message, starter
    /// phrases are tried before the substantive-question rule, and the first
    /// match across the window wins.
    pub fn update_topic(&mut self, window: &[String], now: DateTime<Utc>) -> bool {
        if now.signed_duration_since(self.state.last_topic_update) < self.topic_interval {
            return false;
        }
        if window.len() < TOPIC_SCAN_WINDOW {
            return false;
        }

        let scan = &window[window.len() - TOPIC_SCAN_WINDOW..];
        let Some(topic) = scan.iter().find_map(|raw| detect_topic(raw)) else {
            return false;
        };

        info!(from = %self.state.current_topic, to = %topic, "topic changed");
        self.state.current_topic = topic.clone();
        self.state.topic_history.push(topic);
        self.state.last_topic_update = now;
        true
    }

    /// The answer already given to `question_line`, by fingerprint or by a
    /// near-identical stored question.
    #[must_use]
    pub fn lookup_answer(&self, question_line: &str) -> Option<String> {
        let fp = fingerprint_message(question_line);
        if let Some(hit) = self.state.answers.iter().find(|q| q.fingerprint == fp) {
            return Some(hit.answer.clone());
        }
        let normalized = normalize(question_line);
        self.state
            .answers
            .iter()
            .find(|q| is_near_match(&normalized, &q.normalized))
            .map(|q| q.answer.clone())
    }

    /// Run the validation gate against this session's recent replies.
    pub fn validate(&self, candidate: &str, signals: &ContextSignals) -> Result<(), Rejection> {
        validate_candidate(candidate, signals, self.state.recent_responses())
    }

    /// Remember an accepted reply for anti-repetition.
    pub fn accept_response(&mut self, response: impl Into<String>) {
        if self.state.recent_responses.len() >= RECENT_RESPONSE_LIMIT {
            self.state.recent_responses.pop_front();
        }
        self.state.recent_responses.push_back(response.into());
    }

    /// Record `answer` for the question in `question_line`.
    ///
    /// The first answer to a question wins; later answers are ignored and
    /// `false` is returned.
    pub fn record_answer(&mut self, question_line: &str, answer: impl Into<String>) -> bool {
        let fp = fingerprint_message(question_line);
        if self.state.answers.iter().any(|q| q.fingerprint == fp) {
            return false;
        }
        self.state.answers.push(AnsweredQuestion {
            fingerprint: fp,
            normalized: normalize(question_line),
            answer: answer.into(),
        });
        true
    }

    /// Drop all session memory and return to the seed topic.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.state = ContextState::new(self.seed_topic.clone(), now);
    }
}

fn detect_topic(raw: &str) -> Option<String> {
    let content = content_lower(raw);

    for starter in TOPIC_STARTERS {
        if let Some((_, rest)) = content.split_once(starter) {
            let rest = rest.trim();
            if char_len(rest) > STARTER_TOPIC_MIN_CHARS {
                return Some(truncate_with_ellipsis(rest, TOPIC_MAX_CHARS));
            }
        }
    }

    if content.contains('?') && char_len(&normalize(raw)) > SUBSTANTIVE_QUESTION_MIN_CHARS {
        return Some(truncate_with_ellipsis(content.trim(), TOPIC_MAX_CHARS));
    }
    None
}
