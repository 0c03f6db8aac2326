//! Keyword-based conversational intent detection.
//!
//! Two layers, both stateless:
//!
//! 1. **Windowed signals** ([`classify`]): OR across fixed keyword tables,
//!    tested by case-insensitive substring containment against the last (up
//!    to) three messages joined together.
//! 2. **Single-message checks**: greeting-only, identity question,
//!    code-mixed language, empty acknowledgment, question.
//!
//! Matching is plain substring containment: "hi" also fires inside
//! "this". The tables are tuned for short chat lines.

use serde::{Deserialize, Serialize};

use crate::text::{char_len, content_lower, normalize};

/// Number of trailing messages the windowed classifier looks at.
pub const SIGNAL_WINDOW: usize = 3;

/// Greeting-only lines must normalise to fewer characters than this.
pub const GREETING_ONLY_MAX_CHARS: usize = 20;

/// Empty acknowledgments must be shorter than this (body, lowercased).
pub const EMPTY_ACK_MAX_CHARS: usize = 15;

// ── Keyword tables ──────────────────────────────────────────────────────

pub const FAREWELLS: &[&str] = &[
    "bye",
    "goodbye",
    "see ya",
    "cya",
    "gtg",
    "talk later",
    "good night",
    "night",
];

pub const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "sup",
    "yo",
    "what's up",
    "morning",
    "afternoon",
    "evening",
];

pub const EMPTY_ACKNOWLEDGMENTS: &[&str] = &[
    "cool", "nice", "great", "awesome", "thanks", "thank you", "ok", "okay", "good",
];

pub const JOKE_SIGNALS: &[&str] = &[
    "lol", "lmao", "haha", "😂", "🤣", "funny", "joke", "kidding", "jk",
];

pub const AGREEMENT_SIGNALS: &[&str] = &[
    "agree",
    "true",
    "right",
    "exactly",
    "correct",
    "yep",
    "yeah",
    "absolutely",
];

pub const DISAGREEMENT_SIGNALS: &[&str] = &[
    "disagree",
    "nope",
    "nah",
    "not really",
    "incorrect",
    "wrong",
    "false",
];

pub const QUESTION_WORDS: &[&str] = &[
    "what",
    "how",
    "why",
    "when",
    "where",
    "who",
    "which",
    "mean",
    "meaning",
    "explain",
    "tell me",
    "definition",
];

pub const IDENTITY_PHRASES: &[&str] = &[
    "who are you",
    "who is this",
    "who r u",
    "who u",
    "your name",
    "what's your name",
    "whats ur name",
    "introduce yourself",
    "who am i talking to",
    "aap kaun ho",
    "tum kaun ho",
    "apka naam",
    "tumhara naam",
    "kon hai tu",
];

/// Transliterated Hindi markers used to spot Hinglish (code-mixed) lines.
pub const CODE_MIXED_MARKERS: &[&str] = &[
    // Greetings
    "kaise ho",
    "kaisa hai",
    "kya haal hai",
    "kya chal raha hai",
    "namaste",
    "namaskar",
    "kem cho",
    "kya scene hai",
    "kidhar ho",
    // Questions
    "kya kar rahe ho",
    "kahan se ho",
    "kya ho raha hai",
    "kya socha hai",
    "kitne saal",
    "kaunsi company",
    "kahan kaam",
    "kaise milega",
    // Common phrases
    "theek hai",
    "accha hai",
    "bura nahi",
    "haan ji",
    "nahi yaar",
    "bilkul",
    "ekdum",
    "zaroor",
    "pakka",
    "samajh gaya",
    "batao",
    // Work-related
    "naukri",
    "job",
    "kaam",
    "paisa",
    "salary",
    "interview",
    "company",
];

/// Boolean intent bundle for a message window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSignals {
    pub farewell: bool,
    pub greeting: bool,
    pub joke: bool,
    pub question: bool,
    pub agreement: bool,
    pub disagreement: bool,
}

/// Whether `haystack` contains any entry of `table`.
#[must_use]
pub fn contains_any(haystack: &str, table: &[&str]) -> bool {
    table.iter().any(|kw| haystack.contains(kw))
}

fn looks_like_question(lowered: &str) -> bool {
    lowered.contains('?') || contains_any(lowered, QUESTION_WORDS)
}

/// Classify the last (up to) [`SIGNAL_WINDOW`] messages of `recent`.
///
/// Messages may be raw `Name: text` lines; sender names take part in the
/// match just as they do in the joined window.
#[must_use]
pub fn classify<S: AsRef<str>>(recent: &[S]) -> ContextSignals {
    let start = recent.len().saturating_sub(SIGNAL_WINDOW);
    let joined = recent[start..]
        .iter()
        .map(|m| m.as_ref().to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    ContextSignals {
        farewell: contains_any(&joined, FAREWELLS),
        greeting: contains_any(&joined, GREETINGS),
        joke: contains_any(&joined, JOKE_SIGNALS),
        question: looks_like_question(&joined),
        agreement: contains_any(&joined, AGREEMENT_SIGNALS),
        disagreement: contains_any(&joined, DISAGREEMENT_SIGNALS),
    }
}

/// A short line that is only a greeting ("hey!", "Bob: morning").
#[must_use]
pub fn is_greeting_only(raw: &str) -> bool {
    let content = content_lower(raw);
    contains_any(&content, GREETINGS) && char_len(&normalize(raw)) < GREETING_ONLY_MAX_CHARS
}

/// Single-message question check: a `?` or an interrogative keyword.
#[must_use]
pub fn is_question(raw: &str) -> bool {
    looks_like_question(&content_lower(raw))
}

/// Someone asking who the persona is, in English or transliterated Hindi.
#[must_use]
pub fn is_identity_question(raw: &str) -> bool {
    contains_any(&content_lower(raw), IDENTITY_PHRASES)
}

/// The line mixes in secondary-language (Hinglish) markers.
#[must_use]
pub fn is_code_mixed_language(raw: &str) -> bool {
    contains_any(&content_lower(raw), CODE_MIXED_MARKERS)
}

/// A short filler reply such as "cool" or "thanks".
///
/// Only lines with a sender prefix qualify; bare strings are not treated as
/// acknowledgments.
#[must_use]
pub fn is_empty_acknowledgment(raw: &str) -> bool {
    let Some((_, body)) = raw.split_once(": ") else {
        return false;
    };
    let content = body.to_lowercase();
    contains_any(&content, EMPTY_ACKNOWLEDGMENTS) && char_len(&content) < EMPTY_ACK_MAX_CHARS
}
