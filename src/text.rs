//! Text normalisation and `"Name: text"` sender parsing.
//!
//! Chat lines arrive either as structured records or as raw strings using the
//! `Name: text` convention. Everything downstream (fingerprints, classifiers,
//! topic detection) works on the sender-stripped content, so the parsing rules
//! live here in one place.

/// Sender reported when a raw line carries no `Name: ` prefix.
pub const UNKNOWN_SENDER: &str = "Unknown";

/// Delimiter separating the sender prefix from the message body.
const SENDER_DELIMITER: &str = ": ";

/// Marker appended when a topic or snippet is truncated.
pub const ELLIPSIS: &str = "...";

/// A raw chat line split into its sender prefix and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLine<'a> {
    /// Sender name, if the line had a `Name: ` prefix.
    pub sender: Option<&'a str>,
    /// Message body (the whole line when no prefix was present).
    pub text: &'a str,
}

impl<'a> MessageLine<'a> {
    /// Split `raw` at the first `": "` delimiter.
    ///
    /// Lines without the delimiter have no sender and the whole string is the
    /// body.
    #[must_use]
    pub fn parse(raw: &'a str) -> Self {
        match raw.split_once(SENDER_DELIMITER) {
            Some((sender, text)) => Self {
                sender: Some(sender.trim()),
                text,
            },
            None => Self {
                sender: None,
                text: raw,
            },
        }
    }

    /// Sender name, or [`UNKNOWN_SENDER`] when absent or blank.
    #[must_use]
    pub fn sender_or_unknown(&self) -> &'a str {
        match self.sender {
            Some(sender) if !sender.is_empty() => sender,
            _ => UNKNOWN_SENDER,
        }
    }
}

/// Message body of a raw line, lowercased, punctuation kept.
#[must_use]
pub fn content_lower(raw: &str) -> String {
    MessageLine::parse(raw).text.to_lowercase()
}

/// Normalise a raw line for fingerprinting and length checks.
///
/// Strips a leading `Name: ` prefix, lowercases, and removes every character
/// that is neither a word character (alphanumeric or `_`) nor whitespace.
/// Leading and trailing whitespace is trimmed.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let lowered = content_lower(raw);
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    kept.trim().to_owned()
}

/// Length of `text` in characters.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Truncate `text` to `max_chars` characters, appending [`ELLIPSIS`] when cut.
#[must_use]
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Keep at most `max_words` whitespace-separated words.
#[must_use]
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_owned();
    }
    words[..max_words].join(" ")
}
