//! Chat message record shared by the tracker, engine, and transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::text::MessageLine;

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Transport-specific message ID, used as a reply target.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name of the sender.
    pub sender: String,
    /// Message body.
    pub text: String,
    /// When the message was sent.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message from structured parts.
    pub fn new(sender: impl Into<String>, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: None,
            sender: sender.into(),
            text: text.into(),
            timestamp,
        }
    }

    /// Parse a raw `Name: text` line stamped with `timestamp`.
    ///
    /// Lines without a prefix get the `Unknown` sender and keep the whole
    /// string as text.
    #[must_use]
    pub fn from_raw_at(raw: &str, timestamp: DateTime<Utc>) -> Self {
        let line = MessageLine::parse(raw);
        Self::new(line.sender_or_unknown(), line.text, timestamp)
    }

    /// Parse a raw `Name: text` line stamped with the current time.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        Self::from_raw_at(raw, Utc::now())
    }

    /// Attach a transport message ID.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Render as a `Name: text` line, the form every classifier consumes.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!("{}: {}", self.sender, self.text)
    }

    /// Whether the message carries any text worth processing.
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_splits_sender() {
        let msg = ChatMessage::from_raw("Alice: bye everyone");
        assert_eq!(msg.sender, "Alice");
        assert_eq!(msg.text, "bye everyone");
        assert_eq!(msg.to_line(), "Alice: bye everyone");
    }

    #[test]
    fn from_raw_without_prefix_is_unknown() {
        let msg = ChatMessage::from_raw("hello");
        assert_eq!(msg.sender, "Unknown");
        assert_eq!(msg.text, "hello");
    }

    #[test]
    fn blank_text_has_no_text() {
        assert!(!ChatMessage::from_raw("Bob:    ").has_text());
        assert!(!ChatMessage::new("Bob", "", Utc::now()).has_text());
    }

    #[test]
    fn with_id_sets_reply_target() {
        let msg = ChatMessage::from_raw("Bob: hi").with_id("42");
        assert_eq!(msg.id.as_deref(), Some("42"));
    }
}
