//! Recent-message window for one conversation.
//!
//! Holds the last N chat lines (both inbound and the persona's own replies)
//! in a fixed-capacity ring buffer. The window feeds the intent classifier,
//! topic detection, and the prompt's "recent messages" block.

use std::collections::VecDeque;

use crate::message::ChatMessage;

/// Default number of messages retained for context.
pub const DEFAULT_WINDOW_SIZE: usize = 15;

/// Fixed-capacity message window, oldest first.
#[derive(Debug, Clone)]
pub struct MessageWindow {
    messages: VecDeque<ChatMessage>,
    max_messages: usize,
}

impl MessageWindow {
    /// Create a window holding at most `max_messages` entries.
    #[must_use]
    pub fn new(max_messages: usize) -> Self {
        let max_messages = max_messages.max(1);
        Self {
            messages: VecDeque::with_capacity(max_messages),
            max_messages,
        }
    }

    /// Append a message, evicting the oldest if at capacity.
    pub fn push(&mut self, message: ChatMessage) {
        if self.messages.len() >= self.max_messages {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// All messages rendered as `Name: text` lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.messages.iter().map(ChatMessage::to_line).collect()
    }

    /// The most recent message, if any.
    #[must_use]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.back()
    }

    /// Number of messages stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the window is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for MessageWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn msg(text: &str) -> ChatMessage {
        ChatMessage::from_raw(&format!("tester: {text}"))
    }

    #[test]
    fn push_and_render_lines() {
        let mut window = MessageWindow::new(10);
        window.push(msg("hello"));
        window.push(msg("hi there"));

        assert_eq!(window.lines(), vec!["tester: hello", "tester: hi there"]);
        assert_eq!(window.last().unwrap().text, "hi there");
    }

    #[test]
    fn max_capacity_eviction() {
        let mut window = MessageWindow::new(3);
        for text in ["msg1", "msg2", "msg3", "msg4"] {
            window.push(msg(text));
        }

        assert_eq!(window.len(), 3);
        assert_eq!(
            window.lines(),
            vec!["tester: msg2", "tester: msg3", "tester: msg4"]
        );
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut window = MessageWindow::new(0);
        window.push(msg("only"));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn clear_and_empty() {
        let mut window = MessageWindow::default();
        assert!(window.is_empty());
        window.push(msg("test"));
        assert!(!window.is_empty());
        window.clear();
        assert!(window.is_empty());
        assert!(window.last().is_none());
    }
}
