//! Chat transport port.
//!
//! A transport connects a session to some messaging network. It pushes
//! inbound messages into a channel and sends outbound text; how it does so
//! (bot API, user client, test double) is its own business.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::message::ChatMessage;

/// A message received from the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub message: ChatMessage,
    /// Sent by the persona's own account.
    pub from_self: bool,
}

impl InboundMessage {
    pub fn new(message: ChatMessage) -> Self {
        Self {
            message,
            from_self: false,
        }
    }

    /// Mark the message as the persona's own echo.
    #[must_use]
    pub fn from_self(mut self) -> Self {
        self.from_self = true;
        self
    }
}

/// A message to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    /// Transport message ID to reply to, if any.
    pub reply_to: Option<String>,
}

impl OutboundMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply_to: None,
        }
    }

    #[must_use]
    pub fn replying_to(mut self, id: Option<String>) -> Self {
        self.reply_to = id;
        self
    }
}

/// Transport contract. New networks only need to implement this trait.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Stable transport identifier (e.g. `telegram`).
    fn id(&self) -> &str;

    /// Send one message.
    async fn send(&self, message: OutboundMessage) -> Result<()>;

    /// Start receiving messages and forward them to `inbound_tx`.
    ///
    /// Returns when the transport stops or the receiver is dropped.
    async fn run(&self, inbound_tx: mpsc::Sender<InboundMessage>) -> Result<()>;

    /// Show or hide a typing indicator. Best effort.
    async fn set_typing(&self, _typing: bool) -> Result<()> {
        Ok(())
    }

    /// Best-effort health probe.
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    struct Silent;

    #[async_trait]
    impl ChatTransport for Silent {
        fn id(&self) -> &str {
            "silent"
        }

        async fn send(&self, _message: OutboundMessage) -> Result<()> {
            Ok(())
        }

        async fn run(&self, _inbound_tx: mpsc::Sender<InboundMessage>) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn default_hooks_succeed() {
        let transport = Silent;
        assert!(transport.health_check().await.unwrap());
        transport.set_typing(true).await.unwrap();
    }

    #[test]
    fn first_part_carries_reply_target() {
        let out = OutboundMessage::new("hi").replying_to(Some("m1".into()));
        assert_eq!(out.reply_to.as_deref(), Some("m1"));
        assert!(!InboundMessage::new(ChatMessage::from_raw("Bob: hi")).from_self);
    }
}
