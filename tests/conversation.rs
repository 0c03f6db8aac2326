#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use parley::generation::{GenerationError, PromptContext, ResponseBackend};
use parley::learning::{LearnedPatterns, LearningManager, MemoryTranscriptStore};
use parley::session::{InstructionBranch, ResponseType, SessionTracker, validate_candidate};
use parley::transport::{ChatTransport, InboundMessage, OutboundMessage};
use parley::{ChatMessage, ConversationEngine, Pacing, ParleyConfig, ParleyError, SessionRunner};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;

/// Backend that replays a fixed script, then errors.
struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: Mutex<usize>,
}

impl ScriptedBackend {
    fn new<I: IntoIterator<Item = &'static str>>(replies: I) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(replies.into_iter().map(|r| Ok(r.to_owned())).collect()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ResponseBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _prompt: &PromptContext) -> Result<String, GenerationError> {
        *self.calls.lock().unwrap() += 1;
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Backend("offline".into())))
    }
}

/// Transport that delivers a fixed batch of messages and records what was sent.
struct ScriptedTransport {
    inbound: Mutex<Vec<InboundMessage>>,
    sent: Mutex<Vec<OutboundMessage>>,
    hold_open: bool,
    offline: bool,
    health_checks: Mutex<usize>,
}

impl ScriptedTransport {
    fn build(inbound: Vec<InboundMessage>, hold_open: bool, offline: bool) -> Arc<Self> {
        Arc::new(Self {
            inbound: Mutex::new(inbound),
            sent: Mutex::new(Vec::new()),
            hold_open,
            offline,
            health_checks: Mutex::new(0),
        })
    }

    fn new(inbound: Vec<InboundMessage>) -> Arc<Self> {
        Self::build(inbound, false, false)
    }

    fn held_open() -> Arc<Self> {
        Self::build(Vec::new(), true, false)
    }

    /// Delivers `inbound` but fails every send and health check.
    fn offline(inbound: Vec<InboundMessage>) -> Arc<Self> {
        Self::build(inbound, false, true)
    }

    fn health_checks(&self) -> usize {
        *self.health_checks.lock().unwrap()
    }

    fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn send(&self, message: OutboundMessage) -> parley::Result<()> {
        if self.offline {
            return Err(ParleyError::Transport("network unreachable".into()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn health_check(&self) -> parley::Result<bool> {
        *self.health_checks.lock().unwrap() += 1;
        if self.offline {
            return Err(ParleyError::Transport("network unreachable".into()));
        }
        Ok(true)
    }

    async fn run(&self, inbound_tx: mpsc::Sender<InboundMessage>) -> parley::Result<()> {
        let batch = std::mem::take(&mut *self.inbound.lock().unwrap());
        for message in batch {
            if inbound_tx.send(message).await.is_err() {
                return Ok(());
            }
        }
        if self.hold_open {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

fn config() -> ParleyConfig {
    let mut config = ParleyConfig::default();
    config.persona.super_context = "remote work and careers".into();
    config.persona.name = Some("Maya".into());
    config.persona.role = Some("growth marketer".into());
    config.generation.emoji_probability = 0.0;
    config.generation.reply_probability = 0.0;
    config
}

fn engine_with(backend: Arc<ScriptedBackend>) -> Arc<ConversationEngine> {
    Arc::new(ConversationEngine::new(config(), backend, Arc::new(LearningManager::in_memory())))
}

#[tokio::test]
async fn scenario_a_farewell_agreement_is_never_sent() {
    let backend = ScriptedBackend::new(["Totally agree!", "Totally agree!", "Totally agree!"]);
    let engine = engine_with(backend.clone());

    let plan = engine
        .on_incoming_message(ChatMessage::from_raw("Alice: bye everyone"))
        .await
        .unwrap();

    assert_eq!(backend.calls(), 3);
    assert!(plan.fallback);
    assert_eq!(plan.response_type, ResponseType::Farewell);
    assert_eq!(plan.messages.len(), 1);
    assert!(plan.messages[0].starts_with("Bye! "));
    assert!(plan.messages.iter().all(|m| !m.contains("agree")));
}

#[test]
fn scenario_a_gate_directly() {
    let signals = parley::intent::classify(&["Alice: bye everyone"]);
    assert!(signals.farewell);
    assert!(validate_candidate("Totally agree!", &signals, std::iter::empty()).is_err());
}

#[test]
fn scenario_b_repeated_question_finds_recorded_answer() {
    let start = Utc::now();
    let mut tracker = SessionTracker::new("ai", start);
    let question = |secs| {
        ChatMessage::new(
            "Bob",
            "what is machine learning?",
            start + ChronoDuration::seconds(secs),
        )
    };
    let mut window: Vec<String> = Vec::new();

    let first = question(1);
    window.push(first.to_line());
    let d1 = tracker.observe(&first, &window).unwrap();
    assert!(!d1.is_repeat);
    assert!(d1.signals.question);
    assert!(d1.previous_answer.is_none());

    let second = question(2);
    window.push(second.to_line());
    let d2 = tracker.observe(&second, &window).unwrap();
    assert!(d2.is_repeat);

    assert!(tracker.record_answer(&second.to_line(), "Software that learns from data"));

    let third = question(3);
    window.push(third.to_line());
    let d3 = tracker.observe(&third, &window).unwrap();
    assert_eq!(d3.previous_answer.as_deref(), Some("Software that learns from data"));
    assert_eq!(d3.instruction, InstructionBranch::RepeatOrAnswered);
}

#[test]
fn scenario_c_related_topic_suggestions() {
    let entries: Vec<_> = (0..5)
        .map(|i| parley::session::SessionLogEntry {
            timestamp: Utc::now(),
            user: "Bob".into(),
            user_message: "Bob: thoughts?".into(),
            bot_responses: vec![format!("market reply number {i}")],
            response_type: ResponseType::General,
            fallback: false,
            topic: "ai jobs market".into(),
            context_data: Default::default(),
        })
        .collect();
    let mut patterns = LearnedPatterns::new();
    patterns.learn_from_session(&entries);

    let stored = patterns.topic_responses("ai jobs market").to_vec();
    assert_eq!(stored.len(), 5);

    let mut rng = StdRng::seed_from_u64(9);
    let picked = patterns.suggest_responses_for_topic("ai jobs", 3, &mut rng);
    assert_eq!(picked.len(), 3);
    assert!(picked.iter().all(|p| stored.contains(p)));
}

#[test]
fn scenario_d_third_greeting_is_multi_greeting() {
    let start = Utc::now();
    let mut tracker = SessionTracker::new("ai", start);
    let mut window = Vec::new();
    let mut last = None;
    for (i, text) in ["hey!", "hello there", "good morning"].into_iter().enumerate() {
        let msg = ChatMessage::new("Carol", text, start + ChronoDuration::seconds(i as i64 + 1));
        window.push(msg.to_line());
        last = tracker.observe(&msg, &window);
    }
    let last = last.unwrap();
    assert_eq!(tracker.state().greeting_count("Carol"), 3);
    assert_eq!(last.greeting_count, 3);
    assert_eq!(last.instruction, InstructionBranch::MultiGreeting { count: 3 });
}

#[tokio::test]
async fn runner_sends_opener_and_threaded_reply() {
    let backend = ScriptedBackend::new(["morning all, busy week?", "mostly b2b saas tools | you?"]);
    let engine = engine_with(backend);
    let now = Utc::now() + ChronoDuration::seconds(1);

    let transport = ScriptedTransport::new(vec![
        InboundMessage::new(ChatMessage::new("Maya", "echo of my own", now)).from_self(),
        InboundMessage::new(ChatMessage::new("Bob", "stale message", now - ChronoDuration::hours(1))),
        InboundMessage::new(ChatMessage::new("Bob", "what are you building?", now).with_id("m1")),
    ]);

    let end = SessionRunner::new(engine.clone(), transport.clone())
        .with_pacing(Pacing::immediate(Duration::from_secs(30)))
        .run()
        .await;

    assert_eq!(transport.health_checks(), 1);
    let sent = transport.sent();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].text, "morning all, busy week?");
    assert!(sent[0].reply_to.is_none());
    assert_eq!(sent[1].text, "mostly b2b saas tools");
    assert_eq!(sent[1].reply_to.as_deref(), Some("m1"));
    assert_eq!(sent[2].text, "you?");
    assert!(sent[2].reply_to.is_none());

    assert_eq!(end.log.responses.len(), 1);
    assert_eq!(end.log.responses[0].user, "Bob");
    assert_eq!(end.log.responses[0].response_type, ResponseType::QuestionAnswer);
    assert!(end.learned.is_some());
}

#[tokio::test]
async fn runner_stops_on_request() {
    let transport = ScriptedTransport::held_open();
    let transcripts = Arc::new(MemoryTranscriptStore::new());
    let engine = Arc::new(
        ConversationEngine::new(
            config(),
            ScriptedBackend::new(["hi all"]),
            Arc::new(LearningManager::in_memory()),
        )
        .with_transcripts(transcripts.clone(), None),
    );

    let runner = SessionRunner::new(engine, transport.clone()).with_pacing(Pacing::immediate(Duration::from_secs(3600)));
    let stop = runner.stop_handle();
    let task = tokio::spawn(runner.run());

    tokio::time::sleep(Duration::from_millis(50)).await;
    stop.stop();
    let end = tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();

    assert!(!stop.is_running());
    assert!(end.transcript_saved);
    assert_eq!(transcripts.len().await, 1);
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn runner_ends_at_deadline() {
    let engine = engine_with(ScriptedBackend::new([]));
    let transport = ScriptedTransport::held_open();

    let end = tokio::time::timeout(
        Duration::from_secs(5),
        SessionRunner::new(engine, transport.clone())
            .with_pacing(Pacing::immediate(Duration::from_millis(100)))
            .run(),
    )
    .await
    .unwrap();

    assert!(end.log.responses.is_empty());
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.starts_with("Hey! Thoughts on remote work and careers?"));
}

#[tokio::test]
async fn runner_survives_failing_transport() {
    let backend = ScriptedBackend::new(["hi all", "shipping a crm | you?"]);
    let transcripts = Arc::new(MemoryTranscriptStore::new());
    let engine = Arc::new(
        ConversationEngine::new(config(), backend, Arc::new(LearningManager::in_memory()))
            .with_transcripts(transcripts.clone(), None),
    );
    let now = Utc::now() + ChronoDuration::seconds(1);
    let transport = ScriptedTransport::offline(vec![InboundMessage::new(
        ChatMessage::new("Bob", "what are you building?", now).with_id("m7"),
    )]);

    let end = tokio::time::timeout(
        Duration::from_secs(5),
        SessionRunner::new(engine, transport.clone())
            .with_pacing(Pacing::immediate(Duration::from_secs(30)))
            .run(),
    )
    .await
    .unwrap();

    assert_eq!(transport.health_checks(), 1);
    assert!(transport.sent().is_empty());
    assert_eq!(end.log.responses.len(), 1);
    assert!(end.transcript_saved);
    assert_eq!(transcripts.len().await, 1);
}
