//! The conversation engine: one persona in one conversation.
//!
//! [`ConversationEngine`] ties the pieces together. An incoming message is
//! observed by the session tracker, turned into a prompt (with learned
//! insights when learning is on), sent to the backend under a bounded retry
//! policy, post-processed and validated, and finally recorded in the session
//! log. Every failure path ends in a canned fallback; nothing here surfaces an
//! error as a chat reply.
//!
//! The per-conversation state sits behind its own mutex. The lock is never
//! held while the backend is being awaited.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{GenerationConfig, ParleyConfig};
use crate::generation::backend::{GenerationError, ResponseBackend};
use crate::generation::emoji;
use crate::generation::persona::Persona;
use crate::generation::prompt::PromptContext;
use crate::generation::retry::{GenerationOutcome, RetryPolicy};
use crate::intent::ContextSignals;
use crate::learning::manager::{LearningManager, SaveOutcome};
use crate::learning::transcripts::TranscriptStore;
use crate::message::ChatMessage;
use crate::session::decision::{ContextDecision, ResponseType};
use crate::session::tracker::{ContextState, SessionTracker};
use crate::session::transcript::{ContextData, SessionLog, SessionLogEntry};
use crate::session::validation::{FallbackKind, Rejection, validate_candidate};
use crate::session::window::MessageWindow;
use crate::text::truncate_words;

static NAME_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+:\s+").ok());

/// What to send in answer to one incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPlan {
    /// Message parts, in send order.
    pub messages: Vec<String>,
    /// Message ID the first part should reply to.
    pub reply_to: Option<String>,
    /// Whether the first part should be sent as a threaded reply.
    pub should_reply: bool,
    pub response_type: ResponseType,
    /// The parts are canned fallbacks.
    pub fallback: bool,
}

/// What happened when a session was closed.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEnd {
    pub log: SessionLog,
    /// The transcript reached at least one store.
    pub transcript_saved: bool,
    /// Patterns learned and where they were saved; `None` with learning off.
    pub learned: Option<(usize, SaveOutcome)>,
}

struct Conversation {
    tracker: SessionTracker,
    window: MessageWindow,
    entries: Vec<SessionLogEntry>,
    session_start: DateTime<Utc>,
}

impl Conversation {
    fn new(config: &ParleyConfig, now: DateTime<Utc>) -> Self {
        Self {
            tracker: SessionTracker::new(config.persona.super_context.clone(), now)
                .with_topic_interval(config.session.topic_update_interval_secs),
            window: MessageWindow::new(config.session.history_window),
            entries: Vec::new(),
            session_start: now,
        }
    }
}

/// Drives one persona through one conversation.
pub struct ConversationEngine {
    persona: Persona,
    config: ParleyConfig,
    backend: Arc<dyn ResponseBackend>,
    learning: Arc<LearningManager>,
    transcripts: Vec<Arc<dyn TranscriptStore>>,
    learning_enabled: AtomicBool,
    retry: RetryPolicy,
    conversation: Mutex<Conversation>,
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("persona", &self.persona)
            .field("backend", &self.backend.name())
            .field("learning_enabled", &self.is_learning_enabled())
            .finish_non_exhaustive()
    }
}

impl ConversationEngine {
    /// Create an engine whose session starts now.
    pub fn new(config: ParleyConfig, backend: Arc<dyn ResponseBackend>, learning: Arc<LearningManager>) -> Self {
        let persona = Persona::from_context(&config.persona.super_context)
            .with_overrides(config.persona.name.as_deref(), config.persona.role.as_deref());
        info!(
            name = %persona.name,
            role = %persona.role,
            backend = backend.name(),
            "conversation engine ready"
        );
        Self {
            learning_enabled: AtomicBool::new(config.learning.enabled),
            retry: RetryPolicy::new(config.generation.max_attempts),
            conversation: Mutex::new(Conversation::new(&config, Utc::now())),
            persona,
            config,
            backend,
            learning,
            transcripts: Vec::new(),
        }
    }

    /// Where finished session logs go: `primary` first, then `fallback`.
    #[must_use]
    pub fn with_transcripts(
        mut self,
        primary: Arc<dyn TranscriptStore>,
        fallback: Option<Arc<dyn TranscriptStore>>,
    ) -> Self {
        self.transcripts = std::iter::once(primary).chain(fallback).collect();
        self
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn config(&self) -> &ParleyConfig {
        &self.config
    }

    pub fn learning(&self) -> &Arc<LearningManager> {
        &self.learning
    }

    pub fn is_learning_enabled(&self) -> bool {
        self.learning_enabled.load(Ordering::Relaxed)
    }

    /// Turn cross-session learning on or off. Applies from the next message.
    pub fn set_learning_enabled(&self, enabled: bool) {
        self.learning_enabled.store(enabled, Ordering::Relaxed);
        info!(enabled, "learning toggled");
    }

    /// A copy of the current session state.
    pub async fn state(&self) -> ContextState {
        self.conversation.lock().await.tracker.state().clone()
    }

    /// When the current session started.
    pub async fn session_start(&self) -> DateTime<Utc> {
        self.conversation.lock().await.session_start
    }

    /// Log entries recorded so far this session.
    pub async fn entries(&self) -> Vec<SessionLogEntry> {
        self.conversation.lock().await.entries.clone()
    }

    /// Handle one incoming message and decide what to say.
    ///
    /// Returns `None` for messages without text. Otherwise the plan always
    /// carries at least one part: generated when possible, canned when the
    /// retry budget runs out.
    pub async fn on_incoming_message(&self, message: ChatMessage) -> Option<ReplyPlan> {
        let (decision, prompt, window_lines) = {
            let mut conv = self.conversation.lock().await;
            if !message.has_text() {
                debug!(sender = %message.sender, "ignoring message without text");
                return None;
            }
            conv.window.push(message.clone());
            let window_lines = conv.window.lines();
            let decision = conv.tracker.observe(&message, &window_lines)?;
            let state = conv.tracker.state();
            let prompt = PromptContext::for_reply(
                &self.persona,
                &self.config.persona.super_context,
                self.config.session.is_group_chat,
                state.current_topic(),
                window_lines.clone(),
                &decision,
                state.topic_history(),
            );
            (decision, prompt, window_lines)
        };

        let prompt = if self.is_learning_enabled() {
            let question = decision.is_question.then_some(message.text.as_str());
            let profile = ResponseType::emoji_profile(&decision.signals);
            let insights = self
                .learning
                .suggestions(
                    prompt.topic.as_str(),
                    question,
                    profile.as_str(),
                    self.config.learning.suggestion_limit,
                )
                .await
                .with_window(&window_lines);
            prompt.with_insights(insights.render())
        } else {
            prompt
        };

        let outcome = self.generate_reply(&prompt, &decision.signals).await;
        let (messages, fallback) = match outcome {
            GenerationOutcome::Generated { value, attempts } => {
                debug!(attempts, parts = value.len(), "reply generated");
                (value, false)
            }
            GenerationOutcome::Exhausted { failures } => {
                let kind = FallbackKind::from_signals(&decision.signals);
                warn!(attempts = failures.len(), ?kind, "generation exhausted, using fallback");
                (kind.messages(&mut rand::thread_rng()), true)
            }
        };

        let should_reply = message.id.is_some() && self.wants_reply(&decision);
        let plan = ReplyPlan {
            reply_to: if should_reply { message.id.clone() } else { None },
            should_reply,
            response_type: decision.response_type,
            fallback,
            messages,
        };

        self.record_turn(&message, &decision, &plan).await;
        Some(plan)
    }

    async fn generate_reply(
        &self,
        prompt: &PromptContext,
        signals: &ContextSignals,
    ) -> GenerationOutcome<Vec<String>> {
        let backend = &*self.backend;
        let conversation = &self.conversation;
        let generation = &self.config.generation;
        self.retry
            .run(move |attempt| async move {
                debug!(attempt, backend = backend.name(), "requesting reply");
                let raw = backend.generate(prompt).await?;
                let conv = conversation.lock().await;
                post_process(
                    &raw,
                    signals,
                    conv.tracker.state().recent_responses(),
                    generation,
                    &mut rand::thread_rng(),
                )
            })
            .await
    }

    fn wants_reply(&self, decision: &ContextDecision) -> bool {
        let signals = &decision.signals;
        decision.is_question
            || signals.question
            || (signals.greeting && decision.greeting_count <= 1)
            || rand::thread_rng().gen_bool(self.config.generation.reply_probability.clamp(0.0, 1.0))
    }

    async fn record_turn(&self, message: &ChatMessage, decision: &ContextDecision, plan: &ReplyPlan) {
        let now = Utc::now();
        let mut conv = self.conversation.lock().await;

        if !plan.fallback {
            for part in &plan.messages {
                conv.tracker.accept_response(part.clone());
            }
            if decision.is_question
                && decision.previous_answer.is_none()
                && let Some(first) = plan.messages.first()
            {
                conv.tracker.record_answer(&decision.line, first.clone());
            }
        }
        for part in &plan.messages {
            conv.window.push(ChatMessage::new(self.persona.name.clone(), part.clone(), now));
        }

        let topic = conv.tracker.state().current_topic().to_owned();
        conv.entries.push(SessionLogEntry {
            timestamp: message.timestamp,
            user: message.sender.clone(),
            user_message: decision.line.clone(),
            bot_responses: plan.messages.clone(),
            response_type: plan.response_type,
            fallback: plan.fallback,
            topic,
            context_data: ContextData {
                is_group_chat: self.config.session.is_group_chat,
                is_repeat: decision.is_repeat,
                greeting_count: decision.greeting_count,
                has_previous_answer: decision.previous_answer.is_some(),
                detected_contexts: decision.signals,
            },
        });
    }

    /// The first message of a session.
    ///
    /// Group chats get a short opener, direct chats a self-introduction.
    /// When the backend cannot deliver, a canned opener is used. Either way
    /// the text is remembered for anti-repetition.
    pub async fn produce_initial_message(&self, is_group_chat: bool) -> String {
        let prompt = PromptContext::for_opening(&self.persona, &self.config.persona.super_context, is_group_chat);
        let backend = &*self.backend;
        let prompt_ref = &prompt;
        let outcome = self
            .retry
            .run(move |_attempt| async move {
                let raw = backend.generate(prompt_ref).await?;
                let text = raw.trim();
                if text.is_empty() {
                    Err(GenerationError::Malformed("empty opener".into()))
                } else {
                    Ok(text.to_owned())
                }
            })
            .await;

        let generation = &self.config.generation;
        let text = {
            let mut rng = rand::thread_rng();
            match outcome.into_value() {
                Some(text) => {
                    let text = if is_group_chat {
                        truncate_words(&text, generation.max_opener_words)
                    } else {
                        text
                    };
                    emoji::maybe_append(&text, generation.emoji_probability, &mut rng)
                }
                None => {
                    warn!("opener generation failed, using canned opener");
                    let emoji = emoji::random_emoji(&mut rng);
                    if is_group_chat {
                        format!("Hey! Thoughts on {}? {emoji}", self.config.persona.super_context)
                    } else {
                        format!(
                            "Hey! I'm {}, {}. What do you think about the industry these days? {emoji}",
                            self.persona.name, self.persona.role
                        )
                    }
                }
            }
        };

        let mut conv = self.conversation.lock().await;
        conv.tracker.accept_response(text.clone());
        conv.window.push(ChatMessage::new(self.persona.name.clone(), text.clone(), Utc::now()));
        info!(group = is_group_chat, "opening message ready");
        text
    }

    /// Close the current session.
    ///
    /// The log is written to the transcript stores (primary, then fallback)
    /// and folded into the learned patterns when learning is on. The session
    /// state is then reset to the seed topic and a new session starts.
    pub async fn end_session(&self) -> SessionEnd {
        let now = Utc::now();
        let (start, entries) = {
            let mut conv = self.conversation.lock().await;
            let start = conv.session_start;
            let entries = std::mem::take(&mut conv.entries);
            conv.tracker.reset(now);
            conv.window.clear();
            conv.session_start = now;
            (start, entries)
        };

        let log = SessionLog::new(self.config.persona.super_context.clone(), start, now, entries);
        let transcript_saved = self.save_transcript(&log).await;

        let learned = if self.is_learning_enabled() {
            Some(self.learning.learn_from_session(&log.responses).await)
        } else {
            None
        };

        info!(
            session = %log.id,
            responses = log.analytics.total_responses,
            transcript_saved,
            "session ended"
        );
        SessionEnd {
            log,
            transcript_saved,
            learned,
        }
    }

    async fn save_transcript(&self, log: &SessionLog) -> bool {
        for store in &self.transcripts {
            match store.save(log).await {
                Ok(()) => {
                    debug!(store = %store.describe(), "session transcript saved");
                    return true;
                }
                Err(e) => warn!(store = %store.describe(), "failed to save session transcript: {e}"),
            }
        }
        if !self.transcripts.is_empty() {
            warn!(session = %log.id, "session transcript lost");
        }
        false
    }
}

fn strip_name_prefix(part: &str) -> &str {
    match NAME_PREFIX.as_ref().and_then(|re| re.find(part)) {
        Some(m) => &part[m.end()..],
        None => part,
    }
}

/// Turn raw backend output into validated reply parts.
///
/// Parts are split on `|`, stripped of a `Name: ` prefix, capped in length,
/// and run through the validation gate against `recent` plus the parts
/// already accepted from this output. Accepted parts may get an emoji.
fn post_process<'a, R: Rng + ?Sized>(
    raw: &str,
    signals: &ContextSignals,
    recent: impl Iterator<Item = &'a str>,
    config: &GenerationConfig,
    rng: &mut R,
) -> Result<Vec<String>, GenerationError> {
    let recent: Vec<&str> = recent.collect();
    let candidates: Vec<String> = raw
        .split('|')
        .map(|part| strip_name_prefix(part.trim()).trim())
        .filter(|part| !part.is_empty())
        .map(|part| truncate_words(part, config.max_words_per_part))
        .collect();
    if candidates.is_empty() {
        return Err(GenerationError::Malformed("no reply parts".into()));
    }

    let mut accepted: Vec<String> = Vec::new();
    let mut last_rejection: Option<Rejection> = None;
    for candidate in candidates {
        if accepted.len() >= config.max_parts {
            break;
        }
        let seen = recent.iter().copied().chain(accepted.iter().map(String::as_str));
        match validate_candidate(&candidate, signals, seen) {
            Ok(()) => accepted.push(emoji::decorate(&candidate, config.emoji_probability, rng)),
            Err(rejection) => {
                debug!(%candidate, %rejection, "reply part rejected");
                last_rejection = Some(rejection);
            }
        }
    }

    match (accepted.is_empty(), last_rejection) {
        (false, _) => Ok(accepted),
        (true, Some(rejection)) => Err(GenerationError::Rejected(rejection)),
        (true, None) => Err(GenerationError::Malformed("no reply parts".into())),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use chrono::Duration;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::intent::classify;
    use crate::learning::transcripts::MemoryTranscriptStore;

    /// Replays canned outputs in order, then fails.
    struct Scripted {
        outputs: StdMutex<VecDeque<Result<String, GenerationError>>>,
        prompts: StdMutex<Vec<PromptContext>>,
    }

    impl Scripted {
        fn new(outputs: Vec<Result<&str, GenerationError>>) -> Self {
            Self {
                outputs: StdMutex::new(outputs.into_iter().map(|r| r.map(str::to_owned)).collect()),
                prompts: StdMutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<PromptContext> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResponseBackend for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &PromptContext) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.clone());
            self.outputs
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError::Backend("script exhausted".into())))
        }
    }

    fn quiet_config() -> ParleyConfig {
        let mut config = ParleyConfig::default();
        config.persona.super_context = "You are Maya, a growth marketer".into();
        config.generation.emoji_probability = 0.0;
        config.generation.reply_probability = 0.0;
        config
    }

    fn engine(outputs: Vec<Result<&str, GenerationError>>) -> (ConversationEngine, Arc<Scripted>) {
        let backend = Arc::new(Scripted::new(outputs));
        let engine = ConversationEngine::new(
            quiet_config(),
            backend.clone(),
            Arc::new(LearningManager::in_memory()),
        );
        (engine, backend)
    }

    fn msg(raw: &str) -> ChatMessage {
        ChatMessage::from_raw(raw)
    }

    #[test]
    fn post_process_splits_strips_and_caps() {
        let signals = classify(&["Bob: what do you think"]);
        let config = GenerationConfig {
            emoji_probability: 0.0,
            ..GenerationConfig::default()
        };
        let parts = post_process(
            "Maya: honestly the market is wild | one two three four five six seven eight nine ten eleven twelve | third",
            &signals,
            std::iter::empty(),
            &config,
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap();
        assert_eq!(
            parts,
            vec![
                "honestly the market is wild".to_owned(),
                "one two three four five six seven eight nine ten eleven".to_owned(),
            ]
        );
    }

    #[test]
    fn post_process_rejects_everything_as_rejection() {
        let signals = classify(&["Alice: bye everyone"]);
        let err = post_process(
            "Totally agree!",
            &signals,
            std::iter::empty(),
            &GenerationConfig::default(),
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap_err();
        assert!(matches!(err, GenerationError::Rejected(Rejection::AgreesWithFarewell)));
    }

    #[test]
    fn post_process_checks_parts_against_each_other() {
        let signals = ContextSignals::default();
        let config = GenerationConfig {
            emoji_probability: 0.0,
            ..GenerationConfig::default()
        };
        let parts = post_process(
            "remote work is great | remote work is great",
            &signals,
            std::iter::empty(),
            &config,
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap();
        assert_eq!(parts, vec!["remote work is great".to_owned()]);
    }

    #[test]
    fn blank_output_is_malformed() {
        let err = post_process(
            " | |",
            &ContextSignals::default(),
            std::iter::empty(),
            &GenerationConfig::default(),
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[tokio::test]
    async fn blank_message_is_skipped() {
        let (engine, backend) = engine(vec![]);
        assert!(engine.on_incoming_message(msg("Bob:   ")).await.is_none());
        assert!(backend.prompts().is_empty());
        assert_eq!(engine.state().await.seen_count(), 0);
    }

    #[tokio::test]
    async fn generated_reply_is_recorded() {
        let (engine, backend) = engine(vec![Ok("pretty solid tbh | you?")]);
        let plan = engine
            .on_incoming_message(msg("Bob: what is growth hacking?").with_id("7"))
            .await
            .unwrap();

        assert!(!plan.fallback);
        assert!(plan.should_reply);
        assert_eq!(plan.reply_to.as_deref(), Some("7"));
        assert_eq!(plan.response_type, ResponseType::QuestionAnswer);
        assert_eq!(plan.messages, vec!["pretty solid tbh", "you?"]);

        let state = engine.state().await;
        assert_eq!(state.recent_responses().collect::<Vec<_>>(), vec!["pretty solid tbh", "you?"]);
        assert_eq!(state.answered_count(), 1);

        let prompts = backend.prompts();
        assert_eq!(prompts[0].persona.name, "Maya");
        assert!(prompts[0].recent_messages.last().unwrap().contains("growth hacking"));
    }

    #[tokio::test]
    async fn rejected_then_accepted_on_retry() {
        let (engine, backend) = engine(vec![Ok("Totally agree!"), Ok("see you later then")]);
        let plan = engine.on_incoming_message(msg("Alice: bye everyone")).await.unwrap();
        assert!(!plan.fallback);
        assert_eq!(plan.messages, vec!["see you later then"]);
        assert_eq!(plan.response_type, ResponseType::Farewell);
        assert_eq!(backend.prompts().len(), 2);
    }

    #[tokio::test]
    async fn exhausted_retries_fall_back() {
        let (engine, backend) = engine(vec![
            Err(GenerationError::Backend("timeout".into())),
            Err(GenerationError::Backend("timeout".into())),
            Err(GenerationError::Backend("timeout".into())),
        ]);
        let plan = engine.on_incoming_message(msg("Bob: what is seo?")).await.unwrap();
        assert!(plan.fallback);
        assert_eq!(plan.messages, vec!["Sorry, not sure about that one"]);
        assert_eq!(backend.prompts().len(), 3);

        let state = engine.state().await;
        assert_eq!(state.recent_responses().count(), 0);
        assert_eq!(state.answered_count(), 0);

        let entries = engine.entries().await;
        assert!(entries[0].fallback);
        assert_eq!(entries[0].learning_key(), "fallback_question_answer");
    }

    #[tokio::test]
    async fn no_reply_target_without_message_id() {
        let (engine, _) = engine(vec![Ok("sure thing")]);
        let plan = engine.on_incoming_message(msg("Bob: how are you?")).await.unwrap();
        assert!(!plan.should_reply);
        assert!(plan.reply_to.is_none());
    }

    #[tokio::test]
    async fn repeated_question_reuses_answer_in_prompt() {
        let (engine, backend) = engine(vec![Ok("it means learning from data"), Ok("like I said, data")]);
        engine.on_incoming_message(msg("Bob: what is machine learning?")).await.unwrap();
        let plan = engine.on_incoming_message(msg("Bob: what is machine learning?")).await.unwrap();
        assert_eq!(plan.response_type, ResponseType::RepeatHandling);

        let prompts = backend.prompts();
        assert!(prompts[1].instruction.contains("repeat question"));
        assert!(prompts[1].session_notes.iter().any(|n| n.contains("already answered")));
    }

    #[tokio::test]
    async fn learning_toggle_controls_insights() {
        let backend = Arc::new(Scripted::new(vec![Ok("first reply here"), Ok("second reply here")]));
        let learning = Arc::new(LearningManager::in_memory());
        learning
            .learn_from_session(&[SessionLogEntry {
                timestamp: Utc::now(),
                user: "Bob".into(),
                user_message: "Bob: thoughts?".into(),
                bot_responses: vec!["Funnels beat vibes".into()],
                response_type: ResponseType::General,
                fallback: false,
                topic: "You are Maya, a growth marketer".into(),
                context_data: ContextData::default(),
            }])
            .await;
        let engine = ConversationEngine::new(quiet_config(), backend.clone(), learning);

        engine.on_incoming_message(msg("Bob: thoughts on ads")).await.unwrap();
        engine.set_learning_enabled(false);
        engine.on_incoming_message(msg("Bob: and on email")).await.unwrap();

        let prompts = backend.prompts();
        assert!(prompts[0].insights.as_deref().unwrap().contains("Funnels beat vibes"));
        assert!(prompts[1].insights.is_none());
    }

    #[tokio::test]
    async fn opener_is_truncated_and_remembered() {
        let (engine, _) = engine(vec![Ok("hey folks what is everyone building this week honestly")]);
        let opener = engine.produce_initial_message(true).await;
        assert_eq!(opener, "hey folks what is everyone building this week");
        let state = engine.state().await;
        assert_eq!(state.recent_responses().collect::<Vec<_>>(), vec![opener.as_str()]);
    }

    #[tokio::test]
    async fn opener_falls_back_when_backend_fails() {
        let (engine, _) = engine(vec![]);
        let direct = engine.produce_initial_message(false).await;
        assert!(direct.starts_with("Hey! I'm Maya, growth marketer."));
        let group = engine.produce_initial_message(true).await;
        assert!(group.starts_with("Hey! Thoughts on You are Maya, a growth marketer?"));
    }

    #[tokio::test]
    async fn end_session_saves_learns_and_resets() {
        let backend = Arc::new(Scripted::new(vec![Ok("growth loops are underrated")]));
        let transcripts = Arc::new(MemoryTranscriptStore::new());
        let engine = ConversationEngine::new(
            quiet_config(),
            backend,
            Arc::new(LearningManager::in_memory()),
        )
        .with_transcripts(transcripts.clone(), None);

        let start = engine.session_start().await;
        engine
            .on_incoming_message(ChatMessage::new("Bob", "thoughts on growth", start + Duration::seconds(1)))
            .await
            .unwrap();
        let end = engine.end_session().await;

        assert!(end.transcript_saved);
        assert_eq!(end.log.responses.len(), 1);
        assert_eq!(end.log.session_start, start);
        let (learned, saved) = end.learned.unwrap();
        assert!(learned > 0);
        assert_eq!(saved, SaveOutcome::Primary);
        assert_eq!(transcripts.len().await, 1);

        let state = engine.state().await;
        assert_eq!(state.seen_count(), 0);
        assert_eq!(state.recent_responses().count(), 0);
        assert!(engine.entries().await.is_empty());
        assert!(engine.session_start().await >= start);
    }

    #[tokio::test]
    async fn end_session_without_learning_skips_patterns() {
        let (engine, _) = engine(vec![]);
        engine.set_learning_enabled(false);
        let end = engine.end_session().await;
        assert!(end.learned.is_none());
        assert!(!end.transcript_saved);
    }
}
