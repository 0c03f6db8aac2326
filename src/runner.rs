//! Session runner: drives an engine over a transport for one timed session.
//!
//! The runner owns the loop. It sends the opener, pulls inbound messages off
//! the transport channel, paces replies like a person would, and closes the
//! session when the duration runs out, the transport goes away, or a stop is
//! requested. Stopping is cooperative and takes effect between turns.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::Rng;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::engine::{ConversationEngine, ReplyPlan, SessionEnd};
use crate::transport::{ChatTransport, InboundMessage, OutboundMessage};

/// Inbound queue depth between the transport and the runner.
const INBOUND_QUEUE: usize = 64;

/// Longest session a runner will schedule (one week).
pub const MAX_SESSION_MINUTES: u64 = 7 * 24 * 60;

/// Timing for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    pub session_duration: Duration,
    /// Wait before the first part of a reply.
    pub response_delay: RangeInclusive<Duration>,
    /// Wait between reply parts.
    pub part_delay: RangeInclusive<Duration>,
}

impl Pacing {
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            session_duration: Duration::from_secs(config.duration_minutes.min(MAX_SESSION_MINUTES) * 60),
            response_delay: Duration::from_secs(config.response_delay_min_secs)
                ..=Duration::from_secs(config.response_delay_max_secs),
            part_delay: Duration::from_secs(config.part_delay_min_secs)
                ..=Duration::from_secs(config.part_delay_max_secs),
        }
    }

    /// No delays at all; the session lasts `session_duration`.
    #[must_use]
    pub fn immediate(session_duration: Duration) -> Self {
        Self {
            session_duration,
            response_delay: Duration::ZERO..=Duration::ZERO,
            part_delay: Duration::ZERO..=Duration::ZERO,
        }
    }
}

fn pick(range: &RangeInclusive<Duration>) -> Duration {
    let (lo, hi) = (range.start().as_millis(), range.end().as_millis());
    if lo >= hi {
        return *range.start();
    }
    let ms = rand::thread_rng().gen_range(lo..=hi);
    Duration::from_millis(u64::try_from(ms).unwrap_or(u64::MAX))
}

/// Cloneable handle for stopping a running session.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl StopHandle {
    /// Ask the session to end after the current turn.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.wake.notify_one();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Runs one session of an engine over a transport.
pub struct SessionRunner {
    engine: Arc<ConversationEngine>,
    transport: Arc<dyn ChatTransport>,
    pacing: Pacing,
    is_group_chat: bool,
    stop: StopHandle,
}

impl SessionRunner {
    /// A runner paced by the engine's session config.
    pub fn new(engine: Arc<ConversationEngine>, transport: Arc<dyn ChatTransport>) -> Self {
        let session = &engine.config().session;
        let pacing = Pacing::from_config(session);
        let is_group_chat = session.is_group_chat;
        let stop = StopHandle::default();
        stop.running.store(true, Ordering::SeqCst);
        Self {
            engine,
            transport,
            pacing,
            is_group_chat,
            stop,
        }
    }

    #[must_use]
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Handle for stopping the session from elsewhere.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run the session to completion and close it.
    ///
    /// A stop requested before this is called ends the session right after
    /// the opener.
    pub async fn run(self) -> SessionEnd {
        match self.transport.health_check().await {
            Ok(true) => {}
            Ok(false) => warn!(transport = self.transport.id(), "transport reports unhealthy"),
            Err(e) => warn!(transport = self.transport.id(), "transport health check failed: {e}"),
        }

        let (inbound_tx, mut inbound_rx) = mpsc::channel::<InboundMessage>(INBOUND_QUEUE);
        let mut workers = JoinSet::new();
        {
            let transport = Arc::clone(&self.transport);
            workers.spawn(async move {
                if let Err(e) = transport.run(inbound_tx).await {
                    warn!(transport = transport.id(), "transport stopped: {e}");
                }
            });
        }

        let session_start = self.engine.session_start().await;
        let deadline = tokio::time::Instant::now() + self.pacing.session_duration;
        info!(
            transport = self.transport.id(),
            minutes = self.pacing.session_duration.as_secs() / 60,
            "session started"
        );

        let opener = self.engine.produce_initial_message(self.is_group_chat).await;
        self.send(OutboundMessage::new(opener)).await;

        while self.stop.is_running() {
            let inbound = tokio::select! {
                () = tokio::time::sleep_until(deadline) => {
                    info!("session duration reached");
                    break;
                }
                () = self.stop.wake.notified() => continue,
                inbound = inbound_rx.recv() => match inbound {
                    Some(inbound) => inbound,
                    None => {
                        info!("transport closed its channel");
                        break;
                    }
                },
            };

            if inbound.from_self {
                continue;
            }
            if inbound.message.timestamp < session_start {
                debug!(sender = %inbound.message.sender, "skipping message from before the session");
                continue;
            }

            if let Some(plan) = self.engine.on_incoming_message(inbound.message).await {
                self.deliver(plan).await;
            }
        }

        self.stop.running.store(false, Ordering::SeqCst);
        workers.abort_all();
        while workers.join_next().await.is_some() {}

        self.engine.end_session().await
    }

    async fn deliver(&self, plan: ReplyPlan) {
        tokio::time::sleep(pick(&self.pacing.response_delay)).await;
        if let Err(e) = self.transport.set_typing(true).await {
            debug!("typing indicator failed: {e}");
        }

        for (i, part) in plan.messages.into_iter().enumerate() {
            let reply_to = if i == 0 { plan.reply_to.clone() } else { None };
            if i > 0 {
                tokio::time::sleep(pick(&self.pacing.part_delay)).await;
            }
            self.send(OutboundMessage::new(part).replying_to(reply_to)).await;
        }

        if let Err(e) = self.transport.set_typing(false).await {
            debug!("typing indicator failed: {e}");
        }
    }

    async fn send(&self, message: OutboundMessage) {
        if let Err(e) = self.transport.send(message).await {
            warn!(transport = self.transport.id(), "failed to send message: {e}");
        }
    }
}
