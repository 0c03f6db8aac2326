//! Session log records and end-of-session analytics.
//!
//! A [`SessionLog`] is the durable record of one session and the unit the
//! learner consumes. Each [`SessionLogEntry`] captures one exchange: the
//! triggering message, what the persona replied, and the context it replied
//! in.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::generation::emoji::contains_emoji;
use crate::intent::ContextSignals;
use crate::session::decision::ResponseType;

/// Number of topics kept in [`SessionAnalytics::top_topics`].
pub const TOP_TOPIC_LIMIT: usize = 5;

/// Context flags captured alongside each exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextData {
    pub is_group_chat: bool,
    pub is_repeat: bool,
    pub greeting_count: u32,
    pub has_previous_answer: bool,
    pub detected_contexts: ContextSignals,
}

/// One exchange within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub user: String,
    /// The triggering message as a `Name: text` line.
    pub user_message: String,
    pub bot_responses: Vec<String>,
    pub response_type: ResponseType,
    /// The replies are canned fallbacks rather than generated text.
    #[serde(default)]
    pub fallback: bool,
    pub topic: String,
    #[serde(default)]
    pub context_data: ContextData,
}

impl SessionLogEntry {
    /// Key under which this entry's type is counted when learning.
    ///
    /// Fallback replies are tracked separately as `fallback_<type>`.
    #[must_use]
    pub fn learning_key(&self) -> String {
        if self.fallback {
            format!("fallback_{}", self.response_type)
        } else {
            self.response_type.to_string()
        }
    }
}

/// Summary numbers for a finished session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionAnalytics {
    pub duration_minutes: f64,
    pub total_responses: usize,
    pub response_types: BTreeMap<String, usize>,
    pub unique_users: Vec<String>,
    /// Most frequent topics with their counts, most frequent first.
    pub top_topics: Vec<(String, usize)>,
    pub average_words_per_response: f64,
    /// Share of exchanges whose replies used at least one emoji, 0–100.
    pub emoji_usage_percent: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl SessionAnalytics {
    /// Compute analytics over `entries` for a session spanning `start..end`.
    #[must_use]
    pub fn compute(entries: &[SessionLogEntry], start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let duration_minutes = round2(end.signed_duration_since(start).num_milliseconds() as f64 / 60_000.0);
        let total_responses = entries.len();
        if total_responses == 0 {
            return Self {
                duration_minutes,
                ..Self::default()
            };
        }

        let mut response_types = BTreeMap::new();
        let mut users = BTreeSet::new();
        let mut topic_counts: HashMap<&str, usize> = HashMap::new();
        let mut total_words = 0usize;
        let mut with_emoji = 0usize;

        for entry in entries {
            *response_types.entry(entry.learning_key()).or_insert(0) += 1;
            users.insert(entry.user.clone());
            *topic_counts.entry(entry.topic.as_str()).or_insert(0) += 1;
            total_words += entry
                .bot_responses
                .iter()
                .map(|r| r.split_whitespace().count())
                .sum::<usize>();
            if entry.bot_responses.iter().any(|r| contains_emoji(r)) {
                with_emoji += 1;
            }
        }

        let mut top_topics: Vec<(String, usize)> = topic_counts
            .into_iter()
            .map(|(topic, count)| (topic.to_owned(), count))
            .collect();
        top_topics.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_topics.truncate(TOP_TOPIC_LIMIT);

        Self {
            duration_minutes,
            total_responses,
            response_types,
            unique_users: users.into_iter().collect(),
            top_topics,
            average_words_per_response: round2(total_words as f64 / total_responses as f64),
            emoji_usage_percent: round2(with_emoji as f64 * 100.0 / total_responses as f64),
        }
    }
}

/// Durable record of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    pub id: String,
    pub super_context: String,
    pub session_start: DateTime<Utc>,
    pub session_end: DateTime<Utc>,
    #[serde(default)]
    pub analytics: SessionAnalytics,
    #[serde(default)]
    pub responses: Vec<SessionLogEntry>,
}

impl SessionLog {
    /// Assemble a log and compute its analytics.
    #[must_use]
    pub fn new(
        super_context: impl Into<String>,
        session_start: DateTime<Utc>,
        session_end: DateTime<Utc>,
        responses: Vec<SessionLogEntry>,
    ) -> Self {
        let analytics = SessionAnalytics::compute(&responses, session_start, session_end);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            super_context: super_context.into(),
            session_start,
            session_end,
            analytics,
            responses,
        }
    }
}
