//! Candidate-reply validation gate and canned fallbacks.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::generation::emoji::random_emoji;
use crate::intent::{AGREEMENT_SIGNALS, ContextSignals, FAREWELLS, contains_any};
use crate::similarity::{REPETITION_THRESHOLD, similarity};

/// Why a candidate reply was refused.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Says goodbye when nobody is leaving.
    UnexpectedFarewell,
    /// Agrees with someone who is saying goodbye.
    AgreesWithFarewell,
    /// Too close to one of the last few replies.
    TooSimilar { score: f64 },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedFarewell => f.write_str("farewell without a farewell context"),
            Self::AgreesWithFarewell => f.write_str("agreement in reply to a farewell"),
            Self::TooSimilar { score } => write!(f, "too similar to a recent reply ({score:.2})"),
        }
    }
}

/// Check `candidate` against the active signals and recent accepted replies.
///
/// Rules are applied in order and the first failure is returned.
pub fn validate_candidate<'a>(
    candidate: &str,
    signals: &ContextSignals,
    recent: impl IntoIterator<Item = &'a str>,
) -> Result<(), Rejection> {
    let lowered = candidate.to_lowercase();

    if !signals.farewell && contains_any(&lowered, FAREWELLS) {
        return Err(Rejection::UnexpectedFarewell);
    }
    if signals.farewell && contains_any(&lowered, AGREEMENT_SIGNALS) {
        return Err(Rejection::AgreesWithFarewell);
    }
    for previous in recent {
        let score = similarity(&lowered, previous);
        if score > REPETITION_THRESHOLD {
            return Err(Rejection::TooSimilar { score });
        }
    }
    Ok(())
}

const GENERIC_ACKNOWLEDGMENTS: &[&str] = &[
    "Interesting point!",
    "Makes sense!",
    "Good to know!",
    "Tell me more?",
    "Cool!",
    "That's neat!",
    "Thanks for sharing!",
    "Got it!",
    "Totally get it",
    "That's wild",
    "No way!",
    "For real?",
    "Keep going...",
];

/// Canned reply category used once generation gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    Farewell,
    Question,
    Joke,
    Greeting,
    Generic,
}

impl FallbackKind {
    /// Pick the category from the active signals.
    #[must_use]
    pub fn from_signals(signals: &ContextSignals) -> Self {
        if signals.farewell {
            Self::Farewell
        } else if signals.question {
            Self::Question
        } else if signals.joke {
            Self::Joke
        } else if signals.greeting {
            Self::Greeting
        } else {
            Self::Generic
        }
    }

    /// Render the canned message parts for this category.
    pub fn messages<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        match self {
            Self::Farewell => vec![format!("Bye! {}", random_emoji(rng))],
            Self::Question => vec!["Sorry, not sure about that one".to_owned()],
            Self::Joke => vec![
                format!("LOL {}", random_emoji(rng)),
                "That's hilarious!".to_owned(),
            ],
            Self::Greeting => vec![format!("Hey there! {}", random_emoji(rng))],
            Self::Generic => {
                let pick = GENERIC_ACKNOWLEDGMENTS.choose(rng).copied().unwrap_or("Got it!");
                vec![pick.to_owned()]
            }
        }
    }
}
