//! Bounded retry around generation attempts.
//!
//! Backend failures and validation rejections both burn one attempt. Nothing
//! sleeps between attempts; the caller decides what to do once the budget is
//! spent (the engine falls back to a canned reply).

use std::future::Future;

use tracing::{debug, warn};

use crate::generation::backend::GenerationError;

/// Default attempt budget per turn.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// What a bounded run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome<T> {
    /// An attempt succeeded.
    Generated { value: T, attempts: u32 },
    /// Every attempt failed; one error per attempt, in order.
    Exhausted { failures: Vec<GenerationError> },
}

impl<T> GenerationOutcome<T> {
    /// The generated value, if any.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Generated { value, .. } => Some(value),
            Self::Exhausted { .. } => None,
        }
    }
}

/// Fixed attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// A policy allowing `max_attempts` tries (at least one).
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` until it succeeds or the budget is spent.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> GenerationOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let mut failures = Vec::new();
        for attempt in 1..=self.max_attempts {
            match op(attempt).await {
                Ok(value) => {
                    debug!(attempt, "generation succeeded");
                    return GenerationOutcome::Generated {
                        value,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    warn!(attempt, max_attempts = self.max_attempts, "generation attempt failed: {e}");
                    failures.push(e);
                }
            }
        }
        GenerationOutcome::Exhausted { failures }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn succeeds_on_later_attempt() {
        let calls = AtomicU32::new(0);
        let outcome = RetryPolicy::new(3)
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(GenerationError::Backend("timeout".into()))
                    } else {
                        Ok("hi")
                    }
                }
            })
            .await;
        assert_eq!(
            outcome,
            GenerationOutcome::Generated {
                value: "hi",
                attempts: 2
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausts_after_budget() {
        let outcome: GenerationOutcome<()> = RetryPolicy::new(3)
            .run(|_| async { Err(GenerationError::Malformed("empty".into())) })
            .await;
        match outcome {
            GenerationOutcome::Exhausted { failures } => assert_eq!(failures.len(), 3),
            GenerationOutcome::Generated { .. } => unreachable!("no attempt can succeed"),
        }
    }

    #[test]
    fn zero_attempts_is_clamped() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
    }
}
