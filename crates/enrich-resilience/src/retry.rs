// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retry driven by explicit attempt outcomes.
//!
//! The attempt closure reports [`AttemptOutcome`]; the loop decides between
//! retrying the same target and giving up. Cancellation is observed outside
//! the outcome type and always wins.

use std::fmt;
use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backoff::BackoffPolicy;

/// Result of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome<T, E> {
    Success(T),
    /// Worth another attempt if the budget allows.
    Retryable(E),
    /// Stop now; never retried or advanced past.
    Fatal(E),
}

/// What happens after a retryable failure of attempt `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    RetrySame { next_attempt: u32 },
    /// Attempts for this target are spent.
    Advance,
}

/// Pure transition function of the retry state machine.
pub fn next_transition(attempt: u32, max_attempts: u32) -> Transition {
    if attempt < max_attempts {
        Transition::RetrySame {
            next_attempt: attempt + 1,
        }
    } else {
        Transition::Advance
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
    #[error("{0}")]
    Fatal(E),
    #[error("operation cancelled")]
    Cancelled,
}

/// Attempt budget plus backoff for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: BackoffPolicy,
}

impl RetryPolicy {
    /// `max_attempts` below 1 is raised to 1.
    pub fn new(max_attempts: u32, backoff: BackoffPolicy) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    /// Runs `op` with 1-indexed attempt numbers until it succeeds, fails
    /// fatally, exhausts the budget, or `cancel` fires.
    ///
    /// `provider` labels logs and the retry counter.
    pub async fn run<T, E, F, Fut>(
        &self,
        provider: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AttemptOutcome<T, E>>,
        E: fmt::Display,
    {
        let mut attempt = 1;
        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                outcome = op(attempt) => outcome,
            };

            let error = match outcome {
                AttemptOutcome::Success(value) => {
                    if attempt > 1 {
                        debug!(provider, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                AttemptOutcome::Fatal(error) => return Err(RetryError::Fatal(error)),
                AttemptOutcome::Retryable(error) => error,
            };

            match next_transition(attempt, self.max_attempts) {
                Transition::Advance => {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: error,
                    });
                }
                Transition::RetrySame { next_attempt } => {
                    let delay = self.backoff.delay(attempt);
                    warn!(
                        provider,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "transient failure, retrying"
                    );
                    enrich_prometheus::record_retry(provider);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt = next_attempt;
                }
            }
        }
    }
}
