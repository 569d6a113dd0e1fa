// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for calls to external providers.
//!
//! - [`backoff`]: exponential backoff with jitter
//! - [`classify`]: retryable versus fatal provider errors
//! - [`retry`]: the attempt loop and its explicit outcomes
//! - [`chain`]: the model fallback order
//! - [`budget`]: nested per-request deadlines

pub mod backoff;
pub mod budget;
pub mod chain;
pub mod classify;
pub mod retry;

pub use backoff::BackoffPolicy;
pub use budget::{BudgetError, TimeoutBudget};
pub use chain::ModelChain;
pub use classify::{
    ErrorClass, classify_model_error, classify_payment_error, classify_search_error,
};
pub use retry::{AttemptOutcome, RetryError, RetryPolicy, Transition, next_transition};
