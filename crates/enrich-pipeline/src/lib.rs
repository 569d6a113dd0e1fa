// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The enrichment flow.
//!
//! [`Enricher`] runs the search orchestrator and the model-call orchestrator
//! under a [`TimeoutBudget`](enrich_resilience::TimeoutBudget). Prompt text
//! lives in [`prompt`].

pub mod enricher;
pub mod model_call;
pub mod prompt;

pub use enricher::Enricher;
pub use model_call::ModelCaller;
