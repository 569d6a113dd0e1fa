// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nested deadlines for one enrichment request.
//!
//! The search phase runs under an inner deadline, the whole request under an
//! outer one. An expiry travels up as [`BudgetError::Expired`] and becomes
//! [`EnrichError::EnrichmentTimeout`] only in [`TimeoutBudget::enforce`].

use std::future::Future;
use std::time::Duration;

use enrich_core::{BudgetPhase, EnrichError};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("{0} deadline expired")]
    Expired(BudgetPhase),
    #[error(transparent)]
    Failed(#[from] EnrichError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutBudget {
    search: Duration,
    total: Duration,
}

impl TimeoutBudget {
    pub fn new(search: Duration, total: Duration) -> Self {
        Self { search, total }
    }

    pub fn search(&self) -> Duration {
        self.search
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    fn limit(&self, phase: BudgetPhase) -> Duration {
        match phase {
            BudgetPhase::Search => self.search,
            BudgetPhase::Total => self.total,
        }
    }

    /// Bounds the search phase. Expiry is reported, not converted.
    pub async fn search_phase<T, F>(&self, phase: F) -> Result<T, BudgetError>
    where
        F: Future<Output = Result<T, EnrichError>>,
    {
        match tokio::time::timeout(self.search, phase).await {
            Ok(result) => result.map_err(BudgetError::Failed),
            Err(_) => Err(BudgetError::Expired(BudgetPhase::Search)),
        }
    }

    /// Bounds the whole request and converts any expiry into a typed timeout.
    ///
    /// Other errors, including [`EnrichError::Cancelled`], pass through unchanged.
    pub async fn enforce<T, F>(&self, request: F) -> Result<T, EnrichError>
    where
        F: Future<Output = Result<T, BudgetError>>,
    {
        let result = match tokio::time::timeout(self.total, request).await {
            Ok(result) => result,
            Err(_) => Err(BudgetError::Expired(BudgetPhase::Total)),
        };
        result.map_err(|err| match err {
            BudgetError::Expired(phase) => {
                let budget = self.limit(phase);
                warn!(%phase, budget_secs = budget.as_secs_f64(), "enrichment deadline expired");
                EnrichError::EnrichmentTimeout { phase, budget }
            }
            BudgetError::Failed(inner) => inner,
        })
    }
}
