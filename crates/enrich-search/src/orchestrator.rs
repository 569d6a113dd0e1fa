// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gathers labelled search evidence for one enrichment request.
//!
//! Each data type maps to a fixed list of searches. Searches run
//! concurrently; sections are joined in plan order. Transient failures that
//! survive the retry budget abort the request as upstream-unavailable. Other
//! failures are rendered into the evidence so the model sees them.

use std::sync::Arc;

use enrich_core::traits::SearchProvider;
use enrich_core::types::{SearchHit, SearchQuery};
use enrich_core::{DataType, EnrichError, EnrichmentRequest, ProviderError};
use enrich_resilience::{AttemptOutcome, RetryError, RetryPolicy, classify_search_error};
use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub const SEARCH_PROVIDER: &str = "Search provider";
const UPSTREAM_MESSAGE: &str = "Search provider is temporarily unavailable. Please retry shortly.";

const MAX_COMPANY_QUERY_CHARS: usize = 200;
const MAX_WEB_QUERY_CHARS: usize = 500;
const COMPANY_RESULTS: u8 = 5;

/// Lower-cased fragments that mark an error string as a transient upstream failure.
const TRANSIENT_MARKERS: &[&str] = &[
    "rate limit",
    "timed out",
    "api returned status 5",
    "api returned status 429",
    "connecterror",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// Company lookup: the query is suffixed with "company info".
    Company,
    /// Free-form web search.
    Web,
}

/// One search in a request's plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSearch {
    pub label: &'static str,
    pub kind: SearchKind,
    pub query: String,
    pub num_results: u8,
}

impl PlannedSearch {
    fn company(label: &'static str, query: impl Into<String>) -> Self {
        Self {
            label,
            kind: SearchKind::Company,
            query: query.into(),
            num_results: COMPANY_RESULTS,
        }
    }

    fn web(label: &'static str, query: impl Into<String>, num_results: u8) -> Self {
        Self {
            label,
            kind: SearchKind::Web,
            query: query.into(),
            num_results,
        }
    }

    /// The provider query, after length and result-count checks.
    pub fn to_query(&self) -> Result<SearchQuery, EnrichError> {
        let len = self.query.chars().count();
        match self.kind {
            SearchKind::Company => {
                if len == 0 || len > MAX_COMPANY_QUERY_CHARS {
                    return Err(EnrichError::Validation(format!(
                        "company search query must be 1..={MAX_COMPANY_QUERY_CHARS} characters, got {len}"
                    )));
                }
                Ok(SearchQuery {
                    query: format!("{} company info", self.query),
                    num_results: COMPANY_RESULTS,
                })
            }
            SearchKind::Web => {
                if len == 0 || len > MAX_WEB_QUERY_CHARS {
                    return Err(EnrichError::Validation(format!(
                        "web search query must be 1..={MAX_WEB_QUERY_CHARS} characters, got {len}"
                    )));
                }
                if !(1..=10).contains(&self.num_results) {
                    return Err(EnrichError::Validation(format!(
                        "num_results must be between 1 and 10, got {}",
                        self.num_results
                    )));
                }
                Ok(SearchQuery {
                    query: self.query.clone(),
                    num_results: self.num_results,
                })
            }
        }
    }

    fn no_results(&self) -> String {
        match self.kind {
            SearchKind::Company => format!("No results found for company: {}", self.query),
            SearchKind::Web => format!("No results found for: {}", self.query),
        }
    }
}

/// Bare domain: scheme and `www.` removed, path dropped.
pub fn normalize_domain(raw: &str) -> String {
    let stripped = raw
        .replace("https://", "")
        .replace("http://", "")
        .replace("www.", "");
    stripped.split('/').next().unwrap_or_default().to_string()
}

/// The searches for `request`, in evidence order.
pub fn plan_searches(request: &EnrichmentRequest) -> Vec<PlannedSearch> {
    let raw = request.raw_data();
    match request.data_type() {
        DataType::Company => vec![
            PlannedSearch::company("Company search results", raw),
            PlannedSearch::web("LinkedIn search", format!("{raw} linkedin company"), 3),
        ],
        DataType::Person => vec![
            PlannedSearch::web(
                "Person search results",
                format!("{raw} professional profile"),
                5,
            ),
            PlannedSearch::web("LinkedIn search", format!("{raw} linkedin"), 3),
        ],
        DataType::Address => vec![PlannedSearch::web(
            "Address search results",
            format!("{raw} address location"),
            5,
        )],
        DataType::Domain => {
            let domain = normalize_domain(raw);
            vec![
                PlannedSearch::web(
                    "Domain search results",
                    format!("site:{domain} OR {domain} company about"),
                    5,
                ),
                PlannedSearch::company("Company info", domain),
            ]
        }
    }
}

/// Hits as `Title/URL/Description` blocks separated by `---`, or `None` if empty.
pub fn render_hits(hits: &[SearchHit]) -> Option<String> {
    if hits.is_empty() {
        return None;
    }
    let blocks: Vec<String> = hits
        .iter()
        .map(|h| format!("Title: {}\nURL: {}\nDescription: {}\n", h.title, h.url, h.snippet))
        .collect();
    Some(blocks.join("\n---\n"))
}

/// The evidence text for a failed search.
pub fn describe_search_error(error: &ProviderError) -> String {
    match error {
        ProviderError::Status { status: 404, .. } => {
            "Error: Resource not found. Check the query.".to_string()
        }
        ProviderError::RateLimited(_) => "Error: Rate limit exceeded. Retry later.".to_string(),
        ProviderError::Status { status, .. } | ProviderError::InternalServer { status, .. } => {
            format!("Error: API returned status {status}")
        }
        ProviderError::Timeout => "Error: Request timed out. Retry.".to_string(),
        ProviderError::Connection(_) => "Error: ConnectError".to_string(),
        ProviderError::NotConfigured(message) => format!("Error: {message}"),
        ProviderError::InvalidResponse(_) => "Error: InvalidResponse".to_string(),
        ProviderError::ValidationExhausted { .. } => "Error: ValidationExhausted".to_string(),
    }
}

/// True if `text` is an error string describing a transient provider failure.
pub fn is_upstream_search_error(text: &str) -> bool {
    let lowered = text.to_lowercase();
    lowered.starts_with("error:") && TRANSIENT_MARKERS.iter().any(|m| lowered.contains(m))
}

fn upstream(last: ProviderError) -> EnrichError {
    enrich_prometheus::record_upstream_unavailable("search");
    EnrichError::upstream(SEARCH_PROVIDER, UPSTREAM_MESSAGE, Some(last))
}

/// Runs a request's search plan against one provider.
pub struct SearchOrchestrator {
    provider: Arc<dyn SearchProvider>,
    retry: RetryPolicy,
}

impl SearchOrchestrator {
    pub fn new(provider: Arc<dyn SearchProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    /// Builds the evidence string for `request`.
    pub async fn gather(
        &self,
        request: &EnrichmentRequest,
        cancel: &CancellationToken,
    ) -> Result<String, EnrichError> {
        let plan = plan_searches(request);
        let sections = try_join_all(plan.iter().map(|search| self.run_search(search, cancel))).await?;
        Ok(sections.join("\n\n"))
    }

    async fn run_search(
        &self,
        search: &PlannedSearch,
        cancel: &CancellationToken,
    ) -> Result<String, EnrichError> {
        let query = search.to_query()?;
        let provider = &self.provider;
        let query_ref = &query;
        let result = self
            .retry
            .run("search", cancel, move |_attempt| async move {
                match provider.search(query_ref).await {
                    Ok(hits) => AttemptOutcome::Success(hits),
                    Err(e) if classify_search_error(&e).is_retryable() => {
                        AttemptOutcome::Retryable(e)
                    }
                    Err(e) => AttemptOutcome::Fatal(e),
                }
            })
            .await;

        let body = match result {
            Ok(mut hits) => {
                // The provider may return more than `num` asks for.
                if search.kind == SearchKind::Company {
                    hits.truncate(COMPANY_RESULTS.into());
                }
                render_hits(&hits).unwrap_or_else(|| search.no_results())
            }
            Err(RetryError::Cancelled) => return Err(EnrichError::Cancelled),
            Err(RetryError::Exhausted { attempts, last }) => {
                warn!(label = search.label, attempts, error = %last, "search retries exhausted");
                return Err(upstream(last));
            }
            Err(RetryError::Fatal(error)) => {
                let text = describe_search_error(&error);
                if is_upstream_search_error(&text) {
                    warn!(label = search.label, error = %error, "search provider unavailable");
                    return Err(upstream(error));
                }
                text
            }
        };
        Ok(format!("{}:\n{}", search.label, body))
    }
}
