use crate::client::policy::PolicyEngine;
use crate::client::stats::{StatsCollector, StatsSnapshot};
use crate::config::SearchConfig;
use crate::resilience::backoff::BackoffPolicy;
use crate::resilience::slot_limiter::SlotLimiter;
use crate::transport::SearchTransport;
use crate::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Throttled, retrying client for the search backend.
///
/// One instance is meant to be shared (behind an `Arc`) by every caller in the
/// process: the concurrency ceiling and the counters are per client.
pub struct SearchClient {
    pub(crate) transport: Arc<dyn SearchTransport>,
    pub(crate) limiter: Arc<SlotLimiter>,
    pub(crate) stats: Arc<StatsCollector>,
    pub(crate) backoff: BackoffPolicy,
    pub(crate) policy: PolicyEngine,
    pub(crate) debug: bool,
}

/// Full outcome of a search call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub body: serde_json::Value,
    /// HTTP status of the response the body came from.
    pub status: u16,
    /// Number of attempts made, including the successful one.
    pub attempts: u32,
    /// `true` when the body was decoded from a non-2xx response.
    pub degraded: bool,
}

impl SearchClient {
    /// Build a client over HTTP from a resolved configuration.
    pub fn new(config: SearchConfig) -> Result<Self> {
        crate::client::builder::SearchClientBuilder::new(config).build()
    }

    /// Build a client from `ES_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(SearchConfig::from_env()?)
    }

    /// Run a search query and return the decoded response body.
    ///
    /// Retryable failures (transport errors, 429, 5xx) are retried with backoff;
    /// the caller only sees the final body or one terminal error.
    pub async fn search(&self, query: &serde_json::Value) -> Result<serde_json::Value> {
        let never = CancellationToken::new();
        self.execute(query, &never).await.map(|r| r.body)
    }

    /// Like [`SearchClient::search`], but gives up with `Error::Cancelled` once
    /// `cancel` fires.
    pub async fn search_with_cancel(
        &self,
        query: &serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value> {
        self.execute(query, cancel).await.map(|r| r.body)
    }

    /// Snapshot counters and slot occupancy. Never blocks on in-flight searches.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.limiter.snapshot())
    }

    /// Retries allowed after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.policy.max_retries
    }

    /// The slot limiter gating this client's calls.
    pub fn limiter(&self) -> &SlotLimiter {
        &self.limiter
    }
}

impl std::fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("limiter", &self.limiter)
            .field("backoff", &self.backoff)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
