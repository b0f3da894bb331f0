use crate::client::core::SearchClient;
use crate::client::policy::PolicyEngine;
use crate::client::stats::StatsCollector;
use crate::config::SearchConfig;
use crate::resilience::backoff::BackoffPolicy;
use crate::resilience::slot_limiter::SlotLimiter;
use crate::transport::{HttpTransport, SearchTransport};
use crate::Result;
use std::sync::Arc;

/// Builder for creating clients with custom collaborators.
///
/// Everything defaults from the [`SearchConfig`]; the overrides exist so tests
/// and embedders can inject a transport, a seeded backoff policy, or share a
/// limiter between clients.
pub struct SearchClientBuilder {
    config: SearchConfig,
    transport: Option<Arc<dyn SearchTransport>>,
    backoff: Option<BackoffPolicy>,
    limiter: Option<Arc<SlotLimiter>>,
    stats: Option<Arc<StatsCollector>>,
}

impl SearchClientBuilder {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            transport: None,
            backoff: None,
            limiter: None,
            stats: None,
        }
    }

    /// Replace the HTTP transport (mock backends, custom clients).
    pub fn transport(mut self, transport: Arc<dyn SearchTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the backoff policy, e.g. with a seeded one for reproducible delays.
    pub fn backoff(mut self, policy: BackoffPolicy) -> Self {
        self.backoff = Some(policy);
        self
    }

    /// Share a slot limiter with other clients talking to the same backend.
    ///
    /// The limiter's own capacity wins over `max_concurrent`.
    pub fn shared_limiter(mut self, limiter: Arc<SlotLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Share counters with other clients.
    pub fn shared_stats(mut self, stats: Arc<StatsCollector>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn build(self) -> Result<SearchClient> {
        let config = self.config;

        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&config)?),
        };
        let limiter = self
            .limiter
            .unwrap_or_else(|| Arc::new(SlotLimiter::new(config.max_concurrent)));
        let backoff = self
            .backoff
            .unwrap_or_else(|| BackoffPolicy::new(config.base_delay));

        tracing::debug!(
            url = config.search_url().as_str(),
            max_concurrent = limiter.capacity(),
            max_retries = config.max_retries,
            base_delay_ms = backoff.base_delay().as_millis() as u64,
            strict_status = config.strict_status,
            "search client configured"
        );

        Ok(SearchClient {
            transport,
            limiter,
            stats: self.stats.unwrap_or_default(),
            backoff,
            policy: PolicyEngine::new(config.max_retries, config.strict_status),
            debug: config.debug,
        })
    }
}
