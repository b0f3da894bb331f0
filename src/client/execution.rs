//! The retry loop behind every search call.

use crate::client::core::{SearchClient, SearchResponse};
use crate::client::policy::{Attempt, AttemptOutcome, RetryDecision};
use crate::{Error, Result};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

impl SearchClient {
    /// Run `query` to a terminal outcome.
    ///
    /// Each attempt takes a slot, makes one call, records the outcome and gives
    /// the slot back before sleeping or returning, whatever happened.
    pub async fn execute(
        &self,
        query: &serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse> {
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::debug_span!("search", request_id = request_id.as_str());
        self.execute_inner(query, cancel, &request_id)
            .instrument(span)
            .await
    }

    async fn execute_inner(
        &self,
        query: &serde_json::Value,
        cancel: &CancellationToken,
        request_id: &str,
    ) -> Result<SearchResponse> {
        let start = Instant::now();
        let max_retries = self.policy.max_retries;

        for attempt in 0..=max_retries {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled { attempts: attempt });
            }
            self.stats.record_request();

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled { attempts: attempt }),
                permit = self.limiter.acquire() => permit?,
            };

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    drop(permit);
                    return Err(Error::Cancelled { attempts: attempt + 1 });
                }
                res = self.transport.post_search(query, request_id) => match res {
                    Ok(resp) => AttemptOutcome::Response(resp),
                    Err(e) => AttemptOutcome::Transport(e),
                },
            };

            let attempt = Attempt {
                index: attempt,
                outcome,
            };
            let status = attempt.status();
            if let Some(status) = status {
                self.stats.record_status(status);
                if status == 429 {
                    self.stats.record_rate_limited();
                }
            }
            if self.debug {
                match &attempt.outcome {
                    AttemptOutcome::Response(_) => debug!(
                        attempt = attempt.index,
                        status,
                        active = self.limiter.active(),
                        "search response"
                    ),
                    AttemptOutcome::Transport(e) => debug!(
                        attempt = attempt.index,
                        error = %e,
                        active = self.limiter.active(),
                        "search transport error"
                    ),
                }
            }

            let index = attempt.index;
            let decision = self.policy.decide(attempt);
            // Slot goes back before anything else happens: return, sleep or next attempt.
            drop(permit);

            match decision {
                RetryDecision::Success {
                    body,
                    status,
                    degraded,
                } => {
                    if degraded {
                        warn!(
                            http_status = status,
                            attempts = index + 1,
                            "search returned a non-success body"
                        );
                    }
                    return Ok(SearchResponse {
                        body,
                        status,
                        attempts: index + 1,
                        degraded,
                    });
                }
                RetryDecision::Retry(reason) => {
                    let delay = self.backoff.delay(index);
                    if self.debug {
                        debug!(
                            attempt = index,
                            reason = reason.label(),
                            delay_ms = delay.as_millis() as u64,
                            "search retry scheduled"
                        );
                    }
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return Err(Error::Cancelled { attempts: index + 1 });
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                RetryDecision::Terminal(err) => {
                    info!(
                        http_status = err.status(),
                        attempts = index + 1,
                        duration_ms = start.elapsed().as_millis() as u64,
                        error = %err,
                        "search failed"
                    );
                    return Err(err);
                }
            }
        }

        // Every branch above returns on the last attempt.
        Err(Error::ExhaustedRetries {
            status: None,
            attempts: max_retries.saturating_add(1),
        })
    }
}
