use crate::transport::{RawResponse, TransportError};
use crate::Error;

/// Outcome of one network try.
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    /// No response was received.
    Transport(TransportError),
    /// A response came back, whatever its status.
    Response(RawResponse),
}

/// One attempt of a logical search, ready to be classified.
#[derive(Debug)]
pub(crate) struct Attempt {
    /// 0-based.
    pub index: u32,
    pub outcome: AttemptOutcome,
}

impl Attempt {
    pub fn status(&self) -> Option<u16> {
        match &self.outcome {
            AttemptOutcome::Response(r) => Some(r.status),
            AttemptOutcome::Transport(_) => None,
        }
    }
}

/// Why an attempt is worth repeating.
#[derive(Debug)]
pub(crate) enum RetryReason {
    Transport(TransportError),
    RateLimited,
    ServerError(u16),
}

impl RetryReason {
    pub fn label(&self) -> &'static str {
        match self {
            RetryReason::Transport(_) => "transport",
            RetryReason::RateLimited => "rate_limited",
            RetryReason::ServerError(_) => "server_error",
        }
    }
}

/// How to proceed after an attempt.
#[derive(Debug)]
pub(crate) enum RetryDecision {
    Success {
        body: serde_json::Value,
        status: u16,
        /// Body came from a non-2xx response.
        degraded: bool,
    },
    Retry(RetryReason),
    Terminal(Error),
}

/// 429 or any 5xx.
pub(crate) fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Classifies attempts into success, retry, or terminal failure.
///
/// Pure and synchronous: no counters, no sleeping, no slot handling.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PolicyEngine {
    pub max_retries: u32,
    /// Never synthesise a success from a non-2xx body.
    pub strict_status: bool,
}

impl PolicyEngine {
    pub fn new(max_retries: u32, strict_status: bool) -> Self {
        Self {
            max_retries,
            strict_status,
        }
    }

    pub fn decide(&self, attempt: Attempt) -> RetryDecision {
        let retries_left = attempt.index < self.max_retries;
        let attempts = attempt.index + 1;

        let resp = match attempt.outcome {
            AttemptOutcome::Transport(err) => {
                return if retries_left {
                    RetryDecision::Retry(RetryReason::Transport(err))
                } else {
                    RetryDecision::Terminal(Error::Transport {
                        source: err,
                        attempts,
                    })
                };
            }
            AttemptOutcome::Response(resp) => resp,
        };
        let status = resp.status;

        if resp.is_success() {
            return match serde_json::from_slice(&resp.body) {
                Ok(body) => RetryDecision::Success {
                    body,
                    status,
                    degraded: false,
                },
                Err(source) => RetryDecision::Terminal(Error::Decode { status, source }),
            };
        }

        if is_retryable_status(status) {
            if retries_left {
                return RetryDecision::Retry(if status == 429 {
                    RetryReason::RateLimited
                } else {
                    RetryReason::ServerError(status)
                });
            }
            return self.best_effort(resp, || Error::ExhaustedRetries {
                status: Some(status),
                attempts,
            });
        }

        let body = String::from_utf8_lossy(&resp.body).into_owned();
        self.best_effort(resp, || Error::UnexpectedStatus { status, body })
    }

    /// Hand back a decodable non-2xx body as a degraded success, unless strict.
    fn best_effort(&self, resp: RawResponse, fail: impl FnOnce() -> Error) -> RetryDecision {
        if !self.strict_status {
            if let Ok(body) = serde_json::from_slice(&resp.body) {
                return RetryDecision::Success {
                    body,
                    status: resp.status,
                    degraded: true,
                };
            }
        }
        RetryDecision::Terminal(fail())
    }
}
