//! Network seam for search calls.
//!
//! The executor only sees [`SearchTransport`]; [`HttpTransport`] is the
//! reqwest-backed implementation used in production. Tests swap in scripted
//! transports to inject transport errors, retryable statuses and malformed bodies.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;

/// A response that made it back over the wire, whatever its status.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one `_search` call.
///
/// Implementations must return `Err` only when no response was received;
/// every HTTP status, including 4xx/5xx, comes back as `Ok(RawResponse)`.
/// A body that cannot be read in full is returned empty, keeping its status.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    async fn post_search(
        &self,
        query: &serde_json::Value,
        request_id: &str,
    ) -> Result<RawResponse, TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
