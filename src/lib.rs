//! # search-throttle
//!
//! Bounded-concurrency retrying request scheduler for a rate-limited search
//! backend (an Elasticsearch-style `_search` endpoint).
//!
//! ## Overview
//!
//! Every query goes through one [`SearchClient`], which
//!
//! - caps the number of calls in flight and queues the rest in FIFO order,
//! - retries transport failures, 429 and 5xx responses with exponential
//!   backoff and ±50% jitter,
//! - treats any other status as terminal,
//! - counts requests, rate-limit hits and statuses for observability.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use search_throttle::{SearchClient, SearchConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> search_throttle::Result<()> {
//!     let config = SearchConfig::new("https://search.example.com", "reviews", "user", "pass")?
//!         .with_max_concurrent(2)?
//!         .with_max_retries(5);
//!     let client = SearchClient::new(config)?;
//!
//!     let body = client
//!         .search(&json!({ "size": 0, "aggs": { "ratings": { "terms": { "field": "rating" } } } }))
//!         .await?;
//!     println!("{body}");
//!     println!("{:?}", client.stats());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Search client, retry loop, stats collector |
//! | [`config`] | Explicit configuration and environment loader |
//! | [`resilience`] | Slot limiter and backoff policy |
//! | [`transport`] | Network seam and the reqwest implementation |
//! | [`refresh`] | Polling re-query with a "data changed" trigger |

pub mod client;
pub mod config;
pub mod refresh;
pub mod resilience;
pub mod transport;

pub use client::{SearchClient, SearchClientBuilder, SearchResponse, StatsSnapshot};
pub use config::SearchConfig;
pub use refresh::{spawn_refresh, RefreshHandle};
pub use tokio_util::sync::CancellationToken;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
