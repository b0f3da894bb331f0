//! Throttled search client.
//!
//! Keep the public surface small: build a [`SearchClient`], call `search`,
//! read `stats`. Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
mod execution;
mod policy;
pub mod stats;

pub use builder::SearchClientBuilder;
pub use self::core::{SearchClient, SearchResponse};
pub use stats::{StatsCollector, StatsSnapshot};
