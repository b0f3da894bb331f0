//! # Resilience Primitives Module
//!
//! The two building blocks the search executor is assembled from.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`slot_limiter`] | Bounded in-flight requests with a FIFO wait queue |
//! | [`backoff`] | Exponential backoff with ±50% jitter |
//!
//! ## Slot Limiter
//!
//! ```rust
//! use search_throttle::resilience::slot_limiter::SlotLimiter;
//!
//! # async fn demo() -> search_throttle::Result<()> {
//! let limiter = SlotLimiter::new(2);
//! let permit = limiter.acquire().await?;
//! // ... call the backend ...
//! drop(permit); // slot goes to the oldest waiter, if any
//! # Ok(())
//! # }
//! ```
//!
//! ## Backoff
//!
//! ```rust
//! use search_throttle::resilience::backoff::BackoffPolicy;
//! use std::time::Duration;
//!
//! let policy = BackoffPolicy::with_seed(Duration::from_millis(500), 7);
//! let d = policy.delay(2); // somewhere in [1000ms, 3000ms)
//! assert!(d >= Duration::from_millis(1000) && d < Duration::from_millis(3000));
//! ```

pub mod backoff;
pub mod slot_limiter;
