use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

/// Lower bound (inclusive) of the jitter factor.
pub const JITTER_MIN: f64 = 0.5;
/// Upper bound (exclusive) of the jitter factor.
pub const JITTER_MAX: f64 = 1.5;

/// `floor(base * 2^attempt * factor)` in whole milliseconds.
///
/// `factor` is expected in `[JITTER_MIN, JITTER_MAX)`. The exponential part
/// saturates instead of overflowing for very large attempt numbers.
pub fn jittered_delay(base: Duration, attempt: u32, factor: f64) -> Duration {
    let base_ms = base.as_millis().min(u64::MAX as u128) as u64;
    let multiplier = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    let raw = base_ms.saturating_mul(multiplier);
    // f64 -> u64 casts saturate, and a negative product floors to zero
    let jittered = (raw as f64 * factor).floor() as u64;
    Duration::from_millis(jittered)
}

/// Exponential backoff with symmetric ±50% jitter.
///
/// The random source is owned by the policy so tests can pin it with
/// [`BackoffPolicy::with_seed`].
pub struct BackoffPolicy {
    base_delay: Duration,
    rng: Mutex<StdRng>,
}

impl BackoffPolicy {
    /// Seeded from the operating system.
    pub fn new(base_delay: Duration) -> Self {
        Self::with_rng(base_delay, StdRng::from_os_rng())
    }

    /// Reproducible jitter sequence.
    pub fn with_seed(base_delay: Duration, seed: u64) -> Self {
        Self::with_rng(base_delay, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(base_delay: Duration, rng: StdRng) -> Self {
        Self {
            base_delay,
            rng: Mutex::new(rng),
        }
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay to wait after the failed attempt `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = {
            let mut rng = self
                .rng
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            rng.random_range(JITTER_MIN..JITTER_MAX)
        };
        jittered_delay(self.base_delay, attempt, factor)
    }

    /// Inclusive lower and exclusive upper bound of [`BackoffPolicy::delay`] for `attempt`.
    pub fn bounds(&self, attempt: u32) -> (Duration, Duration) {
        let low = jittered_delay(self.base_delay, attempt, JITTER_MIN);
        let raw = jittered_delay(self.base_delay, attempt, 1.0).as_millis() as f64;
        let high = Duration::from_millis((raw * JITTER_MAX).ceil() as u64);
        (low, high)
    }
}

impl std::fmt::Debug for BackoffPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackoffPolicy")
            .field("base_delay", &self.base_delay)
            .finish_non_exhaustive()
    }
}
