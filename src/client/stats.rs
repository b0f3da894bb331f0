use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::resilience::slot_limiter::SlotLimiterSnapshot;

/// Point-in-time copy of the client's counters and slot occupancy.
///
/// Facts only, and never any credentials. Serialises with the camelCase keys
/// dashboards expect (`activeRequests`, `statusCounts`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub active_requests: usize,
    pub max_concurrent: usize,
    pub total_requests: u64,
    pub rate_limit_count: u64,
    pub status_counts: BTreeMap<u16, u64>,
}

impl StatsSnapshot {
    pub fn status_count(&self, status: u16) -> u64 {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }
}

/// Monotonic request counters shared by every search on a client.
///
/// No reset: counts accumulate for the client's lifetime.
#[derive(Debug, Default)]
pub struct StatsCollector {
    total_requests: AtomicU64,
    rate_limit_count: AtomicU64,
    status_counts: Mutex<BTreeMap<u16, u64>>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// One attempt started.
    pub(crate) fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// A response with `status` came back.
    pub(crate) fn record_status(&self, status: u16) {
        let mut counts = self
            .status_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *counts.entry(status).or_insert(0) += 1;
    }

    pub(crate) fn record_rate_limited(&self) {
        self.rate_limit_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn rate_limit_count(&self) -> u64 {
        self.rate_limit_count.load(Ordering::Relaxed)
    }

    /// Copy the counters, combined with the limiter's current occupancy.
    pub fn snapshot(&self, slots: SlotLimiterSnapshot) -> StatsSnapshot {
        let status_counts = self
            .status_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        StatsSnapshot {
            active_requests: slots.active,
            max_concurrent: slots.capacity,
            total_requests: self.total_requests(),
            rate_limit_count: self.rate_limit_count(),
            status_counts,
        }
    }
}
