//! Prometheus counters for the cache core.
//!
//! Emitted through the `metrics` facade; the server installs the exporter.

use metrics::{counter, gauge};

/// Metric names as constants for consistency.
pub mod names {
    pub const CACHE_HITS_TOTAL: &str = "cache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "cache_misses_total";
    pub const CACHE_EVICTIONS_TOTAL: &str = "cache_evictions_total";
    pub const CACHE_ENTRIES: &str = "cache_entries";
    pub const INVALIDATION_EVENTS_TOTAL: &str = "cache_invalidation_events_total";
    pub const INVALIDATION_PUBLISH_FAILURES_TOTAL: &str =
        "cache_invalidation_publish_failures_total";
}

/// Record a cache hit for a namespace on a given tier (L1/L2).
pub fn record_cache_hit(namespace: &str, tier: &str) {
    counter!(
        names::CACHE_HITS_TOTAL,
        "namespace" => namespace.to_string(),
        "tier" => tier.to_string()
    )
    .increment(1);
}

/// Record a cache miss for a namespace.
pub fn record_cache_miss(namespace: &str) {
    counter!(names::CACHE_MISSES_TOTAL, "namespace" => namespace.to_string()).increment(1);
}

/// Record an entry evicted on expiry.
pub fn record_cache_eviction(namespace: &str) {
    counter!(names::CACHE_EVICTIONS_TOTAL, "namespace" => namespace.to_string()).increment(1);
}

/// Set the current number of local cache entries.
pub fn set_cache_entries(count: usize) {
    gauge!(names::CACHE_ENTRIES).set(count as f64);
}

/// Record a processed invalidation event.
pub fn record_invalidation_event(scope: &str, origin: &str) {
    counter!(
        names::INVALIDATION_EVENTS_TOTAL,
        "scope" => scope.to_string(),
        "origin" => origin.to_string()
    )
    .increment(1);
}

/// Record a failed invalidation publish.
pub fn record_publish_failure() {
    counter!(names::INVALIDATION_PUBLISH_FAILURES_TOTAL).increment(1);
}
