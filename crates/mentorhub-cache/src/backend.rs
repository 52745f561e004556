//! Cache backend with L1 (DashMap) and L2 (Redis) tiers.
//!
//! ## Cache Modes
//!
//! - **Local**: single-instance mode using only DashMap
//! - **Redis**: multi-instance mode with DashMap (L1) + Redis (L2)
//!
//! The backend stores opaque serialized payloads; key construction, TTL
//! policy, and invalidation fan-out live above it. Redis failures degrade to
//! a miss; the engine then falls back to the authoritative loader, so a
//! broken L2 never hangs or fails a read path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;

use crate::metrics;
use crate::namespace::Ttl;

/// TTL applied to entries promoted from L2 into L1.
///
/// The remaining L2 lifetime is unknown without an extra round trip, so
/// promoted entries get a short local lease and re-consult L2 afterwards.
const L1_PROMOTE_TTL: Duration = Duration::from_secs(300);

/// A cached entry with TTL support.
///
/// The payload is wrapped in `Arc` to allow cheap cloning on cache hits.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub data: Arc<Vec<u8>>,
    pub stored_at: Instant,
    pub ttl: Ttl,
}

impl CachedEntry {
    /// Create a new cached entry.
    pub fn new(data: Vec<u8>, ttl: Ttl) -> Self {
        Self {
            data: Arc::new(data),
            stored_at: Instant::now(),
            ttl,
        }
    }

    /// Check if this entry has expired. `Ttl::Never` entries never do.
    pub fn is_expired(&self) -> bool {
        match self.ttl {
            Ttl::Finite(ttl) => self.stored_at.elapsed() > ttl,
            Ttl::Never => false,
        }
    }
}

/// Two-tier cache backend: L1 (DashMap) + optional L2 (Redis).
#[derive(Clone)]
pub enum CacheBackend {
    /// Single-instance: local DashMap only
    Local(Arc<DashMap<String, CachedEntry>>),

    /// Multi-instance: Redis + local L1
    Redis {
        redis: Pool,
        local: Arc<DashMap<String, CachedEntry>>,
    },
}

impl CacheBackend {
    /// Create a new local-only cache backend.
    pub fn new_local() -> Self {
        CacheBackend::Local(Arc::new(DashMap::new()))
    }

    /// Create a new Redis-backed cache backend.
    pub fn new_redis(redis_pool: Pool) -> Self {
        CacheBackend::Redis {
            redis: redis_pool,
            local: Arc::new(DashMap::new()),
        }
    }

    /// Backend mode label for stats and health reporting.
    pub fn mode(&self) -> &'static str {
        match self {
            CacheBackend::Local(_) => "local",
            CacheBackend::Redis { .. } => "redis",
        }
    }

    fn local(&self) -> &Arc<DashMap<String, CachedEntry>> {
        match self {
            CacheBackend::Local(map) => map,
            CacheBackend::Redis { local, .. } => local,
        }
    }

    /// Get a value from the cache.
    ///
    /// Lookup order: L1, then L2 (Redis mode). An L2 hit is promoted into
    /// L1 under a short local lease. Expired L1 entries are purged eagerly
    /// on read and reported as misses, never returned stale.
    pub async fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        let namespace = leading_namespace(key);

        // 1. Check L1
        if let Some(entry) = self.local().get(key) {
            if !entry.is_expired() {
                tracing::debug!(key = %key, "cache hit (L1)");
                metrics::record_cache_hit(namespace, "L1");
                return Some(Arc::clone(&entry.data));
            }
            drop(entry);
            self.local().remove(key);
            metrics::record_cache_eviction(namespace);
        }

        // 2. Check L2 (Redis mode only)
        let CacheBackend::Redis { redis, .. } = self else {
            metrics::record_cache_miss(namespace);
            return None;
        };

        match redis.get().await {
            Ok(mut conn) => match conn.get::<_, Option<Vec<u8>>>(key).await {
                Ok(Some(data)) => {
                    tracing::debug!(key = %key, "cache hit (L2)");
                    metrics::record_cache_hit(namespace, "L2");

                    let entry = CachedEntry::new(data, Ttl::Finite(L1_PROMOTE_TTL));
                    let data_arc = Arc::clone(&entry.data);
                    self.local().insert(key.to_string(), entry);

                    Some(data_arc)
                }
                Ok(None) => {
                    tracing::debug!(key = %key, "cache miss");
                    metrics::record_cache_miss(namespace);
                    None
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Redis GET error");
                    metrics::record_cache_miss(namespace);
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to get Redis connection");
                metrics::record_cache_miss(namespace);
                None
            }
        }
    }

    /// Set a value in the cache.
    ///
    /// Writes land in L1 synchronously; L2 writes are fire-and-forget, so a
    /// slow or unreachable Redis never blocks the writer. `Ttl::Never`
    /// entries are stored without an expiry in both tiers.
    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: Ttl) {
        let entry = CachedEntry::new(value, ttl);

        match self {
            CacheBackend::Local(map) => {
                map.insert(key.to_string(), entry);
            }
            CacheBackend::Redis { redis, local } => {
                let data_for_redis = Arc::clone(&entry.data);
                local.insert(key.to_string(), entry);

                let redis = redis.clone();
                let key = key.to_string();
                tokio::spawn(async move {
                    let Ok(mut conn) = redis.get().await else {
                        tracing::warn!(key = %key, "Redis unavailable, cache set is L1-only");
                        return;
                    };
                    let result = match ttl {
                        Ttl::Finite(d) => {
                            conn.set_ex::<_, _, ()>(&key, &**data_for_redis, d.as_secs())
                                .await
                        }
                        Ttl::Never => conn.set::<_, _, ()>(&key, &**data_for_redis).await,
                    };
                    match result {
                        Ok(()) => tracing::debug!(key = %key, "cache set (L1+L2)"),
                        Err(e) => tracing::warn!(key = %key, error = %e, "Redis SET error"),
                    }
                });
            }
        }

        metrics::set_cache_entries(self.local().len());
    }

    /// Delete a single entry from every tier. No-op when absent.
    pub async fn delete(&self, key: &str) {
        self.local().remove(key);

        if let CacheBackend::Redis { redis, .. } = self {
            let redis = redis.clone();
            let key = key.to_string();
            tokio::spawn(async move {
                if let Ok(mut conn) = redis.get().await {
                    if let Err(e) = conn.del::<_, ()>(&key).await {
                        tracing::warn!(key = %key, error = %e, "Redis DEL error");
                    }
                }
            });
        }

        metrics::set_cache_entries(self.local().len());
    }

    /// Delete every entry whose key starts with `prefix`. No-op when
    /// nothing matches.
    ///
    /// L1 is filtered in place; L2 uses SCAN + DEL so large keyspaces are
    /// walked incrementally rather than with a blocking KEYS call.
    pub async fn delete_prefix(&self, prefix: &str) {
        self.local().retain(|k, _| !k.starts_with(prefix));

        if let CacheBackend::Redis { redis, .. } = self {
            let redis = redis.clone();
            let prefix = prefix.to_string();
            tokio::spawn(async move {
                if let Err(e) = delete_prefix_l2(&redis, &prefix).await {
                    tracing::warn!(prefix = %prefix, error = %e, "Redis prefix delete error");
                }
            });
        }

        metrics::set_cache_entries(self.local().len());
    }

    /// Number of live (unexpired) L1 entries.
    pub fn entry_count(&self) -> usize {
        self.local().iter().filter(|e| !e.is_expired()).count()
    }

    /// Number of live L1 entries under a key prefix.
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.local()
            .iter()
            .filter(|e| e.key().starts_with(prefix) && !e.is_expired())
            .count()
    }

    /// Check if Redis is reachable (for health checks).
    pub async fn is_redis_available(&self) -> bool {
        match self {
            CacheBackend::Local(_) => false,
            CacheBackend::Redis { redis, .. } => redis.get().await.is_ok(),
        }
    }

    /// The Redis pool, when running in Redis mode.
    pub fn redis_pool(&self) -> Option<&Pool> {
        match self {
            CacheBackend::Local(_) => None,
            CacheBackend::Redis { redis, .. } => Some(redis),
        }
    }
}

async fn delete_prefix_l2(redis: &Pool, prefix: &str) -> Result<(), redis::RedisError> {
    let mut conn = redis
        .get()
        .await
        .map_err(|e| redis::RedisError::from(std::io::Error::other(e.to_string())))?;

    let pattern = format!("{prefix}*");
    let keys: Vec<String> = {
        let mut iter = conn.scan_match::<_, String>(&pattern).await?;
        let mut keys = Vec::new();
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        keys
    };

    if !keys.is_empty() {
        tracing::debug!(prefix = %prefix, count = keys.len(), "deleting L2 entries");
        conn.del::<_, ()>(keys).await?;
    }
    Ok(())
}

/// Keys always lead with the namespace name, so the metric label can be
/// recovered without threading it through every call.
fn leading_namespace(key: &str) -> &str {
    key.split(':').next().unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_set_and_get() {
        let backend = CacheBackend::new_local();
        backend
            .set("mentor:t1:o1:u1", b"payload".to_vec(), Ttl::Never)
            .await;

        let hit = backend.get("mentor:t1:o1:u1").await.unwrap();
        assert_eq!(&**hit, b"payload");
        assert_eq!(backend.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_get_absent_key() {
        let backend = CacheBackend::new_local();
        assert!(backend.get("mentor:t1:o1:nobody").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_purged_on_read() {
        let backend = CacheBackend::new_local();
        backend
            .set(
                "mentor:t1:o1:u1",
                b"old".to_vec(),
                Ttl::Finite(Duration::from_millis(0)),
            )
            .await;

        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(backend.get("mentor:t1:o1:u1").await.is_none());
        // Eager purge: the slot is gone, not just hidden.
        assert_eq!(backend.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_never_ttl_survives() {
        let backend = CacheBackend::new_local();
        backend
            .set("permissions:t1:o1:role1", b"perms".to_vec(), Ttl::Never)
            .await;

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(backend.get("permissions:t1:o1:role1").await.is_some());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let backend = CacheBackend::new_local();
        backend
            .set("forms:t1:o1:f1", b"v1".to_vec(), Ttl::Never)
            .await;
        backend
            .set("forms:t1:o1:f1", b"v2".to_vec(), Ttl::Never)
            .await;

        let hit = backend.get("forms:t1:o1:f1").await.unwrap();
        assert_eq!(&**hit, b"v2");
        assert_eq!(backend.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let backend = CacheBackend::new_local();
        backend
            .set("mentor:t1:o1:u1", b"x".to_vec(), Ttl::Never)
            .await;

        backend.delete("mentor:t1:o1:u1").await;
        assert!(backend.get("mentor:t1:o1:u1").await.is_none());

        // Deleting an absent key is a no-op, not an error.
        backend.delete("mentor:t1:o1:u1").await;
        assert!(backend.get("mentor:t1:o1:u1").await.is_none());
    }

    #[tokio::test]
    async fn test_delete_prefix_scopes() {
        let backend = CacheBackend::new_local();
        backend
            .set("mentor:t1:o1:u1", b"a".to_vec(), Ttl::Never)
            .await;
        backend
            .set("mentor:t1:o2:u2", b"b".to_vec(), Ttl::Never)
            .await;
        backend
            .set("mentor:t2:o1:u3", b"c".to_vec(), Ttl::Never)
            .await;
        backend
            .set("mentee:t1:o1:u1", b"d".to_vec(), Ttl::Never)
            .await;

        // Tenant-wide prefix removes both organizations but not other
        // tenants or namespaces.
        backend.delete_prefix("mentor:t1:").await;
        assert!(backend.get("mentor:t1:o1:u1").await.is_none());
        assert!(backend.get("mentor:t1:o2:u2").await.is_none());
        assert!(backend.get("mentor:t2:o1:u3").await.is_some());
        assert!(backend.get("mentee:t1:o1:u1").await.is_some());
    }

    #[tokio::test]
    async fn test_count_prefix() {
        let backend = CacheBackend::new_local();
        backend
            .set("mentor:t1:o1:u1", b"a".to_vec(), Ttl::Never)
            .await;
        backend
            .set("mentor:t1:o1:u2", b"b".to_vec(), Ttl::Never)
            .await;
        backend
            .set("mentee:t1:o1:u1", b"c".to_vec(), Ttl::Never)
            .await;

        assert_eq!(backend.count_prefix("mentor:"), 2);
        assert_eq!(backend.count_prefix("mentee:"), 1);
        assert_eq!(backend.count_prefix("sessions:"), 0);
    }

    #[tokio::test]
    async fn test_local_mode_reports() {
        let backend = CacheBackend::new_local();
        assert_eq!(backend.mode(), "local");
        assert!(!backend.is_redis_available().await);
        assert!(backend.redis_pool().is_none());
    }
}
