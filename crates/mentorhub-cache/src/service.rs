//! The cache engine.
//!
//! `CacheService` owns entry lifecycle end to end: it builds namespaced keys
//! from (tenant, organization, entity id), serializes payloads as
//! MessagePack, applies the namespace TTL policy, and exposes the
//! miss-fallback contract: on a miss, a caller-supplied loader fetches the
//! authoritative value, which is cached before being returned.
//!
//! ## Concurrency
//!
//! No single-flight deduplication: concurrent `get_or_load` calls for the
//! same key may each invoke their loader. The loads are idempotent reads, so
//! the duplicate work is accepted instead of paying for per-key locking.
//!
//! ## Failure policy
//!
//! Loader failures propagate verbatim and cache nothing. Backend failures
//! degrade reads to a miss and never mask a loader failure. A payload that
//! no longer decodes is evicted and reported as a miss.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use mentorhub_core::TenantScope;

use crate::backend::CacheBackend;
use crate::event::{InvalidationEvent, InvalidationScope};
use crate::key::{self, CacheKey};
use crate::namespace::{Namespace, NamespaceRegistry, Ttl};

/// Errors surfaced by cache writes.
///
/// Reads never fail with a cache error: they degrade to a miss.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}

/// Per-namespace hit/miss counters (service-level, for the admin surface).
#[derive(Debug, Default)]
struct NamespaceCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Point-in-time statistics for one namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceStats {
    pub namespace: String,
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Snapshot of the whole cache, as reported by `GET /cache/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatsReport {
    pub mode: String,
    pub total_entries: usize,
    pub namespaces: Vec<NamespaceStats>,
}

/// Tenant/organization-scoped cache with typed namespaces.
pub struct CacheService {
    backend: CacheBackend,
    registry: Arc<NamespaceRegistry>,
    counters: [NamespaceCounters; Namespace::ALL.len()],
}

impl CacheService {
    /// Creates a cache service over a backend and an immutable namespace
    /// registry.
    pub fn new(backend: CacheBackend, registry: Arc<NamespaceRegistry>) -> Self {
        Self {
            backend,
            registry,
            counters: std::array::from_fn(|_| NamespaceCounters::default()),
        }
    }

    /// The namespace registry this service was built with.
    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// The underlying backend (health checks, bus wiring).
    pub fn backend(&self) -> &CacheBackend {
        &self.backend
    }

    fn record_hit(&self, namespace: Namespace) {
        self.counters[namespace.index()]
            .hits
            .fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self, namespace: Namespace) {
        self.counters[namespace.index()]
            .misses
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Get a cached value.
    ///
    /// Returns `None` on a miss, on an expired entry (purged eagerly, never
    /// returned stale), or when the backend is unreachable.
    pub async fn get<T: DeserializeOwned>(
        &self,
        namespace: Namespace,
        scope: &TenantScope,
        entity_id: Option<&str>,
    ) -> Option<T> {
        let entry_key = CacheKey::new(namespace, scope.clone(), entity_id).entry_key();

        let Some(data) = self.backend.get(&entry_key).await else {
            self.record_miss(namespace);
            return None;
        };

        match rmp_serde::from_slice::<T>(&data) {
            Ok(value) => {
                self.record_hit(namespace);
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key = %entry_key, error = %e, "Failed to decode cached payload, evicting");
                self.backend.delete(&entry_key).await;
                self.record_miss(namespace);
                None
            }
        }
    }

    /// Cache-only read for negative-lookup call sites.
    ///
    /// Semantically identical to [`get`](Self::get); the separate name marks
    /// call sites that treat a miss as a definitive answer (user-presence
    /// checks) rather than as a trigger for a database fallback.
    pub async fn get_cached_only<T: DeserializeOwned>(
        &self,
        namespace: Namespace,
        scope: &TenantScope,
        entity_id: Option<&str>,
    ) -> Option<T> {
        self.get(namespace, scope, entity_id).await
    }

    /// Get a cached value, falling back to the authoritative loader on miss.
    ///
    /// On a hit the loader is never invoked. On a miss the loader runs and a
    /// successful result is stored under the namespace TTL before being
    /// returned: at most one cache write per successful load, never a write
    /// for a failed load.
    ///
    /// # Errors
    ///
    /// A loader failure propagates verbatim; nothing is cached and a
    /// subsequent `get` still misses.
    pub async fn get_or_load<T, E, F, Fut>(
        &self,
        namespace: Namespace,
        scope: &TenantScope,
        entity_id: Option<&str>,
        loader: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(namespace, scope, entity_id).await {
            return Ok(value);
        }

        let value = loader().await?;
        self.store(namespace, scope, entity_id, &value, None).await;
        Ok(value)
    }

    /// Load-through variant for lookups where "not found" is a valid,
    /// cacheable answer.
    ///
    /// A loader returning `Ok(None)` is cached as an absent marker only for
    /// namespaces with negative caching enabled (mentor/mentee presence
    /// checks); elsewhere the `None` is returned but not cached. Loader
    /// errors are never cached in either case.
    pub async fn get_or_load_optional<T, E, F, Fut>(
        &self,
        namespace: Namespace,
        scope: &TenantScope,
        entity_id: Option<&str>,
        loader: F,
    ) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        if let Some(cached) = self.get::<Option<T>>(namespace, scope, entity_id).await {
            return Ok(cached);
        }

        let loaded = loader().await?;
        if loaded.is_some() || self.registry.spec(namespace).negative_caching {
            self.store(namespace, scope, entity_id, &loaded, None).await;
        }
        Ok(loaded)
    }

    /// Unconditionally overwrite an entry.
    ///
    /// Used by write-through writers that populate the cache with fresh data
    /// immediately after a successful authoritative write instead of waiting
    /// for the next miss. The authoritative write must complete first.
    ///
    /// # Errors
    ///
    /// Fails only if the value cannot be encoded; backend-tier write
    /// failures are logged and degrade to an L1-only entry.
    pub async fn set<T: Serialize>(
        &self,
        namespace: Namespace,
        scope: &TenantScope,
        entity_id: Option<&str>,
        value: &T,
        ttl_override: Option<Ttl>,
    ) -> Result<(), CacheError> {
        let entry_key = CacheKey::new(namespace, scope.clone(), entity_id).entry_key();
        let bytes = rmp_serde::to_vec(value)?;
        let ttl = ttl_override.unwrap_or_else(|| self.registry.ttl(namespace));
        self.backend.set(&entry_key, bytes, ttl).await;
        Ok(())
    }

    /// Best-effort store used on the load-through path: an encode failure
    /// must not fail a call whose authoritative load already succeeded.
    async fn store<T: Serialize>(
        &self,
        namespace: Namespace,
        scope: &TenantScope,
        entity_id: Option<&str>,
        value: &T,
        ttl_override: Option<Ttl>,
    ) {
        if let Err(e) = self.set(namespace, scope, entity_id, value, ttl_override).await {
            tracing::warn!(
                namespace = %namespace,
                scope = %scope,
                error = %e,
                "Failed to encode loaded value for cache"
            );
        }
    }

    /// Remove one entry (`entity_id` given) or every entry under the
    /// `(namespace, tenant, organization)` prefix (`entity_id` omitted).
    ///
    /// Safe to call when nothing matches.
    pub async fn invalidate(
        &self,
        namespace: Namespace,
        scope: &TenantScope,
        entity_id: Option<&str>,
    ) {
        match entity_id {
            Some(_) => {
                let entry_key = CacheKey::new(namespace, scope.clone(), entity_id).entry_key();
                self.backend.delete(&entry_key).await;
            }
            None => {
                self.backend
                    .delete_prefix(&key::namespace_scope_prefix(namespace, scope))
                    .await;
            }
        }
    }

    /// Remove namespace entries at the given granularity: all tenants, one
    /// tenant, or one (tenant, organization) scope.
    pub async fn invalidate_namespace(
        &self,
        namespace: Namespace,
        tenant_code: Option<&str>,
        organization_code: Option<&str>,
    ) {
        let prefix = match (tenant_code, organization_code) {
            (Some(tenant), Some(org)) => format!("{}:{}:{}:", namespace.as_str(), tenant, org),
            (Some(tenant), None) => key::namespace_tenant_prefix(namespace, tenant),
            (None, _) => key::namespace_prefix(namespace),
        };
        self.backend.delete_prefix(&prefix).await;
    }

    /// Remove every cached entry of one tenant across all namespaces and
    /// organizations.
    pub async fn invalidate_tenant(&self, tenant_code: &str) {
        for namespace in Namespace::ALL {
            self.backend
                .delete_prefix(&key::namespace_tenant_prefix(namespace, tenant_code))
                .await;
        }
    }

    /// Apply a received invalidation event.
    ///
    /// Idempotent: deleting an already-absent key is a no-op, so duplicate
    /// and self-originated deliveries converge to the same state. Events
    /// carrying codes that fail scope validation are skipped with a warning
    /// rather than trusted.
    pub async fn apply_event(&self, event: &InvalidationEvent) {
        match &event.scope {
            InvalidationScope::Key {
                namespace,
                tenant_code,
                organization_code,
                entity_id,
            } => match TenantScope::new(tenant_code.clone(), organization_code.clone()) {
                Ok(scope) => {
                    let entry_key =
                        CacheKey::new(*namespace, scope, entity_id.as_deref()).entry_key();
                    self.backend.delete(&entry_key).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping invalidation event with invalid scope");
                }
            },
            InvalidationScope::Namespace {
                namespace,
                tenant_code,
                organization_code,
            } => {
                self.invalidate_namespace(
                    *namespace,
                    tenant_code.as_deref(),
                    organization_code.as_deref(),
                )
                .await;
            }
            InvalidationScope::Tenant { tenant_code } => {
                self.invalidate_tenant(tenant_code).await;
            }
        }
    }

    /// Per-namespace hit/miss counters and entry counts. Read-only.
    pub fn stats(&self) -> CacheStatsReport {
        let namespaces = Namespace::ALL
            .iter()
            .map(|ns| NamespaceStats {
                namespace: ns.as_str().to_string(),
                hits: self.counters[ns.index()].hits.load(Ordering::Relaxed),
                misses: self.counters[ns.index()].misses.load(Ordering::Relaxed),
                entries: self.backend.count_prefix(&key::namespace_prefix(*ns)),
            })
            .collect();

        CacheStatsReport {
            mode: self.backend.mode().to_string(),
            total_entries: self.backend.entry_count(),
            namespaces,
        }
    }

    /// A typed accessor bound to one namespace.
    pub fn namespace(&self, namespace: Namespace) -> NamespaceHandle<'_> {
        NamespaceHandle {
            service: self,
            namespace,
        }
    }
}

macro_rules! namespace_accessors {
    ($($fn_name:ident => $variant:ident),+ $(,)?) => {
        impl CacheService {
            $(
                #[doc = concat!("Handle bound to the `", stringify!($fn_name), "` namespace.")]
                pub fn $fn_name(&self) -> NamespaceHandle<'_> {
                    self.namespace(Namespace::$variant)
                }
            )+
        }
    };
}

namespace_accessors! {
    sessions => Sessions,
    entity_types => EntityTypes,
    forms => Forms,
    organizations => Organizations,
    mentor => Mentor,
    mentee => Mentee,
    platform_config => PlatformConfig,
    notification_templates => NotificationTemplates,
    display_properties => DisplayProperties,
    permissions => Permissions,
    api_permissions => ApiPermissions,
}

/// Thin per-namespace wrapper over [`CacheService`] for call-site
/// ergonomics: `cache.mentee().get_cached_only(&scope, Some(id))`.
///
/// All namespace-specific behavior (TTL, negative caching) comes from the
/// registry; the handle only binds the namespace parameter.
#[derive(Clone, Copy)]
pub struct NamespaceHandle<'a> {
    service: &'a CacheService,
    namespace: Namespace,
}

impl NamespaceHandle<'_> {
    /// The namespace this handle is bound to.
    pub fn name(&self) -> Namespace {
        self.namespace
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        scope: &TenantScope,
        entity_id: Option<&str>,
    ) -> Option<T> {
        self.service.get(self.namespace, scope, entity_id).await
    }

    pub async fn get_cached_only<T: DeserializeOwned>(
        &self,
        scope: &TenantScope,
        entity_id: Option<&str>,
    ) -> Option<T> {
        self.service
            .get_cached_only(self.namespace, scope, entity_id)
            .await
    }

    pub async fn get_or_load<T, E, F, Fut>(
        &self,
        scope: &TenantScope,
        entity_id: Option<&str>,
        loader: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.service
            .get_or_load(self.namespace, scope, entity_id, loader)
            .await
    }

    pub async fn get_or_load_optional<T, E, F, Fut>(
        &self,
        scope: &TenantScope,
        entity_id: Option<&str>,
        loader: F,
    ) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        self.service
            .get_or_load_optional(self.namespace, scope, entity_id, loader)
            .await
    }

    pub async fn set<T: Serialize>(
        &self,
        scope: &TenantScope,
        entity_id: Option<&str>,
        value: &T,
        ttl_override: Option<Ttl>,
    ) -> Result<(), CacheError> {
        self.service
            .set(self.namespace, scope, entity_id, value, ttl_override)
            .await
    }

    pub async fn invalidate(&self, scope: &TenantScope, entity_id: Option<&str>) {
        self.service
            .invalidate(self.namespace, scope, entity_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
    }

    fn service() -> CacheService {
        CacheService::new(
            CacheBackend::new_local(),
            Arc::new(NamespaceRegistry::new()),
        )
    }

    fn scope() -> TenantScope {
        TenantScope::new("t1", "o1").unwrap()
    }

    #[tokio::test]
    async fn test_get_never_written_key_is_absent() {
        let cache = service();
        let result: Option<Profile> = cache.get(Namespace::Mentor, &scope(), Some("u1")).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_set_then_get_roundtrip() {
        let cache = service();
        let profile = Profile {
            name: "Asha".to_string(),
        };

        cache
            .set(Namespace::Mentor, &scope(), Some("u42"), &profile, None)
            .await
            .unwrap();

        let cached: Profile = cache
            .get(Namespace::Mentor, &scope(), Some("u42"))
            .await
            .unwrap();
        assert_eq!(cached, profile);
    }

    #[tokio::test]
    async fn test_invalidate_then_get_is_absent_and_idempotent() {
        let cache = service();
        let profile = Profile {
            name: "Asha".to_string(),
        };
        cache
            .set(Namespace::Mentor, &scope(), Some("u42"), &profile, None)
            .await
            .unwrap();

        cache.invalidate(Namespace::Mentor, &scope(), Some("u42")).await;
        let gone: Option<Profile> = cache.get(Namespace::Mentor, &scope(), Some("u42")).await;
        assert!(gone.is_none());

        // Calling twice is safe.
        cache.invalidate(Namespace::Mentor, &scope(), Some("u42")).await;
        let still_gone: Option<Profile> = cache.get(Namespace::Mentor, &scope(), Some("u42")).await;
        assert!(still_gone.is_none());
    }

    #[tokio::test]
    async fn test_get_or_load_cold_key_loads_once() {
        let cache = service();
        let loads = AtomicUsize::new(0);

        let loaded: Result<Profile, Infallible> = cache
            .get_or_load(Namespace::Mentor, &scope(), Some("u42"), || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(Profile {
                    name: "Asha".to_string(),
                })
            })
            .await;
        assert_eq!(loaded.unwrap().name, "Asha");
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        // Second call hits the cache; the loader must not run again.
        let cached: Result<Profile, Infallible> = cache
            .get_or_load(Namespace::Mentor, &scope(), Some("u42"), || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(Profile {
                    name: "other".to_string(),
                })
            })
            .await;
        assert_eq!(cached.unwrap().name, "Asha");
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_load_loader_failure_propagates_and_caches_nothing() {
        let cache = service();

        let result: Result<Profile, &str> = cache
            .get_or_load(Namespace::Mentor, &scope(), Some("u42"), || async {
                Err("authoritative store down")
            })
            .await;
        assert_eq!(result.unwrap_err(), "authoritative store down");

        let after: Option<Profile> = cache.get(Namespace::Mentor, &scope(), Some("u42")).await;
        assert!(after.is_none());
    }

    #[tokio::test]
    async fn test_platform_config_set_invalidate_scope() {
        let cache = service();
        let config = serde_json::json!({"chat": true});

        cache
            .set(Namespace::PlatformConfig, &scope(), None, &config, None)
            .await
            .unwrap();
        let cached: Option<serde_json::Value> =
            cache.get(Namespace::PlatformConfig, &scope(), None).await;
        assert_eq!(cached.unwrap(), config);

        // Prefix invalidation removes the singleton entry.
        cache.invalidate(Namespace::PlatformConfig, &scope(), None).await;
        let gone: Option<serde_json::Value> =
            cache.get(Namespace::PlatformConfig, &scope(), None).await;
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_namespace_tenant_spans_organizations() {
        let cache = service();
        let o1 = TenantScope::new("t1", "o1").unwrap();
        let o2 = TenantScope::new("t1", "o2").unwrap();
        let other = TenantScope::new("t2", "o1").unwrap();
        let profile = Profile {
            name: "x".to_string(),
        };

        for s in [&o1, &o2, &other] {
            cache
                .set(Namespace::Mentor, s, Some("u1"), &profile, None)
                .await
                .unwrap();
        }

        cache
            .invalidate_namespace(Namespace::Mentor, Some("t1"), None)
            .await;

        let gone1: Option<Profile> = cache.get(Namespace::Mentor, &o1, Some("u1")).await;
        let gone2: Option<Profile> = cache.get(Namespace::Mentor, &o2, Some("u1")).await;
        let kept: Option<Profile> = cache.get(Namespace::Mentor, &other, Some("u1")).await;
        assert!(gone1.is_none());
        assert!(gone2.is_none());
        assert!(kept.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_tenant_spans_namespaces() {
        let cache = service();
        let profile = Profile {
            name: "x".to_string(),
        };

        cache
            .set(Namespace::Mentor, &scope(), Some("u1"), &profile, None)
            .await
            .unwrap();
        cache
            .set(Namespace::Sessions, &scope(), Some("s1"), &profile, None)
            .await
            .unwrap();

        cache.invalidate_tenant("t1").await;

        let mentor: Option<Profile> = cache.get(Namespace::Mentor, &scope(), Some("u1")).await;
        let session: Option<Profile> = cache.get(Namespace::Sessions, &scope(), Some("s1")).await;
        assert!(mentor.is_none());
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn test_apply_event_twice_is_idempotent() {
        let cache = service();
        let profile = Profile {
            name: "x".to_string(),
        };
        cache
            .set(Namespace::Mentor, &scope(), Some("u1"), &profile, None)
            .await
            .unwrap();

        let event = InvalidationEvent::namespace(Namespace::Mentor, Some("t1"), None);
        cache.apply_event(&event).await;
        let first = cache.stats();

        cache.apply_event(&event).await;
        let second = cache.stats();

        assert_eq!(first.total_entries, second.total_entries);
        let gone: Option<Profile> = cache.get(Namespace::Mentor, &scope(), Some("u1")).await;
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_apply_key_event_removes_exactly_one_entry() {
        let cache = service();
        let profile = Profile {
            name: "x".to_string(),
        };
        cache
            .set(Namespace::Mentor, &scope(), Some("u1"), &profile, None)
            .await
            .unwrap();
        cache
            .set(Namespace::Mentor, &scope(), Some("u2"), &profile, None)
            .await
            .unwrap();

        let event = InvalidationEvent::key(Namespace::Mentor, &scope(), Some("u1"));
        cache.apply_event(&event).await;

        let gone: Option<Profile> = cache.get(Namespace::Mentor, &scope(), Some("u1")).await;
        let kept: Option<Profile> = cache.get(Namespace::Mentor, &scope(), Some("u2")).await;
        assert!(gone.is_none());
        assert!(kept.is_some());
    }

    #[tokio::test]
    async fn test_negative_caching_for_mentee_presence_checks() {
        let cache = service();
        let loads = AtomicUsize::new(0);

        // Mentee allows negative caching: the loader's None is cached.
        let first: Result<Option<Profile>, Infallible> = cache
            .get_or_load_optional(Namespace::Mentee, &scope(), Some("ghost"), || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
            .await;
        assert!(first.unwrap().is_none());

        let second: Result<Option<Profile>, Infallible> = cache
            .get_or_load_optional(Namespace::Mentee, &scope(), Some("ghost"), || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
            .await;
        assert!(second.unwrap().is_none());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_negative_caching_outside_allowed_namespaces() {
        let cache = service();
        let loads = AtomicUsize::new(0);

        for _ in 0..2 {
            let result: Result<Option<Profile>, Infallible> = cache
                .get_or_load_optional(Namespace::Forms, &scope(), Some("f1"), || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                })
                .await;
            assert!(result.unwrap().is_none());
        }
        // Forms does not cache absence; both calls consult the loader.
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ttl_override_expiry() {
        let cache = service();
        let profile = Profile {
            name: "x".to_string(),
        };
        cache
            .set(
                Namespace::Mentor,
                &scope(),
                Some("u1"),
                &profile,
                Some(Ttl::Finite(Duration::from_millis(0))),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        let gone: Option<Profile> = cache.get(Namespace::Mentor, &scope(), Some("u1")).await;
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_stats_count_hits_misses_and_entries() {
        let cache = service();
        let profile = Profile {
            name: "x".to_string(),
        };

        let miss: Option<Profile> = cache.get(Namespace::Mentor, &scope(), Some("u1")).await;
        assert!(miss.is_none());

        cache
            .set(Namespace::Mentor, &scope(), Some("u1"), &profile, None)
            .await
            .unwrap();
        let hit: Option<Profile> = cache.get(Namespace::Mentor, &scope(), Some("u1")).await;
        assert!(hit.is_some());

        let report = cache.stats();
        assert_eq!(report.mode, "local");
        assert_eq!(report.total_entries, 1);

        let mentor = report
            .namespaces
            .iter()
            .find(|ns| ns.namespace == "mentor")
            .unwrap();
        assert_eq!(mentor.hits, 1);
        assert_eq!(mentor.misses, 1);
        assert_eq!(mentor.entries, 1);

        let mentee = report
            .namespaces
            .iter()
            .find(|ns| ns.namespace == "mentee")
            .unwrap();
        assert_eq!(mentee.hits, 0);
        assert_eq!(mentee.entries, 0);
    }

    #[tokio::test]
    async fn test_namespace_handle_ergonomics() {
        let cache = service();
        let profile = Profile {
            name: "Asha".to_string(),
        };

        cache
            .mentor()
            .set(&scope(), Some("u42"), &profile, None)
            .await
            .unwrap();

        let cached: Option<Profile> = cache.mentor().get_cached_only(&scope(), Some("u42")).await;
        assert_eq!(cached.unwrap(), profile);

        // Handles never alias across namespaces.
        let other: Option<Profile> = cache.mentee().get_cached_only(&scope(), Some("u42")).await;
        assert!(other.is_none());

        assert_eq!(cache.platform_config().name(), Namespace::PlatformConfig);
    }
}
