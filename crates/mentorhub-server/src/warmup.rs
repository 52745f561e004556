//! Cache warm-up.
//!
//! Rather than waiting for traffic to populate the cache, the warm-up pass
//! walks a known working set, typically every active organization's
//! platform config and entity-type list, and runs it through the ordinary
//! `get_or_load` path, so warmed entries carry the same TTLs and invalidation
//! behavior as organically loaded ones.
//!
//! The authoritative store is an external collaborator, so the working set
//! comes from a [`WarmupSource`] the deployment wires in: a directory of
//! active tenant/organization scopes plus a loader per namespace.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mentorhub_cache::{CacheService, Namespace};
use mentorhub_core::TenantScope;

/// Deployment-supplied directory of the warm-up working set.
///
/// Warmed values are stored under the namespace's collection slot (entity id
/// absent): platform config is a singleton per scope, and list-shaped
/// namespaces cache their full per-organization collection there.
#[async_trait]
pub trait WarmupSource: Send + Sync {
    /// Every (tenant, organization) scope worth warming.
    async fn active_scopes(&self) -> anyhow::Result<Vec<TenantScope>>;

    /// Namespaces to warm for each scope.
    fn namespaces(&self) -> Vec<Namespace> {
        vec![Namespace::PlatformConfig, Namespace::EntityTypes]
    }

    /// Authoritative load of one namespace's working-set value for a scope.
    async fn load(
        &self,
        namespace: Namespace,
        scope: &TenantScope,
    ) -> anyhow::Result<serde_json::Value>;
}

/// Outcome of a warm-up pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarmupReport {
    /// Scopes visited after filtering.
    pub scopes: usize,
    /// Entries loaded (or already warm).
    pub warmed: usize,
    /// Loads that failed; the entry stays cold and is not cached.
    pub failed: usize,
}

/// Runs the warm-up pass, optionally narrowed to one tenant or one
/// (tenant, organization) scope.
pub async fn run_warmup(
    service: &CacheService,
    source: &dyn WarmupSource,
    tenant_filter: Option<&str>,
    organization_filter: Option<&str>,
) -> anyhow::Result<WarmupReport> {
    let scopes: Vec<TenantScope> = source
        .active_scopes()
        .await?
        .into_iter()
        .filter(|s| tenant_filter.is_none_or(|t| s.tenant_code() == t))
        .filter(|s| organization_filter.is_none_or(|o| s.organization_code() == o))
        .collect();

    let mut report = WarmupReport {
        scopes: scopes.len(),
        ..WarmupReport::default()
    };

    for scope in &scopes {
        for namespace in source.namespaces() {
            let loaded: Result<serde_json::Value, anyhow::Error> = service
                .get_or_load(namespace, scope, None, || source.load(namespace, scope))
                .await;
            match loaded {
                Ok(_) => report.warmed += 1,
                Err(e) => {
                    tracing::warn!(
                        namespace = %namespace,
                        scope = %scope,
                        error = %e,
                        "warm-up load failed"
                    );
                    report.failed += 1;
                }
            }
        }
    }

    tracing::info!(
        scopes = report.scopes,
        warmed = report.warmed,
        failed = report.failed,
        "cache warm-up finished"
    );
    Ok(report)
}

/// Fixed working set, for deployments with a static directory and for tests.
///
/// An empty source makes warm-up a no-op; the admin endpoint then reports
/// zero warmed entries until a real directory is wired in.
pub struct StaticWarmupSource {
    scopes: Vec<TenantScope>,
    values: HashMap<Namespace, serde_json::Value>,
}

impl StaticWarmupSource {
    pub fn new(scopes: Vec<TenantScope>, values: HashMap<Namespace, serde_json::Value>) -> Self {
        Self { scopes, values }
    }

    pub fn empty() -> Self {
        Self {
            scopes: Vec::new(),
            values: HashMap::new(),
        }
    }
}

#[async_trait]
impl WarmupSource for StaticWarmupSource {
    async fn active_scopes(&self) -> anyhow::Result<Vec<TenantScope>> {
        Ok(self.scopes.clone())
    }

    fn namespaces(&self) -> Vec<Namespace> {
        let mut namespaces: Vec<Namespace> = self.values.keys().copied().collect();
        namespaces.sort_by_key(|ns| ns.index());
        namespaces
    }

    async fn load(
        &self,
        namespace: Namespace,
        _scope: &TenantScope,
    ) -> anyhow::Result<serde_json::Value> {
        self.values
            .get(&namespace)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no seed value for namespace {namespace}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use mentorhub_cache::{CacheBackend, NamespaceRegistry};

    fn service() -> CacheService {
        CacheService::new(
            CacheBackend::new_local(),
            Arc::new(NamespaceRegistry::new()),
        )
    }

    fn source() -> StaticWarmupSource {
        let scopes = vec![
            TenantScope::new("t1", "o1").unwrap(),
            TenantScope::new("t1", "o2").unwrap(),
            TenantScope::new("t2", "o1").unwrap(),
        ];
        let mut values = HashMap::new();
        values.insert(
            Namespace::PlatformConfig,
            serde_json::json!({"chat": true}),
        );
        values.insert(Namespace::EntityTypes, serde_json::json!(["session"]));
        StaticWarmupSource::new(scopes, values)
    }

    #[tokio::test]
    async fn test_warmup_populates_working_set() {
        let cache = service();
        let report = run_warmup(&cache, &source(), None, None).await.unwrap();

        assert_eq!(report.scopes, 3);
        assert_eq!(report.warmed, 6);
        assert_eq!(report.failed, 0);

        let scope = TenantScope::new("t1", "o2").unwrap();
        let config: Option<serde_json::Value> = cache
            .get_cached_only(Namespace::PlatformConfig, &scope, None)
            .await;
        assert_eq!(config.unwrap(), serde_json::json!({"chat": true}));
    }

    #[tokio::test]
    async fn test_warmup_tenant_filter() {
        let cache = service();
        let report = run_warmup(&cache, &source(), Some("t2"), None).await.unwrap();
        assert_eq!(report.scopes, 1);
        assert_eq!(report.warmed, 2);

        let skipped = TenantScope::new("t1", "o1").unwrap();
        let cold: Option<serde_json::Value> = cache
            .get_cached_only(Namespace::PlatformConfig, &skipped, None)
            .await;
        assert!(cold.is_none());
    }

    #[tokio::test]
    async fn test_warmup_scope_filter() {
        let cache = service();
        let report = run_warmup(&cache, &source(), Some("t1"), Some("o2"))
            .await
            .unwrap();
        assert_eq!(report.scopes, 1);
    }

    #[tokio::test]
    async fn test_empty_source_is_noop() {
        let cache = service();
        let report = run_warmup(&cache, &StaticWarmupSource::empty(), None, None)
            .await
            .unwrap();
        assert_eq!(report.scopes, 0);
        assert_eq!(report.warmed, 0);
        assert_eq!(cache.stats().total_entries, 0);
    }
}
