//! Physical cache key construction.
//!
//! The namespace name is always the leading key component, so no two
//! namespaces can alias the same physical slot even with identical
//! tenant/org/id. Singleton namespaces (platform config) render a constant
//! `_` id segment.

use serde::{Deserialize, Serialize};

use mentorhub_core::TenantScope;

use crate::namespace::Namespace;

/// Placeholder id segment for singleton namespaces.
const SINGLETON_ID: &str = "_";

/// Composite identifier for one cache slot.
///
/// Two keys with identical components always resolve to the same logical
/// slot; [`CacheKey::entry_key`] is the deterministic physical rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub namespace: Namespace,
    pub scope: TenantScope,
    pub entity_id: Option<String>,
}

impl CacheKey {
    /// Creates a key for one entity within a namespace and scope.
    pub fn new(namespace: Namespace, scope: TenantScope, entity_id: Option<&str>) -> Self {
        Self {
            namespace,
            scope,
            entity_id: entity_id.map(str::to_owned),
        }
    }

    /// The full physical key: `{namespace}:{tenant}:{org}:{id}`.
    pub fn entry_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.namespace.as_str(),
            self.scope.tenant_code(),
            self.scope.organization_code(),
            self.entity_id.as_deref().unwrap_or(SINGLETON_ID)
        )
    }

    /// Prefix covering every entry of the namespace under this scope.
    pub fn scope_prefix(&self) -> String {
        namespace_scope_prefix(self.namespace, &self.scope)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.entry_key())
    }
}

/// Prefix for all entries of `namespace` under `(tenant, organization)`.
pub fn namespace_scope_prefix(namespace: Namespace, scope: &TenantScope) -> String {
    format!(
        "{}:{}:{}:",
        namespace.as_str(),
        scope.tenant_code(),
        scope.organization_code()
    )
}

/// Prefix for all entries of `namespace` under one tenant, across every
/// organization.
pub fn namespace_tenant_prefix(namespace: Namespace, tenant_code: &str) -> String {
    format!("{}:{}:", namespace.as_str(), tenant_code)
}

/// Prefix for every entry of `namespace`, across all tenants.
pub fn namespace_prefix(namespace: Namespace) -> String {
    format!("{}:", namespace.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> TenantScope {
        TenantScope::new("t1", "o1").unwrap()
    }

    #[test]
    fn test_entry_key_shape() {
        let key = CacheKey::new(Namespace::Mentor, scope(), Some("u42"));
        assert_eq!(key.entry_key(), "mentor:t1:o1:u42");
        assert_eq!(key.to_string(), "mentor:t1:o1:u42");
    }

    #[test]
    fn test_singleton_key_renders_constant_id() {
        let key = CacheKey::new(Namespace::PlatformConfig, scope(), None);
        assert_eq!(key.entry_key(), "platformConfig:t1:o1:_");
    }

    #[test]
    fn test_identical_components_same_slot() {
        let a = CacheKey::new(Namespace::Mentee, scope(), Some("u7"));
        let b = CacheKey::new(Namespace::Mentee, scope(), Some("u7"));
        assert_eq!(a, b);
        assert_eq!(a.entry_key(), b.entry_key());
    }

    #[test]
    fn test_namespaces_never_alias() {
        let mentor = CacheKey::new(Namespace::Mentor, scope(), Some("u42")).entry_key();
        let mentee = CacheKey::new(Namespace::Mentee, scope(), Some("u42")).entry_key();
        assert_ne!(mentor, mentee);
    }

    #[test]
    fn test_prefix_forms() {
        let key = CacheKey::new(Namespace::Mentor, scope(), Some("u42"));
        assert_eq!(key.scope_prefix(), "mentor:t1:o1:");
        assert!(key.entry_key().starts_with(&key.scope_prefix()));

        assert_eq!(
            namespace_tenant_prefix(Namespace::Mentor, "t1"),
            "mentor:t1:"
        );
        assert_eq!(namespace_prefix(Namespace::Mentor), "mentor:");
    }

    #[test]
    fn test_tenant_prefix_covers_all_orgs() {
        let o1 = CacheKey::new(Namespace::Mentor, TenantScope::new("t1", "o1").unwrap(), Some("u1"));
        let o2 = CacheKey::new(Namespace::Mentor, TenantScope::new("t1", "o2").unwrap(), Some("u1"));
        let prefix = namespace_tenant_prefix(Namespace::Mentor, "t1");
        assert!(o1.entry_key().starts_with(&prefix));
        assert!(o2.entry_key().starts_with(&prefix));

        let other_tenant =
            CacheKey::new(Namespace::Mentor, TenantScope::new("t2", "o1").unwrap(), Some("u1"));
        assert!(!other_tenant.entry_key().starts_with(&prefix));
    }
}
