//! Cache namespace registry.
//!
//! Namespaces are the fixed, closed set of cached entity categories. Each
//! namespace carries a default TTL and a negative-caching policy, loaded once
//! at startup into an immutable [`NamespaceRegistry`] that the cache core
//! holds by `Arc`. Referencing a namespace that is not registered is a
//! configuration error, never a runtime cache miss.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use mentorhub_core::CoreError;

/// The registered cache namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Namespace {
    Sessions,
    EntityTypes,
    Forms,
    Organizations,
    Mentor,
    Mentee,
    PlatformConfig,
    NotificationTemplates,
    DisplayProperties,
    Permissions,
    ApiPermissions,
}

impl Namespace {
    /// Every registered namespace, in registry order.
    pub const ALL: [Namespace; 11] = [
        Namespace::Sessions,
        Namespace::EntityTypes,
        Namespace::Forms,
        Namespace::Organizations,
        Namespace::Mentor,
        Namespace::Mentee,
        Namespace::PlatformConfig,
        Namespace::NotificationTemplates,
        Namespace::DisplayProperties,
        Namespace::Permissions,
        Namespace::ApiPermissions,
    ];

    /// The wire/key name of the namespace.
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Sessions => "sessions",
            Namespace::EntityTypes => "entityTypes",
            Namespace::Forms => "forms",
            Namespace::Organizations => "organizations",
            Namespace::Mentor => "mentor",
            Namespace::Mentee => "mentee",
            Namespace::PlatformConfig => "platformConfig",
            Namespace::NotificationTemplates => "notificationTemplates",
            Namespace::DisplayProperties => "displayProperties",
            Namespace::Permissions => "permissions",
            Namespace::ApiPermissions => "apiPermissions",
        }
    }

    /// Stable index into per-namespace tables (counters, specs).
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|ns| ns == self).unwrap_or(0)
    }

    /// Singleton namespaces cache one value per (tenant, organization) and
    /// carry no entity id.
    pub fn is_singleton(&self) -> bool {
        matches!(self, Namespace::PlatformConfig)
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Namespace::ALL
            .iter()
            .copied()
            .find(|ns| ns.as_str() == s)
            .ok_or_else(|| CoreError::unknown_namespace(s))
    }
}

/// Time-to-live policy for a cache entry.
///
/// `Never` entries are removed only by explicit invalidation; they are used
/// for namespaces where staleness is unacceptable but changes are rare and
/// always paired with an invalidation publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    Finite(Duration),
    Never,
}

impl Ttl {
    /// Builds a TTL from a config value in seconds; `0` means never expire.
    pub fn from_config_secs(secs: u64) -> Self {
        if secs == 0 {
            Ttl::Never
        } else {
            Ttl::Finite(Duration::from_secs(secs))
        }
    }

    /// The finite duration, if any.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Ttl::Finite(d) => Some(*d),
            Ttl::Never => None,
        }
    }
}

/// Static per-namespace cache policy.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceSpec {
    pub name: Namespace,
    pub default_ttl: Ttl,
    /// Whether a loader's "not found" result may be cached for this
    /// namespace (user-presence checks on mentor/mentee profiles).
    pub negative_caching: bool,
}

const TTL_SHORT: Duration = Duration::from_secs(5 * 60);
const TTL_LONG: Duration = Duration::from_secs(6 * 60 * 60);
const TTL_CONFIG: Duration = Duration::from_secs(12 * 60 * 60);

fn default_spec(namespace: Namespace) -> NamespaceSpec {
    let (default_ttl, negative_caching) = match namespace {
        // Session and profile data changes via external user-sync events.
        Namespace::Sessions => (Ttl::Finite(TTL_SHORT), false),
        Namespace::Mentor | Namespace::Mentee => (Ttl::Finite(TTL_SHORT), true),
        // Configuration-like data changes rarely.
        Namespace::EntityTypes
        | Namespace::Forms
        | Namespace::Organizations
        | Namespace::NotificationTemplates
        | Namespace::DisplayProperties => (Ttl::Finite(TTL_LONG), false),
        Namespace::PlatformConfig => (Ttl::Finite(TTL_CONFIG), false),
        // Evicted only by explicit invalidation.
        Namespace::Permissions | Namespace::ApiPermissions => (Ttl::Never, false),
    };

    NamespaceSpec {
        name: namespace,
        default_ttl,
        negative_caching,
    }
}

/// Immutable registry of namespace specs, built once at process start.
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    specs: [NamespaceSpec; Namespace::ALL.len()],
}

impl NamespaceRegistry {
    /// Builds a registry with the default per-namespace policies.
    pub fn new() -> Self {
        let specs = Namespace::ALL.map(default_spec);
        Self { specs }
    }

    /// Builds a registry applying per-namespace TTL overrides from config
    /// (seconds; `0` means never expire).
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownNamespace` for an override naming a
    /// namespace that is not registered, so a typo fails at startup instead
    /// of silently caching under defaults.
    pub fn with_ttl_overrides(overrides: &BTreeMap<String, u64>) -> Result<Self, CoreError> {
        let mut registry = Self::new();
        for (name, secs) in overrides {
            let namespace: Namespace = name.parse()?;
            registry.specs[namespace.index()].default_ttl = Ttl::from_config_secs(*secs);
        }
        Ok(registry)
    }

    /// The spec for a namespace.
    pub fn spec(&self, namespace: Namespace) -> &NamespaceSpec {
        &self.specs[namespace.index()]
    }

    /// The default TTL for a namespace.
    pub fn ttl(&self, namespace: Namespace) -> Ttl {
        self.specs[namespace.index()].default_ttl
    }

    /// Iterates every registered spec in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &NamespaceSpec> {
        self.specs.iter()
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_roundtrip() {
        for ns in Namespace::ALL {
            let parsed: Namespace = ns.as_str().parse().unwrap();
            assert_eq!(parsed, ns);
        }
    }

    #[test]
    fn test_unknown_namespace_is_config_error() {
        let err = "mentors".parse::<Namespace>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownNamespace(_)));
        assert_eq!(err.to_string(), "Unknown cache namespace: mentors");
    }

    #[test]
    fn test_namespace_serde_names() {
        let json = serde_json::to_string(&Namespace::PlatformConfig).unwrap();
        assert_eq!(json, "\"platformConfig\"");
        let ns: Namespace = serde_json::from_str("\"entityTypes\"").unwrap();
        assert_eq!(ns, Namespace::EntityTypes);
    }

    #[test]
    fn test_namespace_index_is_stable() {
        for (i, ns) in Namespace::ALL.iter().enumerate() {
            assert_eq!(ns.index(), i);
        }
    }

    #[test]
    fn test_default_ttl_policy() {
        let registry = NamespaceRegistry::new();
        assert_eq!(registry.ttl(Namespace::Mentor), Ttl::Finite(TTL_SHORT));
        assert_eq!(
            registry.ttl(Namespace::PlatformConfig),
            Ttl::Finite(TTL_CONFIG)
        );
        assert_eq!(registry.ttl(Namespace::Permissions), Ttl::Never);
        assert_eq!(registry.ttl(Namespace::ApiPermissions), Ttl::Never);
    }

    #[test]
    fn test_negative_caching_flags() {
        let registry = NamespaceRegistry::new();
        assert!(registry.spec(Namespace::Mentor).negative_caching);
        assert!(registry.spec(Namespace::Mentee).negative_caching);
        assert!(!registry.spec(Namespace::Permissions).negative_caching);
    }

    #[test]
    fn test_ttl_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert("mentor".to_string(), 30u64);
        overrides.insert("sessions".to_string(), 0u64);

        let registry = NamespaceRegistry::with_ttl_overrides(&overrides).unwrap();
        assert_eq!(
            registry.ttl(Namespace::Mentor),
            Ttl::Finite(Duration::from_secs(30))
        );
        assert_eq!(registry.ttl(Namespace::Sessions), Ttl::Never);
        // Untouched namespaces keep their defaults.
        assert_eq!(registry.ttl(Namespace::Forms), Ttl::Finite(TTL_LONG));
    }

    #[test]
    fn test_ttl_override_unknown_namespace_fails() {
        let mut overrides = BTreeMap::new();
        overrides.insert("menteeProfiles".to_string(), 30u64);
        assert!(NamespaceRegistry::with_ttl_overrides(&overrides).is_err());
    }

    #[test]
    fn test_ttl_from_config_secs() {
        assert_eq!(Ttl::from_config_secs(0), Ttl::Never);
        assert_eq!(
            Ttl::from_config_secs(60),
            Ttl::Finite(Duration::from_secs(60))
        );
        assert_eq!(Ttl::Never.as_duration(), None);
    }

    #[test]
    fn test_singleton_namespaces() {
        assert!(Namespace::PlatformConfig.is_singleton());
        assert!(!Namespace::Mentor.is_singleton());
    }
}
