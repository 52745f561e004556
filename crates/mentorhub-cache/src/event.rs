//! Cache invalidation events.
//!
//! Events are serialized as JSON and carried on one fixed pub/sub topic.
//! Every cache-holding instance consumes them at-least-once, including the
//! instance that emitted them; applying an event is idempotent, so duplicate
//! delivery and self-delivery are both safe.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use mentorhub_core::TenantScope;

use crate::namespace::Namespace;

/// The single pub/sub channel carrying invalidation events.
pub const INVALIDATION_CHANNEL: &str = "cache:invalidate";

/// What an invalidation event targets.
///
/// Tenant and organization codes travel as plain strings; the consumer
/// validates them before touching the cache, so a malformed remote payload
/// is skipped rather than trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum InvalidationScope {
    /// One entry.
    Key {
        namespace: Namespace,
        tenant_code: String,
        organization_code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        entity_id: Option<String>,
    },
    /// Every entry of a namespace: across all tenants, one tenant, or one
    /// (tenant, organization) scope, depending on which codes are present.
    Namespace {
        namespace: Namespace,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tenant_code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        organization_code: Option<String>,
    },
    /// Every namespace, every organization, one tenant.
    Tenant { tenant_code: String },
}

/// An invalidation event as published on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationEvent {
    #[serde(flatten)]
    pub scope: InvalidationScope,
    /// Unix timestamp (seconds) at emission, for diagnostics only.
    pub emitted_at: i64,
}

impl InvalidationEvent {
    fn now() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }

    /// Event targeting exactly one entry.
    pub fn key(namespace: Namespace, scope: &TenantScope, entity_id: Option<&str>) -> Self {
        Self {
            scope: InvalidationScope::Key {
                namespace,
                tenant_code: scope.tenant_code().to_owned(),
                organization_code: scope.organization_code().to_owned(),
                entity_id: entity_id.map(str::to_owned),
            },
            emitted_at: Self::now(),
        }
    }

    /// Event targeting a namespace, optionally narrowed to a tenant and
    /// organization.
    pub fn namespace(
        namespace: Namespace,
        tenant_code: Option<&str>,
        organization_code: Option<&str>,
    ) -> Self {
        Self {
            scope: InvalidationScope::Namespace {
                namespace,
                tenant_code: tenant_code.map(str::to_owned),
                organization_code: organization_code.map(str::to_owned),
            },
            emitted_at: Self::now(),
        }
    }

    /// Event targeting every cached entry of one tenant.
    pub fn tenant(tenant_code: &str) -> Self {
        Self {
            scope: InvalidationScope::Tenant {
                tenant_code: tenant_code.to_owned(),
            },
            emitted_at: Self::now(),
        }
    }

    /// Short label for logs and metrics.
    pub fn scope_label(&self) -> &'static str {
        match self.scope {
            InvalidationScope::Key { .. } => "key",
            InvalidationScope::Namespace { .. } => "namespace",
            InvalidationScope::Tenant { .. } => "tenant",
        }
    }
}
