//! # mentorhub-cache
//!
//! Tenant/organization-scoped cache core for the MentorHub platform.
//!
//! ## Architecture
//!
//! - **Namespace Registry**: the fixed set of cache namespaces with
//!   per-namespace TTL and negative-caching policy, immutable after startup
//! - **Cache Backend**: L1 (DashMap, per-instance) with an optional L2
//!   (Redis, shared) tier; graceful degradation when Redis is unavailable
//! - **Cache Service**: key construction, MessagePack payloads, the
//!   load-through contract, scoped invalidation, and per-namespace stats
//!
//! Cross-instance invalidation events are defined here ([`InvalidationEvent`])
//! and carried by the `mentorhub-bus` crate.

pub mod backend;
pub mod event;
pub mod key;
pub mod metrics;
pub mod namespace;
pub mod service;

pub use backend::{CacheBackend, CachedEntry};
pub use event::{INVALIDATION_CHANNEL, InvalidationEvent, InvalidationScope};
pub use key::CacheKey;
pub use namespace::{Namespace, NamespaceRegistry, NamespaceSpec, Ttl};
pub use service::{CacheError, CacheService, CacheStatsReport, NamespaceHandle, NamespaceStats};
