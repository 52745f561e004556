//! Best-effort invalidation publishing.
//!
//! Publishing is fire-and-forget from the caller's perspective: the
//! triggering write already succeeded against the authoritative store, and
//! the writer has already evicted its own instance synchronously. A failed
//! publish therefore widens the staleness window on *other* instances only,
//! and is reported as a [`PublishOutcome`], a result type deliberately
//! distinct from the authoritative write's result, so callers cannot mistake
//! publish failure for write failure.

use deadpool_redis::Pool;
use redis::AsyncCommands;
use tokio::sync::broadcast;

use mentorhub_cache::metrics;
use mentorhub_cache::{INVALIDATION_CHANNEL, InvalidationEvent};

/// Broadcast channel capacity for the in-process fan-out.
const CHANNEL_CAPACITY: usize = 256;

/// Outcome of a best-effort invalidation publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The event reached every transport this bus is wired to.
    Delivered { local_subscribers: usize },
    /// Local delivery succeeded but the Redis publish failed; other
    /// instances will not see this event.
    RemoteFailed {
        local_subscribers: usize,
        reason: String,
    },
    /// No local subscriber and no remote transport; the event went nowhere.
    NoSubscribers,
}

impl PublishOutcome {
    /// Whether the caller should log a warning for this outcome.
    pub fn is_degraded(&self) -> bool {
        !matches!(self, PublishOutcome::Delivered { .. })
    }

    /// Human-readable description for warn-level logging.
    pub fn describe(&self) -> String {
        match self {
            PublishOutcome::Delivered { local_subscribers } => {
                format!("delivered to {local_subscribers} local subscriber(s)")
            }
            PublishOutcome::RemoteFailed { reason, .. } => {
                format!("remote publish failed: {reason}")
            }
            PublishOutcome::NoSubscribers => "no subscribers".to_string(),
        }
    }
}

/// Publish/subscribe bridge for invalidation events.
///
/// In-process delivery uses a `broadcast` channel; in Redis mode each event
/// is additionally PUBLISHed on the fixed invalidation topic so every
/// instance (including this one, via its own subscription) converges.
#[derive(Clone)]
pub struct InvalidationBus {
    local: broadcast::Sender<InvalidationEvent>,
    redis: Option<Pool>,
}

impl InvalidationBus {
    /// Bus for single-instance deployments: in-process fan-out only.
    pub fn new_local() -> Self {
        let (local, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { local, redis: None }
    }

    /// Bus that also publishes to the shared Redis topic.
    pub fn new_redis(pool: Pool) -> Self {
        let (local, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            local,
            redis: Some(pool),
        }
    }

    /// Subscribes to the in-process event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationEvent> {
        self.local.subscribe()
    }

    /// Number of live in-process subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.local.receiver_count()
    }

    /// Whether this bus publishes to a remote transport.
    pub fn has_remote(&self) -> bool {
        self.redis.is_some()
    }

    /// Publish an invalidation event, best effort.
    pub async fn publish(&self, event: &InvalidationEvent) -> PublishOutcome {
        let local_subscribers = self.local.send(event.clone()).unwrap_or(0);

        let Some(pool) = &self.redis else {
            if local_subscribers == 0 {
                metrics::record_publish_failure();
                return PublishOutcome::NoSubscribers;
            }
            return PublishOutcome::Delivered { local_subscribers };
        };

        match self.publish_remote(pool, event).await {
            Ok(()) => {
                tracing::debug!(scope = event.scope_label(), "published cache invalidation");
                PublishOutcome::Delivered { local_subscribers }
            }
            Err(reason) => {
                tracing::warn!(
                    scope = event.scope_label(),
                    error = %reason,
                    "Failed to publish cache invalidation to Redis"
                );
                metrics::record_publish_failure();
                PublishOutcome::RemoteFailed {
                    local_subscribers,
                    reason,
                }
            }
        }
    }

    async fn publish_remote(&self, pool: &Pool, event: &InvalidationEvent) -> Result<(), String> {
        let payload = serde_json::to_string(event)
            .map_err(|e| format!("failed to serialize invalidation event: {e}"))?;

        let mut conn = pool
            .get()
            .await
            .map_err(|e| format!("failed to get Redis connection: {e}"))?;

        conn.publish::<_, _, ()>(INVALIDATION_CHANNEL, payload)
            .await
            .map_err(|e| format!("failed to publish: {e}"))
    }
}
