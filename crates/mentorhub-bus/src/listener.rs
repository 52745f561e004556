//! Invalidation event consumption.
//!
//! Every cache-holding process runs one listener. It consumes the
//! in-process event stream and, in Redis mode, the shared pub/sub topic, and
//! applies each event (self-originated ones included) through
//! `CacheService::apply_event`. Applying is idempotent, so at-least-once
//! delivery and duplicate receipt are safe.
//!
//! ## Reconnection
//!
//! The Redis subscription runs on a dedicated connection. On any error the
//! listener reconnects with exponential backoff (capped at 5 minutes) and
//! keeps running for the life of the process.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;

use mentorhub_cache::metrics;
use mentorhub_cache::{CacheService, INVALIDATION_CHANNEL, InvalidationEvent};

use crate::publisher::InvalidationBus;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Background consumer keeping this instance's cache coherent.
pub struct InvalidationListener {
    service: Arc<CacheService>,
    bus: InvalidationBus,
    redis_url: Option<String>,
    alive: Arc<AtomicBool>,
}

impl InvalidationListener {
    /// Creates a listener over the in-process bus only.
    pub fn new(service: Arc<CacheService>, bus: InvalidationBus) -> Self {
        Self {
            service,
            bus,
            redis_url: None,
            alive: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Additionally subscribe to the shared Redis invalidation topic.
    #[must_use]
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    /// Liveness flag for the health endpoint. `true` once the listener is
    /// subscribed; `false` while the remote subscription is down.
    pub fn liveness(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.alive)
    }

    /// Starts the listener tasks and returns.
    ///
    /// One task drains the in-process channel; in Redis mode a second task
    /// maintains the pub/sub subscription.
    pub fn start(self) {
        let Self {
            service,
            bus,
            redis_url,
            alive,
        } = self;

        let local_rx = bus.subscribe();
        let local_service = Arc::clone(&service);
        tokio::spawn(async move {
            run_local_loop(local_rx, local_service).await;
        });

        match redis_url {
            Some(url) => {
                tokio::spawn(async move {
                    run_remote_loop(url, service, alive).await;
                });
            }
            None => {
                // In-process delivery has no connection to lose.
                alive.store(true, Ordering::Relaxed);
            }
        }
    }
}

async fn run_local_loop(
    mut rx: broadcast::Receiver<InvalidationEvent>,
    service: Arc<CacheService>,
) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                tracing::debug!(scope = event.scope_label(), "received cache invalidation");
                metrics::record_invalidation_event(event.scope_label(), "local");
                service.apply_event(&event).await;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "invalidation listener lagged, events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::info!("invalidation bus closed, local listener stopping");
                break;
            }
        }
    }
}

async fn run_remote_loop(url: String, service: Arc<CacheService>, alive: Arc<AtomicBool>) {
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match subscribe_and_consume(&url, &service, &alive).await {
            Ok(()) => {
                backoff = INITIAL_BACKOFF;
            }
            Err(e) => {
                alive.store(false, Ordering::Relaxed);
                tracing::error!(
                    error = %e,
                    backoff_secs = backoff.as_secs(),
                    "Cache invalidation listener error, reconnecting"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

async fn subscribe_and_consume(
    url: &str,
    service: &Arc<CacheService>,
    alive: &Arc<AtomicBool>,
) -> Result<(), String> {
    use futures_util::StreamExt;

    let client = redis::Client::open(url)
        .map_err(|e| format!("failed to create Redis client: {e}"))?;

    let mut pubsub = client
        .get_async_pubsub()
        .await
        .map_err(|e| format!("failed to get pub/sub connection: {e}"))?;

    pubsub
        .subscribe(INVALIDATION_CHANNEL)
        .await
        .map_err(|e| format!("failed to subscribe: {e}"))?;

    alive.store(true, Ordering::Relaxed);
    tracing::info!(channel = INVALIDATION_CHANNEL, "Subscribed to cache invalidation topic");

    let mut stream = pubsub.on_message();
    loop {
        match stream.next().await {
            Some(msg) => {
                let Ok(payload) = msg.get_payload::<String>() else {
                    tracing::warn!("failed to read invalidation message payload");
                    continue;
                };

                match serde_json::from_str::<InvalidationEvent>(&payload) {
                    Ok(event) => {
                        tracing::debug!(
                            scope = event.scope_label(),
                            "received cache invalidation"
                        );
                        metrics::record_invalidation_event(event.scope_label(), "remote");
                        service.apply_event(&event).await;
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            payload = %payload,
                            "Failed to parse invalidation payload"
                        );
                    }
                }
            }
            None => {
                return Err("pub/sub connection closed".to_string());
            }
        }
    }
}
