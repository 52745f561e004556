//! Application state shared by the admin handlers.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use mentorhub_bus::InvalidationBus;
use mentorhub_cache::CacheService;

use crate::warmup::WarmupSource;

/// State for the cache admin surface.
#[derive(Clone)]
pub struct AppState {
    /// The cache engine.
    pub cache: Arc<CacheService>,

    /// Invalidation bus; admin clears publish through it exactly like
    /// organic writers.
    pub bus: InvalidationBus,

    /// Working-set directory for warm-up.
    pub warmup: Arc<dyn WarmupSource>,

    /// Liveness of the invalidation listener, for health reporting.
    pub listener_alive: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        cache: Arc<CacheService>,
        bus: InvalidationBus,
        warmup: Arc<dyn WarmupSource>,
        listener_alive: Arc<AtomicBool>,
    ) -> Self {
        Self {
            cache,
            bus,
            warmup,
            listener_alive,
        }
    }
}
