use std::{env, sync::Arc};

use mentorhub_bus::{InvalidationBus, InvalidationListener};
use mentorhub_cache::CacheService;
use mentorhub_server::config::loader::load_config;
use mentorhub_server::warmup::StaticWarmupSource;
use mentorhub_server::{AppState, ServerBuilder, create_cache_backend};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From MENTORHUB_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (mentorhub.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (MENTORHUB_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

fn resolve_config_path() -> (String, ConfigSource) {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (path, ConfigSource::CliArgument);
            }
        }
    }

    if let Ok(path) = env::var("MENTORHUB_CONFIG") {
        return (path, ConfigSource::EnvironmentVariable);
    }

    ("mentorhub.toml".to_string(), ConfigSource::Default)
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // Initialize tracing early with the default level
    mentorhub_server::observability::init_tracing();

    // Parse config path from CLI, environment, or use default
    let (config_path, source) = resolve_config_path();

    // Load configuration
    let cfg = match load_config(Some(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    tracing::info!(
        path = %config_path,
        source = %source,
        "Configuration loaded"
    );

    mentorhub_server::observability::apply_logging_level(&cfg.logging.level);
    mentorhub_server::metrics::init_metrics();

    // Namespace registry is immutable after this point.
    let registry = match cfg.namespace_registry() {
        Ok(r) => Arc::new(r),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    // Cache backend (Redis with graceful local fallback) and engine.
    let backend = create_cache_backend(&cfg.redis).await;
    let cache = Arc::new(CacheService::new(backend, registry));

    // Invalidation bus + listener. The bus publishes to Redis only when the
    // backend actually came up in Redis mode.
    let bus = match cache.backend().redis_pool() {
        Some(pool) => InvalidationBus::new_redis(pool.clone()),
        None => InvalidationBus::new_local(),
    };

    let mut listener = InvalidationListener::new(Arc::clone(&cache), bus.clone());
    if cache.backend().redis_pool().is_some() {
        listener = listener.with_redis_url(&cfg.redis.url);
    }
    let listener_alive = listener.liveness();
    listener.start();

    // The working-set directory is deployment-specific; wire a real
    // WarmupSource here when an authoritative store client is available.
    let warmup = Arc::new(StaticWarmupSource::empty());

    let state = AppState::new(cache, bus, warmup, listener_alive);

    if cfg.cache.warmup_on_start {
        match mentorhub_server::run_warmup(&state.cache, state.warmup.as_ref(), None, None).await {
            Ok(report) => tracing::info!(warmed = report.warmed, "startup warm-up done"),
            Err(e) => tracing::warn!(error = %e, "startup warm-up failed"),
        }
    }

    let server = ServerBuilder::new(state).with_config(cfg).build();
    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
