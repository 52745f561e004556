use std::collections::BTreeMap;
use std::{net::SocketAddr, time::Duration};

use serde::{Deserialize, Serialize};

use mentorhub_cache::NamespaceRegistry;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Redis configuration
    #[serde(default)]
    pub redis: RedisConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Redis validations
        if self.redis.enabled {
            if self.redis.url.is_empty() {
                return Err("redis.enabled=true requires redis.url".into());
            }
            if self.redis.pool_size == 0 {
                return Err("redis.pool_size must be > 0".into());
            }
            if self.redis.timeout_ms == 0 {
                return Err("redis.timeout_ms must be > 0".into());
            }
        }
        // Cache validations: TTL overrides must name registered namespaces
        if let Err(e) = NamespaceRegistry::with_ttl_overrides(&self.cache.ttl_overrides_secs) {
            return Err(format!("cache.ttl_overrides_secs error: {e}"));
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    /// Builds the namespace registry with this config's TTL overrides.
    /// Call after `validate()`; overrides were checked there.
    pub fn namespace_registry(&self) -> Result<NamespaceRegistry, String> {
        NamespaceRegistry::with_ttl_overrides(&self.cache.ttl_overrides_secs)
            .map_err(|e| format!("cache.ttl_overrides_secs error: {e}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Redis configuration for horizontal scaling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Enable Redis (gracefully degrades without it)
    /// Default: false (disabled for single-instance deployments)
    #[serde(default = "default_redis_enabled")]
    pub enabled: bool,

    /// Redis connection URL (e.g., "redis://localhost:6379")
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in milliseconds
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_redis_enabled() -> bool {
    false
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    5000
}

impl RedisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: default_redis_enabled(),
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Per-namespace TTL overrides in seconds; 0 means never expire.
    /// Keys must be registered namespace names (a typo fails startup).
    #[serde(default)]
    pub ttl_overrides_secs: BTreeMap<String, u64>,

    /// Run the warm-up pass for the configured working set at startup.
    #[serde(default = "default_warmup_on_start")]
    pub warmup_on_start: bool,
}

fn default_warmup_on_start() -> bool {
    false
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_overrides_secs: BTreeMap::new(),
            warmup_on_start: default_warmup_on_start(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                // Try default root-level file
                let default_path = PathBuf::from("mentorhub.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., MENTORHUB__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("MENTORHUB")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        // Validate
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.server.port, 8080);
        assert!(!cfg.redis.enabled);
    }

    #[test]
    fn test_addr_falls_back_to_any() {
        let mut cfg = AppConfig::default();
        cfg.server.host = "not-an-ip".to_string();
        assert_eq!(cfg.addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_redis_enabled_requires_url() {
        let mut cfg = AppConfig::default();
        cfg.redis.enabled = true;
        cfg.redis.url = String::new();
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("redis.url"));
    }

    #[test]
    fn test_unknown_ttl_override_rejected() {
        let mut cfg = AppConfig::default();
        cfg.cache
            .ttl_overrides_secs
            .insert("menteeProfiles".to_string(), 60);
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("ttl_overrides_secs"));
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "loud".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_namespace_registry_applies_overrides() {
        use mentorhub_cache::{Namespace, Ttl};

        let mut cfg = AppConfig::default();
        cfg.cache
            .ttl_overrides_secs
            .insert("mentor".to_string(), 42);
        let registry = cfg.namespace_registry().unwrap();
        assert_eq!(
            registry.ttl(Namespace::Mentor),
            Ttl::Finite(Duration::from_secs(42))
        );
    }
}
