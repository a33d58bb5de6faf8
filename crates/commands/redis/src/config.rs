use std::time::Duration;

use serde::Deserialize;

/// Configuration for the Redis key command backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis connection URL (e.g. `redis://127.0.0.1:6379`).
    pub url: String,

    /// Key prefix prepended as `prefix:key` to every key. No prefix when unset.
    pub prefix: Option<String>,

    /// Number of connections in the `deadpool-redis` pool.
    pub pool_size: usize,

    /// Timeout for acquiring a pooled connection, in milliseconds.
    pub connection_timeout_ms: u64,
}

impl RedisConfig {
    /// Create a configuration for `url` with default pool settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    /// Render the Redis key for `key`, applying the prefix if configured.
    pub fn render_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{key}"),
            None => key.to_owned(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::from("redis://127.0.0.1:6379"),
            prefix: None,
            pool_size: 10,
            connection_timeout_ms: 5_000,
        }
    }
}
