use std::path::Path;

use anyhow::Context;
use redbind_commands_redis::RedisConfig;
use redbind_listener::ListenerConfig;
use serde::Deserialize;

/// Contents of the CLI configuration file.
///
/// ```toml
/// [redis]
/// url = "redis://127.0.0.1:6379"
/// prefix = "app"
///
/// [[listener.listeners]]
/// topic = "orders.*"
/// bean = "orders"
/// method = "on_order"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub redis: RedisConfig,
    pub listener: ListenerConfig,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.listener.validate()?;
        Ok(config)
    }
}
