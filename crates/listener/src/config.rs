use std::path::Path;
use std::sync::Arc;

use redbind_core::Topic;
use serde::Deserialize;

use crate::cache::LruCache;
use crate::error::ListenerError;
use crate::registrar::ListenerDefinition;
use crate::resolver::{SimpleTopicResolver, TopicResolver};

/// Listener configuration, usually loaded from TOML:
///
/// ```toml
/// topic_cache_capacity = 64
///
/// [[listeners]]
/// id = "orders"
/// topic = "orders.*"
/// bean = "orders"
/// method = "on_order"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Capacity of each topic cache of the resolver.
    pub topic_cache_capacity: usize,
    pub listeners: Vec<ListenerDefinition>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            topic_cache_capacity: LruCache::<Topic>::DEFAULT_CAPACITY,
            listeners: Vec::new(),
        }
    }
}

impl ListenerConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ListenerError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ListenerError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ListenerError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ListenerError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&contents)
    }

    /// Build a resolver sized by [`topic_cache_capacity`](Self::topic_cache_capacity).
    pub fn resolver(&self) -> Arc<dyn TopicResolver> {
        Arc::new(SimpleTopicResolver::with_capacity(self.topic_cache_capacity))
    }

    /// Check that every listener names a topic, a bean and a method.
    pub fn validate(&self) -> Result<(), ListenerError> {
        for (index, listener) in self.listeners.iter().enumerate() {
            for (field, value) in [
                ("topic", &listener.topic),
                ("bean", &listener.bean),
                ("method", &listener.method),
            ] {
                if value.trim().is_empty() {
                    return Err(ListenerError::Configuration(format!(
                        "listeners[{index}].{field} must not be blank"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ListenerConfig::from_toml("").unwrap();
        assert_eq!(config, ListenerConfig::default());
        assert_eq!(config.topic_cache_capacity, 32);
    }

    #[test]
    fn parses_listeners() {
        let config = ListenerConfig::from_toml(
            r#"
            topic_cache_capacity = 8

            [[listeners]]
            id = "orders"
            topic = "orders.*"
            bean = "orders"
            method = "on_order"

            [[listeners]]
            container = "audit"
            topic = "audit"
            bean = "audit"
            method = "record"
            "#,
        )
        .unwrap();

        assert_eq!(config.topic_cache_capacity, 8);
        assert!(config.resolver().resolve("orders.*").unwrap().is_pattern());
        assert_eq!(
            config.listeners,
            vec![
                ListenerDefinition::new("orders.*", "orders", "on_order").with_id("orders"),
                ListenerDefinition::new("audit", "audit", "record").with_container("audit"),
            ]
        );
    }

    #[test]
    fn missing_field_is_a_configuration_error() {
        let err = ListenerConfig::from_toml(
            r#"
            [[listeners]]
            topic = "orders"
            bean = "orders"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ListenerError::Configuration(_)));
    }

    #[test]
    fn blank_method_is_rejected() {
        let err = ListenerConfig::from_toml(
            r#"
            [[listeners]]
            topic = "orders"
            bean = "orders"
            method = " "
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("listeners[0].method"));
    }

    #[test]
    fn load_missing_file() {
        let err = ListenerConfig::load(Path::new("/nonexistent/redbind.toml")).unwrap_err();
        assert!(matches!(err, ListenerError::Configuration(_)));
    }
}
