use std::sync::{Arc, LazyLock};

use redbind_core::Topic;
use redbind_core::glob::contains_pattern_globs;

use crate::cache::LruCache;
use crate::error::ListenerError;

/// Turns a destination name into a channel or pattern [`Topic`].
pub trait TopicResolver: Send + Sync {
    fn resolve(&self, destination: &str) -> Result<Topic, ListenerError>;
}

/// Default [`TopicResolver`] with a bounded cache per topic kind.
///
/// A destination is a pattern if it contains an unescaped `?`, `*` or `[`.
/// Each glob character is checked on its own, so `a\*b?` is a pattern because
/// of its `?`.
#[derive(Debug)]
pub struct SimpleTopicResolver {
    channels: LruCache<Topic>,
    patterns: LruCache<Topic>,
}

impl SimpleTopicResolver {
    pub fn new() -> Self {
        Self::with_capacity(LruCache::<Topic>::DEFAULT_CAPACITY)
    }

    /// Create a resolver whose channel and pattern caches each hold
    /// `capacity` topics.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: LruCache::new(capacity, |name: &str| Topic::channel(name)),
            patterns: LruCache::new(capacity, |pattern: &str| Topic::pattern(pattern)),
        }
    }

    pub fn cached_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn cached_patterns(&self) -> usize {
        self.patterns.len()
    }
}

impl Default for SimpleTopicResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicResolver for SimpleTopicResolver {
    fn resolve(&self, destination: &str) -> Result<Topic, ListenerError> {
        if destination.trim().is_empty() {
            return Err(ListenerError::InvalidTopic {
                topic: destination.to_owned(),
                reason: "destination must not be blank".into(),
            });
        }
        if contains_pattern_globs(destination) {
            Ok(self.patterns.get(destination))
        } else {
            Ok(self.channels.get(destination))
        }
    }
}

static DEFAULT_RESOLVER: LazyLock<Arc<SimpleTopicResolver>> =
    LazyLock::new(|| Arc::new(SimpleTopicResolver::new()));

/// The process-wide resolver endpoints use unless given their own.
pub fn default_resolver() -> Arc<dyn TopicResolver> {
    DEFAULT_RESOLVER.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_patterns() {
        let resolver = SimpleTopicResolver::new();
        for destination in ["news.*", "a?c", "[abc]"] {
            let topic = resolver.resolve(destination).unwrap();
            assert!(topic.is_pattern(), "{destination} should be a pattern");
            assert_eq!(topic.name(), destination);
        }
    }

    #[test]
    fn classifies_channels() {
        let resolver = SimpleTopicResolver::new();
        for destination in ["news.tech", "a\\*c", "*\\*"] {
            let topic = resolver.resolve(destination).unwrap();
            assert_eq!(topic, Topic::channel(destination));
        }
    }

    #[test]
    fn escaping_is_per_glob_character() {
        let resolver = SimpleTopicResolver::new();
        let topic = resolver.resolve("a\\*b?").unwrap();
        assert!(topic.is_pattern());
    }

    #[test]
    fn blank_destination_is_rejected() {
        let resolver = SimpleTopicResolver::new();
        for destination in ["", "   "] {
            let err = resolver.resolve(destination).unwrap_err();
            assert!(matches!(err, ListenerError::InvalidTopic { .. }));
        }
        assert_eq!(resolver.cached_channels(), 0);
        assert_eq!(resolver.cached_patterns(), 0);
    }

    #[test]
    fn caches_are_independent() {
        let resolver = SimpleTopicResolver::with_capacity(2);
        resolver.resolve("orders.*").unwrap();
        resolver.resolve("orders.created").unwrap();
        resolver.resolve("orders.created").unwrap();
        assert_eq!(resolver.cached_patterns(), 1);
        assert_eq!(resolver.cached_channels(), 1);
    }

    #[test]
    fn repeated_resolution_shares_the_name() {
        let resolver = SimpleTopicResolver::new();
        let first = resolver.resolve("orders.*").unwrap();
        let second = resolver.resolve("orders.*").unwrap();
        let (Topic::Pattern(a), Topic::Pattern(b)) = (&first, &second) else {
            panic!("expected pattern topics");
        };
        assert!(Arc::ptr_eq(a, b));
    }
}
