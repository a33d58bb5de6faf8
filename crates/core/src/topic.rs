use std::fmt;
use std::sync::Arc;

use crate::glob;

/// An addressable Pub/Sub destination.
///
/// Cloning is cheap: the name is shared behind an [`Arc`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// A literal channel name (`SUBSCRIBE`).
    Channel(Arc<str>),
    /// A glob pattern matching many channels (`PSUBSCRIBE`).
    Pattern(Arc<str>),
}

impl Topic {
    /// Create a channel topic.
    pub fn channel(name: impl Into<Arc<str>>) -> Self {
        Self::Channel(name.into())
    }

    /// Create a pattern topic.
    pub fn pattern(pattern: impl Into<Arc<str>>) -> Self {
        Self::Pattern(pattern.into())
    }

    /// Return the channel name or pattern.
    pub fn name(&self) -> &str {
        match self {
            Self::Channel(name) | Self::Pattern(name) => name,
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern(_))
    }

    /// Return `true` if a message published on `channel` is delivered to a
    /// subscription on this topic.
    pub fn matches(&self, channel: &[u8]) -> bool {
        match self {
            Self::Channel(name) => name.as_bytes() == channel,
            Self::Pattern(pattern) => glob::matches(pattern.as_bytes(), channel),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
