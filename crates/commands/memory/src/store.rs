use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use tokio::time::Instant;
use tracing::trace;

use redbind_commands::{CommandError, KeyCommands, SetOptions};
use redbind_core::condition::Value;
use redbind_core::{CompareCondition, ComparisonOperator};

use crate::digest::{digest_matches, value_digest};

/// A single entry in the in-memory keyspace.
#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Bytes, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    /// Returns `true` if this entry has passed its TTL deadline.
    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Evaluate `condition` against the value currently stored.
fn holds(condition: &CompareCondition, stored: &[u8]) -> bool {
    let equal = match condition.value() {
        Value::Bytes(expected) => expected.as_ref() == stored,
        Value::Digest(expected) => digest_matches(expected, &value_digest(stored)),
    };
    condition.operator().apply(equal)
}

/// Whether a `SET` condition allows writing a key that does not exist.
fn holds_for_missing(condition: Option<&CompareCondition>) -> bool {
    condition.is_none_or(|c| c.operator() == ComparisonOperator::NotEquals)
}

/// In-memory [`KeyCommands`] backed by a [`DashMap`].
///
/// Conditions are evaluated while the entry's shard is locked, so a check and
/// the mutation it guards are atomic with respect to other callers. Entries
/// are lazily evicted when their TTL has elapsed.
#[derive(Debug, Default)]
pub struct MemoryKeyCommands {
    data: DashMap<String, Entry>,
}

impl MemoryKeyCommands {
    /// Create a new, empty keyspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.data.iter().filter(|e| !e.is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyCommands for MemoryKeyCommands {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CommandError> {
        if let Some(entry) = self.data.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.data.remove_if(key, |_, entry| entry.is_expired());
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        value: Bytes,
        options: &SetOptions,
    ) -> Result<bool, CommandError> {
        let condition = options.condition.as_ref();
        let written = match self.data.entry(key.to_owned()) {
            MapEntry::Occupied(mut occupied) => {
                let allowed = if occupied.get().is_expired() {
                    holds_for_missing(condition)
                } else {
                    condition.is_none_or(|c| holds(c, &occupied.get().value))
                };
                if allowed {
                    occupied.insert(Entry::new(value, options.expiration));
                }
                allowed
            }
            MapEntry::Vacant(vacant) => {
                let allowed = holds_for_missing(condition);
                if allowed {
                    vacant.insert(Entry::new(value, options.expiration));
                }
                allowed
            }
        };
        trace!(key, written, "memory set");
        Ok(written)
    }

    async fn delete(
        &self,
        key: &str,
        condition: Option<&CompareCondition>,
    ) -> Result<bool, CommandError> {
        let MapEntry::Occupied(occupied) = self.data.entry(key.to_owned()) else {
            return Ok(false);
        };
        if occupied.get().is_expired() {
            occupied.remove();
            return Ok(false);
        }
        if condition.is_none_or(|c| holds(c, &occupied.get().value)) {
            occupied.remove();
            return Ok(true);
        }
        Ok(false)
    }

    async fn digest(&self, key: &str) -> Result<Option<String>, CommandError> {
        Ok(self.get(key).await?.map(|value| value_digest(&value)))
    }
}
