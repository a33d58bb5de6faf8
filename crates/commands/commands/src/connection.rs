use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redbind_core::CompareCondition;

use crate::error::CommandError;

/// Options of a `SET` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Precondition the server verifies before writing. `None` writes
    /// unconditionally.
    pub condition: Option<CompareCondition>,
    /// Expiration applied with the write (`PX`).
    pub expiration: Option<Duration>,
}

impl SetOptions {
    #[must_use]
    pub fn with_condition(mut self, condition: CompareCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = Some(expiration);
        self
    }
}

/// Key commands dispatched to a backend.
///
/// Implementations translate a [`CompareCondition`] into the matching server
/// modifier and must evaluate it atomically with the mutation. They must be
/// `Send + Sync` and safe for concurrent access.
#[async_trait]
pub trait KeyCommands: Send + Sync {
    /// Get the value stored at `key`.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CommandError>;

    /// Set `key` to `value`. Returns `false` if a condition was given and did
    /// not hold, in which case nothing was written.
    ///
    /// On a missing key, `IFEQ`/`IFDEQ` conditions never hold and
    /// `IFNE`/`IFDNE` conditions always hold.
    async fn set(&self, key: &str, value: Bytes, options: &SetOptions)
    -> Result<bool, CommandError>;

    /// Delete `key`, optionally only if `condition` holds. Returns `true` if
    /// the key was removed. A missing key is never removed.
    async fn delete(
        &self,
        key: &str,
        condition: Option<&CompareCondition>,
    ) -> Result<bool, CommandError>;

    /// Return the hex digest of the value stored at `key`.
    async fn digest(&self, key: &str) -> Result<Option<String>, CommandError>;
}
