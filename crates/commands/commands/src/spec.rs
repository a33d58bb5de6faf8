//! Fluent builders staging the precondition of a conditional mutation.
//!
//! A builder starts unconditional. [`DeleteSpec::if_equals`] and
//! [`DeleteSpec::if_not_equals`] pick the operator and hand out a
//! [`ComparisonSpec`], whose [`value`](ComparisonSpec::value) or
//! [`digest`](ComparisonSpec::digest) stages the comparand and returns the
//! builder. Staging a value replaces a staged digest and vice versa.
//! [`always`](DeleteSpec::always) drops any staged comparison.

use std::time::Duration;

use bytes::Bytes;
use redbind_core::{CompareCondition, ComparisonOperator};

use crate::connection::SetOptions;
use crate::error::CommandError;

/// The comparand currently staged by a builder.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Staged<V> {
    Always,
    /// An operator was chosen but no comparand followed yet.
    Pending,
    Value(V),
    Digest(String),
}

#[derive(Debug, Clone)]
struct Staging<V> {
    operator: ComparisonOperator,
    staged: Staged<V>,
}

impl<V> Staging<V> {
    fn new() -> Self {
        Self {
            operator: ComparisonOperator::Equals,
            staged: Staged::Always,
        }
    }

    fn select(&mut self, operator: ComparisonOperator) {
        self.operator = operator;
        if matches!(self.staged, Staged::Always) {
            self.staged = Staged::Pending;
        }
    }

    fn is_conditional(&self) -> bool {
        !matches!(self.staged, Staged::Always)
    }

    fn to_compare_condition<F>(
        &self,
        serializer: F,
    ) -> Result<Option<CompareCondition>, CommandError>
    where
        F: FnOnce(&V) -> Result<Bytes, CommandError>,
    {
        let condition = match &self.staged {
            Staged::Always => return Ok(None),
            Staged::Pending => {
                return Err(CommandError::InvalidState(format!(
                    "{} comparison selected but neither a value nor a digest was staged",
                    self.operator
                )));
            }
            Staged::Value(value) => {
                let bytes = serializer(value)?;
                match self.operator {
                    ComparisonOperator::Equals => CompareCondition::if_equals(bytes),
                    ComparisonOperator::NotEquals => CompareCondition::if_not_equals(bytes),
                }
            }
            Staged::Digest(digest) => match self.operator {
                ComparisonOperator::Equals => CompareCondition::if_digest_equals(digest.clone()),
                ComparisonOperator::NotEquals => {
                    CompareCondition::if_digest_not_equals(digest.clone())
                }
            },
        };
        Ok(Some(condition))
    }
}

/// Second step of a conditional builder: choose what to compare against.
#[derive(Debug, Clone)]
#[must_use = "call `value` or `digest` to stage the comparand"]
pub struct ComparisonSpec<S> {
    spec: S,
}

impl<V> ComparisonSpec<DeleteSpec<V>> {
    /// Compare against `value`, serialized when the condition is materialized.
    pub fn value(mut self, value: V) -> DeleteSpec<V> {
        self.spec.staging.staged = Staged::Value(value);
        self.spec
    }

    /// Compare against the hex digest of the stored value, as returned by the
    /// `DIGEST` command.
    pub fn digest(mut self, digest: impl Into<String>) -> DeleteSpec<V> {
        self.spec.staging.staged = Staged::Digest(digest.into());
        self.spec
    }
}

impl<V> ComparisonSpec<SetSpec<V>> {
    /// Compare against `value`, serialized with the same serializer as the
    /// value being written.
    pub fn value(mut self, value: V) -> SetSpec<V> {
        self.spec.staging.staged = Staged::Value(value);
        self.spec
    }

    /// Compare against the hex digest of the stored value.
    pub fn digest(mut self, digest: impl Into<String>) -> SetSpec<V> {
        self.spec.staging.staged = Staged::Digest(digest.into());
        self.spec
    }
}

/// Builder for a (possibly conditional) delete.
///
/// ```
/// use bytes::Bytes;
/// use redbind_commands::DeleteSpec;
/// use redbind_core::CompareCondition;
///
/// let spec = DeleteSpec::new().if_equals().value("v1".to_owned());
/// let condition = spec
///     .to_compare_condition(|v| Ok(Bytes::from(v.clone())))
///     .unwrap();
/// assert_eq!(condition, Some(CompareCondition::if_equals("v1")));
/// ```
#[derive(Debug, Clone)]
pub struct DeleteSpec<V> {
    staging: Staging<V>,
}

impl<V> DeleteSpec<V> {
    /// Create an unconditional delete.
    pub fn new() -> Self {
        Self {
            staging: Staging::new(),
        }
    }

    /// Delete the key unconditionally, dropping any staged comparison.
    #[must_use]
    pub fn always(mut self) -> Self {
        self.staging.staged = Staged::Always;
        self
    }

    /// Delete only if the stored value (or its digest) matches.
    pub fn if_equals(mut self) -> ComparisonSpec<Self> {
        self.staging.select(ComparisonOperator::Equals);
        ComparisonSpec { spec: self }
    }

    /// Delete only if the stored value (or its digest) does not match.
    pub fn if_not_equals(mut self) -> ComparisonSpec<Self> {
        self.staging.select(ComparisonOperator::NotEquals);
        ComparisonSpec { spec: self }
    }

    pub fn is_conditional(&self) -> bool {
        self.staging.is_conditional()
    }

    /// Materialize the staged comparison.
    ///
    /// Returns `Ok(None)` for an unconditional delete. `serializer` is only
    /// invoked for by-value comparisons, and at most once.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidState`] if an operator was chosen but no
    /// value or digest followed, and propagates serializer failures.
    pub fn to_compare_condition<F>(
        &self,
        serializer: F,
    ) -> Result<Option<CompareCondition>, CommandError>
    where
        F: FnOnce(&V) -> Result<Bytes, CommandError>,
    {
        self.staging.to_compare_condition(serializer)
    }
}

impl<V> Default for DeleteSpec<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> From<ComparisonSpec<DeleteSpec<V>>> for DeleteSpec<V> {
    fn from(spec: ComparisonSpec<DeleteSpec<V>>) -> Self {
        spec.spec
    }
}

/// Builder for a (possibly conditional) `SET`, with an optional expiration.
#[derive(Debug, Clone)]
pub struct SetSpec<V> {
    staging: Staging<V>,
    expiration: Option<Duration>,
}

impl<V> SetSpec<V> {
    /// Create an unconditional set without expiration.
    pub fn new() -> Self {
        Self {
            staging: Staging::new(),
            expiration: None,
        }
    }

    /// Write unconditionally, dropping any staged comparison.
    #[must_use]
    pub fn always(mut self) -> Self {
        self.staging.staged = Staged::Always;
        self
    }

    /// Write only if the stored value (or its digest) matches.
    pub fn if_equals(mut self) -> ComparisonSpec<Self> {
        self.staging.select(ComparisonOperator::Equals);
        ComparisonSpec { spec: self }
    }

    /// Write only if the stored value (or its digest) does not match, or the
    /// key does not exist.
    pub fn if_not_equals(mut self) -> ComparisonSpec<Self> {
        self.staging.select(ComparisonOperator::NotEquals);
        ComparisonSpec { spec: self }
    }

    /// Expire the key `ttl` after the write.
    #[must_use]
    pub fn expire(mut self, ttl: Duration) -> Self {
        self.expiration = Some(ttl);
        self
    }

    pub fn expiration(&self) -> Option<Duration> {
        self.expiration
    }

    pub fn is_conditional(&self) -> bool {
        self.staging.is_conditional()
    }

    /// Materialize the staged comparison. See [`DeleteSpec::to_compare_condition`].
    pub fn to_compare_condition<F>(
        &self,
        serializer: F,
    ) -> Result<Option<CompareCondition>, CommandError>
    where
        F: FnOnce(&V) -> Result<Bytes, CommandError>,
    {
        self.staging.to_compare_condition(serializer)
    }

    /// Materialize the staged comparison and expiration into [`SetOptions`].
    pub fn to_set_options<F>(&self, serializer: F) -> Result<SetOptions, CommandError>
    where
        F: FnOnce(&V) -> Result<Bytes, CommandError>,
    {
        Ok(SetOptions {
            condition: self.to_compare_condition(serializer)?,
            expiration: self.expiration,
        })
    }
}

impl<V> Default for SetSpec<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> From<ComparisonSpec<SetSpec<V>>> for SetSpec<V> {
    fn from(spec: ComparisonSpec<SetSpec<V>>) -> Self {
        spec.spec
    }
}
