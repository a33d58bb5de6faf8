use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::connection::{KeyCommands, SetOptions};
use crate::error::CommandError;
use crate::serializer::ValueSerializer;
use crate::spec::{DeleteSpec, SetSpec};

/// Typed value operations over a [`KeyCommands`] backend.
///
/// The same serializer encodes written values and by-value comparands, so a
/// value written through this template compares equal to itself.
pub struct ValueOperations<V, S> {
    commands: Arc<dyn KeyCommands>,
    serializer: S,
    _value: PhantomData<fn() -> V>,
}

impl<V, S> ValueOperations<V, S>
where
    S: ValueSerializer<V>,
{
    pub fn new(commands: Arc<dyn KeyCommands>, serializer: S) -> Self {
        Self {
            commands,
            serializer,
            _value: PhantomData,
        }
    }

    pub fn serializer(&self) -> &S {
        &self.serializer
    }

    /// Get and deserialize the value stored at `key`.
    pub async fn get(&self, key: &str) -> Result<Option<V>, CommandError> {
        match self.commands.get(key).await? {
            Some(bytes) => self.serializer.deserialize(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Set `key` to `value` unconditionally.
    pub async fn set(&self, key: &str, value: &V) -> Result<(), CommandError> {
        let bytes = self.serializer.serialize(value)?;
        self.commands
            .set(key, bytes, &SetOptions::default())
            .await
            .map(|_| ())
    }

    /// Set `key` to `value` if the condition staged by `configure` holds.
    ///
    /// Returns `false` if the condition did not hold. A builder left with an
    /// operator but no comparand fails before any command is sent.
    pub async fn set_if<F, R>(
        &self,
        key: &str,
        value: &V,
        configure: F,
    ) -> Result<bool, CommandError>
    where
        F: FnOnce(SetSpec<V>) -> R,
        R: Into<SetSpec<V>>,
    {
        let spec: SetSpec<V> = configure(SetSpec::new()).into();
        let options = spec.to_set_options(|comparand| self.serializer.serialize(comparand))?;
        let bytes = self.serializer.serialize(value)?;

        let written = self.commands.set(key, bytes, &options).await?;
        debug!(
            key,
            condition = ?options.condition.as_ref().map(|c| c.keyword()),
            written,
            "conditional set dispatched"
        );
        Ok(written)
    }

    /// Delete `key` unconditionally. Returns `true` if it existed.
    pub async fn delete(&self, key: &str) -> Result<bool, CommandError> {
        self.commands.delete(key, None).await
    }

    /// Delete `key` if the condition staged by `configure` holds.
    ///
    /// ```ignore
    /// ops.delete_if("lock:a", |spec| spec.if_equals().value(owner)).await?;
    /// ops.delete_if("doc:1", |spec| spec.if_not_equals().digest(&digest)).await?;
    /// ```
    pub async fn delete_if<F, R>(&self, key: &str, configure: F) -> Result<bool, CommandError>
    where
        F: FnOnce(DeleteSpec<V>) -> R,
        R: Into<DeleteSpec<V>>,
    {
        let spec: DeleteSpec<V> = configure(DeleteSpec::new()).into();
        let condition =
            spec.to_compare_condition(|comparand| self.serializer.serialize(comparand))?;

        let deleted = self.commands.delete(key, condition.as_ref()).await?;
        debug!(
            key,
            condition = ?condition.as_ref().map(|c| c.keyword()),
            deleted,
            "conditional delete dispatched"
        );
        Ok(deleted)
    }

    /// Return the digest of the value stored at `key`, for later digest
    /// comparisons.
    pub async fn digest(&self, key: &str) -> Result<Option<String>, CommandError> {
        self.commands.digest(key).await
    }
}

impl<V, S: std::fmt::Debug> std::fmt::Debug for ValueOperations<V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueOperations")
            .field("serializer", &self.serializer)
            .finish_non_exhaustive()
    }
}
