use std::marker::PhantomData;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CommandError;

/// Converts typed values to and from their stored byte form.
///
/// Serialization must be deterministic: by-value conditions only match if the
/// comparand is encoded exactly like the stored value was.
pub trait ValueSerializer<V>: Send + Sync {
    fn serialize(&self, value: &V) -> Result<Bytes, CommandError>;

    fn deserialize(&self, bytes: &[u8]) -> Result<V, CommandError>;
}

/// UTF-8 strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSerializer;

impl ValueSerializer<String> for StringSerializer {
    fn serialize(&self, value: &String) -> Result<Bytes, CommandError> {
        Ok(Bytes::copy_from_slice(value.as_bytes()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<String, CommandError> {
        String::from_utf8(bytes.to_vec()).map_err(|e| CommandError::Serialization(e.to_string()))
    }
}

/// Raw bytes, passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesSerializer;

impl ValueSerializer<Bytes> for BytesSerializer {
    fn serialize(&self, value: &Bytes) -> Result<Bytes, CommandError> {
        Ok(value.clone())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Bytes, CommandError> {
        Ok(Bytes::copy_from_slice(bytes))
    }
}

/// JSON via `serde_json`.
///
/// Field order follows the type's `Serialize` implementation, so values of the
/// same type always encode identically. Map-typed fields should use ordered
/// maps for value comparisons to be reliable.
pub struct JsonSerializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonSerializer<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonSerializer<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for JsonSerializer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSerializer")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> ValueSerializer<T> for JsonSerializer<T>
where
    T: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &T) -> Result<Bytes, CommandError> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| CommandError::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<T, CommandError> {
        serde_json::from_slice(bytes).map_err(|e| CommandError::Serialization(e.to_string()))
    }
}
