use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use redbind_core::{MessageEnvelope, MessageHeaders};
use serde::de::DeserializeOwned;

use crate::error::{HandlerError, ListenerError};

/// An invocable handler bound to a (bean, method) pair.
pub trait HandlerMethod: Send + Sync {
    fn invoke(&self, envelope: &MessageEnvelope) -> Result<(), HandlerError>;
}

/// Resolves the handler for a (bean, method) pair.
///
/// Called once per endpoint, when it is registered.
pub trait HandlerMethodFactory: Send + Sync {
    fn create(&self, bean: &str, method: &str) -> Result<Arc<dyn HandlerMethod>, ListenerError>;
}

struct FnHandler<F>(F);

impl<F> HandlerMethod for FnHandler<F>
where
    F: Fn(&MessageEnvelope) -> Result<(), HandlerError> + Send + Sync,
{
    fn invoke(&self, envelope: &MessageEnvelope) -> Result<(), HandlerError> {
        (self.0)(envelope)
    }
}

/// Wrap a closure receiving the raw envelope.
pub fn handler_fn<F>(f: F) -> Arc<dyn HandlerMethod>
where
    F: Fn(&MessageEnvelope) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

struct JsonHandler<T, F> {
    f: F,
    _payload: PhantomData<fn() -> T>,
}

impl<T, F> HandlerMethod for JsonHandler<T, F>
where
    T: DeserializeOwned,
    F: Fn(T, &MessageHeaders) -> Result<(), HandlerError> + Send + Sync,
{
    fn invoke(&self, envelope: &MessageEnvelope) -> Result<(), HandlerError> {
        let payload: T = serde_json::from_slice(envelope.payload())
            .map_err(|e| HandlerError::Conversion(e.to_string()))?;
        (self.f)(payload, envelope.headers())
    }
}

/// Wrap a closure receiving the payload deserialized from JSON.
///
/// A payload that does not deserialize into `T` fails with
/// [`HandlerError::Conversion`] without calling `f`.
pub fn json_handler<T, F>(f: F) -> Arc<dyn HandlerMethod>
where
    T: DeserializeOwned + 'static,
    F: Fn(T, &MessageHeaders) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    Arc::new(JsonHandler {
        f,
        _payload: PhantomData,
    })
}

/// A [`HandlerMethodFactory`] backed by a table of named handlers.
#[derive(Default, Clone)]
pub struct HandlerTable {
    handlers: HashMap<(String, String), Arc<dyn HandlerMethod>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler, replacing any previous one for the same pair.
    #[must_use]
    pub fn with(
        mut self,
        bean: impl Into<String>,
        method: impl Into<String>,
        handler: Arc<dyn HandlerMethod>,
    ) -> Self {
        self.insert(bean, method, handler);
        self
    }

    pub fn insert(
        &mut self,
        bean: impl Into<String>,
        method: impl Into<String>,
        handler: Arc<dyn HandlerMethod>,
    ) {
        self.handlers.insert((bean.into(), method.into()), handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl HandlerMethodFactory for HandlerTable {
    fn create(&self, bean: &str, method: &str) -> Result<Arc<dyn HandlerMethod>, ListenerError> {
        self.handlers
            .get(&(bean.to_owned(), method.to_owned()))
            .cloned()
            .ok_or_else(|| ListenerError::HandlerNotFound {
                bean: bean.to_owned(),
                method: method.to_owned(),
            })
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self
            .handlers
            .keys()
            .map(|(bean, method)| format!("{bean}.{method}"))
            .collect();
        names.sort_unstable();
        f.debug_struct("HandlerTable")
            .field("handlers", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use parking_lot::Mutex;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Order {
        id: u64,
    }

    fn envelope(payload: &'static str) -> MessageEnvelope {
        MessageEnvelope::new(
            Bytes::from_static(payload.as_bytes()),
            MessageHeaders::for_delivery("orders.created", Some("orders.*")),
        )
    }

    #[test]
    fn table_resolves_registered_handlers() {
        let table = HandlerTable::new().with("orders", "on_order", handler_fn(|_| Ok(())));
        assert_eq!(table.len(), 1);
        assert!(table.create("orders", "on_order").is_ok());

        let err = table.create("orders", "missing").err().unwrap();
        assert!(matches!(err, ListenerError::HandlerNotFound { .. }));
    }

    #[test]
    fn json_handler_deserializes_payload() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = json_handler(move |order: Order, headers: &MessageHeaders| {
            sink.lock().push((order, headers.topic.name().to_owned()));
            Ok(())
        });

        handler.invoke(&envelope(r#"{"id":7}"#)).unwrap();
        assert_eq!(
            seen.lock().as_slice(),
            &[(Order { id: 7 }, "orders.*".to_owned())]
        );
    }

    #[test]
    fn json_handler_reports_conversion_failure() {
        let handler = json_handler(|_: Order, _: &MessageHeaders| -> Result<(), HandlerError> {
            panic!("must not be called");
        });
        let err = handler.invoke(&envelope("not json")).unwrap_err();
        assert!(matches!(err, HandlerError::Conversion(_)));
    }
}
