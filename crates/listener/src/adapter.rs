use std::fmt;
use std::sync::Arc;

use redbind_core::{Message, MessageEnvelope, MessageHeaders};
use tracing::{error, trace};

use crate::error::HandlerError;
use crate::handler::HandlerMethod;
use crate::listener::MessageListener;

/// Adapts a [`HandlerMethod`] to the [`MessageListener`] contract.
///
/// Each delivery is wrapped in a [`MessageEnvelope`] whose headers carry the
/// channel, the matching topic and the pattern if any. Handler failures are
/// logged at `error` level and do not reach the container, so the
/// subscription keeps receiving messages.
pub struct HandlerMethodListenerAdapter {
    bean: String,
    method: String,
    handler: Arc<dyn HandlerMethod>,
}

impl HandlerMethodListenerAdapter {
    pub fn new(
        bean: impl Into<String>,
        method: impl Into<String>,
        handler: Arc<dyn HandlerMethod>,
    ) -> Self {
        Self {
            bean: bean.into(),
            method: method.into(),
            handler,
        }
    }

    /// Build the envelope for a delivery and invoke the handler with it.
    pub fn handle(&self, message: &Message, pattern: Option<&[u8]>) -> Result<(), HandlerError> {
        let envelope = envelope_for(message, pattern);
        self.handler.invoke(&envelope)
    }
}

fn envelope_for(message: &Message, pattern: Option<&[u8]>) -> MessageEnvelope {
    let channel = message.channel_name();
    let pattern = pattern.map(String::from_utf8_lossy);
    let headers = MessageHeaders::for_delivery(&channel, pattern.as_deref());
    MessageEnvelope::new(message.body().clone(), headers)
}

impl MessageListener for HandlerMethodListenerAdapter {
    fn on_message(&self, message: &Message, pattern: Option<&[u8]>) {
        match self.handle(message, pattern) {
            Ok(()) => trace!(bean = %self.bean, method = %self.method, "message handled"),
            Err(e) => error!(
                bean = %self.bean,
                method = %self.method,
                channel = %message.channel_name(),
                error = %e,
                "listener handler failed"
            ),
        }
    }
}

impl fmt::Debug for HandlerMethodListenerAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMethodListenerAdapter")
            .field("bean", &self.bean)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}
