use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use redbind_core::{Message, Topic};
use tracing::{debug, trace};

use crate::error::ListenerError;
use crate::listener::MessageListener;

/// Subscribes listeners to topics and dispatches incoming messages to them.
///
/// Listeners are identified by their allocation: removing a listener drops
/// every subscription made with a clone of the same `Arc`.
pub trait ListenerContainer: Send + Sync {
    fn add_message_listener(
        &self,
        listener: Arc<dyn MessageListener>,
        topic: Topic,
    ) -> Result<(), ListenerError>;

    fn remove_message_listener(
        &self,
        listener: &Arc<dyn MessageListener>,
    ) -> Result<(), ListenerError>;
}

/// Return `true` if both handles point at the same listener.
pub fn same_listener(a: &Arc<dyn MessageListener>, b: &Arc<dyn MessageListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

struct Subscription {
    listener: Arc<dyn MessageListener>,
    topic: Topic,
}

/// In-process [`ListenerContainer`].
///
/// [`publish`](Self::publish) delivers synchronously on the caller's thread
/// to every subscription whose topic matches the channel.
#[derive(Default)]
pub struct MemoryListenerContainer {
    subscriptions: RwLock<Vec<Subscription>>,
}

impl MemoryListenerContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `payload` on `channel`. Returns the number of deliveries.
    pub fn publish(&self, channel: &str, payload: impl Into<Bytes>) -> usize {
        let message = Message::new(Bytes::copy_from_slice(channel.as_bytes()), payload.into());
        let targets: Vec<(Arc<dyn MessageListener>, Topic)> = self
            .subscriptions
            .read()
            .iter()
            .filter(|s| s.topic.matches(message.channel()))
            .map(|s| (Arc::clone(&s.listener), s.topic.clone()))
            .collect();

        for (listener, topic) in &targets {
            let pattern = topic.is_pattern().then(|| topic.name().as_bytes());
            listener.on_message(&message, pattern);
        }
        trace!(channel, deliveries = targets.len(), "message published");
        targets.len()
    }

    /// Topics currently subscribed, in subscription order.
    pub fn topics(&self) -> Vec<Topic> {
        self.subscriptions
            .read()
            .iter()
            .map(|s| s.topic.clone())
            .collect()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }
}

impl ListenerContainer for MemoryListenerContainer {
    fn add_message_listener(
        &self,
        listener: Arc<dyn MessageListener>,
        topic: Topic,
    ) -> Result<(), ListenerError> {
        let mut subscriptions = self.subscriptions.write();
        let duplicate = subscriptions
            .iter()
            .any(|s| s.topic == topic && same_listener(&s.listener, &listener));
        if !duplicate {
            debug!(topic = %topic, pattern = topic.is_pattern(), "listener subscribed");
            subscriptions.push(Subscription { listener, topic });
        }
        Ok(())
    }

    fn remove_message_listener(
        &self,
        listener: &Arc<dyn MessageListener>,
    ) -> Result<(), ListenerError> {
        let mut subscriptions = self.subscriptions.write();
        let before = subscriptions.len();
        subscriptions.retain(|s| !same_listener(&s.listener, listener));
        debug!(removed = before - subscriptions.len(), "listener unsubscribed");
        Ok(())
    }
}

impl fmt::Debug for MemoryListenerContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryListenerContainer")
            .field("topics", &self.topics())
            .finish()
    }
}
