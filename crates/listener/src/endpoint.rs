use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::adapter::HandlerMethodListenerAdapter;
use crate::container::ListenerContainer;
use crate::error::ListenerError;
use crate::handler::HandlerMethodFactory;
use crate::listener::MessageListener;
use crate::resolver::{TopicResolver, default_resolver};

/// Lifecycle state of a [`MethodListenerEndpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    Unregistered,
    Registered,
    Running,
    Stopped,
}

#[derive(Clone)]
struct Binding {
    container: Arc<dyn ListenerContainer>,
    listener: Arc<dyn MessageListener>,
}

enum Lifecycle {
    Unregistered,
    Registered(Binding),
    Running(Binding),
    Stopped(Binding),
}

impl Lifecycle {
    fn state(&self) -> EndpointState {
        match self {
            Self::Unregistered => EndpointState::Unregistered,
            Self::Registered(_) => EndpointState::Registered,
            Self::Running(_) => EndpointState::Running,
            Self::Stopped(_) => EndpointState::Stopped,
        }
    }
}

/// A listener endpoint invoking a named handler for messages on a topic.
///
/// State moves `Unregistered → Registered → Running ⇄ Stopped`. Transitions
/// are serialized by a per-endpoint lock; [`is_running`](Self::is_running)
/// reads an atomic flag without taking it.
pub struct MethodListenerEndpoint {
    id: String,
    topic: String,
    bean: String,
    method: String,
    resolver: Arc<dyn TopicResolver>,
    lifecycle: Mutex<Lifecycle>,
    running: AtomicBool,
}

impl MethodListenerEndpoint {
    /// Create an endpoint resolving `topic` through the shared default
    /// resolver.
    pub fn new(
        id: impl Into<String>,
        topic: impl Into<String>,
        bean: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            bean: bean.into(),
            method: method.into(),
            resolver: default_resolver(),
            lifecycle: Mutex::new(Lifecycle::Unregistered),
            running: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn TopicResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The topic expression, resolved on every start.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn bean(&self) -> &str {
        &self.bean
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Bind the endpoint to `container` and build its listener adapter.
    ///
    /// The handler is resolved through `factory` here, once; later starts
    /// reuse the same adapter.
    pub fn register(
        &self,
        container: Arc<dyn ListenerContainer>,
        factory: &dyn HandlerMethodFactory,
    ) -> Result<(), ListenerError> {
        let mut lifecycle = self.lifecycle.lock();
        if !matches!(*lifecycle, Lifecycle::Unregistered) {
            return Err(ListenerError::AlreadyRegistered(self.id.clone()));
        }

        let handler = factory.create(&self.bean, &self.method)?;
        let listener: Arc<dyn MessageListener> = Arc::new(HandlerMethodListenerAdapter::new(
            self.bean.clone(),
            self.method.clone(),
            handler,
        ));
        *lifecycle = Lifecycle::Registered(Binding {
            container,
            listener,
        });
        debug!(endpoint = %self.id, "listener endpoint registered");
        Ok(())
    }

    /// Resolve the topic and subscribe the listener. No-op while running.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::NotRegistered`] before [`register`](Self::register),
    /// without touching any container. Resolver and container failures leave
    /// the endpoint in its previous state.
    pub fn start(&self) -> Result<(), ListenerError> {
        let mut lifecycle = self.lifecycle.lock();
        let binding = match &*lifecycle {
            Lifecycle::Unregistered => return Err(ListenerError::NotRegistered(self.id.clone())),
            Lifecycle::Running(_) => return Ok(()),
            Lifecycle::Registered(binding) | Lifecycle::Stopped(binding) => binding.clone(),
        };

        let topic = self.resolver.resolve(&self.topic)?;
        binding
            .container
            .add_message_listener(Arc::clone(&binding.listener), topic.clone())?;

        *lifecycle = Lifecycle::Running(binding);
        self.running.store(true, Ordering::Release);
        debug!(
            endpoint = %self.id,
            topic = %topic,
            pattern = topic.is_pattern(),
            "listener endpoint started"
        );
        Ok(())
    }

    /// Unsubscribe the listener. No-op unless running.
    pub fn stop(&self) -> Result<(), ListenerError> {
        let mut lifecycle = self.lifecycle.lock();
        let Lifecycle::Running(binding) = &*lifecycle else {
            return Ok(());
        };
        let binding = binding.clone();

        binding
            .container
            .remove_message_listener(&binding.listener)?;

        *lifecycle = Lifecycle::Stopped(binding);
        self.running.store(false, Ordering::Release);
        debug!(endpoint = %self.id, "listener endpoint stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn state(&self) -> EndpointState {
        self.lifecycle.lock().state()
    }

    /// The listener subscribed by [`start`](Self::start), once registered.
    pub fn listener(&self) -> Option<Arc<dyn MessageListener>> {
        match &*self.lifecycle.lock() {
            Lifecycle::Unregistered => None,
            Lifecycle::Registered(binding)
            | Lifecycle::Running(binding)
            | Lifecycle::Stopped(binding) => Some(Arc::clone(&binding.listener)),
        }
    }
}

impl fmt::Display for MethodListenerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MethodListenerEndpoint[{}] topic='{}' | bean='{}' | method='{}'",
            self.id, self.topic, self.bean, self.method
        )
    }
}

impl fmt::Debug for MethodListenerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodListenerEndpoint")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("bean", &self.bean)
            .field("method", &self.method)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
