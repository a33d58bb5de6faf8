use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::container::ListenerContainer;
use crate::endpoint::MethodListenerEndpoint;
use crate::error::ListenerError;
use crate::handler::HandlerMethodFactory;

/// Keeps registered endpoints and starts or stops them together.
///
/// Endpoints registered while the registry runs are started right away.
#[derive(Default)]
pub struct ListenerEndpointRegistry {
    endpoints: RwLock<Vec<Arc<MethodListenerEndpoint>>>,
    containers: RwLock<Vec<Arc<dyn ListenerContainer>>>,
    running: AtomicBool,
}

impl ListenerEndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `endpoint` with `container` and keep track of both.
    ///
    /// # Errors
    ///
    /// Fails with [`ListenerError::AlreadyRegistered`] if an endpoint with the
    /// same id is known, and propagates registration failures. If the
    /// registry is running and the new endpoint fails to start, the endpoint
    /// stays registered and the start error is returned.
    pub fn register_listener(
        &self,
        endpoint: MethodListenerEndpoint,
        container: Arc<dyn ListenerContainer>,
        factory: &dyn HandlerMethodFactory,
    ) -> Result<Arc<MethodListenerEndpoint>, ListenerError> {
        let endpoint = {
            let mut endpoints = self.endpoints.write();
            if endpoints.iter().any(|e| e.id() == endpoint.id()) {
                return Err(ListenerError::AlreadyRegistered(endpoint.id().to_owned()));
            }
            endpoint.register(Arc::clone(&container), factory)?;
            let endpoint = Arc::new(endpoint);
            endpoints.push(Arc::clone(&endpoint));
            endpoint
        };

        {
            let mut containers = self.containers.write();
            if !containers.iter().any(|c| Arc::ptr_eq(c, &container)) {
                containers.push(container);
            }
        }
        debug!(endpoint = %endpoint, "listener endpoint added to registry");

        if self.is_running() {
            endpoint.start()?;
        }
        Ok(endpoint)
    }

    /// Start every endpoint that is not running.
    ///
    /// All endpoints are attempted; the first failure is returned and the
    /// failed endpoints are reported by [`stalled_endpoints`](Self::stalled_endpoints).
    pub fn start(&self) -> Result<(), ListenerError> {
        self.running.store(true, Ordering::Release);
        let mut first_error = None;
        for endpoint in self.endpoints() {
            if endpoint.is_running() {
                continue;
            }
            if let Err(e) = endpoint.start() {
                warn!(endpoint = %endpoint.id(), error = %e, "failed to start listener endpoint");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Stop every running endpoint.
    pub fn stop(&self) -> Result<(), ListenerError> {
        self.running.store(false, Ordering::Release);
        let mut first_error = None;
        for endpoint in self.endpoints() {
            if !endpoint.is_running() {
                continue;
            }
            if let Err(e) = endpoint.stop() {
                warn!(endpoint = %endpoint.id(), error = %e, "failed to stop listener endpoint");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Containers endpoints were registered with, in registration order.
    pub fn listener_containers(&self) -> Vec<Arc<dyn ListenerContainer>> {
        self.containers.read().clone()
    }

    pub fn endpoints(&self) -> Vec<Arc<MethodListenerEndpoint>> {
        self.endpoints.read().clone()
    }

    pub fn endpoint(&self, id: &str) -> Option<Arc<MethodListenerEndpoint>> {
        self.endpoints.read().iter().find(|e| e.id() == id).cloned()
    }

    /// Endpoints that should be running but are not. Always empty while the
    /// registry is stopped.
    pub fn stalled_endpoints(&self) -> Vec<Arc<MethodListenerEndpoint>> {
        if !self.is_running() {
            return Vec::new();
        }
        self.endpoints
            .read()
            .iter()
            .filter(|e| !e.is_running())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.endpoints.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.read().is_empty()
    }
}

impl fmt::Debug for ListenerEndpointRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEndpointRegistry")
            .field("endpoints", &self.endpoints.read())
            .field("containers", &self.containers.read().len())
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryListenerContainer;
    use crate::handler::{HandlerTable, handler_fn};

    fn handlers() -> HandlerTable {
        HandlerTable::new().with("orders", "on_order", handler_fn(|_| Ok(())))
    }

    fn endpoint(id: &str, topic: &str) -> MethodListenerEndpoint {
        MethodListenerEndpoint::new(id, topic, "orders", "on_order")
    }

    #[test]
    fn start_and_stop_all_endpoints() {
        let registry = ListenerEndpointRegistry::new();
        let container = Arc::new(MemoryListenerContainer::new());
        let handlers = handlers();
        registry
            .register_listener(endpoint("a", "orders.a"), container.clone(), &handlers)
            .unwrap();
        registry
            .register_listener(endpoint("b", "orders.*"), container.clone(), &handlers)
            .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.listener_containers().len(), 1);

        registry.start().unwrap();
        assert!(registry.is_running());
        assert_eq!(container.subscription_count(), 2);

        // Idempotent.
        registry.start().unwrap();
        assert_eq!(container.subscription_count(), 2);

        registry.stop().unwrap();
        assert!(!registry.is_running());
        assert_eq!(container.subscription_count(), 0);
        assert!(registry.endpoints().iter().all(|e| !e.is_running()));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let registry = ListenerEndpointRegistry::new();
        let container = Arc::new(MemoryListenerContainer::new());
        registry
            .register_listener(endpoint("a", "x"), container.clone(), &handlers())
            .unwrap();
        let err = registry
            .register_listener(endpoint("a", "y"), container, &handlers())
            .unwrap_err();
        assert!(matches!(err, ListenerError::AlreadyRegistered(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn failed_registration_is_not_recorded() {
        let registry = ListenerEndpointRegistry::new();
        let container = Arc::new(MemoryListenerContainer::new());
        let err = registry
            .register_listener(endpoint("a", "x"), container, &HandlerTable::new())
            .unwrap_err();
        assert!(matches!(err, ListenerError::HandlerNotFound { .. }));
        assert!(registry.is_empty());
        assert!(registry.listener_containers().is_empty());
    }

    #[test]
    fn endpoints_added_while_running_start_immediately() {
        let registry = ListenerEndpointRegistry::new();
        let container = Arc::new(MemoryListenerContainer::new());
        registry.start().unwrap();

        let endpoint = registry
            .register_listener(endpoint("a", "orders"), container.clone(), &handlers())
            .unwrap();
        assert!(endpoint.is_running());
        assert_eq!(container.subscription_count(), 1);
    }

    #[test]
    fn stalled_endpoints_are_reported() {
        let registry = ListenerEndpointRegistry::new();
        let container = Arc::new(MemoryListenerContainer::new());
        let handlers = handlers();
        registry
            .register_listener(endpoint("good", "orders"), container.clone(), &handlers)
            .unwrap();
        registry
            .register_listener(endpoint("bad", " "), container.clone(), &handlers)
            .unwrap();
        assert!(registry.stalled_endpoints().is_empty());

        let err = registry.start().unwrap_err();
        assert!(matches!(err, ListenerError::InvalidTopic { .. }));
        assert!(registry.endpoint("good").unwrap().is_running());

        let stalled: Vec<String> = registry
            .stalled_endpoints()
            .iter()
            .map(|e| e.id().to_owned())
            .collect();
        assert_eq!(stalled, vec!["bad".to_owned()]);
    }

    #[test]
    fn tracks_distinct_containers() {
        let registry = ListenerEndpointRegistry::new();
        let first = Arc::new(MemoryListenerContainer::new());
        let second = Arc::new(MemoryListenerContainer::new());
        let handlers = handlers();
        registry
            .register_listener(endpoint("a", "x"), first.clone(), &handlers)
            .unwrap();
        registry
            .register_listener(endpoint("b", "y"), second, &handlers)
            .unwrap();
        registry
            .register_listener(endpoint("c", "z"), first, &handlers)
            .unwrap();
        assert_eq!(registry.listener_containers().len(), 2);
        assert!(registry.endpoint("missing").is_none());
    }
}
