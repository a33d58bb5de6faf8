use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;
use tracing::debug;

use crate::container::ListenerContainer;
use crate::endpoint::MethodListenerEndpoint;
use crate::error::ListenerError;
use crate::handler::HandlerMethodFactory;
use crate::registry::ListenerEndpointRegistry;
use crate::resolver::TopicResolver;

/// Prefix of generated endpoint ids.
pub const GENERATED_ID_PREFIX: &str = "redbind.ListenerEndpoint#";

/// Declarative description of a listener endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListenerDefinition {
    /// Endpoint id. Generated when absent or blank.
    #[serde(default)]
    pub id: Option<String>,
    /// Name of the container to subscribe with. The default container is
    /// used when absent or blank.
    #[serde(default)]
    pub container: Option<String>,
    /// Channel name or glob pattern.
    pub topic: String,
    pub bean: String,
    pub method: String,
}

impl ListenerDefinition {
    pub fn new(
        topic: impl Into<String>,
        bean: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            bean: bean.into(),
            method: method.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Turns [`ListenerDefinition`]s into registered endpoints.
pub struct ListenerRegistrar {
    registry: Arc<ListenerEndpointRegistry>,
    factory: Arc<dyn HandlerMethodFactory>,
    containers: HashMap<String, Arc<dyn ListenerContainer>>,
    default_container: Option<Arc<dyn ListenerContainer>>,
    resolver: Option<Arc<dyn TopicResolver>>,
    counter: AtomicUsize,
}

impl ListenerRegistrar {
    pub fn new(
        registry: Arc<ListenerEndpointRegistry>,
        factory: Arc<dyn HandlerMethodFactory>,
    ) -> Self {
        Self {
            registry,
            factory,
            containers: HashMap::new(),
            default_container: None,
            resolver: None,
            counter: AtomicUsize::new(0),
        }
    }

    /// Make `container` available under `name`.
    #[must_use]
    pub fn with_container(
        mut self,
        name: impl Into<String>,
        container: Arc<dyn ListenerContainer>,
    ) -> Self {
        self.containers.insert(name.into(), container);
        self
    }

    /// Container used by definitions that do not name one. Without it, the
    /// single named container is used if there is exactly one.
    #[must_use]
    pub fn with_default_container(mut self, container: Arc<dyn ListenerContainer>) -> Self {
        self.default_container = Some(container);
        self
    }

    /// Resolver handed to every endpoint created from now on.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn TopicResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn registry(&self) -> &Arc<ListenerEndpointRegistry> {
        &self.registry
    }

    /// Create, register and record the endpoint described by `definition`.
    pub fn register(
        &self,
        definition: &ListenerDefinition,
    ) -> Result<Arc<MethodListenerEndpoint>, ListenerError> {
        let container = self.container_for(definition)?;
        let id = match non_blank(definition.id.as_deref()) {
            Some(id) => id.to_owned(),
            None => self.next_id(),
        };

        let mut endpoint = MethodListenerEndpoint::new(
            id,
            definition.topic.clone(),
            definition.bean.clone(),
            definition.method.clone(),
        );
        if let Some(resolver) = &self.resolver {
            endpoint = endpoint.with_resolver(Arc::clone(resolver));
        }

        debug!(endpoint = %endpoint, "registering listener definition");
        self.registry
            .register_listener(endpoint, container, self.factory.as_ref())
    }

    /// Register every definition in order, stopping at the first failure.
    pub fn register_all<'a, I>(
        &self,
        definitions: I,
    ) -> Result<Vec<Arc<MethodListenerEndpoint>>, ListenerError>
    where
        I: IntoIterator<Item = &'a ListenerDefinition>,
    {
        definitions.into_iter().map(|d| self.register(d)).collect()
    }

    fn container_for(
        &self,
        definition: &ListenerDefinition,
    ) -> Result<Arc<dyn ListenerContainer>, ListenerError> {
        if let Some(name) = non_blank(definition.container.as_deref()) {
            return self
                .containers
                .get(name)
                .cloned()
                .ok_or_else(|| ListenerError::ContainerNotFound(name.to_owned()));
        }
        if let Some(container) = &self.default_container {
            return Ok(Arc::clone(container));
        }
        let mut named = self.containers.values();
        match (named.next(), named.next()) {
            (Some(only), None) => Ok(Arc::clone(only)),
            _ => Err(ListenerError::NoDefaultContainer),
        }
    }

    fn next_id(&self) -> String {
        format!(
            "{GENERATED_ID_PREFIX}{}",
            self.counter.fetch_add(1, Ordering::Relaxed)
        )
    }
}

impl fmt::Debug for ListenerRegistrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.containers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ListenerRegistrar")
            .field("containers", &names)
            .field("default_container", &self.default_container.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryListenerContainer;
    use crate::handler::{HandlerTable, handler_fn};

    fn factory() -> Arc<dyn HandlerMethodFactory> {
        Arc::new(HandlerTable::new().with("orders", "on_order", handler_fn(|_| Ok(()))))
    }

    fn registrar() -> ListenerRegistrar {
        ListenerRegistrar::new(Arc::new(ListenerEndpointRegistry::new()), factory())
    }

    #[test]
    fn generates_sequential_ids() {
        let registrar =
            registrar().with_default_container(Arc::new(MemoryListenerContainer::new()));
        let first = registrar
            .register(&ListenerDefinition::new("a", "orders", "on_order"))
            .unwrap();
        let second = registrar
            .register(&ListenerDefinition::new("b", "orders", "on_order").with_id("  "))
            .unwrap();
        assert_eq!(first.id(), "redbind.ListenerEndpoint#0");
        assert_eq!(second.id(), "redbind.ListenerEndpoint#1");
    }

    #[test]
    fn keeps_explicit_id() {
        let registrar =
            registrar().with_default_container(Arc::new(MemoryListenerContainer::new()));
        let endpoint = registrar
            .register(&ListenerDefinition::new("a", "orders", "on_order").with_id("orders"))
            .unwrap();
        assert_eq!(endpoint.id(), "orders");
        assert!(registrar.registry().endpoint("orders").is_some());
    }

    #[test]
    fn resolves_named_container() {
        let audit = Arc::new(MemoryListenerContainer::new());
        let registrar = registrar()
            .with_container("main", Arc::new(MemoryListenerContainer::new()))
            .with_container("audit", audit.clone());
        let definition = ListenerDefinition::new("a", "orders", "on_order").with_container("audit");
        registrar.register(&definition).unwrap();
        registrar.registry().start().unwrap();
        assert_eq!(audit.subscription_count(), 1);
    }

    #[test]
    fn unknown_container_fails() {
        let registrar =
            registrar().with_container("main", Arc::new(MemoryListenerContainer::new()));
        let definition = ListenerDefinition::new("a", "orders", "on_order").with_container("other");
        let err = registrar.register(&definition).err().unwrap();
        assert!(matches!(err, ListenerError::ContainerNotFound(name) if name == "other"));
    }

    #[test]
    fn single_named_container_is_the_default() {
        let main = Arc::new(MemoryListenerContainer::new());
        let registrar = registrar().with_container("main", main.clone());
        registrar
            .register(&ListenerDefinition::new("a", "orders", "on_order"))
            .unwrap();
        registrar.registry().start().unwrap();
        assert_eq!(main.subscription_count(), 1);
    }

    #[test]
    fn ambiguous_default_fails() {
        let err = registrar()
            .register(&ListenerDefinition::new("a", "orders", "on_order"))
            .err()
            .unwrap();
        assert!(matches!(err, ListenerError::NoDefaultContainer));

        let registrar = registrar()
            .with_container("one", Arc::new(MemoryListenerContainer::new()))
            .with_container("two", Arc::new(MemoryListenerContainer::new()));
        let err = registrar
            .register(&ListenerDefinition::new("a", "orders", "on_order"))
            .err()
            .unwrap();
        assert!(matches!(err, ListenerError::NoDefaultContainer));
    }

    #[test]
    fn register_all_stops_at_first_failure() {
        let registrar =
            registrar().with_default_container(Arc::new(MemoryListenerContainer::new()));
        let definitions = [
            ListenerDefinition::new("a", "orders", "on_order"),
            ListenerDefinition::new("b", "orders", "missing"),
            ListenerDefinition::new("c", "orders", "on_order"),
        ];
        let err = registrar.register_all(&definitions).unwrap_err();
        assert!(matches!(err, ListenerError::HandlerNotFound { .. }));
        assert_eq!(registrar.registry().len(), 1);
    }
}
