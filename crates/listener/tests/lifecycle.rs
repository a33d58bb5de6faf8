use std::sync::Arc;

use parking_lot::Mutex;
use redbind_core::{Message, Topic};
use redbind_listener::container::same_listener;
use redbind_listener::{
    HandlerTable, ListenerConfig, ListenerContainer, ListenerEndpointRegistry, ListenerError,
    ListenerRegistrar, MemoryListenerContainer, MessageListener, MethodListenerEndpoint,
    handler_fn, json_handler,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Add(Topic),
    Remove,
}

/// Container double recording every subscription change.
#[derive(Default)]
struct RecordingContainer {
    calls: Mutex<Vec<Call>>,
    listeners: Mutex<Vec<Arc<dyn MessageListener>>>,
}

impl RecordingContainer {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

impl ListenerContainer for RecordingContainer {
    fn add_message_listener(
        &self,
        listener: Arc<dyn MessageListener>,
        topic: Topic,
    ) -> Result<(), ListenerError> {
        self.calls.lock().push(Call::Add(topic));
        self.listeners.lock().push(listener);
        Ok(())
    }

    fn remove_message_listener(
        &self,
        listener: &Arc<dyn MessageListener>,
    ) -> Result<(), ListenerError> {
        self.calls.lock().push(Call::Remove);
        self.listeners.lock().retain(|l| !same_listener(l, listener));
        Ok(())
    }
}

/// Container double whose subscriptions always fail.
struct FailingContainer;

impl ListenerContainer for FailingContainer {
    fn add_message_listener(
        &self,
        _listener: Arc<dyn MessageListener>,
        _topic: Topic,
    ) -> Result<(), ListenerError> {
        Err(ListenerError::Container("subscription thread is down".into()))
    }

    fn remove_message_listener(
        &self,
        _listener: &Arc<dyn MessageListener>,
    ) -> Result<(), ListenerError> {
        Ok(())
    }
}

fn handlers() -> HandlerTable {
    HandlerTable::new().with("orders", "on_order", handler_fn(|_| Ok(())))
}

#[test]
fn pattern_endpoint_end_to_end() {
    let container = Arc::new(RecordingContainer::default());
    let endpoint = MethodListenerEndpoint::new("orders", "orders.*", "orders", "on_order");

    endpoint.register(container.clone(), &handlers()).unwrap();
    assert!(container.calls().is_empty(), "register must not subscribe");

    endpoint.start().unwrap();
    assert!(endpoint.is_running());
    assert_eq!(container.calls(), vec![Call::Add(Topic::pattern("orders.*"))]);
    let subscribed = container.listeners.lock()[0].clone();
    assert!(same_listener(&subscribed, &endpoint.listener().unwrap()));

    endpoint.stop().unwrap();
    assert!(!endpoint.is_running());
    assert_eq!(
        container.calls(),
        vec![Call::Add(Topic::pattern("orders.*")), Call::Remove]
    );
    assert!(container.listeners.lock().is_empty());
}

#[test]
fn start_and_stop_are_idempotent() {
    let container = Arc::new(RecordingContainer::default());
    let endpoint = MethodListenerEndpoint::new("orders", "orders.created", "orders", "on_order");
    endpoint.register(container.clone(), &handlers()).unwrap();

    endpoint.start().unwrap();
    endpoint.start().unwrap();
    assert_eq!(container.calls().len(), 1);

    endpoint.stop().unwrap();
    endpoint.stop().unwrap();
    assert_eq!(
        container.calls(),
        vec![Call::Add(Topic::channel("orders.created")), Call::Remove]
    );
}

#[test]
fn start_before_register_touches_no_container() {
    let container = Arc::new(RecordingContainer::default());
    let endpoint = MethodListenerEndpoint::new("orders", "orders.*", "orders", "on_order");

    let err = endpoint.start().unwrap_err();
    assert!(matches!(err, ListenerError::NotRegistered(_)));
    assert!(container.calls().is_empty());
}

#[test]
fn container_failure_leaves_endpoint_registered() {
    let registry = ListenerEndpointRegistry::new();
    let endpoint = registry
        .register_listener(
            MethodListenerEndpoint::new("orders", "orders.*", "orders", "on_order"),
            Arc::new(FailingContainer),
            &handlers(),
        )
        .unwrap();

    let err = registry.start().unwrap_err();
    assert!(matches!(err, ListenerError::Container(_)));
    assert!(!endpoint.is_running());
    assert_eq!(registry.stalled_endpoints().len(), 1);
}

#[test]
fn concurrent_starts_subscribe_once() {
    let container = Arc::new(RecordingContainer::default());
    let endpoint = Arc::new(MethodListenerEndpoint::new(
        "orders", "orders.*", "orders", "on_order",
    ));
    endpoint.register(container.clone(), &handlers()).unwrap();

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let endpoint = Arc::clone(&endpoint);
            std::thread::spawn(move || endpoint.start().unwrap())
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }
    assert_eq!(container.calls().len(), 1);
}

#[derive(Debug, PartialEq, serde::Deserialize)]
struct Order {
    id: u64,
}

#[test]
fn configured_listeners_receive_published_messages() {
    let config = ListenerConfig::from_toml(
        r#"
        [[listeners]]
        id = "orders"
        topic = "orders.*"
        bean = "orders"
        method = "on_order"

        [[listeners]]
        topic = "audit"
        bean = "audit"
        method = "record"
        "#,
    )
    .unwrap();

    let orders = Arc::new(Mutex::new(Vec::new()));
    let audit = Arc::new(Mutex::new(Vec::new()));
    let order_sink = Arc::clone(&orders);
    let audit_sink = Arc::clone(&audit);
    let handlers = HandlerTable::new()
        .with(
            "orders",
            "on_order",
            json_handler(move |order: Order, headers: &redbind_core::MessageHeaders| {
                order_sink
                    .lock()
                    .push((order, headers.channel.name().to_owned()));
                Ok(())
            }),
        )
        .with(
            "audit",
            "record",
            handler_fn(move |envelope| {
                audit_sink
                    .lock()
                    .push(envelope.payload_str().unwrap_or_default().to_owned());
                Ok(())
            }),
        );

    let container = Arc::new(MemoryListenerContainer::new());
    let registry = Arc::new(ListenerEndpointRegistry::new());
    let registrar = ListenerRegistrar::new(Arc::clone(&registry), Arc::new(handlers))
        .with_container("main", container.clone())
        .with_resolver(config.resolver());
    let endpoints = registrar.register_all(&config.listeners).unwrap();
    assert_eq!(endpoints[1].id(), "redbind.ListenerEndpoint#0");

    registry.start().unwrap();
    assert_eq!(container.publish("orders.created", r#"{"id":1}"#), 1);
    // Malformed payloads are logged and dropped; the subscription survives.
    assert_eq!(container.publish("orders.created", "not json"), 1);
    assert_eq!(container.publish("orders.updated", r#"{"id":2}"#), 1);
    assert_eq!(container.publish("audit", "login"), 1);

    assert_eq!(
        orders.lock().as_slice(),
        &[
            (Order { id: 1 }, "orders.created".to_owned()),
            (Order { id: 2 }, "orders.updated".to_owned()),
        ]
    );
    assert_eq!(audit.lock().as_slice(), &["login".to_owned()]);

    registry.stop().unwrap();
    assert_eq!(container.publish("audit", "logout"), 0);
}

#[test]
fn listener_receives_raw_message() {
    struct Echo(Mutex<Vec<Message>>);

    impl MessageListener for Echo {
        fn on_message(&self, message: &Message, _pattern: Option<&[u8]>) {
            self.0.lock().push(message.clone());
        }
    }

    let container = MemoryListenerContainer::new();
    let echo = Arc::new(Echo(Mutex::new(Vec::new())));
    container
        .add_message_listener(echo.clone(), Topic::channel("c"))
        .unwrap();
    container.publish("c", "payload");
    assert_eq!(
        echo.0.lock().as_slice(),
        &[Message::new("c", "payload")]
    );
}
