//! Pub/Sub listener endpoints for redbind.
//!
//! A [`MethodListenerEndpoint`] binds a topic expression to a named handler.
//! Registering it with a [`ListenerContainer`] builds the listener adapter
//! once; starting it resolves the topic through a [`TopicResolver`] and
//! subscribes the adapter, stopping it unsubscribes again.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use redbind_listener::{
//!     HandlerTable, ListenerEndpointRegistry, MemoryListenerContainer, MethodListenerEndpoint,
//!     handler_fn,
//! };
//!
//! let handlers = HandlerTable::new().with("orders", "on_order", handler_fn(|_envelope| Ok(())));
//! let container = Arc::new(MemoryListenerContainer::new());
//! let registry = ListenerEndpointRegistry::new();
//!
//! let endpoint = MethodListenerEndpoint::new("orders", "orders.*", "orders", "on_order");
//! registry.register_listener(endpoint, container.clone(), &handlers).unwrap();
//! registry.start().unwrap();
//!
//! assert_eq!(container.publish("orders.created", "{}"), 1);
//! ```

pub mod adapter;
pub mod cache;
pub mod config;
pub mod container;
pub mod endpoint;
pub mod error;
pub mod handler;
pub mod listener;
pub mod registrar;
pub mod registry;
pub mod resolver;

pub use adapter::HandlerMethodListenerAdapter;
pub use cache::LruCache;
pub use config::ListenerConfig;
pub use container::{ListenerContainer, MemoryListenerContainer};
pub use endpoint::{EndpointState, MethodListenerEndpoint};
pub use error::{HandlerError, ListenerError};
pub use handler::{HandlerMethod, HandlerMethodFactory, HandlerTable, handler_fn, json_handler};
pub use listener::MessageListener;
pub use registrar::{ListenerDefinition, ListenerRegistrar};
pub use registry::ListenerEndpointRegistry;
pub use resolver::{SimpleTopicResolver, TopicResolver};
