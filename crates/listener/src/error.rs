use thiserror::Error;

/// Errors from wiring and running listener endpoints.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("listener container not initialized for endpoint '{0}'; register it first")]
    NotRegistered(String),

    #[error("endpoint '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("invalid topic '{topic}': {reason}")]
    InvalidTopic { topic: String, reason: String },

    #[error("no listener container named '{0}'")]
    ContainerNotFound(String),

    #[error("no default listener container available")]
    NoDefaultContainer,

    #[error("no handler for {bean}.{method}")]
    HandlerNotFound { bean: String, method: String },

    #[error("listener container error: {0}")]
    Container(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Errors raised by handler methods while processing a message.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("failed to convert message payload: {0}")]
    Conversion(String),

    #[error("handler invocation failed: {0}")]
    Invocation(String),
}
