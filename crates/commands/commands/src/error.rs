use std::time::Duration;

use thiserror::Error;

/// Errors from building and dispatching key commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid builder state: {0}")]
    InvalidState(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}
