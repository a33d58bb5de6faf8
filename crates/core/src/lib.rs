//! Core value types shared by the redbind crates.
//!
//! - [`CompareCondition`] describes a precondition the server verifies
//!   atomically before a conditional mutation (`DELEX`, `SET ... IFEQ`).
//! - [`Topic`] names a Pub/Sub destination, either a literal channel or a
//!   glob pattern.
//! - [`Message`] and [`MessageEnvelope`] carry Pub/Sub deliveries to handlers.

pub mod condition;
pub mod glob;
pub mod message;
pub mod topic;

pub use condition::{CompareCondition, ComparisonFunction, ComparisonOperator, Value};
pub use message::{Message, MessageEnvelope, MessageHeaders};
pub use topic::Topic;
