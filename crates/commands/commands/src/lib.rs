//! Conditional command construction for redbind.
//!
//! Call sites stage a condition fluently with [`DeleteSpec`] or [`SetSpec`]
//! and materialize it into a [`CompareCondition`] only when the command is
//! dispatched, so typed values are serialized once, by the same serializer
//! used for the rest of the operation.
//!
//! # Example
//!
//! ```ignore
//! use redbind_commands::{StringSerializer, ValueOperations};
//!
//! let ops = ValueOperations::new(commands, StringSerializer);
//! ops.set("session:42", &"token-a".to_owned()).await?;
//!
//! // Delete only if nobody replaced the token in the meantime.
//! let deleted = ops
//!     .delete_if("session:42", |spec| spec.if_equals().value("token-a".to_owned()))
//!     .await?;
//! ```
//!
//! [`CompareCondition`]: redbind_core::CompareCondition

pub mod connection;
pub mod encode;
pub mod error;
pub mod operations;
pub mod serializer;
pub mod spec;
pub mod testing;

pub use connection::{KeyCommands, SetOptions};
pub use encode::EncodedCommand;
pub use error::CommandError;
pub use operations::ValueOperations;
pub use serializer::{BytesSerializer, JsonSerializer, StringSerializer, ValueSerializer};
pub use spec::{ComparisonSpec, DeleteSpec, SetSpec};
