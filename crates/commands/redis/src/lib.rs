//! Redis backend for redbind key commands.
//!
//! Conditional deletes are sent as `DELEX` and conditional writes as `SET`
//! with an `IFEQ`/`IFNE`/`IFDEQ`/`IFDNE` modifier, so the server evaluates the
//! condition atomically. Both require Redis 8.4 or later; unconditional
//! commands work against any version.
//!
//! # Example
//!
//! ```ignore
//! use redbind_commands::{StringSerializer, ValueOperations};
//! use redbind_commands_redis::{RedisConfig, RedisKeyCommands};
//!
//! let commands = RedisKeyCommands::new(&RedisConfig::new("redis://localhost:6379"))?;
//! let ops = ValueOperations::new(std::sync::Arc::new(commands), StringSerializer);
//! ```

mod commands;
mod config;

pub use commands::RedisKeyCommands;
pub use config::RedisConfig;
