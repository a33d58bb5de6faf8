//! Argument encoding for key commands.
//!
//! | Condition | Delete | Set |
//! |-----------|--------|-----|
//! | none | `DEL key` | `SET key value` |
//! | value equals | `DELEX key IFEQ v` | `SET key value IFEQ v` |
//! | value not equals | `DELEX key IFNE v` | `SET key value IFNE v` |
//! | digest equals | `DELEX key IFDEQ d` | `SET key value IFDEQ d` |
//! | digest not equals | `DELEX key IFDNE d` | `SET key value IFDNE d` |
//!
//! An expiration appends `PX <milliseconds>` to `SET`.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use redbind_core::CompareCondition;

use crate::connection::SetOptions;

/// A command name and its arguments, ready to be written to the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCommand {
    pub name: &'static str,
    pub args: Vec<Bytes>,
}

impl EncodedCommand {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    fn arg(mut self, arg: impl Into<Bytes>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn condition(self, condition: &CompareCondition) -> Self {
        let value = Bytes::copy_from_slice(condition.value().as_bytes());
        self.arg(condition.keyword()).arg(value)
    }
}

impl fmt::Display for EncodedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        for arg in &self.args {
            write!(f, " {}", String::from_utf8_lossy(arg))?;
        }
        Ok(())
    }
}

/// Encode a delete of `key`, conditional when `condition` is given.
pub fn delete_command(key: &str, condition: Option<&CompareCondition>) -> EncodedCommand {
    match condition {
        None => EncodedCommand::new("DEL").arg(key.to_owned()),
        Some(condition) => EncodedCommand::new("DELEX")
            .arg(key.to_owned())
            .condition(condition),
    }
}

/// Encode a `SET` of `key` to `value` with the given options.
pub fn set_command(key: &str, value: Bytes, options: &SetOptions) -> EncodedCommand {
    let mut command = EncodedCommand::new("SET").arg(key.to_owned()).arg(value);
    if let Some(condition) = &options.condition {
        command = command.condition(condition);
    }
    if let Some(expiration) = options.expiration {
        command = command.arg("PX").arg(expiration_millis(expiration).to_string());
    }
    command
}

/// Encode a `DIGEST` of `key`.
pub fn digest_command(key: &str) -> EncodedCommand {
    EncodedCommand::new("DIGEST").arg(key.to_owned())
}

/// Convert an expiration to whole milliseconds; sub-millisecond durations
/// round up to 1 since the server rejects `PX 0`.
pub fn expiration_millis(expiration: Duration) -> u64 {
    u64::try_from(expiration.as_millis())
        .unwrap_or(u64::MAX)
        .max(1)
}
