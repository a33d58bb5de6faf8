use async_trait::async_trait;
use bytes::Bytes;
use deadpool_redis::{Config, Pool, PoolError, Runtime};
use redis::{FromRedisValue, RedisError};
use tracing::debug;

use redbind_commands::encode::{self, EncodedCommand};
use redbind_commands::{CommandError, KeyCommands, SetOptions};
use redbind_core::CompareCondition;

use crate::config::RedisConfig;

/// Redis-backed implementation of [`KeyCommands`].
///
/// Uses a `deadpool-redis` connection pool. Every command is a single
/// round-trip; conditions are evaluated by the server.
pub struct RedisKeyCommands {
    pool: Pool,
    config: RedisConfig,
}

impl RedisKeyCommands {
    /// Create a new `RedisKeyCommands` from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Connection`] if the pool cannot be created.
    pub fn new(config: &RedisConfig) -> Result<Self, CommandError> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map(|b| {
                b.max_size(config.pool_size)
                    .wait_timeout(Some(config.connection_timeout()))
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|e| CommandError::Connection(e.to_string()))?
            .map_err(|e| CommandError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            config: config.clone(),
        })
    }

    /// Obtain a connection from the pool.
    async fn conn(&self) -> Result<deadpool_redis::Connection, CommandError> {
        self.pool.get().await.map_err(|e| match e {
            PoolError::Timeout(_) => CommandError::Timeout(self.config.connection_timeout()),
            other => CommandError::Connection(other.to_string()),
        })
    }

    async fn query<T>(&self, command: &EncodedCommand) -> Result<T, CommandError>
    where
        T: FromRedisValue,
    {
        let mut cmd = redis::cmd(command.name);
        for arg in &command.args {
            cmd.arg(arg.as_ref());
        }

        let mut conn = self.conn().await?;
        let reply = cmd.query_async(&mut conn).await.map_err(backend_error)?;
        debug!(command = %command.name, "redis command dispatched");
        Ok(reply)
    }
}

fn backend_error(e: RedisError) -> CommandError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
        CommandError::Connection(e.to_string())
    } else {
        CommandError::Backend(e.to_string())
    }
}

impl std::fmt::Debug for RedisKeyCommands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKeyCommands")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyCommands for RedisKeyCommands {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CommandError> {
        let key = self.config.render_key(key);
        let mut conn = self.conn().await?;
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(backend_error)?;
        Ok(value.map(Bytes::from))
    }

    async fn set(
        &self,
        key: &str,
        value: Bytes,
        options: &SetOptions,
    ) -> Result<bool, CommandError> {
        let command = encode::set_command(&self.config.render_key(key), value, options);
        // `OK` when written, nil when the condition did not hold.
        let reply: Option<String> = self.query(&command).await?;
        Ok(reply.is_some())
    }

    async fn delete(
        &self,
        key: &str,
        condition: Option<&CompareCondition>,
    ) -> Result<bool, CommandError> {
        let command = encode::delete_command(&self.config.render_key(key), condition);
        let removed: i64 = self.query(&command).await?;
        Ok(removed > 0)
    }

    async fn digest(&self, key: &str) -> Result<Option<String>, CommandError> {
        let command = encode::digest_command(&self.config.render_key(key));
        self.query(&command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_url_is_a_connection_error() {
        let config = RedisConfig::new("not-a-redis-url");
        let err = RedisKeyCommands::new(&config).unwrap_err();
        assert!(matches!(err, CommandError::Connection(_)));
    }
}
