//! Redis-backed session store
//!
//! Session values live in Redis under `{redis_key_prefix}{id}` as JSON with a
//! TTL equal to the cookie's max-age; the client only holds the signed id.
//! Connections come from a `deadpool-redis` pool sized by
//! `redis.connection_pool_size`.

use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Pool, PoolConfig as PoolSizing, Runtime};
use std::collections::HashMap;
use std::future::Future;

use super::bag::{SessionBag, SessionPayload};
use super::cookie::session_cookie;
use super::id_cookie::{SignedIdCookie, new_session_id};
use super::key::session_key;
use super::{RequestContext, SessionConfig, SessionOptions};
use crate::error::{Result, SessionError};
use crate::traits::session::SessionStore;

/// Redis session store
#[derive(Clone)]
pub struct RedisSessionStore {
    pool: Pool,
    ids: SignedIdCookie,
    config: SessionConfig,
}

impl RedisSessionStore {
    /// Build the connection pool and verify the server answers `PING`
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::BackendInitialization`] if the pool cannot be
    /// built or Redis cannot be reached, and [`SessionError::Config`] if no
    /// usable secret key is configured.
    pub async fn connect(config: &SessionConfig) -> Result<Self> {
        let key = session_key(config)?;
        let address = config.redis.address();
        let timeout = config.redis.connect_timeout();

        let mut sizing = PoolSizing::new(config.redis.connection_pool_size);
        sizing.timeouts.wait = Some(timeout);
        sizing.timeouts.create = Some(timeout);
        sizing.timeouts.recycle = Some(timeout);

        let mut pool_config = PoolConfig::from_url(config.redis.url());
        pool_config.pool = Some(sizing);

        let pool = pool_config.create_pool(Some(Runtime::Tokio1)).map_err(|e| {
            SessionError::backend_initialization(format!("Failed to create Redis pool: {}", e))
        })?;

        let store = Self {
            pool,
            ids: SignedIdCookie::new(key, config.cookie_name.clone()),
            config: config.clone(),
        };

        tracing::info!(address = %address, "Trying Redis connection");
        store.ping().await.map_err(|e| {
            tracing::error!(address = %address, error = %e, "Failure Redis connection");
            SessionError::backend_initialization(format!("Failure Redis connection to {}: {}", address, e))
        })?;
        tracing::info!(
            address = %address,
            pool_size = config.redis.connection_pool_size,
            "Success Redis connection"
        );

        Ok(store)
    }

    /// Round-trip a `PING` through the pool
    pub async fn ping(&self) -> Result<()> {
        let reply: String = self.query(redis::cmd("PING")).await?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(SessionError::persistence(format!("Unexpected PING reply: {}", reply)))
        }
    }

    fn redis_key(&self, id: &str) -> String {
        format!("{}{}", self.config.redis_key_prefix, id)
    }

    /// Run one command on a pooled connection, bounded by the configured timeout
    async fn query<T>(&self, cmd: redis::Cmd) -> Result<T>
    where
        T: redis::FromRedisValue,
    {
        self.bounded(async {
            let mut conn = self
                .pool
                .get()
                .await
                .map_err(|e| SessionError::persistence(format!("Failed to get Redis connection: {}", e)))?;

            cmd.query_async::<T>(&mut conn)
                .await
                .map_err(|e| SessionError::persistence(format!("Redis command failed: {}", e)))
        })
        .await
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let timeout = self.config.redis.connect_timeout();
        tokio::time::timeout(timeout, fut).await.map_err(|_| {
            SessionError::persistence(format!("Redis call timed out after {:?}", timeout))
        })?
    }

    async fn load(&self, id: &str) -> Result<Option<HashMap<String, String>>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(self.redis_key(id));

        let Some(raw) = self.query::<Option<String>>(cmd).await? else {
            return Ok(None);
        };

        let payload: SessionPayload = serde_json::from_str(&raw)
            .map_err(|e| SessionError::decode(format!("Stored session is not valid: {}", e)))?;
        Ok(Some(payload.values))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn fetch_or_create(&self, ctx: &RequestContext) -> SessionBag {
        let Some(id) = self.ids.read(ctx) else {
            return self.fresh_bag();
        };

        match self.load(&id).await {
            Ok(Some(values)) => SessionBag::restored(Some(id), values),
            Ok(None) => self.fresh_bag(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load session from Redis, starting a fresh session");
                self.fresh_bag()
            }
        }
    }

    fn fresh_bag(&self) -> SessionBag {
        SessionBag::with_id(new_session_id())
    }

    async fn persist(
        &self,
        ctx: &mut RequestContext,
        bag: &SessionBag,
        options: &SessionOptions,
    ) -> Result<()> {
        let id = bag
            .id()
            .ok_or_else(|| SessionError::persistence("Session has no identifier"))?;
        let key = self.redis_key(id);

        if options.is_expiring() {
            let mut cmd = redis::cmd("DEL");
            cmd.arg(&key);
            self.query::<()>(cmd).await?;

            ctx.add_cookie(session_cookie(&self.config, String::new(), options));
            return Ok(());
        }

        let serialized = serde_json::to_string(&bag.to_payload())
            .map_err(|e| SessionError::persistence(format!("Failed to serialize session: {}", e)))?;
        let ttl = options.ttl().unwrap_or_else(|| self.config.default_ttl());

        let mut cmd = redis::cmd("SETEX");
        cmd.arg(&key).arg(ttl.as_secs()).arg(serialized);
        self.query::<()>(cmd).await?;

        ctx.add_cookie(session_cookie(&self.config, self.ids.sign(id), options));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }

    fn is_healthy(&self) -> bool {
        !self.pool.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RedisConfig;
    use crate::session::key::TEST_SECRET_KEY;
    use std::time::Duration;

    fn config(port: u16) -> SessionConfig {
        SessionConfig {
            secret_key: Some(TEST_SECRET_KEY.to_string()),
            redis: RedisConfig {
                enabled: true,
                host: "127.0.0.1".to_string(),
                port,
                connection_pool_size: 2,
                connect_timeout_seconds: 2,
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unreachable_redis_fails_initialization() {
        // Nothing listens on port 1
        let result = RedisSessionStore::connect(&config(1)).await;
        assert!(matches!(result, Err(SessionError::BackendInitialization(_))));
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let config = SessionConfig {
            secret_key: None,
            ..config(1)
        };
        let result = RedisSessionStore::connect(&config).await;
        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    // These tests require a running Redis instance on 127.0.0.1:6379

    #[tokio::test]
    #[ignore] // Requires Redis
    async fn test_redis_persist_and_fetch() {
        let store = RedisSessionStore::connect(&config(6379)).await.unwrap();
        let mut ctx = RequestContext::new();

        let mut bag = store.fetch_or_create(&ctx).await;
        bag.insert("lang", "en");
        store
            .persist(&mut ctx, &bag, &SessionOptions::normal(Duration::from_secs(60)))
            .await
            .unwrap();

        let loaded = store.fetch_or_create(&ctx.next_request()).await;
        assert_eq!(loaded.id(), bag.id());
        assert_eq!(loaded.get("lang"), Some("en"));
    }

    #[tokio::test]
    #[ignore] // Requires Redis
    async fn test_redis_delete() {
        let store = RedisSessionStore::connect(&config(6379)).await.unwrap();
        let mut ctx = RequestContext::new();

        let mut bag = store.fetch_or_create(&ctx).await;
        bag.insert("lang", "en");
        store
            .persist(&mut ctx, &bag, &SessionOptions::normal(Duration::from_secs(60)))
            .await
            .unwrap();
        let replay = ctx.next_request();

        store
            .persist(&mut ctx, &bag, &SessionOptions::expire_immediately())
            .await
            .unwrap();

        let loaded = store.fetch_or_create(&replay).await;
        assert!(loaded.is_new());
        assert!(loaded.is_empty());
    }
}
