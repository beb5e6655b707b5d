//! Per-request session operations over a store chosen once at startup.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use super::codec::{Decoded, ValueCodec};
use super::{CookieSessionStore, RequestContext, SessionBackend, SessionBag, SessionConfig, SessionOptions};
use crate::error::{Result, SessionError};
use crate::traits::session::SessionStore;

/// Prefix of keys reserved for the session layer itself
pub const RESERVED_PREFIX: &str = "_session.";

/// Key under which the current identity is stored
pub const IDENTITY_KEY: &str = "_session.identity";

/// Session manager
///
/// Binds to one [`SessionStore`] for the lifetime of the process and exposes
/// the operations handlers use. Mutations only touch the request's cached
/// bag; call [`save`](Self::save) or [`delete`](Self::delete) to persist.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    default_ttl: Duration,
}

impl SessionManager {
    /// Bind to an explicit store
    pub fn new(store: Arc<dyn SessionStore>, default_ttl: Duration) -> Self {
        Self { store, default_ttl }
    }

    /// Select and initialize the backend named by the configuration
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::BackendInitialization`] if Redis is enabled
    /// but unreachable, and [`SessionError::Config`] for invalid settings.
    /// Both are fatal: the process must not serve requests without a
    /// working session backend.
    pub async fn from_config(config: &SessionConfig) -> Result<Self> {
        config.validate()?;

        let store: Arc<dyn SessionStore> = match config.backend() {
            SessionBackend::Cookie => {
                tracing::info!("Using cookie store for sessions");
                Arc::new(CookieSessionStore::new(config)?)
            }
            SessionBackend::Redis => {
                tracing::info!("Using Redis for sessions");
                Self::redis_store(config).await?
            }
        };

        Ok(Self::new(store, config.default_ttl()))
    }

    #[cfg(feature = "redis")]
    async fn redis_store(config: &SessionConfig) -> Result<Arc<dyn SessionStore>> {
        Ok(Arc::new(super::RedisSessionStore::connect(config).await?))
    }

    #[cfg(not(feature = "redis"))]
    async fn redis_store(_config: &SessionConfig) -> Result<Arc<dyn SessionStore>> {
        Err(SessionError::backend_initialization(
            "Redis sessions requested but the redis feature is not enabled",
        ))
    }

    /// The bound store
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// The request's session bag, fetched once per request and cached
    pub async fn get<'a>(&self, ctx: &'a mut RequestContext) -> &'a mut SessionBag {
        if ctx.session.is_none() {
            let bag = self.store.fetch_or_create(ctx).await;
            ctx.session = Some(bag);
        }
        ctx.session.get_or_insert_with(SessionBag::new)
    }

    /// Persist the session with the configured lifetime
    pub async fn save(&self, ctx: &mut RequestContext) -> Result<()> {
        self.persist(ctx, SessionOptions::normal(self.default_ttl)).await
    }

    /// Expire the session on the client and in the backend
    ///
    /// On success the request continues with a fresh empty bag, so a later
    /// [`save`](Self::save) in the same request starts a new session.
    pub async fn delete(&self, ctx: &mut RequestContext) -> Result<()> {
        self.persist(ctx, SessionOptions::expire_immediately()).await
    }

    async fn persist(&self, ctx: &mut RequestContext, options: SessionOptions) -> Result<()> {
        self.get(ctx).await;
        let Some(bag) = ctx.session.take() else {
            return Ok(());
        };

        let result = self.store.persist(ctx, &bag, &options).await;

        match &result {
            // An expired session is gone for good: later writes in this
            // request start over under a new identifier.
            Ok(()) if options.is_expiring() => ctx.session = Some(self.store.fresh_bag()),
            Ok(()) => ctx.session = Some(bag),
            Err(e) => {
                tracing::error!(
                    backend = self.store.name(),
                    expiring = options.is_expiring(),
                    error = %e,
                    "Failed to persist session"
                );
                ctx.session = Some(bag);
            }
        }
        result
    }

    /// Encode `value` and store it under `key`
    ///
    /// On failure the bag is left untouched. Nothing is persisted.
    ///
    /// # Errors
    ///
    /// [`SessionError::Encoding`] if the value cannot be encoded,
    /// [`SessionError::ReservedKey`] if `key` starts with [`RESERVED_PREFIX`].
    pub async fn set_value<T>(&self, ctx: &mut RequestContext, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        if key.starts_with(RESERVED_PREFIX) {
            return Err(SessionError::reserved_key(key));
        }
        self.set_encoded(ctx, key, value).await
    }

    async fn set_encoded<T>(&self, ctx: &mut RequestContext, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let encoded = ValueCodec::encode(value)?;
        self.get(ctx).await.insert(key, encoded);
        Ok(())
    }

    /// Textual value stored under `key`, or `""` when absent or null
    pub async fn get_value(&self, ctx: &mut RequestContext, key: &str) -> String {
        ValueCodec::to_text(self.get(ctx).await.get(key))
    }

    /// Decode the value stored under `key` into `T`
    pub async fn get_decoded<T>(&self, ctx: &mut RequestContext, key: &str) -> Decoded<T>
    where
        T: DeserializeOwned,
    {
        match self.get(ctx).await.get(key) {
            Some(text) => ValueCodec::decode(text),
            None => Decoded::Absent,
        }
    }

    /// Remove an application value from the bag. Nothing is persisted.
    pub async fn remove_value(&self, ctx: &mut RequestContext, key: &str) -> Option<String> {
        self.get(ctx).await.remove(key)
    }

    /// Store the current identity, replacing any previous one
    pub async fn set_identity<I>(&self, ctx: &mut RequestContext, identity: &I) -> Result<()>
    where
        I: Serialize,
    {
        self.set_encoded(ctx, IDENTITY_KEY, identity).await
    }

    /// The current identity, or `None` if absent or unreadable
    pub async fn get_identity<I>(&self, ctx: &mut RequestContext) -> Option<I>
    where
        I: DeserializeOwned,
    {
        match self.identity(ctx).await {
            Decoded::Value(identity) => Some(identity),
            Decoded::Absent => None,
            Decoded::Invalid(e) => {
                tracing::debug!(error = %e, "Ignoring unreadable session identity");
                None
            }
        }
    }

    /// The current identity as a tagged result
    ///
    /// Distinguishes "nothing stored" from "stored but unreadable" for
    /// callers that need it.
    pub async fn identity<I>(&self, ctx: &mut RequestContext) -> Decoded<I>
    where
        I: DeserializeOwned,
    {
        self.get_decoded(ctx, IDENTITY_KEY).await
    }

    /// Drop the identity from the bag, keeping other values. Nothing is persisted.
    pub async fn clear_identity(&self, ctx: &mut RequestContext) {
        self.get(ctx).await.remove(IDENTITY_KEY);
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("backend", &self.store.name())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
