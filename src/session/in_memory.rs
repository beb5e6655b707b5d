use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use super::bag::SessionBag;
use super::cookie::session_cookie;
use super::id_cookie::{SignedIdCookie, new_session_id};
use super::key::session_key;
use super::{RequestContext, SessionConfig, SessionOptions};
use crate::error::{Result, SessionError};
use crate::traits::session::SessionStore;

struct StoredSession {
    values: HashMap<String, String>,
    expires_at: Instant,
}

impl StoredSession {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory server-side session store
///
/// Same cookie protocol as the Redis store (signed session id, values held
/// server-side) but backed by a `HashMap`. Suitable for development and
/// testing, not for production: sessions are lost on restart and not shared
/// across instances.
#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
    ids: SignedIdCookie,
    config: SessionConfig,
}

impl InMemorySessionStore {
    /// Create a new in-memory session store
    pub fn new(config: &SessionConfig) -> Result<Self> {
        Ok(Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ids: SignedIdCookie::new(session_key(config)?, config.cookie_name.clone()),
            config: config.clone(),
        })
    }

    /// Number of stored sessions, including expired ones not yet cleaned up
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Remove expired sessions, returning how many were dropped
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let initial_len = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        initial_len - sessions.len()
    }

    async fn load(&self, id: &str) -> Option<HashMap<String, String>> {
        let expired = match self.sessions.read().await.get(id) {
            Some(session) if !session.is_expired() => return Some(session.values.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.sessions.write().await.remove(id);
        }
        None
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn fetch_or_create(&self, ctx: &RequestContext) -> SessionBag {
        if let Some(id) = self.ids.read(ctx) {
            if let Some(values) = self.load(&id).await {
                return SessionBag::restored(Some(id), values);
            }
        }

        self.fresh_bag()
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

        if options.is_expiring() {
            self.sessions.write().await.remove(id);
            ctx.add_cookie(session_cookie(&self.config, String::new(), options));
            return Ok(());
        }

        let ttl = options.ttl().unwrap_or_else(|| self.config.default_ttl());
        let stored = StoredSession {
            values: bag.to_payload().values,
            expires_at: Instant::now() + ttl,
        };
        self.sessions.write().await.insert(id.to_string(), stored);

        ctx.add_cookie(session_cookie(&self.config, self.ids.sign(id), options));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }

    fn is_healthy(&self) -> bool {
        true // In-memory store is always healthy
    }
}

impl std::fmt::Debug for InMemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySessionStore")
            .field("cookie_name", &self.config.cookie_name)
            .finish_non_exhaustive()
    }
}
