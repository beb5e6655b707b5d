//! Cookie-based session store
//!
//! Stores the whole session bag in an encrypted cookie. The bag is serialized
//! to JSON and encrypted with the `cookie` crate's private cookies
//! (authenticated encryption), so clients can neither read nor forge it.

use async_trait::async_trait;
use cookie::{Cookie, CookieJar, Key, SameSite};
use std::sync::Arc;

use super::bag::{SessionBag, SessionPayload};
use super::key::session_key;
use super::{RequestContext, SessionConfig, SessionOptions};
use crate::error::{Result, SessionError};
use crate::traits::session::SessionStore;

/// Largest cookie (name plus encoded value) browsers reliably accept
pub const MAX_COOKIE_SIZE: usize = 4096;

/// Browsers count the name and the value against the size limit
fn ensure_fits(name: &str, value: &str) -> Result<()> {
    let size = name.len() + value.len();
    if size > MAX_COOKIE_SIZE {
        return Err(SessionError::persistence(format!(
            "Session cookie is {} bytes, larger than the {} byte limit",
            size, MAX_COOKIE_SIZE
        )));
    }
    Ok(())
}

/// Build the session cookie carrying `value`, with attributes from `options`
///
/// Expiring options produce a removal cookie.
pub(crate) fn session_cookie(
    config: &SessionConfig,
    value: String,
    options: &SessionOptions,
) -> Cookie<'static> {
    let mut builder = Cookie::build((config.cookie_name.clone(), value))
        .path(options.path.clone())
        .http_only(options.http_only)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax);

    if let Some(ref domain) = config.cookie_domain {
        builder = builder.domain(domain.clone());
    }

    if let Some(age) = options.max_age {
        builder = builder.max_age(cookie::time::Duration::seconds(age));
    }

    let mut cookie = builder.build();
    if options.is_expiring() {
        cookie.make_removal();
    }
    cookie
}

/// Cookie-based session store
///
/// Suitable for stateless deployments where session data is small: the
/// encrypted cookie must stay under [`MAX_COOKIE_SIZE`].
#[derive(Clone)]
pub struct CookieSessionStore {
    key: Arc<Key>,
    config: SessionConfig,
}

impl CookieSessionStore {
    /// Create a new cookie session store
    ///
    /// # Errors
    ///
    /// Returns an error if no usable secret key is configured.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        Ok(Self {
            key: Arc::new(session_key(config)?),
            config: config.clone(),
        })
    }

    /// Encrypt the bag's contents into a cookie value
    pub fn encrypt(&self, bag: &SessionBag) -> Result<String> {
        let serialized = serde_json::to_string(&bag.to_payload())
            .map_err(|e| SessionError::persistence(format!("Failed to serialize session: {}", e)))?;

        let mut jar = CookieJar::new();
        jar.private_mut(&self.key)
            .add(Cookie::new(self.config.cookie_name.clone(), serialized));

        let encrypted = jar
            .get(&self.config.cookie_name)
            .ok_or_else(|| SessionError::persistence("Failed to encrypt session cookie"))?;

        Ok(encrypted.value().to_string())
    }

    /// Decrypt a cookie value back into a bag
    ///
    /// Returns `None` if the cookie is tampered with, encrypted with a
    /// different key, or does not hold a session payload.
    pub fn decrypt(&self, encrypted_value: &str) -> Option<SessionBag> {
        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(
            self.config.cookie_name.clone(),
            encrypted_value.to_string(),
        ));

        let decrypted = jar.private(&self.key).get(&self.config.cookie_name)?;

        match serde_json::from_str::<SessionPayload>(decrypted.value()) {
            Ok(payload) => Some(SessionBag::restored(None, payload.values)),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding undecodable session cookie payload");
                None
            }
        }
    }
}

#[async_trait]
impl SessionStore for CookieSessionStore {
    async fn fetch_or_create(&self, ctx: &RequestContext) -> SessionBag {
        let Some(value) = ctx.cookie(&self.config.cookie_name) else {
            return self.fresh_bag();
        };

        self.decrypt(value).unwrap_or_else(|| {
            tracing::debug!("Session cookie rejected, starting a fresh session");
            self.fresh_bag()
        })
    }

    fn fresh_bag(&self) -> SessionBag {
        SessionBag::new()
    }

    async fn persist(
        &self,
        ctx: &mut RequestContext,
        bag: &SessionBag,
        options: &SessionOptions,
    ) -> Result<()> {
        if options.is_expiring() {
            ctx.add_cookie(session_cookie(&self.config, String::new(), options));
            return Ok(());
        }

        let value = self.encrypt(bag)?;
        ensure_fits(&self.config.cookie_name, &value)?;

        ctx.add_cookie(session_cookie(&self.config, value, options));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cookie"
    }

    fn is_healthy(&self) -> bool {
        true
    }
}
