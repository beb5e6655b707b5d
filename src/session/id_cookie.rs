use cookie::{Cookie, CookieJar, Key};
use std::sync::Arc;

use super::RequestContext;

/// Session-id cookie for server-side stores
///
/// The cookie carries only the session identifier, signed so that clients
/// cannot forge or enumerate ids.
#[derive(Clone)]
pub(crate) struct SignedIdCookie {
    key: Arc<Key>,
    name: String,
}

impl SignedIdCookie {
    pub(crate) fn new(key: Key, name: impl Into<String>) -> Self {
        Self {
            key: Arc::new(key),
            name: name.into(),
        }
    }

    /// Verified session id from the incoming request
    pub(crate) fn read(&self, ctx: &RequestContext) -> Option<String> {
        let raw = ctx.cookie(&self.name)?;

        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(self.name.clone(), raw.to_string()));

        match jar.signed(&self.key).get(&self.name) {
            Some(cookie) if !cookie.value().is_empty() => Some(cookie.value().to_string()),
            _ => {
                tracing::debug!("Session id cookie failed verification");
                None
            }
        }
    }

    /// Signed cookie value for `id`
    pub(crate) fn sign(&self, id: &str) -> String {
        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key)
            .add(Cookie::new(self.name.clone(), id.to_string()));

        jar.get(&self.name)
            .map(|cookie| cookie.value().to_string())
            .unwrap_or_default()
    }
}

/// Fresh random session identifier
pub(crate) fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> SignedIdCookie {
        SignedIdCookie::new(Key::generate(), "GSESSION")
    }

    #[test]
    fn test_sign_then_read() {
        let ids = signer();
        let signed = ids.sign("abc123");
        assert_ne!(signed, "abc123");

        let ctx = RequestContext::new().with_cookie("GSESSION", signed);
        assert_eq!(ids.read(&ctx), Some("abc123".to_string()));
    }

    #[test]
    fn test_unsigned_id_rejected() {
        let ctx = RequestContext::new().with_cookie("GSESSION", "abc123");
        assert_eq!(signer().read(&ctx), None);
    }

    #[test]
    fn test_other_key_rejected() {
        let signed = signer().sign("abc123");
        let ctx = RequestContext::new().with_cookie("GSESSION", signed);
        assert_eq!(signer().read(&ctx), None);
    }

    #[test]
    fn test_new_session_ids_are_unique() {
        assert_ne!(new_session_id(), new_session_id());
        assert_eq!(new_session_id().len(), 32);
    }
}
