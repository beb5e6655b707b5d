use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, HeaderValue, header, request::Parts};
use cookie::Cookie;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;

use super::bag::SessionBag;

/// Per-request handle the session layer works against
///
/// Carries the cookies of the incoming request, collects the cookies the
/// backends want set on the response, and caches the request's session bag
/// so repeated reads within one request observe the same in-memory state.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     State(sessions): State<Arc<SessionManager>>,
///     mut ctx: RequestContext,
/// ) -> Result<impl IntoResponse> {
///     sessions.set_value(&mut ctx, "lang", "en").await?;
///     sessions.save(&mut ctx).await?;
///     Ok((ctx.into_response_headers(), "ok"))
/// }
/// ```
#[derive(Debug, Default)]
pub struct RequestContext {
    incoming: HashMap<String, String>,
    outgoing: Vec<Cookie<'static>>,
    pub(crate) session: Option<SessionBag>,
}

impl RequestContext {
    /// Context for a request that carries no cookies
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from the request's `Cookie` headers
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut incoming = HashMap::new();

        for value in headers.get_all(header::COOKIE) {
            let Ok(raw) = value.to_str() else {
                tracing::debug!("Skipping non-ASCII Cookie header");
                continue;
            };

            for cookie in Cookie::split_parse(raw).flatten() {
                incoming.insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }

        Self {
            incoming,
            ..Self::default()
        }
    }

    /// Add an incoming cookie
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.incoming.insert(name.into(), value.into());
        self
    }

    /// Value of an incoming cookie
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.incoming.get(name).map(String::as_str)
    }

    /// Queue a cookie for the response, replacing any earlier cookie of the same name
    pub fn add_cookie(&mut self, cookie: Cookie<'static>) {
        self.outgoing.retain(|existing| existing.name() != cookie.name());
        self.outgoing.push(cookie);
    }

    /// Cookies queued for the response
    pub fn outgoing_cookies(&self) -> &[Cookie<'static>] {
        &self.outgoing
    }

    /// The session bag cached for this request, if one was fetched
    pub fn session(&self) -> Option<&SessionBag> {
        self.session.as_ref()
    }

    /// `Set-Cookie` header values for every queued cookie
    pub fn set_cookie_headers(&self) -> Vec<HeaderValue> {
        self.outgoing
            .iter()
            .filter_map(|cookie| match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(cookie = cookie.name(), error = %e, "Dropping unrepresentable Set-Cookie header");
                    None
                }
            })
            .collect()
    }

    /// Append the queued `Set-Cookie` headers to a response header map
    pub fn write_headers(&self, headers: &mut HeaderMap) {
        for value in self.set_cookie_headers() {
            headers.append(header::SET_COOKIE, value);
        }
    }

    /// Consume the context into response headers (usable as axum response parts)
    pub fn into_response_headers(self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        self.write_headers(&mut headers);
        headers
    }

    /// Context of the next request a browser would send after this response
    ///
    /// Applies the queued cookies to the incoming ones: removal cookies
    /// (empty value or non-positive `Max-Age`) drop the cookie.
    pub fn next_request(&self) -> Self {
        let mut incoming = self.incoming.clone();

        for cookie in &self.outgoing {
            let expired = cookie
                .max_age()
                .is_some_and(|age| age <= cookie::time::Duration::ZERO);

            if expired || cookie.value().is_empty() {
                incoming.remove(cookie.name());
            } else {
                incoming.insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }

        Self {
            incoming,
            ..Self::default()
        }
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        std::future::ready(Ok(Self::from_headers(&parts.headers)))
    }
}
