use std::time::Duration;

/// Lifetime and scope attached to a session when it is persisted
///
/// Backends translate these into cookie attributes (`Path`, `HttpOnly`,
/// `Max-Age`) and, for server-side stores, into the record TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub path: String,
    /// Deny client-side script access to the cookie
    pub http_only: bool,
    /// Lifetime in seconds; `None` is a browser-session cookie, `<= 0` deletes
    pub max_age: Option<i64>,
}

impl SessionOptions {
    /// Options used on save: root path, no script access, configured expiry
    pub fn normal(ttl: Duration) -> Self {
        Self {
            path: "/".to_string(),
            http_only: true,
            max_age: Some(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
        }
    }

    /// Options used on delete: the backend drops the session on or before the next read
    pub fn expire_immediately() -> Self {
        Self {
            path: "/".to_string(),
            http_only: true,
            max_age: Some(-1),
        }
    }

    /// Whether persisting with these options removes the session
    pub fn is_expiring(&self) -> bool {
        matches!(self.max_age, Some(age) if age <= 0)
    }

    /// Positive lifetime, if any
    pub fn ttl(&self) -> Option<Duration> {
        match self.max_age {
            Some(age) if age > 0 => Some(Duration::from_secs(age as u64)),
            _ => None,
        }
    }
}
