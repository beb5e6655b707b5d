use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SessionError};
use crate::utils::{get_env_with_prefix, parse_env_or};

/// Session backend type
///
/// Derived from [`RedisConfig::enabled`]; there is no runtime re-selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// Encrypted client-side cookie (default)
    Cookie,
    /// Shared Redis store, session id carried in a signed cookie
    Redis,
}

impl Default for SessionBackend {
    fn default() -> Self {
        Self::Cookie
    }
}

/// Redis connection settings for the shared session store
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    /// Use Redis for sessions instead of cookies
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_redis_host")]
    pub host: String,

    #[serde(default = "default_redis_port")]
    pub port: u16,

    /// Maximum number of pooled connections
    #[serde(default = "default_pool_size")]
    pub connection_pool_size: usize,

    /// Timeout for establishing a connection and for waiting on the pool
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_redis_host(),
            port: default_redis_port(),
            connection_pool_size: default_pool_size(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
        }
    }
}

impl RedisConfig {
    /// Load Redis configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(enabled) = get_env_with_prefix("REDIS_ENABLED") {
            config.enabled = enabled.parse().unwrap_or(false);
        }

        if let Some(host) = get_env_with_prefix("REDIS_HOST") {
            config.host = host;
        }

        config.port = parse_env_or("REDIS_PORT", config.port);
        config.connection_pool_size =
            parse_env_or("REDIS_CONNECTION_POOL_SIZE", config.connection_pool_size);
        config.connect_timeout_seconds =
            parse_env_or("REDIS_CONNECT_TIMEOUT_SECONDS", config.connect_timeout_seconds);

        config
    }

    /// `redis://host:port/` connection URL
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }

    /// `host:port`, used in log lines
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Shared-store settings; `redis.enabled` selects the backend
    #[serde(default)]
    pub redis: RedisConfig,

    /// Default session lifetime (in seconds), applied on every save
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,

    /// Name of the session cookie
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Cookie domain (optional)
    #[serde(default)]
    pub cookie_domain: Option<String>,

    /// Cookie secure flag (HTTPS only)
    #[serde(default)]
    pub cookie_secure: bool,

    /// Key protecting session cookies (64 bytes hex-encoded)
    ///
    /// Encrypts the whole session for the cookie backend and signs the
    /// session id for the Redis backend. Generate with: `openssl rand -hex 64`
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Allow a random per-process key when `secret_key` is unset
    ///
    /// Development only: sessions do not survive restarts or span instances.
    #[serde(default)]
    pub allow_insecure_key: bool,

    /// Prefix of Redis keys holding session payloads
    #[serde(default = "default_key_prefix")]
    pub redis_key_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            default_ttl_seconds: default_ttl_seconds(),
            cookie_name: default_cookie_name(),
            cookie_domain: None,
            cookie_secure: false,
            secret_key: None,
            allow_insecure_key: false,
            redis_key_prefix: default_key_prefix(),
        }
    }
}

impl SessionConfig {
    /// Load session configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self {
            redis: RedisConfig::from_env(),
            ..Self::default()
        };

        config.default_ttl_seconds = parse_env_or("SESSION_TTL_SECONDS", config.default_ttl_seconds);

        if let Some(name) = get_env_with_prefix("SESSION_COOKIE_NAME") {
            config.cookie_name = name;
        }

        if let Some(domain) = get_env_with_prefix("SESSION_COOKIE_DOMAIN") {
            config.cookie_domain = Some(domain);
        }

        if let Some(secure) = get_env_with_prefix("SESSION_COOKIE_SECURE") {
            config.cookie_secure = secure.parse().unwrap_or(false);
        }

        if let Some(key) = get_env_with_prefix("SESSION_SECRET_KEY") {
            config.secret_key = Some(key);
        }

        if let Some(allow) = get_env_with_prefix("SESSION_ALLOW_INSECURE_KEY") {
            config.allow_insecure_key = allow.parse().unwrap_or(false);
        }

        if let Some(prefix) = get_env_with_prefix("SESSION_REDIS_KEY_PREFIX") {
            config.redis_key_prefix = prefix;
        }

        config
    }

    /// Backend selected by this configuration
    pub fn backend(&self) -> SessionBackend {
        if self.redis.enabled {
            SessionBackend::Redis
        } else {
            SessionBackend::Cookie
        }
    }

    /// Get default TTL as Duration
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    /// Validate settings that would otherwise fail on first use
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl_seconds == 0 {
            return Err(SessionError::config("Session TTL must be greater than 0"));
        }

        if self.cookie_name.is_empty() {
            return Err(SessionError::config("Session cookie name must not be empty"));
        }

        if self.redis.enabled {
            if self.redis.host.is_empty() {
                return Err(SessionError::config("Redis host must not be empty when Redis is enabled"));
            }
            if self.redis.port == 0 {
                return Err(SessionError::config("Redis port must be greater than 0"));
            }
            if self.redis.connection_pool_size == 0 {
                return Err(SessionError::config("Redis connection pool size must be greater than 0"));
            }
        }

        Ok(())
    }
}

fn default_ttl_seconds() -> u64 {
    86400 * 30 // 30 days
}

fn default_cookie_name() -> String {
    "GSESSION".to_string()
}

fn default_key_prefix() -> String {
    "session_".to_string()
}

fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_pool_size() -> usize {
    10
}

fn default_connect_timeout_seconds() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backend_is_cookie() {
        let config = SessionConfig::default();
        assert_eq!(config.backend(), SessionBackend::Cookie);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_redis_flag_selects_redis() {
        let config = SessionConfig {
            redis: RedisConfig {
                enabled: true,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.backend(), SessionBackend::Redis);
        assert_eq!(config.redis.url(), "redis://127.0.0.1:6379/");
    }

    #[test]
    fn test_missing_flag_in_serialized_config_defaults_to_cookie() {
        let config: SessionConfig = serde_json::from_str(r#"{"redis": {"host": "cache"}}"#).unwrap();
        assert_eq!(config.backend(), SessionBackend::Cookie);
        assert_eq!(config.redis.host, "cache");
        assert_eq!(config.redis.connection_pool_size, 10);
    }

    #[test]
    fn test_validate_rejects_zero_pool_size() {
        let config = SessionConfig {
            redis: RedisConfig {
                enabled: true,
                connection_pool_size: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SessionError::Config(_))));
    }

    #[test]
    fn test_validate_ignores_redis_fields_when_disabled() {
        let config = SessionConfig {
            redis: RedisConfig {
                enabled: false,
                port: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = SessionConfig {
            default_ttl_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
