use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::error::{Result, SessionError};
use crate::session::SessionConfig;
use crate::utils::get_env_with_prefix;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    pub fn addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    /// Load configuration from environment variables with WEBAPP_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = get_env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }

        self.config.session = SessionConfig::from_env();

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] for an invalid server address, an
    /// unknown log level, or invalid session settings.
    pub fn build(self) -> Result<Config> {
        self.config.server.addr().map_err(|e| {
            SessionError::config(format!(
                "Invalid server address {}:{} - {}",
                self.config.server.host, self.config.server.port, e
            ))
        })?;

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(SessionError::config(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        self.config.session.validate()?;

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RedisConfig;

    #[test]
    fn test_default_config_builds() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(!config.session.redis.enabled);
    }

    #[test]
    fn test_invalid_host_rejected() {
        let result = ConfigBuilder::new().with_host("invalid..host").build();
        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let result = ConfigBuilder::new().with_log_level("loud").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_session_config_rejected() {
        let session = SessionConfig {
            redis: RedisConfig {
                enabled: true,
                host: String::new(),
                ..Default::default()
            },
            ..Default::default()
        };
        let result = ConfigBuilder::new().with_session(session).build();
        assert!(result.is_err());
    }
}
