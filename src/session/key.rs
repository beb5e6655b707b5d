use cookie::Key;

use super::SessionConfig;
use crate::error::{Result, SessionError};

/// Number of key bytes the `cookie` crate needs for signing and encryption
const KEY_LEN: usize = 64;

/// Derive the cookie key from configuration
///
/// # Errors
///
/// Returns [`SessionError::Config`] if:
/// - No `secret_key` is provided and `allow_insecure_key` is `false`
/// - The `secret_key` is not valid hex or not exactly 64 bytes (128 hex chars)
pub(crate) fn session_key(config: &SessionConfig) -> Result<Key> {
    if let Some(ref key_str) = config.secret_key {
        let key_bytes = hex::decode(key_str)
            .map_err(|e| SessionError::config(format!("Invalid session secret key format: {}", e)))?;

        if key_bytes.len() != KEY_LEN {
            return Err(SessionError::config(
                "Session secret key must be 64 bytes (128 hex characters). Generate with: openssl rand -hex 64",
            ));
        }

        Ok(Key::from(&key_bytes))
    } else if config.allow_insecure_key {
        tracing::error!(
            "SECURITY WARNING: using a randomly generated session key. \
            Sessions will not survive restarts or span multiple instances. \
            Set SESSION_SECRET_KEY (generate with: openssl rand -hex 64)."
        );
        Ok(Key::generate())
    } else {
        Err(SessionError::config(
            "Sessions require a secret key. \
            Set SESSION_SECRET_KEY or config.secret_key. \
            Generate a key with: openssl rand -hex 64. \
            For development only, set SESSION_ALLOW_INSECURE_KEY=true.",
        ))
    }
}

#[cfg(test)]
pub(crate) const TEST_SECRET_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
