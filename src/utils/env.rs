/// Get environment variable with WEBAPP_ prefix, falling back to unprefixed version
///
/// Checks `WEBAPP_{key}` first, then `{key}`, so deployments can either
/// namespace their variables or use the conventional names (`REDIS_HOST`).
///
/// # Examples
///
/// ```rust
/// use webapp_session::utils::get_env_with_prefix;
///
/// // Checks WEBAPP_REDIS_HOST first, then REDIS_HOST
/// let host = get_env_with_prefix("REDIS_HOST");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("WEBAPP_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Parse an environment variable, keeping `default` when unset or unparsable
pub fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match get_env_with_prefix(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable environment variable");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_with_prefix() {
        unsafe {
            std::env::set_var("WEBAPP_SESSION_TEST_VAR", "prefixed_value");
        }
        assert_eq!(get_env_with_prefix("SESSION_TEST_VAR"), Some("prefixed_value".to_string()));
        unsafe {
            std::env::remove_var("WEBAPP_SESSION_TEST_VAR");
        }

        unsafe {
            std::env::set_var("SESSION_FALLBACK_VAR", "unprefixed_value");
        }
        assert_eq!(get_env_with_prefix("SESSION_FALLBACK_VAR"), Some("unprefixed_value".to_string()));
        unsafe {
            std::env::remove_var("SESSION_FALLBACK_VAR");
        }

        assert_eq!(get_env_with_prefix("SESSION_NON_EXISTENT_VAR"), None);
    }

    #[test]
    fn test_parse_env_or() {
        unsafe {
            std::env::set_var("WEBAPP_PARSE_TEST_POOL", "32");
            std::env::set_var("WEBAPP_PARSE_TEST_BAD", "many");
        }
        assert_eq!(parse_env_or("PARSE_TEST_POOL", 10usize), 32);
        assert_eq!(parse_env_or("PARSE_TEST_BAD", 10usize), 10);
        assert_eq!(parse_env_or("PARSE_TEST_MISSING", 7u16), 7);
        unsafe {
            std::env::remove_var("WEBAPP_PARSE_TEST_POOL");
            std::env::remove_var("WEBAPP_PARSE_TEST_BAD");
        }
    }
}
