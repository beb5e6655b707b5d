//! webapp-session - session management for web application backends
//!
//! Lets request handlers read and write per-user session state without
//! knowing whether it lives in an encrypted client-side cookie or in Redis,
//! and stores the signed-in identity as a typed value inside the otherwise
//! string-keyed session bag.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use webapp_session::{ConfigBuilder, RequestContext, SessionManager};
//! use webapp_session::model::{Account, Authority};
//!
//! # async fn run() -> webapp_session::Result<()> {
//! webapp_session::init_tracing();
//!
//! let config = ConfigBuilder::new().from_env().build()?;
//!
//! // Fails if Redis is enabled but unreachable: do not start serving
//! let sessions = SessionManager::from_config(&config.session).await?;
//!
//! let mut ctx = RequestContext::new();
//! let account = Account::new(1, "test", Authority { id: 1, name: "Admin".into() });
//! sessions.set_identity(&mut ctx, &account).await?;
//! sessions.save(&mut ctx).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod http;
pub mod model;
pub mod session;
pub mod traits;
pub mod utils;

pub use config::{Config, ConfigBuilder, LoggingConfig, ServerConfig};
pub use error::{Result, SessionError};
pub use session::{
    Decoded, RequestContext, SessionBag, SessionConfig, SessionManager, SessionOptions, ValueCodec,
};
pub use traits::session::SessionStore;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "webapp_session=debug")
/// - `WEBAPP_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("WEBAPP_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
