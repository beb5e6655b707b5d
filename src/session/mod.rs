//! Session management and storage.
//!
//! [`SessionManager`] binds once to an encrypted-cookie or Redis backend and
//! exposes per-request operations over a string-keyed [`SessionBag`], with a
//! typed convenience for the signed-in identity.

mod bag;
mod codec;
mod config;
mod context;
mod cookie;
mod finite;
mod id_cookie;
mod in_memory;
mod key;
mod manager;
mod options;

#[cfg(feature = "redis")]
mod redis;

pub use bag::SessionBag;
pub use codec::{Decoded, NULL_MARKER, ValueCodec};
pub use config::{RedisConfig, SessionBackend, SessionConfig};
pub use context::RequestContext;
pub use cookie::{CookieSessionStore, MAX_COOKIE_SIZE};
pub use in_memory::InMemorySessionStore;
pub use manager::{IDENTITY_KEY, RESERVED_PREFIX, SessionManager};
pub use options::SessionOptions;

#[cfg(feature = "redis")]
pub use redis::RedisSessionStore;
