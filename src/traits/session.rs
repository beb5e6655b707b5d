//! Session storage trait
//!
//! This trait abstracts where session state lives, allowing the manager to
//! swap between encrypted-cookie and shared-store backends.

use crate::error::Result;
use crate::session::{RequestContext, SessionBag, SessionOptions};
use async_trait::async_trait;

/// Session storage trait
///
/// Implementations must be safe to share across concurrently handled
/// requests; any connection pooling or locking is their own concern.
#[async_trait]
#[allow(async_fn_in_trait)] // async_trait macro handles Send/Sync bounds
pub trait SessionStore: Send + Sync {
    /// Load the request's session, or create a fresh one
    ///
    /// Never fails: a missing, corrupt or unreadable session, or an
    /// unreachable backend, yields a fresh empty bag.
    async fn fetch_or_create(&self, ctx: &RequestContext) -> SessionBag;

    /// A fresh empty bag in this backend's shape
    ///
    /// Server-side stores assign a new identifier; client-side stores do not.
    fn fresh_bag(&self) -> SessionBag;

    /// Write the bag through to the backend with the given options
    ///
    /// Options with a non-positive max-age remove the session. Failures are
    /// reported as [`SessionError::Persistence`](crate::SessionError::Persistence)
    /// and are never retried here.
    async fn persist(
        &self,
        ctx: &mut RequestContext,
        bag: &SessionBag,
        options: &SessionOptions,
    ) -> Result<()>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Check if the session store is healthy
    fn is_healthy(&self) -> bool;
}
