//! Seam for an optional session service.
//!
//! The kernel ships no session implementation. When one is registered under
//! [`ids::SESSION_MANAGER`](crate::container::ids::SESSION_MANAGER) as an
//! `Arc<dyn SessionManager>`, the build starts it and the HTTP kernel tags
//! each request with the [`ActiveSession`]. Failures on this path are logged
//! and never stop a build or a request.
use async_trait::async_trait;

use crate::kernel::error::Result;

#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Open or resume the session.
    async fn start(&self) -> Result<()>;

    /// Id of the started session, `None` before `start` succeeds.
    fn session_id(&self) -> Option<String>;
}

/// Request extension naming the session the request belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub id: String,
}
