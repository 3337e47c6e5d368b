use std::sync::Arc;

use async_trait::async_trait;

use crate::container::ServiceContainer;
use crate::kernel::bootstrap::Application;
use crate::kernel::error::Result;

/// A unit of registration logic.
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Container ids this provider binds. Informational only.
    fn provides(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Add this provider's bindings to `container`.
    ///
    /// Runs before any provider is booted, so other providers' bindings may
    /// not exist yet.
    async fn register(&self, container: &ServiceContainer) -> Result<()>;

    /// The bootable view of this provider, if it has one.
    ///
    /// Bootable providers override this to return `Some(self)`.
    fn into_bootable(self: Arc<Self>) -> Option<Arc<dyn BootableServiceProvider>> {
        None
    }
}

/// A provider with a post-registration setup step.
#[async_trait]
pub trait BootableServiceProvider: ServiceProvider {
    /// Called once, after every provider is registered.
    async fn boot(&self, app: &Application) -> Result<()>;
}
