//! # Bloom Core
//!
//! Application kernel of the Bloom web framework: the application lifecycle,
//! a service container with stable short-name aliases, service providers,
//! the lifecycle event bus and the request/response pipeline.
//!
//! ```rust,ignore
//! let app = bloom_core::Application::create("/srv/app")?;
//! app.build().await?;
//! let kernel = app.kernel()?;
//! let response = kernel.handle(request).await?;
//! ```
pub mod config;
pub mod container;
pub mod env;
pub mod event;
pub mod http;
pub mod kernel;
pub mod provider;
pub mod utils;

pub use config::Configurator;
pub use container::ServiceContainer;
pub use event::{Event, EventResult, SharedEventDispatcher};
pub use kernel::error::Error as KernelError;
pub use kernel::{Application, Kernel, Result};
pub use provider::{BootableServiceProvider, ServiceProvider};

use std::sync::Arc;

/// The process-wide application. Fails until one is installed.
pub fn app() -> Result<Arc<Application>> {
    Application::instance()
}
