//! # Bloom Kernel
//!
//! The `kernel` module is the lifecycle core of `bloom-core`.
//!
//! ## Key Responsibilities & Components:
//!
//! - **Application Lifecycle**: [`Application`](bootstrap::Application) runs the
//!   one-time pre-build on construction and the one-time build on demand,
//!   owns the service container and answers path, locale and environment
//!   queries.
//! - **Process Instance**: a set-once [`InstanceSlot`](instance::InstanceSlot)
//!   holds the process-wide application; reading it before installation is an
//!   error.
//! - **HTTP Entry Point**: [`Kernel`](runtime::Kernel) builds the application
//!   lazily and drives the request pipeline.
//! - **Session Seam**: the optional [`SessionManager`](session::SessionManager).
//! - **Core Constants** and **Error Handling** (`constants`, `error`).
pub mod bootstrap;
pub mod constants;
pub mod error;
pub mod instance;
pub mod runtime;
pub mod session;

pub use bootstrap::{Application, ApplicationBuilder, ProcessMode};
pub use error::{Error, KernelLifecyclePhase, Result};
pub use instance::InstanceSlot;
pub use runtime::Kernel;
pub use session::{ActiveSession, SessionManager};

// Test module declaration
#[cfg(test)]
mod tests;
