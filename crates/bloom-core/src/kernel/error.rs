//! # Bloom Kernel Errors
//!
//! Defines the top-level error type of the Bloom kernel.
//!
//! [`Error`] folds together the typed errors of every subsystem (container,
//! providers, events, configuration, HTTP kernel) and adds the two kernel-level
//! kinds: lifecycle failures tagged with the phase they happened in, and the
//! "instance unavailable" precondition failure raised when the process-wide
//! application is requested before it exists.
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::error::ConfigError;
use crate::container::error::ContainerError;
use crate::event::error::EventSystemError;
use crate::http::error::HttpKernelError;
use crate::provider::error::ProviderError;

/// Custom error type for the Bloom kernel
#[derive(Debug, ThisError)]
pub enum Error {
    /// Service container lookup or factory failure
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    /// Service provider resolution, registration or boot failure
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Event system error
    #[error("Event system error: {0}")]
    EventSystem(#[from] EventSystemError),

    /// Configuration loading or parsing error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP kernel pipeline error
    #[error("HTTP kernel error: {0}")]
    HttpKernel(#[from] HttpKernelError),

    /// A process-scoped instance was requested before it was constructed.
    #[error("Unavailable [{0}] instance")]
    InstanceUnavailable(&'static str),

    /// Error occurring during a specific kernel lifecycle phase.
    #[error("Kernel lifecycle error during {phase}: {message}")]
    KernelLifecycleError {
        phase: KernelLifecyclePhase,
        component_name: Option<String>,
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// A `.env` source could not be read or parsed
    #[error("Environment file '{origin}' could not be loaded: {source}")]
    EnvFile {
        origin: String,
        #[source]
        source: dotenvy::Error,
    },

    #[error("I/O error during operation '{operation}' on path '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Represents a specific phase in the application lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum KernelLifecyclePhase {
    #[error("PreBuild")]
    PreBuild,
    #[error("Config")]
    Config,
    #[error("Container")]
    Container,
    #[error("Proxies")]
    Proxies,
    #[error("Boot")]
    Boot,
    #[error("Session")]
    Session,
    #[error("Locale")]
    Locale,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl Error {
    /// Helper to create an I/O error with context
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        Error::Io {
            source,
            operation: operation.into(),
            path,
        }
    }

    /// Wrap `self` as the cause of a lifecycle failure in `phase`.
    pub fn in_phase(self, phase: KernelLifecyclePhase, component_name: Option<String>, message: impl Into<String>) -> Self {
        Error::KernelLifecycleError {
            phase,
            component_name,
            message: message.into(),
            source: Some(Box::new(self)),
        }
    }

    /// Whether this error is the "instance unavailable" precondition failure.
    pub fn is_instance_unavailable(&self) -> bool {
        matches!(self, Error::InstanceUnavailable(_))
    }
}
