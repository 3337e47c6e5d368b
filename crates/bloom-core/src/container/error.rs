//! # Bloom Container Errors
//!
//! Defines [`ContainerError`]. Callers that treat a service as optional match
//! on [`ContainerError::NotFound`] and carry on; every other variant means the
//! service exists but is misconfigured.
use thiserror::Error;

/// Boxed error returned by service factories
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Service '{id}' is not registered in the container")]
    NotFound { id: String },

    #[error("Service '{id}' could not be resolved: {source}")]
    ResolutionFailed {
        id: String,
        #[source]
        source: BoxError,
    },

    #[error("Service '{id}' is not of the requested type '{expected}'")]
    TypeMismatch { id: String, expected: &'static str },
}

impl ContainerError {
    /// Whether the service is simply absent (as opposed to broken).
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContainerError::NotFound { .. })
    }
}
