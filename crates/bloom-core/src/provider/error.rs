//! # Bloom Provider Errors
//!
//! Every [`ProviderError`] is a configuration mistake and aborts the build.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("ServiceProvider [{0}] is not known to the provider catalog")]
    Unresolvable(String),

    #[error("ServiceProvider [{definition}] type not supported")]
    UnsupportedDefinition { definition: String },

    #[error("ServiceProvider [{name}] instantiation failed: {reason}")]
    InstantiationFailed { name: String, reason: String },
}
