//! # Bloom Service Providers
//!
//! A service provider registers bindings into the container. Providers that
//! also need to run setup logic once every binding exists implement
//! [`BootableServiceProvider`]; the application registers all providers first
//! and boots the bootable ones afterwards, in registration order.
//!
//! Providers are declared either as ready-made instances or by name. Named
//! providers are looked up in a [`ProviderCatalog`], which is how the
//! `app.providers` configuration list is turned into objects.
pub mod error;
pub mod registry;
pub mod traits;

pub use error::ProviderError;
pub use registry::{ProviderCatalog, ProviderConstructor, ProviderRef, ProviderRegistry};
pub use traits::{BootableServiceProvider, ServiceProvider};

// Test module declaration
#[cfg(test)]
mod tests;
