//! # Bloom Configuration
//!
//! Configuration is a JSON value tree ([`ConfigData`]) addressed with dotted
//! keys. The application materialises it once during build by merging
//! environment-derived defaults, every file of the `config/` directory (keyed
//! by file name) and explicit parameters, in that order. The result lives in a
//! shared [`Configurator`] registered in the service container under the
//! `config` alias.
pub mod data;
pub mod error;
pub mod loader;

use std::sync::{PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use data::ConfigData;
pub use error::ConfigError;
pub use loader::{ConfigFormat, ConfigLoader};

/// Shared, runtime-mutable configuration store.
#[derive(Debug, Default)]
pub struct Configurator {
    data: RwLock<ConfigData>,
}

impl Configurator {
    pub fn new(data: ConfigData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Typed value at `key`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data.read().unwrap_or_else(PoisonError::into_inner).get(key)
    }

    /// Typed value at `key` with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Raw value at `key`
    pub fn value(&self, key: &str) -> Option<Value> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .value(key)
            .cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        self.data.read().unwrap_or_else(PoisonError::into_inner).has(key)
    }

    /// Runtime override of a single key
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<(), ConfigError> {
        self.data.write().unwrap_or_else(PoisonError::into_inner).set(key, value)
    }

    /// Deep-merge `other` over the current values
    pub fn merge(&self, other: &ConfigData) {
        self.data.write().unwrap_or_else(PoisonError::into_inner).merge(other);
    }

    /// Copy of the whole tree
    pub fn snapshot(&self) -> ConfigData {
        self.data.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
