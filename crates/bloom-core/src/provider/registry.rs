use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::container::ServiceContainer;
use crate::kernel::bootstrap::Application;
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::provider::error::ProviderError;
use crate::provider::traits::{BootableServiceProvider, ServiceProvider};

/// Builds a provider for the application it will serve
pub type ProviderConstructor = Arc<dyn Fn(&Application) -> Result<Arc<dyn ServiceProvider>> + Send + Sync>;

/// How a provider is declared
#[derive(Clone)]
pub enum ProviderRef {
    /// Looked up in the [`ProviderCatalog`]
    Named(String),
    /// Already constructed
    Instance(Arc<dyn ServiceProvider>),
}

impl ProviderRef {
    pub fn named(name: impl Into<String>) -> Self {
        ProviderRef::Named(name.into())
    }

    pub fn instance<P: ServiceProvider + 'static>(provider: P) -> Self {
        ProviderRef::Instance(Arc::new(provider))
    }

    /// Interpret one entry of the `app.providers` configuration list.
    pub fn from_value(value: &Value) -> std::result::Result<Self, ProviderError> {
        match value {
            Value::String(name) => Ok(ProviderRef::Named(name.clone())),
            other => Err(ProviderError::UnsupportedDefinition {
                definition: other.to_string(),
            }),
        }
    }

    /// Name for logs and errors
    pub fn label(&self) -> String {
        match self {
            ProviderRef::Named(name) => name.clone(),
            ProviderRef::Instance(provider) => provider.name().to_string(),
        }
    }
}

impl fmt::Debug for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            ProviderRef::Instance(provider) => f.debug_tuple("Instance").field(&provider.name()).finish(),
        }
    }
}

impl From<Arc<dyn ServiceProvider>> for ProviderRef {
    fn from(provider: Arc<dyn ServiceProvider>) -> Self {
        ProviderRef::Instance(provider)
    }
}

/// Named provider constructors.
#[derive(Clone, Default)]
pub struct ProviderCatalog {
    constructors: HashMap<String, ProviderConstructor>,
}

impl fmt::Debug for ProviderCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCatalog").field("names", &self.names()).finish()
    }
}

impl ProviderCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name` constructible. A later registration under the same name wins.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&Application) -> Result<Arc<dyn ServiceProvider>> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Produce a provider object from its declaration.
    pub fn instantiate(&self, definition: &ProviderRef, app: &Application) -> Result<Arc<dyn ServiceProvider>> {
        match definition {
            ProviderRef::Instance(provider) => Ok(provider.clone()),
            ProviderRef::Named(name) => {
                let constructor = self
                    .constructors
                    .get(name)
                    .ok_or_else(|| ProviderError::Unresolvable(name.clone()))?;
                constructor(app).map_err(|e| {
                    ProviderError::InstantiationFailed {
                        name: name.clone(),
                        reason: e.to_string(),
                    }
                    .into()
                })
            }
        }
    }
}

/// Registered providers plus the queue of those to boot.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ServiceProvider>>,
    bootable: Vec<Arc<dyn BootableServiceProvider>>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .field("bootable_count", &self.bootable.len())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `provider`'s registration and queue it for boot if it is bootable.
    pub async fn register(&mut self, provider: Arc<dyn ServiceProvider>, container: &ServiceContainer) -> Result<()> {
        let name = provider.name().to_string();
        log::debug!("Registering service provider '{}'", name);
        provider.register(container).await.map_err(|e| {
            e.in_phase(
                KernelLifecyclePhase::Container,
                Some(name.clone()),
                "service provider registration failed",
            )
        })?;

        if let Some(bootable) = provider.clone().into_bootable() {
            self.bootable.push(bootable);
        }
        self.providers.push(provider);
        Ok(())
    }

    /// Boot every bootable provider in registration order. The first failure aborts.
    pub async fn boot_all(&self, app: &Application) -> Result<usize> {
        for provider in &self.bootable {
            log::debug!("Booting service provider '{}'", provider.name());
            provider.boot(app).await.map_err(|e: Error| {
                e.in_phase(
                    KernelLifecyclePhase::Boot,
                    Some(provider.name().to_string()),
                    "service provider boot failed",
                )
            })?;
        }
        Ok(self.bootable.len())
    }

    pub fn providers(&self) -> &[Arc<dyn ServiceProvider>] {
        &self.providers
    }

    pub fn bootable_count(&self) -> usize {
        self.bootable.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|provider| provider.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
