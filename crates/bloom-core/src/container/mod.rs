//! # Bloom Service Container
//!
//! A registry mapping service identifiers to shared instances, lazily-built
//! singletons or transient factories. Short names are translated to canonical
//! identifiers by an [`AliasTable`] before every lookup.
//!
//! Values are stored type-erased and handed back by clone, so services are
//! normally registered as `Arc<Concrete>` or `Arc<dyn Trait>`:
//!
//! ```rust,ignore
//! container.share(ids::CONFIGURATOR, Arc::new(Configurator::default()));
//! let config: Arc<Configurator> = container.get("config")?;
//! ```
pub mod alias;
pub mod error;
pub mod ids;

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use alias::AliasTable;
pub use error::{BoxError, ContainerError};

type AnyValue = Arc<dyn Any + Send + Sync>;
type FactoryFn = Arc<dyn Fn(&ServiceContainer) -> Result<AnyValue, BoxError> + Send + Sync>;

enum Binding {
    /// A ready-made shared instance
    Instance(AnyValue),
    /// Built on first request, then cached
    Shared { factory: FactoryFn, cached: Option<AnyValue> },
    /// Built on every request
    Transient(FactoryFn),
}

impl Binding {
    fn kind(&self) -> &'static str {
        match self {
            Binding::Instance(_) => "instance",
            Binding::Shared { .. } => "shared",
            Binding::Transient(_) => "transient",
        }
    }
}

/// Dependency-injection container with alias resolution.
pub struct ServiceContainer {
    bindings: RwLock<HashMap<String, Binding>>,
    aliases: RwLock<AliasTable>,
}

impl ServiceContainer {
    /// Create an empty container with no aliases.
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
            aliases: RwLock::new(AliasTable::new()),
        }
    }

    fn read_bindings(&self) -> RwLockReadGuard<'_, HashMap<String, Binding>> {
        self.bindings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_bindings(&self) -> RwLockWriteGuard<'_, HashMap<String, Binding>> {
        self.bindings.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Canonical id for `id` after alias resolution.
    pub fn canonical_id(&self, id: &str) -> String {
        self.aliases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(id)
            .to_string()
    }

    /// Register `alias` as a short name for `id`.
    pub fn alias(&self, alias: impl Into<String>, id: impl Into<String>) {
        self.aliases
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .alias(alias, id);
    }

    /// Merge a whole alias table into the container's.
    pub fn register_aliases(&self, table: AliasTable) {
        self.aliases
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(table);
    }

    /// Snapshot of the alias table.
    pub fn aliases(&self) -> AliasTable {
        self.aliases.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Share a ready-made instance under `id`.
    pub fn share<T>(&self, id: impl Into<String>, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        let id = id.into();
        log::debug!("Sharing instance '{}'", id);
        self.write_bindings().insert(id, Binding::Instance(Arc::new(value)));
    }

    /// Share a lazily-built singleton under `id`.
    pub fn share_factory<T, F>(&self, id: impl Into<String>, factory: F)
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&ServiceContainer) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let id = id.into();
        log::debug!("Sharing factory '{}'", id);
        self.write_bindings().insert(
            id,
            Binding::Shared {
                factory: Self::erase(factory),
                cached: None,
            },
        );
    }

    /// Register a transient factory under `id`; every `get` builds a new value.
    pub fn add<T, F>(&self, id: impl Into<String>, factory: F)
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&ServiceContainer) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let id = id.into();
        log::debug!("Adding transient factory '{}'", id);
        self.write_bindings().insert(id, Binding::Transient(Self::erase(factory)));
    }

    fn erase<T, F>(factory: F) -> FactoryFn
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&ServiceContainer) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Arc::new(move |container: &ServiceContainer| {
            factory(container).map(|value| Arc::new(value) as AnyValue)
        })
    }

    /// Remove the binding for `id` (after alias resolution). Returns whether one existed.
    pub fn forget(&self, id: &str) -> bool {
        let canonical = self.canonical_id(id);
        self.write_bindings().remove(&canonical).is_some()
    }

    /// Whether `id` (or the id it aliases) is bound.
    pub fn has(&self, id: &str) -> bool {
        let canonical = self.canonical_id(id);
        self.read_bindings().contains_key(&canonical)
    }

    /// Canonical ids of every binding, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read_bindings().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Resolve `id` to a value of type `T`.
    pub fn get<T>(&self, id: &str) -> Result<T, ContainerError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.get_with(id, false)
    }

    /// Resolve `id`, running its factory even when a singleton is cached.
    ///
    /// Plain instances have no factory and are returned as they are.
    pub fn get_fresh<T>(&self, id: &str) -> Result<T, ContainerError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.get_with(id, true)
    }

    /// Optional lookup: an unregistered id is `Ok(None)`, a broken one is an error.
    pub fn resolve<T>(&self, id: &str) -> Result<Option<T>, ContainerError>
    where
        T: Clone + Send + Sync + 'static,
    {
        match self.get(id) {
            Ok(value) => Ok(Some(value)),
            Err(ContainerError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn get_with<T>(&self, id: &str, fresh: bool) -> Result<T, ContainerError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let canonical = self.canonical_id(id);
        let value = self.resolve_value(&canonical, fresh)?;
        value
            .downcast_ref::<T>()
            .cloned()
            .ok_or(ContainerError::TypeMismatch {
                id: canonical,
                expected: type_name::<T>(),
            })
    }

    fn resolve_value(&self, canonical: &str, fresh: bool) -> Result<AnyValue, ContainerError> {
        // Factories run without the bindings lock so they can resolve other services
        let (factory, cache) = {
            let bindings = self.read_bindings();
            match bindings.get(canonical) {
                None => {
                    return Err(ContainerError::NotFound {
                        id: canonical.to_string(),
                    });
                }
                Some(Binding::Instance(value)) => return Ok(value.clone()),
                Some(Binding::Shared { cached: Some(value), .. }) if !fresh => return Ok(value.clone()),
                Some(Binding::Shared { factory, .. }) => (factory.clone(), !fresh),
                Some(Binding::Transient(factory)) => (factory.clone(), false),
            }
        };

        let value = factory(self).map_err(|source| ContainerError::ResolutionFailed {
            id: canonical.to_string(),
            source,
        })?;

        if cache {
            let mut bindings = self.write_bindings();
            if let Some(Binding::Shared { cached, .. }) = bindings.get_mut(canonical) {
                // First writer wins if two callers raced through the factory
                return Ok(cached.get_or_insert(value).clone());
            }
        }
        Ok(value)
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = self.read_bindings();
        let mut kinds: Vec<(&str, &str)> = bindings
            .iter()
            .map(|(id, binding)| (id.as_str(), binding.kind()))
            .collect();
        kinds.sort();
        f.debug_struct("ServiceContainer")
            .field("bindings", &kinds)
            .field("aliases_count", &self.aliases.read().map(|a| a.len()).unwrap_or(0))
            .finish()
    }
}

// Test module declaration
#[cfg(test)]
mod tests;
