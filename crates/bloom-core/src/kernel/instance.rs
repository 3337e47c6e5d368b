use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::kernel::error::{Error, Result};

/// A process-scoped, set-once holder for a shared instance.
///
/// The first `install` wins; every later call hands back the instance that
/// is already in place. Reading an empty slot is an error rather than a
/// silent `None`.
pub struct InstanceSlot<T> {
    name: &'static str,
    cell: OnceLock<Arc<T>>,
}

impl<T> InstanceSlot<T> {
    /// Create an empty slot. `name` is reported in the unavailable error.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceLock::new(),
        }
    }

    /// Publish `instance` unless the slot is already filled, returning the installed one.
    pub fn install(&self, instance: Arc<T>) -> Arc<T> {
        self.cell.get_or_init(|| instance).clone()
    }

    /// Get the installed instance.
    pub fn get(&self) -> Result<Arc<T>> {
        self.cell.get().cloned().ok_or(Error::InstanceUnavailable(self.name))
    }

    /// Whether an instance has been installed.
    pub fn is_installed(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> fmt::Debug for InstanceSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceSlot")
            .field("name", &self.name)
            .field("installed", &self.is_installed())
            .finish()
    }
}
