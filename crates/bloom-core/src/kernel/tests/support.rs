//! Fixtures shared by the kernel tests.
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::container::ServiceContainer;
use crate::env::EnvStore;
use crate::kernel::bootstrap::Application;
use crate::kernel::error::{Error, Result};
use crate::provider::{BootableServiceProvider, ServiceProvider};

/// An environment store that never sees the real process environment.
pub fn isolated_env(vars: &[(&str, &str)]) -> Arc<EnvStore> {
    Arc::new(EnvStore::with_process_vars(
        vars.iter().map(|(key, value)| (key.to_string(), value.to_string())),
    ))
}

pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Records its register and boot calls. Binds its own name to a `String`.
pub struct RecordingProvider {
    pub name: &'static str,
    pub bootable: bool,
    pub fail_boot: bool,
    pub journal: Journal,
}

impl RecordingProvider {
    pub fn plain(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            bootable: false,
            fail_boot: false,
            journal: journal.clone(),
        }
    }

    pub fn bootable(name: &'static str, journal: &Journal) -> Self {
        Self {
            bootable: true,
            ..Self::plain(name, journal)
        }
    }
}

#[async_trait]
impl ServiceProvider for RecordingProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn provides(&self) -> Vec<&'static str> {
        vec![self.name]
    }

    async fn register(&self, container: &ServiceContainer) -> Result<()> {
        self.journal.lock().unwrap().push(format!("register:{}", self.name));
        container.share(self.name, self.name.to_string());
        Ok(())
    }

    fn into_bootable(self: Arc<Self>) -> Option<Arc<dyn BootableServiceProvider>> {
        if self.bootable { Some(self) } else { None }
    }
}

#[async_trait]
impl BootableServiceProvider for RecordingProvider {
    async fn boot(&self, app: &Application) -> Result<()> {
        if self.fail_boot {
            return Err(Error::Other(format!("{} refused to boot", self.name)));
        }
        assert!(app.container().has(self.name));
        self.journal.lock().unwrap().push(format!("boot:{}", self.name));
        Ok(())
    }
}
