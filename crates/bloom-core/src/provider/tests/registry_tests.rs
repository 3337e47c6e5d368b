use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::container::ServiceContainer;
use crate::env::EnvStore;
use crate::kernel::bootstrap::{Application, ProcessMode};
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::provider::{
    BootableServiceProvider, ProviderCatalog, ProviderError, ProviderRef, ProviderRegistry, ServiceProvider,
};

fn test_app() -> Arc<Application> {
    Application::builder("/srv/app")
        .env(Arc::new(EnvStore::with_process_vars(Vec::<(String, String)>::new())))
        .process_mode(ProcessMode::Web)
        .finish()
        .unwrap()
}

struct CacheProvider {
    calls: Arc<Mutex<Vec<&'static str>>>,
    fail_register: bool,
}

#[async_trait]
impl ServiceProvider for CacheProvider {
    fn name(&self) -> &str {
        "cache"
    }

    fn provides(&self) -> Vec<&'static str> {
        vec!["cache", "cache.store"]
    }

    async fn register(&self, container: &ServiceContainer) -> Result<()> {
        self.calls.lock().unwrap().push("register");
        if self.fail_register {
            return Err(Error::Other("cache backend missing".to_string()));
        }
        container.share("cache", 64_usize);
        Ok(())
    }

    fn into_bootable(self: Arc<Self>) -> Option<Arc<dyn BootableServiceProvider>> {
        Some(self)
    }
}

#[async_trait]
impl BootableServiceProvider for CacheProvider {
    async fn boot(&self, _app: &Application) -> Result<()> {
        self.calls.lock().unwrap().push("boot");
        Ok(())
    }
}

struct NoopProvider;

#[async_trait]
impl ServiceProvider for NoopProvider {
    fn name(&self) -> &str {
        "noop"
    }

    async fn register(&self, _container: &ServiceContainer) -> Result<()> {
        Ok(())
    }
}

#[test]
fn test_ref_from_config_value() {
    let named = ProviderRef::from_value(&json!("mailer")).unwrap();
    assert!(matches!(&named, ProviderRef::Named(name) if name == "mailer"));
    assert_eq!(named.label(), "mailer");

    for unsupported in [json!(42), json!({ "class": "Mailer" }), json!(["a"]), json!(null)] {
        let err = ProviderRef::from_value(&unsupported).unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedDefinition { .. }));
    }
}

#[test]
fn test_instance_ref_label_uses_provider_name() {
    let provider: Arc<dyn ServiceProvider> = Arc::new(NoopProvider);
    let reference = ProviderRef::from(provider);

    assert_eq!(reference.label(), "noop");
    assert_eq!(format!("{:?}", reference), "Instance(\"noop\")");
}

#[test]
fn test_default_provides_is_empty() {
    assert!(NoopProvider.provides().is_empty());
    assert!(Arc::new(NoopProvider).into_bootable().is_none());
}

#[test]
fn test_catalog_instantiates_by_name() {
    let app = test_app();
    let mut catalog = ProviderCatalog::new();
    catalog
        .register("noop", |_app: &Application| Ok(Arc::new(NoopProvider) as Arc<dyn ServiceProvider>))
        .register("other", |_app: &Application| Ok(Arc::new(NoopProvider) as Arc<dyn ServiceProvider>));

    assert!(catalog.contains("noop"));
    assert_eq!(catalog.names(), vec!["noop", "other"]);

    let provider = catalog.instantiate(&ProviderRef::named("noop"), &app).unwrap();
    assert_eq!(provider.name(), "noop");
}

#[test]
fn test_catalog_passes_instances_through() {
    let app = test_app();
    let provider: Arc<dyn ServiceProvider> = Arc::new(NoopProvider);

    let instantiated = ProviderCatalog::new()
        .instantiate(&ProviderRef::Instance(provider.clone()), &app)
        .unwrap();

    assert!(Arc::ptr_eq(&instantiated, &provider));
}

#[test]
fn test_catalog_unknown_name() {
    let app = test_app();

    let err = ProviderCatalog::new()
        .instantiate(&ProviderRef::named("Missing\\Provider"), &app)
        .err()
        .unwrap();

    assert!(matches!(err, Error::Provider(ProviderError::Unresolvable(name)) if name == "Missing\\Provider"));
}

#[test]
fn test_catalog_constructor_failure() {
    let app = test_app();
    let mut catalog = ProviderCatalog::new();
    catalog.register("broken", |_app: &Application| Err(Error::Other("missing credentials".to_string())));

    let err = catalog.instantiate(&ProviderRef::named("broken"), &app).err().unwrap();

    match err {
        Error::Provider(ProviderError::InstantiationFailed { name, reason }) => {
            assert_eq!(name, "broken");
            assert!(reason.contains("missing credentials"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_registry_queues_only_bootable_providers() {
    let app = test_app();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ProviderRegistry::new();

    registry.register(Arc::new(NoopProvider), app.container()).await.unwrap();
    registry
        .register(
            Arc::new(CacheProvider {
                calls: calls.clone(),
                fail_register: false,
            }),
            app.container(),
        )
        .await
        .unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.bootable_count(), 1);
    assert_eq!(registry.names(), vec!["noop", "cache"]);
    assert_eq!(app.container().get::<usize>("cache").unwrap(), 64);

    let booted = registry.boot_all(&app).await.unwrap();
    assert_eq!(booted, 1);
    assert_eq!(*calls.lock().unwrap(), vec!["register", "boot"]);
}

#[tokio::test]
async fn test_registry_tags_register_failures() {
    let app = test_app();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ProviderRegistry::new();

    let err = registry
        .register(
            Arc::new(CacheProvider {
                calls: calls.clone(),
                fail_register: true,
            }),
            app.container(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        Error::KernelLifecycleError {
            phase: KernelLifecyclePhase::Container,
            component_name: Some(name),
            ..
        } if name == "cache"
    ));
    assert!(registry.is_empty());
    assert_eq!(registry.bootable_count(), 0);
}
