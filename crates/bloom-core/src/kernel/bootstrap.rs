use std::fmt;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock, Weak};
use std::time::{Duration, Instant, SystemTime};

use serde_json::{Value, json};
use tokio::sync::OnceCell;

use crate::config::{ConfigData, ConfigError, ConfigLoader, Configurator};
use crate::container::{AliasTable, BoxError, ServiceContainer, ids};
use crate::env::{self, EnvStore, parse_bool};
use crate::event::{
    BootEvent, BootedEvent, ConfigLoadEvent, ConfigLoadedEvent, LocaleUpdateEvent, SharedEventDispatcher,
};
use crate::kernel::constants;
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::kernel::instance::InstanceSlot;
use crate::kernel::runtime::Kernel;
use crate::kernel::session::SessionManager;
use crate::provider::{ProviderCatalog, ProviderRef, ProviderRegistry, ServiceProvider};
use crate::utils::{DS, join_path, normalize_path};

/// The process-wide application
static APPLICATION: InstanceSlot<Application> = InstanceSlot::new("Application");

/// Serializes [`Application::create`] so only one candidate is ever pre-built
static CREATE_LOCK: Mutex<()> = Mutex::new(());

/// How the hosting process decides whether it is a console process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessMode {
    /// Console if stdin is a terminal and no CGI gateway is present
    #[default]
    Detect,
    Console,
    Web,
}

/// Options for constructing an [`Application`].
pub struct ApplicationBuilder {
    base_path: PathBuf,
    env: Option<Arc<EnvStore>>,
    events: bool,
    process_mode: ProcessMode,
    providers: Vec<ProviderRef>,
    catalog: ProviderCatalog,
    config_params: ConfigData,
}

impl ApplicationBuilder {
    fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            env: None,
            events: true,
            process_mode: ProcessMode::default(),
            providers: Vec::new(),
            catalog: ProviderCatalog::new(),
            config_params: ConfigData::new(),
        }
    }

    /// Use `env` instead of the process-wide environment store.
    pub fn env(mut self, env: Arc<EnvStore>) -> Self {
        self.env = Some(env);
        self
    }

    /// Do not register an event dispatcher. Lifecycle events are skipped.
    pub fn without_events(mut self) -> Self {
        self.events = false;
        self
    }

    pub fn process_mode(mut self, mode: ProcessMode) -> Self {
        self.process_mode = mode;
        self
    }

    /// Append a provider; providers register in the order given.
    pub fn provider(mut self, provider: ProviderRef) -> Self {
        self.providers.push(provider);
        self
    }

    /// Constructors for providers declared by name.
    pub fn catalog(mut self, catalog: ProviderCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Configuration merged over the file configuration at build time.
    pub fn config_params(mut self, params: ConfigData) -> Self {
        self.config_params = params;
        self
    }

    /// Construct the application and run its pre-build.
    pub fn finish(self) -> Result<Arc<Application>> {
        let base_path = PathBuf::from(normalize_path(&self.base_path.to_string_lossy()));
        let app = Arc::new_cyclic(|self_ref| Application {
            base_path,
            public_path: OnceLock::new(),
            env: self.env.unwrap_or_else(env::global),
            container: ServiceContainer::new(),
            catalog: self.catalog,
            provider_refs: Mutex::new(self.providers),
            config_params: Mutex::new(self.config_params),
            registry: RwLock::new(ProviderRegistry::new()),
            events_enabled: self.events,
            process_mode: self.process_mode,
            pre_built: AtomicBool::new(false),
            built: OnceCell::new(),
            started: OnceLock::new(),
            running_in_console: OnceLock::new(),
            locale: RwLock::new(None),
            self_ref: self_ref.clone(),
        });
        app.pre_build()?;
        Ok(app)
    }
}

/// Application lifecycle controller.
///
/// Construction runs the pre-build: start time, `.env` loading, public
/// directory, placeholder variables and the kernel facade. [`build`] wires
/// configuration, container, providers and optional services exactly once,
/// however often and from however many tasks it is called.
///
/// [`build`]: Application::build
pub struct Application {
    base_path: PathBuf,
    public_path: OnceLock<PathBuf>,
    env: Arc<EnvStore>,
    container: ServiceContainer,
    catalog: ProviderCatalog,
    provider_refs: Mutex<Vec<ProviderRef>>,
    config_params: Mutex<ConfigData>,
    registry: RwLock<ProviderRegistry>,
    events_enabled: bool,
    process_mode: ProcessMode,
    pre_built: AtomicBool,
    built: OnceCell<()>,
    started: OnceLock<(Instant, SystemTime)>,
    running_in_console: OnceLock<bool>,
    locale: RwLock<Option<String>>,
    self_ref: Weak<Application>,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("base_path", &self.base_path)
            .field("public_path", &self.public_path.get())
            .field("pre_built", &self.pre_built.load(Ordering::SeqCst))
            .field("built", &self.is_built())
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

impl Application {
    /// Start configuring an application rooted at `base_path`.
    pub fn builder(base_path: impl AsRef<Path>) -> ApplicationBuilder {
        ApplicationBuilder::new(base_path)
    }

    /// Construct an application with default options. Pre-build has run on return.
    pub fn new(base_path: impl AsRef<Path>) -> Result<Arc<Self>> {
        Self::builder(base_path).finish()
    }

    /// Construct an application and publish it as the process instance.
    ///
    /// If an instance is already published it is returned untouched. No new
    /// application is constructed, so the shared environment keeps the
    /// installed application's `.env` values and placeholder variables.
    pub fn create(base_path: impl AsRef<Path>) -> Result<Arc<Self>> {
        let _guard = CREATE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        if let Ok(app) = APPLICATION.get() {
            log::debug!(
                "Application instance already installed at {}; ignoring {}",
                app.base_path.display(),
                base_path.as_ref().display()
            );
            return Ok(app);
        }
        Ok(Self::install(Self::new(base_path)?))
    }

    /// Publish `app` as the process instance unless one already exists.
    pub fn install(app: Arc<Self>) -> Arc<Self> {
        let installed = APPLICATION.install(app.clone());
        if !Arc::ptr_eq(&installed, &app) {
            log::debug!("Application instance already installed; keeping the existing one");
        }
        installed
    }

    /// The process instance.
    ///
    /// Fails with [`Error::InstanceUnavailable`] until one is installed.
    pub fn instance() -> Result<Arc<Self>> {
        APPLICATION.get()
    }

    fn arc(&self) -> Result<Arc<Self>> {
        self.self_ref.upgrade().ok_or(Error::InstanceUnavailable("Application"))
    }

    /// Prepare environment and paths. Only the first call has any effect.
    pub fn pre_build(&self) -> Result<()> {
        if self.pre_built.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.started.get_or_init(|| (Instant::now(), SystemTime::now()));

        if self
            .env
            .process_var(constants::ENV_USE_GLOBAL)
            .and_then(|value| parse_bool(&value))
            .unwrap_or(false)
        {
            self.env.enable_global(true);
        }
        if let Err(e) = self.env.load(&self.base_path) {
            self.pre_built.store(false, Ordering::SeqCst);
            return Err(e.in_phase(KernelLifecyclePhase::PreBuild, None, "environment file could not be loaded"));
        }

        let public_dir = self.env.get_or(constants::ENV_PUBLIC_DIR, constants::DEFAULT_PUBLIC_DIR);
        let public_path = self.public_path.get_or_init(|| join_path(&self.base_path, Some(&public_dir)));

        self.env.set_merge_vars(json!({
            "app": {
                "base_dir": self.base_path.to_string_lossy(),
                "public_dir": public_path.to_string_lossy(),
            }
        }));

        if self.events_enabled && !self.container.has(ids::EVENT_DISPATCHER) {
            self.container.share(ids::EVENT_DISPATCHER, SharedEventDispatcher::new());
        }
        if !self.container.has(ids::KERNEL) {
            self.container.share(ids::KERNEL, Arc::new(Kernel::new(self.self_ref.clone())));
        }

        log::debug!(
            "Pre-built {} v{} at {}",
            constants::APP_NAME,
            constants::APP_VERSION,
            self.base_path.display()
        );
        Ok(())
    }

    /// Wire and boot every service. Runs once; later calls return immediately.
    ///
    /// Concurrent first callers wait for the same run. A failed build leaves
    /// the application unbuilt, so it may be retried.
    pub async fn build(&self) -> Result<Arc<Self>> {
        self.built.get_or_try_init(|| self.run_build()).await?;
        self.arc()
    }

    async fn run_build(&self) -> Result<()> {
        log::info!("Building {} v{} from {}", constants::APP_NAME, self.version(), self.base_path.display());

        if let Some(events) = self.events() {
            events.dispatch(BootEvent).await;
        }

        self.build_config()
            .await
            .map_err(|e| e.in_phase(KernelLifecyclePhase::Config, None, "configuration could not be materialised"))?;
        self.build_container().await?;
        self.build_proxies().iter().for_each(log_skipped);
        self.build_services().await?;
        if let Err(e) = self.build_session().await {
            log_skipped(&e);
        }
        if let Err(e) = self.build_locale().await {
            log_skipped(&e);
        }

        if let Some(events) = self.events() {
            events.dispatch(BootedEvent).await;
        }
        log::info!("Application built in {:?}", self.elapsed());
        Ok(())
    }

    async fn build_config(&self) -> Result<()> {
        let defaults = json!({
            "app_url": self.env.get(constants::ENV_URL),
            "timezone": self.env.get(constants::ENV_TIMEZONE),
            "charset": constants::DEFAULT_CHARSET,
            "app": { "debug": self.is_debug() },
        });
        let mut config = ConfigData::from_value(defaults).unwrap_or_default();
        config.merge(&ConfigLoader::load_dir(&self.config_path(None))?);
        let params = self.config_params.lock().unwrap_or_else(PoisonError::into_inner).clone();
        config.merge(&params);

        let events = self.events();
        if let Some(events) = &events {
            config = events.dispatch(ConfigLoadEvent::new(config)).await.into_config();
        }

        let configurator = Arc::new(Configurator::new(config));
        self.container.share(ids::CONFIGURATOR, configurator.clone());

        if let Some(events) = &events {
            events.dispatch(ConfigLoadedEvent::new(configurator.snapshot())).await;
        }
        Ok(())
    }

    async fn build_container(&self) -> Result<()> {
        let tag = |e: Error, component: Option<String>| {
            e.in_phase(KernelLifecyclePhase::Container, component, "service container wiring failed")
        };

        let app = self.self_ref.clone();
        self.container.add(ids::APPLICATION, move |_| {
            app.upgrade().ok_or_else(|| BoxError::from("application has been dropped"))
        });
        self.container.register_aliases(AliasTable::defaults());

        let definitions = self.provider_definitions().map_err(|e| tag(e, None))?;
        let mut registry = ProviderRegistry::new();
        for definition in &definitions {
            let provider = self
                .catalog
                .instantiate(definition, self)
                .map_err(|e| tag(e, Some(definition.label())))?;
            registry.register(provider, &self.container).await?;
        }
        log::info!(
            "Registered {} service provider(s), {} bootable",
            registry.len(),
            registry.bootable_count()
        );
        *self.registry.write().unwrap_or_else(PoisonError::into_inner) = registry;
        Ok(())
    }

    /// Explicit providers followed by the `app.providers` configuration list.
    fn provider_definitions(&self) -> Result<Vec<ProviderRef>> {
        let mut definitions = self.provider_refs.lock().unwrap_or_else(PoisonError::into_inner).clone();
        match self.config()?.value("app.providers") {
            None | Some(Value::Null) => {}
            Some(Value::Array(entries)) => {
                for entry in &entries {
                    definitions.push(ProviderRef::from_value(entry)?);
                }
            }
            Some(other) => definitions.push(ProviderRef::from_value(&other)?),
        }
        Ok(definitions)
    }

    /// Register the short names declared under the `proxy` configuration key.
    ///
    /// Returns the entries that were skipped; valid ones are registered regardless.
    pub(super) fn build_proxies(&self) -> Vec<Error> {
        let skip = |alias: Option<&str>, cause: Error| {
            cause.in_phase(KernelLifecyclePhase::Proxies, alias.map(str::to_string), "proxy alias skipped")
        };
        let proxies = match self.config().map(|config| config.value("proxy")) {
            Ok(Some(Value::Object(proxies))) => proxies,
            Ok(None) | Ok(Some(Value::Null)) => return Vec::new(),
            Ok(Some(other)) => {
                return vec![skip(None, Error::Other(format!("expected a table, found {}", other)))];
            }
            Err(e) => return vec![skip(None, e)],
        };
        let mut skipped = Vec::new();
        for (alias, target) in proxies {
            match target {
                Value::String(id) => {
                    log::debug!("Proxy alias '{}' -> '{}'", alias, id);
                    self.container.alias(alias, id);
                }
                other => skipped.push(skip(
                    Some(&alias),
                    Error::Other(format!("target must be a string, found {}", other)),
                )),
            }
        }
        skipped
    }

    async fn build_services(&self) -> Result<()> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner).clone();
        let booted = registry.boot_all(self).await?;
        log::debug!("Booted {} service provider(s)", booted);
        Ok(())
    }

    /// Start the registered session manager, if any.
    pub(super) async fn build_session(&self) -> Result<()> {
        let session = self
            .container
            .resolve::<Arc<dyn SessionManager>>(ids::SESSION_MANAGER)
            .map_err(|e| {
                Error::from(e).in_phase(
                    KernelLifecyclePhase::Session,
                    Some(ids::SESSION_MANAGER.to_string()),
                    "session manager unavailable",
                )
            })?;
        let Some(session) = session else {
            log::debug!("No session manager registered");
            return Ok(());
        };
        session.start().await.map_err(|e| {
            e.in_phase(
                KernelLifecyclePhase::Session,
                Some(ids::SESSION_MANAGER.to_string()),
                "session could not be started",
            )
        })?;
        log::debug!("Session started");
        Ok(())
    }

    /// Apply `app.locale` from configuration.
    pub(super) async fn build_locale(&self) -> Result<()> {
        let in_locale = |e: Error| e.in_phase(KernelLifecyclePhase::Locale, None, "configured locale not applied");
        let configured = self.config().map_err(in_locale)?.value("app.locale");
        match configured {
            None | Some(Value::Null) => Ok(()),
            Some(Value::String(locale)) => {
                self.set_locale(locale).await;
                Ok(())
            }
            Some(other) => Err(in_locale(Error::Other(format!("'app.locale' must be a string, found {}", other)))),
        }
    }

    pub fn is_built(&self) -> bool {
        self.built.initialized()
    }

    /// Framework version
    pub fn version(&self) -> &'static str {
        constants::APP_VERSION
    }

    /// `base_path` joined with `path`, normalised.
    pub fn base_path(&self, path: Option<&str>) -> PathBuf {
        join_path(&self.base_path, path)
    }

    /// Public directory (`APP_PUBLIC_DIR`, default `public`) joined with `path`.
    pub fn public_path(&self, path: Option<&str>) -> PathBuf {
        let public = self
            .public_path
            .get()
            .cloned()
            .unwrap_or_else(|| join_path(&self.base_path, Some(constants::DEFAULT_PUBLIC_DIR)));
        join_path(&public, path)
    }

    pub fn config_path(&self, path: Option<&str>) -> PathBuf {
        let sub = match path {
            Some(path) if !path.is_empty() => format!("{}{}{}", constants::CONFIG_DIR, DS, path),
            _ => constants::CONFIG_DIR.to_string(),
        };
        join_path(&self.base_path, Some(&sub))
    }

    /// Whether this process is a console process. Computed once.
    ///
    /// `APP_RUNNING_IN_CONSOLE` wins when set; otherwise the process mode decides.
    pub fn running_in_console(&self) -> bool {
        *self.running_in_console.get_or_init(|| {
            if let Some(forced) = self.env.get_bool(constants::ENV_RUNNING_IN_CONSOLE) {
                return forced;
            }
            match self.process_mode {
                ProcessMode::Console => true,
                ProcessMode::Web => false,
                ProcessMode::Detect => {
                    std::io::stdin().is_terminal() && self.env.get(constants::ENV_GATEWAY_INTERFACE).is_none()
                }
            }
        })
    }

    /// `APP_ENV`, default `production`
    pub fn environment(&self) -> String {
        self.env.get_or(constants::ENV_APP_ENV, constants::DEFAULT_ENVIRONMENT)
    }

    pub fn is_debug(&self) -> bool {
        self.env.get_bool(constants::ENV_DEBUG).unwrap_or(false)
    }

    pub fn env(&self) -> &EnvStore {
        &self.env
    }

    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    /// The configuration store. Fails with [`ConfigError::NotLoaded`] before build.
    pub fn config(&self) -> Result<Arc<Configurator>> {
        self.container
            .get::<Arc<Configurator>>(ids::CONFIGURATOR)
            .map_err(|e| match e {
                e if e.is_not_found() => Error::Config(ConfigError::NotLoaded),
                e => e.into(),
            })
    }

    /// The event dispatcher, if one is registered.
    pub fn events(&self) -> Option<SharedEventDispatcher> {
        match self.container.resolve::<SharedEventDispatcher>(ids::EVENT_DISPATCHER) {
            Ok(events) => events,
            Err(e) => {
                log::warn!("Event dispatcher unavailable: {}", e);
                None
            }
        }
    }

    /// The app-bound kernel facade registered during pre-build.
    pub fn kernel(&self) -> Result<Arc<Kernel>> {
        Ok(self.container.get::<Arc<Kernel>>(ids::KERNEL)?)
    }

    /// Providers registered by the last successful container wiring
    pub fn service_providers(&self) -> Vec<Arc<dyn ServiceProvider>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .providers()
            .to_vec()
    }

    /// Declare another provider. Only effective before [`build`](Application::build).
    pub fn add_service_provider(&self, provider: ProviderRef) {
        if self.is_built() {
            log::warn!("Provider '{}' added after build; it will not be registered", provider.label());
        }
        self.provider_refs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(provider);
    }

    /// Configuration merged over the file configuration. Only effective before build.
    pub fn set_config_params(&self, params: ConfigData) {
        if self.is_built() {
            log::warn!("Configuration parameters set after build are ignored");
        }
        *self.config_params.lock().unwrap_or_else(PoisonError::into_inner) = params;
    }

    pub fn locale(&self) -> Option<String> {
        self.locale.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Change the locale and announce it on `locale.update`.
    pub async fn set_locale(&self, locale: impl Into<String>) {
        let locale = locale.into();
        let previous = self
            .locale
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(locale.clone());
        match self.events() {
            Some(events) => {
                events.dispatch(LocaleUpdateEvent::new(locale, previous)).await;
            }
            None => log::debug!("No event dispatcher; locale '{}' applied without notification", locale),
        }
    }

    /// Wall-clock time at which pre-build ran
    pub fn start_time(&self) -> SystemTime {
        self.started.get().map(|(_, at)| *at).unwrap_or_else(SystemTime::now)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.get().map(|(at, _)| at.elapsed()).unwrap_or_default()
    }
}

/// Optional build steps report here instead of aborting the build.
fn log_skipped(error: &Error) {
    match std::error::Error::source(error) {
        Some(cause) => log::warn!("{}: {}", error, cause),
        None => log::warn!("{}", error),
    }
}
