//! Lifecycle events dispatched by the application and the HTTP kernel.
//!
//! Event names are a stable contract for subscribers; see [`names`].
use std::any::Any;
use std::mem;

use crate::config::ConfigData;
use crate::event::Event;
use crate::http::{Request, Response};

/// Names of the framework's lifecycle events
pub mod names {
    pub const APP_BOOT: &str = "app.boot";
    pub const APP_BOOTED: &str = "app.booted";
    pub const CONFIG_LOAD: &str = "config.load";
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const LOCALE_UPDATE: &str = "locale.update";
    pub const KERNEL_REQUEST: &str = "kernel.request";
    pub const KERNEL_RESPONSE: &str = "kernel.response";
    pub const KERNEL_TERMINATE: &str = "kernel.terminate";
}

macro_rules! impl_event {
    ($ty:ty, $name:expr) => {
        impl Event for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }
    };
}

/// Build is starting, before configuration is materialised
#[derive(Debug, Clone, Default)]
pub struct BootEvent;

/// Build finished; providers are booted
#[derive(Debug, Clone, Default)]
pub struct BootedEvent;

/// Carries the merged configuration before it is stored.
///
/// Subscribers may edit or replace it; the application keeps whatever the
/// event holds once dispatch returns.
#[derive(Debug, Clone)]
pub struct ConfigLoadEvent {
    config: ConfigData,
}

impl ConfigLoadEvent {
    pub fn new(config: ConfigData) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConfigData {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConfigData {
        &mut self.config
    }

    /// Replace the whole configuration, returning the previous one
    pub fn set_config(&mut self, config: ConfigData) -> ConfigData {
        mem::replace(&mut self.config, config)
    }

    pub fn into_config(self) -> ConfigData {
        self.config
    }
}

/// Configuration is stored and readable through the container
#[derive(Debug, Clone)]
pub struct ConfigLoadedEvent {
    config: ConfigData,
}

impl ConfigLoadedEvent {
    pub fn new(config: ConfigData) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConfigData {
        &self.config
    }
}

/// The application locale changed, or was applied at startup
#[derive(Debug, Clone)]
pub struct LocaleUpdateEvent {
    locale: String,
    previous: Option<String>,
}

impl LocaleUpdateEvent {
    pub fn new(locale: impl Into<String>, previous: Option<String>) -> Self {
        Self {
            locale: locale.into(),
            previous,
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }
}

/// An inbound request, before it reaches the request handler.
///
/// A subscriber may swap the request (typically to attach a matched route);
/// the kernel continues with the request the event holds after dispatch.
#[derive(Debug)]
pub struct KernelRequestEvent {
    request: Request,
}

impl KernelRequestEvent {
    pub fn new(request: Request) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn set_request(&mut self, request: Request) -> Request {
        mem::replace(&mut self.request, request)
    }

    pub fn into_request(self) -> Request {
        self.request
    }
}

/// A response about to be emitted
#[derive(Debug)]
pub struct KernelResponseEvent {
    response: Response,
}

impl KernelResponseEvent {
    pub fn new(response: Response) -> Self {
        Self { response }
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn set_response(&mut self, response: Response) -> Response {
        mem::replace(&mut self.response, response)
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}

/// The response has been emitted; last chance for cleanup
#[derive(Debug)]
pub struct KernelTerminateEvent {
    request: Request,
    response: Response,
}

impl KernelTerminateEvent {
    pub fn new(request: Request, response: Response) -> Self {
        Self { request, response }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn into_parts(self) -> (Request, Response) {
        (self.request, self.response)
    }
}

impl_event!(BootEvent, names::APP_BOOT);
impl_event!(BootedEvent, names::APP_BOOTED);
impl_event!(ConfigLoadEvent, names::CONFIG_LOAD);
impl_event!(ConfigLoadedEvent, names::CONFIG_LOADED);
impl_event!(LocaleUpdateEvent, names::LOCALE_UPDATE);
impl_event!(KernelRequestEvent, names::KERNEL_REQUEST);
impl_event!(KernelResponseEvent, names::KERNEL_RESPONSE);
impl_event!(KernelTerminateEvent, names::KERNEL_TERMINATE);
