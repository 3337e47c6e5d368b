//! # Bloom Event System
//!
//! A publish/subscribe bus keyed by event name. Subscribers run one after the
//! other, in registration order, and all receive the same event value by
//! mutable reference, so a subscriber can rewrite the payload for the ones
//! after it and for the caller, which gets the event back from
//! [`SharedEventDispatcher::dispatch`].
//!
//! A failing subscriber is logged and skipped; only an explicit
//! [`EventResult::Stop`] ends propagation early.
pub mod dispatcher;
pub mod error;
pub mod types;

use std::any::Any;
use std::fmt;

use async_trait::async_trait;

/// Handle returned by every registration, used to unregister
pub type EventId = u64;

/// Outcome of a single handler invocation
pub type HandlerResult = Result<EventResult, EventSystemError>;

/// What a handler tells the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Hand the event to the next handler
    Continue,
    /// Skip the remaining handlers
    Stop,
}

/// A named payload passed through the dispatcher.
pub trait Event: Any + fmt::Debug + Send + Sync {
    /// Name subscribers register for, e.g. `kernel.request`
    fn name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    /// Used by type handlers to reach the concrete event
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Handler object stored by the dispatcher
#[async_trait]
pub trait AsyncEventHandler: Send + Sync {
    async fn handle(&self, event: &mut dyn Event) -> HandlerResult;
}

pub use dispatcher::{
    BoxFuture, EventDispatcher, EventHandlerFn, SharedEventDispatcher, TypedHandlerFn, sync_event_handler,
    sync_typed_handler, try_event_handler,
};
pub use error::EventSystemError;
pub use types::{
    BootEvent, BootedEvent, ConfigLoadEvent, ConfigLoadedEvent, KernelRequestEvent, KernelResponseEvent,
    KernelTerminateEvent, LocaleUpdateEvent, names,
};
