use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::event::{AsyncEventHandler, Event, EventId, EventResult, EventSystemError, HandlerResult};

// Owned future returned by closure handlers
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'a>>;

/// Closure handler for events registered by name
pub type EventHandlerFn = Box<dyn Fn(&mut dyn Event) -> BoxFuture<'_> + Send + Sync>;

/// Closure handler for one concrete event type
pub type TypedHandlerFn<E> = Box<dyn Fn(&mut E) -> BoxFuture<'_> + Send + Sync>;

type HandlerList = Vec<(EventId, Arc<dyn AsyncEventHandler>)>;

//--------------------------------------------------
// EventDispatcher (handler tables, wrapped by SharedEventDispatcher)
//--------------------------------------------------

/// Handler tables keyed by event name and by event type.
pub struct EventDispatcher {
    handlers: HashMap<&'static str, HandlerList>,
    type_handlers: HashMap<TypeId, HandlerList>,
    next_handler_id: EventId,
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("name_handlers_count", &self.count(&self.handlers))
            .field("type_handlers_count", &self.count(&self.type_handlers))
            .field("next_handler_id", &self.next_handler_id)
            .finish()
    }
}

struct SimpleHandler {
    handler: EventHandlerFn,
}

#[async_trait]
impl AsyncEventHandler for SimpleHandler {
    async fn handle(&self, event: &mut dyn Event) -> HandlerResult {
        (self.handler)(event).await
    }
}

/// Runs the wrapped closure on events that downcast to `E`
pub(super) struct TypedEventHandler<E: Event> {
    pub(super) handler: TypedHandlerFn<E>,
}

#[async_trait]
impl<E: Event> AsyncEventHandler for TypedEventHandler<E> {
    async fn handle(&self, event: &mut dyn Event) -> HandlerResult {
        let event_name = event.name();
        match event.as_any_mut().downcast_mut::<E>() {
            Some(typed) => (self.handler)(typed).await,
            None => Err(EventSystemError::UnexpectedEventType {
                event_name: event_name.to_string(),
                expected: std::any::type_name::<E>(),
            }),
        }
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            type_handlers: HashMap::new(),
            next_handler_id: 1,
        }
    }

    fn next_id(&mut self) -> EventId {
        let id = self.next_handler_id;
        self.next_handler_id += 1;
        id
    }

    fn count<K>(&self, table: &HashMap<K, HandlerList>) -> usize {
        table.values().map(Vec::len).sum()
    }

    /// Subscribe a handler object to `event_name`.
    pub fn subscribe(&mut self, event_name: &'static str, handler: Arc<dyn AsyncEventHandler>) -> EventId {
        let id = self.next_id();
        self.handlers.entry(event_name).or_default().push((id, handler));
        id
    }

    pub fn register_handler(&mut self, event_name: &'static str, handler: EventHandlerFn) -> EventId {
        self.subscribe(event_name, Arc::new(SimpleHandler { handler }))
    }

    pub fn register_type_handler<E: Event>(&mut self, handler: TypedHandlerFn<E>) -> EventId {
        let id = self.next_id();
        let handler = TypedEventHandler { handler };
        self.type_handlers
            .entry(TypeId::of::<E>())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    pub fn unregister_handler(&mut self, id: EventId) -> bool {
        let mut found = false;
        for handlers in self.handlers.values_mut().chain(self.type_handlers.values_mut()) {
            let len_before = handlers.len();
            handlers.retain(|(h_id, _)| *h_id != id);
            found |= handlers.len() < len_before;
        }
        found
    }

    /// Handlers for an event, name handlers first, each group in registration order.
    pub fn handlers_for(&self, event_name: &str, type_id: TypeId) -> Vec<Arc<dyn AsyncEventHandler>> {
        let by_name = self.handlers.get(event_name).into_iter().flatten();
        let by_type = self.type_handlers.get(&type_id).into_iter().flatten();
        by_name.chain(by_type).map(|(_, handler)| handler.clone()).collect()
    }

    pub fn handler_count(&self) -> usize {
        self.count(&self.handlers) + self.count(&self.type_handlers)
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

//--------------------------------------------------
// SharedEventDispatcher (Public API)
//--------------------------------------------------

/// Thread-safe shared event dispatcher using Tokio Mutex
///
/// The handler list is copied out before any handler runs, so handlers may
/// subscribe or dispatch further events without deadlocking.
#[derive(Clone, Default)]
pub struct SharedEventDispatcher {
    dispatcher: Arc<Mutex<EventDispatcher>>,
}

impl fmt::Debug for SharedEventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedEventDispatcher").finish_non_exhaustive()
    }
}

impl SharedEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every subscriber of `event` and hand the (possibly rewritten) event back.
    pub async fn dispatch<E: Event>(&self, mut event: E) -> E {
        self.dispatch_dyn(&mut event).await;
        event
    }

    /// Dispatch a type-erased event in place.
    pub async fn dispatch_dyn(&self, event: &mut dyn Event) -> EventResult {
        let name = event.name();
        let handlers = {
            let dispatcher = self.dispatcher.lock().await;
            dispatcher.handlers_for(name, event.as_any().type_id())
        };
        log::debug!("Dispatching '{}' to {} handler(s)", name, handlers.len());

        for handler in handlers {
            match handler.handle(event).await {
                Ok(EventResult::Continue) => {}
                Ok(EventResult::Stop) => {
                    log::debug!("Propagation of '{}' stopped by a handler", name);
                    return EventResult::Stop;
                }
                Err(e) => log::warn!("Handler for '{}' failed, continuing: {}", name, e),
            }
        }
        EventResult::Continue
    }

    pub async fn subscribe(&self, event_name: &'static str, handler: Arc<dyn AsyncEventHandler>) -> EventId {
        self.dispatcher.lock().await.subscribe(event_name, handler)
    }

    pub async fn register_handler(&self, event_name: &'static str, handler: EventHandlerFn) -> EventId {
        self.dispatcher.lock().await.register_handler(event_name, handler)
    }

    pub async fn register_type_handler<E: Event>(&self, handler: TypedHandlerFn<E>) -> EventId {
        self.dispatcher.lock().await.register_type_handler::<E>(handler)
    }

    pub async fn unregister_handler(&self, id: EventId) -> bool {
        self.dispatcher.lock().await.unregister_handler(id)
    }

    pub async fn handler_count(&self) -> usize {
        self.dispatcher.lock().await.handler_count()
    }
}

//--------------------------------------------------
// Helper Functions
//--------------------------------------------------

/// Wrap a synchronous closure as a name handler
pub fn sync_event_handler<F>(f: F) -> EventHandlerFn
where
    F: Fn(&mut dyn Event) -> EventResult + Send + Sync + 'static,
{
    Box::new(move |event| {
        let result = f(event);
        Box::pin(async move { Ok(result) })
    })
}

/// Wrap a synchronous, fallible closure as a name handler
pub fn try_event_handler<F>(f: F) -> EventHandlerFn
where
    F: Fn(&mut dyn Event) -> HandlerResult + Send + Sync + 'static,
{
    Box::new(move |event| {
        let result = f(event);
        Box::pin(async move { result })
    })
}

/// Wrap a synchronous closure as a typed handler
pub fn sync_typed_handler<E, F>(f: F) -> TypedHandlerFn<E>
where
    E: Event,
    F: Fn(&mut E) -> EventResult + Send + Sync + 'static,
{
    Box::new(move |event| {
        let result = f(event);
        Box::pin(async move { Ok(result) })
    })
}
