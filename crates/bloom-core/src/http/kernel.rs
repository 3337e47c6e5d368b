use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use http::header::{ALLOW, CONTENT_TYPE, HeaderValue};
use http::StatusCode;

use crate::event::{KernelRequestEvent, KernelResponseEvent, KernelTerminateEvent, SharedEventDispatcher};
use crate::http::{HandlerError, HttpKernelError, Request, RequestHandler, Response, ResponseEmitter};

/// Where an [`HttpKernel`] is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelState {
    Idle,
    RequestDispatched,
    Handled,
    ResponseDispatched,
    Emitted,
    Terminated,
}

impl fmt::Display for KernelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KernelState::Idle => "idle",
            KernelState::RequestDispatched => "dispatching the request",
            KernelState::Handled => "handled",
            KernelState::ResponseDispatched => "dispatching the response",
            KernelState::Emitted => "emitted",
            KernelState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Request/response/terminate pipeline for a single request.
///
/// `handle`, `send` and `terminate` must be called once each, in that order.
/// Handler failures never escape `handle`; they become 404, 405 or 500
/// responses, with the error message in the body only in debug mode. A
/// panicking handler is answered with a 500 as well.
pub struct HttpKernel {
    handler: Arc<dyn RequestHandler>,
    emitter: Arc<dyn ResponseEmitter>,
    events: Option<SharedEventDispatcher>,
    debug: bool,
    state: Mutex<KernelState>,
}

impl fmt::Debug for HttpKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpKernel")
            .field("state", &self.state())
            .field("has_events", &self.events.is_some())
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl HttpKernel {
    pub fn new(handler: Arc<dyn RequestHandler>, emitter: Arc<dyn ResponseEmitter>) -> Self {
        Self {
            handler,
            emitter,
            events: None,
            debug: false,
            state: Mutex::new(KernelState::Idle),
        }
    }

    /// Dispatch pipeline events through `events`; `None` runs the phases silently.
    pub fn with_events(mut self, events: Option<SharedEventDispatcher>) -> Self {
        self.events = events;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn state(&self) -> KernelState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: KernelState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn transition(
        &self,
        expected: KernelState,
        next: KernelState,
        operation: &'static str,
    ) -> Result<(), HttpKernelError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != expected {
            return Err(HttpKernelError::InvalidTransition { from: *state, operation });
        }
        *state = next;
        Ok(())
    }

    /// Offer `request` to `kernel.request` subscribers, then run the handler on
    /// whatever request they leave behind.
    pub async fn handle(&self, request: Request) -> Result<Response, HttpKernelError> {
        self.transition(KernelState::Idle, KernelState::RequestDispatched, "handle")?;

        let request = match &self.events {
            Some(events) => events.dispatch(KernelRequestEvent::new(request)).await.into_request(),
            None => request,
        };
        log::debug!("Handling {} {}", request.method(), request.uri());

        let outcome = AssertUnwindSafe(self.handler.handle(request)).catch_unwind().await;
        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => error_response(&e, self.debug),
            Err(panic) => error_response(&HandlerError::Failed(panic_message(&*panic)), self.debug),
        };
        self.set_state(KernelState::Handled);
        Ok(response)
    }

    /// Offer `response` to `kernel.response` subscribers and emit the result.
    ///
    /// Returns the response as it was emitted. An emit failure is returned as
    /// [`HttpKernelError::Emit`] but still leaves the kernel ready for `terminate`.
    pub async fn send(&self, response: Response) -> Result<Response, HttpKernelError> {
        self.transition(KernelState::Handled, KernelState::ResponseDispatched, "send")?;

        let response = match &self.events {
            Some(events) => events.dispatch(KernelResponseEvent::new(response)).await.into_response(),
            None => response,
        };
        let emitted = self.emitter.emit(&response);
        // terminate still has to run when the client has gone away
        self.set_state(KernelState::Emitted);
        emitted.map_err(HttpKernelError::Emit)?;
        log::debug!("Emitted response with status {}", response.status());
        Ok(response)
    }

    /// Run `kernel.terminate` subscribers. Terminal: the kernel accepts no further calls.
    pub async fn terminate(&self, request: Request, response: Response) -> Result<(), HttpKernelError> {
        self.transition(KernelState::Emitted, KernelState::Terminated, "terminate")?;
        if let Some(events) = &self.events {
            events.dispatch(KernelTerminateEvent::new(request, response)).await;
        }
        log::debug!("Request cycle terminated");
        Ok(())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let reason = if let Some(message) = panic.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic reason".to_string()
    };
    format!("handler panicked: {}", reason)
}

/// Map a handler failure to the response sent to the client.
pub fn error_response(error: &HandlerError, debug: bool) -> Response {
    let status = match error {
        HandlerError::NotFound { .. } => StatusCode::NOT_FOUND,
        HandlerError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        HandlerError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        log::error!("{}", error);
    } else {
        log::debug!("{}", error);
    }

    let body = if debug {
        error.to_string()
    } else {
        status.canonical_reason().unwrap_or("Error").to_string()
    };
    let mut response = Response::new(body.into_bytes());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));

    if let HandlerError::MethodNotAllowed { allowed, .. } = error {
        let allow = allowed.iter().map(|method| method.as_str()).collect::<Vec<_>>().join(", ");
        if let Ok(value) = HeaderValue::from_str(&allow) {
            response.headers_mut().insert(ALLOW, value);
        }
    }
    response
}
