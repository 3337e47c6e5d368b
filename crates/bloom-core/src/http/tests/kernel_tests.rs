use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http::{Method, StatusCode};

use crate::event::{
    Event, EventResult, KernelRequestEvent, KernelResponseEvent, KernelTerminateEvent, SharedEventDispatcher,
    sync_event_handler, sync_typed_handler,
};
use crate::http::{
    BufferEmitter, HandlerError, HttpKernel, HttpKernelError, KernelState, MatchedRoute, Request, RequestHandler,
    Response, ResponseEmitter, Router,
};

fn request(path: &str) -> Request {
    http::Request::builder().uri(path).body(Vec::new()).unwrap()
}

/// Records the path of every request it handles
#[derive(Default)]
struct RecordingHandler {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl RequestHandler for RecordingHandler {
    async fn handle(&self, request: Request) -> Result<Response, HandlerError> {
        self.seen.lock().unwrap().push(request.uri().path().to_string());
        Ok(Response::new(b"ok".to_vec()))
    }
}

struct FailingHandler(fn() -> HandlerError);

#[async_trait]
impl RequestHandler for FailingHandler {
    async fn handle(&self, _request: Request) -> Result<Response, HandlerError> {
        Err((self.0)())
    }
}

fn build_kernel(handler: Arc<dyn RequestHandler>, events: Option<SharedEventDispatcher>) -> (HttpKernel, Arc<BufferEmitter>) {
    let emitter = Arc::new(BufferEmitter::new());
    let kernel = HttpKernel::new(handler, emitter.clone()).with_events(events);
    (kernel, emitter)
}

#[tokio::test]
async fn test_full_cycle_transitions() -> Result<(), HttpKernelError> {
    let handler = Arc::new(RecordingHandler::default());
    let (kernel, emitter) = build_kernel(handler.clone(), Some(SharedEventDispatcher::new()));
    assert_eq!(kernel.state(), KernelState::Idle);

    let response = kernel.handle(request("/a")).await?;
    assert_eq!(kernel.state(), KernelState::Handled);

    let response = kernel.send(response).await?;
    assert_eq!(kernel.state(), KernelState::Emitted);
    assert_eq!(emitter.last().map(|r| r.body_text()), Some("ok".to_string()));

    kernel.terminate(request("/a"), response).await?;
    assert_eq!(kernel.state(), KernelState::Terminated);
    Ok(())
}

#[tokio::test]
async fn test_out_of_order_calls_are_rejected() -> Result<(), HttpKernelError> {
    let (kernel, emitter) = build_kernel(Arc::new(RecordingHandler::default()), None);

    let err = kernel.send(Response::default()).await.unwrap_err();
    assert!(matches!(
        err,
        HttpKernelError::InvalidTransition {
            from: KernelState::Idle,
            operation: "send"
        }
    ));
    assert!(emitter.emitted().is_empty());

    let response = kernel.handle(request("/")).await?;
    assert!(kernel.handle(request("/")).await.is_err());
    let response = kernel.send(response).await?;
    kernel.terminate(request("/"), response).await?;

    // Terminated is final
    let err = kernel.handle(request("/")).await.unwrap_err();
    assert!(matches!(
        err,
        HttpKernelError::InvalidTransition {
            from: KernelState::Terminated,
            ..
        }
    ));
    Ok(())
}

#[tokio::test]
async fn test_handle_uses_request_replaced_by_subscriber() -> Result<(), HttpKernelError> {
    let events = SharedEventDispatcher::new();
    events
        .register_type_handler::<KernelRequestEvent>(sync_typed_handler(|event: &mut KernelRequestEvent| {
            event.set_request(request("/rewritten"));
            EventResult::Continue
        }))
        .await;
    let handler = Arc::new(RecordingHandler::default());
    let (kernel, _) = build_kernel(handler.clone(), Some(events));

    kernel.handle(request("/original")).await?;
    assert_eq!(*handler.seen.lock().unwrap(), vec!["/rewritten"]);
    Ok(())
}

#[tokio::test]
async fn test_router_subscription_threads_route_into_handle() -> Result<(), HttpKernelError> {
    let events = SharedEventDispatcher::new();
    let mut router = Router::new();
    router.get("/hello", "hello", |request: Request| async move {
        let route = request
            .extensions()
            .get::<MatchedRoute>()
            .map(|matched| matched.name.clone())
            .unwrap_or_default();
        Ok(Response::new(route.into_bytes()))
    });
    let router = Arc::new(router);
    router.subscribe(&events).await;
    let (kernel, _) = build_kernel(router, Some(events));

    let response = kernel.handle(request("/hello")).await?;
    assert_eq!(response.body(), b"hello");
    Ok(())
}

#[tokio::test]
async fn test_handler_errors_map_to_responses() -> Result<(), HttpKernelError> {
    let cases: Vec<(fn() -> HandlerError, StatusCode)> = vec![
        (
            || HandlerError::NotFound {
                method: Method::GET,
                path: "/x".to_string(),
            },
            StatusCode::NOT_FOUND,
        ),
        (
            || HandlerError::MethodNotAllowed {
                method: Method::PUT,
                path: "/x".to_string(),
                allowed: vec![Method::GET, Method::POST],
            },
            StatusCode::METHOD_NOT_ALLOWED,
        ),
        (|| HandlerError::Failed("db down".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (make_error, status) in cases {
        let (kernel, _) = build_kernel(Arc::new(FailingHandler(make_error)), None);
        let response = kernel.handle(request("/x")).await?;
        assert_eq!(response.status(), status);
        assert_eq!(kernel.state(), KernelState::Handled);
        if status == StatusCode::METHOD_NOT_ALLOWED {
            assert_eq!(response.headers()["allow"], "GET, POST");
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_error_detail_only_in_debug() -> Result<(), HttpKernelError> {
    let failing = || HandlerError::Failed("secret stack detail".to_string());

    let (kernel, _) = build_kernel(Arc::new(FailingHandler(failing)), None);
    let response = kernel.handle(request("/")).await?;
    assert_eq!(response.body(), b"Internal Server Error");

    let emitter = Arc::new(BufferEmitter::new());
    let kernel = HttpKernel::new(Arc::new(FailingHandler(failing)), emitter).with_debug(true);
    let response = kernel.handle(request("/")).await?;
    assert!(String::from_utf8_lossy(response.body()).contains("secret stack detail"));
    Ok(())
}

#[tokio::test]
async fn test_send_emits_response_rewritten_by_subscriber() -> Result<(), HttpKernelError> {
    let events = SharedEventDispatcher::new();
    events
        .register_type_handler::<KernelResponseEvent>(sync_typed_handler(|event: &mut KernelResponseEvent| {
            event
                .response_mut()
                .headers_mut()
                .insert("x-powered-by", http::HeaderValue::from_static("bloom"));
            EventResult::Continue
        }))
        .await;
    let (kernel, emitter) = build_kernel(Arc::new(RecordingHandler::default()), Some(events));

    let response = kernel.handle(request("/")).await?;
    let sent = kernel.send(response).await?;
    assert_eq!(sent.headers()["x-powered-by"], "bloom");
    assert_eq!(emitter.last().unwrap().headers["x-powered-by"], "bloom");
    Ok(())
}

#[tokio::test]
async fn test_terminate_dispatches_event() -> Result<(), HttpKernelError> {
    let events = SharedEventDispatcher::new();
    let terminated = Arc::new(Mutex::new(Vec::new()));
    let log = terminated.clone();
    events
        .register_handler(
            "kernel.terminate",
            sync_event_handler(move |event: &mut dyn Event| {
                log.lock().unwrap().push(event.name());
                EventResult::Continue
            }),
        )
        .await;
    let (kernel, _) = build_kernel(Arc::new(RecordingHandler::default()), Some(events));

    let response = kernel.handle(request("/")).await?;
    let response = kernel.send(response).await?;
    assert!(terminated.lock().unwrap().is_empty());
    kernel.terminate(request("/"), response).await?;
    assert_eq!(*terminated.lock().unwrap(), vec!["kernel.terminate"]);
    Ok(())
}

struct BrokenPipeEmitter;

impl ResponseEmitter for BrokenPipeEmitter {
    fn emit(&self, _response: &Response) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
    }
}

#[tokio::test]
async fn test_terminate_runs_after_failed_emit() -> Result<(), HttpKernelError> {
    let events = SharedEventDispatcher::new();
    let terminated = Arc::new(Mutex::new(0));
    let count = terminated.clone();
    events
        .register_type_handler::<KernelTerminateEvent>(sync_typed_handler(move |_: &mut KernelTerminateEvent| {
            *count.lock().unwrap() += 1;
            EventResult::Continue
        }))
        .await;
    let kernel = HttpKernel::new(Arc::new(RecordingHandler::default()), Arc::new(BrokenPipeEmitter))
        .with_events(Some(events));

    let response = kernel.handle(request("/")).await?;
    let err = kernel.send(response).await.unwrap_err();
    match err {
        HttpKernelError::Emit(source) => assert_eq!(source.kind(), io::ErrorKind::BrokenPipe),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(kernel.state(), KernelState::Emitted);

    kernel.terminate(request("/"), Response::default()).await?;
    assert_eq!(kernel.state(), KernelState::Terminated);
    assert_eq!(*terminated.lock().unwrap(), 1);
    Ok(())
}

struct PanickingHandler;

#[async_trait]
impl RequestHandler for PanickingHandler {
    async fn handle(&self, _request: Request) -> Result<Response, HandlerError> {
        panic!("route exploded");
    }
}

#[tokio::test]
async fn test_handler_panic_becomes_server_error() -> Result<(), HttpKernelError> {
    let (kernel, emitter) = build_kernel(Arc::new(PanickingHandler), None);

    let response = kernel.handle(request("/boom")).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body(), b"Internal Server Error");
    assert_eq!(kernel.state(), KernelState::Handled);

    kernel.send(response).await?;
    assert_eq!(emitter.emitted().len(), 1);

    let debug_kernel = HttpKernel::new(Arc::new(PanickingHandler), Arc::new(BufferEmitter::new())).with_debug(true);
    let response = debug_kernel.handle(request("/boom")).await?;
    assert!(String::from_utf8_lossy(response.body()).contains("route exploded"));
    Ok(())
}
