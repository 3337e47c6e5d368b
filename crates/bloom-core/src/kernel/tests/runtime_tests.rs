use std::sync::Arc;

use async_trait::async_trait;
use http::{Method, StatusCode};

use super::support::isolated_env;
use crate::container::{ServiceContainer, ids};
use crate::http::{
    BufferEmitter, HandlerError, HttpKernel, HttpKernelError, MatchedRoute, Request, Response, ResponseEmitter, Router,
};
use crate::kernel::bootstrap::{Application, ProcessMode};
use crate::kernel::error::{Error, Result};
use crate::kernel::session::{ActiveSession, SessionManager};
use crate::provider::{ProviderRef, ServiceProvider};

fn request(method: Method, path: &str) -> Request {
    http::Request::builder().method(method).uri(path).body(Vec::new()).unwrap()
}

/// Registers a small router and an in-memory emitter.
struct WebProvider {
    emitter: Arc<BufferEmitter>,
}

#[async_trait]
impl ServiceProvider for WebProvider {
    fn name(&self) -> &str {
        "web"
    }

    async fn register(&self, container: &ServiceContainer) -> Result<()> {
        let mut router = Router::new();
        router
            .get("/hello", "hello", |_request: Request| async {
                Ok(Response::new(b"hello".to_vec()))
            })
            .get("/route", "route-name", |request: Request| async move {
                let name = request
                    .extensions()
                    .get::<MatchedRoute>()
                    .map(|matched| matched.name.clone())
                    .unwrap_or_default();
                Ok(Response::new(name.into_bytes()))
            })
            .get("/session", "session", |request: Request| async move {
                let id = request
                    .extensions()
                    .get::<ActiveSession>()
                    .map(|session| session.id.clone())
                    .unwrap_or_default();
                Ok(Response::new(id.into_bytes()))
            })
            .get("/fail", "fail", |_request: Request| async {
                Err(HandlerError::Failed("database went away".to_string()))
            });
        container.share(ids::ROUTER, Arc::new(router));
        container.share(ids::RESPONSE_EMITTER, self.emitter.clone() as Arc<dyn ResponseEmitter>);
        Ok(())
    }
}

fn web_app(vars: &[(&str, &str)]) -> (Arc<Application>, Arc<BufferEmitter>) {
    let emitter = Arc::new(BufferEmitter::new());
    let app = Application::builder("/srv/app")
        .env(isolated_env(vars))
        .process_mode(ProcessMode::Web)
        .provider(ProviderRef::instance(WebProvider {
            emitter: emitter.clone(),
        }))
        .finish()
        .unwrap();
    (app, emitter)
}

#[tokio::test]
async fn test_kernel_builds_application_on_first_request() -> Result<()> {
    let (app, emitter) = web_app(&[]);
    let kernel = app.kernel()?;
    assert!(!app.is_built());

    let response = kernel.handle(request(Method::GET, "/hello")).await?;
    assert!(app.is_built());
    assert_eq!(response.status(), StatusCode::OK);

    let sent = kernel.send(response).await?;
    kernel.terminate(request(Method::GET, "/hello"), sent).await?;

    let emitted = emitter.last().unwrap();
    assert_eq!(emitted.status, StatusCode::OK);
    assert_eq!(emitted.body_text(), "hello");
    Ok(())
}

#[tokio::test]
async fn test_router_tags_matched_route() -> Result<()> {
    let (app, _emitter) = web_app(&[]);
    let kernel = app.kernel()?;

    let response = kernel.handle(request(Method::GET, "/route/")).await?;

    assert_eq!(response.body().as_slice(), b"route-name");
    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_not_found() -> Result<()> {
    let (app, _emitter) = web_app(&[]);
    let kernel = app.kernel()?;

    let response = kernel.handle(request(Method::GET, "/missing")).await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.body().as_slice(), b"Not Found");
    Ok(())
}

#[tokio::test]
async fn test_handler_failure_detail_only_in_debug() -> Result<()> {
    let (quiet, _) = web_app(&[]);
    let response = quiet.kernel()?.handle(request(Method::GET, "/fail")).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body().as_slice(), b"Internal Server Error");

    let (debug, _) = web_app(&[("APP_DEBUG", "true")]);
    let response = debug.kernel()?.handle(request(Method::GET, "/fail")).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8_lossy(response.body()).contains("database went away"));
    Ok(())
}

#[tokio::test]
async fn test_kernel_rejects_out_of_order_calls() -> Result<()> {
    let (app, _emitter) = web_app(&[]);
    let kernel = app.kernel()?;

    let err = kernel.send(Response::new(Vec::new())).await.unwrap_err();
    assert!(matches!(err, Error::HttpKernel(HttpKernelError::InvalidTransition { .. })));

    kernel.handle(request(Method::GET, "/hello")).await?;
    let err = kernel.handle(request(Method::GET, "/hello")).await.unwrap_err();
    assert!(matches!(err, Error::HttpKernel(HttpKernelError::InvalidTransition { .. })));
    Ok(())
}

struct FixedSession;

#[async_trait]
impl SessionManager for FixedSession {
    async fn start(&self) -> Result<()> {
        Ok(())
    }

    fn session_id(&self) -> Option<String> {
        Some("abc123".to_string())
    }
}

#[tokio::test]
async fn test_requests_carry_active_session() -> Result<()> {
    let (app, _emitter) = web_app(&[]);
    app.container()
        .share(ids::SESSION_MANAGER, Arc::new(FixedSession) as Arc<dyn SessionManager>);

    let response = app.kernel()?.handle(request(Method::GET, "/session")).await?;

    assert_eq!(response.body().as_slice(), b"abc123");
    Ok(())
}

#[tokio::test]
async fn test_registered_http_kernel_is_used_as_is() -> Result<()> {
    let app = Application::builder("/srv/app")
        .env(isolated_env(&[]))
        .finish()?;
    let custom = Arc::new(HttpKernel::new(Arc::new(Router::new()), Arc::new(BufferEmitter::new())));
    app.container().share(ids::HTTP_KERNEL, custom.clone());

    let resolved = app.kernel()?.http_kernel().await?;

    assert!(Arc::ptr_eq(&resolved, &custom));
    Ok(())
}

#[tokio::test]
async fn test_assembled_kernel_is_shared() -> Result<()> {
    let (app, _emitter) = web_app(&[]);

    let first = app.kernel()?.http_kernel().await?;
    let bound = app.container().get::<Arc<HttpKernel>>(ids::HTTP_KERNEL)?;

    assert!(Arc::ptr_eq(&first, &bound));
    Ok(())
}

#[tokio::test]
async fn test_kernel_outliving_application() -> Result<()> {
    let (app, _emitter) = web_app(&[]);
    let kernel = app.kernel()?;
    drop(app);

    let err = kernel.handle(request(Method::GET, "/hello")).await.unwrap_err();
    assert!(err.is_instance_unavailable());
    Ok(())
}
