use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bloom_core::container::{ServiceContainer, ids};
use bloom_core::http::{Request, Response, Router};
use bloom_core::kernel::constants::{APP_NAME, APP_VERSION};
use bloom_core::provider::{ProviderRef, ServiceProvider};
use bloom_core::{Application, KernelError, Result};
use http::header::{CONTENT_TYPE, HeaderValue};
use http::Method;
use serde_json::Value;

/// Routes served by `serve-once` when the project registers no router of its own.
#[derive(Debug)]
pub struct WelcomeProvider;

#[async_trait]
impl ServiceProvider for WelcomeProvider {
    fn name(&self) -> &str {
        "welcome"
    }

    fn provides(&self) -> Vec<&'static str> {
        vec![ids::ROUTER]
    }

    async fn register(&self, container: &ServiceContainer) -> Result<()> {
        if container.has(ids::ROUTER) {
            return Ok(());
        }
        let mut router = Router::new();
        router
            .get("/", "welcome", |_request: Request| async {
                Ok(text_response(format!("Welcome to {} v{}\n", APP_NAME, APP_VERSION)))
            })
            .get("/health", "health", |_request: Request| async { Ok(text_response("ok\n".to_string())) });
        container.share(ids::ROUTER, Arc::new(router));
        Ok(())
    }
}

fn text_response(body: String) -> Response {
    let mut response = Response::new(body.into_bytes());
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

pub fn paths(base: &Path) -> Result<()> {
    let app = Application::create(base)?;
    println!("base: {}", app.base_path(None).display());
    println!("public: {}", app.public_path(None).display());
    println!("config: {}", app.config_path(None).display());
    println!("environment: {}", app.environment());
    println!("console: {}", app.running_in_console());
    Ok(())
}

pub async fn config_get(base: &Path, key: &str) -> Result<()> {
    Application::create(base)?;
    let app = bloom_core::app()?.build().await?;
    match app.config()?.value(key) {
        Some(Value::String(value)) => println!("{}", value),
        Some(value) => println!("{}", value),
        None => return Err(KernelError::Other(format!("No configuration value at '{}'", key))),
    }
    Ok(())
}

pub async fn serve_once(base: &Path, method: &str, path: &str) -> Result<()> {
    let app = Application::create(base)?;
    app.add_service_provider(ProviderRef::instance(WelcomeProvider));

    let method = Method::from_bytes(method.to_uppercase().as_bytes())
        .map_err(|e| KernelError::Other(format!("Invalid method '{}': {}", method, e)))?;
    let request = http::Request::builder()
        .method(method)
        .uri(path)
        .body(Vec::new())
        .map_err(|e| KernelError::Other(format!("Invalid request for '{}': {}", path, e)))?;
    let terminate_request = http::Request::builder()
        .method(request.method().clone())
        .uri(request.uri().clone())
        .body(Vec::new())
        .map_err(|e| KernelError::Other(e.to_string()))?;

    let kernel = app.kernel()?;
    let response = kernel.handle(request).await?;
    let response = kernel.send(response).await?;
    kernel.terminate(terminate_request, response).await
}
