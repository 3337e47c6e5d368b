use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use http::Method;

use crate::event::{EventId, EventResult, KernelRequestEvent, SharedEventDispatcher, sync_typed_handler};
use crate::http::{HandlerError, Request, RequestHandler, Response};

/// Future returned by a route handler
pub type RouteFuture = Pin<Box<dyn Future<Output = Result<Response, HandlerError>> + Send>>;

/// Type-erased route handler
pub type RouteFn = Arc<dyn Fn(Request) -> RouteFuture + Send + Sync>;

/// Route attached to a request by the `kernel.request` subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute {
    pub name: String,
    pub method: Method,
    pub path: String,
}

#[derive(Clone)]
struct Route {
    name: String,
    method: Method,
    path: String,
    handler: RouteFn,
}

/// Exact `(method, path)` route table.
///
/// Paths are compared literally after trimming a trailing slash; there are no
/// parameters or wildcards.
#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes: Vec<String> = self
            .routes
            .iter()
            .map(|route| format!("{} {} ({})", route.method, route.path, route.name))
            .collect();
        f.debug_struct("Router").field("routes", &routes).finish()
    }
}

fn canonical_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` on `path`. A later route with the same
    /// method and path replaces the earlier one.
    pub fn route<F, Fut>(&mut self, method: Method, path: &str, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, HandlerError>> + Send + 'static,
    {
        let path = canonical_path(path);
        let handler: RouteFn = Arc::new(move |request| Box::pin(handler(request)) as RouteFuture);
        self.routes.retain(|route| !(route.method == method && route.path == path));
        self.routes.push(Route {
            name: name.into(),
            method,
            path,
            handler,
        });
        self
    }

    pub fn get<F, Fut>(&mut self, path: &str, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, HandlerError>> + Send + 'static,
    {
        self.route(Method::GET, path, name, handler)
    }

    pub fn post<F, Fut>(&mut self, path: &str, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, HandlerError>> + Send + 'static,
    {
        self.route(Method::POST, path, name, handler)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the route for `method` and `path`.
    ///
    /// A path that exists only under other methods is `MethodNotAllowed`.
    pub fn match_route(&self, method: &Method, path: &str) -> Result<MatchedRoute, HandlerError> {
        let path = canonical_path(path);
        let on_path: Vec<&Route> = self.routes.iter().filter(|route| route.path == path).collect();
        if on_path.is_empty() {
            return Err(HandlerError::NotFound {
                method: method.clone(),
                path,
            });
        }
        match on_path.iter().find(|route| route.method == *method) {
            Some(route) => Ok(MatchedRoute {
                name: route.name.clone(),
                method: route.method.clone(),
                path: route.path.clone(),
            }),
            None => Err(HandlerError::MethodNotAllowed {
                method: method.clone(),
                allowed: on_path.iter().map(|route| route.method.clone()).collect(),
                path,
            }),
        }
    }

    /// Attach a [`MatchedRoute`] to every matching request on `kernel.request`.
    ///
    /// Requests that match nothing pass through untouched; the router reports
    /// them when it handles the request.
    pub async fn subscribe(self: &Arc<Self>, dispatcher: &SharedEventDispatcher) -> EventId {
        let router = Arc::clone(self);
        dispatcher
            .register_type_handler::<KernelRequestEvent>(sync_typed_handler(move |event: &mut KernelRequestEvent| {
                let request = event.request();
                if let Ok(matched) = router.match_route(request.method(), request.uri().path()) {
                    log::debug!("Matched route '{}' for {} {}", matched.name, matched.method, matched.path);
                    event.request_mut().extensions_mut().insert(matched);
                }
                EventResult::Continue
            }))
            .await
    }

    fn route_for(&self, matched: &MatchedRoute) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| route.name == matched.name && route.method == matched.method && route.path == matched.path)
    }
}

#[async_trait]
impl RequestHandler for Router {
    async fn handle(&self, request: Request) -> Result<Response, HandlerError> {
        let matched = match request.extensions().get::<MatchedRoute>() {
            Some(matched) => matched.clone(),
            None => self.match_route(request.method(), request.uri().path())?,
        };
        let route = self.route_for(&matched).ok_or_else(|| HandlerError::NotFound {
            method: matched.method.clone(),
            path: matched.path.clone(),
        })?;
        let handler = route.handler.clone();
        handler(request).await
    }
}
