use std::fmt;
use std::sync::{Arc, Weak};

use tokio::sync::OnceCell;

use crate::container::ids;
use crate::http::{HttpKernel, Request, ResponseEmitter, Response, Router, SapiEmitter};
use crate::kernel::bootstrap::Application;
use crate::kernel::error::{Error, Result};
use crate::kernel::session::{ActiveSession, SessionManager};

/// Application-bound entry point to the HTTP pipeline.
///
/// Registered under `Kernel` during pre-build. The first call builds the
/// application and assembles an [`HttpKernel`] from the container: an
/// `HttpKernel` binding is used as is; otherwise one is made from the `Router`
/// binding (or an empty router) and the `ResponseEmitter` binding (or SAPI
/// output on stdout).
pub struct Kernel {
    app: Weak<Application>,
    http: OnceCell<Arc<HttpKernel>>,
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("http_kernel", &self.http.get())
            .finish_non_exhaustive()
    }
}

impl Kernel {
    pub fn new(app: Weak<Application>) -> Self {
        Self {
            app,
            http: OnceCell::new(),
        }
    }

    fn app(&self) -> Result<Arc<Application>> {
        self.app.upgrade().ok_or(Error::InstanceUnavailable("Application"))
    }

    /// The HTTP kernel, building the application first if needed.
    pub async fn http_kernel(&self) -> Result<Arc<HttpKernel>> {
        let kernel = self
            .http
            .get_or_try_init(|| async {
                let app = self.app()?.build().await?;
                assemble(&app).await
            })
            .await?;
        Ok(kernel.clone())
    }

    pub async fn handle(&self, mut request: Request) -> Result<Response> {
        let kernel = self.http_kernel().await?;
        if let Some(session) = self.active_session() {
            request.extensions_mut().insert(session);
        }
        Ok(kernel.handle(request).await?)
    }

    pub async fn send(&self, response: Response) -> Result<Response> {
        Ok(self.http_kernel().await?.send(response).await?)
    }

    pub async fn terminate(&self, request: Request, response: Response) -> Result<()> {
        Ok(self.http_kernel().await?.terminate(request, response).await?)
    }

    fn active_session(&self) -> Option<ActiveSession> {
        let app = self.app.upgrade()?;
        match app.container().resolve::<Arc<dyn SessionManager>>(ids::SESSION_MANAGER) {
            Ok(session) => session?.session_id().map(|id| ActiveSession { id }),
            Err(e) => {
                log::warn!("Session manager unavailable: {}", e);
                None
            }
        }
    }
}

async fn assemble(app: &Application) -> Result<Arc<HttpKernel>> {
    let container = app.container();
    if let Some(kernel) = container.resolve::<Arc<HttpKernel>>(ids::HTTP_KERNEL)? {
        return Ok(kernel);
    }

    let router = container.resolve::<Arc<Router>>(ids::ROUTER)?.unwrap_or_default();
    let events = app.events();
    if let Some(events) = &events {
        router.subscribe(events).await;
    }
    let emitter: Arc<dyn ResponseEmitter> = match container.resolve(ids::RESPONSE_EMITTER)? {
        Some(emitter) => emitter,
        None => Arc::new(SapiEmitter::stdout()),
    };
    log::debug!("Assembled HTTP kernel with {} route(s)", router.len());

    let kernel = Arc::new(
        HttpKernel::new(router, emitter)
            .with_events(events)
            .with_debug(app.is_debug()),
    );
    container.share(ids::HTTP_KERNEL, kernel.clone());
    Ok(kernel)
}
