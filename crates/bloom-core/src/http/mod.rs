//! # Bloom HTTP Kernel
//!
//! The request pipeline: an inbound [`Request`] is offered to `kernel.request`
//! subscribers (which may swap it, e.g. to attach a [`MatchedRoute`]), handed
//! to a [`RequestHandler`], and the resulting [`Response`] is offered to
//! `kernel.response` subscribers before a [`ResponseEmitter`] writes it out.
//! `kernel.terminate` closes the cycle.
//!
//! Request and response values are the `http` crate's types with an in-memory
//! body.
pub mod emitter;
pub mod error;
pub mod kernel;
pub mod router;

use async_trait::async_trait;

pub use emitter::{BufferEmitter, EmittedResponse, ResponseEmitter, SapiEmitter};
pub use error::{HandlerError, HttpKernelError};
pub use kernel::{HttpKernel, KernelState};
pub use router::{MatchedRoute, Router};

/// In-memory message body
pub type Body = Vec<u8>;

pub type Request = ::http::Request<Body>;

pub type Response = ::http::Response<Body>;

/// Turns a request into a response. The router is the usual implementation.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, request: Request) -> Result<Response, HandlerError>;
}

// Test module declaration
#[cfg(test)]
mod tests;
