//! # Bloom HTTP Errors
//!
//! [`HandlerError`] is what a request handler reports; the kernel turns it
//! into an error response and never lets it escape. [`HttpKernelError`] is
//! reserved for misuse of the kernel itself and for transport failures.
use http::Method;
use thiserror::Error;

use crate::http::kernel::KernelState;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("No route matches {method} {path}")]
    NotFound { method: Method, path: String },

    #[error("Method {method} is not allowed for {path}")]
    MethodNotAllowed {
        method: Method,
        path: String,
        allowed: Vec<Method>,
    },

    #[error("Request handling failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum HttpKernelError {
    #[error("Cannot {operation} while the kernel is {from}")]
    InvalidTransition {
        from: KernelState,
        operation: &'static str,
    },

    #[error("Failed to emit response: {0}")]
    Emit(#[source] std::io::Error),
}
