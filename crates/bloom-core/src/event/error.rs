//! # Bloom Event System Errors
//!
//! Defines [`EventSystemError`], returned by event handlers and by the typed
//! helpers that downcast a `dyn Event` to its concrete type. The dispatcher
//! logs these and keeps going; they never abort a dispatch.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventSystemError {
    #[error("Handler for event '{event_name}' failed: {reason}")]
    HandlerFailed { event_name: String, reason: String },

    #[error("Event '{event_name}' is not a '{expected}'")]
    UnexpectedEventType {
        event_name: String,
        expected: &'static str,
    },
}

impl EventSystemError {
    /// Shorthand for a handler failure on `event_name`.
    pub fn handler_failed(event_name: impl Into<String>, reason: impl Into<String>) -> Self {
        EventSystemError::HandlerFailed {
            event_name: event_name.into(),
            reason: reason.into(),
        }
    }
}
