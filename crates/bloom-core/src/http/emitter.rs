use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use http::header::CONTENT_LENGTH;
use http::{HeaderMap, StatusCode};

use crate::http::Response;

/// Writes a response to the transport.
pub trait ResponseEmitter: Send + Sync {
    fn emit(&self, response: &Response) -> io::Result<()>;
}

/// Serialise `response` the way a CGI/SAPI gateway expects it:
/// a `Status:` line, the headers, a blank line and the body.
pub fn render_sapi(response: &Response) -> Vec<u8> {
    let status = response.status();
    let mut out = Vec::with_capacity(response.body().len() + 128);
    out.extend_from_slice(
        format!("Status: {} {}\r\n", status.as_u16(), status.canonical_reason().unwrap_or("")).as_bytes(),
    );
    for (name, value) in response.headers() {
        out.extend_from_slice(name.as_str().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    if !response.headers().contains_key(CONTENT_LENGTH) {
        out.extend_from_slice(format!("content-length: {}\r\n", response.body().len()).as_bytes());
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(response.body());
    out
}

/// Emitter writing SAPI-style output to any writer (stdout by default).
pub struct SapiEmitter<W> {
    writer: Mutex<W>,
}

impl SapiEmitter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> SapiEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W> fmt::Debug for SapiEmitter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SapiEmitter").finish_non_exhaustive()
    }
}

impl<W: Write + Send> ResponseEmitter for SapiEmitter<W> {
    fn emit(&self, response: &Response) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&render_sapi(response))?;
        writer.flush()
    }
}

/// A response captured by [`BufferEmitter`]
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl EmittedResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Keeps emitted responses in memory.
#[derive(Debug, Default)]
pub struct BufferEmitter {
    emitted: Mutex<Vec<EmittedResponse>>,
}

impl BufferEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> Vec<EmittedResponse> {
        self.emitted.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last(&self) -> Option<EmittedResponse> {
        self.emitted.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }
}

impl ResponseEmitter for BufferEmitter {
    fn emit(&self, response: &Response) -> io::Result<()> {
        self.emitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(EmittedResponse {
                status: response.status(),
                headers: response.headers().clone(),
                body: response.body().clone(),
            });
        Ok(())
    }
}
