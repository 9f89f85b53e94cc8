//! Per-request handler context.
//!
//! A [`Context`] is created by the dispatcher for every matched request and
//! handed to the route's handler by `&mut`. The handler reads request data
//! through it and writes the response into it; nothing reaches the client
//! until the handler has returned and the dispatcher flushes the context.
//!
//! ```rust
//! use http::StatusCode;
//! use waypost::{Context, Error};
//!
//! fn greet(ctx: &mut Context) -> Result<(), Error> {
//!     let greeting = match ctx.query_param("name") {
//!         "" => "hello, stranger".to_owned(),
//!         name => format!("hello, {name}"),
//!     };
//!     ctx.string(greeting, StatusCode::OK)
//! }
//! ```

use std::io::Read;
use std::sync::Arc;

use http::{Method, StatusCode};
use serde::Serialize;

use crate::dispatcher::FlushPolicy;
use crate::error::Error;
use crate::request::Request;
use crate::response::{APPLICATION_JSON, OCTET_STREAM, Response, TEXT_PLAIN};

/// Request data plus a buffered response.
///
/// Every write replaces the buffer; the last write before the handler
/// returns is what gets flushed.
#[derive(Debug)]
pub struct Context {
    request: Arc<Request>,
    buffer: Vec<u8>,
    status: StatusCode,
    content_type: Option<&'static str>,
}

impl Context {
    pub(crate) fn new(request: Arc<Request>) -> Self {
        Self { request, buffer: Vec::new(), status: StatusCode::OK, content_type: None }
    }

    pub fn request(&self) -> &Request { &self.request }
    pub fn method(&self) -> &Method { self.request.method() }
    pub fn path(&self) -> &str { self.request.path() }
    pub fn url(&self) -> &str { self.request.url() }
    pub fn body(&self) -> &[u8] { self.request.body() }
    pub fn header(&self, name: &str) -> Option<&str> { self.request.header(name) }

    /// Returns the value of `key` in the query string, or `""`.
    ///
    /// The query is taken from the last `/`-separated segment of the URL,
    /// after its first `?`. Pairs are split on `&` then `=`; the first pair
    /// whose key equals `key` wins. Values are returned as sent, without
    /// percent-decoding. A URL with no query, an absent key, or a matching
    /// pair with no `=` all yield `""`.
    pub fn query_param(&self, key: &str) -> &str {
        let last_segment = self.request.url().rsplit('/').next().unwrap_or_default();
        let Some(query) = last_segment.split('?').nth(1) else {
            return "";
        };
        query
            .split('&')
            .map(|pair| {
                let mut kv = pair.split('=');
                (kv.next().unwrap_or_default(), kv.next())
            })
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| v)
            .unwrap_or("")
    }

    /// Serialises `value` as JSON into the response buffer.
    ///
    /// Does not touch the status; pair with [`set_status`](Self::set_status)
    /// when something other than 200 is wanted. On failure the buffer is left
    /// as it was.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        let bytes = serde_json::to_vec(value)?;
        self.buffer = bytes;
        self.content_type = Some(APPLICATION_JSON);
        Ok(())
    }

    /// Sets the response body to `text` and the status to `status`.
    pub fn string(&mut self, text: impl Into<String>, status: StatusCode) -> Result<(), Error> {
        self.buffer = text.into().into_bytes();
        self.status = status;
        self.content_type = Some(TEXT_PLAIN);
        Ok(())
    }

    /// Reads `reader` to the end and uses its contents as the response body.
    ///
    /// The handle stays owned by the caller, which is responsible for closing
    /// it. On a read error neither body nor status change.
    pub fn file<R: Read + ?Sized>(&mut self, reader: &mut R, status: StatusCode) -> Result<(), Error> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map_err(Error::FileRead)?;
        self.buffer = buf;
        self.status = status;
        self.content_type = Some(OCTET_STREAM);
        Ok(())
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Consumes the context into the response the client will see.
    pub(crate) fn flush(self, policy: FlushPolicy) -> Response {
        match policy {
            FlushPolicy::StatusOnly if self.status != StatusCode::OK => Response::status(self.status),
            _ => Response::with_body(self.status, self.content_type, self.buffer),
        }
    }
}
