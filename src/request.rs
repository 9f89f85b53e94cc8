//! Incoming HTTP request type.

use std::net::SocketAddr;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};

/// An incoming HTTP request, fully read off the connection.
///
/// Immutable once built. Routing uses [`path`](Request::path) only; the raw
/// [`url`](Request::url) is what [`Context::query_param`](crate::Context::query_param)
/// parses.
#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) target: String,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) remote_addr: Option<SocketAddr>,
}

impl Request {
    /// Builds a request by hand, e.g. for driving a
    /// [`Dispatcher`](crate::Dispatcher) without a socket.
    ///
    /// `target` is the request target as it would appear on the request
    /// line: `/search?q=rust`.
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        let target = target.into();
        let path = match target.parse::<Uri>() {
            Ok(uri) => uri.path().to_owned(),
            Err(_) => target.split(['?', '#']).next().unwrap_or_default().to_owned(),
        };
        Self {
            method,
            target,
            path,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            remote_addr: None,
        }
    }

    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes, remote_addr: SocketAddr) -> Self {
        Self {
            method: parts.method,
            target: parts.uri.to_string(),
            path: parts.uri.path().to_owned(),
            headers: parts.headers,
            body,
            remote_addr: Some(remote_addr),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }

    /// The request target exactly as received, query string included.
    pub fn url(&self) -> &str { &self.target }

    /// Header lookup. Names are case-insensitive; non-UTF-8 values read as `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
