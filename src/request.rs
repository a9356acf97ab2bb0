//! Incoming HTTP request type handed to every handler slot.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, Uri};

/// An incoming HTTP request with its body fully read and its path
/// parameters resolved by the router.
pub struct Request {
    method: http::Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(
        method: http::Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self { method, uri, headers, body, params: HashMap::new() }
    }

    pub(crate) fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Builds a request outside the server, e.g. to call a [`Router`](crate::Router)
    /// directly from a test.
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::new(parts.method, parts.uri, parts.headers, body)
    }

    pub fn method(&self) -> &http::Method { &self.method }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn query(&self) -> Option<&str> { self.uri.query() }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Header lookup. Names are case-insensitive; non-UTF-8 values read as `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// On `/function/{name}/{*params}`, `/function/echo/a/b` gives
    /// `param("name") == Some("echo")` and `param("params") == Some("a/b")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}
