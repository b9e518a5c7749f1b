// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Request, response and the per-request [`Context`] handed to handlers.
//!
//! These types are platform-agnostic: the axum adapter in [`crate::serve`]
//! converts to and from them, and tests can drive [`crate::Mux::dispatch`]
//! directly.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::method::Method;

/// Parameter name under which the path router stores a wildcard capture.
pub const WILDCARD_PARAM: &str = "*";

/// An incoming HTTP request.
///
/// # Example
///
/// ```rust
/// use trellis::{Method, Request};
///
/// let request = Request::new(Method::Get, "/search")
///     .with_query_string("q=rust&page=2")
///     .with_header("Accept", "text/html");
/// assert_eq!(request.query.get("q").map(String::as_str), Some("rust"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method.
    pub method: Method,

    /// The request path (e.g., "/blog/hello").
    pub path: String,

    /// Query parameters (parsed from URL).
    pub query: HashMap<String, String>,

    /// HTTP headers, keyed by lower-case name.
    pub headers: HashMap<String, String>,

    /// Request body.
    pub body: Vec<u8>,
}

impl Request {
    /// Creates a request with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: HashMap::new(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Parses a raw query string (`a=1&b=2`) into the query map.
    pub fn with_query_string(mut self, query: &str) -> Self {
        self.query = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        self
    }

    /// Adds a header; the name is stored lower-cased.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// An outgoing HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,

    /// Response headers in insertion order.
    pub headers: Vec<(String, String)>,

    /// Response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Creates an empty response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Creates a `text/plain` response.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status)
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_body(body.into())
    }

    /// Creates a `text/html` response.
    pub fn html(status: u16, body: Html) -> Self {
        Self::new(status)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(body.0)
    }

    /// Creates an `application/json` response.
    pub fn json(status: u16, body: &JsonValue) -> Self {
        Self::new(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    /// Creates a redirect response.
    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self::new(status).with_header("location", location)
    }

    /// Appends a header.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Replaces the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the first header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the body as a string, if valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

/// Rendered HTML produced by pages and layouts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Html(pub String);

impl Html {
    /// Wraps a string of markup.
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    /// Returns the markup.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Html {
    fn from(markup: String) -> Self {
        Self(markup)
    }
}

impl From<&str> for Html {
    fn from(markup: &str) -> Self {
        Self(markup.to_string())
    }
}

/// What the root proxy decided for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyAction {
    /// Route the request as-is.
    Continue,
    /// Route the request as if it had been made to another path.
    Rewrite(String),
    /// Answer with a redirect without routing.
    Redirect {
        /// Target location.
        location: String,
        /// Redirect status (301, 302, 303, 307, 308).
        status: u16,
    },
}

/// Per-request state handed to handlers, middleware, loaders and pages.
///
/// A context accepts exactly one response. Once something has been
/// written, later writes are ignored and logged, and an error returned
/// afterwards is not translated into a second response.
#[derive(Debug)]
pub struct Context {
    request: Request,
    params: HashMap<String, String>,
    locals: serde_json::Map<String, JsonValue>,
    extra_headers: Vec<(String, String)>,
    response: Option<Response>,
}

impl Context {
    /// Creates a context for a request with no path parameters yet.
    pub fn new(request: Request) -> Self {
        Self {
            request,
            params: HashMap::new(),
            locals: serde_json::Map::new(),
            extra_headers: Vec::new(),
            response: None,
        }
    }

    /// The request method.
    pub fn method(&self) -> Method {
        self.request.method
    }

    /// The request path, after any proxy rewrite.
    pub fn path(&self) -> &str {
        &self.request.path
    }

    /// The underlying request.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// A path parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// All path parameters.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// A query parameter by name.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.request.query.get(name).map(String::as_str)
    }

    /// A request header by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The raw request body.
    pub fn body(&self) -> &[u8] {
        &self.request.body
    }

    /// The request body as UTF-8 text; 400 if it is not valid UTF-8.
    pub fn body_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.request.body)
            .map_err(|e| Error::bad_request(format!("body is not valid UTF-8: {e}")))
    }

    /// The request body decoded as JSON; 400 if it does not decode.
    pub fn body_json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.request.body)
            .map_err(|e| Error::bad_request(format!("invalid JSON body: {e}")))
    }

    /// Stores a value for later middleware, loaders and handlers.
    pub fn set_local(&mut self, key: impl Into<String>, value: JsonValue) {
        self.locals.insert(key.into(), value);
    }

    /// Reads a value stored with [`Context::set_local`].
    pub fn local(&self, key: &str) -> Option<&JsonValue> {
        self.locals.get(key)
    }

    /// Adds a header to whatever response is eventually written.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.extra_headers.push((name.to_string(), value.into()));
    }

    /// Writes a response. Only the first write of a request takes effect.
    pub fn write(&mut self, response: Response) {
        if let Some(existing) = &self.response {
            tracing::warn!(
                path = %self.request.path,
                written = existing.status,
                ignored = response.status,
                "response already written, ignoring second write"
            );
            return;
        }
        self.response = Some(response);
    }

    /// Writes an empty response with the given status.
    pub fn status(&mut self, status: u16) {
        self.write(Response::new(status));
    }

    /// Writes a `text/plain` response.
    pub fn text(&mut self, status: u16, body: impl Into<String>) {
        self.write(Response::text(status, body));
    }

    /// Writes a `text/html` response.
    pub fn html(&mut self, status: u16, body: Html) {
        self.write(Response::html(status, body));
    }

    /// Serializes `body` and writes an `application/json` response.
    pub fn json<T: Serialize>(&mut self, status: u16, body: &T) -> Result<()> {
        let value = serde_json::to_value(body)
            .map_err(|e| Error::internal(format!("cannot serialize response: {e}")))?;
        self.write(Response::json(status, &value));
        Ok(())
    }

    /// Writes a redirect response.
    pub fn redirect(&mut self, status: u16, location: impl Into<String>) {
        self.write(Response::redirect(status, location));
    }

    /// Returns true once a response has been written.
    pub fn is_written(&self) -> bool {
        self.response.is_some()
    }

    /// Translates a handler error into a response, unless one was already
    /// written.
    pub fn fail(&mut self, err: Error) {
        if self.is_written() {
            tracing::warn!(path = %self.request.path, error = %err, "error after response was written");
            return;
        }
        self.write(Response::text(err.status(), err.message()));
    }

    /// Finishes the request. A handler that wrote nothing yields an empty
    /// 200.
    pub fn into_response(self) -> Response {
        let mut response = self.response.unwrap_or_else(|| Response::new(200));
        response.headers.extend(self.extra_headers);
        response
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    pub(crate) fn rewrite(&mut self, path: String) {
        self.request.path = path;
    }

    /// Copies the router's wildcard capture under the route's own
    /// catch-all parameter name.
    pub(crate) fn expose_wildcard(&mut self, name: &str) {
        let value = self.params.get(WILDCARD_PARAM).cloned().unwrap_or_default();
        self.params.insert(name.to_string(), value);
    }
}
