//! Incoming HTTP request type.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;

use crate::codec::{self, Format, Validate};
use crate::error::Error;
use crate::handler::BoxError;
use crate::param::Param;

/// An incoming HTTP request with its body already collected.
///
/// Path parameters are not parsed here: whatever dispatcher picked the
/// handler attaches them with [`Request::with_param`].
///
/// A body the transport failed to collect does not stop the request: it runs
/// through the chain like any other and the failure surfaces as a `400` when
/// the handler reads the body.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    body_error: Option<BodyError>,
    params: HashMap<String, String>,
    remote_addr: Option<SocketAddr>,
}

/// Why the transport could not collect the body. Shared so the body can be
/// read any number of times.
#[derive(Clone, Debug)]
struct BodyError(Arc<dyn std::error::Error + Send + Sync>);

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for BodyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl Request {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            body_error: None,
            params: HashMap::new(),
            remote_addr: None,
        }
    }

    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes, remote_addr: SocketAddr) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            body_error: None,
            params: HashMap::new(),
            remote_addr: Some(remote_addr),
        }
    }

    /// Records that the transport failed to collect the body.
    pub(crate) fn with_body_error(mut self, err: impl Into<BoxError>) -> Self {
        self.body = Bytes::new();
        self.body_error = Some(BodyError(Arc::from(err.into())));
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Attaches a named path parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    /// The collected body; empty when it could not be read. See [`Request::read_body`].
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }

    /// Case-insensitive header lookup; `None` for absent or non-ASCII values.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// First value of `name` in the URL-decoded query string.
    ///
    /// A query string that fails to decode is treated as empty.
    pub fn query(&self, name: &str) -> Option<String> {
        let query = self.uri.query()?;
        serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .ok()?
            .into_iter()
            .find_map(|(k, v)| (k == name).then_some(v))
    }

    // ── Parameters ────────────────────────────────────────────────────────────

    pub fn path_param(&self, name: &str) -> Param {
        Param::path(name, self.param(name).unwrap_or_default())
    }

    pub fn query_param(&self, name: &str) -> Param {
        Param::query(name, self.query(name).unwrap_or_default())
    }

    /// Query parameter that falls back to `default` when absent or empty.
    pub fn query_param_or(&self, name: &str, default: &str) -> Param {
        let param = self.query_param(name);
        if param.is_empty() {
            Param::query(name, default)
        } else {
            param
        }
    }

    /// Query parameter that must be present and non-empty, or a `400`.
    pub fn required_query_param(&self, name: &str) -> Result<Param, Error> {
        let param = self.query_param(name);
        if param.is_empty() {
            return Err(param.error("is required"));
        }
        Ok(param)
    }

    // ── Body ──────────────────────────────────────────────────────────────────

    /// The raw body, or the `400` "unable to read body" when the transport
    /// failed to collect it.
    pub fn read_body(&self) -> Result<&[u8], Error> {
        match &self.body_error {
            Some(err) => Err(codec::unreadable(err.clone())),
            None => Ok(&self.body),
        }
    }

    /// Decodes and validates the body. See [`codec::decode`].
    pub fn decode<T>(&self, format: Format) -> Result<T, BoxError>
    where
        T: DeserializeOwned + Validate,
    {
        codec::decode(self.read_body()?, format)
    }
}
