//! Wire-level request/response types and the transport seam.
//!
//! # Design
//! The executor never touches sockets. It lowers a request descriptor into
//! an `HttpRequest` (final URL, header lines, body bytes, timeouts) and
//! hands it to a `Transport`, which answers with an `HttpResponse` whose
//! body is still an unread stream. The stream is owned by the response and
//! released when the response is dropped.

use std::fmt;
use std::io::Read;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::TransportError;
use crate::headers::Headers;

/// HTTP method for a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Other(String),
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Other(method) => method,
        }
    }

    pub fn is_get(&self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

impl FromStr for HttpMethod {
    type Err = std::convert::Infallible;

    /// Parse a method name case-insensitively; unknown names become `Other`
    /// in upper case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Ok(match upper.as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            _ => HttpMethod::Other(upper),
        })
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proxy to route a request through, e.g. `http://proxy:3128` or
/// `socks5://proxy:1080`. Validated by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy(String);

impl Proxy {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A request ready for the wire.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub proxy: Option<Proxy>,
    /// Whether the transport may follow redirects on its own.
    pub follow_redirects: bool,
}

/// A response as returned by a transport, body not yet read.
pub struct HttpResponse {
    /// URL that produced this response.
    pub url: Url,
    pub status: u16,
    /// Status line text, e.g. `Not Found`.
    pub message: String,
    pub headers: Headers,
    pub body: Box<dyn Read>,
    /// Separate error stream, for transports that expose one.
    pub error_body: Option<Box<dyn Read>>,
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("url", &self.url.as_str())
            .field("status", &self.status)
            .field("message", &self.message)
            .field("headers", &self.headers)
            .field("error_body", &self.error_body.is_some())
            .finish_non_exhaustive()
    }
}

/// Performs the actual HTTP exchange for the executor.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}
