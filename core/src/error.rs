//! Error types for request execution.
//!
//! # Design
//! Everything that crosses the executor boundary is one of two kinds.
//! `RequestError` means the exchange never produced a usable response:
//! bad URL, unknown host, I/O failure, or a body the decoder rejected. It
//! keeps the offending URL text and a copy of the descriptor for
//! diagnostics. `ResponseError` means the server answered but the answer
//! is a failure (error status, broken or looping redirect); it carries the
//! full envelope with the body read as text.
//!
//! `TransportError` and `DecodeError` are the collaborator-side errors;
//! the executor converts them into `RequestError`.

use std::io;

use crate::request::RequestParts;
use crate::response::Response;

/// Result alias for executor calls.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure of a request execution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Response(#[from] ResponseError),
}

impl Error {
    /// The partial response, if the server answered.
    pub fn response(&self) -> Option<&Response<String>> {
        match self {
            Error::Response(e) => Some(e.response()),
            Error::Request(_) => None,
        }
    }
}

/// The request could not be built or dispatched.
#[derive(Debug, thiserror::Error)]
#[error("{url} {message}")]
pub struct RequestError {
    url: String,
    message: String,
    request: Option<Box<RequestParts>>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RequestError {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
            request: None,
            source: None,
        }
    }

    pub(crate) fn with_request(mut self, request: &RequestParts) -> Self {
        self.request = Some(Box::new(request.clone()));
        self
    }

    pub(crate) fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// URL text that triggered the error.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Descriptor in effect when the error happened.
    pub fn request(&self) -> Option<&RequestParts> {
        self.request.as_deref()
    }
}

/// The server answered with something that must be treated as failure.
#[derive(Debug, thiserror::Error)]
#[error("Request {} {} {}", .response.url(), .response.status(), .response.message())]
pub struct ResponseError {
    response: Box<Response<String>>,
}

impl ResponseError {
    pub fn new(response: Response<String>) -> Self {
        Self {
            response: Box::new(response),
        }
    }

    pub fn response(&self) -> &Response<String> {
        &self.response
    }

    pub fn status(&self) -> u16 {
        self.response.status()
    }

    pub fn into_response(self) -> Response<String> {
        *self.response
    }
}

/// Transport-level fault.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("unknown host {0}")]
    UnknownHost(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("invalid proxy {0}")]
    InvalidProxy(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// A response body could not be turned into the requested type.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to read response body: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}
