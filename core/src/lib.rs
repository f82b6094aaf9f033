//! Blocking HTTP request builder and executor.
//!
//! # Overview
//! A `Request` describes one exchange: URL, method, headers, params or a
//! raw body, timeouts, charsets, an optional cookie jar and proxy, and a
//! decoder that turns the response body into a value. An `Executor` lowers
//! it to the wire through a `Transport`, classifies the answer and, when
//! asked to, follows redirects with the original method and body.
//!
//! # Design
//! - Descriptors are immutable once built and can be sent any number of
//!   times, from any number of threads.
//! - Charsets are `encoding_rs` encodings. The outgoing charset comes from
//!   the request's `Content-Type`; the response charset from the
//!   response's `Content-Type`, falling back to the request default.
//! - The network sits behind the `Transport` trait. `UreqTransport` is the
//!   default; tests script their own.
//! - Failures are `Error::Request` (no usable response) or
//!   `Error::Response` (the server answered with a failure).

pub mod charset;
pub mod config;
pub mod cookies;
pub mod decode;
pub mod encode;
pub mod error;
pub mod executor;
pub mod headers;
pub mod http;
pub mod request;
pub mod response;
pub mod template;
pub mod transport;

pub use config::ExecutorConfig;
pub use cookies::{Cookie, CookieJar, CookieJarHandle, DefaultCookieJar};
pub use decode::{BytesDecoder, FnDecoder, JsonDecoder, ResponseDecoder, TextDecoder};
pub use error::{DecodeError, Error, RequestError, ResponseError, Result, TransportError};
pub use executor::Executor;
pub use headers::{content_type, Headers, MultiMap, Params};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Proxy, Transport};
pub use request::{Body, MultipleLocations, Request, RequestParts};
pub use response::Response;
pub use template::RequestTemplate;
pub use transport::UreqTransport;
