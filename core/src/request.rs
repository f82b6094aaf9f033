//! Request descriptor and its builder API.
//!
//! # Design
//! `Request<D>` is a value built through chained by-value setters. Execution
//! only ever reads it: redirects derive a fresh descriptor with
//! `Request::redirected`, so one descriptor can be sent many times, from
//! several threads at once.
//!
//! Everything except the decoder lives in `RequestParts`, which is what
//! errors carry back for diagnostics.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use encoding_rs::Encoding;
use url::Url;

use crate::cookies::CookieJarHandle;
use crate::decode::{ResponseDecoder, TextDecoder};
use crate::error::{RequestError, Result};
use crate::executor::Executor;
use crate::headers::{self, Headers, Params};
use crate::http::{HttpMethod, Proxy, Transport};
use crate::response::Response;

/// Raw request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Text, encoded with the outgoing charset when sent.
    Text(String),
    /// Bytes, sent as-is.
    Bytes(Vec<u8>),
}

/// What to do with a redirect response carrying several `Location` values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MultipleLocations {
    /// Fail with a response error.
    #[default]
    Reject,
    /// Join the values with `,` and follow the result.
    Join,
}

/// Everything that determines one execution attempt, except the decoder.
#[derive(Clone)]
pub struct RequestParts {
    pub(crate) url: Url,
    pub(crate) raw_query: Option<String>,
    pub(crate) method: Option<HttpMethod>,
    pub(crate) headers: Headers,
    pub(crate) params: Params,
    pub(crate) body: Option<Body>,
    pub(crate) connect_timeout: Option<Duration>,
    pub(crate) read_timeout: Option<Duration>,
    pub(crate) redirect_any: bool,
    pub(crate) uri_charset: &'static Encoding,
    pub(crate) charset: &'static Encoding,
    pub(crate) cookie_jar: Option<CookieJarHandle>,
    pub(crate) proxy: Option<Proxy>,
    pub(crate) multiple_locations: MultipleLocations,
}

impl RequestParts {
    fn new(url: Url, raw_query: Option<String>) -> Self {
        Self {
            url,
            raw_query,
            method: None,
            headers: Headers::new(),
            params: Params::new(),
            body: None,
            connect_timeout: None,
            read_timeout: None,
            redirect_any: false,
            uri_charset: encoding_rs::UTF_8,
            charset: encoding_rs::UTF_8,
            cookie_jar: None,
            proxy: None,
            multiple_locations: MultipleLocations::default(),
        }
    }

    /// Copy of these parts pointed at `url`.
    fn redirected(&self, url: Url, raw_query: Option<String>) -> Self {
        Self {
            url,
            raw_query,
            ..self.clone()
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Query text exactly as the caller wrote it, before any escaping.
    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    pub fn method(&self) -> Option<&HttpMethod> {
        self.method.as_ref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub fn is_redirect_any(&self) -> bool {
        self.redirect_any
    }

    pub fn uri_charset(&self) -> &'static Encoding {
        self.uri_charset
    }

    pub fn charset(&self) -> &'static Encoding {
        self.charset
    }

    pub fn cookie_jar(&self) -> Option<&CookieJarHandle> {
        self.cookie_jar.as_ref()
    }

    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    pub fn multiple_locations(&self) -> MultipleLocations {
        self.multiple_locations
    }
}

impl fmt::Debug for RequestParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestParts")
            .field("url", &self.url.as_str())
            .field("raw_query", &self.raw_query)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("params", &self.params)
            .field("body", &self.body)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("redirect_any", &self.redirect_any)
            .field("uri_charset", &self.uri_charset.name())
            .field("charset", &self.charset.name())
            .field("cookie_jar", &self.cookie_jar.is_some())
            .field("proxy", &self.proxy)
            .field("multiple_locations", &self.multiple_locations)
            .finish()
    }
}

/// A configurable HTTP request whose response body is produced by `D`.
pub struct Request<D = TextDecoder> {
    parts: RequestParts,
    decoder: Arc<D>,
}

impl<D> Clone for Request<D> {
    fn clone(&self) -> Self {
        Self {
            parts: self.parts.clone(),
            decoder: Arc::clone(&self.decoder),
        }
    }
}

impl<D> fmt::Debug for Request<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request").field("parts", &self.parts).finish_non_exhaustive()
    }
}

impl Request<TextDecoder> {
    /// Request for `url` whose body is read as text.
    pub fn new(url: &str) -> Result<Self, RequestError> {
        Self::with_decoder(url, TextDecoder)
    }
}

impl<D> Request<D> {
    /// Request for `url` whose body is decoded by `decoder`.
    ///
    /// Fails immediately if `url` is not an absolute URL with a host.
    pub fn with_decoder(url: &str, decoder: D) -> Result<Self, RequestError> {
        let parsed = parse_url(url)?;
        Ok(Self {
            parts: RequestParts::new(parsed, raw_query(url).map(str::to_owned)),
            decoder: Arc::new(decoder),
        })
    }

    /// Copy of `request` targeting `location`; every other field is kept.
    ///
    /// A relative `location` resolves against the URL of `request`. The
    /// query is taken from `location` as written; a reference without one
    /// keeps the query of `request` only when the URL rules inherit it.
    pub fn redirected(location: &str, request: &Request<D>) -> Result<Self, RequestError> {
        let location = location.trim();
        let url = request.parts.url.join(location).map_err(|e| {
            RequestError::new(location, e.to_string())
                .with_request(&request.parts)
                .with_source(e)
        })?;
        if !url.has_host() {
            return Err(RequestError::new(location, "not an absolute URL with a host")
                .with_request(&request.parts));
        }
        let query = match raw_query(location) {
            Some(query) => Some(query.to_owned()),
            None if url.query().is_some() => request.parts.raw_query.clone(),
            None => None,
        };
        Ok(Self {
            parts: request.parts.redirected(url, query),
            decoder: Arc::clone(&request.decoder),
        })
    }

    pub fn parts(&self) -> &RequestParts {
        &self.parts
    }

    pub fn url(&self) -> &Url {
        &self.parts.url
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Swap the decoder, keeping the rest of the request.
    pub fn decoder_into<E>(self, decoder: E) -> Request<E> {
        Request {
            parts: self.parts,
            decoder: Arc::new(decoder),
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.parts.method = Some(method);
        self
    }

    /// Add a header value. Singular headers such as `Content-Type` replace
    /// their existing value instead of gaining a second one.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        if headers::is_singular(&name) {
            self.parts.headers.set(name, value.into());
        } else {
            self.parts.headers.append(name, value.into());
        }
        self
    }

    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(self, |request, (name, value)| request.header(name, value))
    }

    /// Add a parameter value. Values under one name keep insertion order.
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.parts.params.append(name, value.to_string());
        self
    }

    /// Add a parameter value if present; `None` is ignored.
    pub fn param_opt<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    pub fn params<I, K, V>(self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        params
            .into_iter()
            .fold(self, |request, (name, value)| request.param(name, value))
    }

    /// Raw text body. Takes precedence over params for non-GET methods.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.parts.body = Some(Body::Text(body.into()));
        self
    }

    /// Raw binary body. Takes precedence over params for non-GET methods.
    pub fn body_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.parts.body = Some(Body::Bytes(body.into()));
        self
    }

    /// Connect timeout. `Duration::ZERO` clears it so the default applies.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.parts.connect_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Read timeout, likewise cleared by `Duration::ZERO`.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.parts.read_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Charset for the GET query string when the headers name none.
    pub fn uri_charset(mut self, charset: &'static Encoding) -> Self {
        self.parts.uri_charset = charset;
        self
    }

    /// Default charset for bodies and responses without a charset directive.
    pub fn charset(mut self, charset: &'static Encoding) -> Self {
        self.parts.charset = charset;
        self
    }

    pub fn cookie_jar(mut self, jar: CookieJarHandle) -> Self {
        self.parts.cookie_jar = Some(jar);
        self
    }

    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.parts.proxy = Some(proxy);
        self
    }

    /// Follow 301/302 in the executor, keeping the original method and
    /// body, instead of leaving redirects to the transport.
    pub fn redirect_any(mut self, redirect_any: bool) -> Self {
        self.parts.redirect_any = redirect_any;
        self
    }

    pub fn multiple_locations(mut self, policy: MultipleLocations) -> Self {
        self.parts.multiple_locations = policy;
        self
    }
}

impl<D: ResponseDecoder> Request<D> {
    /// Execute with the default executor and transport.
    pub fn send(&self) -> Result<Response<D::Output>> {
        Executor::default().execute(self)
    }

    /// Execute over `transport` with default timeouts.
    pub fn send_with<T: Transport>(&self, transport: T) -> Result<Response<D::Output>> {
        Executor::new(transport).execute(self)
    }

    /// Set `method` and execute.
    pub fn go(self, method: HttpMethod) -> Result<Response<D::Output>> {
        self.method(method).send()
    }

    pub fn get(self) -> Result<Response<D::Output>> {
        self.go(HttpMethod::Get)
    }

    pub fn post(self) -> Result<Response<D::Output>> {
        self.go(HttpMethod::Post)
    }

    pub fn put(self) -> Result<Response<D::Output>> {
        self.go(HttpMethod::Put)
    }

    pub fn delete(self) -> Result<Response<D::Output>> {
        self.go(HttpMethod::Delete)
    }
}

fn parse_url(text: &str) -> Result<Url, RequestError> {
    let url = Url::parse(text.trim()).map_err(|e| RequestError::new(text, e.to_string()).with_source(e))?;
    if !url.has_host() {
        return Err(RequestError::new(text, "not an absolute URL with a host"));
    }
    Ok(url)
}

/// Query of a URL reference as written: after the first `?`, up to `#`.
fn raw_query(reference: &str) -> Option<&str> {
    let reference = reference.trim();
    let reference = reference.split_once('#').map_or(reference, |(head, _)| head);
    reference.split_once('?').map(|(_, query)| query)
}
