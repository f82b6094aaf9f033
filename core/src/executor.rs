//! Request execution.
//!
//! # Design
//! Each attempt runs build → dispatch → classify. Building resolves the
//! outgoing charset from the request's own `Content-Type`, merges stored
//! cookies into the `Cookie` header and encodes the URL and body. Only GET
//! carries params in the query; every other method sends them as a form
//! body unless a raw body is set.
//!
//! Classification:
//! - `status <= 300` decodes the body with the request's decoder.
//! - 301/302 on a `redirect_any` request derives a new descriptor for the
//!   `Location` with `Request::redirected` and loops. The original method
//!   and body are kept.
//! - anything else reads the body as text and fails with `ResponseError`.
//!
//! Redirects are an explicit loop, not recursion. Every target is recorded
//! in a set scoped to one `execute` call; meeting a target twice ends the
//! call with "too many redirects".

use std::borrow::Cow;
use std::collections::HashSet;

use tracing::{debug, trace, warn};
use url::Url;

use crate::charset;
use crate::config::ExecutorConfig;
use crate::decode::{read_text, ResponseDecoder};
use crate::encode;
use crate::error::{Error, RequestError, ResponseError, Result, TransportError};
use crate::headers::{content_type, Headers, CONTENT_TYPE, COOKIE, LOCATION};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::request::{MultipleLocations, Request, RequestParts};
use crate::response::Response;
use crate::transport::UreqTransport;

pub const REDIRECT_WITHOUT_LOCATION: &str = "redirect without location";
pub const REDIRECT_WITH_MULTIPLE_LOCATIONS: &str = "redirect with multiple locations";
pub const TOO_MANY_REDIRECTS: &str = "too many redirects";

enum Step<D: ResponseDecoder> {
    Done(Response<D::Output>),
    Redirect(Request<D>),
}

/// Runs requests over a transport.
#[derive(Debug, Clone)]
pub struct Executor<T = UreqTransport> {
    transport: T,
    config: ExecutorConfig,
}

impl Default for Executor<UreqTransport> {
    fn default() -> Self {
        Self::from_config(ExecutorConfig::default())
    }
}

impl Executor<UreqTransport> {
    /// Executor over a ureq transport capped by `config.max_redirects`.
    pub fn from_config(config: ExecutorConfig) -> Self {
        Self::with_config(UreqTransport::new(config.max_redirects), config)
    }
}

impl<T: Transport> Executor<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ExecutorConfig::default())
    }

    pub fn with_config(transport: T, config: ExecutorConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute `request`, following redirects if it asks for it.
    pub fn execute<D: ResponseDecoder>(&self, request: &Request<D>) -> Result<Response<D::Output>> {
        let mut visited = HashSet::new();
        let mut current = Cow::Borrowed(request);
        loop {
            match self.attempt(&current, &mut visited)? {
                Step::Done(response) => return Ok(response),
                Step::Redirect(next) => {
                    debug!(from = %current.url(), to = %next.url(), "following redirect");
                    current = Cow::Owned(next);
                }
            }
        }
    }

    fn attempt<D: ResponseDecoder>(
        &self,
        request: &Request<D>,
        visited: &mut HashSet<String>,
    ) -> Result<Step<D>> {
        let parts = request.parts();
        let wire = self.build(parts)?;
        debug!(method = %wire.method, url = %wire.url, "dispatching request");
        let response = self
            .transport
            .send(&wire)
            .map_err(|e| transport_error(parts, e))?;

        store_cookies(parts, &response.headers);
        let charset = charset::resolve(&response.headers, parts.charset);
        let HttpResponse {
            url,
            status,
            message,
            headers,
            mut body,
            error_body,
        } = response;
        trace!(status, url = %url, charset = charset.name(), "response received");

        if status <= 300 {
            let decoded = request.decoder().decode(body.as_mut(), charset).map_err(|e| {
                RequestError::new(url.as_str(), e.to_string())
                    .with_request(parts)
                    .with_source(e)
            })?;
            return Ok(Step::Done(Response::new(url, status, headers, message, decoded)));
        }

        if parts.redirect_any && matches!(status, 301 | 302) {
            return redirect_target(request, url, status, headers, visited).map(Step::Redirect);
        }

        let mut stream = error_body.unwrap_or(body);
        let text = read_text(stream.as_mut(), charset).map_err(|e| {
            RequestError::new(url.as_str(), e.to_string())
                .with_request(parts)
                .with_source(e)
        })?;
        debug!(status, url = %url, "request failed");
        Err(ResponseError::new(Response::new(url, status, headers, message, text)).into())
    }

    /// Lower `parts` into a wire request.
    fn build(&self, parts: &RequestParts) -> Result<HttpRequest, RequestError> {
        let method = parts.method.clone().ok_or_else(|| {
            RequestError::new(parts.url.as_str(), "request method not set").with_request(parts)
        })?;
        let declared = charset::find_charset(&parts.headers);
        let charset = declared.unwrap_or(parts.charset);
        let mut headers = merge_cookies(parts);
        let get = method.is_get();

        let (url, body) = if get {
            let query_charset = declared.unwrap_or(parts.uri_charset);
            let url = encode::encode_url(
                &parts.url,
                parts.raw_query(),
                Some(&parts.params),
                query_charset,
            );
            (url, None)
        } else {
            let body = match &parts.body {
                Some(raw) => encode::raw_body(raw, charset),
                None => {
                    let form = encode::form_body(&parts.params, charset);
                    if !form.is_empty() && !headers.contains(CONTENT_TYPE) {
                        headers.set(CONTENT_TYPE, content_type::FORM.to_string());
                    }
                    (!form.is_empty()).then_some(form)
                }
            };
            (encode::encode_url(&parts.url, parts.raw_query(), None, charset), body)
        };

        Ok(HttpRequest {
            method,
            url,
            headers: encode::header_lines(&headers),
            body,
            connect_timeout: parts
                .connect_timeout
                .unwrap_or_else(|| self.config.connect_timeout()),
            read_timeout: parts
                .read_timeout
                .unwrap_or_else(|| self.config.read_timeout(get)),
            proxy: parts.proxy.clone(),
            follow_redirects: !parts.redirect_any,
        })
    }
}

/// Request headers with stored cookies folded into one `Cookie` header.
///
/// Pairs already on the request win over stored ones with the same name.
fn merge_cookies(parts: &RequestParts) -> Headers {
    let mut headers = parts.headers.clone();
    let Some(jar) = &parts.cookie_jar else {
        return headers;
    };
    let stored = match jar.read() {
        Ok(jar) => jar.request_cookies(&parts.url),
        Err(_) => {
            warn!("cookie jar lock poisoned, sending without stored cookies");
            return headers;
        }
    };
    if stored.is_empty() {
        debug!(url = %parts.url, "no stored cookies");
        return headers;
    }

    let mut merged = Headers::new();
    for (name, value) in stored {
        merged.set(name, value);
    }
    for value in headers.get(COOKIE).unwrap_or_default() {
        for pair in value.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    merged.set(name, value.trim().to_string());
                }
            }
        }
    }
    let cookies = merged
        .pairs()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    headers.replace_all(COOKIE, cookies);
    headers
}

fn store_cookies(parts: &RequestParts, headers: &Headers) {
    let Some(jar) = &parts.cookie_jar else {
        return;
    };
    match jar.write() {
        Ok(mut jar) => jar.store_response_cookies(&parts.url, headers),
        Err(_) => warn!("cookie jar lock poisoned, response cookies dropped"),
    }
}

/// Descriptor for the `Location` of a redirect response, recorded as
/// visited.
fn redirect_target<D>(
    request: &Request<D>,
    url: Url,
    status: u16,
    headers: Headers,
    visited: &mut HashSet<String>,
) -> Result<Request<D>> {
    let location = match headers.get(LOCATION) {
        None | Some([]) => None,
        Some([single]) => Some(single.clone()),
        Some(values) => match request.parts().multiple_locations {
            MultipleLocations::Join => Some(values.join(",")),
            MultipleLocations::Reject => {
                return Err(redirect_error(url, status, headers, REDIRECT_WITH_MULTIPLE_LOCATIONS))
            }
        },
    };
    let Some(location) = location else {
        return Err(redirect_error(url, status, headers, REDIRECT_WITHOUT_LOCATION));
    };

    let next = Request::redirected(&location, request)?;
    if !visited.insert(next.url().to_string()) {
        warn!(location = %next.url(), "redirect loop detected");
        return Err(redirect_error(url, status, headers, TOO_MANY_REDIRECTS));
    }
    Ok(next)
}

fn redirect_error(url: Url, status: u16, headers: Headers, message: &str) -> Error {
    ResponseError::new(Response::new(url, status, headers, message.to_string(), String::new())).into()
}

fn transport_error(parts: &RequestParts, err: TransportError) -> RequestError {
    RequestError::new(parts.url.as_str(), err.to_string())
        .with_request(parts)
        .with_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex, RwLock};
    use std::time::Duration;

    use crate::cookies::{CookieJar, DefaultCookieJar};
    use crate::decode::JsonDecoder;
    use crate::encode::encode_component;
    use crate::http::{HttpMethod, Proxy};

    struct Reply {
        status: u16,
        headers: Vec<(&'static str, String)>,
        body: Vec<u8>,
    }

    fn reply(status: u16, body: &str) -> Reply {
        Reply {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    fn redirect(status: u16, location: &str) -> Reply {
        Reply {
            status,
            headers: vec![("Location", location.to_string())],
            body: Vec::new(),
        }
    }

    /// Answers requests from a fixed script and records what was sent.
    #[derive(Default)]
    struct Scripted {
        replies: Mutex<VecDeque<Reply>>,
        sent: Mutex<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                sent: Mutex::default(),
            }
        }

        fn sent(&self) -> Vec<HttpRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Transport for Scripted {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.sent.lock().unwrap().push(request.clone());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| TransportError::Other("no reply scripted".into()))?;
            Ok(HttpResponse {
                url: request.url.clone(),
                status: reply.status,
                message: format!("status {}", reply.status),
                headers: reply.headers.into_iter().collect(),
                body: Box::new(Cursor::new(reply.body)),
                error_body: None,
            })
        }
    }

    struct Unreachable;

    impl Transport for Unreachable {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::UnknownHost(
                request.url.host_str().unwrap_or_default().to_string(),
            ))
        }
    }

    fn string_request(method: HttpMethod) -> Request {
        Request::new("http://127.0.0.1:8080/string?param=param")
            .unwrap()
            .method(method)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded; charset=ms950")
            .param("body", "身體")
    }

    fn header<'a>(wire: &'a HttpRequest, name: &str) -> Option<&'a str> {
        wire.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn get_carries_params_in_query_encoded_with_declared_charset() {
        let transport = Scripted::new(vec![reply(200, "param身體")]);
        let response = string_request(HttpMethod::Get).send_with(&transport).unwrap();
        assert_eq!(response.body(), "param身體");

        let sent = transport.sent();
        let expected = format!("param=param&body={}", encode_component("身體", encoding_rs::BIG5));
        assert_eq!(sent[0].url.query(), Some(expected.as_str()));
        assert!(sent[0].body.is_none());
    }

    #[test]
    fn get_without_declared_charset_uses_uri_charset() {
        let transport = Scripted::new(vec![reply(200, "")]);
        Request::new("http://h/s")
            .unwrap()
            .method(HttpMethod::Get)
            .param("body", "身體")
            .uri_charset(encoding_rs::BIG5)
            .charset(encoding_rs::UTF_8)
            .send_with(&transport)
            .unwrap();
        let expected = format!("body={}", encode_component("身體", encoding_rs::BIG5));
        assert_eq!(transport.sent()[0].url.query(), Some(expected.as_str()));
    }

    #[test]
    fn query_written_by_caller_is_encoded_once() {
        let transport = Scripted::new(vec![reply(200, ""), reply(200, "")]);
        let request = Request::new("http://h/s?q=a b&name=身")
            .unwrap()
            .method(HttpMethod::Get);
        request.send_with(&transport).unwrap();
        request
            .header(CONTENT_TYPE, "text/plain; charset=ms950")
            .send_with(&transport)
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].url.query(), Some("q=a+b&name=%E8%BA%AB"));
        let big5 = format!("q=a+b&name={}", encode_component("身", encoding_rs::BIG5));
        assert_eq!(sent[1].url.query(), Some(big5.as_str()));
    }

    #[test]
    fn redirect_location_query_is_encoded_once() {
        let transport = Scripted::new(vec![redirect(302, "/next?q=a b&name=身"), reply(200, "")]);
        Request::new("http://h/a")
            .unwrap()
            .method(HttpMethod::Get)
            .redirect_any(true)
            .send_with(&transport)
            .unwrap();
        let sent = transport.sent();
        assert_eq!(sent[1].url.path(), "/next");
        assert_eq!(sent[1].url.query(), Some("q=a+b&name=%E8%BA%AB"));
    }

    #[test]
    fn post_sends_params_as_form_body_and_keeps_query() {
        let transport = Scripted::new(vec![reply(200, "ok")]);
        string_request(HttpMethod::Post).send_with(&transport).unwrap();

        let sent = transport.sent();
        let sent = &sent[0];
        assert_eq!(sent.url.query(), Some("param=param"));
        let expected = format!("body={}", encode_component("身體", encoding_rs::BIG5));
        assert_eq!(sent.body.as_deref(), Some(expected.as_bytes()));
        assert_eq!(
            header(sent, "content-type"),
            Some("application/x-www-form-urlencoded; charset=ms950")
        );
    }

    #[test]
    fn form_body_without_content_type_gets_form_header() {
        let transport = Scripted::new(vec![reply(200, "")]);
        Request::new("http://h/s")
            .unwrap()
            .method(HttpMethod::Put)
            .param("a", 1)
            .send_with(&transport)
            .unwrap();
        let sent = transport.sent();
        let sent = &sent[0];
        assert_eq!(header(sent, "Content-Type"), Some(content_type::FORM));
        assert_eq!(sent.body.as_deref(), Some(b"a=1".as_slice()));
    }

    #[test]
    fn raw_body_wins_over_params() {
        let transport = Scripted::new(vec![reply(200, "")]);
        Request::new("http://h/json")
            .unwrap()
            .method(HttpMethod::Post)
            .header(CONTENT_TYPE, content_type::JSON)
            .param("ignored", "x")
            .body(r#"{"time":1}"#)
            .send_with(&transport)
            .unwrap();
        let sent = transport.sent();
        let sent = &sent[0];
        assert_eq!(sent.body.as_deref(), Some(br#"{"time":1}"#.as_slice()));
        assert_eq!(sent.url.query(), None);
    }

    #[test]
    fn timeouts_default_by_method() {
        let transport = Scripted::new(vec![reply(200, ""), reply(200, ""), reply(200, "")]);
        let base = Request::new("http://h/").unwrap();
        base.clone().method(HttpMethod::Get).send_with(&transport).unwrap();
        base.clone().method(HttpMethod::Delete).send_with(&transport).unwrap();
        base.method(HttpMethod::Get)
            .connect_timeout(Duration::from_millis(5))
            .read_timeout(Duration::from_millis(7))
            .send_with(&transport)
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].connect_timeout, Duration::from_millis(60_000));
        assert_eq!(sent[0].read_timeout, Duration::from_millis(360_000));
        assert_eq!(sent[1].read_timeout, Duration::from_millis(3_600_000));
        assert_eq!(sent[2].connect_timeout, Duration::from_millis(5));
        assert_eq!(sent[2].read_timeout, Duration::from_millis(7));
    }

    #[test]
    fn zero_timeouts_use_defaults() {
        let transport = Scripted::new(vec![reply(200, "")]);
        Request::new("http://h/")
            .unwrap()
            .method(HttpMethod::Get)
            .connect_timeout(Duration::ZERO)
            .read_timeout(Duration::ZERO)
            .send_with(&transport)
            .unwrap();
        let sent = transport.sent();
        assert_eq!(sent[0].connect_timeout, Duration::from_millis(60_000));
        assert_eq!(sent[0].read_timeout, Duration::from_millis(360_000));
    }

    #[test]
    fn config_overrides_default_timeouts() {
        let transport = Scripted::new(vec![reply(200, "")]);
        let config = ExecutorConfig {
            connect_timeout_ms: 1,
            get_read_timeout_ms: 2,
            other_read_timeout_ms: 3,
            ..ExecutorConfig::default()
        };
        let request = Request::new("http://h/").unwrap().method(HttpMethod::Post);
        Executor::with_config(&transport, config).execute(&request).unwrap();
        assert_eq!(transport.sent()[0].read_timeout, Duration::from_millis(3));
    }

    #[test]
    fn response_charset_directive_drives_decoding() {
        let body = charset::encode_text("身體", encoding_rs::BIG5).into_owned();
        let transport = Scripted::new(vec![Reply {
            status: 200,
            headers: vec![("content-type", "text/plain; charset=Big5".to_string())],
            body,
        }]);
        let response = Request::new("http://h/")
            .unwrap()
            .method(HttpMethod::Get)
            .send_with(&transport)
            .unwrap();
        assert_eq!(response.body(), "身體");
    }

    #[test]
    fn status_300_is_success() {
        let transport = Scripted::new(vec![reply(300, "choices")]);
        let response = Request::new("http://h/")
            .unwrap()
            .method(HttpMethod::Get)
            .send_with(&transport)
            .unwrap();
        assert_eq!(response.status(), 300);
    }

    #[test]
    fn error_status_carries_text_body() {
        let transport = Scripted::new(vec![reply(404, "no such page")]);
        let err = Request::with_decoder("http://h/json", JsonDecoder::<serde_json::Value>::new())
            .unwrap()
            .method(HttpMethod::Post)
            .redirect_any(true)
            .body("{}")
            .send_with(&transport)
            .unwrap_err();
        let response = err.response().expect("response error");
        assert_eq!(response.status(), 404);
        assert_eq!(response.body(), "no such page");
        assert_eq!(response.message(), "status 404");
    }

    #[test]
    fn redirect_is_an_error_without_redirect_any() {
        let transport = Scripted::new(vec![redirect(302, "http://h/b")]);
        let err = Request::new("http://h/a")
            .unwrap()
            .method(HttpMethod::Get)
            .send_with(&transport)
            .unwrap_err();
        assert_eq!(err.response().map(Response::status), Some(302));
        assert!(transport.sent()[0].follow_redirects);
    }

    #[test]
    fn redirect_chain_ends_at_final_url_with_method_kept() {
        let transport = Scripted::new(vec![
            redirect(302, "http://h/b"),
            redirect(301, "/c"),
            reply(200, "done"),
        ]);
        let response = Request::new("http://h/a")
            .unwrap()
            .method(HttpMethod::Post)
            .body("payload")
            .redirect_any(true)
            .send_with(&transport)
            .unwrap();

        assert_eq!(response.url().as_str(), "http://h/c");
        assert_eq!(response.body(), "done");
        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        for wire in &sent {
            assert_eq!(wire.method, HttpMethod::Post);
            assert_eq!(wire.body.as_deref(), Some(b"payload".as_slice()));
            assert!(!wire.follow_redirects);
        }
    }

    #[test]
    fn revisited_location_is_a_loop() {
        let transport = Scripted::new(vec![
            redirect(302, "http://h/b"),
            redirect(302, "http://h/a"),
            redirect(302, "http://h/b"),
        ]);
        let err = Request::new("http://h/a")
            .unwrap()
            .method(HttpMethod::Get)
            .redirect_any(true)
            .send_with(&transport)
            .unwrap_err();
        assert_eq!(err.response().map(Response::message), Some(TOO_MANY_REDIRECTS));
        assert_eq!(transport.sent().len(), 3);
    }

    #[test]
    fn redirect_without_location_fails_immediately() {
        let transport = Scripted::new(vec![reply(302, "")]);
        let err = Request::new("http://h/a")
            .unwrap()
            .method(HttpMethod::Get)
            .redirect_any(true)
            .send_with(&transport)
            .unwrap_err();
        assert_eq!(
            err.response().map(Response::message),
            Some(REDIRECT_WITHOUT_LOCATION)
        );
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn multiple_locations_follow_policy() {
        let two = || Reply {
            status: 302,
            headers: vec![("Location", "/x".to_string()), ("location", "y".to_string())],
            body: Vec::new(),
        };
        let request = Request::new("http://h/a")
            .unwrap()
            .method(HttpMethod::Get)
            .redirect_any(true);

        let transport = Scripted::new(vec![two()]);
        let err = request.send_with(&transport).unwrap_err();
        assert_eq!(
            err.response().map(Response::message),
            Some(REDIRECT_WITH_MULTIPLE_LOCATIONS)
        );

        let transport = Scripted::new(vec![two(), reply(200, "")]);
        let response = request
            .multiple_locations(MultipleLocations::Join)
            .send_with(&transport)
            .unwrap();
        assert_eq!(response.url().as_str(), "http://h/x,y");
    }

    #[test]
    fn stored_cookies_merge_with_request_cookies() {
        let url = Url::parse("http://h/").unwrap();
        let jar = Arc::new(RwLock::new(DefaultCookieJar::new()));
        jar.write().unwrap().store_response_cookies(
            &url,
            &[("Set-Cookie", "a=1".to_string()), ("Set-Cookie", "b=2".to_string())]
                .into_iter()
                .collect(),
        );

        let transport = Scripted::new(vec![reply(200, "")]);
        Request::new("http://h/")
            .unwrap()
            .method(HttpMethod::Get)
            .header(COOKIE, "B=override; c=3")
            .cookie_jar(jar.clone())
            .send_with(&transport)
            .unwrap();
        assert_eq!(
            header(&transport.sent()[0], COOKIE),
            Some("a=1; b=override; c=3")
        );
    }

    #[test]
    fn cookie_header_untouched_without_stored_cookies() {
        let transport = Scripted::new(vec![reply(200, "")]);
        Request::new("http://h/")
            .unwrap()
            .method(HttpMethod::Get)
            .header(COOKIE, "x=1")
            .cookie_jar(DefaultCookieJar::handle())
            .send_with(&transport)
            .unwrap();
        assert_eq!(header(&transport.sent()[0], COOKIE), Some("x=1"));
    }

    #[test]
    fn response_cookies_are_stored_even_on_failure() {
        let jar = Arc::new(RwLock::new(DefaultCookieJar::new()));
        let transport = Scripted::new(vec![Reply {
            status: 500,
            headers: vec![("Set-Cookie", "session=s1".to_string())],
            body: b"boom".to_vec(),
        }]);
        let result = Request::new("http://h/")
            .unwrap()
            .method(HttpMethod::Get)
            .cookie_jar(jar.clone())
            .send_with(&transport);
        assert!(result.is_err());
        let stored = jar
            .read()
            .unwrap()
            .request_cookies(&Url::parse("http://h/").unwrap());
        assert_eq!(stored, vec![("session".to_string(), "s1".to_string())]);
    }

    #[test]
    fn missing_method_is_a_request_error() {
        let transport = Scripted::default();
        let err = Request::new("http://h/").unwrap().send_with(&transport).unwrap_err();
        assert!(matches!(err, Error::Request(_)));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn transport_fault_is_a_request_error_with_descriptor() {
        let err = Request::new("http://nowhere.invalid/x")
            .unwrap()
            .method(HttpMethod::Get)
            .send_with(Unreachable)
            .unwrap_err();
        let Error::Request(err) = err else {
            panic!("expected request error");
        };
        assert_eq!(err.url(), "http://nowhere.invalid/x");
        assert_eq!(err.message(), "unknown host nowhere.invalid");
        assert_eq!(
            err.request().and_then(|r| r.method()),
            Some(&HttpMethod::Get)
        );
    }

    #[test]
    fn malformed_proxy_is_a_request_error() {
        let err = Request::new("http://127.0.0.1:1/x")
            .unwrap()
            .method(HttpMethod::Get)
            .proxy(Proxy::new("http://bad proxy:3128"))
            .send_with(UreqTransport::default())
            .unwrap_err();
        let Error::Request(err) = err else {
            panic!("expected request error");
        };
        assert_eq!(err.url(), "http://127.0.0.1:1/x");
        assert!(err.message().starts_with("invalid proxy http://bad proxy:3128"));
        assert!(err.request().and_then(|r| r.proxy()).is_some());
    }

    #[test]
    fn malformed_location_is_a_request_error() {
        let transport = Scripted::new(vec![redirect(302, "http://")]);
        let err = Request::new("http://h/a")
            .unwrap()
            .method(HttpMethod::Get)
            .redirect_any(true)
            .send_with(&transport)
            .unwrap_err();
        let Error::Request(err) = err else {
            panic!("expected request error");
        };
        assert_eq!(err.url(), "http://");
        assert_eq!(err.request().map(|r| r.url().as_str()), Some("http://h/a"));
    }

    #[test]
    fn decode_failure_is_a_request_error() {
        let transport = Scripted::new(vec![reply(200, "not json")]);
        let err = Request::with_decoder("http://h/", JsonDecoder::<serde_json::Value>::new())
            .unwrap()
            .method(HttpMethod::Get)
            .send_with(&transport)
            .unwrap_err();
        assert!(matches!(err, Error::Request(_)));
    }

    #[test]
    fn descriptor_is_reusable() {
        let transport = Scripted::new(vec![redirect(302, "/b"), reply(200, "1"), redirect(302, "/b"), reply(200, "2")]);
        let request = Request::new("http://h/a")
            .unwrap()
            .method(HttpMethod::Get)
            .redirect_any(true);
        assert_eq!(request.send_with(&transport).unwrap().into_body(), "1");
        assert_eq!(request.send_with(&transport).unwrap().into_body(), "2");
        assert_eq!(request.url().as_str(), "http://h/a");
    }
}
