//! Requests built from loosely structured text, e.g. a form or a stored
//! JSON document.
//!
//! Headers and params are newline-delimited `name: value` lines. A line
//! without a colon becomes a value with an empty name. Params are only read
//! when a body is present too, in which case they replace it; otherwise the
//! body is sent as-is. Template requests always follow redirects themselves.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::decode::TextDecoder;
use crate::error::RequestError;
use crate::http::HttpMethod;
use crate::request::Request;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestTemplate {
    pub url: String,
    pub method: Option<String>,
    pub headers: Option<String>,
    pub params: Option<String>,
    pub body: Option<String>,
    /// Milliseconds.
    pub connection_timeout: Option<u64>,
    /// Milliseconds.
    pub read_timeout: Option<u64>,
}

impl RequestTemplate {
    pub fn into_request(self) -> Result<Request, RequestError> {
        self.into_request_with(TextDecoder)
    }

    pub fn into_request_with<D>(self, decoder: D) -> Result<Request<D>, RequestError> {
        let mut request = Request::with_decoder(&self.url, decoder)?.redirect_any(true);
        if let Some(method) = self.method.as_deref().filter(|m| !m.trim().is_empty()) {
            let method = HttpMethod::from_str(method).unwrap_or_else(|never| match never {});
            request = request.method(method);
        }
        if let Some(ms) = self.connection_timeout {
            request = request.connect_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.read_timeout {
            request = request.read_timeout(Duration::from_millis(ms));
        }

        let body = self.body.filter(|b| !b.is_empty());
        let params = self.params.filter(|p| !p.is_empty());
        request = match (body, params) {
            (Some(_), Some(params)) => request.params(lines(&params)),
            (Some(body), None) => request.body(body),
            (None, _) => request,
        };
        if let Some(headers) = &self.headers {
            request = request.headers(lines(headers));
        }
        Ok(request)
    }
}

/// Split non-blank lines into `(name, value)` on the first colon.
fn lines(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.split_once(':') {
            Some((name, value)) => (name.trim().to_string(), value.trim().to_string()),
            None => (String::new(), line.to_string()),
        })
        .collect()
}
