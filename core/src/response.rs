//! Response envelope returned by the executor and embedded in
//! `ResponseError`.

use url::Url;

use crate::headers::Headers;

/// One completed exchange: effective URL, status line, headers, and the
/// decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    url: Url,
    status: u16,
    headers: Headers,
    message: String,
    body: T,
}

impl<T> Response<T> {
    pub fn new(url: Url, status: u16, headers: Headers, message: String, body: T) -> Self {
        Self {
            url,
            status,
            headers,
            message,
            body,
        }
    }

    /// URL that actually produced this response, after any redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// First value of header `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.first(name).map(String::as_str)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn body(&self) -> &T {
        &self.body
    }

    pub fn into_body(self) -> T {
        self.body
    }
}
