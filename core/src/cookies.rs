//! Cookie jar abstraction and a simple in-memory implementation.
//!
//! A request may carry a [`CookieJarHandle`]. Before dispatch the executor
//! asks the jar for cookies matching the URL; after every response,
//! successful or not, it hands the response headers back so `Set-Cookie`
//! values are remembered for later requests.
//!
//! ## Notes & limitations
//! - Cookies are bucketed by **origin** (`url.origin().ascii_serialization()`),
//!   then filtered by `Domain`, `Path` and `Secure`.
//! - `Expires` is stored but not enforced. `Max-Age=0` (or negative)
//!   deletes the cookie.
//! - Jars are not internally synchronized; share them through the handle.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use url::Url;

use crate::headers::{Headers, SET_COOKIE};

/// A shared, lockable cookie jar.
pub type CookieJarHandle = Arc<RwLock<dyn CookieJar + Send + Sync>>;

/// Source and sink of cookies for requests.
pub trait CookieJar {
    /// Cookies to send to `url`, as `(name, value)` pairs.
    fn request_cookies(&self, url: &Url) -> Vec<(String, String)>;

    /// Remember every `Set-Cookie` in `headers` received from `url`.
    fn store_response_cookies(&mut self, url: &Url, headers: &Headers);

    /// Removes all cookies from the jar.
    fn clear(&mut self);

    /// Removes the cookie `name` stored for the origin of `url`.
    fn remove_cookie(&mut self, url: &Url, name: &str);
}

/// A cookie as remembered by [`DefaultCookieJar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub expires: Option<String>,
}

impl Cookie {
    /// Parse one `Set-Cookie` header value.
    ///
    /// Returns the cookie and whether it asked to be deleted (`Max-Age<=0`).
    pub fn parse(header: &str) -> Option<(Cookie, bool)> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Cookie {
            name: name.to_string(),
            value: value.trim().to_string(),
            path: None,
            domain: None,
            secure: false,
            http_only: false,
            expires: None,
        };
        let mut expired = false;

        for attribute in parts {
            let attribute = attribute.trim();
            match attribute.split_once('=') {
                Some((key, val)) => {
                    let val = val.trim();
                    match key.trim().to_ascii_lowercase().as_str() {
                        "path" => cookie.path = Some(val.to_string()),
                        "domain" => cookie.domain = Some(val.trim_start_matches('.').to_ascii_lowercase()),
                        "expires" => cookie.expires = Some(val.to_string()),
                        "max-age" => expired = val.parse::<i64>().is_ok_and(|age| age <= 0),
                        _ => {}
                    }
                }
                None => {
                    if attribute.eq_ignore_ascii_case("secure") {
                        cookie.secure = true;
                    } else if attribute.eq_ignore_ascii_case("httponly") {
                        cookie.http_only = true;
                    }
                }
            }
        }
        Some((cookie, expired))
    }

    fn matches(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        let domain_ok = match &self.domain {
            Some(domain) => host == *domain || host.ends_with(&format!(".{domain}")),
            None => true,
        };
        let path_ok = match &self.path {
            Some(path) => url.path().starts_with(path.as_str()),
            None => true,
        };
        domain_ok && path_ok && (!self.secure || url.scheme() == "https")
    }
}

/// In-memory cookie jar, bucketed by origin.
#[derive(Debug, Clone, Default)]
pub struct DefaultCookieJar {
    entries: HashMap<String, Vec<Cookie>>,
}

impl DefaultCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh empty jar behind a shareable handle.
    pub fn handle() -> CookieJarHandle {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Every cookie stored for the origin of `url`.
    pub fn cookies(&self, url: &Url) -> &[Cookie] {
        self.entries
            .get(&url.origin().ascii_serialization())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl CookieJar for DefaultCookieJar {
    fn request_cookies(&self, url: &Url) -> Vec<(String, String)> {
        self.cookies(url)
            .iter()
            .filter(|cookie| cookie.matches(url))
            .map(|cookie| (cookie.name.clone(), cookie.value.clone()))
            .collect()
    }

    fn store_response_cookies(&mut self, url: &Url, headers: &Headers) {
        let Some(values) = headers.get(SET_COOKIE) else {
            return;
        };
        let default_path = url
            .path()
            .rsplit_once('/')
            .map_or("/", |(dir, _)| if dir.is_empty() { "/" } else { dir })
            .to_string();
        let bucket = self
            .entries
            .entry(url.origin().ascii_serialization())
            .or_default();

        for value in values {
            let Some((mut cookie, expired)) = Cookie::parse(value) else {
                continue;
            };
            bucket.retain(|c| c.name != cookie.name);
            if expired {
                continue;
            }
            if cookie.path.is_none() {
                cookie.path = Some(default_path.clone());
            }
            bucket.push(cookie);
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn remove_cookie(&mut self, url: &Url, name: &str) {
        if let Some(cookies) = self.entries.get_mut(&url.origin().ascii_serialization()) {
            cookies.retain(|c| c.name != name);
        }
    }
}
