//! Blocking transport backed by ureq.
//!
//! Status codes never become errors here; classification belongs to the
//! executor. When a request asks the executor to handle redirects the agent
//! is told not to follow any.

use tracing::trace;
use ureq::http::{Method, Request};
use ureq::ResponseExt;
use url::Url;

use crate::config::DEFAULT_MAX_REDIRECTS;
use crate::error::TransportError;
use crate::headers::Headers;
use crate::http::{HttpRequest, HttpResponse, Transport};

#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    max_redirects: u32,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REDIRECTS)
    }
}

impl UreqTransport {
    /// Transport that follows at most `max_redirects` redirects itself for
    /// requests without `redirect_any`.
    pub fn new(max_redirects: u32) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            max_redirects,
        }
    }

    /// Agent for `request`: the shared one, or a dedicated one for a proxy.
    fn agent(&self, request: &HttpRequest) -> Result<ureq::Agent, TransportError> {
        let Some(proxy) = &request.proxy else {
            return Ok(self.agent.clone());
        };
        let proxy = ureq::Proxy::new(proxy.as_str())
            .map_err(|e| TransportError::InvalidProxy(format!("{}: {e}", proxy.as_str())))?;
        Ok(ureq::Agent::config_builder()
            .http_status_as_error(false)
            .proxy(Some(proxy))
            .build()
            .new_agent())
    }

    fn max_redirects(&self, request: &HttpRequest) -> u32 {
        if request.follow_redirects {
            self.max_redirects
        } else {
            0
        }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent(request)?;
        let method = Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| TransportError::Other(e.to_string()))?;
        let mut builder = Request::builder().method(method).uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        trace!(url = %request.url, headers = request.headers.len(), "ureq send");

        let connect = Some(request.connect_timeout);
        let read = Some(request.read_timeout);
        let redirects = self.max_redirects(request);

        let result = match &request.body {
            Some(body) => {
                let req = builder
                    .body(body.clone())
                    .map_err(|e| TransportError::Other(e.to_string()))?;
                let req = agent
                    .configure_request(req)
                    .timeout_connect(connect)
                    .timeout_recv_response(read)
                    .timeout_recv_body(read)
                    .max_redirects(redirects)
                    .build();
                agent.run(req)
            }
            None => {
                let req = builder
                    .body(())
                    .map_err(|e| TransportError::Other(e.to_string()))?;
                let req = agent
                    .configure_request(req)
                    .timeout_connect(connect)
                    .timeout_recv_response(read)
                    .timeout_recv_body(read)
                    .max_redirects(redirects)
                    .build();
                agent.run(req)
            }
        };
        let response = result.map_err(|e| map_error(e, &request.url))?;

        let status = response.status();
        let url = Url::parse(&response.get_uri().to_string()).unwrap_or_else(|_| request.url.clone());
        let headers: Headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        Ok(HttpResponse {
            url,
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: Box::new(response.into_body().into_reader()),
            error_body: None,
        })
    }
}

fn map_error(err: ureq::Error, url: &Url) -> TransportError {
    match err {
        ureq::Error::Io(e) => TransportError::Io(e),
        ureq::Error::Timeout(kind) => TransportError::Timeout(format!("{kind:?}")),
        ureq::Error::HostNotFound => {
            TransportError::UnknownHost(url.host_str().unwrap_or_default().to_string())
        }
        other => TransportError::Other(other.to_string()),
    }
}
