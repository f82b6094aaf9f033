//! Fixture server for exercising the request executor over real HTTP.
//!
//! # Design
//! Every route accepts any method so one handler covers GET and the write
//! methods alike. Routes:
//! - `/string` echoes the `param` and `body` parameters concatenated,
//!   decoding query and form body with the charset named by the request's
//!   `Content-Type` (UTF-8 otherwise).
//! - `/json` echoes a `Data` document; anything unparsable is a 400.
//! - `/redirect?path=…[&status=301]` redirects to `path`.
//! - `/redirect/missing` is a 302 without `Location`.
//! - `/chain/{hops}` redirects down to `/chain/0`.
//! - `/loop` redirects to itself.
//! - `/cookie` sets a session cookie and echoes the `Cookie` header.
//! - `/status/{code}` answers with that status.
//!
//! No types are shared with the client core; integration tests catch drift.

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use encoding_rs::Encoding;
use percent_encoding::percent_decode;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::debug;

pub const SESSION_COOKIE: &str = "session=abc123; Path=/";

const TEXT_UTF8: &str = "text/plain; charset=UTF-8";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Data {
    pub time: i64,
    pub array: Vec<String>,
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub path: Option<String>,
    pub status: Option<u16>,
}

pub fn app() -> Router {
    Router::new()
        .route("/string", any(string))
        .route("/json", any(json))
        .route("/redirect", any(redirect))
        .route("/redirect/missing", any(redirect_missing))
        .route("/chain/{hops}", any(chain))
        .route("/loop", any(redirect_loop))
        .route("/cookie", any(cookie))
        .route("/status/{code}", any(status))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn string(headers: HeaderMap, uri: Uri, body: Bytes) -> Response {
    let charset = request_charset(&headers);
    let mut pairs = decode_form(uri.query().unwrap_or_default().as_bytes(), charset);
    pairs.extend(decode_form(&body, charset));
    let lookup = |name: &str| {
        pairs
            .iter()
            .find(|(n, _)| n == name)
            .map_or("null", |(_, v)| v.as_str())
            .to_string()
    };
    let text = format!("{}{}", lookup("param"), lookup("body"));
    debug!(charset = charset.name(), %text, "string echo");
    ([(header::CONTENT_TYPE, TEXT_UTF8)], text).into_response()
}

async fn json(body: Bytes) -> Result<Json<Data>, StatusCode> {
    serde_json::from_slice(&body).map(Json).map_err(|e| {
        debug!(error = %e, "rejecting json body");
        StatusCode::BAD_REQUEST
    })
}

async fn redirect(Query(query): Query<RedirectQuery>) -> Response {
    let Some(path) = query.path else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let status = match query.status {
        Some(301) => StatusCode::MOVED_PERMANENTLY,
        _ => StatusCode::FOUND,
    };
    (status, [(header::LOCATION, path)]).into_response()
}

async fn redirect_missing() -> StatusCode {
    StatusCode::FOUND
}

async fn chain(Path(hops): Path<u32>) -> Response {
    if hops == 0 {
        return ([(header::CONTENT_TYPE, TEXT_UTF8)], "chain end").into_response();
    }
    (StatusCode::FOUND, [(header::LOCATION, format!("/chain/{}", hops - 1))]).into_response()
}

async fn redirect_loop() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/loop")]).into_response()
}

async fn cookie(headers: HeaderMap) -> Response {
    let received = headers
        .get(header::COOKIE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default();
    (
        [
            (header::SET_COOKIE, SESSION_COOKIE),
            (header::CONTENT_TYPE, TEXT_UTF8),
        ],
        received,
    )
        .into_response()
}

async fn status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, format!("status {code}")).into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Charset named by the request `Content-Type`, UTF-8 when absent or unknown.
fn request_charset(headers: &HeaderMap) -> &'static Encoding {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let lower = v.to_ascii_lowercase();
            let start = lower.find("charset=")? + "charset=".len();
            let label: String = lower[start..]
                .chars()
                .take_while(|c| !c.is_whitespace() && *c != ';')
                .collect();
            charset_for_label(label.trim_matches('"'))
        })
        .unwrap_or(encoding_rs::UTF_8)
}

fn charset_for_label(label: &str) -> Option<&'static Encoding> {
    match label {
        "ms950" | "cp950" | "x-windows-950" => Some(encoding_rs::BIG5),
        _ => Encoding::for_label(label.as_bytes()),
    }
}

/// Decode `application/x-www-form-urlencoded` bytes whose escapes are in
/// `charset`.
fn decode_form(raw: &[u8], charset: &'static Encoding) -> Vec<(String, String)> {
    raw.split(|b| *b == b'&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (name, value) = match segment.iter().position(|b| *b == b'=') {
                Some(i) => (&segment[..i], &segment[i + 1..]),
                None => (&segment[..0], segment),
            };
            (decode_component(name, charset), decode_component(value, charset))
        })
        .collect()
}

fn decode_component(raw: &[u8], charset: &'static Encoding) -> String {
    let plus_as_space: Vec<u8> = raw
        .iter()
        .map(|b| if *b == b'+' { b' ' } else { *b })
        .collect();
    let bytes: Vec<u8> = percent_decode(&plus_as_space).collect();
    charset.decode_without_bom_handling(&bytes).0.into_owned()
}
