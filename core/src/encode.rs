//! Query-string, form-body and header serialization.
//!
//! # Design
//! Every name and value is form-encoded over the bytes of the chosen
//! charset: ASCII alphanumerics and `*-._` pass through, space becomes
//! `+`, everything else is `%XX`. The raw query of a URL is never trusted
//! as already encoded; each pair is encoded again, so `%41` in a source
//! query is sent as `%2541`. Encoding starts from the query text as the
//! caller wrote it, so a space is sent as `+` rather than `%2520`.

use encoding_rs::Encoding;
use url::form_urlencoded::byte_serialize;
use url::Url;

use crate::charset;
use crate::headers::{Headers, Params};
use crate::request::Body;

/// Form-encode one name or value in `charset`.
pub fn encode_component(text: &str, charset: &'static Encoding) -> String {
    let bytes = charset::encode_text(text, charset);
    byte_serialize(&bytes).collect()
}

fn encode_pair(name: &str, value: &str, charset: &'static Encoding) -> String {
    format!(
        "{}={}",
        encode_component(name, charset),
        encode_component(value, charset)
    )
}

/// Re-encode the pairs of `query`, then append every pair from `params`.
///
/// A query segment without `=` is treated as a value with an empty name.
/// Pairs are joined with `&`; the result never ends with a separator.
pub fn merge_query(query: Option<&str>, params: Option<&Params>, charset: &'static Encoding) -> String {
    let mut pairs = Vec::new();
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        let mut segments: Vec<&str> = query.split('&').collect();
        while segments.last().is_some_and(|s| s.is_empty()) {
            segments.pop();
        }
        for segment in segments {
            let (name, value) = segment.split_once('=').unwrap_or(("", segment));
            pairs.push(encode_pair(name, value, charset));
        }
    }
    if let Some(params) = params {
        pairs.extend(
            params
                .pairs()
                .map(|(name, value)| encode_pair(name, value, charset)),
        );
    }
    pairs.join("&")
}

/// Rebuild `url` with the raw `query` encoded and `params` merged in.
///
/// `query` is the caller's text, not `url.query()`, which the URL parser
/// has already escaped. Path and fragment are kept; the query is dropped
/// when nothing remains after merging.
pub fn encode_url(
    url: &Url,
    query: Option<&str>,
    params: Option<&Params>,
    charset: &'static Encoding,
) -> Url {
    let merged = merge_query(query, params, charset);
    let mut encoded = url.clone();
    encoded.set_query((!merged.is_empty()).then_some(merged.as_str()));
    encoded
}

/// Encode `params` as an `application/x-www-form-urlencoded` body.
pub fn form_body(params: &Params, charset: &'static Encoding) -> Vec<u8> {
    params
        .pairs()
        .map(|(name, value)| encode_pair(name, value, charset))
        .collect::<Vec<_>>()
        .join("&")
        .into_bytes()
}

/// Bytes of a raw body in `charset`; `None` when there is nothing to write.
pub fn raw_body(body: &Body, charset: &'static Encoding) -> Option<Vec<u8>> {
    let bytes = match body {
        Body::Text(text) => charset::encode_text(text, charset).into_owned(),
        Body::Bytes(bytes) => bytes.clone(),
    };
    (!bytes.is_empty()).then_some(bytes)
}

/// One wire header per name, values joined with `"; "`.
pub fn header_lines(headers: &Headers) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, values)| (name.to_string(), values.join("; ")))
        .collect()
}
