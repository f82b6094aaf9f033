//! Charset lookup and `Content-Type` sniffing.
//!
//! A charset that cannot be found or is not recognised is never an error:
//! callers fall back to their configured default. Misses are logged at
//! debug level.

use std::borrow::Cow;

use encoding_rs::Encoding;
use tracing::debug;

use crate::headers::{Headers, CONTENT_TYPE};

/// Look up an encoding by name.
///
/// Accepts the WHATWG labels understood by `encoding_rs` plus the legacy
/// Windows code page names still common in `Content-Type` headers.
pub fn for_name(name: &str) -> Option<&'static Encoding> {
    let name = name.trim().trim_matches(|c| c == '"' || c == '\'');
    if name.is_empty() {
        return None;
    }
    Encoding::for_label(name.as_bytes()).or_else(|| legacy_code_page(name))
}

fn legacy_code_page(name: &str) -> Option<&'static Encoding> {
    match name.to_ascii_lowercase().as_str() {
        "ms950" | "cp950" | "windows-950" | "x-windows-950" => Some(encoding_rs::BIG5),
        "ms936" | "cp936" | "windows-936" => Some(encoding_rs::GBK),
        "ms932" | "cp932" | "windows-932" | "windows-31j" => Some(encoding_rs::SHIFT_JIS),
        "ms949" | "cp949" | "windows-949" => Some(encoding_rs::EUC_KR),
        "utf_8" => Some(encoding_rs::UTF_8),
        _ => None,
    }
}

/// Find the charset named by the first `Content-Type` header carrying a
/// `charset=` directive.
///
/// Only the first directive found is considered; if it names an unknown
/// charset the result is `None`.
pub fn find_charset(headers: &Headers) -> Option<&'static Encoding> {
    let values = headers.get(CONTENT_TYPE)?;
    let token = values.iter().find_map(|value| charset_directive(value))?;
    let encoding = for_name(token);
    if encoding.is_none() {
        debug!(charset = token, "unrecognised charset, using default");
    }
    encoding
}

/// `find_charset`, falling back to `default` on a miss.
pub fn resolve(headers: &Headers, default: &'static Encoding) -> &'static Encoding {
    find_charset(headers).unwrap_or(default)
}

/// Extract the token following a case-insensitive `charset=` in `value`.
fn charset_directive(value: &str) -> Option<&str> {
    const KEY: &str = "charset=";
    let start = value.to_ascii_lowercase().find(KEY)? + KEY.len();
    let rest = &value[start..];
    let end = rest
        .find(|c: char| c.is_whitespace() || c == ';' || c == ',')
        .unwrap_or(rest.len());
    let token = rest[..end].trim_matches(|c| c == '"' || c == '\'');
    (!token.is_empty()).then_some(token)
}

/// Encode `text` with `charset`.
pub fn encode_text<'a>(text: &'a str, charset: &'static Encoding) -> Cow<'a, [u8]> {
    let (bytes, _, _) = charset.encode(text);
    bytes
}

/// Decode `bytes` with `charset`, replacing malformed sequences.
pub fn decode_text(bytes: &[u8], charset: &'static Encoding) -> String {
    let (text, _) = charset.decode_without_bom_handling(bytes);
    text.into_owned()
}
