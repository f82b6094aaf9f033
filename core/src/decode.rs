//! Response body decoders.
//!
//! The executor never guesses how to read a body. The decoder travels with
//! the request as a type parameter and decides the response body type.

use std::fmt;
use std::io::Read;
use std::marker::PhantomData;

use encoding_rs::Encoding;
use serde::de::DeserializeOwned;

use crate::charset;
use crate::error::DecodeError;

/// Turns a response body stream into a value.
pub trait ResponseDecoder {
    type Output;

    fn decode(&self, body: &mut dyn Read, charset: &'static Encoding) -> Result<Self::Output, DecodeError>;
}

/// Reads the whole body as text in the resolved charset.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDecoder;

impl ResponseDecoder for TextDecoder {
    type Output = String;

    fn decode(&self, body: &mut dyn Read, charset: &'static Encoding) -> Result<String, DecodeError> {
        Ok(read_text(body, charset)?)
    }
}

/// Reads the whole body as raw bytes, ignoring the charset.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesDecoder;

impl ResponseDecoder for BytesDecoder {
    type Output = Vec<u8>;

    fn decode(&self, body: &mut dyn Read, _charset: &'static Encoding) -> Result<Vec<u8>, DecodeError> {
        let mut bytes = Vec::new();
        body.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Parses the body as JSON into `T`.
pub struct JsonDecoder<T>(PhantomData<fn() -> T>);

impl<T> JsonDecoder<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonDecoder<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonDecoder")
    }
}

impl<T: DeserializeOwned> ResponseDecoder for JsonDecoder<T> {
    type Output = T;

    fn decode(&self, body: &mut dyn Read, charset: &'static Encoding) -> Result<T, DecodeError> {
        let text = read_text(body, charset)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Adapts a closure into a decoder.
#[derive(Clone)]
pub struct FnDecoder<F>(F);

impl<F> FnDecoder<F> {
    pub fn new<T>(f: F) -> Self
    where
        F: Fn(&mut dyn Read, &'static Encoding) -> Result<T, DecodeError>,
    {
        Self(f)
    }
}

impl<F, T> ResponseDecoder for FnDecoder<F>
where
    F: Fn(&mut dyn Read, &'static Encoding) -> Result<T, DecodeError>,
{
    type Output = T;

    fn decode(&self, body: &mut dyn Read, charset: &'static Encoding) -> Result<T, DecodeError> {
        (self.0)(body, charset)
    }
}

/// Read `body` to the end and decode it with `charset`.
pub fn read_text(body: &mut dyn Read, charset: &'static Encoding) -> std::io::Result<String> {
    let mut bytes = Vec::new();
    body.read_to_end(&mut bytes)?;
    Ok(charset::decode_text(&bytes, charset))
}
