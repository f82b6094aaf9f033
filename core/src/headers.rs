//! Case-insensitive multimap for header and parameter names.
//!
//! # Design
//! Names compare case-insensitively and iterate in case-insensitive order.
//! The spelling used on first insertion is the one kept for the wire, so
//! `content-type` set after `Content-Type` still serializes as
//! `Content-Type`. Values under one name keep insertion order.

use std::collections::BTreeMap;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const HOST: &str = "Host";
pub const USER_AGENT: &str = "User-Agent";
pub const CONNECTION: &str = "Connection";
pub const COOKIE: &str = "Cookie";
pub const SET_COOKIE: &str = "Set-Cookie";
pub const LOCATION: &str = "Location";

/// Common `Content-Type` values.
pub mod content_type {
    pub const HTML: &str = "text/html";
    pub const FORM: &str = "application/x-www-form-urlencoded";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
}

/// Headers that only ever carry one value on a request. Setting one of
/// these again replaces the value instead of appending.
const SINGULAR_HEADERS: &[&str] = &[CONTENT_TYPE, HOST, USER_AGENT, CONNECTION];

pub fn is_singular(name: &str) -> bool {
    SINGULAR_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Header map: name to list of values.
pub type Headers = MultiMap<String>;

/// Parameter map: name to list of values.
pub type Params = MultiMap<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry<V> {
    name: String,
    values: Vec<V>,
}

/// Ordered multimap keyed by case-insensitive name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiMap<V> {
    entries: BTreeMap<String, Entry<V>>,
}

impl<V> Default for MultiMap<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<V> MultiMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&fold(name))
    }

    /// All values stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&[V]> {
        self.entries.get(&fold(name)).map(|e| e.values.as_slice())
    }

    pub fn first(&self, name: &str) -> Option<&V> {
        self.get(name).and_then(|values| values.first())
    }

    /// Add `value` after any existing values for `name`.
    pub fn append(&mut self, name: impl Into<String>, value: V) {
        self.entry(name.into()).values.push(value);
    }

    /// Replace every value for `name` with the single `value`.
    pub fn set(&mut self, name: impl Into<String>, value: V) {
        self.replace_all(name, vec![value]);
    }

    /// Replace every value for `name` with `values`.
    pub fn replace_all(&mut self, name: impl Into<String>, values: Vec<V>) {
        self.entry(name.into()).values = values;
    }

    /// Iterate `(name, values)` in case-insensitive name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[V])> {
        self.entries
            .values()
            .map(|e| (e.name.as_str(), e.values.as_slice()))
    }

    /// Iterate every `(name, value)` pair, names in order and values in
    /// insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &V)> {
        self.iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name, v)))
    }

    fn entry(&mut self, name: String) -> &mut Entry<V> {
        self.entries.entry(fold(&name)).or_insert_with(|| Entry {
            name,
            values: Vec::new(),
        })
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for MultiMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = MultiMap::new();
        for (name, value) in iter {
            map.append(name, value);
        }
        map
    }
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}
