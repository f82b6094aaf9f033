//! Executor defaults.
//!
//! Timeouts left unset on a request are taken from here. GET gets a
//! shorter read timeout than write methods. `max_redirects` only bounds the
//! transport when it follows redirects on its own; `redirect_any` requests
//! are bounded by cycle detection instead.

use std::time::Duration;

use serde::Deserialize;

pub const CONNECT_TIMEOUT_MS: u64 = 60_000;
pub const GET_READ_TIMEOUT_MS: u64 = 360_000;
pub const OTHER_READ_TIMEOUT_MS: u64 = 3_600_000;
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// Default timeouts, in milliseconds, applied when a request sets none.
///
/// Deserializes from camelCase JSON; missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExecutorConfig {
    pub connect_timeout_ms: u64,
    pub get_read_timeout_ms: u64,
    pub other_read_timeout_ms: u64,
    pub max_redirects: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: CONNECT_TIMEOUT_MS,
            get_read_timeout_ms: GET_READ_TIMEOUT_MS,
            other_read_timeout_ms: OTHER_READ_TIMEOUT_MS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl ExecutorConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Read timeout for a GET (`true`) or any other method.
    pub fn read_timeout(&self, get: bool) -> Duration {
        Duration::from_millis(if get {
            self.get_read_timeout_ms
        } else {
            self.other_read_timeout_ms
        })
    }
}
