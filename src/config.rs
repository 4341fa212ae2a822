//! Support for library configuration options

use std::sync::{Arc, Mutex};
use std::time::Duration;

use once_cell::sync::Lazy;

/// The User-Agent header sent when fetching calendars over HTTP.
/// Feel free to override it when initing this library.
pub static USER_AGENT: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new(format!("calendar-feed/{}", env!("CARGO_PKG_VERSION")))));

/// A timeout for HTTP requests. There is none by default.
pub static HTTP_TIMEOUT: Lazy<Arc<Mutex<Option<Duration>>>> = Lazy::new(|| Arc::new(Mutex::new(None)));

pub(crate) fn user_agent() -> String {
    match USER_AGENT.lock() {
        Ok(ua) => ua.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

pub(crate) fn http_timeout() -> Option<Duration> {
    match HTTP_TIMEOUT.lock() {
        Ok(timeout) => *timeout,
        Err(poisoned) => *poisoned.into_inner(),
    }
}
