//! SwipeOne REST API access
//!
//! Handlers talk to the CRM through the [`ApiClient`] trait; [`SwipeOneClient`]
//! is the reqwest-backed implementation used in production.

use std::sync::LazyLock;

use regex::Regex;

pub mod client;
mod error;
mod http;

pub use client::{ApiClient, ApiRequest};
pub use error::ApiError;
pub use http::SwipeOneClient;

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,100}$").expect("id pattern is valid"));

/// Check an id before it is spliced into a request path
///
/// Ids are restricted to `[A-Za-z0-9_-]{1,100}`, which also makes them safe
/// to use in a URL without escaping.
pub fn validate_id<'a>(id: &'a str, kind: &'static str) -> Result<&'a str, ApiError> {
    if ID_PATTERN.is_match(id) {
        Ok(id)
    } else {
        Err(ApiError::InvalidId { kind })
    }
}
