//! Cache-control policy for pages that depend on the logged-in user.

use actix_web::http::header::{self, HeaderName, HeaderValue};

/// Responses that must never be written to a browser or proxy cache.
pub const NO_STORE: &str = "no-store";

/// Header pair marking a response as uncacheable.
pub fn no_store_header() -> (HeaderName, HeaderValue) {
    (header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE))
}
