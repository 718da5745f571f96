//! Browser hardening headers applied to every response.

use actix_service::Service as _;
use actix_web::dev::ServiceRequest;
use actix_web::http::header::{self, HeaderMap, HeaderName, HeaderValue};

use super::stage::{Next, Stage, StageFuture};

const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com";

const HEADERS: [(HeaderName, &str); 5] = [
    (header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY),
    (header::REFERRER_POLICY, "origin-when-cross-origin"),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "deny"),
    (header::X_XSS_PROTECTION, "0"),
];

/// Stamp the hardening headers onto `headers`, replacing existing values.
pub(crate) fn harden(headers: &mut HeaderMap) {
    for (name, value) in HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
}

/// Sets CSP, referrer, sniffing, framing and XSS-auditor headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureHeaders;

impl Stage for SecureHeaders {
    fn handle(&self, req: ServiceRequest, next: Next) -> StageFuture {
        Box::pin(async move {
            let mut res = next.call(req).await?;
            harden(res.headers_mut());
            Ok(res)
        })
    }
}
