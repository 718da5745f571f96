//! Cross-site request forgery protection for session-backed routes.
//!
//! Each session carries a random token. State-changing requests must echo it
//! in the `csrf_token` form field or the `X-CSRF-Token` header; anything else
//! is rejected with 400 before the handler runs. Only url-encoded bodies are
//! read for the field, and never beyond [`FORM_LIMIT`] bytes.

use actix_service::Service as _;
use actix_web::dev::{Payload, ServiceRequest};
use actix_web::http::{Method, header};
use actix_web::web::{Bytes, BytesMut, Form};
use actix_web::{FromRequest as _, HttpMessage as _};
use futures_util::StreamExt as _;
use rand::RngCore as _;
use serde::Deserialize;
use tracing::warn;

use super::stage::{Next, Stage, StageFuture};
use crate::domain::Error;
use crate::inbound::http::session::SessionContext;

/// Header accepted in place of the form field.
pub const CSRF_HEADER: &str = "x-csrf-token";
/// Form field carrying the token.
pub const CSRF_FIELD: &str = "csrf_token";

/// Largest url-encoded body accepted; also applied to `web::Form`.
pub const FORM_LIMIT: usize = 16_384;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Default, Deserialize)]
struct TokenField {
    #[serde(default)]
    csrf_token: String,
}

/// Issues and verifies per-session anti-forgery tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct Csrf;

fn generate_token() -> String {
    let mut bytes = [0_u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Length-independent comparison that does not stop at the first mismatch.
fn tokens_match(expected: &str, presented: &str) -> bool {
    expected.len() == presented.len()
        && expected
            .bytes()
            .zip(presented.bytes())
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn too_large() -> Error {
    Error::payload_too_large(format!("form body exceeds {FORM_LIMIT} bytes"))
}

fn declared_length(req: &ServiceRequest) -> Option<usize> {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

/// Read the body up to [`FORM_LIMIT`], leaving an identical copy for the
/// handler.
async fn buffer_body(req: &mut ServiceRequest) -> Result<Bytes, Error> {
    if declared_length(req).is_some_and(|length| length > FORM_LIMIT) {
        return Err(too_large());
    }
    let mut payload = req.take_payload();
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|err| Error::invalid_request(format!("unreadable body: {err}")))?;
        if body.len() + chunk.len() > FORM_LIMIT {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }
    let body = body.freeze();
    req.set_payload(Payload::from(body.clone()));
    Ok(body)
}

async fn presented_token(req: &mut ServiceRequest) -> Result<Option<String>, Error> {
    if let Some(value) = req.headers().get(CSRF_HEADER) {
        return Ok(value.to_str().ok().map(str::to_owned));
    }
    if !req.content_type().eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
        return Ok(None);
    }
    let body = buffer_body(req).await?;
    let mut payload = Payload::from(body);
    Ok(Form::<TokenField>::from_request(req.request(), &mut payload)
        .await
        .ok()
        .map(|form| form.into_inner().csrf_token))
}

fn session_token(session: &SessionContext) -> Result<String, Error> {
    if let Some(token) = session.csrf_token()? {
        return Ok(token);
    }
    let token = generate_token();
    session.set_csrf_token(&token)?;
    Ok(token)
}

impl Stage for Csrf {
    fn handle(&self, mut req: ServiceRequest, next: Next) -> StageFuture {
        Box::pin(async move {
            let session = SessionContext::from_service_request(&req);
            let expected = match session_token(&session) {
                Ok(token) => token,
                Err(err) => return Ok(req.error_response(err)),
            };

            if !is_safe(req.method()) {
                let presented = match presented_token(&mut req).await {
                    Ok(presented) => presented,
                    Err(err) => {
                        warn!(method = %req.method(), path = req.path(), error = %err, "rejected unreadable form body");
                        return Ok(req.error_response(err));
                    }
                };
                let valid = presented.is_some_and(|token| tokens_match(&expected, &token));
                if !valid {
                    warn!(method = %req.method(), path = req.path(), "rejected request with invalid CSRF token");
                    return Ok(req.error_response(Error::invalid_request("invalid CSRF token")));
                }
            }

            next.call(req).await
        })
    }
}
