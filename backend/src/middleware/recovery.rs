//! Per-request fault boundary.
//!
//! Catches panics raised anywhere further down the chain and logs every
//! server error with a backtrace. Clients receive a generic 500; in debug
//! mode the diagnostic is included in the body instead.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;

use actix_service::Service as _;
use actix_web::HttpMessage as _;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::http::header::{self, HeaderValue};
use actix_web::{HttpResponse, HttpResponseBuilder};
use futures_util::FutureExt as _;
use serde_json::json;
use tracing::error;

use super::secure_headers;
use super::stage::{Next, Stage, StageFuture};
use crate::domain::{Error, TRACE_ID_HEADER, TraceId};

/// Converts panics and server errors into logged, generic 500 responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recovery {
    debug: bool,
}

impl Recovery {
    /// Fault boundary that hides diagnostics from clients.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault boundary that echoes diagnostics when `debug` is set.
    #[must_use]
    pub fn with_debug(debug: bool) -> Self {
        Self { debug }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

/// Generic 500 body, optionally carrying the diagnostic.
fn server_error(debug: bool, diagnostic: &str, backtrace: &Backtrace, trace_id: TraceId) -> Error {
    let mut payload = Error::internal("Internal server error");
    if debug {
        payload = payload.with_details(json!({
            "diagnostic": diagnostic,
            "backtrace": backtrace.to_string(),
        }));
    }
    payload.with_trace_id(trace_id.to_string())
}

fn with_trace_header(builder: &mut HttpResponseBuilder, trace_id: TraceId) {
    builder.insert_header((TRACE_ID_HEADER, trace_id.to_string()));
}

fn recover_panic(payload: &(dyn Any + Send), debug: bool, trace_id: TraceId) -> actix_web::Error {
    let message = panic_message(payload);
    let backtrace = Backtrace::force_capture();
    error!(%trace_id, panic = %message, %backtrace, "recovered from panic");
    let body = server_error(debug, &message, &backtrace, trace_id);
    let mut builder = HttpResponse::InternalServerError();
    builder
        .insert_header((header::CONNECTION, "close"))
        .force_close();
    with_trace_header(&mut builder, trace_id);
    let mut response = builder.json(body);
    secure_headers::harden(response.headers_mut());
    InternalError::from_response(message, response).into()
}

fn log_server_error(status: StatusCode, diagnostic: &str, backtrace: &Backtrace, trace_id: TraceId) {
    error!(
        %trace_id,
        status = status.as_u16(),
        error = %diagnostic,
        %backtrace,
        "server error"
    );
}

fn inspect_response(res: ServiceResponse, debug: bool, trace_id: TraceId) -> ServiceResponse {
    if !res.status().is_server_error() {
        return res;
    }
    let diagnostic = res
        .response()
        .error()
        .map_or_else(|| res.status().to_string(), ToString::to_string);
    let backtrace = Backtrace::capture();
    log_server_error(res.status(), &diagnostic, &backtrace, trace_id);
    if !debug {
        return res;
    }
    let body = server_error(true, &diagnostic, &backtrace, trace_id);
    let status = res.status();
    let headers = res.headers().clone();
    res.into_response({
        let mut builder = HttpResponse::build(status);
        for (name, value) in headers.iter().filter(|(name, _)| {
            **name != header::CONTENT_TYPE && **name != header::CONTENT_LENGTH
        }) {
            builder.append_header((name.clone(), HeaderValue::clone(value)));
        }
        builder.json(body)
    })
}

/// Errors escaping the chain are rendered by Actix; only 5xx ones are
/// logged, and in debug mode rewritten to carry their diagnostic.
fn inspect_error(err: actix_web::Error, debug: bool, trace_id: TraceId) -> actix_web::Error {
    let status = err.as_response_error().status_code();
    if !status.is_server_error() {
        return err;
    }
    let diagnostic = err.to_string();
    let backtrace = Backtrace::capture();
    log_server_error(status, &diagnostic, &backtrace, trace_id);
    if !debug {
        return err;
    }
    let body = server_error(true, &diagnostic, &backtrace, trace_id);
    let mut builder = HttpResponse::build(status);
    with_trace_header(&mut builder, trace_id);
    InternalError::from_response(diagnostic, builder.json(body)).into()
}

impl Stage for Recovery {
    fn handle(&self, req: ServiceRequest, next: Next) -> StageFuture {
        let debug = self.debug;
        let trace_id = TraceId::generate();
        req.extensions_mut().insert(trace_id);
        Box::pin(async move {
            let outcome = AssertUnwindSafe(async move { next.call(req).await })
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(res)) => Ok(inspect_response(res, debug, trace_id)),
                Ok(Err(err)) => Err(inspect_error(err, debug, trace_id)),
                Err(payload) => Err(recover_panic(payload.as_ref(), debug, trace_id)),
            }
        })
    }
}
