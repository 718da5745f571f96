//! HTTP adapter mapping for domain errors.
//!
//! The domain error type stays HTTP-agnostic; this module turns it into a
//! status code and JSON body, and maps store port failures onto it.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::ports::{ReviewRepositoryError, SnippetRepositoryError};
use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

pub use crate::domain::ApiResult;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorCode::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        let mut redacted = Error::internal("Internal server error");
        if let Some(id) = error.trace_id() {
            redacted = redacted.with_trace_id(id.to_owned());
        }
        redacted
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }

        builder.json(redact_if_internal(self))
    }
}

impl From<SnippetRepositoryError> for Error {
    fn from(err: SnippetRepositoryError) -> Self {
        match err {
            SnippetRepositoryError::NotFound => Error::not_found("snippet not found"),
            SnippetRepositoryError::Connection { message } => {
                error!(%message, "snippet store unavailable");
                Error::service_unavailable("snippet store unavailable")
            }
            SnippetRepositoryError::Query { message } => {
                Error::internal(format!("snippet query failed: {message}"))
            }
        }
    }
}

impl From<ReviewRepositoryError> for Error {
    fn from(err: ReviewRepositoryError) -> Self {
        match err {
            ReviewRepositoryError::NotFound => Error::not_found("snippet not found"),
            ReviewRepositoryError::Connection { message } => {
                error!(%message, "review store unavailable");
                Error::service_unavailable("review store unavailable")
            }
            ReviewRepositoryError::Query { message } => {
                Error::internal(format!("review query failed: {message}"))
            }
        }
    }
}
