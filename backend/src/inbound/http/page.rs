//! JSON page documents.
//!
//! Every page carries the same envelope (page name, request capabilities,
//! current year, pending flash message and the session's CSRF token) with
//! page-specific data flattened into it.

use actix_web::dev::Payload;
use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse};
use chrono::{Datelike as _, Utc};
use futures_util::future::LocalBoxFuture;
use serde::Serialize;

use crate::domain::validator::Validator;
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::middleware::RequestCapabilities;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageDocument<'a, T> {
    page: &'a str,
    is_authenticated: bool,
    is_authorized: bool,
    current_year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    flash: Option<String>,
    csrf_token: String,
    #[serde(flatten)]
    data: T,
}

/// Submitted form values echoed back with their validation messages.
#[derive(Serialize)]
pub struct FormView<'a, F> {
    #[serde(flatten)]
    values: &'a F,
    #[serde(flatten)]
    validator: &'a Validator,
}

#[derive(Serialize)]
struct FormData<'a, F> {
    form: FormView<'a, F>,
}

/// Everything a handler needs to render a page for the current request.
pub struct PageContext {
    session: SessionContext,
    capabilities: RequestCapabilities,
}

impl PageContext {
    /// Typed session of the current request.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Facts established by the authentication stages.
    pub fn capabilities(&self) -> RequestCapabilities {
        self.capabilities
    }

    /// Render `page` with status 200.
    pub fn render<T: Serialize>(&self, page: &str, data: T) -> ApiResult<HttpResponse> {
        self.render_with_status(StatusCode::OK, page, data)
    }

    /// Render `page` with an explicit status. Pops the flash message.
    pub fn render_with_status<T: Serialize>(
        &self,
        status: StatusCode,
        page: &str,
        data: T,
    ) -> ApiResult<HttpResponse> {
        let document = PageDocument {
            page,
            is_authenticated: self.capabilities.authenticated,
            is_authorized: self.capabilities.authorized,
            current_year: Utc::now().year(),
            flash: self.session.take_flash(),
            csrf_token: self.session.csrf_token()?.unwrap_or_default(),
            data,
        };
        Ok(HttpResponse::build(status).json(document))
    }

    /// Render a form page. Values marked `skip_serializing` are never echoed.
    pub fn render_form<F: Serialize>(
        &self,
        status: StatusCode,
        page: &str,
        values: &F,
        validator: &Validator,
    ) -> ApiResult<HttpResponse> {
        self.render_with_status(
            status,
            page,
            FormData {
                form: FormView { values, validator },
            },
        )
    }
}

impl FromRequest for PageContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let capabilities = RequestCapabilities::of(req);
        let session = SessionContext::from_request(req, payload);
        Box::pin(async move {
            Ok(Self {
                session: session.await?,
                capabilities,
            })
        })
    }
}

/// `303 See Other` to `location`.
pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}
