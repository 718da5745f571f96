//! Snippet pages.
//!
//! ```text
//! GET  /                    latest unexpired snippets
//! GET  /about
//! GET  /snippet/view/{id}   one snippet plus the caller's review counter
//! GET  /snippet/create      creation form (authorized users only)
//! POST /snippet/create
//! ```

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::validator::{
    TITLE_MAX_CHARS, Validator, max_chars, not_blank, permitted_value,
};
use crate::domain::{Error, Expiry, NewSnippet, Review, Snippet, SnippetId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::page::{PageContext, see_other};
use crate::inbound::http::state::HttpState;

/// Form body for `POST /snippet/create`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnippetCreateForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub expires: i32,
}

impl Default for SnippetCreateForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            expires: Expiry::Year.days(),
        }
    }
}

impl SnippetCreateForm {
    fn validate(&self) -> Validator {
        let mut form = Validator::default();
        form.check_field(not_blank(&self.title), "title", "This field cannot be blank");
        form.check_field(
            max_chars(&self.title, TITLE_MAX_CHARS),
            "title",
            "This field cannot be more than 100 characters long",
        );
        form.check_field(not_blank(&self.content), "content", "This field cannot be blank");
        form.check_field(
            permitted_value(&self.expires, &Expiry::PERMITTED_DAYS),
            "expires",
            "This field must equal 1, 7 or 365",
        );
        form
    }
}

#[derive(Serialize)]
struct HomeData {
    snippets: Vec<Snippet>,
}

#[derive(Serialize)]
struct ViewData {
    snippet: Snippet,
    #[serde(skip_serializing_if = "Option::is_none")]
    review: Option<Review>,
}

fn parse_id(raw: &str) -> ApiResult<SnippetId> {
    SnippetId::parse(raw).ok_or_else(|| Error::not_found("snippet not found"))
}

/// Home page listing the latest unexpired snippets.
pub async fn home(page: PageContext, state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let snippets = state.snippets.latest().await?;
    page.render("home", HomeData { snippets })
}

/// Static about page.
pub async fn about(page: PageContext) -> ApiResult<HttpResponse> {
    page.render("about", ())
}

/// One snippet. Logged-in callers also see their review counter.
pub async fn snippet_view(
    page: PageContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_id(&path)?;
    let snippet = state.snippets.get(id).await?;
    let review = match page.session().user_id()? {
        Some(user_id) if page.capabilities().authenticated => {
            Some(state.reviews.get(user_id, snippet.id).await?)
        }
        _ => None,
    };
    page.render("view", ViewData { snippet, review })
}

/// Empty creation form with a one-year default expiry.
pub async fn snippet_create(page: PageContext) -> ApiResult<HttpResponse> {
    page.render_form(
        StatusCode::OK,
        "create",
        &SnippetCreateForm::default(),
        &Validator::default(),
    )
}

/// Validate and store a new snippet.
pub async fn snippet_create_post(
    page: PageContext,
    state: web::Data<HttpState>,
    form: web::Form<SnippetCreateForm>,
) -> ApiResult<HttpResponse> {
    let form = form.into_inner();
    let validator = form.validate();
    let expires = match Expiry::try_from(form.expires) {
        Ok(expires) if validator.is_valid() => expires,
        _ => {
            return page.render_form(
                StatusCode::UNPROCESSABLE_ENTITY,
                "create",
                &form,
                &validator,
            );
        }
    };

    let id = state
        .snippets
        .insert(NewSnippet {
            title: form.title,
            content: form.content,
            expires,
        })
        .await?;
    info!(snippet_id = %id, "snippet created");
    page.session().set_flash("Snippet successfully created!")?;
    Ok(see_other(&format!("/snippet/view/{id}")))
}
