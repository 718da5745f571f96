//! Review submission.
//!
//! ```text
//! POST /snippet/review/{id}
//! ```

use actix_web::{HttpResponse, web};
use tracing::info;

use crate::domain::{Error, SnippetId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::page::{PageContext, see_other};
use crate::inbound::http::state::HttpState;
use crate::middleware::LOGIN_PATH;

/// Add one review by the logged-in user and return to the snippet.
pub async fn review_update_post(
    page: PageContext,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let snippet_id =
        SnippetId::parse(&path).ok_or_else(|| Error::not_found("snippet not found"))?;
    let Some(user_id) = page.session().user_id()? else {
        return Ok(see_other(LOGIN_PATH));
    };

    state.reviews.update(user_id, snippet_id).await?;
    info!(%user_id, %snippet_id, "review recorded");
    page.session().set_flash("Review successfully submitted!")?;
    Ok(see_other(&format!("/snippet/view/{snippet_id}")))
}
