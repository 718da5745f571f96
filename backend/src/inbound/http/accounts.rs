//! Account pages for logged-in users.
//!
//! ```text
//! GET  /account/view
//! GET  /account/password/update
//! POST /account/password/update   currentPassword, newPassword, newPasswordConfirmation
//! ```

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::domain::validator::{PASSWORD_MIN_CHARS, Validator, min_chars, not_blank};
use crate::domain::{AccountError, Error, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::page::{PageContext, see_other};
use crate::inbound::http::state::HttpState;
use crate::middleware::LOGIN_PATH;

/// Form body for `POST /account/password/update`. Nothing is echoed back.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdateForm {
    #[serde(default, skip_serializing)]
    pub current_password: String,
    #[serde(default, skip_serializing)]
    pub new_password: String,
    #[serde(default, skip_serializing)]
    pub new_password_confirmation: String,
}

impl Drop for PasswordUpdateForm {
    fn drop(&mut self) {
        self.current_password.zeroize();
        self.new_password.zeroize();
        self.new_password_confirmation.zeroize();
    }
}

impl PasswordUpdateForm {
    fn validate(&self) -> Validator {
        let mut form = Validator::default();
        form.check_field(
            not_blank(&self.current_password),
            "currentPassword",
            "This field cannot be blank",
        );
        form.check_field(
            not_blank(&self.new_password),
            "newPassword",
            "This field cannot be blank",
        );
        form.check_field(
            min_chars(&self.new_password, PASSWORD_MIN_CHARS),
            "newPassword",
            "This field must be at least 8 characters long",
        );
        form.check_field(
            not_blank(&self.new_password_confirmation),
            "newPasswordConfirmation",
            "This field cannot be blank",
        );
        form.check_field(
            self.new_password == self.new_password_confirmation,
            "newPasswordConfirmation",
            "Passwords do not match",
        );
        form
    }
}

#[derive(Serialize)]
struct AccountData {
    user: User,
}

/// Details of the logged-in user. A vanished account goes back to login.
pub async fn account_view(
    page: PageContext,
    state: web::Data<HttpState>,
) -> ApiResult<HttpResponse> {
    let Some(user_id) = page.session().user_id()? else {
        return Ok(see_other(LOGIN_PATH));
    };
    let user = state
        .users
        .find_by_id(user_id)
        .await
        .map_err(|err| Error::from(AccountError::from(err)))?;
    match user {
        Some(user) => page.render("account", AccountData { user }),
        None => {
            warn!(%user_id, "session names a missing account");
            Ok(see_other(LOGIN_PATH))
        }
    }
}

/// Empty password change form.
pub async fn account_password_update(page: PageContext) -> ApiResult<HttpResponse> {
    page.render_form(
        StatusCode::OK,
        "password",
        &PasswordUpdateForm::default(),
        &Validator::default(),
    )
}

/// Replace the logged-in user's password after checking the current one.
pub async fn account_password_update_post(
    page: PageContext,
    state: web::Data<HttpState>,
    form: web::Form<PasswordUpdateForm>,
) -> ApiResult<HttpResponse> {
    let mut validator = form.validate();
    if !validator.is_valid() {
        return page.render_form(StatusCode::UNPROCESSABLE_ENTITY, "password", &*form, &validator);
    }

    let Some(user_id) = page.session().user_id()? else {
        return Ok(see_other(LOGIN_PATH));
    };
    match state
        .accounts
        .update_password(user_id, &form.current_password, &form.new_password)
        .await
    {
        Ok(()) => info!(%user_id, "password changed"),
        Err(AccountError::InvalidCredentials) => {
            validator.add_field_error("currentPassword", "Current password is incorrect");
            return page.render_form(StatusCode::UNPROCESSABLE_ENTITY, "password", &*form, &validator);
        }
        Err(AccountError::NotFound) => return Ok(see_other(LOGIN_PATH)),
        Err(err) => return Err(Error::from(err)),
    }

    page.session().set_flash("Your password has been updated!")?;
    Ok(see_other("/account/view"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn form(current: &str, new: &str, confirmation: &str) -> PasswordUpdateForm {
        PasswordUpdateForm {
            current_password: current.to_owned(),
            new_password: new.to_owned(),
            new_password_confirmation: confirmation.to_owned(),
        }
    }

    #[rstest]
    #[case(form("", "password2", "password2"), "currentPassword", "This field cannot be blank")]
    #[case(form("password1", "short", "short"), "newPassword", "This field must be at least 8 characters long")]
    #[case(form("password1", "password2", ""), "newPasswordConfirmation", "This field cannot be blank")]
    #[case(form("password1", "password2", "password3"), "newPasswordConfirmation", "Passwords do not match")]
    fn password_update_validation(
        #[case] form: PasswordUpdateForm,
        #[case] field: &str,
        #[case] message: &str,
    ) {
        assert_eq!(form.validate().field_error(field), Some(message));
    }

    #[rstest]
    fn decodes_camel_case_fields() {
        let decoded: PasswordUpdateForm = serde_json::from_value(serde_json::json!({
            "currentPassword": "password1",
            "newPassword": "password2",
            "newPasswordConfirmation": "password2",
        }))
        .expect("decode form");
        assert!(decoded.validate().is_valid());
        let echoed = serde_json::to_value(&decoded).expect("serialise form");
        assert_eq!(echoed, serde_json::json!({}));
    }
}
