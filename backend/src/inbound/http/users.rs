//! Signup, login and logout.
//!
//! ```text
//! GET  /user/signup
//! POST /user/signup   name, email, password
//! GET  /user/login
//! POST /user/login    email, password
//! POST /user/logout
//! ```

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::domain::validator::{
    PASSWORD_MIN_CHARS, Validator, email_rx, matches, min_chars, not_blank,
};
use crate::domain::{AccountError, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::page::{PageContext, see_other};
use crate::inbound::http::state::HttpState;

/// Where a login lands when no protected page asked for it.
pub const DEFAULT_LOGIN_REDIRECT: &str = "/snippet/create";

/// Form body for `POST /user/signup`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl Drop for SignupForm {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl SignupForm {
    fn validate(&self) -> Validator {
        let mut form = Validator::default();
        form.check_field(not_blank(&self.name), "name", "This field cannot be blank");
        form.check_field(not_blank(&self.email), "email", "This field cannot be blank");
        form.check_field(
            matches(&self.email, email_rx()),
            "email",
            "This field must be a valid email address",
        );
        form.check_field(not_blank(&self.password), "password", "This field cannot be blank");
        form.check_field(
            min_chars(&self.password, PASSWORD_MIN_CHARS),
            "password",
            "This field must be at least 8 characters long",
        );
        form
    }
}

/// Form body for `POST /user/login`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl Drop for LoginForm {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl LoginForm {
    fn validate(&self) -> Validator {
        let mut form = Validator::default();
        form.check_field(not_blank(&self.email), "email", "This field cannot be blank");
        form.check_field(
            matches(&self.email, email_rx()),
            "email",
            "This field must be a valid email address",
        );
        form.check_field(not_blank(&self.password), "password", "This field cannot be blank");
        form
    }
}

/// Empty signup form.
pub async fn user_signup(page: PageContext) -> ApiResult<HttpResponse> {
    page.render_form(
        StatusCode::OK,
        "signup",
        &SignupForm::default(),
        &Validator::default(),
    )
}

/// Register an account. A taken e-mail address re-renders the form.
pub async fn user_signup_post(
    page: PageContext,
    state: web::Data<HttpState>,
    form: web::Form<SignupForm>,
) -> ApiResult<HttpResponse> {
    let mut validator = form.validate();
    if !validator.is_valid() {
        return page.render_form(StatusCode::UNPROCESSABLE_ENTITY, "signup", &*form, &validator);
    }

    match state
        .accounts
        .signup(&form.name, &form.email, &form.password)
        .await
    {
        Ok(id) => info!(user_id = %id, "user signed up"),
        Err(AccountError::DuplicateEmail) => {
            validator.add_field_error("email", "Email address is already in use");
            return page.render_form(StatusCode::UNPROCESSABLE_ENTITY, "signup", &*form, &validator);
        }
        Err(err) => return Err(Error::from(err)),
    }

    page.session()
        .set_flash("Your signup was successful. Please log in")?;
    Ok(see_other("/user/login"))
}

/// Empty login form.
pub async fn user_login(page: PageContext) -> ApiResult<HttpResponse> {
    page.render_form(
        StatusCode::OK,
        "login",
        &LoginForm::default(),
        &Validator::default(),
    )
}

/// Check credentials and start an authenticated session.
///
/// Lands on the path a gate remembered, or [`DEFAULT_LOGIN_REDIRECT`].
pub async fn user_login_post(
    page: PageContext,
    state: web::Data<HttpState>,
    form: web::Form<LoginForm>,
) -> ApiResult<HttpResponse> {
    let mut validator = form.validate();
    if !validator.is_valid() {
        return page.render_form(StatusCode::UNPROCESSABLE_ENTITY, "login", &*form, &validator);
    }

    let id = match state.accounts.authenticate(&form.email, &form.password).await {
        Ok(id) => id,
        Err(AccountError::InvalidCredentials) => {
            warn!("login rejected");
            validator.add_non_field_error("Email or password is incorrect");
            return page.render_form(StatusCode::UNPROCESSABLE_ENTITY, "login", &*form, &validator);
        }
        Err(err) => return Err(Error::from(err)),
    };

    let session = page.session();
    session.log_in(id)?;
    info!(user_id = %id, "user logged in");
    let target = session
        .take_redirect()
        .unwrap_or_else(|| DEFAULT_LOGIN_REDIRECT.to_owned());
    Ok(see_other(&target))
}

/// End the authenticated session.
pub async fn user_logout_post(page: PageContext) -> ApiResult<HttpResponse> {
    let session = page.session();
    session.log_out();
    session.set_flash("You've been logged out successfully!")?;
    Ok(see_other("/"))
}
