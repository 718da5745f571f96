//! Typed access to the request session.
//!
//! Handlers and middleware go through [`SessionContext`] instead of raw
//! string keys so the session layout lives in one place.

use actix_session::{Session, SessionExt as _};
use actix_web::dev::{Payload, ServiceRequest};
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "authenticatedUserID";
pub(crate) const REDIRECT_PATH_KEY: &str = "redirectPathAfterLogin";
pub(crate) const FLASH_KEY: &str = "flash";
pub(crate) const CSRF_TOKEN_KEY: &str = "csrfToken";

fn write_error(error: impl std::fmt::Display) -> Error {
    Error::internal(format!("failed to write session: {error}"))
}

fn read_error(error: impl std::fmt::Display) -> Error {
    Error::internal(format!("failed to read session: {error}"))
}

/// Newtype over the Actix session exposing the keys this application uses.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Wrap an Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Session of a request that has not reached a handler yet.
    pub fn from_service_request(req: &ServiceRequest) -> Self {
        Self(req.get_session())
    }

    /// Authenticated user, if any. Zero and malformed ids count as absent.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let raw = match self.0.get::<i64>(USER_ID_KEY) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%error, "unreadable user id in session cookie");
                return Ok(None);
            }
        };
        Ok(raw.and_then(UserId::from_session))
    }

    /// Record a successful login under a fresh session token.
    pub fn log_in(&self, id: UserId) -> Result<(), Error> {
        self.0.renew();
        self.0.insert(USER_ID_KEY, id.get()).map_err(write_error)
    }

    /// Drop the authenticated user under a fresh session token.
    pub fn log_out(&self) {
        self.0.renew();
        self.0.remove(USER_ID_KEY);
    }

    /// Remember where to send the user after they log in.
    pub fn remember_redirect(&self, path: &str) -> Result<(), Error> {
        self.0.insert(REDIRECT_PATH_KEY, path).map_err(write_error)
    }

    /// Pop the remembered post-login path.
    pub fn take_redirect(&self) -> Option<String> {
        match self.0.remove_as::<String>(REDIRECT_PATH_KEY)? {
            Ok(path) if !path.is_empty() => Some(path),
            Ok(_) => None,
            Err(raw) => {
                warn!(%raw, "discarding malformed redirect path");
                None
            }
        }
    }

    /// Queue a one-shot message for the next rendered page.
    pub fn set_flash(&self, message: &str) -> Result<(), Error> {
        self.0.insert(FLASH_KEY, message).map_err(write_error)
    }

    /// Pop the queued flash message.
    pub fn take_flash(&self) -> Option<String> {
        self.0.remove_as::<String>(FLASH_KEY).and_then(Result::ok)
    }

    /// Anti-forgery token bound to this session.
    pub fn csrf_token(&self) -> Result<Option<String>, Error> {
        self.0.get::<String>(CSRF_TOKEN_KEY).map_err(read_error)
    }

    /// Bind a new anti-forgery token to this session.
    pub fn set_csrf_token(&self, token: &str) -> Result<(), Error> {
        self.0.insert(CSRF_TOKEN_KEY, token).map_err(write_error)
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    #[rstest]
    #[actix_web::test]
    async fn login_round_trips_user_id() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/login",
                    web::post().to(|session: SessionContext| async move {
                        session.log_in(UserId::new(9).expect("user id"))?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/whoami",
                    web::get().to(|session: SessionContext| async move {
                        let id = session.user_id()?.map_or(0, UserId::get);
                        Ok::<_, Error>(HttpResponse::Ok().body(id.to_string()))
                    }),
                ),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::post().uri("/login").to_request()).await;
        let cookie = session_cookie(&res).expect("session cookie set");
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/whoami").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, "9");
    }

    #[rstest]
    #[actix_web::test]
    async fn zero_user_id_reads_as_anonymous() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/",
                    web::get().to(|session: Session| async move {
                        session.insert(USER_ID_KEY, 0_i64).expect("insert");
                        let ctx = SessionContext::new(session);
                        let anonymous = ctx.user_id().expect("read").is_none();
                        HttpResponse::Ok().body(anonymous.to_string())
                    }),
                ),
        )
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(test::read_body(res).await, "true");
    }

    #[rstest]
    #[actix_web::test]
    async fn flash_and_redirect_are_popped_once() {
        let app = test::init_service(App::new().wrap(test_session_middleware()).route(
            "/",
            web::get().to(|session: SessionContext| async move {
                session.set_flash("Saved")?;
                session.remember_redirect("/account/view")?;
                let first = (session.take_flash(), session.take_redirect());
                let second = (session.take_flash(), session.take_redirect());
                Ok::<_, Error>(HttpResponse::Ok().body(format!("{first:?}|{second:?}")))
            }),
        ))
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(
            test::read_body(res).await,
            r#"(Some("Saved"), Some("/account/view"))|(None, None)"#
        );
    }
}
