//! Gates enforcing the facts set by [`super::Authenticate`] and
//! [`super::Authorize`].
//!
//! A closed gate remembers the requested path for the post-login redirect
//! and answers `303 See Other` to the login page; the handler never runs.
//! An open gate marks the response `Cache-Control: no-store`.

use actix_service::Service as _;
use actix_web::HttpResponse;
use actix_web::dev::ServiceRequest;
use actix_web::http::header;
use tracing::debug;

use super::auth::RequestCapabilities;
use super::stage::{Next, Stage, StageFuture};
use crate::inbound::http::cache_control::no_store_header;
use crate::inbound::http::session::SessionContext;

/// Where closed gates send the user.
pub const LOGIN_PATH: &str = "/user/login";

fn pass_or_redirect(req: ServiceRequest, next: Next, open: bool) -> StageFuture {
    Box::pin(async move {
        if !open {
            let path = req.path().to_owned();
            if let Err(err) = SessionContext::from_service_request(&req).remember_redirect(&path) {
                return Ok(req.error_response(err));
            }
            debug!(%path, "gate closed; redirecting to login");
            return Ok(req.into_response(
                HttpResponse::SeeOther()
                    .insert_header((header::LOCATION, LOGIN_PATH))
                    .finish(),
            ));
        }
        let mut res = next.call(req).await?;
        let (name, value) = no_store_header();
        res.headers_mut().insert(name, value);
        Ok(res)
    })
}

/// Lets only authenticated requests through.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireAuthentication;

impl Stage for RequireAuthentication {
    fn handle(&self, req: ServiceRequest, next: Next) -> StageFuture {
        let open = RequestCapabilities::of(req.request()).authenticated;
        pass_or_redirect(req, next, open)
    }
}

/// Lets only authorized requests through.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireAuthorization;

impl Stage for RequireAuthorization {
    fn handle(&self, req: ServiceRequest, next: Next) -> StageFuture {
        let open = RequestCapabilities::of(req.request()).authorized;
        pass_or_redirect(req, next, open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::session::REDIRECT_PATH_KEY;
    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};
    use crate::middleware::Staged;
    use actix_session::Session;
    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpMessage as _, test, web};
    use rstest::rstest;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Pretend the auth stages ran and produced `caps`.
    struct Grant(RequestCapabilities);

    impl Stage for Grant {
        fn handle(&self, req: ServiceRequest, next: Next) -> StageFuture {
            req.extensions_mut().insert(self.0);
            next.call(req)
        }
    }

    async fn remembered(session: Session) -> HttpResponse {
        let path = session
            .get::<String>(REDIRECT_PATH_KEY)
            .ok()
            .flatten()
            .unwrap_or_default();
        HttpResponse::Ok().body(path)
    }

    async fn run<T: Stage>(gate: T, caps: RequestCapabilities) -> (ServiceResponse, usize, String) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let app = test::init_service(
            App::new()
                .wrap(Staged::new(Grant(caps)))
                .wrap(test_session_middleware())
                .service(
                    web::resource("/account/view")
                        .route(web::get().to(move || {
                            let counter = Arc::clone(&counter);
                            async move {
                                counter.fetch_add(1, Ordering::SeqCst);
                                HttpResponse::Ok().finish()
                            }
                        }))
                        .wrap(Staged::new(gate)),
                )
                .route("/remembered", web::get().to(remembered)),
        )
        .await;
        let res =
            test::call_service(&app, test::TestRequest::get().uri("/account/view").to_request())
                .await;
        let remembered = match session_cookie(&res) {
            Some(cookie) => {
                let check = test::call_service(
                    &app,
                    test::TestRequest::get().uri("/remembered").cookie(cookie).to_request(),
                )
                .await;
                String::from_utf8(test::read_body(check).await.to_vec()).unwrap_or_default()
            }
            None => String::new(),
        };
        (res, calls.load(Ordering::SeqCst), remembered)
    }

    #[rstest]
    #[actix_web::test]
    async fn closed_authentication_gate_redirects_and_remembers_path() {
        let (res, calls, remembered) =
            run(RequireAuthentication, RequestCapabilities::default()).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
            Some(LOGIN_PATH)
        );
        assert_eq!(calls, 0);
        assert_eq!(remembered, "/account/view");
    }

    #[rstest]
    #[actix_web::test]
    async fn authorization_gate_ignores_authentication_alone() {
        let caps = RequestCapabilities {
            authenticated: true,
            authorized: false,
        };
        let (res, calls, _) = run(RequireAuthorization, caps).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(calls, 0);
    }

    #[rstest]
    #[case(RequestCapabilities { authenticated: true, authorized: false })]
    #[case(RequestCapabilities { authenticated: true, authorized: true })]
    #[actix_web::test]
    async fn open_gate_runs_handler_without_caching(#[case] caps: RequestCapabilities) {
        let (res, calls, _) = run(RequireAuthentication, caps).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(calls, 1);
        assert_eq!(
            res.headers().get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
            Some("no-store")
        );
    }
}
