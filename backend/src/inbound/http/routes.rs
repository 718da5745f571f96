//! Route table and middleware chains.
//!
//! ```text
//! Recovery > LogRequest > SecureHeaders
//!   GET /ping
//!   session > Csrf > Authenticate > Authorize      dynamic pages
//!     RequireAuthentication                        account, logout, reviews
//!     RequireAuthorization                         snippet creation
//! ```
//!
//! `wrap` registers outside-in in reverse: the last call is the outermost.

use std::sync::Arc;

use actix_session::SessionMiddleware;
use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use crate::domain::ports::SessionRepository;
use crate::inbound::http::session_store::PortSessionStore;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{accounts, health, reviews, snippets, users};
use crate::middleware::{
    Authenticate, Authorize, Csrf, FORM_LIMIT, LogRequest, Recovery, RequireAuthentication,
    RequireAuthorization, SecureHeaders, Staged,
};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";
/// Lifetime of a session cookie.
pub const SESSION_TTL_HOURS: i64 = 12;

/// Everything `build_app` needs; cloned into every worker.
#[derive(Clone)]
pub struct AppDependencies {
    pub http_state: web::Data<HttpState>,
    pub key: Key,
    pub cookie_secure: bool,
    pub debug: bool,
}

fn session_middleware(
    sessions: Arc<dyn SessionRepository>,
    key: Key,
    cookie_secure: bool,
) -> SessionMiddleware<PortSessionStore> {
    SessionMiddleware::builder(PortSessionStore::new(sessions), key)
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_path("/".to_owned())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(
            PersistentSession::default().session_ttl(Duration::hours(SESSION_TTL_HOURS)),
        )
        .build()
}

/// Assemble the application with its middleware chains.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        http_state,
        key,
        cookie_secure,
        debug,
    } = deps;
    let users_port = http_state.users.clone();
    let sessions_port = http_state.sessions.clone();

    let dynamic = web::scope("")
        .wrap(Staged::new(Authorize::new(users_port.clone())))
        .wrap(Staged::new(Authenticate::new(users_port)))
        .wrap(Staged::new(Csrf))
        .wrap(session_middleware(sessions_port, key, cookie_secure))
        .route("/", web::get().to(snippets::home))
        .route("/about", web::get().to(snippets::about))
        .route("/snippet/view/{id}", web::get().to(snippets::snippet_view))
        .service(
            web::resource("/user/signup")
                .route(web::get().to(users::user_signup))
                .route(web::post().to(users::user_signup_post)),
        )
        .service(
            web::resource("/user/login")
                .route(web::get().to(users::user_login))
                .route(web::post().to(users::user_login_post)),
        )
        .service(
            web::resource("/user/logout")
                .route(web::post().to(users::user_logout_post))
                .wrap(Staged::new(RequireAuthentication)),
        )
        .service(
            web::resource("/account/view")
                .route(web::get().to(accounts::account_view))
                .wrap(Staged::new(RequireAuthentication)),
        )
        .service(
            web::resource("/account/password/update")
                .route(web::get().to(accounts::account_password_update))
                .route(web::post().to(accounts::account_password_update_post))
                .wrap(Staged::new(RequireAuthentication)),
        )
        .service(
            web::resource("/snippet/review/{id}")
                .route(web::post().to(reviews::review_update_post))
                .wrap(Staged::new(RequireAuthentication)),
        )
        .service(
            web::resource("/snippet/create")
                .route(web::get().to(snippets::snippet_create))
                .route(web::post().to(snippets::snippet_create_post))
                .wrap(Staged::new(RequireAuthorization)),
        );

    App::new()
        .app_data(http_state)
        .app_data(web::FormConfig::default().limit(FORM_LIMIT))
        .wrap(Staged::new(SecureHeaders))
        .wrap(Staged::new(LogRequest))
        .wrap(Staged::new(Recovery::with_debug(debug)))
        .service(health::ping)
        .service(dynamic)
}
