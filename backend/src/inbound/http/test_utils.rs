//! Helpers shared by the HTTP adapter tests.

use std::sync::Arc;

use actix_session::SessionMiddleware;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;

use crate::inbound::http::session_store::PortSessionStore;
use crate::outbound::memory::InMemoryStore;

/// Session middleware over a private in-memory store, with a throwaway key
/// and a non-`Secure` cookie so plain-HTTP test requests carry it.
pub fn test_session_middleware() -> SessionMiddleware<PortSessionStore> {
    let store = PortSessionStore::new(Arc::new(InMemoryStore::new()));
    SessionMiddleware::builder(store, Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Session cookie set by `res`, detached from the response lifetime.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}
