//! Stages deriving the per-request authentication and authorization facts.
//!
//! Both read the session's user id. A missing or zero id short-circuits to
//! `false` without touching the store; a store failure aborts the request
//! with a 500 and never reaches a gate or handler.

use std::sync::Arc;

use actix_service::Service as _;
use actix_web::dev::{Payload, ServiceRequest};
use actix_web::{FromRequest, HttpMessage as _, HttpRequest};
use futures_util::future::{Ready, ready};
use tracing::error;

use super::stage::{Next, Stage, StageFuture};
use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{Error, UserId};
use crate::inbound::http::session::SessionContext;

/// Facts derived for the current request. Both default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestCapabilities {
    /// The session names an existing user.
    pub authenticated: bool,
    /// The session names a user allowed to publish snippets.
    pub authorized: bool,
}

impl RequestCapabilities {
    /// Capabilities attached to `req`, or the all-false default.
    pub fn of(req: &HttpRequest) -> Self {
        req.extensions()
            .get::<Self>()
            .copied()
            .unwrap_or_default()
    }

    fn update(req: &ServiceRequest, apply: impl FnOnce(&mut Self)) {
        let mut extensions = req.extensions_mut();
        let mut caps = extensions.get::<Self>().copied().unwrap_or_default();
        apply(&mut caps);
        extensions.insert(caps);
    }
}

impl FromRequest for RequestCapabilities {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Self::of(req)))
    }
}

fn store_failure(check: &str, user_id: UserId, err: &UserRepositoryError) -> Error {
    error!(%user_id, error = %err, check, "user store lookup failed");
    Error::internal(format!("{check} lookup failed: {err}"))
}

/// Which user-store predicate a [`SessionCheck`] evaluates.
#[derive(Debug, Clone, Copy)]
enum Check {
    Exists,
    Owner,
}

impl Check {
    fn name(self) -> &'static str {
        match self {
            Self::Exists => "authentication",
            Self::Owner => "authorization",
        }
    }
}

/// Shared implementation of [`Authenticate`] and [`Authorize`].
struct SessionCheck {
    users: Arc<dyn UserRepository>,
    check: Check,
}

impl SessionCheck {
    fn run(&self, req: ServiceRequest, next: Next) -> StageFuture {
        let users = Arc::clone(&self.users);
        let check = self.check;
        Box::pin(async move {
            let session = SessionContext::from_service_request(&req);
            let user_id = match session.user_id() {
                Ok(Some(user_id)) => user_id,
                Ok(None) => return next.call(req).await,
                Err(err) => return Ok(req.error_response(err)),
            };
            let outcome = match check {
                Check::Exists => users.exists(user_id).await,
                Check::Owner => users.authorize(user_id).await,
            };
            let fact = match outcome {
                Ok(fact) => fact,
                Err(err) => {
                    return Ok(req.error_response(store_failure(check.name(), user_id, &err)));
                }
            };
            RequestCapabilities::update(&req, |caps| match check {
                Check::Exists => caps.authenticated = fact,
                Check::Owner => caps.authorized = fact,
            });
            next.call(req).await
        })
    }
}

/// Sets [`RequestCapabilities::authenticated`] when the session user exists.
pub struct Authenticate(SessionCheck);

impl Authenticate {
    /// Stage backed by `users`.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self(SessionCheck {
            users,
            check: Check::Exists,
        })
    }
}

impl Stage for Authenticate {
    fn handle(&self, req: ServiceRequest, next: Next) -> StageFuture {
        self.0.run(req, next)
    }
}

/// Sets [`RequestCapabilities::authorized`] when the session user is an owner.
pub struct Authorize(SessionCheck);

impl Authorize {
    /// Stage backed by `users`.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self(SessionCheck {
            users,
            check: Check::Owner,
        })
    }
}

impl Stage for Authorize {
    fn handle(&self, req: ServiceRequest, next: Next) -> StageFuture {
        self.0.run(req, next)
    }
}
