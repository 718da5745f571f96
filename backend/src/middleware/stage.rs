//! Uniform middleware contract.
//!
//! Every request-pipeline concern implements [`Stage`]: it receives the
//! request plus the rest of the chain and decides whether, and how, to call
//! it. [`Staged`] adapts a stage to Actix's `Transform`/`Service` pair so
//! stages compose with `.wrap()` like any other middleware.

use std::rc::Rc;

use actix_service::boxed::{self, RcService};
use actix_service::{Service, ServiceExt as _, Transform};
use actix_web::Error;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse, forward_ready};
use futures_util::future::{LocalBoxFuture, Ready, ready};

/// Remainder of the pipeline, type-erased to a boxed body.
pub type Next = RcService<ServiceRequest, ServiceResponse, Error>;

/// Future returned by [`Stage::handle`].
pub type StageFuture = LocalBoxFuture<'static, Result<ServiceResponse, Error>>;

/// One step of the request pipeline.
///
/// A stage may short-circuit by returning a response without calling
/// `next`, enrich the request before delegating, or post-process the
/// response `next` produced.
///
/// Stages must not keep a clone of the [`actix_web::HttpRequest`] alive
/// while `next` runs: the router needs sole ownership of the request to
/// record path parameters. Failures a stage detects itself are answered
/// with `req.error_response(..)` so outer stages can still decorate them.
pub trait Stage: 'static {
    /// Process `req`, delegating to `next` as needed.
    fn handle(&self, req: ServiceRequest, next: Next) -> StageFuture;
}

/// Actix middleware factory for a [`Stage`].
///
/// # Examples
/// ```
/// use actix_web::App;
/// use snippetbox::middleware::{SecureHeaders, Staged};
///
/// let _app = App::new().wrap(Staged::new(SecureHeaders));
/// ```
pub struct Staged<T> {
    stage: Rc<T>,
}

impl<T: Stage> Staged<T> {
    /// Wrap `stage` for use with `.wrap()`.
    pub fn new(stage: T) -> Self {
        Self {
            stage: Rc::new(stage),
        }
    }
}

impl<T> Clone for Staged<T> {
    fn clone(&self) -> Self {
        Self {
            stage: Rc::clone(&self.stage),
        }
    }
}

impl<S, B, T> Transform<S, ServiceRequest> for Staged<T>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
    T: Stage,
{
    type Response = ServiceResponse;
    type Error = Error;
    type InitError = ();
    type Transform = StagedService<T>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let next = boxed::rc_service(service.map(|res: ServiceResponse<B>| res.map_into_boxed_body()));
        ready(Ok(StagedService {
            stage: Rc::clone(&self.stage),
            next,
        }))
    }
}

/// Service produced by [`Staged`]; not used directly.
pub struct StagedService<T> {
    stage: Rc<T>,
    next: Next,
}

impl<T: Stage> Service<ServiceRequest> for StagedService<T> {
    type Response = ServiceResponse;
    type Error = Error;
    type Future = StageFuture;

    forward_ready!(next);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        self.stage.handle(req, Rc::clone(&self.next))
    }
}
