//! Snippetbox library: domain, store adapters, middleware and HTTP handlers.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

pub use domain::TraceId;
