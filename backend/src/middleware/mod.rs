//! Request pipeline stages.
//!
//! Outer chain on every route: [`Recovery`] → [`LogRequest`] →
//! [`SecureHeaders`]. Session-backed routes add [`Csrf`] → [`Authenticate`]
//! → [`Authorize`], and protected routes finish with one gate.

pub mod auth;
pub mod csrf;
pub mod gate;
pub mod recovery;
pub mod secure_headers;
pub mod stage;
pub mod trace;

pub use auth::{Authenticate, Authorize, RequestCapabilities};
pub use csrf::{Csrf, FORM_LIMIT};
pub use gate::{LOGIN_PATH, RequireAuthentication, RequireAuthorization};
pub use recovery::Recovery;
pub use secure_headers::SecureHeaders;
pub use stage::{Next, Stage, StageFuture, Staged};
pub use trace::LogRequest;
