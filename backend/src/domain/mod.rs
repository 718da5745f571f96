//! Domain primitives, ports and use-cases.
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: transport-agnostic error payload.
//! - [`UserId`], [`User`], [`Snippet`], [`Review`]: stored records.
//! - [`AccountService`]: signup, login and password changes.
//! - [`validator`]: form validation helpers.
//! - [`ports`]: store traits implemented in `crate::outbound`.

pub mod accounts;
pub mod error;
pub mod password;
pub mod ports;
pub mod review;
pub mod snippet;
pub mod trace_id;
pub mod user;
pub mod validator;

pub use self::accounts::{AccountError, AccountService};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::review::Review;
pub use self::snippet::{Expiry, NewSnippet, Snippet, SnippetId};
pub use self::trace_id::TraceId;
pub use self::user::{NewUser, StoredCredentials, User, UserId, UserValidationError};

/// Convenient result alias for fallible handlers.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use snippetbox::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::not_found("missing"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
