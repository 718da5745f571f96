//! Port for server-side session records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::define_port_error;

define_port_error! {
    /// Errors raised by session repository adapters.
    pub enum SessionRepositoryError {
        /// The store could not be reached.
        Connection { message: String } => "session repository connection failed: {message}",
        /// A query or mutation failed.
        Query { message: String } => "session repository query failed: {message}",
    }
}

/// Session state keyed by the opaque token held in the session cookie.
///
/// A record whose expiry is not after `now` is treated as absent by every
/// read and write; [`SessionRepository::delete_expired`] reclaims it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Serialised state of the unexpired session `token`.
    async fn find(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, SessionRepositoryError>;

    /// Store a new session.
    async fn insert(
        &self,
        token: &str,
        data: &str,
        expiry: DateTime<Utc>,
    ) -> Result<(), SessionRepositoryError>;

    /// Replace the state and expiry of the unexpired session `token`.
    ///
    /// Returns `false`, writing nothing, when no such session exists.
    async fn update(
        &self,
        token: &str,
        data: &str,
        expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, SessionRepositoryError>;

    /// Move the expiry of the unexpired session `token`.
    async fn touch(
        &self,
        token: &str,
        expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), SessionRepositoryError>;

    /// Remove the session `token`; absent tokens are not an error.
    async fn delete(&self, token: &str) -> Result<(), SessionRepositoryError>;

    /// Remove every session expired at `now`, returning how many went.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionRepositoryError>;
}
