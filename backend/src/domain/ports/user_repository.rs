//! Port for account storage.

use async_trait::async_trait;

use crate::domain::{NewUser, StoredCredentials, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// No user matches the requested identifier.
        NotFound => "user not found",
        /// The e-mail address is already registered.
        DuplicateEmail => "email address is already in use",
        /// The store could not be reached.
        Connection { message: String } => "user repository connection failed: {message}",
        /// A query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
    }
}

/// Account storage used by signup, login and the authentication stages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account and return its identifier.
    ///
    /// Fails with [`UserRepositoryError::DuplicateEmail`] when the address is
    /// taken; no row is written in that case.
    async fn insert(&self, user: NewUser) -> Result<UserId, UserRepositoryError>;

    /// Login material for the account registered under `email`.
    async fn credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError>;

    /// Login material for the account `id`.
    async fn credentials_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError>;

    /// Profile of the account `id`.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Whether an account with `id` exists.
    async fn exists(&self, id: UserId) -> Result<bool, UserRepositoryError>;

    /// Whether `id` exists and may publish snippets.
    async fn authorize(&self, id: UserId) -> Result<bool, UserRepositoryError>;

    /// Replace the stored password hash.
    ///
    /// Fails with [`UserRepositoryError::NotFound`] when no row was updated.
    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<(), UserRepositoryError>;
}
