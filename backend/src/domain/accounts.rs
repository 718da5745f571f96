//! Account use-cases: signup, credential checks and password changes.
//!
//! Argon2 is slow, so hashing and verification run on tokio's
//! blocking pool instead of an actix worker thread.

use std::sync::Arc;

use tracing::debug;

use super::password::{PasswordError, hash_password, verify_password};
use super::ports::{UserRepository, UserRepositoryError};
use super::{Error, NewUser, UserId};

/// Failures raised by [`AccountService`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    /// The e-mail address is already registered.
    #[error("email address is already in use")]
    DuplicateEmail,
    /// The e-mail/password pair or the current password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// The account disappeared between authentication and use.
    #[error("account not found")]
    NotFound,
    /// The user store failed.
    #[error(transparent)]
    Store(UserRepositoryError),
    /// Hashing or hash parsing failed.
    #[error(transparent)]
    Password(#[from] PasswordError),
    /// The blocking hashing task was cancelled or panicked.
    #[error("password task failed: {0}")]
    Blocking(String),
}

impl From<UserRepositoryError> for AccountError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::DuplicateEmail => Self::DuplicateEmail,
            UserRepositoryError::NotFound => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

impl From<AccountError> for Error {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::DuplicateEmail => Error::unprocessable("Email address is already in use"),
            AccountError::InvalidCredentials => Error::unprocessable("Email or password is incorrect"),
            AccountError::NotFound => Error::not_found("account not found"),
            AccountError::Store(UserRepositoryError::Connection { message }) => {
                Error::service_unavailable(format!("user store unavailable: {message}"))
            }
            other => Error::internal(other.to_string()),
        }
    }
}

async fn hash_blocking(password: String) -> Result<String, AccountError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|err| AccountError::Blocking(err.to_string()))?
        .map_err(AccountError::from)
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, AccountError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|err| AccountError::Blocking(err.to_string()))?
        .map_err(AccountError::from)
}

/// Account operations over a [`UserRepository`].
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
}

impl AccountService {
    /// Build the service over a user store.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Register a new account.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserId, AccountError> {
        let password_hash = hash_blocking(password.to_owned()).await?;
        let id = self
            .users
            .insert(NewUser {
                name: name.to_owned(),
                email: email.to_owned(),
                password_hash,
            })
            .await?;
        debug!(user_id = %id, "account created");
        Ok(id)
    }

    /// Resolve an e-mail/password pair to the account it identifies.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, AccountError> {
        let Some(credentials) = self.users.credentials_by_email(email).await? else {
            return Err(AccountError::InvalidCredentials);
        };
        if verify_blocking(password.to_owned(), credentials.password_hash).await? {
            Ok(credentials.id)
        } else {
            Err(AccountError::InvalidCredentials)
        }
    }

    /// Replace the password of `id` after checking the current one.
    pub async fn update_password(
        &self,
        id: UserId,
        current: &str,
        new: &str,
    ) -> Result<(), AccountError> {
        let Some(credentials) = self.users.credentials_by_id(id).await? else {
            return Err(AccountError::NotFound);
        };
        if !verify_blocking(current.to_owned(), credentials.password_hash).await? {
            return Err(AccountError::InvalidCredentials);
        }
        let password_hash = hash_blocking(new.to_owned()).await?;
        self.users.update_password_hash(id, password_hash).await?;
        debug!(user_id = %id, "password updated");
        Ok(())
    }
}
