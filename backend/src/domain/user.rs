//! User identity and account records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validation errors returned by [`UserId::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Identifiers are positive database keys.
    #[error("user id must be positive, got {0}")]
    NonPositiveId(i64),
}

/// Stable user identifier backed by the `users.id` column.
///
/// Zero is reserved by the session layer to mean "nobody is logged in", so
/// only positive values are valid identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct UserId(i64);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: i64) -> Result<Self, UserValidationError> {
        if id <= 0 {
            return Err(UserValidationError::NonPositiveId(id));
        }
        Ok(Self(id))
    }

    /// Interpret a raw session value, mapping the zero sentinel to `None`.
    ///
    /// # Examples
    /// ```
    /// use snippetbox::domain::UserId;
    ///
    /// assert!(UserId::from_session(0).is_none());
    /// assert_eq!(UserId::from_session(7).map(UserId::get), Some(7));
    /// ```
    #[must_use]
    pub fn from_session(raw: i64) -> Option<Self> {
        Self::new(raw).ok()
    }

    /// Raw database key.
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for i64 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<i64> for UserId {
    type Error = UserValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Registered account as shown on the account page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Primary key.
    pub id: UserId,
    /// Display name given at signup.
    pub name: String,
    /// Unique login e-mail address.
    pub email: String,
    /// Account creation time.
    pub created: DateTime<Utc>,
}

/// Account data ready for insertion; the password is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Login e-mail address; must be unique.
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
}

/// Stored login material for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    /// Account the credentials belong to.
    pub id: UserId,
    /// Argon2id PHC string.
    pub password_hash: String,
}
