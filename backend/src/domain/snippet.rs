//! Snippet records and their expiry policy.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Primary key of a snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnippetId(i64);

impl SnippetId {
    /// Parse a path segment; only positive integers name a snippet.
    ///
    /// # Examples
    /// ```
    /// use snippetbox::domain::SnippetId;
    ///
    /// assert!(SnippetId::parse("12").is_some());
    /// assert!(SnippetId::parse("0").is_none());
    /// assert!(SnippetId::parse("abc").is_none());
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse::<i64>().ok().and_then(Self::new)
    }

    /// Wrap a raw key, rejecting non-positive values.
    #[must_use]
    pub fn new(raw: i64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// Raw database key.
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifetimes a snippet may be created with, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// One day.
    Day,
    /// Seven days.
    Week,
    /// 365 days.
    Year,
}

impl Expiry {
    /// Day counts accepted by the create form.
    pub const PERMITTED_DAYS: [i32; 3] = [1, 7, 365];

    /// Length of the lifetime in days.
    #[must_use]
    pub fn days(self) -> i32 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Year => 365,
        }
    }

    /// Expiry instant for a snippet created at `created`.
    #[must_use]
    pub fn from_created(self, created: DateTime<Utc>) -> DateTime<Utc> {
        created + Duration::days(i64::from(self.days()))
    }
}

impl TryFrom<i32> for Expiry {
    type Error = i32;

    fn try_from(days: i32) -> Result<Self, Self::Error> {
        match days {
            1 => Ok(Self::Day),
            7 => Ok(Self::Week),
            365 => Ok(Self::Year),
            other => Err(other),
        }
    }
}

/// A stored snippet. Reads never return snippets whose `expires` has passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    /// Primary key.
    pub id: SnippetId,
    /// Short title, at most 100 characters.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Expiry time.
    pub expires: DateTime<Utc>,
}

impl Snippet {
    /// Whether the snippet is still visible at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires > now
    }
}

/// Validated input for a new snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSnippet {
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Requested lifetime.
    pub expires: Expiry,
}
