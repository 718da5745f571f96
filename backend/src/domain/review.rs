//! Per-user review counters.

use serde::Serialize;

use super::{SnippetId, UserId};

/// Number of times one user reviewed one snippet.
///
/// At most one counter exists per `(user_id, snippet_id)` pair. It is created
/// with a count of zero on first read and only ever incremented by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Reviewer.
    pub user_id: UserId,
    /// Reviewed snippet.
    pub snippet_id: SnippetId,
    /// Number of completed reviews.
    pub count: u32,
}

impl Review {
    /// A counter that has not been incremented yet.
    #[must_use]
    pub fn fresh(user_id: UserId, snippet_id: SnippetId) -> Self {
        Self {
            user_id,
            snippet_id,
            count: 0,
        }
    }
}
