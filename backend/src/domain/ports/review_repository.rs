//! Port for the per-user review counters.

use async_trait::async_trait;

use crate::domain::{Review, SnippetId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by review repository adapters.
    pub enum ReviewRepositoryError {
        /// The user or snippet referenced by the counter does not exist.
        NotFound => "review target not found",
        /// The store could not be reached.
        Connection { message: String } => "review repository connection failed: {message}",
        /// A query, mutation or transaction failed.
        Query { message: String } => "review repository query failed: {message}",
    }
}

/// Review counter storage.
///
/// Implementations guarantee a single counter per `(user, snippet)` pair and
/// serialise concurrent increments of the same pair.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Read the counter, creating it at zero when absent.
    async fn get(&self, user: UserId, snippet: SnippetId) -> Result<Review, ReviewRepositoryError>;

    /// Atomically add one to the counter, creating it first when absent.
    ///
    /// On failure nothing is committed and the counter keeps its value.
    async fn update(&self, user: UserId, snippet: SnippetId) -> Result<(), ReviewRepositoryError>;
}
