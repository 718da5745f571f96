//! Port for snippet storage.

use async_trait::async_trait;

use crate::domain::{NewSnippet, Snippet, SnippetId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by snippet repository adapters.
    pub enum SnippetRepositoryError {
        /// The snippet does not exist or has expired.
        NotFound => "snippet not found",
        /// The store could not be reached.
        Connection { message: String } => "snippet repository connection failed: {message}",
        /// A query or mutation failed during execution.
        Query { message: String } => "snippet repository query failed: {message}",
    }
}

/// Snippet storage. Expired snippets are invisible to every read.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnippetRepository: Send + Sync {
    /// Store a snippet and return its identifier.
    async fn insert(&self, snippet: NewSnippet) -> Result<SnippetId, SnippetRepositoryError>;

    /// Fetch an unexpired snippet.
    async fn get(&self, id: SnippetId) -> Result<Snippet, SnippetRepositoryError>;

    /// All unexpired snippets ordered by identifier.
    async fn latest(&self) -> Result<Vec<Snippet>, SnippetRepositoryError>;
}
