//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::AccountService;
use crate::domain::ports::{
    ReviewRepository, SessionRepository, SnippetRepository, UserRepository,
};

/// Parameter object bundling the store ports handed to [`HttpState`].
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UserRepository>,
    pub snippets: Arc<dyn SnippetRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub sessions: Arc<dyn SessionRepository>,
}

impl HttpStatePorts {
    /// Use one store for every port, as the in-memory adapter does.
    pub fn from_store<S>(store: S) -> Self
    where
        S: UserRepository
            + SnippetRepository
            + ReviewRepository
            + SessionRepository
            + Clone
            + 'static,
    {
        Self {
            users: Arc::new(store.clone()),
            snippets: Arc::new(store.clone()),
            reviews: Arc::new(store.clone()),
            sessions: Arc::new(store),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<dyn UserRepository>,
    pub snippets: Arc<dyn SnippetRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub accounts: AccountService,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from the store ports.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            users,
            snippets,
            reviews,
            sessions,
        } = ports;
        Self {
            accounts: AccountService::new(users.clone()),
            users,
            snippets,
            reviews,
            sessions,
        }
    }
}
