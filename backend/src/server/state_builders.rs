//! Selection of the store backing the HTTP ports.

use std::sync::Arc;

use tracing::{info, warn};

use snippetbox::inbound::http::state::{HttpState, HttpStatePorts};
use snippetbox::outbound::memory::InMemoryStore;
use snippetbox::outbound::persistence::{
    DbPool, DieselReviewRepository, DieselSessionRepository, DieselSnippetRepository,
    DieselUserRepository, PoolConfig, PoolError,
};

use super::AppSettings;

/// PostgreSQL-backed ports sharing one pool.
fn diesel_ports(pool: &DbPool) -> HttpStatePorts {
    HttpStatePorts {
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        snippets: Arc::new(DieselSnippetRepository::new(pool.clone())),
        reviews: Arc::new(DieselReviewRepository::new(pool.clone())),
        sessions: Arc::new(DieselSessionRepository::new(pool.clone())),
    }
}

/// Build handler state from settings.
///
/// Uses PostgreSQL when a database URL is configured and the in-memory store
/// otherwise.
///
/// # Errors
/// Returns [`PoolError`] when the connection pool cannot be created.
pub(super) async fn build_http_state(settings: &AppSettings) -> Result<HttpState, PoolError> {
    let ports = match settings.database_url.as_deref() {
        Some(url) => {
            let config = PoolConfig::new(url).with_max_size(settings.pool_max_size());
            let pool = DbPool::new(config).await?;
            info!(max_size = settings.pool_max_size(), "database pool ready");
            diesel_ports(&pool)
        }
        None => {
            warn!("no database URL configured; using the in-memory store");
            HttpStatePorts::from_store(InMemoryStore::new())
        }
    };
    Ok(HttpState::new(ports))
}
