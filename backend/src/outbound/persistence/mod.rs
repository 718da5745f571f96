//! PostgreSQL adapters for the store ports.
//!
//! Repositories translate between Diesel rows (`models.rs`, `schema.rs`) and
//! domain records; no business rules live here. Every error is mapped onto
//! the port's error enum before it leaves the module.
//!
//! ```ignore
//! use snippetbox::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/snippetbox")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_review_repository;
mod diesel_session_repository;
mod diesel_snippet_repository;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_review_repository::DieselReviewRepository;
pub use diesel_session_repository::DieselSessionRepository;
pub use diesel_snippet_repository::DieselSnippetRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
