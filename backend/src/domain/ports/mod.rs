//! Store ports at the hexagonal boundary.
//!
//! Handlers and middleware depend on these traits only; PostgreSQL and the
//! in-memory store live in `crate::outbound`.

mod macros;
pub(crate) use macros::define_port_error;

mod review_repository;
mod session_repository;
mod snippet_repository;
mod user_repository;

#[cfg(test)]
pub use review_repository::MockReviewRepository;
pub use review_repository::{ReviewRepository, ReviewRepositoryError};
#[cfg(test)]
pub use session_repository::MockSessionRepository;
pub use session_repository::{SessionRepository, SessionRepositoryError};
#[cfg(test)]
pub use snippet_repository::MockSnippetRepository;
pub use snippet_repository::{SnippetRepository, SnippetRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
