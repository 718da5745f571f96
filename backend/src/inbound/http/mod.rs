//! HTTP inbound adapter serving the snippet pages.

pub mod accounts;
pub mod cache_control;
pub mod error;
pub mod health;
pub mod page;
pub mod reviews;
pub mod routes;
pub mod session;
pub mod session_config;
pub mod session_store;
pub mod snippets;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;

pub use error::ApiResult;
pub use routes::{AppDependencies, build_app};
