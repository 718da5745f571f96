//! Outbound adapters implementing the store ports.
//!
//! - **persistence**: PostgreSQL repositories built on Diesel.
//! - **memory**: process-local store for database-less runs and tests.

pub mod memory;
pub mod persistence;
