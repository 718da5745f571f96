//! Classification of Diesel and pool failures shared by the repositories.
//!
//! Each repository turns a [`StoreFault`] into its own port error so the
//! domain only ever sees `NotFound`, `DuplicateEmail`, connection or query
//! variants.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Store-level failure category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreFault {
    /// No row matched.
    NotFound,
    /// A unique constraint rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// A foreign key pointed at a missing row.
    ForeignKeyViolation,
    /// The connection was lost or could not be obtained.
    Connection(String),
    /// Any other failure.
    Query(String),
}

/// Extract the message of a pool failure.
pub(crate) fn pool_fault(error: PoolError) -> StoreFault {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            StoreFault::Connection(message)
        }
    }
}

/// Classify a Diesel error, logging database details at debug level.
pub(crate) fn diesel_fault(error: DieselError, operation: &str) -> StoreFault {
    match error {
        DieselError::NotFound => StoreFault::NotFound,
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), %operation, "diesel operation failed");
            match kind {
                DatabaseErrorKind::UniqueViolation => StoreFault::UniqueViolation {
                    constraint: info.constraint_name().map(str::to_owned),
                },
                DatabaseErrorKind::ForeignKeyViolation => StoreFault::ForeignKeyViolation,
                DatabaseErrorKind::ClosedConnection => {
                    StoreFault::Connection("database connection closed".to_owned())
                }
                _ => StoreFault::Query(format!("{operation}: database error")),
            }
        }
        other => {
            debug!(error = %other, %operation, "diesel operation failed");
            StoreFault::Query(format!("{operation}: {other}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn not_found_is_preserved() {
        assert_eq!(diesel_fault(DieselError::NotFound, "get"), StoreFault::NotFound);
    }

    #[rstest]
    fn rollback_errors_are_query_faults() {
        let fault = diesel_fault(DieselError::RollbackTransaction, "update review");
        assert!(matches!(fault, StoreFault::Query(message) if message.starts_with("update review")));
    }

    #[rstest]
    fn pool_failures_are_connection_faults() {
        assert_eq!(
            pool_fault(PoolError::checkout("timed out")),
            StoreFault::Connection("timed out".to_owned())
        );
    }
}
