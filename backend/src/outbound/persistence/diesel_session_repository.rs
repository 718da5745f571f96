//! PostgreSQL-backed [`SessionRepository`].
//!
//! Every statement filters on `expiry > now`, so an expired row behaves as
//! absent until the sweeper removes it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{SessionRepository, SessionRepositoryError};

use super::diesel_error_mapping::{StoreFault, diesel_fault, pool_fault};
use super::models::NewSessionRow;
use super::pool::DbPool;
use super::schema::sessions;

/// Diesel implementation of the session repository port.
#[derive(Clone)]
pub struct DieselSessionRepository {
    pool: DbPool,
}

impl DieselSessionRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_fault(fault: StoreFault) -> SessionRepositoryError {
    match fault {
        StoreFault::Connection(message) => SessionRepositoryError::connection(message),
        StoreFault::Query(message) => SessionRepositoryError::query(message),
        StoreFault::NotFound => SessionRepositoryError::query("session row vanished"),
        StoreFault::UniqueViolation { .. } => {
            SessionRepositoryError::query("session token already in use")
        }
        StoreFault::ForeignKeyViolation => {
            SessionRepositoryError::query("unexpected foreign key violation")
        }
    }
}

#[async_trait]
impl SessionRepository for DieselSessionRepository {
    async fn find(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        sessions::table
            .filter(sessions::token.eq(token))
            .filter(sessions::expiry.gt(now))
            .select(sessions::data)
            .first::<String>(&mut conn)
            .await
            .optional()
            .map_err(|err| map_fault(diesel_fault(err, "find session")))
    }

    async fn insert(
        &self,
        token: &str,
        data: &str,
        expiry: DateTime<Utc>,
    ) -> Result<(), SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        diesel::insert_into(sessions::table)
            .values(NewSessionRow {
                token,
                data,
                expiry,
            })
            .execute(&mut conn)
            .await
            .map_err(|err| map_fault(diesel_fault(err, "insert session")))?;
        Ok(())
    }

    async fn update(
        &self,
        token: &str,
        data: &str,
        expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        let written = diesel::update(
            sessions::table
                .filter(sessions::token.eq(token))
                .filter(sessions::expiry.gt(now)),
        )
        .set((sessions::data.eq(data), sessions::expiry.eq(expiry)))
        .execute(&mut conn)
        .await
        .map_err(|err| map_fault(diesel_fault(err, "update session")))?;
        Ok(written > 0)
    }

    async fn touch(
        &self,
        token: &str,
        expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        diesel::update(
            sessions::table
                .filter(sessions::token.eq(token))
                .filter(sessions::expiry.gt(now)),
        )
        .set(sessions::expiry.eq(expiry))
        .execute(&mut conn)
        .await
        .map_err(|err| map_fault(diesel_fault(err, "touch session")))?;
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        diesel::delete(sessions::table.filter(sessions::token.eq(token)))
            .execute(&mut conn)
            .await
            .map_err(|err| map_fault(diesel_fault(err, "delete session")))?;
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        let removed = diesel::delete(sessions::table.filter(sessions::expiry.le(now)))
            .execute(&mut conn)
            .await
            .map_err(|err| map_fault(diesel_fault(err, "sweep sessions")))?;
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StoreFault::Connection("refused".to_owned()), SessionRepositoryError::connection("refused"))]
    #[case(StoreFault::Query("boom".to_owned()), SessionRepositoryError::query("boom"))]
    #[case(
        StoreFault::UniqueViolation { constraint: Some("sessions_pkey".to_owned()) },
        SessionRepositoryError::query("session token already in use")
    )]
    fn faults_map_onto_the_port(#[case] fault: StoreFault, #[case] expected: SessionRepositoryError) {
        assert_eq!(map_fault(fault), expected);
    }
}
