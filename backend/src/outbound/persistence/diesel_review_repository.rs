//! PostgreSQL-backed [`ReviewRepository`].
//!
//! Counters are created with `INSERT ... ON CONFLICT DO NOTHING` so
//! concurrent first reads never produce a second row. Increments lock the row
//! with `SELECT ... FOR UPDATE` inside a transaction, serialising writers of
//! the same pair while leaving other pairs untouched.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{ReviewRepository, ReviewRepositoryError};
use crate::domain::{Review, SnippetId, UserId};

use super::diesel_error_mapping::{StoreFault, diesel_fault, pool_fault};
use super::models::ReviewKeyRow;
use super::pool::DbPool;
use super::schema::reviews;

/// Diesel implementation of the review repository port.
#[derive(Clone)]
pub struct DieselReviewRepository {
    pool: DbPool,
}

impl DieselReviewRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_fault(fault: StoreFault) -> ReviewRepositoryError {
    match fault {
        StoreFault::NotFound | StoreFault::ForeignKeyViolation => ReviewRepositoryError::not_found(),
        StoreFault::Connection(message) => ReviewRepositoryError::connection(message),
        StoreFault::Query(message) => ReviewRepositoryError::query(message),
        StoreFault::UniqueViolation { constraint } => ReviewRepositoryError::query(format!(
            "unexpected unique violation on {}",
            constraint.as_deref().unwrap_or("unknown constraint")
        )),
    }
}

fn count_from_column(raw: i32) -> Result<u32, ReviewRepositoryError> {
    u32::try_from(raw).map_err(|_| ReviewRepositoryError::query(format!("negative review count {raw}")))
}

/// Insert the zero row for `key` unless it already exists.
async fn ensure_row(
    conn: &mut AsyncPgConnection,
    key: ReviewKeyRow,
) -> Result<usize, diesel::result::Error> {
    diesel::insert_into(reviews::table)
        .values(&key)
        .on_conflict((reviews::user_id, reviews::snippet_id))
        .do_nothing()
        .execute(conn)
        .await
}

#[async_trait]
impl ReviewRepository for DieselReviewRepository {
    async fn get(&self, user: UserId, snippet: SnippetId) -> Result<Review, ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        let key = ReviewKeyRow {
            user_id: user.get(),
            snippet_id: snippet.get(),
        };
        ensure_row(&mut conn, key)
            .await
            .map_err(|err| map_fault(diesel_fault(err, "create review")))?;
        let count: i32 = reviews::table
            .find((key.user_id, key.snippet_id))
            .select(reviews::review)
            .first(&mut conn)
            .await
            .map_err(|err| map_fault(diesel_fault(err, "get review")))?;
        Ok(Review {
            user_id: user,
            snippet_id: snippet,
            count: count_from_column(count)?,
        })
    }

    async fn update(&self, user: UserId, snippet: SnippetId) -> Result<(), ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        let key = ReviewKeyRow {
            user_id: user.get(),
            snippet_id: snippet.get(),
        };
        let count: i32 = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    ensure_row(conn, key).await?;
                    let current: i32 = reviews::table
                        .find((key.user_id, key.snippet_id))
                        .select(reviews::review)
                        .for_update()
                        .get_result(conn)
                        .await?;
                    diesel::update(reviews::table.find((key.user_id, key.snippet_id)))
                        .set(reviews::review.eq(reviews::review + 1))
                        .execute(conn)
                        .await?;
                    Ok(current + 1)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_fault(diesel_fault(err, "update review")))?;
        debug!(user_id = %user, snippet_id = %snippet, count, "review counter incremented");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn foreign_key_violations_mean_missing_target() {
        assert_eq!(
            map_fault(StoreFault::ForeignKeyViolation),
            ReviewRepositoryError::NotFound
        );
    }

    #[rstest]
    #[case(0, Some(0))]
    #[case(41, Some(41))]
    #[case(-1, None)]
    fn counts_must_be_non_negative(#[case] raw: i32, #[case] expected: Option<u32>) {
        assert_eq!(count_from_column(raw).ok(), expected);
    }
}
