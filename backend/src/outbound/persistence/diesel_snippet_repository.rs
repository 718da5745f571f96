//! PostgreSQL-backed [`SnippetRepository`].

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{SnippetRepository, SnippetRepositoryError};
use crate::domain::{NewSnippet, Snippet, SnippetId};

use super::diesel_error_mapping::{StoreFault, diesel_fault, pool_fault};
use super::models::{NewSnippetRow, SnippetRow};
use super::pool::DbPool;
use super::schema::snippets;

/// Diesel implementation of the snippet repository port.
#[derive(Clone)]
pub struct DieselSnippetRepository {
    pool: DbPool,
}

impl DieselSnippetRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_fault(fault: StoreFault) -> SnippetRepositoryError {
    match fault {
        StoreFault::NotFound => SnippetRepositoryError::not_found(),
        StoreFault::Connection(message) => SnippetRepositoryError::connection(message),
        StoreFault::Query(message) => SnippetRepositoryError::query(message),
        other => SnippetRepositoryError::query(format!("unexpected constraint failure: {other:?}")),
    }
}

fn row_to_snippet(row: SnippetRow) -> Result<Snippet, SnippetRepositoryError> {
    let id = SnippetId::new(row.id)
        .ok_or_else(|| SnippetRepositoryError::query(format!("invalid snippet id {}", row.id)))?;
    Ok(Snippet {
        id,
        title: row.title,
        content: row.content,
        created: row.created,
        expires: row.expires,
    })
}

#[async_trait]
impl SnippetRepository for DieselSnippetRepository {
    async fn insert(&self, snippet: NewSnippet) -> Result<SnippetId, SnippetRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        let created = Utc::now();
        let row = NewSnippetRow {
            title: &snippet.title,
            content: &snippet.content,
            created,
            expires: snippet.expires.from_created(created),
        };
        let id: i64 = diesel::insert_into(snippets::table)
            .values(&row)
            .returning(snippets::id)
            .get_result(&mut conn)
            .await
            .map_err(|err| map_fault(diesel_fault(err, "insert snippet")))?;
        SnippetId::new(id)
            .ok_or_else(|| SnippetRepositoryError::query(format!("invalid snippet id {id}")))
    }

    async fn get(&self, id: SnippetId) -> Result<Snippet, SnippetRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        let row = snippets::table
            .find(id.get())
            .filter(snippets::expires.gt(Utc::now()))
            .select(SnippetRow::as_select())
            .first(&mut conn)
            .await
            .map_err(|err| map_fault(diesel_fault(err, "get snippet")))?;
        row_to_snippet(row)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, SnippetRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        let rows: Vec<SnippetRow> = snippets::table
            .filter(snippets::expires.gt(Utc::now()))
            .order(snippets::id.asc())
            .select(SnippetRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_fault(diesel_fault(err, "latest snippets")))?;
        rows.into_iter().map(row_to_snippet).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn missing_rows_map_to_not_found() {
        assert_eq!(map_fault(StoreFault::NotFound), SnippetRepositoryError::NotFound);
    }

    #[rstest]
    fn rows_with_invalid_ids_are_rejected() {
        let now = Utc::now();
        let row = SnippetRow {
            id: -1,
            title: "t".to_owned(),
            content: "c".to_owned(),
            created: now,
            expires: now,
        };
        assert!(row_to_snippet(row).is_err());
    }
}
