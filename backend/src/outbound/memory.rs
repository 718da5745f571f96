//! Process-local store implementing every port.
//!
//! Used when no database URL is configured and as the backing store of the
//! end-to-end tests. Review counters sit behind one async mutex per
//! `(user, snippet)` pair so concurrent increments of the same pair are
//! serialised exactly like the row lock in PostgreSQL. Sessions live in the
//! same tables so one store can back the session middleware too.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex as AsyncMutex;

use crate::domain::ports::{
    ReviewRepository, ReviewRepositoryError, SessionRepository, SessionRepositoryError,
    SnippetRepository, SnippetRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    NewSnippet, NewUser, Review, Snippet, SnippetId, StoredCredentials, User, UserId,
};

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
    owner: bool,
}

#[derive(Debug, Clone)]
struct SessionRecord {
    data: String,
    expiry: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, UserRecord>,
    snippets: BTreeMap<i64, Snippet>,
    reviews: HashMap<(i64, i64), Arc<AsyncMutex<u32>>>,
    sessions: HashMap<String, SessionRecord>,
    next_user_id: i64,
    next_snippet_id: i64,
}

/// In-memory implementation of the user, snippet, review and session ports.
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

/// The table lock was poisoned by a panicking writer.
fn poisoned() -> String {
    "in-memory store lock poisoned".to_owned()
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, String> {
        self.tables.lock().map_err(|_| poisoned())
    }

    /// Grant or revoke the privilege to publish snippets.
    ///
    /// Returns `false` when the user does not exist.
    pub fn set_owner(&self, id: UserId, owner: bool) -> bool {
        let Ok(mut tables) = self.lock() else {
            return false;
        };
        match tables.users.get_mut(&id.get()) {
            Some(record) => {
                record.owner = owner;
                true
            }
            None => false,
        }
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.lock().map(|tables| tables.users.len()).unwrap_or_default()
    }

    /// Number of review counters created so far.
    #[must_use]
    pub fn review_row_count(&self) -> usize {
        self.lock()
            .map(|tables| tables.reviews.len())
            .unwrap_or_default()
    }

    /// Number of session records, expired ones included.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.lock()
            .map(|tables| tables.sessions.len())
            .unwrap_or_default()
    }

    /// Store a snippet with explicit timestamps, bypassing expiry rules.
    ///
    /// Lets callers seed already-expired snippets.
    pub fn insert_snippet_at(
        &self,
        title: &str,
        content: &str,
        created: chrono::DateTime<Utc>,
        expires: chrono::DateTime<Utc>,
    ) -> Option<SnippetId> {
        let mut tables = self.lock().ok()?;
        tables.next_snippet_id += 1;
        let id = SnippetId::new(tables.next_snippet_id)?;
        tables.snippets.insert(
            id.get(),
            Snippet {
                id,
                title: title.to_owned(),
                content: content.to_owned(),
                created,
                expires,
            },
        );
        Some(id)
    }

    fn insert_user(&self, user: NewUser) -> Result<UserId, UserRepositoryError> {
        let mut tables = self.lock().map_err(UserRepositoryError::query)?;
        if tables.users.values().any(|record| record.user.email == user.email) {
            return Err(UserRepositoryError::duplicate_email());
        }
        tables.next_user_id += 1;
        let id = UserId::new(tables.next_user_id)
            .map_err(|err| UserRepositoryError::query(err.to_string()))?;
        tables.users.insert(
            id.get(),
            UserRecord {
                user: User {
                    id,
                    name: user.name,
                    email: user.email,
                    created: Utc::now(),
                },
                password_hash: user.password_hash,
                owner: false,
            },
        );
        Ok(id)
    }

    /// Counter cell for the pair, created at zero when absent.
    fn review_cell(
        &self,
        user: UserId,
        snippet: SnippetId,
    ) -> Result<Arc<AsyncMutex<u32>>, ReviewRepositoryError> {
        let mut tables = self.lock().map_err(ReviewRepositoryError::query)?;
        if !tables.users.contains_key(&user.get()) || !tables.snippets.contains_key(&snippet.get())
        {
            return Err(ReviewRepositoryError::not_found());
        }
        Ok(Arc::clone(
            tables
                .reviews
                .entry((user.get(), snippet.get()))
                .or_default(),
        ))
    }
}

fn credentials(record: &UserRecord) -> StoredCredentials {
    StoredCredentials {
        id: record.user.id,
        password_hash: record.password_hash.clone(),
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: NewUser) -> Result<UserId, UserRepositoryError> {
        self.insert_user(user)
    }

    async fn credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let tables = self.lock().map_err(UserRepositoryError::query)?;
        Ok(tables
            .users
            .values()
            .find(|record| record.user.email == email)
            .map(credentials))
    }

    async fn credentials_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let tables = self.lock().map_err(UserRepositoryError::query)?;
        Ok(tables.users.get(&id.get()).map(credentials))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        let tables = self.lock().map_err(UserRepositoryError::query)?;
        Ok(tables.users.get(&id.get()).map(|record| record.user.clone()))
    }

    async fn exists(&self, id: UserId) -> Result<bool, UserRepositoryError> {
        let tables = self.lock().map_err(UserRepositoryError::query)?;
        Ok(tables.users.contains_key(&id.get()))
    }

    async fn authorize(&self, id: UserId) -> Result<bool, UserRepositoryError> {
        let tables = self.lock().map_err(UserRepositoryError::query)?;
        Ok(tables
            .users
            .get(&id.get())
            .is_some_and(|record| record.owner))
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<(), UserRepositoryError> {
        let mut tables = self.lock().map_err(UserRepositoryError::query)?;
        let record = tables
            .users
            .get_mut(&id.get())
            .ok_or_else(UserRepositoryError::not_found)?;
        record.password_hash = password_hash;
        Ok(())
    }
}

#[async_trait]
impl SnippetRepository for InMemoryStore {
    async fn insert(&self, snippet: NewSnippet) -> Result<SnippetId, SnippetRepositoryError> {
        let created = Utc::now();
        self.insert_snippet_at(
            &snippet.title,
            &snippet.content,
            created,
            snippet.expires.from_created(created),
        )
        .ok_or_else(|| SnippetRepositoryError::query(poisoned()))
    }

    async fn get(&self, id: SnippetId) -> Result<Snippet, SnippetRepositoryError> {
        let tables = self.lock().map_err(SnippetRepositoryError::query)?;
        tables
            .snippets
            .get(&id.get())
            .filter(|snippet| snippet.is_live(Utc::now()))
            .cloned()
            .ok_or_else(SnippetRepositoryError::not_found)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, SnippetRepositoryError> {
        let tables = self.lock().map_err(SnippetRepositoryError::query)?;
        let now = Utc::now();
        Ok(tables
            .snippets
            .values()
            .filter(|snippet| snippet.is_live(now))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReviewRepository for InMemoryStore {
    async fn get(&self, user: UserId, snippet: SnippetId) -> Result<Review, ReviewRepositoryError> {
        let cell = self.review_cell(user, snippet)?;
        let count = *cell.lock().await;
        Ok(Review {
            user_id: user,
            snippet_id: snippet,
            count,
        })
    }

    async fn update(&self, user: UserId, snippet: SnippetId) -> Result<(), ReviewRepositoryError> {
        let cell = self.review_cell(user, snippet)?;
        let mut count = cell.lock().await;
        let current = *count;
        // Other tasks may run here; the key lock keeps them off this counter.
        tokio::task::yield_now().await;
        *count = current + 1;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn find(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, SessionRepositoryError> {
        let tables = self.lock().map_err(SessionRepositoryError::query)?;
        Ok(tables
            .sessions
            .get(token)
            .filter(|record| record.expiry > now)
            .map(|record| record.data.clone()))
    }

    async fn insert(
        &self,
        token: &str,
        data: &str,
        expiry: DateTime<Utc>,
    ) -> Result<(), SessionRepositoryError> {
        let mut tables = self.lock().map_err(SessionRepositoryError::query)?;
        tables.sessions.insert(
            token.to_owned(),
            SessionRecord {
                data: data.to_owned(),
                expiry,
            },
        );
        Ok(())
    }

    async fn update(
        &self,
        token: &str,
        data: &str,
        expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, SessionRepositoryError> {
        let mut tables = self.lock().map_err(SessionRepositoryError::query)?;
        match tables.sessions.get_mut(token).filter(|record| record.expiry > now) {
            Some(record) => {
                record.data = data.to_owned();
                record.expiry = expiry;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch(
        &self,
        token: &str,
        expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), SessionRepositoryError> {
        let mut tables = self.lock().map_err(SessionRepositoryError::query)?;
        if let Some(record) = tables.sessions.get_mut(token).filter(|record| record.expiry > now) {
            record.expiry = expiry;
        }
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), SessionRepositoryError> {
        let mut tables = self.lock().map_err(SessionRepositoryError::query)?;
        tables.sessions.remove(token);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionRepositoryError> {
        let mut tables = self.lock().map_err(SessionRepositoryError::query)?;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, record| record.expiry > now);
        Ok(u64::try_from(before - tables.sessions.len()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Expiry;
    use chrono::Duration;
    use rstest::{fixture, rstest};

    struct Seeded {
        store: InMemoryStore,
        user: UserId,
        snippet: SnippetId,
    }

    #[fixture]
    fn seeded() -> Seeded {
        let store = InMemoryStore::new();
        let user = store
            .insert_user(NewUser {
                name: "Alice".to_owned(),
                email: "alice@example.com".to_owned(),
                password_hash: "hash".to_owned(),
            })
            .expect("insert user");
        let now = Utc::now();
        let snippet = store
            .insert_snippet_at(
                "O snail",
                "Climb Mount Fuji",
                now,
                Expiry::Week.from_created(now),
            )
            .expect("insert snippet");
        Seeded {
            store,
            user,
            snippet,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_is_rejected_without_a_write(seeded: Seeded) {
        let result = UserRepository::insert(
            &seeded.store,
            NewUser {
                name: "Other".to_owned(),
                email: "alice@example.com".to_owned(),
                password_hash: "hash".to_owned(),
            },
        )
        .await;
        assert_eq!(result, Err(UserRepositoryError::DuplicateEmail));
        assert_eq!(seeded.store.user_count(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn authorize_requires_the_owner_flag(seeded: Seeded) {
        assert!(!seeded.store.authorize(seeded.user).await.expect("authorize"));
        assert!(seeded.store.set_owner(seeded.user, true));
        assert!(seeded.store.authorize(seeded.user).await.expect("authorize"));
    }

    #[rstest]
    #[tokio::test]
    async fn expired_snippets_are_invisible() {
        let store = InMemoryStore::new();
        let past = Utc::now() - Duration::days(2);
        let id = store
            .insert_snippet_at("old", "gone", past, past + Duration::days(1))
            .expect("seed snippet");
        assert_eq!(
            SnippetRepository::get(&store, id).await,
            Err(SnippetRepositoryError::NotFound)
        );
        assert!(store.latest().await.expect("latest").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn latest_orders_by_id() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        for title in ["first", "second", "third"] {
            store
                .insert_snippet_at(title, "body", now, now + Duration::days(1))
                .expect("seed snippet");
        }
        let titles: Vec<_> = store
            .latest()
            .await
            .expect("latest")
            .into_iter()
            .map(|snippet| snippet.title)
            .collect();
        assert_eq!(titles, ["first", "second", "third"]);
    }

    #[rstest]
    #[tokio::test]
    async fn repeated_gets_create_one_zero_row(seeded: Seeded) {
        let first = ReviewRepository::get(&seeded.store, seeded.user, seeded.snippet)
            .await
            .expect("first get");
        let second = ReviewRepository::get(&seeded.store, seeded.user, seeded.snippet)
            .await
            .expect("second get");
        assert_eq!(first.count, 0);
        assert_eq!(second.count, 0);
        assert_eq!(seeded.store.review_row_count(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn sequential_updates_count_up(seeded: Seeded) {
        for expected in 1..=2 {
            ReviewRepository::update(&seeded.store, seeded.user, seeded.snippet)
                .await
                .expect("update");
            let review = ReviewRepository::get(&seeded.store, seeded.user, seeded.snippet)
                .await
                .expect("get");
            assert_eq!(review.count, expected);
        }
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_are_not_lost(seeded: Seeded) {
        const WRITERS: u32 = 32;
        let handles: Vec<_> = (0..WRITERS)
            .map(|_| {
                let store = seeded.store.clone();
                let (user, snippet) = (seeded.user, seeded.snippet);
                tokio::spawn(async move { ReviewRepository::update(&store, user, snippet).await })
            })
            .collect();
        for handle in handles {
            handle.await.expect("join").expect("update");
        }
        let review = ReviewRepository::get(&seeded.store, seeded.user, seeded.snippet)
            .await
            .expect("get");
        assert_eq!(review.count, WRITERS);
    }

    #[rstest]
    #[tokio::test]
    async fn reviews_of_missing_targets_are_not_found(seeded: Seeded) {
        let missing = SnippetId::new(999).expect("snippet id");
        assert_eq!(
            ReviewRepository::get(&seeded.store, seeded.user, missing).await,
            Err(ReviewRepositoryError::NotFound)
        );
        assert_eq!(seeded.store.review_row_count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn expired_sessions_are_invisible_and_swept() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        SessionRepository::insert(&store, "live", "{}", now + Duration::hours(1))
            .await
            .expect("insert live");
        SessionRepository::insert(&store, "stale", "{}", now - Duration::seconds(1))
            .await
            .expect("insert stale");

        assert_eq!(store.find("live", now).await.expect("find"), Some("{}".to_owned()));
        assert_eq!(store.find("stale", now).await.expect("find"), None);
        assert!(
            !SessionRepository::update(&store, "stale", "{\"a\":\"1\"}", now + Duration::hours(1), now)
                .await
                .expect("update")
        );

        assert_eq!(store.delete_expired(now).await.expect("sweep"), 1);
        assert_eq!(store.session_count(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn deleted_sessions_cannot_be_updated_back() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let expiry = now + Duration::hours(1);
        SessionRepository::insert(&store, "token", "{}", expiry)
            .await
            .expect("insert");
        SessionRepository::delete(&store, "token").await.expect("delete");
        assert!(
            !SessionRepository::update(&store, "token", "{}", expiry, now)
                .await
                .expect("update")
        );
        assert_eq!(store.session_count(), 0);
    }
}
