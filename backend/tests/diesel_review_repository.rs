//! Integration tests for `DieselReviewRepository` against embedded
//! PostgreSQL.
//!
//! Counters must stay unique per pair, increments must not be lost under
//! contention, and a failed increment must leave nothing behind.

use rstest::{fixture, rstest};
use snippetbox::domain::ports::{
    ReviewRepository, ReviewRepositoryError, SnippetRepository, UserRepository,
};
use snippetbox::domain::{Expiry, NewSnippet, NewUser, SnippetId, UserId};
use snippetbox::outbound::persistence::{
    DieselReviewRepository, DieselSnippetRepository, DieselUserRepository,
};

mod support;

use support::{Database, count, database, handle_cluster_setup_failure};

const CONCURRENT_WRITERS: u32 = 8;

struct TestContext {
    db: Database,
    reviews: DieselReviewRepository,
    user: UserId,
    snippet: SnippetId,
}

fn setup_context() -> Result<TestContext, String> {
    let db = database(4)?;
    let users = DieselUserRepository::new(db.pool.clone());
    let snippets = DieselSnippetRepository::new(db.pool.clone());
    let (user, snippet) = db.runtime.block_on(async {
        let user = users
            .insert(NewUser {
                name: "Alice".to_owned(),
                email: "alice@example.com".to_owned(),
                password_hash: "hash".to_owned(),
            })
            .await
            .map_err(|err| err.to_string())?;
        let snippet = snippets
            .insert(NewSnippet {
                title: "O snail".to_owned(),
                content: "Climb Mount Fuji".to_owned(),
                expires: Expiry::Week,
            })
            .await
            .map_err(|err| err.to_string())?;
        Ok::<_, String>((user, snippet))
    })?;
    let reviews = DieselReviewRepository::new(db.pool.clone());
    Ok(TestContext {
        db,
        reviews,
        user,
        snippet,
    })
}

#[fixture]
fn review_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

async fn review_rows(ctx: &TestContext) -> i64 {
    count(&ctx.db.pool, "SELECT COUNT(*) AS count FROM reviews").await
}

#[rstest]
fn repeated_gets_create_a_single_zero_row(review_context: Option<TestContext>) {
    let Some(ctx) = review_context else {
        eprintln!("SKIP-TEST-CLUSTER: repeated_gets_create_a_single_zero_row skipped");
        return;
    };
    ctx.db.runtime.block_on(async {
        let first = ctx.reviews.get(ctx.user, ctx.snippet).await.expect("first get");
        let second = ctx.reviews.get(ctx.user, ctx.snippet).await.expect("second get");
        assert_eq!(first.count, 0);
        assert_eq!(second.count, 0);
        assert_eq!(review_rows(&ctx).await, 1);
    });
}

#[rstest]
fn sequential_updates_count_one_then_two(review_context: Option<TestContext>) {
    let Some(ctx) = review_context else {
        eprintln!("SKIP-TEST-CLUSTER: sequential_updates_count_one_then_two skipped");
        return;
    };
    ctx.db.runtime.block_on(async {
        for expected in [1, 2] {
            ctx.reviews.update(ctx.user, ctx.snippet).await.expect("update");
            let review = ctx.reviews.get(ctx.user, ctx.snippet).await.expect("get");
            assert_eq!(review.count, expected);
        }
        assert_eq!(review_rows(&ctx).await, 1);
    });
}

#[rstest]
fn concurrent_updates_are_never_lost(review_context: Option<TestContext>) {
    let Some(ctx) = review_context else {
        eprintln!("SKIP-TEST-CLUSTER: concurrent_updates_are_never_lost skipped");
        return;
    };
    ctx.db.runtime.block_on(async {
        let handles: Vec<_> = (0..CONCURRENT_WRITERS)
            .map(|_| {
                let reviews = ctx.reviews.clone();
                let (user, snippet) = (ctx.user, ctx.snippet);
                tokio::spawn(async move { reviews.update(user, snippet).await })
            })
            .collect();
        for handle in handles {
            handle.await.expect("writer task").expect("update");
        }
        let review = ctx.reviews.get(ctx.user, ctx.snippet).await.expect("get");
        assert_eq!(review.count, CONCURRENT_WRITERS);
        assert_eq!(review_rows(&ctx).await, 1);
    });
}

#[rstest]
fn updates_for_missing_snippets_roll_back(review_context: Option<TestContext>) {
    let Some(ctx) = review_context else {
        eprintln!("SKIP-TEST-CLUSTER: updates_for_missing_snippets_roll_back skipped");
        return;
    };
    let missing = SnippetId::new(ctx.snippet.get() + 1_000).expect("positive id");
    ctx.db.runtime.block_on(async {
        let result = ctx.reviews.update(ctx.user, missing).await;
        assert_eq!(result, Err(ReviewRepositoryError::NotFound));
        assert_eq!(review_rows(&ctx).await, 0);
    });
}
