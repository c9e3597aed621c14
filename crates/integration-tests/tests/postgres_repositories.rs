//! Repository behavior against a real `PostgreSQL` database.
//!
//! Each test gets a fresh database with the API migrations applied.
//! `DATABASE_URL` must point at a server the test user can create
//! databases on.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use sqlx::PgPool;
use tokio::task::JoinSet;

use trails_api::db::{
    CommentRepository, CommentStore, LocationRepository, LocationStore, RepositoryError,
    TrailRepository, TrailStore, UserDirectory, UserRepository,
};
use trails_api::models::{Comment, NewLocation, TrailDetails};
use trails_core::{CommentId, Role};
use trails_integration_tests::email;

/// Location, trail, author and one live comment.
async fn seed_comment(pool: &PgPool) -> Comment {
    let location = LocationRepository::new(pool)
        .create_location(&NewLocation {
            name: "Plymouth".to_owned(),
        })
        .await
        .unwrap();

    let details: TrailDetails = serde_json::from_value(json!({
        "TrailName": "Coast Path",
        "TrailDifficulty": "Easy",
        "TrailDistance": 5.2,
        "TrailEstTime": "2h",
        "TrailRouteType": "Loop",
        "TrailDescription": "...",
        "LocationID": location.id
    }))
    .unwrap();
    let trail = TrailRepository::new(pool)
        .create_trail(&details, &email("ranger@moor.org"))
        .await
        .unwrap();

    let author = UserRepository::new(pool)
        .create_user(&email("walker@moor.org"), Role::User)
        .await
        .unwrap();

    CommentRepository::new(pool)
        .create_comment(trail.id, author.id, "Muddy after rain")
        .await
        .unwrap()
}

async fn count_users(pool: &PgPool, raw: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM trails.app_user WHERE email = $1")
        .bind(raw)
        .fetch_one(pool)
        .await
        .unwrap()
}

// =============================================================================
// User directory
// =============================================================================

#[sqlx::test(migrations = "../api/migrations")]
async fn test_concurrent_find_or_create_keeps_one_row(pool: PgPool) {
    let mut logins = JoinSet::new();
    for _ in 0..16 {
        let pool = pool.clone();
        logins.spawn(async move {
            UserRepository::new(&pool)
                .find_or_create(&email("newcomer@moor.org"))
                .await
        });
    }

    let mut ids = Vec::new();
    while let Some(joined) = logins.join_next().await {
        let identity = joined.unwrap().unwrap();
        assert_eq!(identity.role, Role::User);
        ids.push(identity.id);
    }

    assert_eq!(ids.len(), 16);
    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(count_users(&pool, "newcomer@moor.org").await, 1);
}

#[sqlx::test(migrations = "../api/migrations")]
async fn test_find_or_create_keeps_existing_role(pool: PgPool) {
    let users = UserRepository::new(&pool);
    let admin = users
        .create_user(&email("ranger@moor.org"), Role::Admin)
        .await
        .unwrap();

    let found = users.find_or_create(&email("ranger@moor.org")).await.unwrap();
    assert_eq!(found.id, admin.id);
    assert_eq!(found.role, Role::Admin);
    assert_eq!(count_users(&pool, "ranger@moor.org").await, 1);
}

#[sqlx::test(migrations = "../api/migrations")]
async fn test_duplicate_registration_conflicts(pool: PgPool) {
    let users = UserRepository::new(&pool);
    users
        .create_user(&email("ranger@moor.org"), Role::User)
        .await
        .unwrap();

    let err = users
        .create_user(&email("ranger@moor.org"), Role::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

// =============================================================================
// Archived comments
// =============================================================================

#[sqlx::test(migrations = "../api/migrations")]
async fn test_archived_comment_text_cannot_change(pool: PgPool) {
    let comment = seed_comment(&pool).await;
    let comments = CommentRepository::new(&pool);
    comments.archive_comment(comment.id).await.unwrap();

    let err = comments
        .update_comment_text(comment.id, "Dry now")
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));

    let stored = comments.get_comment(comment.id).await.unwrap().unwrap();
    assert!(stored.archived);
    assert_eq!(stored.text, "Muddy after rain");
}

#[sqlx::test(migrations = "../api/migrations")]
async fn test_archiving_twice_stays_archived(pool: PgPool) {
    let comment = seed_comment(&pool).await;
    let comments = CommentRepository::new(&pool);

    comments.archive_comment(comment.id).await.unwrap();
    comments.archive_comment(comment.id).await.unwrap();

    let stored = comments.get_comment(comment.id).await.unwrap().unwrap();
    assert!(stored.archived);
    assert!(comments.list_comments().await.unwrap().is_empty());
    assert!(
        comments
            .list_comments_for_trail(comment.trail_id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[sqlx::test(migrations = "../api/migrations")]
async fn test_archiving_unknown_comment_is_not_found(pool: PgPool) {
    let err = CommentRepository::new(&pool)
        .archive_comment(CommentId::new(404))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}

#[sqlx::test(migrations = "../api/migrations")]
async fn test_live_comment_text_updates(pool: PgPool) {
    let comment = seed_comment(&pool).await;
    let updated = CommentRepository::new(&pool)
        .update_comment_text(comment.id, "Dry now")
        .await
        .unwrap();
    assert_eq!(updated.id, comment.id);
    assert_eq!(updated.text, "Dry now");
    assert!(!updated.archived);
}
