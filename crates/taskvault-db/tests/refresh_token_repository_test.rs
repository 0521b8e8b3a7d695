//! Integration tests for the refresh token repository using in-memory
//! SurrealDB. The consume tests pin down the single-use redemption
//! contract the rotation logic depends on.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use taskvault_core::models::refresh_token::CreateRefreshToken;
use taskvault_core::repository::RefreshTokenRepository;
use taskvault_db::repository::SurrealRefreshTokenRepository;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    taskvault_db::run_migrations(&db).await.unwrap();
    db
}

fn input(user_id: Uuid, token_hash: &str, ttl_secs: i64) -> CreateRefreshToken {
    CreateRefreshToken {
        user_id,
        token_hash: token_hash.into(),
        expires_at: Utc::now() + Duration::seconds(ttl_secs),
    }
}

#[tokio::test]
async fn create_and_lookup() {
    let db = setup().await;
    let repo = SurrealRefreshTokenRepository::new(db);
    let user_id = Uuid::new_v4();

    let token = repo.create(input(user_id, "hash-a", 3600)).await.unwrap();
    assert_eq!(token.user_id, user_id);
    assert!(token.revoked_at.is_none());
    assert!(token.replaced_by_token_id.is_none());
    assert!(token.is_valid(Utc::now()));

    let by_id = repo.get_by_id(token.id).await.unwrap();
    assert_eq!(by_id.token_hash, "hash-a");

    let by_hash = repo.get_by_token_hash("hash-a").await.unwrap();
    assert_eq!(by_hash.id, token.id);

    assert!(repo.get_by_token_hash("unknown").await.is_err());
}

#[tokio::test]
async fn consume_is_single_use() {
    let db = setup().await;
    let repo = SurrealRefreshTokenRepository::new(db);

    let token = repo
        .create(input(Uuid::new_v4(), "hash-b", 3600))
        .await
        .unwrap();

    let consumed = repo.consume("hash-b").await.unwrap().unwrap();
    assert_eq!(consumed.id, token.id);
    assert!(consumed.revoked_at.is_some(), "consume revokes");

    // Second presentation finds nothing redeemable.
    assert!(repo.consume("hash-b").await.unwrap().is_none());
}

#[tokio::test]
async fn consume_rejects_expired() {
    let db = setup().await;
    let repo = SurrealRefreshTokenRepository::new(db);

    repo.create(input(Uuid::new_v4(), "hash-c", -1))
        .await
        .unwrap();

    assert!(repo.consume("hash-c").await.unwrap().is_none());

    // Still visible to the state-agnostic lookup.
    let stale = repo.get_by_token_hash("hash-c").await.unwrap();
    assert!(stale.revoked_at.is_none());
    assert!(!stale.is_valid(Utc::now()));
}

#[tokio::test]
async fn revoke_is_terminal_and_idempotent() {
    let db = setup().await;
    let repo = SurrealRefreshTokenRepository::new(db);

    let token = repo
        .create(input(Uuid::new_v4(), "hash-d", 3600))
        .await
        .unwrap();

    repo.revoke(token.id).await.unwrap();
    let first = repo.get_by_id(token.id).await.unwrap();
    let first_ts = first.revoked_at.unwrap();

    repo.revoke(token.id).await.unwrap();
    let second = repo.get_by_id(token.id).await.unwrap();
    assert_eq!(second.revoked_at.unwrap(), first_ts);

    assert!(repo.consume("hash-d").await.unwrap().is_none());
}

#[tokio::test]
async fn link_successor_persists() {
    let db = setup().await;
    let repo = SurrealRefreshTokenRepository::new(db);
    let user_id = Uuid::new_v4();

    let old = repo.create(input(user_id, "hash-e1", 3600)).await.unwrap();
    let new = repo.create(input(user_id, "hash-e2", 3600)).await.unwrap();

    repo.link_successor(old.id, new.id).await.unwrap();

    let linked = repo.get_by_id(old.id).await.unwrap();
    assert_eq!(linked.replaced_by_token_id, Some(new.id));
}

#[tokio::test]
async fn revoke_all_counts_only_live_tokens() {
    let db = setup().await;
    let repo = SurrealRefreshTokenRepository::new(db);
    let user_id = Uuid::new_v4();
    let other_user = Uuid::new_v4();

    let a = repo.create(input(user_id, "hash-f1", 3600)).await.unwrap();
    repo.create(input(user_id, "hash-f2", 3600)).await.unwrap();
    repo.create(input(other_user, "hash-f3", 3600)).await.unwrap();

    // Pre-revoke one; it must not be counted again.
    repo.revoke(a.id).await.unwrap();

    let revoked = repo.revoke_all_for_user(user_id).await.unwrap();
    assert_eq!(revoked, 1);

    // The other user's token is untouched.
    let untouched = repo.get_by_token_hash("hash-f3").await.unwrap();
    assert!(untouched.revoked_at.is_none());
}
