//! Integration tests for the User repository using in-memory SurrealDB.

use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use taskvault_core::models::user::{CreateUser, Role};
use taskvault_core::repository::UserRepository;
use taskvault_db::repository::SurrealUserRepository;
use taskvault_protect::{FieldCipher, ProtectedField, lookup_hash};

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    taskvault_db::run_migrations(&db).await.unwrap();
    db
}

fn cipher() -> FieldCipher {
    FieldCipher::new([7u8; 32])
}

fn create_input(email: &str, name: &str) -> CreateUser {
    let c = cipher();
    CreateUser {
        email: ProtectedField::protect(&c, email, true).unwrap(),
        display_name: ProtectedField::protect(&c, name, false).unwrap(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g".into(),
        roles: BTreeSet::from([Role::User]),
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(create_input("alice@example.com", "Alice Archer"))
        .await
        .unwrap();

    assert!(user.is_active);
    assert_eq!(user.failed_access_count, 0);
    assert!(user.lockout_end.is_none());
    assert!(user.deactivated_at.is_none());
    assert_eq!(user.roles, BTreeSet::from([Role::User]));

    // Stored form is redacted + ciphertext, never plaintext.
    assert_eq!(user.email.redacted().unwrap(), "a***@e***.com");
    assert_eq!(
        user.email.reveal(&cipher()).unwrap().as_str(),
        "alice@example.com"
    );

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.email.hash(), user.email.hash());
}

#[tokio::test]
async fn get_user_by_email_hash() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(create_input("bob@example.com", "Bob"))
        .await
        .unwrap();

    let fetched = repo
        .get_by_email_hash(&lookup_hash("bob@example.com"))
        .await
        .unwrap();
    assert_eq!(fetched.id, user.id);

    // Normalized input hashes to the same key.
    let fetched = repo
        .get_by_email_hash(&lookup_hash("  BOB@Example.COM "))
        .await
        .unwrap();
    assert_eq!(fetched.id, user.id);

    let missing = repo.get_by_email_hash(&lookup_hash("nobody@example.com")).await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn duplicate_email_hash_rejected() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(create_input("same@example.com", "First"))
        .await
        .unwrap();

    let result = repo.create(create_input("same@example.com", "Second")).await;
    assert!(result.is_err(), "duplicate email hash should be rejected");
}

#[tokio::test]
async fn failed_attempts_lock_at_threshold() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(create_input("carol@example.com", "Carol"))
        .await
        .unwrap();

    let lockout_end = Utc::now() + Duration::minutes(15);

    for expected in 1..=4u32 {
        let updated = repo
            .record_failed_attempt(user.id, 5, lockout_end)
            .await
            .unwrap();
        assert_eq!(updated.failed_access_count, expected);
        assert!(
            updated.lockout_end.is_none(),
            "no lockout below the threshold"
        );
    }

    let locked = repo
        .record_failed_attempt(user.id, 5, lockout_end)
        .await
        .unwrap();
    assert_eq!(locked.failed_access_count, 5);
    assert!(locked.lockout_end.is_some(), "fifth failure locks");

    // Past the threshold the account stays locked.
    let still_locked = repo
        .record_failed_attempt(user.id, 5, lockout_end)
        .await
        .unwrap();
    assert_eq!(still_locked.failed_access_count, 6);
    assert!(still_locked.lockout_end.is_some());
}

#[tokio::test]
async fn reset_clears_counter_and_lockout() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(create_input("dave@example.com", "Dave"))
        .await
        .unwrap();

    let lockout_end = Utc::now() + Duration::minutes(15);
    for _ in 0..5 {
        repo.record_failed_attempt(user.id, 5, lockout_end)
            .await
            .unwrap();
    }

    let reset = repo.reset_failed_attempts(user.id).await.unwrap();
    assert_eq!(reset.failed_access_count, 0);
    assert!(reset.lockout_end.is_none());
}

#[tokio::test]
async fn deactivate_is_conditional_and_keeps_first_timestamp() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(create_input("eve@example.com", "Eve"))
        .await
        .unwrap();

    let deactivated = repo.deactivate(user.id).await.unwrap().unwrap();
    assert!(!deactivated.is_active);
    let first_ts = deactivated.deactivated_at.unwrap();

    // Second deactivation is not a transition.
    assert!(repo.deactivate(user.id).await.unwrap().is_none());

    let reactivated = repo.reactivate(user.id).await.unwrap().unwrap();
    assert!(reactivated.is_active);
    assert!(repo.reactivate(user.id).await.unwrap().is_none());

    // A later deactivation keeps the original timestamp.
    let again = repo.deactivate(user.id).await.unwrap().unwrap();
    assert_eq!(again.deactivated_at.unwrap(), first_ts);
}

#[tokio::test]
async fn role_changes_are_conditional() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(create_input("frank@example.com", "Frank"))
        .await
        .unwrap();

    let updated = repo
        .assign_role(user.id, Role::Admin)
        .await
        .unwrap()
        .unwrap();
    assert!(updated.has_role(Role::Admin));
    assert!(updated.has_role(Role::User));

    // Assigning a held role is not a transition.
    assert!(repo.assign_role(user.id, Role::Admin).await.unwrap().is_none());

    let updated = repo
        .remove_role(user.id, Role::Admin)
        .await
        .unwrap()
        .unwrap();
    assert!(!updated.has_role(Role::Admin));

    assert!(repo.remove_role(user.id, Role::Admin).await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_user_operations_fail() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let ghost = uuid::Uuid::new_v4();
    assert!(repo.get_by_id(ghost).await.is_err());
    assert!(repo.deactivate(ghost).await.unwrap().is_none());
    assert!(repo
        .assign_role(ghost, Role::Admin)
        .await
        .unwrap()
        .is_none());
}
