// ABOUTME: Tests for file-backed SQLite databases
// ABOUTME: Migrations are idempotent on reopen and committed data survives, rolled back data does not
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{create_test_gym, create_test_user, init_test_logging};
use gymhub_server::database::Database;
use gymhub_server::models::UserRole;
use tempfile::TempDir;

#[tokio::test]
async fn test_file_database_survives_reopen() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("gymhub.db");
    let url = format!("sqlite:{}", path.display());

    let (owner_id, gym_id) = {
        let database = Database::new(&url, 2).await.unwrap();
        let owner = create_test_user(&database, UserRole::GymOwner).await.unwrap();
        let gym = create_test_gym(&database, owner.id, 1200).await.unwrap();
        database.pool().close().await;
        (owner.id, gym.id)
    };
    assert!(path.exists());

    let reopened = Database::new(&url, 2).await.unwrap();
    let owner = reopened.get_user(owner_id).await.unwrap().unwrap();
    assert_eq!(owner.role, UserRole::GymOwner);
    let gym = reopened.get_gym(gym_id).await.unwrap().unwrap();
    assert_eq!(gym.owner_id, owner_id);
    assert_eq!(gym.pricing.discounted, Some(1200));
}

#[tokio::test]
async fn test_dropped_transaction_rolls_back() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}", dir.path().join("rollback.db").display());
    let database = Database::new(&url, 2).await.unwrap();
    let owner = create_test_user(&database, UserRole::GymOwner).await.unwrap();

    {
        let mut tx = database.begin().await.unwrap();
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(owner.id.to_string())
            .execute(tx.executor().unwrap())
            .await
            .unwrap();
    }

    assert!(database.get_user(owner.id).await.unwrap().is_some());

    let mut tx = database.begin().await.unwrap();
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(owner.id.to_string())
        .execute(tx.executor().unwrap())
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert!(database.get_user(owner.id).await.unwrap().is_none());
}
