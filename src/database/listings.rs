// ABOUTME: Gym listing plan subscription storage
// ABOUTME: Cascades cancel open listings when an owner leaves and delete them with the gym
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::{db_error, parse_enum, parse_timestamp, parse_uuid, Database};
use crate::errors::AppResult;
use crate::models::ListingSubscription;

impl Database {
    pub(super) async fn migrate_listings(&self) -> AppResult<()> {
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS listing_subscriptions (
                id TEXT PRIMARY KEY,
                gym_id TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                plan TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('active', 'grace', 'cancelled', 'expired')),
                expires_at TEXT NOT NULL
            )
            ",
        )
        .await?;

        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_listing_subscriptions_gym ON listing_subscriptions(gym_id)",
        )
        .await
    }

    /// Store a listing subscription
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_listing(&self, listing: &ListingSubscription) -> AppResult<Uuid> {
        let mut conn = self.acquire().await?;
        sqlx::query(
            r"
            INSERT INTO listing_subscriptions (id, gym_id, owner_id, plan, status, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(listing.id.to_string())
        .bind(listing.gym_id.to_string())
        .bind(listing.owner_id.to_string())
        .bind(&listing.plan)
        .bind(listing.status.as_str())
        .bind(listing.expires_at.to_rfc3339())
        .execute(&mut *conn)
        .await
        .map_err(db_error("Failed to create listing subscription"))?;

        Ok(listing.id)
    }

    /// Listing subscriptions of a gym
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded
    pub async fn list_listings_for_gym(&self, gym_id: Uuid) -> AppResult<Vec<ListingSubscription>> {
        let mut conn = self.acquire().await?;
        let rows = sqlx::query(
            r"
            SELECT id, gym_id, owner_id, plan, status, expires_at
            FROM listing_subscriptions WHERE gym_id = $1 ORDER BY expires_at
            ",
        )
        .bind(gym_id.to_string())
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("Failed to list listing subscriptions"))?;

        rows.iter().map(row_to_listing).collect()
    }
}

/// Cancel the active and grace subscriptions of a gym
///
/// # Errors
///
/// Returns an error if the update fails
pub async fn cancel_open_for_gym(conn: &mut SqliteConnection, gym_id: Uuid) -> AppResult<u64> {
    let result = sqlx::query(
        r"
        UPDATE listing_subscriptions SET status = 'cancelled'
        WHERE gym_id = $1 AND status IN ('active', 'grace')
        ",
    )
    .bind(gym_id.to_string())
    .execute(conn)
    .await
    .map_err(db_error("Failed to cancel listing subscriptions"))?;

    Ok(result.rows_affected())
}

/// Delete every subscription of a gym
///
/// # Errors
///
/// Returns an error if the delete fails
pub async fn delete_for_gym(conn: &mut SqliteConnection, gym_id: Uuid) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM listing_subscriptions WHERE gym_id = $1")
        .bind(gym_id.to_string())
        .execute(conn)
        .await
        .map_err(db_error("Failed to delete listing subscriptions"))?;

    Ok(result.rows_affected())
}

fn row_to_listing(row: &SqliteRow) -> AppResult<ListingSubscription> {
    let id: String = row.get("id");
    let gym_id: String = row.get("gym_id");
    let owner_id: String = row.get("owner_id");
    let status: String = row.get("status");
    let expires_at: String = row.get("expires_at");

    Ok(ListingSubscription {
        id: parse_uuid(&id)?,
        gym_id: parse_uuid(&gym_id)?,
        owner_id: parse_uuid(&owner_id)?,
        plan: row.get("plan"),
        status: parse_enum(&status)?,
        expires_at: parse_timestamp(&expires_at)?,
    })
}
