// ABOUTME: Gym directory database operations
// ABOUTME: Gym rows, atomic analytics counters and the trainer roster aggregate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::{
    db_error, parse_enum, parse_optional_timestamp, parse_timestamp, parse_uuid, Database,
};
use crate::errors::AppResult;
use crate::models::{Gym, GymAnalytics, GymPricing, GymStatus};

/// Analytics counters that membership and assignment flows move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GymCounter {
    /// `analytics.memberships`
    Memberships,
    /// `analytics.trainers`
    Trainers,
}

impl GymCounter {
    const fn column(self) -> &'static str {
        match self {
            Self::Memberships => "analytics_memberships",
            Self::Trainers => "analytics_trainers",
        }
    }
}

impl Database {
    pub(super) async fn migrate_gyms(&self) -> AppResult<()> {
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS gyms (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'active', 'suspended')),
                is_published INTEGER NOT NULL DEFAULT 0,
                price_mrp INTEGER,
                price_discounted INTEGER,
                currency TEXT NOT NULL,
                trainer_share_bps INTEGER CHECK (trainer_share_bps IS NULL OR trainer_share_bps BETWEEN 0 AND 10000),
                sponsored_from TEXT,
                sponsored_until TEXT,
                analytics_memberships INTEGER NOT NULL DEFAULT 0,
                analytics_trainers INTEGER NOT NULL DEFAULT 0,
                analytics_impressions INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .await?;

        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS gym_trainers (
                gym_id TEXT NOT NULL REFERENCES gyms(id) ON DELETE CASCADE,
                trainer_id TEXT NOT NULL,
                added_at TEXT NOT NULL,
                PRIMARY KEY (gym_id, trainer_id)
            )
            ",
        )
        .await?;

        self.execute_schema("CREATE INDEX IF NOT EXISTS idx_gyms_owner ON gyms(owner_id)")
            .await?;
        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_gym_trainers_trainer ON gym_trainers(trainer_id)",
        )
        .await
    }

    /// Store a new gym together with its trainer roster
    ///
    /// # Errors
    ///
    /// Returns a conflict if the id is taken, or a database error
    pub async fn create_gym(&self, gym: &Gym) -> AppResult<Uuid> {
        let mut conn = self.acquire().await?;
        insert(&mut conn, gym).await?;
        for trainer_id in &gym.trainers {
            add_trainer(&mut conn, gym.id, *trainer_id).await?;
        }
        Ok(gym.id)
    }

    /// Get a gym by id, including its trainer roster
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded
    pub async fn get_gym(&self, gym_id: Uuid) -> AppResult<Option<Gym>> {
        let mut conn = self.acquire().await?;
        get(&mut conn, gym_id).await
    }
}

/// Insert a gym row (the roster is written separately)
///
/// # Errors
///
/// Returns a conflict if the id is taken, or a database error
pub async fn insert(conn: &mut SqliteConnection, gym: &Gym) -> AppResult<()> {
    sqlx::query(
        r"
        INSERT INTO gyms (id, owner_id, name, status, is_published, price_mrp, price_discounted,
                          currency, trainer_share_bps, sponsored_from, sponsored_until,
                          analytics_memberships, analytics_trainers, analytics_impressions,
                          created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        ",
    )
    .bind(gym.id.to_string())
    .bind(gym.owner_id.to_string())
    .bind(&gym.name)
    .bind(gym.status.as_str())
    .bind(gym.is_published)
    .bind(gym.pricing.mrp)
    .bind(gym.pricing.discounted)
    .bind(&gym.pricing.currency)
    .bind(gym.trainer_share_bps.map(i64::from))
    .bind(gym.sponsored_from.map(|d| d.to_rfc3339()))
    .bind(gym.sponsored_until.map(|d| d.to_rfc3339()))
    .bind(gym.analytics.memberships)
    .bind(gym.analytics.trainers)
    .bind(gym.analytics.impressions)
    .bind(gym.created_at.to_rfc3339())
    .bind(gym.created_at.to_rfc3339())
    .execute(conn)
    .await
    .map_err(db_error("Failed to create gym"))?;

    Ok(())
}

/// Get a gym by id, including its trainer roster
///
/// # Errors
///
/// Returns an error if the query fails or the row cannot be decoded
pub async fn get(conn: &mut SqliteConnection, gym_id: Uuid) -> AppResult<Option<Gym>> {
    let row = sqlx::query(
        r"
        SELECT id, owner_id, name, status, is_published, price_mrp, price_discounted, currency,
               trainer_share_bps, sponsored_from, sponsored_until, analytics_memberships,
               analytics_trainers, analytics_impressions, created_at
        FROM gyms WHERE id = $1
        ",
    )
    .bind(gym_id.to_string())
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error("Failed to get gym"))?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut gym = row_to_gym(&row)?;
    gym.trainers = list_trainers(conn, gym_id).await?;
    Ok(Some(gym))
}

/// Ids of the gyms a user owns
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn list_ids_owned_by(conn: &mut SqliteConnection, owner_id: Uuid) -> AppResult<Vec<Uuid>> {
    let rows = sqlx::query("SELECT id FROM gyms WHERE owner_id = $1 ORDER BY created_at")
        .bind(owner_id.to_string())
        .fetch_all(conn)
        .await
        .map_err(db_error("Failed to list owned gyms"))?;

    rows.iter()
        .map(|row| parse_uuid(&row.get::<String, _>("id")))
        .collect()
}

/// Atomically add `delta` to a counter, flooring at zero
///
/// # Errors
///
/// Returns an error if the update fails
pub async fn adjust_counter(
    conn: &mut SqliteConnection,
    gym_id: Uuid,
    counter: GymCounter,
    delta: i64,
) -> AppResult<()> {
    if delta == 0 {
        return Ok(());
    }
    let column = counter.column();
    let statement =
        format!("UPDATE gyms SET {column} = MAX({column} + $2, 0), updated_at = $3 WHERE id = $1");

    sqlx::query(&statement)
        .bind(gym_id.to_string())
        .bind(delta)
        .bind(Utc::now().to_rfc3339())
        .execute(conn)
        .await
        .map_err(db_error("Failed to adjust gym counter"))?;

    Ok(())
}

/// Overwrite both counters, used when reconciling against the truth tables
///
/// # Errors
///
/// Returns an error if the update fails
pub async fn set_counters(
    conn: &mut SqliteConnection,
    gym_id: Uuid,
    memberships: i64,
    trainers: i64,
) -> AppResult<()> {
    sqlx::query(
        r"
        UPDATE gyms SET analytics_memberships = $2, analytics_trainers = $3, updated_at = $4
        WHERE id = $1
        ",
    )
    .bind(gym_id.to_string())
    .bind(memberships)
    .bind(trainers)
    .bind(Utc::now().to_rfc3339())
    .execute(conn)
    .await
    .map_err(db_error("Failed to reconcile gym counters"))?;

    Ok(())
}

/// Suspend and unpublish a gym
///
/// # Errors
///
/// Returns an error if the update fails
pub async fn suspend(conn: &mut SqliteConnection, gym_id: Uuid) -> AppResult<()> {
    sqlx::query("UPDATE gyms SET status = $2, is_published = 0, updated_at = $3 WHERE id = $1")
        .bind(gym_id.to_string())
        .bind(GymStatus::Suspended.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(conn)
        .await
        .map_err(db_error("Failed to suspend gym"))?;

    Ok(())
}

/// Hard-delete a gym; its trainer roster goes with it
///
/// # Errors
///
/// Returns an error if the delete fails
pub async fn delete(conn: &mut SqliteConnection, gym_id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM gyms WHERE id = $1")
        .bind(gym_id.to_string())
        .execute(conn)
        .await
        .map_err(db_error("Failed to delete gym"))?;

    Ok(result.rows_affected() > 0)
}

/// Add a trainer to the gym roster; returns whether it was absent
///
/// # Errors
///
/// Returns an error if the insert fails
pub async fn add_trainer(
    conn: &mut SqliteConnection,
    gym_id: Uuid,
    trainer_id: Uuid,
) -> AppResult<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO gym_trainers (gym_id, trainer_id, added_at) VALUES ($1, $2, $3)",
    )
    .bind(gym_id.to_string())
    .bind(trainer_id.to_string())
    .bind(Utc::now().to_rfc3339())
    .execute(conn)
    .await
    .map_err(db_error("Failed to add trainer to gym"))?;

    Ok(result.rows_affected() > 0)
}

/// Remove a trainer from the gym roster; returns whether it was present
///
/// # Errors
///
/// Returns an error if the delete fails
pub async fn remove_trainer(
    conn: &mut SqliteConnection,
    gym_id: Uuid,
    trainer_id: Uuid,
) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM gym_trainers WHERE gym_id = $1 AND trainer_id = $2")
        .bind(gym_id.to_string())
        .bind(trainer_id.to_string())
        .execute(conn)
        .await
        .map_err(db_error("Failed to remove trainer from gym"))?;

    Ok(result.rows_affected() > 0)
}

/// Trainer ids currently serving a gym
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn list_trainers(conn: &mut SqliteConnection, gym_id: Uuid) -> AppResult<Vec<Uuid>> {
    let rows =
        sqlx::query("SELECT trainer_id FROM gym_trainers WHERE gym_id = $1 ORDER BY added_at")
            .bind(gym_id.to_string())
            .fetch_all(conn)
            .await
            .map_err(db_error("Failed to list gym trainers"))?;

    rows.iter()
        .map(|row| parse_uuid(&row.get::<String, _>("trainer_id")))
        .collect()
}

fn row_to_gym(row: &SqliteRow) -> AppResult<Gym> {
    let id: String = row.get("id");
    let owner_id: String = row.get("owner_id");
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");
    let trainer_share_bps: Option<i64> = row.get("trainer_share_bps");

    Ok(Gym {
        id: parse_uuid(&id)?,
        owner_id: parse_uuid(&owner_id)?,
        name: row.get("name"),
        status: parse_enum(&status)?,
        is_published: row.get("is_published"),
        pricing: GymPricing {
            mrp: row.get("price_mrp"),
            discounted: row.get("price_discounted"),
            currency: row.get("currency"),
        },
        trainer_share_bps: trainer_share_bps.and_then(|bps| u32::try_from(bps).ok()),
        sponsored_from: parse_optional_timestamp(row.get("sponsored_from"))?,
        sponsored_until: parse_optional_timestamp(row.get("sponsored_until"))?,
        analytics: GymAnalytics {
            memberships: row.get("analytics_memberships"),
            trainers: row.get("analytics_trainers"),
            impressions: row.get("analytics_impressions"),
        },
        trainers: Vec::new(),
        created_at: parse_timestamp(&created_at)?,
    })
}
