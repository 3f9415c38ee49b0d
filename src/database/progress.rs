// ABOUTME: Trainer progress record storage
// ABOUTME: Records are removed when their trainer or gym is deleted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::{db_error, parse_timestamp, parse_uuid, Database};
use crate::errors::AppResult;
use crate::models::ProgressRecord;

impl Database {
    pub(super) async fn migrate_progress(&self) -> AppResult<()> {
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS progress_records (
                id TEXT PRIMARY KEY,
                trainer_id TEXT NOT NULL,
                trainee_id TEXT NOT NULL,
                gym_id TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                recorded_at TEXT NOT NULL
            )
            ",
        )
        .await?;

        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_progress_records_trainer ON progress_records(trainer_id)",
        )
        .await?;
        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_progress_records_gym ON progress_records(gym_id)",
        )
        .await
    }

    /// Store a progress record
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_progress_record(&self, record: &ProgressRecord) -> AppResult<Uuid> {
        let mut conn = self.acquire().await?;
        sqlx::query(
            r"
            INSERT INTO progress_records (id, trainer_id, trainee_id, gym_id, notes, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(record.id.to_string())
        .bind(record.trainer_id.to_string())
        .bind(record.trainee_id.to_string())
        .bind(record.gym_id.to_string())
        .bind(&record.notes)
        .bind(record.recorded_at.to_rfc3339())
        .execute(&mut *conn)
        .await
        .map_err(db_error("Failed to create progress record"))?;

        Ok(record.id)
    }

    /// Progress records written by a trainer
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded
    pub async fn list_progress_for_trainer(&self, trainer_id: Uuid) -> AppResult<Vec<ProgressRecord>> {
        let mut conn = self.acquire().await?;
        let rows = sqlx::query(
            r"
            SELECT id, trainer_id, trainee_id, gym_id, notes, recorded_at
            FROM progress_records WHERE trainer_id = $1 ORDER BY recorded_at
            ",
        )
        .bind(trainer_id.to_string())
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("Failed to list progress records"))?;

        rows.iter().map(row_to_record).collect()
    }

    /// Number of progress records kept for a gym
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_progress_for_gym(&self, gym_id: Uuid) -> AppResult<i64> {
        let mut conn = self.acquire().await?;
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM progress_records WHERE gym_id = $1")
                .bind(gym_id.to_string())
                .fetch_one(&mut *conn)
                .await
                .map_err(db_error("Failed to count progress records"))?;

        Ok(count)
    }
}

/// Delete every record a trainer wrote
///
/// # Errors
///
/// Returns an error if the delete fails
pub async fn delete_for_trainer(conn: &mut SqliteConnection, trainer_id: Uuid) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM progress_records WHERE trainer_id = $1")
        .bind(trainer_id.to_string())
        .execute(conn)
        .await
        .map_err(db_error("Failed to delete trainer progress records"))?;

    Ok(result.rows_affected())
}

/// Delete every record kept for a gym
///
/// # Errors
///
/// Returns an error if the delete fails
pub async fn delete_for_gym(conn: &mut SqliteConnection, gym_id: Uuid) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM progress_records WHERE gym_id = $1")
        .bind(gym_id.to_string())
        .execute(conn)
        .await
        .map_err(db_error("Failed to delete gym progress records"))?;

    Ok(result.rows_affected())
}

fn row_to_record(row: &SqliteRow) -> AppResult<ProgressRecord> {
    let id: String = row.get("id");
    let trainer_id: String = row.get("trainer_id");
    let trainee_id: String = row.get("trainee_id");
    let gym_id: String = row.get("gym_id");
    let recorded_at: String = row.get("recorded_at");

    Ok(ProgressRecord {
        id: parse_uuid(&id)?,
        trainer_id: parse_uuid(&trainer_id)?,
        trainee_id: parse_uuid(&trainee_id)?,
        gym_id: parse_uuid(&gym_id)?,
        notes: row.get("notes"),
        recorded_at: parse_timestamp(&recorded_at)?,
    })
}
