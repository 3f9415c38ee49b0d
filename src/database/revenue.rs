// ABOUTME: Append-only revenue ledger storage
// ABOUTME: Inserts events, reads them by payee or gym tag, and purges a gym's events on deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::{db_error, parse_enum, parse_optional_uuid, parse_timestamp, parse_uuid, Database};
use crate::constants::revenue::GYM_ID_METADATA_KEY;
use crate::errors::{AppError, AppResult};
use crate::models::RevenueEvent;

const SELECT_COLUMNS: &str = r"
    SELECT id, amount, currency, payee_id, payer_id, revenue_type, description, metadata, created_at
    FROM revenue_events
";

impl Database {
    pub(super) async fn migrate_revenue(&self) -> AppResult<()> {
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS revenue_events (
                id TEXT PRIMARY KEY,
                amount INTEGER NOT NULL CHECK (amount >= 0),
                currency TEXT NOT NULL,
                payee_id TEXT,
                payer_id TEXT,
                revenue_type TEXT NOT NULL
                    CHECK (revenue_type IN ('membership', 'listing', 'sponsorship', 'marketplace', 'seller')),
                description TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL
            )
            ",
        )
        .await?;

        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_revenue_events_payee ON revenue_events(payee_id)",
        )
        .await?;
        self.execute_schema(
            r"
            CREATE INDEX IF NOT EXISTS idx_revenue_events_gym
            ON revenue_events(json_extract(metadata, '$.gymId'))
            ",
        )
        .await
    }

    /// Ledger events received by a user, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded
    pub async fn list_revenue_for_payee(&self, payee_id: Uuid) -> AppResult<Vec<RevenueEvent>> {
        let mut conn = self.acquire().await?;
        list_for_payee(&mut conn, payee_id).await
    }

    /// Ledger events tagged with a gym, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded
    pub async fn list_revenue_for_gym(&self, gym_id: Uuid) -> AppResult<Vec<RevenueEvent>> {
        let mut conn = self.acquire().await?;
        list_for_gym(&mut conn, gym_id).await
    }

    /// Sum of every amount received by a user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn payee_balance(&self, payee_id: Uuid) -> AppResult<i64> {
        let mut conn = self.acquire().await?;
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM revenue_events WHERE payee_id = $1",
        )
        .bind(payee_id.to_string())
        .fetch_one(&mut *conn)
        .await
        .map_err(db_error("Failed to sum payee revenue"))?;

        Ok(total)
    }
}

/// Append one event
///
/// # Errors
///
/// Returns an error for a negative amount or if the insert fails
pub async fn insert(conn: &mut SqliteConnection, event: &RevenueEvent) -> AppResult<()> {
    if event.amount < 0 {
        return Err(AppError::invalid_input("Revenue amount cannot be negative"));
    }

    sqlx::query(
        r"
        INSERT INTO revenue_events (id, amount, currency, payee_id, payer_id, revenue_type,
                                    description, metadata, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ",
    )
    .bind(event.id.to_string())
    .bind(event.amount)
    .bind(&event.currency)
    .bind(event.payee_id.map(|id| id.to_string()))
    .bind(event.payer_id.map(|id| id.to_string()))
    .bind(event.revenue_type.as_str())
    .bind(&event.description)
    .bind(serde_json::to_string(&event.metadata)?)
    .bind(event.created_at.to_rfc3339())
    .execute(conn)
    .await
    .map_err(db_error("Failed to record revenue event"))?;

    Ok(())
}

/// Events received by a user
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded
pub async fn list_for_payee(
    conn: &mut SqliteConnection,
    payee_id: Uuid,
) -> AppResult<Vec<RevenueEvent>> {
    let statement = format!("{SELECT_COLUMNS} WHERE payee_id = $1 ORDER BY created_at, rowid");
    let rows = sqlx::query(&statement)
        .bind(payee_id.to_string())
        .fetch_all(conn)
        .await
        .map_err(db_error("Failed to list payee revenue"))?;

    rows.iter().map(row_to_event).collect()
}

/// Events whose metadata carries the gym tag
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded
pub async fn list_for_gym(
    conn: &mut SqliteConnection,
    gym_id: Uuid,
) -> AppResult<Vec<RevenueEvent>> {
    let statement = format!(
        "{SELECT_COLUMNS} WHERE json_extract(metadata, '$.{GYM_ID_METADATA_KEY}') = $1 ORDER BY created_at, rowid"
    );
    let rows = sqlx::query(&statement)
        .bind(gym_id.to_string())
        .fetch_all(conn)
        .await
        .map_err(db_error("Failed to list gym revenue"))?;

    rows.iter().map(row_to_event).collect()
}

/// Remove every event tagged with a deleted gym
///
/// Only a gym deletion cascade may call this; the ledger is otherwise
/// append-only.
///
/// # Errors
///
/// Returns an error if the delete fails
pub(crate) async fn purge_for_gym(conn: &mut SqliteConnection, gym_id: Uuid) -> AppResult<u64> {
    let statement = format!(
        "DELETE FROM revenue_events WHERE json_extract(metadata, '$.{GYM_ID_METADATA_KEY}') = $1"
    );
    let result = sqlx::query(&statement)
        .bind(gym_id.to_string())
        .execute(conn)
        .await
        .map_err(db_error("Failed to purge gym revenue"))?;

    Ok(result.rows_affected())
}

fn row_to_event(row: &SqliteRow) -> AppResult<RevenueEvent> {
    let id: String = row.get("id");
    let revenue_type: String = row.get("revenue_type");
    let metadata: String = row.get("metadata");
    let created_at: String = row.get("created_at");

    Ok(RevenueEvent {
        id: parse_uuid(&id)?,
        amount: row.get("amount"),
        currency: row.get("currency"),
        payee_id: parse_optional_uuid(row.get("payee_id"))?,
        payer_id: parse_optional_uuid(row.get("payer_id"))?,
        revenue_type: parse_enum(&revenue_type)?,
        description: row.get("description"),
        metadata: serde_json::from_str(&metadata)
            .map_err(|e| AppError::database(format!("Invalid revenue metadata: {e}")))?,
        created_at: parse_timestamp(&created_at)?,
    })
}
