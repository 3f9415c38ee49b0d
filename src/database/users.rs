// ABOUTME: User database operations for the membership core
// ABOUTME: Stores marketplace users and applies atomic, zero-floored metric adjustments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::{db_error, parse_enum, parse_timestamp, parse_uuid, Database};
use crate::errors::AppResult;
use crate::models::{User, UserMetrics};

/// Signed changes applied to a user's aggregate metrics in one statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsDelta {
    /// Change to `active_memberships`
    pub active_memberships: i64,
    /// Change to `total_spent`
    pub total_spent: i64,
    /// Change to `active_trainees`
    pub active_trainees: i64,
    /// Change to `total_earnings`
    pub total_earnings: i64,
}

impl MetricsDelta {
    /// Whether the delta changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Database {
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                display_name TEXT,
                role TEXT NOT NULL CHECK (role IN ('trainee', 'trainer', 'gym_owner', 'seller', 'admin')),
                status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'suspended')),
                active_memberships INTEGER NOT NULL DEFAULT 0,
                total_spent INTEGER NOT NULL DEFAULT 0,
                active_trainees INTEGER NOT NULL DEFAULT 0,
                total_earnings INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .await?;

        self.execute_schema("CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)")
            .await
    }

    /// Store a new user
    ///
    /// # Errors
    ///
    /// Returns a conflict if the id or email is taken, or a database error
    pub async fn create_user(&self, user: &User) -> AppResult<Uuid> {
        let mut conn = self.acquire().await?;
        insert(&mut conn, user).await?;
        Ok(user.id)
    }

    /// Get a user by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let mut conn = self.acquire().await?;
        get(&mut conn, user_id).await
    }
}

/// Insert a user row
///
/// # Errors
///
/// Returns a conflict if the id or email is taken, or a database error
pub async fn insert(conn: &mut SqliteConnection, user: &User) -> AppResult<()> {
    sqlx::query(
        r"
        INSERT INTO users (id, email, display_name, role, status, active_memberships,
                           total_spent, active_trainees, total_earnings, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ",
    )
    .bind(user.id.to_string())
    .bind(&user.email)
    .bind(user.display_name.as_deref())
    .bind(user.role.as_str())
    .bind(user.status.as_str())
    .bind(user.metrics.active_memberships)
    .bind(user.metrics.total_spent)
    .bind(user.metrics.active_trainees)
    .bind(user.metrics.total_earnings)
    .bind(user.created_at.to_rfc3339())
    .execute(conn)
    .await
    .map_err(db_error("Failed to create user"))?;

    Ok(())
}

/// Get a user by id
///
/// # Errors
///
/// Returns an error if the query fails or the row cannot be decoded
pub async fn get(conn: &mut SqliteConnection, user_id: Uuid) -> AppResult<Option<User>> {
    let row = sqlx::query(
        r"
        SELECT id, email, display_name, role, status, active_memberships, total_spent,
               active_trainees, total_earnings, created_at
        FROM users WHERE id = $1
        ",
    )
    .bind(user_id.to_string())
    .fetch_optional(conn)
    .await
    .map_err(db_error("Failed to get user"))?;

    row.as_ref().map(row_to_user).transpose()
}

/// Apply a metrics delta; counts never drop below zero
///
/// # Errors
///
/// Returns an error if the update fails
pub async fn adjust_metrics(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    delta: MetricsDelta,
) -> AppResult<()> {
    if delta.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r"
        UPDATE users SET
            active_memberships = MAX(active_memberships + $2, 0),
            total_spent = MAX(total_spent + $3, 0),
            active_trainees = MAX(active_trainees + $4, 0),
            total_earnings = MAX(total_earnings + $5, 0)
        WHERE id = $1
        ",
    )
    .bind(user_id.to_string())
    .bind(delta.active_memberships)
    .bind(delta.total_spent)
    .bind(delta.active_trainees)
    .bind(delta.total_earnings)
    .execute(conn)
    .await
    .map_err(db_error("Failed to adjust user metrics"))?;

    Ok(())
}

/// Hard-delete a user row
///
/// # Errors
///
/// Returns an error if the delete fails
pub async fn delete(conn: &mut SqliteConnection, user_id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id.to_string())
        .execute(conn)
        .await
        .map_err(db_error("Failed to delete user"))?;

    Ok(result.rows_affected() > 0)
}

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let id: String = row.get("id");
    let role: String = row.get("role");
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");

    Ok(User {
        id: parse_uuid(&id)?,
        email: row.get("email"),
        display_name: row.get("display_name"),
        role: parse_enum(&role)?,
        status: parse_enum(&status)?,
        metrics: UserMetrics {
            active_memberships: row.get("active_memberships"),
            total_spent: row.get("total_spent"),
            active_trainees: row.get("active_trainees"),
            total_earnings: row.get("total_earnings"),
        },
        created_at: parse_timestamp(&created_at)?,
    })
}
