// ABOUTME: Trainer assignment database operations
// ABOUTME: One assignment per (trainer, gym) plus a roster table written with true upserts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::{
    db_error, parse_enum, parse_optional_timestamp, parse_string_list, parse_timestamp,
    parse_uuid, Database,
};
use crate::errors::{AppError, AppResult};
use crate::models::{AssignmentStatus, RosterEntry, RosterStatus, TrainerAssignment};

const SELECT_COLUMNS: &str = r"
    SELECT id, trainer_id, gym_id, status, requested_at, approved_at, created_at, updated_at
    FROM trainer_assignments
";

impl Database {
    pub(super) async fn migrate_assignments(&self) -> AppResult<()> {
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS trainer_assignments (
                id TEXT PRIMARY KEY,
                trainer_id TEXT NOT NULL,
                gym_id TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('pending', 'active', 'inactive')),
                requested_at TEXT NOT NULL,
                approved_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (trainer_id, gym_id)
            )
            ",
        )
        .await?;

        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS roster_entries (
                assignment_id TEXT NOT NULL REFERENCES trainer_assignments(id) ON DELETE CASCADE,
                trainee_id TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('active', 'paused', 'completed')),
                assigned_at TEXT NOT NULL,
                goals TEXT NOT NULL DEFAULT '[]',
                PRIMARY KEY (assignment_id, trainee_id)
            )
            ",
        )
        .await?;

        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_trainer_assignments_gym ON trainer_assignments(gym_id)",
        )
        .await?;
        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_roster_entries_trainee ON roster_entries(trainee_id)",
        )
        .await
    }

    /// Get an assignment with its roster
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded
    pub async fn get_assignment(&self, assignment_id: Uuid) -> AppResult<Option<TrainerAssignment>> {
        let mut conn = self.acquire().await?;
        get(&mut conn, assignment_id).await
    }

    /// Get the assignment of a trainer at a gym
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded
    pub async fn get_assignment_for(
        &self,
        trainer_id: Uuid,
        gym_id: Uuid,
    ) -> AppResult<Option<TrainerAssignment>> {
        let mut conn = self.acquire().await?;
        find(&mut conn, trainer_id, gym_id).await
    }
}

/// Create or reopen the assignment of a trainer at a gym as `pending`
///
/// An existing pending or inactive row is moved to pending with a fresh
/// `requested_at`; an active row is left untouched. Returns the stored row.
///
/// # Errors
///
/// Returns an error if the upsert fails
pub async fn upsert_request(
    conn: &mut SqliteConnection,
    trainer_id: Uuid,
    gym_id: Uuid,
    requested_at: DateTime<Utc>,
) -> AppResult<TrainerAssignment> {
    let now = requested_at.to_rfc3339();
    sqlx::query(
        r"
        INSERT INTO trainer_assignments (id, trainer_id, gym_id, status, requested_at,
                                         approved_at, created_at, updated_at)
        VALUES ($1, $2, $3, 'pending', $4, NULL, $4, $4)
        ON CONFLICT (trainer_id, gym_id) DO UPDATE SET
            status = 'pending',
            requested_at = excluded.requested_at,
            approved_at = NULL,
            updated_at = excluded.updated_at
        WHERE trainer_assignments.status <> 'active'
        ",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(trainer_id.to_string())
    .bind(gym_id.to_string())
    .bind(&now)
    .execute(&mut *conn)
    .await
    .map_err(db_error("Failed to upsert trainer assignment"))?;

    find(conn, trainer_id, gym_id)
        .await?
        .ok_or_else(|| AppError::internal("Trainer assignment missing after upsert"))
}

/// Get an assignment with its roster
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded
pub async fn get(
    conn: &mut SqliteConnection,
    assignment_id: Uuid,
) -> AppResult<Option<TrainerAssignment>> {
    let statement = format!("{SELECT_COLUMNS} WHERE id = $1");
    let row = sqlx::query(&statement)
        .bind(assignment_id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to get trainer assignment"))?;

    with_roster(conn, row).await
}

/// Get the assignment of a trainer at a gym, with its roster
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded
pub async fn find(
    conn: &mut SqliteConnection,
    trainer_id: Uuid,
    gym_id: Uuid,
) -> AppResult<Option<TrainerAssignment>> {
    let statement = format!("{SELECT_COLUMNS} WHERE trainer_id = $1 AND gym_id = $2");
    let row = sqlx::query(&statement)
        .bind(trainer_id.to_string())
        .bind(gym_id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to find trainer assignment"))?;

    with_roster(conn, row).await
}

/// All assignments at a gym, with rosters
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded
pub async fn list_for_gym(
    conn: &mut SqliteConnection,
    gym_id: Uuid,
) -> AppResult<Vec<TrainerAssignment>> {
    let statement = format!("{SELECT_COLUMNS} WHERE gym_id = $1 ORDER BY requested_at");
    list_with_rosters(conn, &statement, gym_id).await
}

/// All assignments of a trainer, with rosters
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded
pub async fn list_for_trainer(
    conn: &mut SqliteConnection,
    trainer_id: Uuid,
) -> AppResult<Vec<TrainerAssignment>> {
    let statement = format!("{SELECT_COLUMNS} WHERE trainer_id = $1 ORDER BY requested_at");
    list_with_rosters(conn, &statement, trainer_id).await
}

/// Persist status and approval time
///
/// # Errors
///
/// Returns an error if the update fails
pub async fn update_status(
    conn: &mut SqliteConnection,
    assignment_id: Uuid,
    status: AssignmentStatus,
    approved_at: Option<DateTime<Utc>>,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE trainer_assignments SET status = $2, approved_at = $3, updated_at = $4 WHERE id = $1",
    )
    .bind(assignment_id.to_string())
    .bind(status.as_str())
    .bind(approved_at.map(|d| d.to_rfc3339()))
    .bind(Utc::now().to_rfc3339())
    .execute(conn)
    .await
    .map_err(db_error("Failed to update trainer assignment"))?;

    Ok(())
}

/// Hard-delete an assignment; its roster goes with it
///
/// # Errors
///
/// Returns an error if the delete fails
pub async fn delete(conn: &mut SqliteConnection, assignment_id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM trainer_assignments WHERE id = $1")
        .bind(assignment_id.to_string())
        .execute(conn)
        .await
        .map_err(db_error("Failed to delete trainer assignment"))?;

    Ok(result.rows_affected() > 0)
}

/// Hard-delete every assignment at a gym
///
/// # Errors
///
/// Returns an error if the delete fails
pub async fn delete_for_gym(conn: &mut SqliteConnection, gym_id: Uuid) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM trainer_assignments WHERE gym_id = $1")
        .bind(gym_id.to_string())
        .execute(conn)
        .await
        .map_err(db_error("Failed to delete gym assignments"))?;

    Ok(result.rows_affected())
}

/// Number of active assignments at a gym
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn count_active_for_gym(conn: &mut SqliteConnection, gym_id: Uuid) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM trainer_assignments WHERE gym_id = $1 AND status = 'active'",
    )
    .bind(gym_id.to_string())
    .fetch_one(conn)
    .await
    .map_err(db_error("Failed to count gym trainers"))?;

    Ok(count)
}

// ============================================================================
// Roster
// ============================================================================

/// Insert a roster entry or reopen an existing one in a single statement
///
/// An existing entry takes the new status and `assigned_at` but keeps its goals.
///
/// # Errors
///
/// Returns an error if the upsert fails
pub async fn upsert_roster_entry(
    conn: &mut SqliteConnection,
    assignment_id: Uuid,
    entry: &RosterEntry,
) -> AppResult<()> {
    sqlx::query(
        r"
        INSERT INTO roster_entries (assignment_id, trainee_id, status, assigned_at, goals)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (assignment_id, trainee_id) DO UPDATE SET
            status = excluded.status,
            assigned_at = excluded.assigned_at
        ",
    )
    .bind(assignment_id.to_string())
    .bind(entry.trainee_id.to_string())
    .bind(entry.status.as_str())
    .bind(entry.assigned_at.to_rfc3339())
    .bind(serde_json::to_string(&entry.goals)?)
    .execute(conn)
    .await
    .map_err(db_error("Failed to upsert roster entry"))?;

    Ok(())
}

/// Status of a trainee in a roster, if present
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn roster_status(
    conn: &mut SqliteConnection,
    assignment_id: Uuid,
    trainee_id: Uuid,
) -> AppResult<Option<RosterStatus>> {
    let status: Option<String> = sqlx::query_scalar(
        "SELECT status FROM roster_entries WHERE assignment_id = $1 AND trainee_id = $2",
    )
    .bind(assignment_id.to_string())
    .bind(trainee_id.to_string())
    .fetch_optional(conn)
    .await
    .map_err(db_error("Failed to read roster entry"))?;

    status.as_deref().map(parse_enum).transpose()
}

/// Change only the status of a roster entry
///
/// # Errors
///
/// Returns an error if the update fails
pub async fn set_roster_status(
    conn: &mut SqliteConnection,
    assignment_id: Uuid,
    trainee_id: Uuid,
    status: RosterStatus,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE roster_entries SET status = $3 WHERE assignment_id = $1 AND trainee_id = $2",
    )
    .bind(assignment_id.to_string())
    .bind(trainee_id.to_string())
    .bind(status.as_str())
    .execute(conn)
    .await
    .map_err(db_error("Failed to update roster entry"))?;

    Ok(())
}

/// Empty a roster; returns how many removed entries were active or paused
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn clear_roster(conn: &mut SqliteConnection, assignment_id: Uuid) -> AppResult<i64> {
    let counted: i64 = sqlx::query_scalar(
        r"
        SELECT COUNT(*) FROM roster_entries
        WHERE assignment_id = $1 AND status IN ('active', 'paused')
        ",
    )
    .bind(assignment_id.to_string())
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error("Failed to count roster entries"))?;

    sqlx::query("DELETE FROM roster_entries WHERE assignment_id = $1")
        .bind(assignment_id.to_string())
        .execute(conn)
        .await
        .map_err(db_error("Failed to clear roster"))?;

    Ok(counted)
}

/// Remove a trainee from every roster
///
/// Returns the trainers whose roster lost an active or paused entry, one item
/// per lost entry.
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn remove_trainee_everywhere(
    conn: &mut SqliteConnection,
    trainee_id: Uuid,
) -> AppResult<Vec<Uuid>> {
    let rows = sqlx::query(
        r"
        SELECT a.trainer_id FROM roster_entries r
        JOIN trainer_assignments a ON a.id = r.assignment_id
        WHERE r.trainee_id = $1 AND r.status IN ('active', 'paused')
        ",
    )
    .bind(trainee_id.to_string())
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error("Failed to find trainee roster entries"))?;

    let trainers = rows
        .iter()
        .map(|row| parse_uuid(&row.get::<String, _>("trainer_id")))
        .collect::<AppResult<Vec<_>>>()?;

    sqlx::query("DELETE FROM roster_entries WHERE trainee_id = $1")
        .bind(trainee_id.to_string())
        .execute(conn)
        .await
        .map_err(db_error("Failed to remove trainee from rosters"))?;

    Ok(trainers)
}

async fn load_roster(conn: &mut SqliteConnection, assignment_id: Uuid) -> AppResult<Vec<RosterEntry>> {
    let rows = sqlx::query(
        r"
        SELECT trainee_id, status, assigned_at, goals FROM roster_entries
        WHERE assignment_id = $1 ORDER BY assigned_at
        ",
    )
    .bind(assignment_id.to_string())
    .fetch_all(conn)
    .await
    .map_err(db_error("Failed to load roster"))?;

    rows.iter().map(row_to_roster_entry).collect()
}

async fn with_roster(
    conn: &mut SqliteConnection,
    row: Option<SqliteRow>,
) -> AppResult<Option<TrainerAssignment>> {
    let Some(row) = row else {
        return Ok(None);
    };
    let mut assignment = row_to_assignment(&row)?;
    assignment.trainees = load_roster(conn, assignment.id).await?;
    Ok(Some(assignment))
}

async fn list_with_rosters(
    conn: &mut SqliteConnection,
    statement: &str,
    id: Uuid,
) -> AppResult<Vec<TrainerAssignment>> {
    let rows = sqlx::query(statement)
        .bind(id.to_string())
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("Failed to list trainer assignments"))?;

    let mut assignments = rows
        .iter()
        .map(row_to_assignment)
        .collect::<AppResult<Vec<_>>>()?;
    for assignment in &mut assignments {
        assignment.trainees = load_roster(conn, assignment.id).await?;
    }
    Ok(assignments)
}

fn row_to_assignment(row: &SqliteRow) -> AppResult<TrainerAssignment> {
    let id: String = row.get("id");
    let trainer_id: String = row.get("trainer_id");
    let gym_id: String = row.get("gym_id");
    let status: String = row.get("status");
    let requested_at: String = row.get("requested_at");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(TrainerAssignment {
        id: parse_uuid(&id)?,
        trainer_id: parse_uuid(&trainer_id)?,
        gym_id: parse_uuid(&gym_id)?,
        status: parse_enum(&status)?,
        requested_at: parse_timestamp(&requested_at)?,
        approved_at: parse_optional_timestamp(row.get("approved_at"))?,
        trainees: Vec::new(),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn row_to_roster_entry(row: &SqliteRow) -> AppResult<RosterEntry> {
    let trainee_id: String = row.get("trainee_id");
    let status: String = row.get("status");
    let assigned_at: String = row.get("assigned_at");
    let goals: String = row.get("goals");

    Ok(RosterEntry {
        trainee_id: parse_uuid(&trainee_id)?,
        status: parse_enum(&status)?,
        assigned_at: parse_timestamp(&assigned_at)?,
        goals: parse_string_list(&goals)?,
    })
}
