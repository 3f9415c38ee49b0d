// ABOUTME: Membership database operations
// ABOUTME: Membership rows guarded by a partial unique index over non-terminal statuses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::{
    db_error, parse_enum, parse_optional_uuid, parse_string_list, parse_timestamp, parse_uuid,
    Database,
};
use crate::errors::AppResult;
use crate::models::{Billing, Membership, MembershipStatus, PlanCategory};

const SELECT_COLUMNS: &str = r"
    SELECT id, trainee_id, gym_id, plan, status, start_date, end_date, auto_renew,
           billing_amount, billing_currency, payment_reference, billing_status,
           trainer_id, benefits, created_at, updated_at
    FROM memberships
";

const OPEN_STATUSES: &str = "('pending', 'active', 'paused')";

impl Database {
    pub(super) async fn migrate_memberships(&self) -> AppResult<()> {
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS memberships (
                id TEXT PRIMARY KEY,
                trainee_id TEXT NOT NULL,
                gym_id TEXT NOT NULL,
                plan TEXT NOT NULL CHECK (plan IN ('monthly', 'trainer_access')),
                plan_category TEXT NOT NULL CHECK (plan_category IN ('ordinary', 'trainer_access')),
                status TEXT NOT NULL CHECK (status IN ('pending', 'active', 'paused', 'cancelled', 'expired')),
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                auto_renew INTEGER NOT NULL DEFAULT 0,
                billing_amount INTEGER NOT NULL DEFAULT 0 CHECK (billing_amount >= 0),
                billing_currency TEXT NOT NULL,
                payment_reference TEXT,
                billing_status TEXT NOT NULL CHECK (billing_status IN ('unpaid', 'paid', 'refunded')),
                trainer_id TEXT,
                benefits TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .await?;

        // At most one open membership per (trainee, gym, plan category)
        self.execute_schema(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_memberships_open
            ON memberships(trainee_id, gym_id, plan_category)
            WHERE status IN ('pending', 'active', 'paused')
            ",
        )
        .await?;

        // A payment reference backs at most one membership
        self.execute_schema(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_memberships_payment_reference
            ON memberships(payment_reference)
            WHERE payment_reference IS NOT NULL
            ",
        )
        .await?;

        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_memberships_gym ON memberships(gym_id, status)",
        )
        .await?;
        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_memberships_trainer ON memberships(trainer_id, gym_id)",
        )
        .await
    }

    /// Get a membership by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded
    pub async fn get_membership(&self, membership_id: Uuid) -> AppResult<Option<Membership>> {
        let mut conn = self.acquire().await?;
        get(&mut conn, membership_id).await
    }

    /// All memberships at a gym, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded
    pub async fn list_memberships_for_gym(&self, gym_id: Uuid) -> AppResult<Vec<Membership>> {
        let mut conn = self.acquire().await?;
        list_for_gym(&mut conn, gym_id).await
    }

    /// All memberships held by a user, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded
    pub async fn list_memberships_for_trainee(
        &self,
        trainee_id: Uuid,
    ) -> AppResult<Vec<Membership>> {
        let mut conn = self.acquire().await?;
        let statement = format!("{SELECT_COLUMNS} WHERE trainee_id = $1 ORDER BY created_at DESC");
        fetch_many(&mut conn, &statement, &[trainee_id]).await
    }
}

/// Insert a membership
///
/// # Errors
///
/// Returns a conflict when the open-membership or payment-reference index is
/// violated, or a database error
pub async fn insert(conn: &mut SqliteConnection, membership: &Membership) -> AppResult<()> {
    sqlx::query(
        r"
        INSERT INTO memberships (id, trainee_id, gym_id, plan, plan_category, status, start_date,
                                 end_date, auto_renew, billing_amount, billing_currency,
                                 payment_reference, billing_status, trainer_id, benefits,
                                 created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        ",
    )
    .bind(membership.id.to_string())
    .bind(membership.trainee_id.to_string())
    .bind(membership.gym_id.to_string())
    .bind(membership.plan.as_str())
    .bind(membership.category().as_str())
    .bind(membership.status.as_str())
    .bind(membership.start_date.to_rfc3339())
    .bind(membership.end_date.to_rfc3339())
    .bind(membership.auto_renew)
    .bind(membership.billing.amount)
    .bind(&membership.billing.currency)
    .bind(membership.billing.payment_reference.as_deref())
    .bind(membership.billing.status.as_str())
    .bind(membership.trainer_id.map(|id| id.to_string()))
    .bind(serde_json::to_string(&membership.benefits)?)
    .bind(membership.created_at.to_rfc3339())
    .bind(membership.updated_at.to_rfc3339())
    .execute(conn)
    .await
    .map_err(db_error("Failed to create membership"))?;

    Ok(())
}

/// Persist the lifecycle fields of a membership
///
/// # Errors
///
/// Returns a conflict if reopening would violate the open-membership index, or a
/// database error
pub async fn update_lifecycle(conn: &mut SqliteConnection, membership: &Membership) -> AppResult<()> {
    sqlx::query(
        r"
        UPDATE memberships SET
            status = $2, start_date = $3, end_date = $4, auto_renew = $5,
            billing_status = $6, updated_at = $7
        WHERE id = $1
        ",
    )
    .bind(membership.id.to_string())
    .bind(membership.status.as_str())
    .bind(membership.start_date.to_rfc3339())
    .bind(membership.end_date.to_rfc3339())
    .bind(membership.auto_renew)
    .bind(membership.billing.status.as_str())
    .bind(membership.updated_at.to_rfc3339())
    .execute(conn)
    .await
    .map_err(db_error("Failed to update membership"))?;

    Ok(())
}

/// Get a membership by id
///
/// # Errors
///
/// Returns an error if the query fails or the row cannot be decoded
pub async fn get(conn: &mut SqliteConnection, membership_id: Uuid) -> AppResult<Option<Membership>> {
    let statement = format!("{SELECT_COLUMNS} WHERE id = $1");
    let row = sqlx::query(&statement)
        .bind(membership_id.to_string())
        .fetch_optional(conn)
        .await
        .map_err(db_error("Failed to get membership"))?;

    row.as_ref().map(row_to_membership).transpose()
}

/// The open membership of a user at a gym within one plan category
///
/// # Errors
///
/// Returns an error if the query fails or the row cannot be decoded
pub async fn find_open(
    conn: &mut SqliteConnection,
    trainee_id: Uuid,
    gym_id: Uuid,
    category: PlanCategory,
) -> AppResult<Option<Membership>> {
    let statement = format!(
        "{SELECT_COLUMNS} WHERE trainee_id = $1 AND gym_id = $2 AND plan_category = $3 \
         AND status IN {OPEN_STATUSES}"
    );
    let row = sqlx::query(&statement)
        .bind(trainee_id.to_string())
        .bind(gym_id.to_string())
        .bind(category.as_str())
        .fetch_optional(conn)
        .await
        .map_err(db_error("Failed to find open membership"))?;

    row.as_ref().map(row_to_membership).transpose()
}

/// Every open membership a user holds, any gym, any category
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded
pub async fn list_open_for_trainee(
    conn: &mut SqliteConnection,
    trainee_id: Uuid,
) -> AppResult<Vec<Membership>> {
    let statement = format!(
        "{SELECT_COLUMNS} WHERE trainee_id = $1 AND status IN {OPEN_STATUSES} ORDER BY created_at"
    );
    fetch_many(conn, &statement, &[trainee_id]).await
}

/// Every open membership at a gym, any category
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded
pub async fn list_open_for_gym(
    conn: &mut SqliteConnection,
    gym_id: Uuid,
) -> AppResult<Vec<Membership>> {
    let statement = format!(
        "{SELECT_COLUMNS} WHERE gym_id = $1 AND status IN {OPEN_STATUSES} ORDER BY created_at"
    );
    fetch_many(conn, &statement, &[gym_id]).await
}

/// Open ordinary memberships served by a trainer at a gym
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded
pub async fn list_open_served_by(
    conn: &mut SqliteConnection,
    trainer_id: Uuid,
    gym_id: Uuid,
) -> AppResult<Vec<Membership>> {
    let statement = format!(
        "{SELECT_COLUMNS} WHERE trainer_id = $1 AND gym_id = $2 AND plan_category = 'ordinary' \
         AND status IN {OPEN_STATUSES} ORDER BY created_at"
    );
    fetch_many(conn, &statement, &[trainer_id, gym_id]).await
}

/// All memberships at a gym, newest first
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded
pub async fn list_for_gym(conn: &mut SqliteConnection, gym_id: Uuid) -> AppResult<Vec<Membership>> {
    let statement = format!("{SELECT_COLUMNS} WHERE gym_id = $1 ORDER BY created_at DESC");
    fetch_many(conn, &statement, &[gym_id]).await
}

/// Number of active or paused ordinary memberships at a gym
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn count_counted_for_gym(conn: &mut SqliteConnection, gym_id: Uuid) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar(
        r"
        SELECT COUNT(*) FROM memberships
        WHERE gym_id = $1 AND plan_category = 'ordinary' AND status IN ('active', 'paused')
        ",
    )
    .bind(gym_id.to_string())
    .fetch_one(conn)
    .await
    .map_err(db_error("Failed to count gym memberships"))?;

    Ok(count)
}

async fn fetch_many(
    conn: &mut SqliteConnection,
    statement: &str,
    ids: &[Uuid],
) -> AppResult<Vec<Membership>> {
    let mut query = sqlx::query(statement);
    for id in ids {
        query = query.bind(id.to_string());
    }
    let rows = query
        .fetch_all(conn)
        .await
        .map_err(db_error("Failed to list memberships"))?;

    rows.iter().map(row_to_membership).collect()
}

fn row_to_membership(row: &SqliteRow) -> AppResult<Membership> {
    let id: String = row.get("id");
    let trainee_id: String = row.get("trainee_id");
    let gym_id: String = row.get("gym_id");
    let plan: String = row.get("plan");
    let status: String = row.get("status");
    let billing_status: String = row.get("billing_status");
    let start_date: String = row.get("start_date");
    let end_date: String = row.get("end_date");
    let benefits: String = row.get("benefits");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let status: MembershipStatus = parse_enum(&status)?;

    Ok(Membership {
        id: parse_uuid(&id)?,
        trainee_id: parse_uuid(&trainee_id)?,
        gym_id: parse_uuid(&gym_id)?,
        plan: parse_enum(&plan)?,
        status,
        start_date: parse_timestamp(&start_date)?,
        end_date: parse_timestamp(&end_date)?,
        auto_renew: row.get("auto_renew"),
        billing: Billing {
            amount: row.get("billing_amount"),
            currency: row.get("billing_currency"),
            payment_reference: row.get("payment_reference"),
            status: parse_enum(&billing_status)?,
        },
        trainer_id: parse_optional_uuid(row.get("trainer_id"))?,
        benefits: parse_string_list(&benefits)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
