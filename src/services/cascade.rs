// ABOUTME: Deletion cascades for users and gym listings, plus counter reconciliation
// ABOUTME: Every cascade runs in one transaction so a failed step leaves nothing half-deleted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Cascade Coordinator
//!
//! Admin-only deletions that fan out across memberships, assignments, rosters,
//! orders, listings, progress records and the ledger. The steps run in a
//! fixed order on the connection of a single transaction.

use serde::Serialize;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::assignments::{end_assignment, Teardown};
use super::memberships::{cancel_membership, leave_effects};
use crate::config::MembershipConfig;
use crate::constants::database::TRANSACTION_MAX_RETRIES;
use crate::database::users::MetricsDelta;
use crate::database::{
    assignments, gyms, listings, memberships, orders, progress, retry_transaction, revenue, users,
    Database,
};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::models::{AssignmentStatus, GymAnalytics, Principal, UserRole};
use crate::policy::RefundPolicy;

/// Counts of what a cascade touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    /// Deleted user or gym
    pub root_id: Uuid,
    /// Memberships moved to cancelled
    pub memberships_cancelled: u64,
    /// Marketplace orders moved to cancelled
    pub orders_cancelled: u64,
    /// Roster entries removed
    pub roster_entries_removed: u64,
    /// Trainer assignments ended or deleted
    pub assignments_ended: u64,
    /// Progress records deleted
    pub progress_records_deleted: u64,
    /// Gyms suspended or deleted
    pub gyms_affected: u64,
    /// Listing subscriptions cancelled or deleted
    pub listings_closed: u64,
    /// Revenue events purged
    pub revenue_events_purged: u64,
}

impl CascadeReport {
    fn new(root_id: Uuid) -> Self {
        Self {
            root_id,
            ..Self::default()
        }
    }

    fn absorb(&mut self, teardown: Teardown) {
        self.memberships_cancelled += teardown.memberships_cancelled;
        self.assignments_ended += 1;
    }
}

/// Admin deletions and repairs
#[derive(Clone)]
pub struct CascadeService {
    database: Database,
    config: MembershipConfig,
}

impl CascadeService {
    /// Create a service over `database` with the given policies
    #[must_use]
    pub const fn new(database: Database, config: MembershipConfig) -> Self {
        Self { database, config }
    }

    /// Delete a user and everything that depends on them
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` unless an admin deletes a different, non-admin
    /// user, `ResourceNotFound` for an unknown user, or the first failing step's
    /// error (nothing is kept in that case)
    pub async fn delete_user(&self, principal: Principal, user_id: Uuid) -> AppResult<CascadeReport> {
        require_admin(principal, "delete_user")?;
        if principal.id == user_id {
            AppLogger::log_authorization_denied(principal.id, "delete_user", "self");
            return Err(AppError::forbidden("Admins cannot delete themselves"));
        }

        let refund = self.config.refund_policy;
        retry_transaction(
            || async move {
                let mut tx = self.database.begin().await?;
                let report = delete_user_in(tx.executor()?, principal, user_id, refund).await?;
                tx.commit().await?;
                Ok(report)
            },
            TRANSACTION_MAX_RETRIES,
        )
        .await
    }

    /// Delete a gym listing and everything tagged with it
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for non-admins, `ResourceNotFound` for an
    /// unknown gym, or the first failing step's error
    pub async fn delete_gym_listing(
        &self,
        principal: Principal,
        gym_id: Uuid,
    ) -> AppResult<CascadeReport> {
        require_admin(principal, "delete_gym_listing")?;

        let refund = self.config.refund_policy;
        retry_transaction(
            || async move {
                let mut tx = self.database.begin().await?;
                let conn = tx.executor()?;
                if gyms::get(&mut *conn, gym_id).await?.is_none() {
                    return Err(AppError::not_found("Gym"));
                }

                let mut report = CascadeReport::new(gym_id);
                teardown_gym(&mut *conn, gym_id, refund, principal.id, &mut report).await?;

                let deleted = listings::delete_for_gym(&mut *conn, gym_id).await?;
                report.listings_closed += deleted;
                AppLogger::log_cascade_step("gym", gym_id, "delete_listings", deleted);

                gyms::delete(conn, gym_id).await?;
                report.gyms_affected += 1;
                AppLogger::log_cascade_step("gym", gym_id, "delete_gym", 1);

                tx.commit().await?;
                Ok(report)
            },
            TRANSACTION_MAX_RETRIES,
        )
        .await
    }

    /// Recompute a gym's counters from memberships and assignments
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for non-admins or `ResourceNotFound` for an
    /// unknown gym
    pub async fn reconcile_gym(&self, principal: Principal, gym_id: Uuid) -> AppResult<GymAnalytics> {
        require_admin(principal, "reconcile_gym")?;

        retry_transaction(
            || async move {
                let mut tx = self.database.begin().await?;
                let conn = tx.executor()?;
                if gyms::get(&mut *conn, gym_id).await?.is_none() {
                    return Err(AppError::not_found("Gym"));
                }
                reconcile_counters(&mut *conn, gym_id).await?;
                let gym = gyms::get(conn, gym_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Gym"))?;
                tx.commit().await?;
                Ok(gym.analytics)
            },
            TRANSACTION_MAX_RETRIES,
        )
        .await
    }
}

fn require_admin(principal: Principal, action: &str) -> AppResult<()> {
    principal.require_admin().inspect_err(|_| {
        AppLogger::log_authorization_denied(principal.id, action, "admin");
    })
}

async fn delete_user_in(
    conn: &mut SqliteConnection,
    principal: Principal,
    user_id: Uuid,
    refund: RefundPolicy,
) -> AppResult<CascadeReport> {
    let user = users::get(&mut *conn, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    if user.role.is_admin() {
        AppLogger::log_authorization_denied(principal.id, "delete_user", "admin account");
        return Err(AppError::forbidden("Admin accounts cannot be deleted"));
    }

    let actor = principal.id;
    let mut report = CascadeReport::new(user_id);

    for membership in memberships::list_open_for_trainee(&mut *conn, user_id).await? {
        let (_, teardown) = leave_effects(&mut *conn, membership, refund, actor).await?;
        report.memberships_cancelled += 1;
        if let Some(teardown) = teardown {
            report.absorb(teardown);
        }
    }
    AppLogger::log_cascade_step("user", user_id, "cancel_memberships", report.memberships_cancelled);

    report.orders_cancelled = orders::cancel_outstanding_for_user(&mut *conn, user_id).await?;
    AppLogger::log_cascade_step("user", user_id, "cancel_orders", report.orders_cancelled);

    let trainers = assignments::remove_trainee_everywhere(&mut *conn, user_id).await?;
    for trainer_id in &trainers {
        users::adjust_metrics(
            &mut *conn,
            *trainer_id,
            MetricsDelta {
                active_trainees: -1,
                ..MetricsDelta::default()
            },
        )
        .await?;
    }
    report.roster_entries_removed = trainers.len() as u64;
    AppLogger::log_cascade_step("user", user_id, "leave_rosters", report.roster_entries_removed);

    if user.role == UserRole::Trainer {
        // Assignments whose access membership was open are already inactive
        for assignment in assignments::list_for_trainer(&mut *conn, user_id).await? {
            if assignment.status == AssignmentStatus::Inactive {
                continue;
            }
            let teardown = end_assignment(&mut *conn, &assignment, refund, actor).await?;
            report.absorb(teardown);
        }
        report.progress_records_deleted +=
            progress::delete_for_trainer(&mut *conn, user_id).await?;
        AppLogger::log_cascade_step("user", user_id, "end_assignments", report.assignments_ended);
    }

    if user.role == UserRole::GymOwner {
        for gym_id in gyms::list_ids_owned_by(&mut *conn, user_id).await? {
            teardown_gym(&mut *conn, gym_id, refund, actor, &mut report).await?;

            gyms::suspend(&mut *conn, gym_id).await?;
            let cancelled = listings::cancel_open_for_gym(&mut *conn, gym_id).await?;
            report.listings_closed += cancelled;
            reconcile_counters(&mut *conn, gym_id).await?;
            report.gyms_affected += 1;
            AppLogger::log_cascade_step("user", user_id, "suspend_gym", 1);
        }
    }

    users::delete(conn, user_id).await?;
    AppLogger::log_cascade_step("user", user_id, "delete_user", 1);
    Ok(report)
}

/// Remove a gym's assignments, progress, memberships and revenue
async fn teardown_gym(
    conn: &mut SqliteConnection,
    gym_id: Uuid,
    refund: RefundPolicy,
    actor: Uuid,
    report: &mut CascadeReport,
) -> AppResult<()> {
    for assignment in assignments::list_for_gym(&mut *conn, gym_id).await? {
        // Inactive assignments were torn down when they were removed
        if assignment.status == AssignmentStatus::Inactive {
            continue;
        }
        let teardown = end_assignment(&mut *conn, &assignment, refund, actor).await?;
        report.absorb(teardown);
    }
    assignments::delete_for_gym(&mut *conn, gym_id).await?;
    report.progress_records_deleted += progress::delete_for_gym(&mut *conn, gym_id).await?;
    AppLogger::log_cascade_step("gym", gym_id, "remove_assignments", report.assignments_ended);

    let mut cancelled = 0;
    for membership in memberships::list_open_for_gym(&mut *conn, gym_id).await? {
        cancel_membership(&mut *conn, membership, refund, actor).await?;
        cancelled += 1;
    }
    report.memberships_cancelled += cancelled;
    AppLogger::log_cascade_step("gym", gym_id, "cancel_memberships", cancelled);

    let purged = revenue::purge_for_gym(conn, gym_id).await?;
    report.revenue_events_purged += purged;
    AppLogger::log_cascade_step("gym", gym_id, "purge_revenue", purged);
    Ok(())
}

/// Set a gym's counters from the memberships and assignments tables
async fn reconcile_counters(conn: &mut SqliteConnection, gym_id: Uuid) -> AppResult<()> {
    let members = memberships::count_counted_for_gym(&mut *conn, gym_id).await?;
    let trainers = assignments::count_active_for_gym(&mut *conn, gym_id).await?;
    gyms::set_counters(conn, gym_id, members, trainers).await
}
