// ABOUTME: Trainer assignment registry: owner approval, decline, removal and reads
// ABOUTME: Holds the shared teardown that ends an assignment and everything hanging off it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::memberships::cancel_membership;
use crate::config::MembershipConfig;
use crate::constants::database::TRANSACTION_MAX_RETRIES;
use crate::database::gyms::GymCounter;
use crate::database::users::MetricsDelta;
use crate::database::{assignments, gyms, memberships, retry_transaction, users, Database};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::models::{
    window_end, AssignmentStatus, Billing, BillingStatus, Gym, Membership, MembershipPlan,
    MembershipStatus, PlanCategory, Principal, TrainerAssignment,
};
use crate::policy::RefundPolicy;

/// What ending an assignment touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Teardown {
    /// Ordinary and trainer-access memberships cancelled
    pub memberships_cancelled: u64,
    /// Counted roster entries cleared from the roster
    pub trainees_released: u64,
}

/// Owner-facing operations on trainer assignments
#[derive(Clone)]
pub struct AssignmentService {
    database: Database,
    config: MembershipConfig,
}

impl AssignmentService {
    /// Create a service over `database` with the given policies
    #[must_use]
    pub const fn new(database: Database, config: MembershipConfig) -> Self {
        Self { database, config }
    }

    /// Approve a pending request; approving an active assignment changes nothing
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound`, `PermissionDenied` unless the principal owns the
    /// gym, or `InvalidStateTransition` for an inactive assignment
    pub async fn approve(
        &self,
        principal: Principal,
        assignment_id: Uuid,
    ) -> AppResult<TrainerAssignment> {
        let months = self.config.trainer_access_period_months;
        let currency = &self.config.default_currency;
        retry_transaction(
            || async move {
                let mut tx = self.database.begin().await?;
                let conn = tx.executor()?;
                let (assignment, gym) =
                    load_owned(&mut *conn, principal, assignment_id, "approve").await?;

                match assignment.status {
                    AssignmentStatus::Active => {
                        tx.commit().await?;
                        return Ok(assignment);
                    }
                    AssignmentStatus::Inactive => {
                        return Err(AppError::invalid_transition(
                            "trainer assignment",
                            assignment.status,
                            AssignmentStatus::Active,
                        ));
                    }
                    AssignmentStatus::Pending => {}
                }

                let now = Utc::now();
                let status = assignment.status.transition_to(AssignmentStatus::Active)?;
                assignments::update_status(&mut *conn, assignment.id, status, Some(now)).await?;
                grant_access(&mut *conn, &assignment, &gym, months, currency).await?;
                gyms::adjust_counter(&mut *conn, gym.id, GymCounter::Trainers, 1).await?;
                gyms::add_trainer(&mut *conn, gym.id, assignment.trainer_id).await?;

                let approved = assignments::get(conn, assignment.id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Trainer assignment"))?;
                tx.commit().await?;

                AppLogger::log_assignment_transition(
                    approved.id,
                    gym.id,
                    approved.trainer_id,
                    AssignmentStatus::Pending.as_str(),
                    approved.status.as_str(),
                );
                Ok(approved)
            },
            TRANSACTION_MAX_RETRIES,
        )
        .await
    }

    /// Decline a pending request, deleting the assignment
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound`, `PermissionDenied`, or `InvalidStateTransition`
    /// when the assignment is not pending
    pub async fn decline(&self, principal: Principal, assignment_id: Uuid) -> AppResult<()> {
        let refund = self.config.refund_policy;
        retry_transaction(
            || async move {
                let mut tx = self.database.begin().await?;
                let conn = tx.executor()?;
                let (assignment, gym) =
                    load_owned(&mut *conn, principal, assignment_id, "decline").await?;

                if assignment.status != AssignmentStatus::Pending {
                    return Err(AppError::invalid_transition(
                        "trainer assignment",
                        assignment.status,
                        "declined",
                    ));
                }

                assignments::delete(&mut *conn, assignment.id).await?;
                if let Some(access) = memberships::find_open(
                    &mut *conn,
                    assignment.trainer_id,
                    gym.id,
                    PlanCategory::TrainerAccess,
                )
                .await?
                {
                    cancel_membership(conn, access, refund, principal.id).await?;
                }
                tx.commit().await?;

                AppLogger::log_assignment_transition(
                    assignment.id,
                    gym.id,
                    assignment.trainer_id,
                    AssignmentStatus::Pending.as_str(),
                    "deleted",
                );
                Ok(())
            },
            TRANSACTION_MAX_RETRIES,
        )
        .await
    }

    /// Remove an approved trainer from the gym; removing twice changes nothing
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound`, `PermissionDenied`, or `InvalidStateTransition`
    /// for a pending assignment (decline it instead)
    pub async fn remove(
        &self,
        principal: Principal,
        assignment_id: Uuid,
    ) -> AppResult<TrainerAssignment> {
        let refund = self.config.refund_policy;
        retry_transaction(
            || async move {
                let mut tx = self.database.begin().await?;
                let conn = tx.executor()?;
                let (assignment, _gym) =
                    load_owned(&mut *conn, principal, assignment_id, "remove").await?;

                match assignment.status {
                    AssignmentStatus::Inactive => {
                        tx.commit().await?;
                        return Ok(assignment);
                    }
                    AssignmentStatus::Pending => {
                        return Err(AppError::invalid_transition(
                            "trainer assignment",
                            assignment.status,
                            AssignmentStatus::Inactive,
                        )
                        .with_details(serde_json::json!({ "hint": "decline pending requests" })));
                    }
                    AssignmentStatus::Active => {}
                }

                end_assignment(&mut *conn, &assignment, refund, principal.id).await?;
                let removed = assignments::get(conn, assignment.id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Trainer assignment"))?;
                tx.commit().await?;
                Ok(removed)
            },
            TRANSACTION_MAX_RETRIES,
        )
        .await
    }

    /// Read one assignment with its roster
    ///
    /// Visible to the gym owner, the trainer and admins.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` or `PermissionDenied`
    pub async fn get(
        &self,
        principal: Principal,
        assignment_id: Uuid,
    ) -> AppResult<TrainerAssignment> {
        let mut conn = self.database.acquire().await?;
        let assignment = assignments::get(&mut conn, assignment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Trainer assignment"))?;
        if principal.is_admin() || principal.id == assignment.trainer_id {
            return Ok(assignment);
        }
        let owns_gym = gyms::get(&mut conn, assignment.gym_id)
            .await?
            .is_some_and(|gym| gym.is_owned_by(principal.id));
        if !owns_gym {
            AppLogger::log_authorization_denied(principal.id, "read", "trainer assignment");
            return Err(AppError::forbidden(
                "Only the gym owner or the trainer can read this assignment",
            ));
        }
        Ok(assignment)
    }

    /// Every assignment at a gym, for the owner dashboard
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown gym or `PermissionDenied` for
    /// anyone but the owner and admins
    pub async fn list_for_gym(
        &self,
        principal: Principal,
        gym_id: Uuid,
    ) -> AppResult<Vec<TrainerAssignment>> {
        let mut conn = self.database.acquire().await?;
        let gym = gyms::get(&mut conn, gym_id)
            .await?
            .ok_or_else(|| AppError::not_found("Gym"))?;
        if !principal.is_admin() && !gym.is_owned_by(principal.id) {
            AppLogger::log_authorization_denied(principal.id, "list", "trainer assignments");
            return Err(AppError::forbidden(
                "Only the gym owner can list its trainer assignments",
            ));
        }
        assignments::list_for_gym(&mut conn, gym_id).await
    }
}

/// Load an assignment and its gym, requiring the principal to own the gym
async fn load_owned(
    conn: &mut SqliteConnection,
    principal: Principal,
    assignment_id: Uuid,
    action: &str,
) -> AppResult<(TrainerAssignment, Gym)> {
    let assignment = assignments::get(&mut *conn, assignment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Trainer assignment"))?;
    let gym = gyms::get(conn, assignment.gym_id)
        .await?
        .ok_or_else(|| AppError::not_found("Gym"))?;

    if !gym.is_owned_by(principal.id) {
        AppLogger::log_authorization_denied(principal.id, action, "trainer assignment");
        return Err(AppError::forbidden(
            "Only the gym owner can manage its trainer assignments",
        ));
    }
    Ok((assignment, gym))
}

/// Activate the trainer's access membership, creating one if none is open
async fn grant_access(
    conn: &mut SqliteConnection,
    assignment: &TrainerAssignment,
    gym: &Gym,
    months: u32,
    default_currency: &str,
) -> AppResult<Membership> {
    let now = Utc::now();
    let end_date = window_end(now, months)?;
    let open = memberships::find_open(
        &mut *conn,
        assignment.trainer_id,
        gym.id,
        PlanCategory::TrainerAccess,
    )
    .await?;

    if let Some(mut membership) = open {
        let previous = membership.status;
        if previous != MembershipStatus::Active {
            membership.status = previous.transition_to(MembershipStatus::Active)?;
        }
        membership.start_date = now;
        membership.end_date = end_date;
        membership.updated_at = now;
        memberships::update_lifecycle(conn, &membership).await?;
        AppLogger::log_membership_transition(
            membership.id,
            gym.id,
            previous.as_str(),
            membership.status.as_str(),
            gym.owner_id,
        );
        return Ok(membership);
    }

    let currency = if gym.pricing.currency.trim().is_empty() {
        default_currency.to_owned()
    } else {
        gym.pricing.currency.clone()
    };
    let membership = Membership {
        id: Uuid::new_v4(),
        trainee_id: assignment.trainer_id,
        gym_id: gym.id,
        plan: MembershipPlan::TrainerAccess,
        status: MembershipStatus::Active,
        start_date: now,
        end_date,
        auto_renew: false,
        billing: Billing {
            amount: 0,
            currency,
            payment_reference: None,
            status: BillingStatus::Unpaid,
        },
        trainer_id: None,
        benefits: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    memberships::insert(conn, &membership).await?;
    AppLogger::log_membership_transition(
        membership.id,
        gym.id,
        "none",
        membership.status.as_str(),
        gym.owner_id,
    );
    Ok(membership)
}

/// End a trainer's assignment at a gym and everything that depends on it
///
/// An active assignment gives back its gym trainer slot. The assignment becomes
/// inactive, every open ordinary membership the trainer serves there is
/// cancelled, the roster is cleared and the trainer's own access membership is
/// cancelled. Running it on an inactive assignment is harmless.
///
/// # Errors
///
/// Returns an error if any step fails
pub(crate) async fn end_assignment(
    conn: &mut SqliteConnection,
    assignment: &TrainerAssignment,
    refund: RefundPolicy,
    actor: Uuid,
) -> AppResult<Teardown> {
    let mut teardown = Teardown::default();
    let (trainer_id, gym_id) = (assignment.trainer_id, assignment.gym_id);

    if assignment.status == AssignmentStatus::Active {
        gyms::adjust_counter(&mut *conn, gym_id, GymCounter::Trainers, -1).await?;
        gyms::remove_trainer(&mut *conn, gym_id, trainer_id).await?;
    }
    if assignment.status != AssignmentStatus::Inactive {
        let status = assignment.status.transition_to(AssignmentStatus::Inactive)?;
        assignments::update_status(&mut *conn, assignment.id, status, assignment.approved_at)
            .await?;
    }

    for membership in memberships::list_open_served_by(&mut *conn, trainer_id, gym_id).await? {
        cancel_membership(&mut *conn, membership, refund, actor).await?;
        teardown.memberships_cancelled += 1;
    }

    let released = assignments::clear_roster(&mut *conn, assignment.id).await?;
    if released > 0 {
        users::adjust_metrics(
            &mut *conn,
            trainer_id,
            MetricsDelta {
                active_trainees: -released,
                ..MetricsDelta::default()
            },
        )
        .await?;
    }
    teardown.trainees_released = released.unsigned_abs();

    if let Some(access) =
        memberships::find_open(&mut *conn, trainer_id, gym_id, PlanCategory::TrainerAccess).await?
    {
        cancel_membership(conn, access, refund, actor).await?;
        teardown.memberships_cancelled += 1;
    }

    AppLogger::log_assignment_transition(
        assignment.id,
        gym_id,
        trainer_id,
        assignment.status.as_str(),
        AssignmentStatus::Inactive.as_str(),
    );
    Ok(teardown)
}
