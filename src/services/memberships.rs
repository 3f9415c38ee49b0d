// ABOUTME: Membership lifecycle service: join, leave, pause and resume
// ABOUTME: Each operation runs in one transaction and keeps counters, rosters and the ledger in step
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Membership Manager
//!
//! A trainee joins a gym through one of its active trainers and pays the
//! monthly fee, which is split between trainer and owner and written to the
//! ledger. A trainer joins with `as_trainer` to request access, which creates a
//! pending trainer-access membership and a pending assignment for the owner to
//! approve.
//!
//! Leaving cancels the membership and reverses the counters it contributed to.
//! Money already recorded in the ledger stays there.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::assignments::{end_assignment, Teardown};
use super::ledger;
use crate::config::MembershipConfig;
use crate::constants::database::TRANSACTION_MAX_RETRIES;
use crate::database::users::MetricsDelta;
use crate::database::{assignments, gyms, memberships, retry_transaction, users, Database};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::models::{
    window_end, AssignmentStatus, Billing, BillingStatus, Gym, JoinRequest, Membership,
    MembershipPlan, MembershipStatus, PlanCategory, Principal, RevenueEvent, RosterEntry,
    RosterStatus, TrainerAssignment, UserRole,
};
use crate::policy::RefundPolicy;

/// Result of a successful join
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JoinOutcome {
    /// A trainer asked for access; the owner still has to approve
    AccessRequested {
        /// Pending trainer-access membership
        membership: Membership,
        /// Pending assignment
        assignment: TrainerAssignment,
    },
    /// A trainee paid and the membership is in force
    Activated {
        /// Active membership
        membership: Membership,
        /// Trainer and owner ledger events
        revenue: Vec<RevenueEvent>,
    },
}

impl JoinOutcome {
    /// The membership created by the join
    #[must_use]
    pub const fn membership(&self) -> &Membership {
        match self {
            Self::AccessRequested { membership, .. } | Self::Activated { membership, .. } => {
                membership
            }
        }
    }
}

/// Result of a leave request
#[derive(Debug, Clone, Serialize)]
pub struct LeaveOutcome {
    /// Membership after the request
    pub membership: Membership,
    /// False when the membership had already ended
    pub changed: bool,
}

/// Membership lifecycle operations
#[derive(Clone)]
pub struct MembershipService {
    database: Database,
    config: MembershipConfig,
}

impl MembershipService {
    /// Create a service over `database` with the given policies
    #[must_use]
    pub const fn new(database: Database, config: MembershipConfig) -> Self {
        Self { database, config }
    }

    /// Join a gym as a paying trainee or request access as a trainer
    ///
    /// # Errors
    ///
    /// - `ResourceNotFound` if the gym or the principal's user is missing
    /// - `InvalidInput` / `MissingRequiredField` for an unpublished gym, bad
    ///   pricing, a missing payment reference or an unusable trainer
    /// - `PermissionDenied` for the gym's owner or a non-trainer asking for access
    /// - `ResourceConflict` for an existing open membership or a reused payment reference
    pub async fn join_gym(
        &self,
        principal: Principal,
        gym_id: Uuid,
        request: JoinRequest,
    ) -> AppResult<JoinOutcome> {
        let request = &request;
        retry_transaction(
            || async move {
                let mut tx = self.database.begin().await?;
                let outcome = self
                    .join_in_transaction(tx.executor()?, principal, gym_id, request)
                    .await?;
                tx.commit().await?;
                Ok(outcome)
            },
            TRANSACTION_MAX_RETRIES,
        )
        .await
    }

    /// Cancel a membership; repeated calls are no-ops
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown membership and `PermissionDenied`
    /// unless the principal is the member, the gym owner or an admin
    pub async fn leave_gym(
        &self,
        principal: Principal,
        membership_id: Uuid,
    ) -> AppResult<LeaveOutcome> {
        let refund = self.config.refund_policy;
        retry_transaction(
            || async move {
                let mut tx = self.database.begin().await?;
                let conn = tx.executor()?;
                let membership = load_authorized(&mut *conn, principal, membership_id, "leave").await?;

                if membership.status.is_terminal() {
                    tx.commit().await?;
                    return Ok(LeaveOutcome {
                        membership,
                        changed: false,
                    });
                }

                let (membership, _) = leave_effects(conn, membership, refund, principal.id).await?;
                tx.commit().await?;
                Ok(LeaveOutcome {
                    membership,
                    changed: true,
                })
            },
            TRANSACTION_MAX_RETRIES,
        )
        .await
    }

    /// Pause an active ordinary membership
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the membership is active and ordinary,
    /// plus the authorization errors of [`Self::leave_gym`]
    pub async fn pause_membership(
        &self,
        principal: Principal,
        membership_id: Uuid,
    ) -> AppResult<Membership> {
        self.set_paused(principal, membership_id, true).await
    }

    /// Resume a paused ordinary membership
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the membership is paused and ordinary,
    /// plus the authorization errors of [`Self::leave_gym`]
    pub async fn resume_membership(
        &self,
        principal: Principal,
        membership_id: Uuid,
    ) -> AppResult<Membership> {
        self.set_paused(principal, membership_id, false).await
    }

    /// Get a membership visible to the principal
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` or `PermissionDenied`
    pub async fn get_membership(
        &self,
        principal: Principal,
        membership_id: Uuid,
    ) -> AppResult<Membership> {
        let mut conn = self.database.acquire().await?;
        load_authorized(&mut conn, principal, membership_id, "read").await
    }

    async fn set_paused(
        &self,
        principal: Principal,
        membership_id: Uuid,
        pause: bool,
    ) -> AppResult<Membership> {
        let (from, to, roster_to, action) = if pause {
            (MembershipStatus::Active, MembershipStatus::Paused, RosterStatus::Paused, "pause")
        } else {
            (MembershipStatus::Paused, MembershipStatus::Active, RosterStatus::Active, "resume")
        };

        retry_transaction(
            || async move {
                let mut tx = self.database.begin().await?;
                let conn = tx.executor()?;
                let mut membership =
                    load_authorized(&mut *conn, principal, membership_id, action).await?;

                if membership.category() != PlanCategory::Ordinary || membership.status != from {
                    return Err(AppError::invalid_transition(
                        "membership",
                        membership.status,
                        to,
                    ));
                }

                membership.status = membership.status.transition_to(to)?;
                membership.updated_at = Utc::now();
                memberships::update_lifecycle(&mut *conn, &membership).await?;

                if let Some(trainer_id) = membership.trainer_id {
                    if let Some(assignment) =
                        assignments::find(&mut *conn, trainer_id, membership.gym_id).await?
                    {
                        let current = assignments::roster_status(
                            &mut *conn,
                            assignment.id,
                            membership.trainee_id,
                        )
                        .await?;
                        if let Some(current) = current.filter(|s| s.can_transition_to(roster_to)) {
                            assignments::set_roster_status(
                                &mut *conn,
                                assignment.id,
                                membership.trainee_id,
                                current.transition_to(roster_to)?,
                            )
                            .await?;
                        }
                    }
                }

                tx.commit().await?;
                AppLogger::log_membership_transition(
                    membership.id,
                    membership.gym_id,
                    from.as_str(),
                    to.as_str(),
                    principal.id,
                );
                Ok(membership)
            },
            TRANSACTION_MAX_RETRIES,
        )
        .await
    }

    async fn join_in_transaction(
        &self,
        conn: &mut SqliteConnection,
        principal: Principal,
        gym_id: Uuid,
        request: &JoinRequest,
    ) -> AppResult<JoinOutcome> {
        let gym = gyms::get(&mut *conn, gym_id)
            .await?
            .ok_or_else(|| AppError::not_found("Gym"))?;
        if !gym.accepts_members() {
            return Err(AppError::invalid_input(format!(
                "Gym {gym_id} is not accepting members"
            )));
        }
        if gym.is_owned_by(principal.id) {
            AppLogger::log_authorization_denied(principal.id, "join", "own gym");
            return Err(AppError::forbidden("Owners cannot join their own gym"));
        }
        if users::get(&mut *conn, principal.id).await?.is_none() {
            return Err(AppError::not_found("User"));
        }

        if request.as_trainer {
            self.request_access(conn, principal, &gym, request).await
        } else {
            self.activate(conn, principal, &gym, request).await
        }
    }

    async fn request_access(
        &self,
        conn: &mut SqliteConnection,
        principal: Principal,
        gym: &Gym,
        request: &JoinRequest,
    ) -> AppResult<JoinOutcome> {
        if principal.role != UserRole::Trainer {
            AppLogger::log_authorization_denied(principal.id, "request_trainer_access", "gym");
            return Err(AppError::forbidden("Only trainers can request gym access"));
        }
        if memberships::find_open(&mut *conn, principal.id, gym.id, PlanCategory::TrainerAccess)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(
                "Trainer access for this gym is already requested or granted",
            ));
        }
        if memberships::find_open(&mut *conn, principal.id, gym.id, PlanCategory::Ordinary)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(
                "An open membership at this gym already exists",
            ));
        }
        if let Some(existing) = assignments::find(&mut *conn, principal.id, gym.id).await? {
            if existing.status == AssignmentStatus::Active {
                return Err(AppError::conflict("Trainer assignment is already active"));
            }
        }

        let now = Utc::now();
        let membership = Membership {
            id: Uuid::new_v4(),
            trainee_id: principal.id,
            gym_id: gym.id,
            plan: MembershipPlan::TrainerAccess,
            status: MembershipStatus::Pending,
            start_date: now,
            end_date: window_end(now, self.config.trainer_access_period_months)?,
            auto_renew: request.auto_renew.unwrap_or(false),
            billing: Billing {
                amount: 0,
                currency: self.currency_for(gym),
                payment_reference: None,
                status: BillingStatus::Unpaid,
            },
            trainer_id: None,
            benefits: request.benefits.clone(),
            created_at: now,
            updated_at: now,
        };
        memberships::insert(&mut *conn, &membership).await?;

        let assignment = assignments::upsert_request(conn, principal.id, gym.id, now).await?;
        if assignment.status != AssignmentStatus::Pending {
            return Err(AppError::conflict("Trainer assignment is already active"));
        }

        AppLogger::log_assignment_transition(
            assignment.id,
            gym.id,
            principal.id,
            "none",
            AssignmentStatus::Pending.as_str(),
        );
        AppLogger::log_membership_transition(
            membership.id,
            gym.id,
            "none",
            MembershipStatus::Pending.as_str(),
            principal.id,
        );

        Ok(JoinOutcome::AccessRequested {
            membership,
            assignment,
        })
    }

    async fn activate(
        &self,
        conn: &mut SqliteConnection,
        principal: Principal,
        gym: &Gym,
        request: &JoinRequest,
    ) -> AppResult<JoinOutcome> {
        let trainer_id = request
            .trainer_id
            .ok_or_else(|| AppError::missing_field("trainer_id"))?;
        let payment_reference = request
            .payment_reference
            .as_deref()
            .map(str::trim)
            .filter(|reference| !reference.is_empty())
            .ok_or_else(|| AppError::missing_field("payment_reference"))?;

        let assignment = assignments::find(&mut *conn, trainer_id, gym.id)
            .await?
            .filter(|a| a.status == AssignmentStatus::Active)
            .ok_or_else(|| {
                AppError::invalid_input(format!("Trainer {trainer_id} is not active at this gym"))
            })?;
        let trainer_is_active = users::get(&mut *conn, trainer_id)
            .await?
            .is_some_and(|trainer| trainer.status.is_active());
        if !trainer_is_active {
            return Err(AppError::invalid_input(format!(
                "Trainer {trainer_id} is not available"
            )));
        }

        let fee = gym.pricing.monthly_fee()?;
        if memberships::find_open(&mut *conn, principal.id, gym.id, PlanCategory::Ordinary)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(
                "An open membership at this gym already exists",
            ));
        }
        let split = self.config.split.for_gym(gym.trainer_share_bps).split(fee)?;

        let now = Utc::now();
        let membership = Membership {
            id: Uuid::new_v4(),
            trainee_id: principal.id,
            gym_id: gym.id,
            plan: MembershipPlan::Monthly,
            status: MembershipStatus::Active,
            start_date: now,
            end_date: window_end(now, self.config.membership_period_months)?,
            auto_renew: request.auto_renew.unwrap_or(true),
            billing: Billing {
                amount: fee,
                currency: self.currency_for(gym),
                payment_reference: Some(payment_reference.to_owned()),
                status: BillingStatus::Paid,
            },
            trainer_id: Some(trainer_id),
            benefits: request.benefits.clone(),
            created_at: now,
            updated_at: now,
        };
        memberships::insert(&mut *conn, &membership).await?;

        gyms::adjust_counter(&mut *conn, gym.id, gyms::GymCounter::Memberships, 1).await?;
        users::adjust_metrics(
            &mut *conn,
            principal.id,
            MetricsDelta {
                active_memberships: 1,
                total_spent: fee,
                ..MetricsDelta::default()
            },
        )
        .await?;

        let previous = assignments::roster_status(&mut *conn, assignment.id, principal.id).await?;
        assignments::upsert_roster_entry(
            &mut *conn,
            assignment.id,
            &RosterEntry {
                trainee_id: principal.id,
                status: RosterStatus::Active,
                assigned_at: now,
                goals: Vec::new(),
            },
        )
        .await?;

        let newly_counted = !previous.is_some_and(|status| status.is_counted());
        users::adjust_metrics(
            &mut *conn,
            trainer_id,
            MetricsDelta {
                active_trainees: i64::from(newly_counted),
                total_earnings: split.trainer,
                ..MetricsDelta::default()
            },
        )
        .await?;
        users::adjust_metrics(
            &mut *conn,
            gym.owner_id,
            MetricsDelta {
                total_earnings: split.owner,
                ..MetricsDelta::default()
            },
        )
        .await?;

        let revenue = ledger::record_membership_split(conn, &membership, gym, split).await?;

        AppLogger::log_membership_transition(
            membership.id,
            gym.id,
            "none",
            MembershipStatus::Active.as_str(),
            principal.id,
        );

        Ok(JoinOutcome::Activated {
            membership,
            revenue,
        })
    }

    fn currency_for(&self, gym: &Gym) -> String {
        if gym.pricing.currency.trim().is_empty() {
            self.config.default_currency.clone()
        } else {
            gym.pricing.currency.clone()
        }
    }
}

/// Load a membership the principal may act on
async fn load_authorized(
    conn: &mut SqliteConnection,
    principal: Principal,
    membership_id: Uuid,
    action: &str,
) -> AppResult<Membership> {
    let membership = memberships::get(&mut *conn, membership_id)
        .await?
        .ok_or_else(|| AppError::not_found("Membership"))?;

    if principal.id == membership.trainee_id || principal.is_admin() {
        return Ok(membership);
    }
    let owns_gym = gyms::get(conn, membership.gym_id)
        .await?
        .is_some_and(|gym| gym.is_owned_by(principal.id));
    if owns_gym {
        return Ok(membership);
    }

    AppLogger::log_authorization_denied(principal.id, action, "membership");
    Err(AppError::forbidden(
        "Only the member, the gym owner or an admin can manage this membership",
    ))
}

/// Cancel one open membership and reverse what it contributed
///
/// Ordinary memberships that were active or paused give back their gym and
/// trainee counters, and their roster entry is completed. Trainer-access
/// memberships only change status here; see [`leave_effects`] for the full
/// teardown.
///
/// # Errors
///
/// Returns `InvalidStateTransition` for a terminal membership or a database error
pub(crate) async fn cancel_membership(
    conn: &mut SqliteConnection,
    membership: Membership,
    refund: RefundPolicy,
    actor: Uuid,
) -> AppResult<Membership> {
    let previous = membership.status;
    let now = Utc::now();
    let mut membership = membership;
    membership.status = previous.transition_to(MembershipStatus::Cancelled)?;
    membership.auto_renew = false;
    membership.end_date = now;
    membership.updated_at = now;
    membership.billing.status = refund.billing_after_cancel(membership.billing.status);
    memberships::update_lifecycle(&mut *conn, &membership).await?;

    if membership.category() == PlanCategory::Ordinary {
        if previous.is_counted() {
            gyms::adjust_counter(
                &mut *conn,
                membership.gym_id,
                gyms::GymCounter::Memberships,
                -1,
            )
            .await?;
            users::adjust_metrics(
                &mut *conn,
                membership.trainee_id,
                MetricsDelta {
                    active_memberships: -1,
                    ..MetricsDelta::default()
                },
            )
            .await?;
        }
        if let Some(trainer_id) = membership.trainer_id {
            complete_roster_entry(conn, trainer_id, &membership).await?;
        }
    }

    AppLogger::log_membership_transition(
        membership.id,
        membership.gym_id,
        previous.as_str(),
        membership.status.as_str(),
        actor,
    );
    Ok(membership)
}

/// Cancel a membership with every side effect of leaving the gym
///
/// Leaving a trainer-access membership also ends the trainer's assignment at
/// the gym; the teardown of that assignment is returned alongside.
///
/// # Errors
///
/// Returns an error if any step fails
pub(crate) async fn leave_effects(
    conn: &mut SqliteConnection,
    membership: Membership,
    refund: RefundPolicy,
    actor: Uuid,
) -> AppResult<(Membership, Option<Teardown>)> {
    let membership = cancel_membership(&mut *conn, membership, refund, actor).await?;

    if membership.category() != PlanCategory::TrainerAccess {
        return Ok((membership, None));
    }
    let Some(assignment) =
        assignments::find(&mut *conn, membership.trainee_id, membership.gym_id).await?
    else {
        return Ok((membership, None));
    };
    let teardown = end_assignment(conn, &assignment, refund, actor).await?;
    Ok((membership, Some(teardown)))
}

async fn complete_roster_entry(
    conn: &mut SqliteConnection,
    trainer_id: Uuid,
    membership: &Membership,
) -> AppResult<()> {
    let Some(assignment) = assignments::find(&mut *conn, trainer_id, membership.gym_id).await?
    else {
        return Ok(());
    };
    let Some(status) =
        assignments::roster_status(&mut *conn, assignment.id, membership.trainee_id).await?
    else {
        return Ok(());
    };
    if status == RosterStatus::Completed {
        return Ok(());
    }

    assignments::set_roster_status(
        &mut *conn,
        assignment.id,
        membership.trainee_id,
        status.transition_to(RosterStatus::Completed)?,
    )
    .await?;
    if status.is_counted() {
        users::adjust_metrics(
            conn,
            trainer_id,
            MetricsDelta {
                active_trainees: -1,
                ..MetricsDelta::default()
            },
        )
        .await?;
    }
    Ok(())
}
