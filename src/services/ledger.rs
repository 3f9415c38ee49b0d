// ABOUTME: Revenue ledger recorder and read side
// ABOUTME: Writes the two events of a membership fee split and serves payee and gym ledgers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::Serialize;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::{gyms, revenue, Database};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::models::{
    Gym, Membership, MembershipRevenueMetadata, NewRevenueEvent, Principal, RevenueEvent,
    RevenueShare,
};
use crate::policy::RevenueSplit;

/// A payee's ledger with its running balance
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSummary {
    /// Receiving user
    pub payee_id: Uuid,
    /// Sum of every received amount
    pub balance: i64,
    /// Events, oldest first
    pub events: Vec<RevenueEvent>,
}

/// Append one event to the ledger
///
/// # Errors
///
/// Returns an error if the event is invalid or the insert fails
pub async fn record(conn: &mut SqliteConnection, event: NewRevenueEvent) -> AppResult<RevenueEvent> {
    let event = event.into_event();
    revenue::insert(conn, &event).await?;
    AppLogger::log_revenue_recorded(
        event.id,
        event.payee_id,
        event.amount,
        event.revenue_type.as_str(),
    );
    Ok(event)
}

/// Record both sides of a paid membership fee
///
/// Returns the trainer event followed by the owner event. Both carry the same
/// gym, member, membership, payment reference and plan tags.
///
/// # Errors
///
/// Returns an error if the membership has no trainer or payment reference, or an
/// insert fails
pub async fn record_membership_split(
    conn: &mut SqliteConnection,
    membership: &Membership,
    gym: &Gym,
    split: RevenueSplit,
) -> AppResult<Vec<RevenueEvent>> {
    let trainer_id = membership
        .trainer_id
        .ok_or_else(|| AppError::internal("Paid membership has no trainer"))?;
    let payment_reference = membership
        .billing
        .payment_reference
        .clone()
        .ok_or_else(|| AppError::internal("Paid membership has no payment reference"))?;

    let mut metadata = MembershipRevenueMetadata {
        gym_id: gym.id,
        member_id: membership.trainee_id,
        membership_id: membership.id,
        payment_reference,
        plan: membership.plan,
        share: RevenueShare::Trainer,
    };

    let currency = &membership.billing.currency;
    let trainer_event = record(
        &mut *conn,
        NewRevenueEvent::membership_share(split.trainer, currency, trainer_id, &metadata)?,
    )
    .await?;

    metadata.share = RevenueShare::Owner;
    let owner_event = record(
        conn,
        NewRevenueEvent::membership_share(split.owner, currency, gym.owner_id, &metadata)?,
    )
    .await?;

    Ok(vec![trainer_event, owner_event])
}

/// Read access to the revenue ledger
#[derive(Clone)]
pub struct LedgerService {
    database: Database,
}

impl LedgerService {
    /// Create a ledger service over `database`
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// The principal's own ledger and balance
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read
    pub async fn summary_for(&self, principal: Principal) -> AppResult<LedgerSummary> {
        let events = self.database.list_revenue_for_payee(principal.id).await?;
        let balance = self.database.payee_balance(principal.id).await?;
        Ok(LedgerSummary {
            payee_id: principal.id,
            balance,
            events,
        })
    }

    /// Events tagged with a gym, visible to its owner and admins
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown gym and `PermissionDenied` for
    /// anyone else
    pub async fn events_for_gym(
        &self,
        principal: Principal,
        gym_id: Uuid,
    ) -> AppResult<Vec<RevenueEvent>> {
        let gym = {
            let mut conn = self.database.acquire().await?;
            gyms::get(&mut conn, gym_id).await?
        }
        .ok_or_else(|| AppError::not_found("Gym"))?;

        if !principal.is_admin() && !gym.is_owned_by(principal.id) {
            AppLogger::log_authorization_denied(principal.id, "read_gym_revenue", "gym");
            return Err(AppError::forbidden("Only the gym owner can read its revenue"));
        }

        self.database.list_revenue_for_gym(gym_id).await
    }
}
