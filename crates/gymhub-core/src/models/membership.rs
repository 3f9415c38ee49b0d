// ABOUTME: Membership models with explicit status and billing state machines
// ABOUTME: MembershipPlan, PlanCategory, MembershipStatus, BillingStatus, Membership, JoinRequest
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

// ============================================================================
// Enums
// ============================================================================

/// Plan a membership was bought under
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MembershipPlan {
    /// Ordinary paid plan renewed every period
    #[default]
    Monthly,
    /// Lets a trainer operate inside a gym
    #[serde(alias = "trainer-access")]
    TrainerAccess,
}

impl MembershipPlan {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::TrainerAccess => "trainer_access",
        }
    }

    /// Uniqueness space this plan belongs to
    #[must_use]
    pub const fn category(&self) -> PlanCategory {
        match self {
            Self::Monthly => PlanCategory::Ordinary,
            Self::TrainerAccess => PlanCategory::TrainerAccess,
        }
    }
}

impl Display for MembershipPlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipPlan {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "trainer_access" | "trainer-access" => Ok(Self::TrainerAccess),
            _ => Err(AppError::invalid_input(format!("Invalid membership plan: {s}"))),
        }
    }
}

/// Ordinary and trainer-access memberships are separate uniqueness spaces
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlanCategory {
    /// Paid trainee plans
    Ordinary,
    /// Trainer access to a gym
    TrainerAccess,
}

impl PlanCategory {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ordinary => "ordinary",
            Self::TrainerAccess => "trainer_access",
        }
    }
}

impl Display for PlanCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a membership
///
/// `pending -> active <-> paused`, and every non-terminal status may move to
/// `cancelled` or (for active/paused) `expired`. Terminal statuses never move.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Awaiting approval
    #[default]
    Pending,
    /// In force
    Active,
    /// Temporarily suspended by the trainee or owner
    Paused,
    /// Ended by leave, removal or cascade
    Cancelled,
    /// Ended by time
    Expired,
}

impl MembershipStatus {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    /// Whether the membership still occupies its uniqueness slot
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Active | Self::Paused)
    }

    /// Whether the membership is counted in gym and trainee counters
    #[must_use]
    pub const fn is_counted(&self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }

    /// Whether the status can never change again
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !self.is_open()
    }

    /// Whether `self -> next` is a legal transition
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active | Self::Cancelled)
                | (Self::Active, Self::Paused | Self::Cancelled | Self::Expired)
                | (Self::Paused, Self::Active | Self::Cancelled | Self::Expired)
        )
    }

    /// Validate and perform a transition
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` when the move is not allowed
    pub fn transition_to(self, next: Self) -> AppResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::invalid_transition("membership", self, next))
        }
    }
}

impl Display for MembershipStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            _ => Err(AppError::invalid_input(format!(
                "Invalid membership status: {s}"
            ))),
        }
    }
}

/// Billing status of a membership snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BillingStatus {
    /// Nothing charged yet
    #[default]
    Unpaid,
    /// Fee collected
    Paid,
    /// Fee returned on cancellation
    Refunded,
}

impl BillingStatus {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }

    /// Whether `self -> next` is a legal transition
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!((self, next), (Self::Unpaid, Self::Paid) | (Self::Paid, Self::Refunded))
    }

    /// Validate and perform a transition
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` when the move is not allowed
    pub fn transition_to(self, next: Self) -> AppResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::invalid_transition("billing", self, next))
        }
    }
}

impl Display for BillingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "refunded" => Ok(Self::Refunded),
            _ => Err(AppError::invalid_input(format!("Invalid billing status: {s}"))),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// Billing snapshot taken when the membership was created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Billing {
    /// Amount charged in minor units
    pub amount: i64,
    /// ISO currency code
    pub currency: String,
    /// Opaque payment gateway reference
    pub payment_reference: Option<String>,
    /// Billing status
    pub status: BillingStatus,
}

/// A trainee's (or trainer's) membership at a gym
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    /// Unique membership identifier
    pub id: Uuid,
    /// Member user id
    pub trainee_id: Uuid,
    /// Gym id
    pub gym_id: Uuid,
    /// Plan discriminator
    pub plan: MembershipPlan,
    /// Lifecycle status
    pub status: MembershipStatus,
    /// Window start
    pub start_date: DateTime<Utc>,
    /// Window end
    pub end_date: DateTime<Utc>,
    /// Whether the plan renews at the end of the window
    pub auto_renew: bool,
    /// Billing snapshot
    pub billing: Billing,
    /// Trainer serving the member, for ordinary plans
    pub trainer_id: Option<Uuid>,
    /// Benefits promised by the plan
    pub benefits: Vec<String>,
    /// When the membership was created
    pub created_at: DateTime<Utc>,
    /// When the membership last changed
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    /// Uniqueness category of this membership
    #[must_use]
    pub const fn category(&self) -> PlanCategory {
        self.plan.category()
    }
}

/// Window end for a membership starting at `start`
///
/// # Errors
///
/// Returns `InvalidInput` if the end date falls outside the representable range
pub fn window_end(start: DateTime<Utc>, months: u32) -> AppResult<DateTime<Utc>> {
    start
        .checked_add_months(Months::new(months))
        .ok_or_else(|| AppError::invalid_input("Membership window is out of range"))
}

/// Body of a join request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Join as a trainer requesting gym access
    #[serde(default, alias = "asTrainer")]
    pub as_trainer: bool,
    /// Trainer chosen by the trainee (ordinary plans)
    #[serde(default, alias = "trainerId")]
    pub trainer_id: Option<Uuid>,
    /// Gateway payment reference (ordinary plans)
    #[serde(default, alias = "paymentReference")]
    pub payment_reference: Option<String>,
    /// Benefits promised by the plan
    #[serde(default)]
    pub benefits: Vec<String>,
    /// Renewal preference, defaults to renewing
    #[serde(default, alias = "autoRenew")]
    pub auto_renew: Option<bool>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_membership_transitions() {
        use MembershipStatus::{Active, Cancelled, Expired, Paused, Pending};

        assert_eq!(Pending.transition_to(Active).unwrap(), Active);
        assert_eq!(Active.transition_to(Paused).unwrap(), Paused);
        assert_eq!(Paused.transition_to(Active).unwrap(), Active);
        assert!(Paused.transition_to(Cancelled).is_ok());
        assert!(Pending.transition_to(Paused).is_err());
        assert!(Pending.transition_to(Expired).is_err());

        for terminal in [Cancelled, Expired] {
            for next in [Pending, Active, Paused, Cancelled, Expired] {
                assert!(terminal.transition_to(next).is_err());
            }
        }
    }

    #[test]
    fn test_invalid_transition_is_conflict() {
        let err = MembershipStatus::Cancelled
            .transition_to(MembershipStatus::Active)
            .unwrap_err();
        assert_eq!(err.http_status(), 409);
        assert!(err.message.contains("cancelled"));
    }

    #[test]
    fn test_billing_transitions() {
        assert!(BillingStatus::Unpaid.transition_to(BillingStatus::Paid).is_ok());
        assert!(BillingStatus::Paid.transition_to(BillingStatus::Refunded).is_ok());
        assert!(BillingStatus::Unpaid.transition_to(BillingStatus::Refunded).is_err());
        assert!(BillingStatus::Refunded.transition_to(BillingStatus::Paid).is_err());
    }

    #[test]
    fn test_plan_categories_are_separate() {
        assert_eq!(MembershipPlan::Monthly.category(), PlanCategory::Ordinary);
        assert_eq!(
            MembershipPlan::TrainerAccess.category(),
            PlanCategory::TrainerAccess
        );
        assert_eq!(
            "trainer-access".parse::<MembershipPlan>().unwrap(),
            MembershipPlan::TrainerAccess
        );
    }

    #[test]
    fn test_window_end_clamps_month_ends() {
        let start = Utc.with_ymd_and_hms(2025, 1, 31, 9, 0, 0).unwrap();
        let end = window_end(start, 1).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 2, 28, 9, 0, 0).unwrap());
        let six = window_end(start, 6).unwrap();
        assert_eq!(six, Utc.with_ymd_and_hms(2025, 7, 31, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_join_request_accepts_camel_case() {
        let request: JoinRequest =
            serde_json::from_str(r#"{"asTrainer":true,"paymentReference":"pay_1"}"#).unwrap();
        assert!(request.as_trainer);
        assert_eq!(request.payment_reference.as_deref(), Some("pay_1"));
        assert!(request.benefits.is_empty());
    }
}
