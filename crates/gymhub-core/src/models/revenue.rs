// ABOUTME: Append-only revenue event models for the ledger
// ABOUTME: RevenueType, RevenueShare, RevenueEvent, NewRevenueEvent and membership metadata
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::membership::MembershipPlan;

/// Source of a financial fact
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RevenueType {
    /// Membership fee share
    Membership,
    /// Gym listing plan
    Listing,
    /// Sponsored placement
    Sponsorship,
    /// Marketplace commission
    Marketplace,
    /// Seller payout
    Seller,
}

impl RevenueType {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Membership => "membership",
            Self::Listing => "listing",
            Self::Sponsorship => "sponsorship",
            Self::Marketplace => "marketplace",
            Self::Seller => "seller",
        }
    }
}

impl Display for RevenueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevenueType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "membership" => Ok(Self::Membership),
            "listing" => Ok(Self::Listing),
            "sponsorship" => Ok(Self::Sponsorship),
            "marketplace" => Ok(Self::Marketplace),
            "seller" => Ok(Self::Seller),
            _ => Err(AppError::invalid_input(format!("Invalid revenue type: {s}"))),
        }
    }
}

/// Which side of a membership fee an event records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RevenueShare {
    /// Trainer's cut
    Trainer,
    /// Gym owner's cut
    Owner,
}

impl RevenueShare {
    /// Metadata string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trainer => "trainer",
            Self::Owner => "owner",
        }
    }
}

/// Metadata attached to both events of a membership fee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRevenueMetadata {
    /// Gym the fee was paid to
    pub gym_id: Uuid,
    /// Paying trainee
    pub member_id: Uuid,
    /// Membership created by the payment
    pub membership_id: Uuid,
    /// Gateway reference
    pub payment_reference: String,
    /// Plan bought
    pub plan: MembershipPlan,
    /// Side of the split
    pub share: RevenueShare,
}

/// An immutable ledger row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueEvent {
    /// Unique event identifier
    pub id: Uuid,
    /// Amount in minor units, never negative
    pub amount: i64,
    /// ISO currency code
    pub currency: String,
    /// Receiving user, `None` for the platform
    pub payee_id: Option<Uuid>,
    /// Paying user
    pub payer_id: Option<Uuid>,
    /// Source of the revenue
    pub revenue_type: RevenueType,
    /// Human-readable description
    pub description: String,
    /// Free-form metadata (membership events carry `gymId`)
    pub metadata: serde_json::Value,
    /// When the fact was recorded
    pub created_at: DateTime<Utc>,
}

impl RevenueEvent {
    /// Gym tag from the metadata, if present and well formed
    #[must_use]
    pub fn gym_id(&self) -> Option<Uuid> {
        self.metadata
            .get("gymId")
            .and_then(serde_json::Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }
}

/// Input for recording a revenue event
#[derive(Debug, Clone)]
pub struct NewRevenueEvent {
    /// Amount in minor units
    pub amount: i64,
    /// ISO currency code
    pub currency: String,
    /// Receiving user, `None` for the platform
    pub payee_id: Option<Uuid>,
    /// Paying user
    pub payer_id: Option<Uuid>,
    /// Source of the revenue
    pub revenue_type: RevenueType,
    /// Human-readable description
    pub description: String,
    /// Free-form metadata
    pub metadata: serde_json::Value,
}

impl NewRevenueEvent {
    /// Build the event for one side of a membership fee
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if the metadata cannot be encoded
    pub fn membership_share(
        amount: i64,
        currency: &str,
        payee_id: Uuid,
        metadata: &MembershipRevenueMetadata,
    ) -> AppResult<Self> {
        Ok(Self {
            amount,
            currency: currency.to_owned(),
            payee_id: Some(payee_id),
            payer_id: Some(metadata.member_id),
            revenue_type: RevenueType::Membership,
            description: format!(
                "{} share of {} membership {}",
                metadata.share.as_str(),
                metadata.plan,
                metadata.membership_id
            ),
            metadata: serde_json::to_value(metadata)?,
        })
    }

    /// Materialize the event with a fresh id and timestamp
    #[must_use]
    pub fn into_event(self) -> RevenueEvent {
        RevenueEvent {
            id: Uuid::new_v4(),
            amount: self.amount,
            currency: self.currency,
            payee_id: self.payee_id,
            payer_id: self.payer_id,
            revenue_type: self.revenue_type,
            description: self.description,
            metadata: self.metadata,
            created_at: Utc::now(),
        }
    }
}
