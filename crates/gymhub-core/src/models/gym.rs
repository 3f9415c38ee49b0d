// ABOUTME: Gym directory models with pricing, analytics counters and trainer roster
// ABOUTME: GymStatus, GymPricing, GymAnalytics and Gym
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::revenue::DEFAULT_CURRENCY;
use crate::errors::{AppError, AppResult};

/// Listing status of a gym
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GymStatus {
    /// Awaiting admin review
    #[default]
    Pending,
    /// Open for memberships
    Active,
    /// Taken down by an admin or a cascade
    Suspended,
}

impl GymStatus {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

impl Display for GymStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for GymStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            _ => Err(AppError::invalid_input(format!("Invalid gym status: {s}"))),
        }
    }
}

/// Gym pricing in integer minor units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GymPricing {
    /// List price
    pub mrp: Option<i64>,
    /// Discounted price, preferred when positive
    pub discounted: Option<i64>,
    /// ISO currency code
    pub currency: String,
}

impl Default for GymPricing {
    fn default() -> Self {
        Self {
            mrp: None,
            discounted: None,
            currency: DEFAULT_CURRENCY.to_owned(),
        }
    }
}

impl GymPricing {
    /// Monthly fee charged to a trainee
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when neither price is set to a positive value
    pub fn monthly_fee(&self) -> AppResult<i64> {
        let fee = match self.discounted {
            Some(discounted) if discounted > 0 => discounted,
            _ => self.mrp.unwrap_or(0),
        };
        if fee > 0 {
            Ok(fee)
        } else {
            Err(AppError::invalid_input("Gym pricing is not configured"))
        }
    }
}

/// Analytics counters kept on the gym row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GymAnalytics {
    /// Non-terminal ordinary memberships
    pub memberships: i64,
    /// Active trainer assignments
    pub trainers: i64,
    /// Listing impressions, owned by the analytics collaborator
    pub impressions: i64,
}

/// A gym listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gym {
    /// Unique gym identifier
    pub id: Uuid,
    /// Owning user
    pub owner_id: Uuid,
    /// Display name
    pub name: String,
    /// Listing status
    pub status: GymStatus,
    /// Whether the listing is visible in the directory
    pub is_published: bool,
    /// Pricing
    pub pricing: GymPricing,
    /// Per-gym trainer share override in basis points
    pub trainer_share_bps: Option<u32>,
    /// Sponsorship window start
    pub sponsored_from: Option<DateTime<Utc>>,
    /// Sponsorship window end
    pub sponsored_until: Option<DateTime<Utc>>,
    /// Analytics counters
    pub analytics: GymAnalytics,
    /// Trainers currently serving the gym
    pub trainers: Vec<Uuid>,
    /// When the gym was created
    pub created_at: DateTime<Utc>,
}

impl Gym {
    /// Create a pending, unpublished gym
    #[must_use]
    pub fn new(owner_id: Uuid, name: String, pricing: GymPricing) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            status: GymStatus::Pending,
            is_published: false,
            pricing,
            trainer_share_bps: None,
            sponsored_from: None,
            sponsored_until: None,
            analytics: GymAnalytics::default(),
            trainers: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Whether the given user owns this gym
    #[must_use]
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Whether the gym currently accepts new memberships
    #[must_use]
    pub const fn accepts_members(&self) -> bool {
        matches!(self.status, GymStatus::Active) && self.is_published
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pricing(mrp: Option<i64>, discounted: Option<i64>) -> GymPricing {
        GymPricing {
            mrp,
            discounted,
            ..GymPricing::default()
        }
    }

    #[test]
    fn test_discounted_price_wins_when_positive() {
        assert_eq!(pricing(Some(1500), Some(999)).monthly_fee().unwrap(), 999);
        assert_eq!(pricing(Some(1500), Some(0)).monthly_fee().unwrap(), 1500);
        assert_eq!(pricing(Some(1500), None).monthly_fee().unwrap(), 1500);
    }

    #[test]
    fn test_unpriced_gym_is_rejected() {
        assert!(pricing(None, None).monthly_fee().is_err());
        assert!(pricing(Some(0), Some(-5)).monthly_fee().is_err());
    }

    #[test]
    fn test_accepts_members_requires_active_and_published() {
        let mut gym = Gym::new(Uuid::new_v4(), "Iron Temple".to_owned(), GymPricing::default());
        assert!(!gym.accepts_members());
        gym.status = GymStatus::Active;
        assert!(!gym.accepts_members());
        gym.is_published = true;
        assert!(gym.accepts_members());
    }
}
