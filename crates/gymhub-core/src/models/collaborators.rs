// ABOUTME: Collaborator-owned rows that deletion cascades touch
// ABOUTME: Listing subscriptions, marketplace orders and trainer progress records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Status of a gym's paid listing plan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Paid and running
    #[default]
    Active,
    /// Payment overdue, still visible
    Grace,
    /// Ended early
    Cancelled,
    /// Ended by time
    Expired,
}

impl ListingStatus {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Grace => "grace",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl Display for ListingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "grace" => Ok(Self::Grace),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            _ => Err(AppError::invalid_input(format!("Invalid listing status: {s}"))),
        }
    }
}

/// Status of a marketplace order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, not paid
    #[default]
    Pending,
    /// Paid, not shipped
    Paid,
    /// In transit
    Shipped,
    /// Completed
    Delivered,
    /// Cancelled
    Cancelled,
}

impl OrderStatus {
    /// Every order status
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Paid,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether a cascade still has to cancel the order
    #[must_use]
    pub const fn is_outstanding(&self) -> bool {
        matches!(self, Self::Pending | Self::Paid | Self::Shipped)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(AppError::invalid_input(format!("Invalid order status: {s}"))),
        }
    }
}

/// A gym's listing plan subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSubscription {
    /// Subscription id
    pub id: Uuid,
    /// Gym listed
    pub gym_id: Uuid,
    /// Paying owner
    pub owner_id: Uuid,
    /// Plan name
    pub plan: String,
    /// Status
    pub status: ListingStatus,
    /// Paid-through date
    pub expires_at: DateTime<Utc>,
}

/// A marketplace order between a buyer and a seller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceOrder {
    /// Order id
    pub id: Uuid,
    /// Buying user
    pub buyer_id: Uuid,
    /// Selling user
    pub seller_id: Uuid,
    /// Total in minor units
    pub total: i64,
    /// Status
    pub status: OrderStatus,
    /// When the order was placed
    pub created_at: DateTime<Utc>,
}

/// A trainer's note about a trainee's progress at a gym
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Record id
    pub id: Uuid,
    /// Authoring trainer
    pub trainer_id: Uuid,
    /// Trainee described
    pub trainee_id: Uuid,
    /// Gym where the training happened
    pub gym_id: Uuid,
    /// Free-form notes
    pub notes: String,
    /// When the record was written
    pub recorded_at: DateTime<Utc>,
}
