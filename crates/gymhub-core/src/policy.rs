// ABOUTME: Revenue split and refund policies applied to membership fees
// ABOUTME: SplitPolicy divides a fee between trainer and owner, RefundPolicy governs cancellation billing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::revenue::{BPS_SCALE, DEFAULT_TRAINER_SHARE_BPS};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::BillingStatus;

/// Result of splitting one fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSplit {
    /// Trainer's share in minor units
    pub trainer: i64,
    /// Owner's share in minor units
    pub owner: i64,
}

impl RevenueSplit {
    /// Sum of both shares
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.trainer + self.owner
    }
}

/// Trainer share of a membership fee, in basis points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPolicy {
    trainer_share_bps: u32,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            trainer_share_bps: DEFAULT_TRAINER_SHARE_BPS,
        }
    }
}

impl SplitPolicy {
    /// Create a policy giving the trainer `trainer_share_bps` / 10000 of each fee
    ///
    /// # Errors
    ///
    /// Returns `ValueOutOfRange` above 10000 basis points
    pub fn new(trainer_share_bps: u32) -> AppResult<Self> {
        if trainer_share_bps > BPS_SCALE {
            return Err(AppError::new(
                ErrorCode::ValueOutOfRange,
                format!("Trainer share must be at most {BPS_SCALE} basis points, got {trainer_share_bps}"),
            ));
        }
        Ok(Self { trainer_share_bps })
    }

    /// Trainer share in basis points
    #[must_use]
    pub const fn trainer_share_bps(&self) -> u32 {
        self.trainer_share_bps
    }

    /// Policy for a gym, honoring its override when valid
    #[must_use]
    pub fn for_gym(&self, gym_override_bps: Option<u32>) -> Self {
        gym_override_bps
            .and_then(|bps| Self::new(bps).ok())
            .unwrap_or(*self)
    }

    /// Split a fee, rounding the trainer share half up
    ///
    /// The owner receives the remainder, floored at zero, so both shares always add
    /// up to the fee.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a non-positive fee
    pub fn split(&self, fee: i64) -> AppResult<RevenueSplit> {
        if fee <= 0 {
            return Err(AppError::invalid_input(format!(
                "Membership fee must be positive, got {fee}"
            )));
        }
        let scale = i128::from(BPS_SCALE);
        let scaled = i128::from(fee) * i128::from(self.trainer_share_bps) + scale / 2;
        let trainer = i64::try_from(scaled / scale)
            .map_err(|_| AppError::invalid_input("Membership fee is too large"))?;
        let owner = (fee - trainer).max(0);
        Ok(RevenueSplit { trainer, owner })
    }
}

/// What happens to a paid billing snapshot when the membership is cancelled
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefundPolicy {
    /// Paid billing becomes refunded
    #[default]
    Full,
    /// Billing stays paid
    None,
}

impl RefundPolicy {
    /// Configuration string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::None => "none",
        }
    }

    /// Billing status after cancellation
    #[must_use]
    pub const fn billing_after_cancel(&self, current: BillingStatus) -> BillingStatus {
        match (self, current) {
            (Self::Full, BillingStatus::Paid) => BillingStatus::Refunded,
            _ => current,
        }
    }
}

impl Display for RefundPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefundPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "none" => Ok(Self::None),
            _ => Err(AppError::invalid_input(format!("Invalid refund policy: {s}"))),
        }
    }
}
