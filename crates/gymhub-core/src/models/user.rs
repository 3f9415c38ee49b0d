// ABOUTME: User identity, role and aggregate metric models
// ABOUTME: UserRole, UserStatus, UserMetrics and User plus the request Principal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Marketplace role of a user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Buys memberships
    #[default]
    Trainee,
    /// Serves trainees at gyms that approved them
    Trainer,
    /// Owns and lists gyms
    GymOwner,
    /// Sells marketplace products
    Seller,
    /// Platform administrator
    Admin,
}

impl UserRole {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trainee => "trainee",
            Self::Trainer => "trainer",
            Self::GymOwner => "gym_owner",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }

    /// Check if this role has admin privileges
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trainee" | "user" => Ok(Self::Trainee),
            "trainer" => Ok(Self::Trainer),
            "gym_owner" | "gym-owner" => Ok(Self::GymOwner),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::invalid_input(format!("Invalid user role: {s}"))),
        }
    }
}

/// Account status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Account in good standing
    #[default]
    Active,
    /// Account suspended by admin
    Suspended,
}

impl UserStatus {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }

    /// Check if the account can take part in memberships
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl Display for UserStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            _ => Err(AppError::invalid_input(format!("Invalid user status: {s}"))),
        }
    }
}

/// Aggregate counters kept on the user row
///
/// Trainee-side and trainer-side values live side by side; a user only moves the
/// ones that match their role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetrics {
    /// Open ordinary memberships held as a trainee
    pub active_memberships: i64,
    /// Lifetime spend in minor units
    pub total_spent: i64,
    /// Active or paused roster entries across all assignments
    pub active_trainees: i64,
    /// Lifetime earnings in minor units
    pub total_earnings: i64,
}

/// A marketplace user as seen by the membership core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// Contact email
    pub email: String,
    /// Display name
    pub display_name: Option<String>,
    /// Marketplace role
    pub role: UserRole,
    /// Account status
    pub status: UserStatus,
    /// Aggregate counters
    pub metrics: UserMetrics,
    /// When the user was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user with zeroed metrics
    #[must_use]
    pub fn new(email: String, display_name: Option<String>, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            display_name,
            role,
            status: UserStatus::Active,
            metrics: UserMetrics::default(),
            created_at: Utc::now(),
        }
    }

    /// Principal for this user
    #[must_use]
    pub const fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            role: self.role,
        }
    }
}

/// Authenticated caller supplied by the identity collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User id
    pub id: Uuid,
    /// Role claimed by the session
    pub role: UserRole,
}

impl Principal {
    /// Create a principal
    #[must_use]
    pub const fn new(id: Uuid, role: UserRole) -> Self {
        Self { id, role }
    }

    /// Check if the principal is an admin
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fail with 403 unless the principal is an admin
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for any non-admin role
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin privileges required").with_user_id(self.id))
        }
    }
}
