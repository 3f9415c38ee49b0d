// ABOUTME: Trainer assignment models linking a trainer to a gym and its trainee roster
// ABOUTME: AssignmentStatus, RosterStatus, RosterEntry and TrainerAssignment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Status of a trainer's assignment at a gym
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Requested by the trainer, awaiting the owner
    #[default]
    Pending,
    /// Approved and serving trainees
    Active,
    /// Removed by the owner or a cascade
    Inactive,
}

impl AssignmentStatus {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Whether `self -> next` is a legal transition
    ///
    /// An inactive assignment may be requested again, which moves it back to pending.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active | Self::Inactive)
                | (Self::Active, Self::Inactive)
                | (Self::Inactive, Self::Pending)
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
            Err(AppError::invalid_transition("trainer assignment", self, next))
        }
    }
}

impl Display for AssignmentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(AppError::invalid_input(format!(
                "Invalid assignment status: {s}"
            ))),
        }
    }
}

/// Status of a trainee inside a trainer's roster
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RosterStatus {
    /// Training with the trainer
    #[default]
    Active,
    /// Membership paused
    Paused,
    /// Membership ended
    Completed,
}

impl RosterStatus {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    /// Whether the entry counts towards the trainer's `active_trainees`
    #[must_use]
    pub const fn is_counted(&self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }

    /// Whether `self -> next` is a legal transition
    ///
    /// A completed entry is reopened when the trainee joins the same trainer again.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::Paused | Self::Completed)
                | (Self::Paused, Self::Active | Self::Completed)
                | (Self::Completed, Self::Active)
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
            Err(AppError::invalid_transition("roster entry", self, next))
        }
    }
}

impl Display for RosterStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for RosterStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            _ => Err(AppError::invalid_input(format!("Invalid roster status: {s}"))),
        }
    }
}

/// One trainee in a trainer's roster at a gym
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Trainee user id
    pub trainee_id: Uuid,
    /// Entry status
    pub status: RosterStatus,
    /// When the trainee was (re)assigned
    pub assigned_at: DateTime<Utc>,
    /// Training goals noted by the trainer
    pub goals: Vec<String>,
}

/// A trainer's relationship with one gym
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerAssignment {
    /// Unique assignment identifier
    pub id: Uuid,
    /// Trainer user id
    pub trainer_id: Uuid,
    /// Gym id
    pub gym_id: Uuid,
    /// Assignment status
    pub status: AssignmentStatus,
    /// When the trainer last requested access
    pub requested_at: DateTime<Utc>,
    /// When the owner approved the request
    pub approved_at: Option<DateTime<Utc>>,
    /// Trainees served at this gym
    pub trainees: Vec<RosterEntry>,
    /// When the assignment row was created
    pub created_at: DateTime<Utc>,
    /// When the assignment last changed
    pub updated_at: DateTime<Utc>,
}

impl TrainerAssignment {
    /// Number of roster entries counted towards `active_trainees`
    #[must_use]
    pub fn counted_trainees(&self) -> usize {
        self.trainees.iter().filter(|e| e.status.is_counted()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_transitions() {
        use AssignmentStatus::{Active, Inactive, Pending};

        assert!(Pending.transition_to(Active).is_ok());
        assert!(Active.transition_to(Inactive).is_ok());
        assert!(Inactive.transition_to(Pending).is_ok());
        assert!(Inactive.transition_to(Active).is_err());
        assert!(Active.transition_to(Pending).is_err());
    }

    #[test]
    fn test_roster_transitions() {
        use RosterStatus::{Active, Completed, Paused};

        assert!(Active.transition_to(Paused).is_ok());
        assert!(Paused.transition_to(Completed).is_ok());
        assert!(Completed.transition_to(Active).is_ok());
        assert!(Completed.transition_to(Paused).is_err());
        assert!(Active.is_counted() && Paused.is_counted() && !Completed.is_counted());
    }

    #[test]
    fn test_counted_trainees_skip_completed_entries() {
        let now = Utc::now();
        let entry = |status| RosterEntry {
            trainee_id: Uuid::new_v4(),
            status,
            assigned_at: now,
            goals: Vec::new(),
        };
        let assignment = TrainerAssignment {
            id: Uuid::new_v4(),
            trainer_id: Uuid::new_v4(),
            gym_id: Uuid::new_v4(),
            status: AssignmentStatus::Active,
            requested_at: now,
            approved_at: Some(now),
            trainees: vec![
                entry(RosterStatus::Active),
                entry(RosterStatus::Paused),
                entry(RosterStatus::Completed),
            ],
            created_at: now,
            updated_at: now,
        };
        assert_eq!(assignment.counted_trainees(), 2);
    }
}
