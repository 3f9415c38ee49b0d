// ABOUTME: Core data models re-exported from gymhub-core
// ABOUTME: Users, gyms, memberships, trainer assignments, revenue events and their collaborators
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! - `User`, `Principal`: accounts and the authenticated caller
//! - `Gym`, `GymAnalytics`: directory listings and their counters
//! - `Membership`: a trainee's or trainer's plan at one gym
//! - `TrainerAssignment`, `RosterEntry`: trainer access and their trainees
//! - `RevenueEvent`: one append-only ledger entry

pub use gymhub_core::models::*;
