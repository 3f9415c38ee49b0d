// ABOUTME: Core domain models for the gym marketplace membership core
// ABOUTME: Re-exports users, gyms, memberships, trainer assignments, revenue and collaborator rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! Every status field is a closed enum with an explicit transition table, so a
//! move the lifecycle does not allow surfaces as `InvalidStateTransition`
//! instead of silently writing an impossible state.
//!
//! ## Core Models
//!
//! - `User` / `Principal`: marketplace identities and the authenticated caller
//! - `Gym`: a listing with pricing, analytics counters and trainer roster
//! - `Membership`: a trainee's (or trainer's) plan at a gym
//! - `TrainerAssignment`: a trainer's relationship with a gym, with its roster
//! - `RevenueEvent`: an immutable ledger row

mod assignment;
mod collaborators;
mod gym;
mod membership;
mod revenue;
mod user;

// Assignment domain
pub use assignment::{AssignmentStatus, RosterEntry, RosterStatus, TrainerAssignment};

// Collaborator rows
pub use collaborators::{
    ListingStatus, ListingSubscription, MarketplaceOrder, OrderStatus, ProgressRecord,
};

// Gym domain
pub use gym::{Gym, GymAnalytics, GymPricing, GymStatus};

// Membership domain
pub use membership::{
    window_end, Billing, BillingStatus, JoinRequest, Membership, MembershipPlan, MembershipStatus,
    PlanCategory,
};

// Revenue domain
pub use revenue::{
    MembershipRevenueMetadata, NewRevenueEvent, RevenueEvent, RevenueShare, RevenueType,
};

// User domain
pub use user::{Principal, User, UserMetrics, UserRole, UserStatus};
