// ABOUTME: Domain service layer for the membership core
// ABOUTME: Protocol-agnostic operations reused by the HTTP routes and the tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain service layer
//!
//! Route handlers stay thin: they extract the principal and the path, call one
//! service operation and map the outcome to a status code. Every write
//! operation owns exactly one database transaction.

/// Trainer assignment approval, decline, removal and teardown
pub mod assignments;

/// User and gym deletion cascades
pub mod cascade;

/// Revenue ledger recorder and reads
pub mod ledger;

/// Membership join, leave, pause and resume
pub mod memberships;

pub use assignments::{AssignmentService, Teardown};
pub use cascade::{CascadeReport, CascadeService};
pub use ledger::{LedgerService, LedgerSummary};
pub use memberships::{JoinOutcome, LeaveOutcome, MembershipService};
