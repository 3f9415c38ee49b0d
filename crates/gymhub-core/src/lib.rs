// ABOUTME: Core types and constants for the GymHub membership platform
// ABOUTME: Foundation crate with error handling, domain models, and revenue split policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # GymHub Core
//!
//! Foundation crate providing shared types and constants for the gym marketplace
//! membership core. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and HTTP responses
//! - **constants**: Membership windows, share defaults and other domain constants
//! - **models**: Users, gyms, memberships, trainer assignments, revenue events
//! - **policy**: Revenue split and refund policies applied to membership fees

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (User, Gym, Membership, `TrainerAssignment`, `RevenueEvent`)
pub mod models;

/// Revenue split and refund policies
pub mod policy;
