// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Environment-only server, database and membership policy configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module for the GymHub server
//!
//! - **Environment**: server and membership policy configuration from environment variables
//! - **Database**: type-safe database URL and pool settings

/// Type-safe database URL and pool configuration
pub mod database;
/// Environment and server configuration
pub mod environment;

pub use database::{DatabaseConfig, DatabaseUrl};
pub use environment::{CorsConfig, Environment, MembershipConfig, ServerConfig};
