// ABOUTME: Domain constants for memberships, revenue shares and HTTP defaults
// ABOUTME: Pure data constants grouped by concern
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped into small domain modules rather than one flat list.

/// Membership windows and lifecycle values
pub mod membership {
    /// Months covered by one payment of an ordinary plan
    pub const DEFAULT_PERIOD_MONTHS: u32 = 1;
    /// Tentative and approved window of a trainer-access membership
    pub const TRAINER_ACCESS_PERIOD_MONTHS: u32 = 6;
}

/// Revenue split values
pub mod revenue {
    /// Basis points in a whole
    pub const BPS_SCALE: u32 = 10_000;
    /// Default trainer share (50%)
    pub const DEFAULT_TRAINER_SHARE_BPS: u32 = 5_000;
    /// Currency used when a gym does not set one
    pub const DEFAULT_CURRENCY: &str = "INR";
    /// Metadata key tagging revenue events with their gym
    pub const GYM_ID_METADATA_KEY: &str = "gymId";
}

/// Principal headers set by the upstream identity proxy
pub mod headers {
    /// Authenticated user id
    pub const USER_ID: &str = "x-user-id";
    /// Authenticated user role
    pub const USER_ROLE: &str = "x-user-role";
}

/// API endpoints
pub mod endpoints {
    /// Health check endpoint
    pub const HEALTH_CHECK: &str = "/health";
}

/// Network ports
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8081;
}

/// Database defaults
pub mod database {
    /// Default database URL
    pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/gymhub.db";
    /// Default pool size for file databases
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    /// Attempts made by the transaction retry helper
    pub const TRANSACTION_MAX_RETRIES: u32 = 3;
    /// `SQLite` busy timeout in milliseconds
    pub const BUSY_TIMEOUT_MS: u64 = 5_000;
}
