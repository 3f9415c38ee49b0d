// ABOUTME: Shared server resources handed to every route as axum state
// ABOUTME: Bundles the database, the configuration and the domain services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::database::Database;
use crate::services::{AssignmentService, CascadeService, LedgerService, MembershipService};

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Shared connection pool
    pub database: Database,
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
    /// Join, leave, pause and resume
    pub memberships: MembershipService,
    /// Owner decisions on trainer access
    pub assignments: AssignmentService,
    /// Admin deletions
    pub cascade: CascadeService,
    /// Ledger reads
    pub ledger: LedgerService,
}

impl ServerResources {
    /// Build every service over one database and configuration
    #[must_use]
    pub fn new(database: Database, config: Arc<ServerConfig>) -> Self {
        let policies = config.membership.clone();
        Self {
            memberships: MembershipService::new(database.clone(), policies.clone()),
            assignments: AssignmentService::new(database.clone(), policies.clone()),
            cascade: CascadeService::new(database.clone(), policies),
            ledger: LedgerService::new(database.clone()),
            database,
            config,
        }
    }
}
